//! Standalone inspector for the rotation state files.
//!
//! Prints the image queue and the destination chat, checks that every
//! queued image still exists on disk, and can forget the destination so the
//! next chat to message the bot becomes the new one.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

// Import from the main crate
use photo_rotation_bot::store::{
    DESTINATION_FILE_NAME, DestinationRecord, ImageQueue, QUEUE_FILE_NAME,
};

/// Rotation state inspector.
#[derive(Parser, Debug)]
#[command(name = "rotation_state")]
#[command(about = "Inspects the image queue and destination of the photo rotation bot")]
#[command(version)]
struct Args {
    /// Directory holding image_list.json and chat_id.json (defaults to DATA_DIR or the temp dir).
    #[arg(short, long, env = "DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Forget the stored destination chat.
    #[arg(long)]
    clear_destination: bool,

    /// List every queued image.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();
    let data_dir = args.data_dir.unwrap_or_else(std::env::temp_dir);

    if args.clear_destination {
        return clear_destination(&data_dir);
    }

    inspect(&data_dir, args.verbose)
}

fn clear_destination(data_dir: &std::path::Path) -> ExitCode {
    let path = data_dir.join(DESTINATION_FILE_NAME);

    let previous = match DestinationRecord::load(&path) {
        Ok(record) => record.chat_id,
        Err(e) => {
            eprintln!("✗ {e}");
            None
        }
    };

    match DestinationRecord::remove(&path) {
        Ok(()) => {
            match previous {
                Some(id) => println!("✓ Destination {id} cleared"),
                None => println!("✓ No destination was stored"),
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("✗ Failed to clear destination: {e}");
            ExitCode::FAILURE
        }
    }
}

fn inspect(data_dir: &std::path::Path, verbose: bool) -> ExitCode {
    println!("Data dir: {}\n", data_dir.display());

    let mut failed = false;

    match DestinationRecord::load(data_dir.join(DESTINATION_FILE_NAME)) {
        Ok(DestinationRecord { chat_id: Some(id) }) => println!("Destination: {id}"),
        Ok(DestinationRecord { chat_id: None }) => {
            println!("Destination: not set (rotation is idle until a chat messages the bot)");
        }
        Err(e) => {
            failed = true;
            eprintln!("✗ {e}");
        }
    }

    let queue = match ImageQueue::load(data_dir.join(QUEUE_FILE_NAME)) {
        Ok(queue) => queue,
        Err(e) => {
            eprintln!("✗ {e}");
            return ExitCode::FAILURE;
        }
    };

    println!("Queued images: {}", queue.len());

    let mut missing = 0;
    for (i, image) in queue.iter().enumerate() {
        let exists = image.path().is_file();
        if !exists {
            missing += 1;
        }

        if verbose || !exists {
            let marker = if exists { "✓" } else { "✗ missing" };
            println!("  {:>3}. {} {marker}", i + 1, truncate(image.as_str(), 60));
        }
    }

    println!();

    if missing > 0 {
        println!("⚠ {missing} queued image(s) no longer exist; rotating to them will fail");
    }

    if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

/// Truncates a string for display.
fn truncate(s: &str, max_len: usize) -> String {
    let chars: Vec<char> = s.chars().collect();
    if chars.len() <= max_len {
        s.to_owned()
    } else {
        format!("{}...", chars[..max_len].iter().collect::<String>())
    }
}
