//! Persisted rotation state.
//!
//! Holds the FIFO queue of uploaded images, the remembered destination chat
//! and the downloaded image bytes. Both state files are read entirely,
//! mutated in memory and written back wholesale on every operation.

mod destination;
mod error;
mod queue;
mod rotation;

pub use destination::{DestinationId, DestinationRecord};
pub use error::StoreError;
pub use queue::{ImageQueue, ImageReference};
pub use rotation::RotationStore;

/// File holding the queue as a JSON array of image paths.
pub const QUEUE_FILE_NAME: &str = "image_list.json";

/// File holding the destination as `{"chat_id": <id>}`.
pub const DESTINATION_FILE_NAME: &str = "chat_id.json";

/// Directory (inside the data dir) where uploaded images are written.
pub const IMAGES_DIR_NAME: &str = "images";
