//! Photo rotation scheduler runner.
//!
//! Each rotation:
//! 1. Look up the destination chat; none set means there is nothing to do
//! 2. Pop the head of the queue and persist the remainder right away
//! 3. Apply the image via the API and report the result to the chat
//!
//! The popped image is consumed whether or not step 3 succeeds. Nothing is
//! retried or re-enqueued. The next rotation starts one period after the
//! previous one finished.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use teloxide::types::ChatId;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::config::DEFAULT_ROTATION_INTERVAL_SECS;
use crate::store::{ImageReference, RotationStore, StoreError};
use crate::telegram::{ChatPlatform, TelegramError};

/// Notice sent to the destination when the queue is empty.
pub const NO_IMAGES_MESSAGE: &str = "No images available to update the profile picture.";

/// Messages that can be sent to the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationMessage {
    /// Rotate now and restart the period.
    RotateNow,
    /// Stop the scheduler.
    Shutdown,
}

/// What a single rotation did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RotationOutcome {
    /// No destination chat is remembered yet.
    NoDestination,
    /// The queue had nothing to apply.
    QueueEmpty,
    /// The image is now the chat photo.
    Applied(ImageReference),
    /// The image was consumed but could not be applied.
    Failed { image: ImageReference, error: String },
    /// The state files could not be read or written.
    StoreUnavailable,
}

#[derive(Debug, Error)]
enum ApplyError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Platform(#[from] TelegramError),
}

/// Weekly group photo rotation.
pub struct RotationScheduler {
    /// Platform client.
    platform: Arc<dyn ChatPlatform>,

    /// Queue and destination.
    store: Arc<RotationStore>,

    /// Delay between rotations.
    period: Duration,
}

impl RotationScheduler {
    /// Creates a scheduler with the default one-week period.
    #[must_use]
    pub fn new(platform: Arc<dyn ChatPlatform>, store: Arc<RotationStore>) -> Self {
        Self {
            platform,
            store,
            period: Duration::from_secs(DEFAULT_ROTATION_INTERVAL_SECS),
        }
    }

    /// Sets the delay between rotations.
    #[must_use]
    pub const fn with_period(mut self, period: Duration) -> Self {
        self.period = period;
        self
    }

    /// Runs the scheduler loop: rotate, wait one period, repeat.
    pub async fn run(&self, mut rx: mpsc::Receiver<RotationMessage>) {
        info!(
            "Rotation scheduler started, period {}",
            format_duration(self.period.as_secs())
        );

        loop {
            let outcome = self.rotate_once().await;
            debug!("Rotation finished: {:?}", outcome);

            if let Some(next) = chrono::Duration::from_std(self.period)
                .ok()
                .and_then(|period| Utc::now().checked_add_signed(period))
            {
                info!("Next rotation at {}", next.format("%Y-%m-%d %H:%M:%S UTC"));
            }

            tokio::select! {
                () = tokio::time::sleep(self.period) => {}
                msg = rx.recv() => {
                    match msg {
                        Some(RotationMessage::RotateNow) => {
                            debug!("Received rotate-now message");
                        }
                        Some(RotationMessage::Shutdown) | None => {
                            info!("Rotation scheduler shutting down");
                            break;
                        }
                    }
                }
            }
        }
    }

    /// Applies the next queued image to the destination chat.
    pub async fn rotate_once(&self) -> RotationOutcome {
        let destination = match self.store.destination().await {
            Ok(Some(destination)) => destination,
            Ok(None) => {
                info!("No destination chat set yet, skipping rotation");
                return RotationOutcome::NoDestination;
            }
            Err(e) => {
                error!("Failed to load destination: {}", e);
                return RotationOutcome::StoreUnavailable;
            }
        };
        let chat_id = ChatId::from(destination);

        let image = match self.store.pop_front().await {
            Ok(Some(image)) => image,
            Ok(None) => {
                info!("Image queue is empty, nothing to rotate");
                self.notify(chat_id, NO_IMAGES_MESSAGE).await;
                return RotationOutcome::QueueEmpty;
            }
            Err(e) => {
                error!("Failed to pop from image queue: {}", e);
                return RotationOutcome::StoreUnavailable;
            }
        };

        let outcome = match self.apply(chat_id, &image).await {
            Ok(()) => {
                info!("Photo of chat {} updated to {}", destination, image);
                self.notify(chat_id, &format!("Profile picture updated to: {image}"))
                    .await;
                RotationOutcome::Applied(image.clone())
            }
            Err(e) => {
                warn!("Failed to apply {} to chat {}: {}", image, destination, e);
                self.notify(chat_id, &format!("Failed to update profile picture: {e}"))
                    .await;
                RotationOutcome::Failed {
                    image: image.clone(),
                    error: e.to_string(),
                }
            }
        };

        if let Err(e) = self.store.release_image(&image).await {
            warn!("Failed to remove consumed image: {}", e);
        }

        outcome
    }

    async fn apply(&self, chat_id: ChatId, image: &ImageReference) -> Result<(), ApplyError> {
        let bytes = self.store.read_image(image).await?;
        self.platform
            .set_chat_photo(chat_id, bytes, &image.file_name())
            .await?;
        Ok(())
    }

    async fn notify(&self, chat_id: ChatId, text: &str) {
        if let Err(e) = self.platform.send_text(chat_id, text).await {
            warn!("Failed to send notice to chat {}: {}", chat_id.0, e);
        }
    }

    /// Gets the delay between rotations.
    #[must_use]
    pub const fn period(&self) -> Duration {
        self.period
    }
}

impl std::fmt::Debug for RotationScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RotationScheduler")
            .field("period", &self.period)
            .finish_non_exhaustive()
    }
}

/// Formats a duration in seconds to a human-readable string.
fn format_duration(secs: u64) -> String {
    if secs < 60 {
        format!("{secs}s")
    } else if secs < 3600 {
        format!("{}m", secs / 60)
    } else if secs < 86_400 {
        let hours = secs / 3600;
        let mins = (secs % 3600) / 60;
        if mins == 0 {
            format!("{hours}h")
        } else {
            format!("{hours}h {mins}m")
        }
    } else {
        let days = secs / 86_400;
        let hours = (secs % 86_400) / 3600;
        if hours == 0 {
            format!("{days}d")
        } else {
            format!("{days}d {hours}h")
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::store::DestinationId;
    use crate::telegram::MockChatPlatform;

    const GROUP: i64 = -1_001_000;

    type Sent = Arc<Mutex<Vec<String>>>;

    /// Mock that records notices and applied file names.
    fn recording_platform(apply_fails: bool) -> (MockChatPlatform, Sent, Sent) {
        let notices: Sent = Arc::default();
        let applied: Sent = Arc::default();
        let mut mock = MockChatPlatform::new();

        let sink = Arc::clone(&notices);
        mock.expect_send_text()
            .withf(|chat_id, _| *chat_id == ChatId(GROUP))
            .returning(move |_, text| {
                sink.lock().unwrap().push(text.to_owned());
                Ok(())
            });

        let sink = Arc::clone(&applied);
        mock.expect_set_chat_photo().returning(move |_, _, name| {
            if apply_fails {
                return Err(TelegramError::Other("Bad Request: not enough rights".to_owned()));
            }
            sink.lock().unwrap().push(name.to_owned());
            Ok(())
        });

        (mock, notices, applied)
    }

    async fn store_with(
        dir: &tempfile::TempDir,
        destination: Option<i64>,
        images: &[&str],
    ) -> Arc<RotationStore> {
        let store = RotationStore::open(dir.path()).await.unwrap();
        if let Some(id) = destination {
            store.capture_destination(DestinationId::new(id)).await.unwrap();
        }
        for name in images {
            store.enqueue_image(name, b"jpeg").await.unwrap();
        }
        Arc::new(store)
    }

    #[tokio::test]
    async fn test_rotation_applies_head_and_keeps_rest() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_with(&dir, Some(GROUP), &["a", "b"]).await;
        let (mock, notices, applied) = recording_platform(false);
        let scheduler = RotationScheduler::new(Arc::new(mock), Arc::clone(&store));

        let image = match scheduler.rotate_once().await {
            RotationOutcome::Applied(image) => image,
            other => panic!("expected Applied, got {other:?}"),
        };
        assert!(image.as_str().ends_with("a.jpg"));
        assert_eq!(*applied.lock().unwrap(), ["a.jpg"]);

        let queue = store.queue().await.unwrap();
        assert_eq!(queue.len(), 1);
        assert!(queue.peek().unwrap().as_str().ends_with("b.jpg"));

        let notices = notices.lock().unwrap();
        assert_eq!(notices.len(), 1);
        assert!(notices[0].starts_with("Profile picture updated to: "));
        assert!(notices[0].ends_with("a.jpg"));
        assert!(!image.path().exists());
    }

    #[tokio::test]
    async fn test_duplicate_uploads_both_rotate() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_with(&dir, Some(GROUP), &["SAMEID", "SAMEID"]).await;
        let (mock, notices, applied) = recording_platform(false);
        let scheduler = RotationScheduler::new(Arc::new(mock), Arc::clone(&store));

        let first = scheduler.rotate_once().await;
        assert!(matches!(&first, RotationOutcome::Applied(image) if image.path().exists()));
        let image = match scheduler.rotate_once().await {
            RotationOutcome::Applied(image) => image,
            other => panic!("second copy was not applied: {other:?}"),
        };

        assert_eq!(*applied.lock().unwrap(), ["SAMEID.jpg", "SAMEID.jpg"]);
        assert!(store.queue().await.unwrap().is_empty());
        assert!(!image.path().exists());
        assert!(
            notices
                .lock()
                .unwrap()
                .iter()
                .all(|notice| notice.starts_with("Profile picture updated to: "))
        );
    }

    #[tokio::test]
    async fn test_empty_queue_sends_notice() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_with(&dir, Some(GROUP), &[]).await;
        let (mock, notices, applied) = recording_platform(false);
        let scheduler = RotationScheduler::new(Arc::new(mock), Arc::clone(&store));

        assert_eq!(scheduler.rotate_once().await, RotationOutcome::QueueEmpty);
        assert!(store.queue().await.unwrap().is_empty());
        assert!(applied.lock().unwrap().is_empty());
        assert_eq!(*notices.lock().unwrap(), [NO_IMAGES_MESSAGE]);
    }

    #[tokio::test]
    async fn test_no_destination_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_with(&dir, None, &["a"]).await;
        let mut mock = MockChatPlatform::new();
        mock.expect_send_text().never();
        mock.expect_set_chat_photo().never();
        let scheduler = RotationScheduler::new(Arc::new(mock), Arc::clone(&store));

        assert_eq!(scheduler.rotate_once().await, RotationOutcome::NoDestination);
        assert_eq!(store.queue().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_apply_still_consumes_image() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_with(&dir, Some(GROUP), &["a", "b"]).await;
        let (mock, notices, _) = recording_platform(true);
        let scheduler = RotationScheduler::new(Arc::new(mock), Arc::clone(&store));

        let outcome = scheduler.rotate_once().await;

        assert!(matches!(outcome, RotationOutcome::Failed { .. }));
        assert_eq!(store.queue().await.unwrap().len(), 1);
        let notices = notices.lock().unwrap();
        assert_eq!(
            *notices,
            ["Failed to update profile picture: Platform error: Bad Request: not enough rights"]
        );
    }

    #[tokio::test]
    async fn test_missing_image_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_with(&dir, Some(GROUP), &[]).await;
        store
            .append(ImageReference::new(dir.path().join("gone.jpg").to_string_lossy()))
            .await
            .unwrap();
        let mut mock = MockChatPlatform::new();
        mock.expect_set_chat_photo().never();
        mock.expect_send_text()
            .withf(|_, text| text.starts_with("Failed to update profile picture: "))
            .times(1)
            .returning(|_, _| Ok(()));
        let scheduler = RotationScheduler::new(Arc::new(mock), Arc::clone(&store));

        assert!(matches!(
            scheduler.rotate_once().await,
            RotationOutcome::Failed { .. }
        ));
        assert!(store.queue().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_notice_failure_does_not_stop_rotation() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_with(&dir, Some(GROUP), &["a"]).await;
        let mut mock = MockChatPlatform::new();
        mock.expect_set_chat_photo().returning(|_, _, _| Ok(()));
        mock.expect_send_text()
            .returning(|_, _| Err(TelegramError::FloodWait(5)));
        let scheduler = RotationScheduler::new(Arc::new(mock), Arc::clone(&store));

        assert!(matches!(
            scheduler.rotate_once().await,
            RotationOutcome::Applied(_)
        ));
    }

    #[tokio::test]
    async fn test_run_handles_rotate_now_and_shutdown() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_with(&dir, Some(GROUP), &["a", "b", "c"]).await;
        let (mock, _, applied) = recording_platform(false);
        let scheduler = RotationScheduler::new(Arc::new(mock), Arc::clone(&store));

        let (tx, rx) = mpsc::channel(4);
        tx.send(RotationMessage::RotateNow).await.unwrap();
        tx.send(RotationMessage::Shutdown).await.unwrap();
        scheduler.run(rx).await;

        assert_eq!(*applied.lock().unwrap(), ["a.jpg", "b.jpg"]);
        assert_eq!(store.queue().await.unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_waits_one_period_between_rotations() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_with(&dir, Some(GROUP), &["a", "b", "c"]).await;
        let (mock, _, applied) = recording_platform(false);
        let scheduler = RotationScheduler::new(Arc::new(mock), Arc::clone(&store))
            .with_period(Duration::from_secs(600));

        let (tx, rx) = mpsc::channel(4);
        let handle = tokio::spawn(async move { scheduler.run(rx).await });

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(applied.lock().unwrap().len(), 1);

        tokio::time::sleep(Duration::from_secs(300)).await;
        assert_eq!(applied.lock().unwrap().len(), 1);

        tokio::time::sleep(Duration::from_secs(300)).await;
        assert_eq!(applied.lock().unwrap().len(), 2);

        tx.send(RotationMessage::Shutdown).await.unwrap();
        handle.await.unwrap();
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(30), "30s");
        assert_eq!(format_duration(90), "1m");
        assert_eq!(format_duration(3660), "1h 1m");
        assert_eq!(format_duration(604_800), "7d");
        assert_eq!(format_duration(90_000), "1d 1h");
    }
}
