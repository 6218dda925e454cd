//! Store facade used by the router and the rotation task.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::sync::Mutex;
use tracing::{debug, info};

use super::{
    DESTINATION_FILE_NAME, DestinationId, DestinationRecord, IMAGES_DIR_NAME, ImageQueue,
    ImageReference, QUEUE_FILE_NAME, StoreError,
};

/// Image queue, destination and image bytes under one data directory.
///
/// Each load-modify-save cycle runs under an in-process lock, so concurrent
/// webhook requests served by the same process cannot lose an append.
/// Separate processes sharing the directory still race (last save wins).
#[derive(Debug)]
pub struct RotationStore {
    queue_path: PathBuf,
    destination_path: PathBuf,
    images_dir: PathBuf,
    lock: Mutex<()>,
}

impl RotationStore {
    /// Creates a store rooted at `data_dir` without touching the filesystem.
    #[must_use]
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        let data_dir = data_dir.as_ref();
        Self {
            queue_path: data_dir.join(QUEUE_FILE_NAME),
            destination_path: data_dir.join(DESTINATION_FILE_NAME),
            images_dir: data_dir.join(IMAGES_DIR_NAME),
            lock: Mutex::new(()),
        }
    }

    /// Creates the store and makes sure the image directory exists.
    pub async fn open(data_dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let store = Self::new(data_dir);
        tokio::fs::create_dir_all(&store.images_dir)
            .await
            .map_err(|e| StoreError::io(&store.images_dir, e))?;
        debug!("Rotation store opened at {}", store.images_dir.display());
        Ok(store)
    }

    #[must_use]
    pub fn queue_path(&self) -> &Path {
        &self.queue_path
    }

    #[must_use]
    pub fn destination_path(&self) -> &Path {
        &self.destination_path
    }

    #[must_use]
    pub fn images_dir(&self) -> &Path {
        &self.images_dir
    }

    /// Returns a snapshot of the queue.
    pub async fn queue(&self) -> Result<ImageQueue, StoreError> {
        let _guard = self.lock.lock().await;
        ImageQueue::load(&self.queue_path)
    }

    /// Appends an image to the tail of the queue and returns the new length.
    pub async fn append(&self, image: ImageReference) -> Result<usize, StoreError> {
        let _guard = self.lock.lock().await;

        let mut queue = ImageQueue::load(&self.queue_path)?;
        queue.push(image);
        queue.save(&self.queue_path)?;

        Ok(queue.len())
    }

    /// Removes the head of the queue and persists the remainder.
    ///
    /// An empty queue is left untouched.
    pub async fn pop_front(&self) -> Result<Option<ImageReference>, StoreError> {
        let _guard = self.lock.lock().await;

        let mut queue = ImageQueue::load(&self.queue_path)?;
        let head = queue.pop();
        if head.is_some() {
            queue.save(&self.queue_path)?;
        }

        Ok(head)
    }

    /// Returns the remembered destination, if any.
    pub async fn destination(&self) -> Result<Option<DestinationId>, StoreError> {
        let _guard = self.lock.lock().await;
        Ok(DestinationRecord::load(&self.destination_path)?.chat_id)
    }

    /// Remembers `candidate` as the destination unless one is already set.
    ///
    /// Returns `true` only when this call set it.
    pub async fn capture_destination(&self, candidate: DestinationId) -> Result<bool, StoreError> {
        let _guard = self.lock.lock().await;

        let mut record = DestinationRecord::load(&self.destination_path)?;
        if record.chat_id.is_some() {
            return Ok(false);
        }

        record.chat_id = Some(candidate);
        record.save(&self.destination_path)?;
        info!("Destination chat set to {}", candidate);

        Ok(true)
    }

    /// Forgets the destination and returns what was stored.
    pub async fn clear_destination(&self) -> Result<Option<DestinationId>, StoreError> {
        let _guard = self.lock.lock().await;

        let previous = DestinationRecord::load(&self.destination_path)?.chat_id;
        DestinationRecord::remove(&self.destination_path)?;

        Ok(previous)
    }

    /// Writes downloaded image bytes under a name derived from `file_id` and
    /// appends the file to the queue. Returns the reference and the new length.
    ///
    /// Re-uploads of the same photo share one file, so the write and the
    /// append happen under the same lock that [`Self::release_image`] takes.
    pub async fn enqueue_image(
        &self,
        file_id: &str,
        bytes: &[u8],
    ) -> Result<(ImageReference, usize), StoreError> {
        let path = self.images_dir.join(format!("{}.jpg", sanitize_file_id(file_id)));

        let _guard = self.lock.lock().await;

        tokio::fs::create_dir_all(&self.images_dir)
            .await
            .map_err(|e| StoreError::io(&self.images_dir, e))?;
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| StoreError::io(&path, e))?;
        debug!("Stored {} bytes at {}", bytes.len(), path.display());

        let image = ImageReference::from(path.as_path());
        let mut queue = ImageQueue::load(&self.queue_path)?;
        queue.push(image.clone());
        queue.save(&self.queue_path)?;

        Ok((image, queue.len()))
    }

    /// Reads the bytes behind a queued reference.
    pub async fn read_image(&self, image: &ImageReference) -> Result<Vec<u8>, StoreError> {
        tokio::fs::read(image.path())
            .await
            .map_err(|e| StoreError::io(image.path(), e))
    }

    /// Deletes the bytes behind a consumed reference unless a queued entry
    /// still points at the same file.
    ///
    /// Returns `true` if the file is gone. Missing files are fine.
    pub async fn release_image(&self, image: &ImageReference) -> Result<bool, StoreError> {
        let _guard = self.lock.lock().await;

        let queue = ImageQueue::load(&self.queue_path)?;
        if queue.iter().any(|queued| queued == image) {
            debug!("Keeping {}, it is still queued", image);
            return Ok(false);
        }

        match tokio::fs::remove_file(image.path()).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(true),
            Err(e) => Err(StoreError::io(image.path(), e)),
        }
    }
}

/// Keeps platform file ids from escaping the image directory.
fn sanitize_file_id(file_id: &str) -> String {
    let cleaned: String = file_id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if cleaned.is_empty() {
        "photo".to_owned()
    } else {
        cleaned
    }
}
