//! FIFO queue of uploaded image references.

use std::collections::VecDeque;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::StoreError;
use super::error::{load_json, save_json};

/// Path of one stored upload, exactly as recorded in the queue file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageReference(String);

impl ImageReference {
    /// Creates a reference from a stored path.
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    /// Returns the reference as recorded.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the reference as a filesystem path.
    #[must_use]
    pub fn path(&self) -> &Path {
        Path::new(&self.0)
    }

    /// File name sent along with the bytes when the image is applied.
    #[must_use]
    pub fn file_name(&self) -> String {
        self.path().file_name().map_or_else(
            || "photo.jpg".to_owned(),
            |name| name.to_string_lossy().into_owned(),
        )
    }
}

impl fmt::Display for ImageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&Path> for ImageReference {
    fn from(path: &Path) -> Self {
        Self(path.to_string_lossy().into_owned())
    }
}

/// Images waiting to be applied, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageQueue {
    entries: VecDeque<ImageReference>,
}

impl ImageQueue {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads the queue from a JSON file, returns an empty queue if not found.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        load_json(path.as_ref())
    }

    /// Saves the queue to a JSON file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), StoreError> {
        save_json(path.as_ref(), self)
    }

    /// Appends an image at the tail.
    pub fn push(&mut self, image: ImageReference) {
        self.entries.push_back(image);
    }

    /// Removes and returns the oldest image.
    pub fn pop(&mut self) -> Option<ImageReference> {
        self.entries.pop_front()
    }

    /// Returns the oldest image without removing it.
    #[must_use]
    pub fn peek(&self) -> Option<&ImageReference> {
        self.entries.front()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ImageReference> {
        self.entries.iter()
    }
}

impl FromIterator<ImageReference> for ImageQueue {
    fn from_iter<I: IntoIterator<Item = ImageReference>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
