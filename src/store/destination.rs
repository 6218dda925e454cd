//! The remembered destination chat.

use std::fmt;
use std::io::ErrorKind;
use std::path::Path;

use serde::{Deserialize, Serialize};
use teloxide::types::ChatId;

use super::StoreError;
use super::error::{load_json, save_json};

/// Chat whose photo is rotated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DestinationId(i64);

impl DestinationId {
    #[must_use]
    pub const fn new(chat_id: i64) -> Self {
        Self(chat_id)
    }

    #[must_use]
    pub const fn as_i64(self) -> i64 {
        self.0
    }
}

impl fmt::Display for DestinationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<DestinationId> for ChatId {
    fn from(id: DestinationId) -> Self {
        Self(id.0)
    }
}

impl From<ChatId> for DestinationId {
    fn from(id: ChatId) -> Self {
        Self(id.0)
    }
}

/// On-disk form of the destination file: `{"chat_id": <id>}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DestinationRecord {
    #[serde(default)]
    pub chat_id: Option<DestinationId>,
}

impl DestinationRecord {
    /// Loads the record, returns an unset record if the file is not found.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        load_json(path.as_ref())
    }

    /// Saves the record to a JSON file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), StoreError> {
        save_json(path.as_ref(), self)
    }

    /// Removes the destination file. Succeeds if it is already gone.
    pub fn remove(path: impl AsRef<Path>) -> Result<(), StoreError> {
        let path = path.as_ref();
        match std::fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::io(path, e)),
        }
    }
}
