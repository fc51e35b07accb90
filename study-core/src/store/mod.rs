//! Durable storage for curricula, progress and generated content.
//!
//! Everything is plain JSON files under the data directory:
//!
//! ```text
//! <data_dir>/
//! ├── curriculums.json
//! ├── progress.json
//! └── content/<curriculum_id>/
//!     ├── lessons/{c}-{t}.json
//!     ├── quizzes/{c}-{t}/quiz_{version}.json
//!     ├── assessments/{c}-{t}/quiz_{version}_{timestamp}.json
//!     └── chats/{c}-{t}.json
//! ```
//!
//! Unreadable or schema-mismatched files are logged and treated as absent.
//! Any other I/O failure is returned to the caller.

mod content;
mod curriculum;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::warn;

use study_models::Message;

use crate::content::{Assessment, Lesson, Quiz};
use crate::curriculum::TopicKey;

pub use content::FileContentStore;
pub use curriculum::FileCurriculumStore;

/// Errors from the file stores.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to serialize {}: {source}", path.display())]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Curriculum id that cannot be used as a directory name.
    #[error("invalid curriculum id: {0:?}")]
    InvalidId(String),
}

/// Immutable-artifact storage addressed by topic key.
///
/// Lessons occupy a single slot, quizzes are append-only numbered versions
/// starting at 0, assessments are append-only timestamped records and chats
/// are an append-only transcript.
pub trait ContentStore: Send + Sync {
    fn get_lesson(&self, key: &TopicKey) -> Result<Option<Lesson>, StoreError>;

    /// Write `lesson` as the only lesson for `key`, replacing any earlier one.
    fn put_lesson(&self, key: &TopicKey, lesson: &Lesson) -> Result<(), StoreError>;

    fn count_quiz_versions(&self, key: &TopicKey) -> Result<u32, StoreError>;

    /// Fetch a quiz version, or the latest one when `version` is `None`.
    /// Returns the quiz together with the version it resolved to.
    fn get_quiz(&self, key: &TopicKey, version: Option<u32>)
    -> Result<Option<(Quiz, u32)>, StoreError>;

    /// Store a new quiz version and return its number.
    fn put_quiz(&self, key: &TopicKey, quiz: &Quiz) -> Result<u32, StoreError>;

    /// Append an assessment record tagged with `quiz_version`.
    fn save_assessment(
        &self,
        key: &TopicKey,
        quiz_version: u32,
        assessment: &Assessment,
    ) -> Result<(), StoreError>;

    /// All assessments for `key`, newest first.
    fn list_assessments(&self, key: &TopicKey) -> Result<Vec<Assessment>, StoreError>;

    fn chat_history(&self, key: &TopicKey) -> Result<Vec<Message>, StoreError>;

    /// Append one message and return the updated transcript.
    fn append_chat_message(
        &self,
        key: &TopicKey,
        message: Message,
    ) -> Result<Vec<Message>, StoreError>;

    fn replace_chat_history(&self, key: &TopicKey, messages: &[Message]) -> Result<(), StoreError>;

    /// Remove every artifact of a curriculum. Deleting twice is fine.
    fn delete_all(&self, curriculum_id: &str) -> Result<(), StoreError>;
}

/// Reject ids that would escape the content directory.
pub(crate) fn validate_id(id: &str) -> Result<(), StoreError> {
    let valid = !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidId(id.to_string()))
    }
}

/// Read and deserialize a JSON file.
///
/// A missing file is `Ok(None)`. So is a file that is not valid UTF-8 or
/// does not match `T`, after a warning.
pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, StoreError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) if e.kind() == io::ErrorKind::InvalidData => {
            warn!(path = %path.display(), error = %e, "ignoring unreadable artifact");
            return Ok(None);
        }
        Err(source) => {
            return Err(StoreError::Read {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    match serde_json::from_str(&content) {
        Ok(value) => Ok(Some(value)),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "ignoring corrupt artifact");
            Ok(None)
        }
    }
}

pub(crate) fn to_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<String, StoreError> {
    serde_json::to_string_pretty(value).map_err(|source| StoreError::Serialize {
        path: path.to_path_buf(),
        source,
    })
}

pub(crate) fn create_dir(dir: &Path) -> Result<(), StoreError> {
    fs::create_dir_all(dir).map_err(|source| StoreError::Write {
        path: dir.to_path_buf(),
        source,
    })
}

/// Serialize `value` to `path`, creating parent directories as needed.
pub(crate) fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), StoreError> {
    let content = to_json(path, value)?;
    if let Some(parent) = path.parent() {
        create_dir(parent)?;
    }
    fs::write(path, content).map_err(|source| StoreError::Write {
        path: path.to_path_buf(),
        source,
    })
}
