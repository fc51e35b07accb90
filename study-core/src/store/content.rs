//! File-backed [`ContentStore`].

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde_json::Value;
use tempfile::NamedTempFile;
use tracing::{info, warn};

use study_models::Message;

use super::{
    ContentStore, StoreError, create_dir, read_json, to_json, validate_id, write_json,
};
use crate::content::{Assessment, Lesson, Quiz};
use crate::curriculum::TopicKey;

const LESSONS_DIR: &str = "lessons";
const QUIZZES_DIR: &str = "quizzes";
const ASSESSMENTS_DIR: &str = "assessments";
const CHATS_DIR: &str = "chats";

/// `chrono` format for assessment file timestamps, nanosecond resolution.
const ASSESSMENT_TIMESTAMP: &str = "%Y%m%d_%H%M%S_%f";

/// Content cache rooted at `<data_dir>/content`.
#[derive(Debug, Clone)]
pub struct FileContentStore {
    root: PathBuf,
}

impl FileContentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn curriculum_dir(&self, curriculum_id: &str) -> Result<PathBuf, StoreError> {
        validate_id(curriculum_id)?;
        Ok(self.root.join(curriculum_id))
    }

    fn lesson_path(&self, key: &TopicKey) -> Result<PathBuf, StoreError> {
        Ok(self
            .curriculum_dir(&key.curriculum_id)?
            .join(LESSONS_DIR)
            .join(format!("{}.json", key.slug())))
    }

    fn quiz_dir(&self, key: &TopicKey) -> Result<PathBuf, StoreError> {
        Ok(self
            .curriculum_dir(&key.curriculum_id)?
            .join(QUIZZES_DIR)
            .join(key.slug()))
    }

    fn assessment_dir(&self, key: &TopicKey) -> Result<PathBuf, StoreError> {
        Ok(self
            .curriculum_dir(&key.curriculum_id)?
            .join(ASSESSMENTS_DIR)
            .join(key.slug()))
    }

    fn chat_path(&self, key: &TopicKey) -> Result<PathBuf, StoreError> {
        Ok(self
            .curriculum_dir(&key.curriculum_id)?
            .join(CHATS_DIR)
            .join(format!("{}.json", key.slug())))
    }
}

/// File names in `dir`, or nothing when it does not exist.
fn file_names(dir: &Path) -> Result<Vec<String>, StoreError> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(source) => {
            return Err(StoreError::Read {
                path: dir.to_path_buf(),
                source,
            });
        }
    };

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| StoreError::Read {
            path: dir.to_path_buf(),
            source,
        })?;
        if let Some(name) = entry.file_name().to_str() {
            names.push(name.to_string());
        }
    }
    Ok(names)
}

/// Version number of a `quiz_{n}.json` file name.
fn quiz_file_version(name: &str) -> Option<u32> {
    name.strip_prefix("quiz_")?
        .strip_suffix(".json")?
        .parse()
        .ok()
}

fn quiz_versions(dir: &Path) -> Result<Vec<u32>, StoreError> {
    Ok(file_names(dir)?
        .iter()
        .filter_map(|name| quiz_file_version(name))
        .collect())
}

/// Split `quiz_{version}_{timestamp}.json` into its version and timestamp.
///
/// The version falls back to 0 when it does not parse. Legacy timestamps
/// (`YYYYMMDD_HHMMSS`) sort before nanosecond ones written in the same second.
fn assessment_file_parts(name: &str) -> Option<(u32, &str)> {
    let stem = name.strip_suffix(".json")?;
    let rest = stem.strip_prefix("quiz_")?;
    let (version, timestamp) = rest.split_once('_').unwrap_or((rest, ""));
    Some((version.parse().unwrap_or(0), timestamp))
}

/// Write `content` to a file that must not already exist.
///
/// The content goes to a temp file beside `path` first and is linked into
/// place only when complete, so `path` never exists half-written.
/// `Ok(false)` means another writer claimed the path first.
fn write_new(path: &Path, content: &str) -> Result<bool, StoreError> {
    let write_err = |source| StoreError::Write {
        path: path.to_path_buf(),
        source,
    };
    let dir = path.parent().unwrap_or_else(|| Path::new("."));

    let mut file = NamedTempFile::new_in(dir).map_err(write_err)?;
    file.write_all(content.as_bytes()).map_err(write_err)?;
    file.as_file().sync_all().map_err(write_err)?;

    match file.persist_noclobber(path) {
        Ok(_) => Ok(true),
        Err(e) if e.error.kind() == io::ErrorKind::AlreadyExists => Ok(false),
        Err(e) => Err(write_err(e.error)),
    }
}

impl ContentStore for FileContentStore {
    fn get_lesson(&self, key: &TopicKey) -> Result<Option<Lesson>, StoreError> {
        let lesson = read_json(&self.lesson_path(key)?)?;
        if lesson.is_some() {
            info!(topic = %key, "loaded cached lesson");
        }
        Ok(lesson)
    }

    fn put_lesson(&self, key: &TopicKey, lesson: &Lesson) -> Result<(), StoreError> {
        write_json(&self.lesson_path(key)?, lesson)?;
        info!(topic = %key, "cached lesson");
        Ok(())
    }

    fn count_quiz_versions(&self, key: &TopicKey) -> Result<u32, StoreError> {
        Ok(quiz_versions(&self.quiz_dir(key)?)?.len() as u32)
    }

    fn get_quiz(
        &self,
        key: &TopicKey,
        version: Option<u32>,
    ) -> Result<Option<(Quiz, u32)>, StoreError> {
        let dir = self.quiz_dir(key)?;
        let version = match version {
            Some(v) => v,
            None => match quiz_versions(&dir)?.into_iter().max() {
                Some(latest) => latest,
                None => return Ok(None),
            },
        };

        let quiz: Option<Quiz> = read_json(&dir.join(format!("quiz_{}.json", version)))?;
        Ok(quiz.map(|quiz| {
            info!(topic = %key, version, "loaded cached quiz");
            (quiz, version)
        }))
    }

    fn put_quiz(&self, key: &TopicKey, quiz: &Quiz) -> Result<u32, StoreError> {
        let dir = self.quiz_dir(key)?;
        create_dir(&dir)?;

        let content = to_json(&dir, quiz)?;
        let mut version = quiz_versions(&dir)?.len() as u32;
        loop {
            let path = dir.join(format!("quiz_{}.json", version));
            if write_new(&path, &content)? {
                info!(topic = %key, version, "cached quiz");
                return Ok(version);
            }
            version += 1;
        }
    }

    fn save_assessment(
        &self,
        key: &TopicKey,
        quiz_version: u32,
        assessment: &Assessment,
    ) -> Result<(), StoreError> {
        let dir = self.assessment_dir(key)?;
        let mut record = assessment.clone();
        record.quiz_version = quiz_version;
        let content = to_json(&dir, &record)?;
        create_dir(&dir)?;

        loop {
            let timestamp = Utc::now().format(ASSESSMENT_TIMESTAMP);
            let path = dir.join(format!("quiz_{}_{}.json", quiz_version, timestamp));
            if write_new(&path, &content)? {
                info!(topic = %key, quiz_version, "saved assessment");
                return Ok(());
            }
        }
    }

    fn list_assessments(&self, key: &TopicKey) -> Result<Vec<Assessment>, StoreError> {
        let dir = self.assessment_dir(key)?;
        let names = file_names(&dir)?;

        let mut files: Vec<(&str, u32, &str)> = names
            .iter()
            .filter_map(|name| {
                assessment_file_parts(name).map(|(version, ts)| (name.as_str(), version, ts))
            })
            .collect();
        files.sort_by(|a, b| b.2.cmp(a.2).then_with(|| b.0.cmp(a.0)));

        let mut assessments = Vec::with_capacity(files.len());
        for (name, file_version, _) in files {
            let path = dir.join(name);
            let Some(mut value) = read_json::<Value>(&path)? else {
                continue;
            };
            if let Some(obj) = value.as_object_mut() {
                obj.entry("quiz_version").or_insert(Value::from(file_version));
            }
            match serde_json::from_value(value) {
                Ok(assessment) => assessments.push(assessment),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "ignoring corrupt assessment")
                }
            }
        }
        Ok(assessments)
    }

    fn chat_history(&self, key: &TopicKey) -> Result<Vec<Message>, StoreError> {
        Ok(read_json(&self.chat_path(key)?)?.unwrap_or_default())
    }

    fn append_chat_message(
        &self,
        key: &TopicKey,
        message: Message,
    ) -> Result<Vec<Message>, StoreError> {
        let mut history = self.chat_history(key)?;
        history.push(message);
        self.replace_chat_history(key, &history)?;
        Ok(history)
    }

    fn replace_chat_history(&self, key: &TopicKey, messages: &[Message]) -> Result<(), StoreError> {
        write_json(&self.chat_path(key)?, messages)
    }

    fn delete_all(&self, curriculum_id: &str) -> Result<(), StoreError> {
        let dir = self.curriculum_dir(curriculum_id)?;
        match fs::remove_dir_all(&dir) {
            Ok(()) => {
                info!(curriculum_id, "deleted cached content");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StoreError::Write { path: dir, source }),
        }
    }
}
