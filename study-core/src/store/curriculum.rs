//! File-backed curriculum and progress storage.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use super::{ContentStore, StoreError, read_json, write_json};
use crate::curriculum::{
    Curriculum, CurriculumLookup, CurriculumRecord, CurriculumSummary, LearningProgress,
    ProgressTracker, TopicKey, TopicProgress,
};

/// Curricula file name
const CURRICULUMS_FILE: &str = "curriculums.json";

/// Progress file name
const PROGRESS_FILE: &str = "progress.json";

/// Stores curricula (newest first) and per-curriculum progress as two JSON
/// files. Deleting a curriculum also drops its cached content.
pub struct FileCurriculumStore {
    curriculums_path: PathBuf,
    progress_path: PathBuf,
    content: Arc<dyn ContentStore>,
    lock: Mutex<()>,
}

impl FileCurriculumStore {
    pub fn new(data_dir: &Path, content: Arc<dyn ContentStore>) -> Self {
        Self {
            curriculums_path: data_dir.join(CURRICULUMS_FILE),
            progress_path: data_dir.join(PROGRESS_FILE),
            content,
            lock: Mutex::new(()),
        }
    }

    // Serializes read-modify-write cycles within the process. The guard
    // protects no data, so a poisoned lock is still usable.
    fn guard(&self) -> MutexGuard<'_, ()> {
        self.lock.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn load_records(&self) -> Result<Vec<CurriculumRecord>, StoreError> {
        Ok(read_json(&self.curriculums_path)?.unwrap_or_default())
    }

    fn load_progress(&self) -> Result<HashMap<String, LearningProgress>, StoreError> {
        Ok(read_json(&self.progress_path)?.unwrap_or_default())
    }

    /// Store a curriculum under a fresh 8-character id and return the id.
    pub fn save(&self, curriculum: Curriculum) -> Result<String, StoreError> {
        let _guard = self.guard();
        let mut records = self.load_records()?;

        let id: String = Uuid::new_v4().simple().to_string().chars().take(8).collect();
        let subject = curriculum.subject.clone();
        records.insert(
            0,
            CurriculumRecord {
                id: id.clone(),
                created_at: Utc::now(),
                curriculum,
            },
        );
        write_json(&self.curriculums_path, &records)?;

        info!(id = %id, subject = %subject, "saved curriculum");
        Ok(id)
    }

    pub fn get(&self, id: &str) -> Result<Option<CurriculumRecord>, StoreError> {
        Ok(self.load_records()?.into_iter().find(|r| r.id == id))
    }

    /// Summaries of every stored curriculum, newest first.
    pub fn list(&self) -> Result<Vec<CurriculumSummary>, StoreError> {
        let records = self.load_records()?;
        let progress = self.load_progress()?;

        Ok(records
            .into_iter()
            .map(|record| {
                let completed_topics = progress
                    .get(&record.id)
                    .map(LearningProgress::completed_topics)
                    .unwrap_or(0);
                CurriculumSummary {
                    cluster_count: record.curriculum.clusters.len(),
                    topic_count: record.curriculum.total_topics(),
                    completed_topics,
                    id: record.id,
                    created_at: record.created_at,
                    subject: record.curriculum.subject,
                    description: record.curriculum.description,
                }
            })
            .collect())
    }

    /// Delete a curriculum with its progress and cached content.
    ///
    /// Returns `false` when no curriculum has that id.
    pub fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let _guard = self.guard();
        let mut records = self.load_records()?;
        let before = records.len();
        records.retain(|r| r.id != id);
        if records.len() == before {
            return Ok(false);
        }
        write_json(&self.curriculums_path, &records)?;

        let mut progress = self.load_progress()?;
        if progress.remove(id).is_some() {
            write_json(&self.progress_path, &progress)?;
        }

        self.content.delete_all(id)?;
        info!(id, "deleted curriculum");
        Ok(true)
    }

    pub fn progress(&self, id: &str) -> Result<Option<LearningProgress>, StoreError> {
        Ok(self.load_progress()?.remove(id))
    }

    /// Start tracking progress. Existing progress is returned unchanged.
    pub fn init_progress(&self, id: &str) -> Result<LearningProgress, StoreError> {
        let _guard = self.guard();
        let mut all = self.load_progress()?;
        if let Some(existing) = all.get(id) {
            return Ok(existing.clone());
        }

        let progress = LearningProgress::new(id);
        all.insert(id.to_string(), progress.clone());
        write_json(&self.progress_path, &all)?;
        info!(id, "started learning");
        Ok(progress)
    }

    /// Record the state of one topic and bump `last_activity`.
    pub fn update_topic_progress(
        &self,
        key: &TopicKey,
        completed: bool,
        quiz_score: Option<u32>,
    ) -> Result<LearningProgress, StoreError> {
        let _guard = self.guard();
        let mut all = self.load_progress()?;
        let now = Utc::now();

        let progress = all
            .entry(key.curriculum_id.clone())
            .or_insert_with(|| LearningProgress::new(key.curriculum_id.clone()));
        progress.topics.insert(
            key.slug(),
            TopicProgress {
                completed,
                quiz_score,
                completed_at: completed.then_some(now),
            },
        );
        progress.last_activity = now;
        let updated = progress.clone();

        write_json(&self.progress_path, &all)?;
        if completed {
            info!(topic = %key, score = ?quiz_score, "topic completed");
        }
        Ok(updated)
    }
}

impl CurriculumLookup for FileCurriculumStore {
    fn get_curriculum(&self, id: &str) -> Result<Option<Curriculum>, StoreError> {
        Ok(self.get(id)?.map(|r| r.curriculum))
    }
}

impl ProgressTracker for FileCurriculumStore {
    fn mark_topic_completed(&self, key: &TopicKey, score: u32) -> Result<(), StoreError> {
        self.update_topic_progress(key, true, Some(score)).map(|_| ())
    }
}
