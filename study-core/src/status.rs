//! Read-only views over the content cache. Nothing here calls the model.

use serde::{Deserialize, Serialize};

use crate::content::{Assessment, Quiz};
use crate::curriculum::{CurriculumLookup, TopicKey};
use crate::error::{Result, StudyError};
use crate::store::ContentStore;

/// How much of a curriculum is already cached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentStatus {
    pub total_topics: usize,
    pub lessons_cached: usize,
    pub quizzes_cached: usize,
    /// Every topic has a lesson and at least one quiz version.
    pub ready: bool,
}

pub fn content_status(
    curricula: &dyn CurriculumLookup,
    content: &dyn ContentStore,
    curriculum_id: &str,
) -> Result<ContentStatus> {
    let curriculum = curricula
        .get_curriculum(curriculum_id)?
        .ok_or_else(|| StudyError::curriculum_not_found(curriculum_id))?;

    let mut lessons_cached = 0;
    let mut quizzes_cached = 0;
    for (c, t, _) in curriculum.topics() {
        let key = TopicKey::new(curriculum_id, c, t);
        if content.get_lesson(&key)?.is_some() {
            lessons_cached += 1;
        }
        if content.count_quiz_versions(&key)? > 0 {
            quizzes_cached += 1;
        }
    }

    let total_topics = curriculum.total_topics();
    Ok(ContentStatus {
        total_topics,
        lessons_cached,
        quizzes_cached,
        ready: lessons_cached == total_topics && quizzes_cached == total_topics,
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizHistoryEntry {
    pub version: u32,
    pub quiz: Quiz,
    /// Assessments graded against this version, newest first.
    pub assessments: Vec<Assessment>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizHistory {
    pub total_quizzes: u32,
    pub history: Vec<QuizHistoryEntry>,
}

/// Every stored quiz version of `key` with the assessments taken on it.
///
/// Versions whose file is unreadable are skipped.
pub fn quiz_history(content: &dyn ContentStore, key: &TopicKey) -> Result<QuizHistory> {
    let total_quizzes = content.count_quiz_versions(key)?;
    let assessments = content.list_assessments(key)?;

    let mut history = Vec::new();
    for version in 0..total_quizzes {
        if let Some((quiz, _)) = content.get_quiz(key, Some(version))? {
            history.push(QuizHistoryEntry {
                version,
                quiz,
                assessments: assessments
                    .iter()
                    .filter(|a| a.quiz_version == version)
                    .cloned()
                    .collect(),
            });
        }
    }

    Ok(QuizHistory {
        total_quizzes,
        history,
    })
}
