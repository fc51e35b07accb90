//! Fetch-cached-or-generate for lessons and quizzes.

use std::sync::Arc;

use serde::Deserialize;
use tracing::info;

use crate::content::{DEFAULT_LESSON_MINUTES, DEFAULT_PASSING_SCORE, Lesson, Quiz, QuizQuestion};
use crate::curriculum::{Curriculum, CurriculumLookup, TopicContext, TopicKey};
use crate::error::{Result, StudyError};
use crate::model::ModelClient;
use crate::parse::parse_json;
use crate::prompts;
use crate::store::ContentStore;

pub const LESSON_MAX_TOKENS: u32 = 4096;
pub const QUIZ_MAX_TOKENS: u32 = 2048;

/// Quiz as the model returns it; the passing score is ours to set.
#[derive(Deserialize)]
struct QuizDraft {
    topic_name: String,
    questions: Vec<QuizQuestion>,
}

/// Load the curriculum `key` belongs to.
pub(crate) fn load_curriculum(
    curricula: &dyn CurriculumLookup,
    key: &TopicKey,
) -> Result<Curriculum> {
    curricula
        .get_curriculum(&key.curriculum_id)?
        .ok_or_else(|| StudyError::curriculum_not_found(&key.curriculum_id))
}

/// The topic `key` addresses inside `curriculum`.
pub(crate) fn topic_context<'a>(
    curriculum: &'a Curriculum,
    key: &TopicKey,
) -> Result<TopicContext<'a>> {
    curriculum
        .topic(key.cluster_index, key.topic_index)
        .ok_or_else(|| StudyError::TopicOutOfRange {
            curriculum_id: key.curriculum_id.clone(),
            cluster_index: key.cluster_index,
            topic_index: key.topic_index,
        })
}

fn validate_quiz(draft: QuizDraft) -> Result<Quiz> {
    if draft.questions.is_empty() {
        return Err(StudyError::GenerationParse(
            "quiz has no questions".to_string(),
        ));
    }
    if let Some((i, _)) = draft
        .questions
        .iter()
        .enumerate()
        .find(|(_, q)| q.correct_index >= q.options.len())
    {
        return Err(StudyError::GenerationParse(format!(
            "question {} has correct_index outside its options",
            i + 1
        )));
    }

    Ok(Quiz {
        topic_name: draft.topic_name,
        questions: draft.questions,
        passing_score: DEFAULT_PASSING_SCORE,
    })
}

/// Produces lessons and quizzes, consulting the content store first.
///
/// Nothing is persisted when the model call or parsing fails.
pub struct GenerationOrchestrator {
    model: ModelClient,
    content: Arc<dyn ContentStore>,
    curricula: Arc<dyn CurriculumLookup>,
}

impl GenerationOrchestrator {
    pub fn new(
        model: ModelClient,
        content: Arc<dyn ContentStore>,
        curricula: Arc<dyn CurriculumLookup>,
    ) -> Self {
        Self {
            model,
            content,
            curricula,
        }
    }

    pub fn content(&self) -> &Arc<dyn ContentStore> {
        &self.content
    }

    pub fn curricula(&self) -> &Arc<dyn CurriculumLookup> {
        &self.curricula
    }

    /// The cached lesson for `key`, generating and caching it on a miss.
    pub async fn generate_lesson(&self, key: &TopicKey) -> Result<Lesson> {
        if let Some(lesson) = self.content.get_lesson(key)? {
            return Ok(lesson);
        }

        let curriculum = load_curriculum(self.curricula.as_ref(), key)?;
        let ctx = topic_context(&curriculum, key)?;
        info!(topic = %key, name = %ctx.topic.name, "generating lesson");

        let reply = self
            .model
            .generate(&prompts::lesson(&ctx), LESSON_MAX_TOKENS)
            .await?;
        let mut lesson: Lesson = parse_json(&reply)?;
        if lesson.estimated_time_minutes == 0 {
            lesson.estimated_time_minutes = DEFAULT_LESSON_MINUTES;
        }

        self.content.put_lesson(key, &lesson)?;
        info!(topic = %key, "lesson generated");
        Ok(lesson)
    }

    /// The latest quiz for `key` and its version.
    ///
    /// With `force_new`, or when no version exists yet, a new version is
    /// generated and appended.
    pub async fn generate_quiz(&self, key: &TopicKey, force_new: bool) -> Result<(Quiz, u32)> {
        if !force_new {
            if let Some(cached) = self.content.get_quiz(key, None)? {
                return Ok(cached);
            }
        }

        let curriculum = load_curriculum(self.curricula.as_ref(), key)?;
        let ctx = topic_context(&curriculum, key)?;
        let existing = self.content.count_quiz_versions(key)?;
        info!(topic = %key, name = %ctx.topic.name, existing, "generating quiz");

        let reply = self
            .model
            .generate(&prompts::quiz(&ctx, existing), QUIZ_MAX_TOKENS)
            .await?;
        let quiz = validate_quiz(parse_json(&reply)?)?;

        let version = self.content.put_quiz(key, &quiz)?;
        info!(topic = %key, version, "quiz generated");
        Ok((quiz, version))
    }
}
