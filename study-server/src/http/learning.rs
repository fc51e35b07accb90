//! Lesson, quiz and assessment endpoints

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};
use study_core::{Assessment, Lesson, QuizHistory, Quiz, TopicKey};

use crate::{AppState, ServerError};

/// Addresses one topic of a curriculum.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicRequest {
    pub curriculum_id: String,
    pub cluster_index: usize,
    pub topic_index: usize,
}

impl From<&TopicRequest> for TopicKey {
    fn from(r: &TopicRequest) -> Self {
        TopicKey::new(r.curriculum_id.clone(), r.cluster_index, r.topic_index)
    }
}

/// A quiz together with the version it was stored under.
#[derive(Debug, Serialize, Deserialize)]
pub struct VersionedQuiz {
    #[serde(flatten)]
    pub quiz: Quiz,
    pub version: u32,
}

pub(super) fn topic_key((id, cluster, topic): (String, usize, usize)) -> TopicKey {
    TopicKey::new(id, cluster, topic)
}

/// POST /api/lesson
pub async fn lesson(
    State(state): State<Arc<AppState>>,
    Json(request): Json<TopicRequest>,
) -> Result<Json<Lesson>, ServerError> {
    let lesson = state.orchestrator.generate_lesson(&(&request).into()).await?;
    Ok(Json(lesson))
}

/// POST /api/quiz
///
/// Latest version, generated on first request.
pub async fn quiz(
    State(state): State<Arc<AppState>>,
    Json(request): Json<TopicRequest>,
) -> Result<Json<VersionedQuiz>, ServerError> {
    let (quiz, version) = state
        .orchestrator
        .generate_quiz(&(&request).into(), false)
        .await?;
    Ok(Json(VersionedQuiz { quiz, version }))
}

/// POST /api/quiz/new
///
/// Always generates and stores a new version.
pub async fn new_quiz(
    State(state): State<Arc<AppState>>,
    Json(request): Json<TopicRequest>,
) -> Result<Json<VersionedQuiz>, ServerError> {
    let (quiz, version) = state
        .orchestrator
        .generate_quiz(&(&request).into(), true)
        .await?;
    Ok(Json(VersionedQuiz { quiz, version }))
}

/// GET /api/quiz/:id/:cluster/:topic/:version
pub async fn quiz_version(
    State(state): State<Arc<AppState>>,
    Path((id, cluster, topic, version)): Path<(String, usize, usize, u32)>,
) -> Result<Json<VersionedQuiz>, ServerError> {
    let key = TopicKey::new(id, cluster, topic);
    let (quiz, version) = state
        .content
        .get_quiz(&key, Some(version))?
        .ok_or_else(|| ServerError::NotFound("Quiz not found".to_string()))?;
    Ok(Json(VersionedQuiz { quiz, version }))
}

fn default_use_ai_grading() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizSubmission {
    #[serde(flatten)]
    pub topic: TopicRequest,
    /// Chosen option index per question, in question order.
    pub answers: Vec<i64>,
    #[serde(default = "default_use_ai_grading")]
    pub use_ai_grading: bool,
}

/// POST /api/quiz/submit
///
/// Grades against the latest quiz version.
pub async fn submit(
    State(state): State<Arc<AppState>>,
    Json(submission): Json<QuizSubmission>,
) -> Result<Json<Assessment>, ServerError> {
    let assessment = state
        .grader
        .submit(
            &(&submission.topic).into(),
            &submission.answers,
            submission.use_ai_grading,
        )
        .await?;
    Ok(Json(assessment))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AssessmentsResponse {
    pub assessments: Vec<Assessment>,
}

/// GET /api/assessments/:id/:cluster/:topic
pub async fn assessments(
    State(state): State<Arc<AppState>>,
    Path(path): Path<(String, usize, usize)>,
) -> Result<Json<AssessmentsResponse>, ServerError> {
    let assessments = state.content.list_assessments(&topic_key(path))?;
    Ok(Json(AssessmentsResponse { assessments }))
}

/// GET /api/quiz/history/:id/:cluster/:topic
pub async fn quiz_history(
    State(state): State<Arc<AppState>>,
    Path(path): Path<(String, usize, usize)>,
) -> Result<Json<QuizHistory>, ServerError> {
    Ok(Json(study_core::quiz_history(
        state.content.as_ref(),
        &topic_key(path),
    )?))
}
