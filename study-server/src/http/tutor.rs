//! Tutor chat endpoints

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};
use study_models::Message;

use super::learning::{TopicRequest, topic_key};
use crate::{AppState, ServerError};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TutorRequest {
    #[serde(flatten)]
    pub topic: TopicRequest,
    pub message: String,
    /// Passage of the lesson the student selected, if any.
    #[serde(default)]
    pub highlighted_context: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TutorResponse {
    pub response: String,
    pub history: Vec<Message>,
}

/// POST /api/tutor
pub async fn chat(
    State(state): State<Arc<AppState>>,
    Json(request): Json<TutorRequest>,
) -> Result<Json<TutorResponse>, ServerError> {
    if request.message.trim().is_empty() {
        return Err(ServerError::BadRequest("Message cannot be empty".to_string()));
    }

    let (response, history) = state
        .tutor
        .chat(
            &(&request.topic).into(),
            &request.message,
            request.highlighted_context.as_deref(),
        )
        .await?;
    Ok(Json(TutorResponse { response, history }))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatHistoryResponse {
    pub messages: Vec<Message>,
}

/// GET /api/chat/:id/:cluster/:topic
pub async fn history(
    State(state): State<Arc<AppState>>,
    Path(path): Path<(String, usize, usize)>,
) -> Result<Json<ChatHistoryResponse>, ServerError> {
    let messages = state.tutor.history(&topic_key(path))?;
    Ok(Json(ChatHistoryResponse { messages }))
}
