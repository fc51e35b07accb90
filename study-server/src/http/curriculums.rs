//! Curriculum parsing, storage, progress and preparation endpoints

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use study_core::{ContentStatus, CurriculumRecord, CurriculumSummary, LearningProgress};
use tokio::sync::mpsc;
use tracing::{debug, info};

use super::event_stream;
use crate::{AppState, ServerError};

/// Events buffered between a background task and its SSE response.
const EVENT_BUFFER: usize = 32;

#[derive(Debug, Serialize, Deserialize)]
pub struct ParseRequest {
    pub raw_text: String,
}

/// POST /api/parse/stream
///
/// Streams parse progress; the final `complete` event carries `saved_id`.
pub async fn parse_stream(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ParseRequest>,
) -> Result<impl IntoResponse, ServerError> {
    if request.raw_text.trim().is_empty() {
        return Err(ServerError::BadRequest(
            "Raw text cannot be empty".to_string(),
        ));
    }

    let (tx, rx) = mpsc::channel(EVENT_BUFFER);
    let parser = state.parser.clone();
    tokio::spawn(async move {
        if let Err(e) = parser.parse(&request.raw_text, &tx).await {
            debug!(error = %e, "parse stream ended with an error event");
        }
    });

    Ok(event_stream(rx))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CurriculumListResponse {
    pub curriculums: Vec<CurriculumSummary>,
}

/// GET /api/curriculums
pub async fn list(
    State(state): State<Arc<AppState>>,
) -> Result<Json<CurriculumListResponse>, ServerError> {
    Ok(Json(CurriculumListResponse {
        curriculums: state.curricula.list()?,
    }))
}

fn require(state: &AppState, id: &str) -> Result<CurriculumRecord, ServerError> {
    state
        .curricula
        .get(id)?
        .ok_or_else(|| ServerError::NotFound("Curriculum not found".to_string()))
}

/// GET /api/curriculums/:id
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<CurriculumRecord>, ServerError> {
    Ok(Json(require(&state, &id)?))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub success: bool,
    pub message: String,
}

/// DELETE /api/curriculums/:id
///
/// Also removes the curriculum's progress and every generated artifact.
pub async fn delete(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>, ServerError> {
    if !state.curricula.delete(&id)? {
        return Err(ServerError::NotFound("Curriculum not found".to_string()));
    }
    info!(id = %id, "curriculum deleted");
    Ok(Json(DeleteResponse {
        success: true,
        message: "Curriculum deleted".to_string(),
    }))
}

/// GET /api/curriculums/:id/progress
///
/// Starts tracking on first read.
pub async fn progress(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<LearningProgress>, ServerError> {
    let progress = match state.curricula.progress(&id)? {
        Some(progress) => progress,
        None => state.curricula.init_progress(&id)?,
    };
    Ok(Json(progress))
}

/// POST /api/curriculums/:id/progress/start
pub async fn start_learning(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<LearningProgress>, ServerError> {
    require(&state, &id)?;
    Ok(Json(state.curricula.init_progress(&id)?))
}

/// GET /api/curriculums/:id/content-status
pub async fn content_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ContentStatus>, ServerError> {
    Ok(Json(study_core::content_status(
        state.curricula.as_ref(),
        state.content.as_ref(),
        &id,
    )?))
}

/// POST /api/curriculums/:id/prepare
///
/// Generates every missing lesson and quiz in the background and streams
/// batch progress. The work continues if the client disconnects.
pub async fn prepare(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ServerError> {
    let items = state.preparer.plan(&id)?;

    let (tx, rx) = mpsc::channel(EVENT_BUFFER);
    let preparer = state.preparer.clone();
    tokio::spawn(async move {
        preparer.run(&id, items, &tx).await;
    });

    Ok(event_stream(rx))
}
