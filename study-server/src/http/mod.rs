//! HTTP server module

mod api;
mod curriculums;
mod learning;
mod tutor;

use std::sync::Arc;

use axum::{
    Router,
    response::sse::{Event, KeepAlive, Sse},
    routing::{get, post},
};
use serde::Serialize;
use tokio::sync::mpsc;
use tokio_stream::{Stream, StreamExt, wrappers::ReceiverStream};

use crate::AppState;

pub use api::{HealthResponse, RootResponse};
pub use curriculums::{CurriculumListResponse, DeleteResponse, ParseRequest};
pub use learning::{AssessmentsResponse, QuizSubmission, TopicRequest, VersionedQuiz};
pub use tutor::{ChatHistoryResponse, TutorRequest, TutorResponse};

/// Create the HTTP router with all routes configured
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(api::root))
        .route("/health", get(api::health))
        .route("/api/parse/stream", post(curriculums::parse_stream))
        .route("/api/curriculums", get(curriculums::list))
        .route(
            "/api/curriculums/:id",
            get(curriculums::get).delete(curriculums::delete),
        )
        .route("/api/curriculums/:id/progress", get(curriculums::progress))
        .route(
            "/api/curriculums/:id/progress/start",
            post(curriculums::start_learning),
        )
        .route(
            "/api/curriculums/:id/content-status",
            get(curriculums::content_status),
        )
        .route("/api/curriculums/:id/prepare", post(curriculums::prepare))
        .route("/api/lesson", post(learning::lesson))
        .route("/api/quiz", post(learning::quiz))
        .route("/api/quiz/new", post(learning::new_quiz))
        .route("/api/quiz/submit", post(learning::submit))
        .route(
            "/api/quiz/history/:id/:cluster/:topic",
            get(learning::quiz_history),
        )
        .route(
            "/api/history/quiz/:id/:cluster/:topic",
            get(learning::quiz_history),
        )
        .route(
            "/api/quiz/:id/:cluster/:topic/:version",
            get(learning::quiz_version),
        )
        .route(
            "/api/assessments/:id/:cluster/:topic",
            get(learning::assessments),
        )
        .route("/api/chat/:id/:cluster/:topic", get(tutor::history))
        .route("/api/tutor", post(tutor::chat))
        .with_state(state)
}

/// Stream everything sent on `rx` as `data:` JSON events until the sender
/// side is dropped.
pub(crate) fn event_stream<T>(
    rx: mpsc::Receiver<T>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>>
where
    T: Serialize + Send + 'static,
{
    let stream = ReceiverStream::new(rx).map(|event| Event::default().json_data(event));
    Sse::new(stream).keep_alive(KeepAlive::default())
}
