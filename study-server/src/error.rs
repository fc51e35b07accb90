//! Server error types

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use study_core::{StoreError, StudyError};
use thiserror::Error;

/// Errors that can occur in the study-buddy server
#[derive(Debug, Error)]
pub enum ServerError {
    /// Failed to bind to the specified address
    #[error("failed to bind to {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// Resource missing for a reason the engine does not know about
    #[error("{0}")]
    NotFound(String),

    /// Request body or parameters are unusable
    #[error("{0}")]
    BadRequest(String),

    /// Engine error
    #[error(transparent)]
    Study(#[from] StudyError),

    /// Internal server error
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for ServerError {
    fn from(e: StoreError) -> Self {
        Self::Study(e.into())
    }
}

/// JSON body of every error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl ServerError {
    fn status(&self) -> (StatusCode, &'static str) {
        match self {
            Self::NotFound(_)
            | Self::Study(StudyError::NotFound(_))
            | Self::Study(StudyError::TopicOutOfRange { .. }) => {
                (StatusCode::NOT_FOUND, "NOT_FOUND")
            }
            Self::BadRequest(_)
            | Self::Study(StudyError::InvalidInput(_))
            | Self::Study(StudyError::Storage(StoreError::InvalidId(_))) => {
                (StatusCode::BAD_REQUEST, "BAD_REQUEST")
            }
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, code) = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        (
            status,
            Json(ErrorResponse {
                error: self.to_string(),
                code: code.into(),
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_errors_map_to_status_codes() {
        let not_found: ServerError = StudyError::curriculum_not_found("abc").into();
        assert_eq!(not_found.status().0, StatusCode::NOT_FOUND);
        assert_eq!(not_found.to_string(), "curriculum abc not found");

        let out_of_range: ServerError = StudyError::TopicOutOfRange {
            curriculum_id: "abc".into(),
            cluster_index: 9,
            topic_index: 0,
        }
        .into();
        assert_eq!(out_of_range.status().0, StatusCode::NOT_FOUND);

        let invalid: ServerError = StudyError::InvalidInput("empty".into()).into();
        assert_eq!(invalid.status(), (StatusCode::BAD_REQUEST, "BAD_REQUEST"));

        let parse: ServerError = StudyError::GenerationParse("bad".into()).into();
        assert_eq!(parse.status().0, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn invalid_id_is_a_bad_request() {
        let err: ServerError = StoreError::InvalidId("../x".into()).into();
        assert_eq!(err.status().0, StatusCode::BAD_REQUEST);
    }
}
