//! Error types for study-core

use thiserror::Error;

use crate::store::StoreError;

/// Top-level error type for study-core
#[derive(Error, Debug)]
pub enum StudyError {
    /// Unknown curriculum, or no quiz to submit against.
    #[error("{0} not found")]
    NotFound(String),

    /// Cluster/topic indices do not address a topic of the curriculum.
    #[error("no topic at cluster {cluster_index}, topic {topic_index} in curriculum {curriculum_id}")]
    TopicOutOfRange {
        curriculum_id: String,
        cluster_index: usize,
        topic_index: usize,
    },

    /// Model output could not be parsed or lacked required fields.
    #[error("failed to parse model output: {0}")]
    GenerationParse(String),

    /// The model call itself failed.
    #[error("model unavailable: {0}")]
    ModelUnavailable(#[from] study_models::Error),

    /// Caller supplied unusable input.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("storage error: {0}")]
    Storage(#[from] StoreError),
}

impl StudyError {
    /// Shorthand for an unknown curriculum.
    pub fn curriculum_not_found(id: &str) -> Self {
        Self::NotFound(format!("curriculum {}", id))
    }
}

/// Result type for study-core operations
pub type Result<T> = std::result::Result<T, StudyError>;
