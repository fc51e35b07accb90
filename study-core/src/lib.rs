//! study-core: content cache, generation and grading for study-buddy
//!
//! This crate provides the engine between the request layer and a generative
//! model:
//!
//! - **Storage** - [`FileContentStore`] for versioned lessons, quizzes,
//!   assessments and chats; [`FileCurriculumStore`] for curricula and progress
//! - **Generation** - [`GenerationOrchestrator`] fetches cached content or
//!   generates and caches it
//! - **Grading** - [`AssessmentGrader`] scores deterministically and falls
//!   back to templated feedback when the model is unavailable
//! - **Batch preparation** - [`BatchPreparer`] fills the cache for a whole
//!   curriculum under a concurrency limit
//! - **Tutoring** - [`Tutor`] for per-topic chat
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use study_core::{FileContentStore, FileCurriculumStore, GenerationOrchestrator, ModelClient, TopicKey};
//! use study_models::OllamaProvider;
//!
//! async fn example() -> study_core::Result<()> {
//!     let data_dir = std::path::Path::new("/tmp/study-buddy");
//!     let content = Arc::new(FileContentStore::new(data_dir.join("content")));
//!     let curricula = Arc::new(FileCurriculumStore::new(data_dir, content.clone()));
//!     let model = ModelClient::new(Arc::new(OllamaProvider::new()), "llama3");
//!
//!     let orchestrator = GenerationOrchestrator::new(model, content, curricula);
//!     let lesson = orchestrator.generate_lesson(&TopicKey::new("a1b2c3d4", 0, 0)).await?;
//!     println!("{}", lesson.introduction);
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────────┐
//! │ BatchPreparer│──▶│ Generation       │──▶ ModelClient
//! └──────────────┘   │ Orchestrator     │
//!                    └────────┬─────────┘
//! ┌──────────────┐            │
//! │ Assessment   │────────────┤
//! │ Grader       │            ▼
//! └──────────────┘   ┌──────────────────┐
//!                    │  ContentStore    │
//!                    └──────────────────┘
//! ```

pub mod batch;
pub mod content;
pub mod curriculum;
pub mod error;
pub mod generation;
pub mod grading;
pub mod model;
pub mod parse;
pub mod parser;
pub mod prompts;
pub mod status;
pub mod store;
pub mod tutor;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

// Re-export key types for convenience
pub use batch::{BatchPreparer, ContentKind, PrepareError, PrepareEvent, PrepareItem, PrepareOutcome};
pub use content::{Assessment, AssessmentSummary, Lesson, LessonSection, QuestionFeedback, Quiz, QuizQuestion};
pub use curriculum::{
    Cluster, Curriculum, CurriculumLookup, CurriculumRecord, CurriculumSummary, LearningProgress,
    ProgressTracker, Topic, TopicKey, TopicProgress,
};
pub use error::{Result, StudyError};
pub use generation::GenerationOrchestrator;
pub use grading::AssessmentGrader;
pub use model::ModelClient;
pub use parser::{CurriculumParser, ParseEvent, ParseStatus};
pub use status::{ContentStatus, QuizHistory, QuizHistoryEntry, content_status, quiz_history};
pub use store::{ContentStore, FileContentStore, FileCurriculumStore, StoreError};
pub use tutor::Tutor;
