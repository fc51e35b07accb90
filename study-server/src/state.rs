//! Shared application state for the study-buddy server

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use study_core::{
    AssessmentGrader, BatchPreparer, ContentStore, CurriculumParser, FileContentStore,
    FileCurriculumStore, GenerationOrchestrator, ModelClient, Tutor, batch::DEFAULT_CONCURRENCY,
};

/// Shared application state accessible by all handlers
#[derive(Clone)]
pub struct AppState {
    /// Curricula and learning progress
    pub curricula: Arc<FileCurriculumStore>,
    /// Generated lessons, quizzes, assessments and chats
    pub content: Arc<dyn ContentStore>,
    pub parser: Arc<CurriculumParser>,
    pub orchestrator: Arc<GenerationOrchestrator>,
    pub grader: Arc<AssessmentGrader>,
    pub tutor: Arc<Tutor>,
    pub preparer: Arc<BatchPreparer>,
    /// When the server started
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// Wire every service over the stores in `data_dir`
    pub fn new(data_dir: &Path, model: ModelClient) -> Self {
        Self::with_batch_concurrency(data_dir, model, DEFAULT_CONCURRENCY)
    }

    pub fn with_batch_concurrency(data_dir: &Path, model: ModelClient, concurrency: usize) -> Self {
        let content: Arc<dyn ContentStore> =
            Arc::new(FileContentStore::new(study_paths::content_dir(data_dir)));
        let curricula = Arc::new(FileCurriculumStore::new(data_dir, content.clone()));

        let orchestrator = Arc::new(GenerationOrchestrator::new(
            model.clone(),
            content.clone(),
            curricula.clone(),
        ));
        let grader = Arc::new(AssessmentGrader::new(
            model.clone(),
            content.clone(),
            curricula.clone(),
            curricula.clone(),
        ));
        let tutor = Arc::new(Tutor::new(model.clone(), content.clone(), curricula.clone()));
        let parser = Arc::new(CurriculumParser::new(model, curricula.clone()));
        let preparer = Arc::new(BatchPreparer::with_concurrency(
            orchestrator.clone(),
            concurrency,
        ));

        Self {
            curricula,
            content,
            parser,
            orchestrator,
            grader,
            tutor,
            preparer,
            started_at: Utc::now(),
        }
    }

    /// Returns how long the server has been running
    pub fn uptime_seconds(&self) -> i64 {
        (Utc::now() - self.started_at).num_seconds()
    }
}
