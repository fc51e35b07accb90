//! Turning a free-form topic list into a stored curriculum.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{error, info};

use crate::curriculum::Curriculum;
use crate::error::{Result, StudyError};
use crate::model::ModelClient;
use crate::parse::parse_json;
use crate::prompts;
use crate::store::FileCurriculumStore;

pub const CURRICULUM_MAX_TOKENS: u32 = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseStatus {
    Processing,
    Complete,
    Error,
}

/// One progress update while parsing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseEvent {
    pub status: ParseStatus,
    pub message: String,
    /// Percentage, 0 on error.
    pub progress: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub curriculum: Option<Curriculum>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_id: Option<String>,
}

impl ParseEvent {
    fn processing(message: &str, progress: u8) -> Self {
        Self {
            status: ParseStatus::Processing,
            message: message.to_string(),
            progress,
            curriculum: None,
            saved_id: None,
        }
    }

    fn error(message: String) -> Self {
        Self {
            status: ParseStatus::Error,
            message,
            progress: 0,
            curriculum: None,
            saved_id: None,
        }
    }
}

pub struct CurriculumParser {
    model: ModelClient,
    store: Arc<FileCurriculumStore>,
}

impl CurriculumParser {
    pub fn new(model: ModelClient, store: Arc<FileCurriculumStore>) -> Self {
        Self { model, store }
    }

    /// Organize `raw_text` into a curriculum, save it and return its id.
    ///
    /// Every failure after input validation is also reported as an `error`
    /// event before it is returned.
    pub async fn parse(
        &self,
        raw_text: &str,
        progress: &mpsc::Sender<ParseEvent>,
    ) -> Result<(String, Curriculum)> {
        if raw_text.trim().is_empty() {
            return Err(StudyError::InvalidInput(
                "raw text cannot be empty".to_string(),
            ));
        }

        match self.run(raw_text, progress).await {
            Ok(parsed) => Ok(parsed),
            Err(e) => {
                error!(error = %e, "curriculum parsing failed");
                send(progress, ParseEvent::error(failure_message(&e))).await;
                Err(e)
            }
        }
    }

    async fn run(
        &self,
        raw_text: &str,
        progress: &mpsc::Sender<ParseEvent>,
    ) -> Result<(String, Curriculum)> {
        info!(chars = raw_text.len(), "parsing curriculum");
        send(progress, ParseEvent::processing("Analyzing your topics...", 1)).await;
        send(
            progress,
            ParseEvent::processing("Sending to AI for organization...", 2),
        )
        .await;

        let reply = self
            .model
            .invoke(
                Some(prompts::CURRICULUM_SYSTEM_PROMPT),
                vec![study_models::Message::user(prompts::curriculum_request(
                    raw_text,
                ))],
                CURRICULUM_MAX_TOKENS,
            )
            .await?;
        send(
            progress,
            ParseEvent::processing("AI response received, parsing...", 97),
        )
        .await;

        send(
            progress,
            ParseEvent::processing("Building curriculum structure...", 98),
        )
        .await;
        let curriculum: Curriculum = parse_json(&reply)?;

        send(progress, ParseEvent::processing("Finalizing curriculum...", 99)).await;
        let id = self.store.save(curriculum.clone())?;
        info!(
            id = %id,
            subject = %curriculum.subject,
            clusters = curriculum.clusters.len(),
            topics = curriculum.total_topics(),
            "curriculum created"
        );

        send(
            progress,
            ParseEvent {
                status: ParseStatus::Complete,
                message: "Curriculum ready!".to_string(),
                progress: 100,
                curriculum: Some(curriculum.clone()),
                saved_id: Some(id.clone()),
            },
        )
        .await;
        Ok((id, curriculum))
    }
}

fn failure_message(e: &StudyError) -> String {
    match e {
        StudyError::ModelUnavailable(inner) => format!("AI API error: {}", inner),
        StudyError::GenerationParse(_) => {
            "Failed to parse curriculum from AI response".to_string()
        }
        other => other.to_string(),
    }
}

async fn send(progress: &mpsc::Sender<ParseEvent>, event: ParseEvent) {
    let _ = progress.send(event).await;
}
