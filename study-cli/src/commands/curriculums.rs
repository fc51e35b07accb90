//! Curriculum inspection from the shell

use std::path::Path;
use std::sync::Arc;

use anyhow::{Result, bail};
use clap::{Args, Subcommand};
use study_core::{ContentStore, CurriculumSummary, FileContentStore, FileCurriculumStore};

use crate::config::ConfigLoader;

#[derive(Args)]
pub struct CurriculumsArgs {
    #[command(subcommand)]
    pub command: CurriculumsCommands,
}

#[derive(Subcommand)]
pub enum CurriculumsCommands {
    /// List stored curricula, newest first
    List,
    /// Print a curriculum as JSON
    Show {
        /// Curriculum id
        id: String,
    },
    /// Delete a curriculum with its progress and generated content
    Delete {
        /// Curriculum id
        id: String,
    },
}

pub fn run(args: CurriculumsArgs) -> Result<()> {
    let config = ConfigLoader::load()?;
    let store = open_store(&config.storage.data_dir);

    match args.command {
        CurriculumsCommands::List => {
            let summaries = store.list()?;
            if summaries.is_empty() {
                println!("No curricula yet. Paste your notes into the web UI to create one.");
            }
            for summary in &summaries {
                println!("{}", summary_line(summary));
            }
        }
        CurriculumsCommands::Show { id } => match store.get(&id)? {
            Some(record) => println!("{}", serde_json::to_string_pretty(&record)?),
            None => bail!("Curriculum not found: {}", id),
        },
        CurriculumsCommands::Delete { id } => {
            if !store.delete(&id)? {
                bail!("Curriculum not found: {}", id);
            }
            println!("Curriculum {} deleted.", id);
        }
    }
    Ok(())
}

/// Stores that need no model
fn open_store(data_dir: &Path) -> FileCurriculumStore {
    let content: Arc<dyn ContentStore> =
        Arc::new(FileContentStore::new(study_paths::content_dir(data_dir)));
    FileCurriculumStore::new(data_dir, content)
}

fn summary_line(summary: &CurriculumSummary) -> String {
    format!(
        "{}  {}  {}/{} topics  ({})",
        summary.id,
        summary.subject,
        summary.completed_topics,
        summary.topic_count,
        summary.created_at.format("%Y-%m-%d %H:%M"),
    )
}
