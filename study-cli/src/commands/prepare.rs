//! Prepare command: fill the content cache for a curriculum from the shell

use anyhow::{Result, bail};
use clap::Args;
use study_core::{PrepareEvent, PrepareOutcome};
use tokio::sync::mpsc;

use super::app_state;
use crate::config::ConfigLoader;

#[derive(Debug, Args)]
pub struct PrepareArgs {
    /// Curriculum id
    pub id: String,
}

pub async fn run(args: PrepareArgs) -> Result<()> {
    let config = ConfigLoader::load()?;
    let state = app_state(&config)?;

    let (tx, mut rx) = mpsc::channel(32);
    let printer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            println!("{}", describe(&event));
        }
    });

    let outcome = state.preparer.prepare(&args.id, tx).await;
    // The sender is dropped with the preparer call, so the printer drains and exits.
    let _ = printer.await;
    let outcome = outcome?;

    for error in &outcome.errors {
        eprintln!(
            "  failed: {:?} for {}: {}",
            error.kind, error.topic_name, error.error
        );
    }
    ensure_complete(&outcome)
}

/// Partial preparation is a failure for the exit status.
fn ensure_complete(outcome: &PrepareOutcome) -> Result<()> {
    if !outcome.errors.is_empty() {
        bail!(
            "{} of {} items failed to generate",
            outcome.errors.len(),
            outcome.total
        );
    }
    Ok(())
}

fn describe(event: &PrepareEvent) -> String {
    match event {
        PrepareEvent::Start { total } if *total == 0 => {
            "All lessons and quizzes are already cached.".to_string()
        }
        PrepareEvent::Start { total } => format!("Generating {} items", total),
        PrepareEvent::BatchStart {
            batch_size,
            current,
            total,
            ..
        } => format!("[{}/{}] starting {} tasks", current, total, batch_size),
        PrepareEvent::BatchComplete {
            completed, total, ..
        } => format!("[{}/{}] done", completed, total),
        PrepareEvent::Complete {
            generated_count,
            errors,
        } => format!("Generated {} items, {} failed", generated_count, errors.len()),
    }
}
