pub mod auth;
pub mod config;
pub mod curriculums;
pub mod prepare;
pub mod serve;

use std::sync::Arc;

use anyhow::{Context, Result};
use study_core::ModelClient;
use study_models::{AnthropicProvider, CredentialStore, ModelProvider, OllamaProvider};
use study_server::AppState;

use crate::config::{ModelConfig, ProviderKind, StudyConfig};

/// Keyring service name for stored API keys
pub const CREDENTIAL_SERVICE: &str = "study-buddy";

pub fn credential_store() -> CredentialStore {
    CredentialStore::new(CREDENTIAL_SERVICE).with_env_fallback()
}

/// Build the model client the config asks for.
pub fn model_client(config: &ModelConfig) -> Result<ModelClient> {
    let provider: Arc<dyn ModelProvider> = match config.provider {
        ProviderKind::Anthropic => Arc::new(
            AnthropicProvider::from_credentials(&credential_store())
                .context("no Anthropic API key; run `study auth set` or set ANTHROPIC_API_KEY")?,
        ),
        ProviderKind::Ollama => match &config.ollama_host {
            Some(host) => Arc::new(OllamaProvider::with_base_url(host.clone())),
            None => Arc::new(OllamaProvider::new()),
        },
    };
    Ok(ModelClient::new(provider, config.name.clone()))
}

/// Application state over the configured data directory.
pub fn app_state(config: &StudyConfig) -> Result<Arc<AppState>> {
    let model = model_client(&config.model)?;
    Ok(Arc::new(AppState::with_batch_concurrency(
        &config.storage.data_dir,
        model,
        config.batch.concurrency,
    )))
}
