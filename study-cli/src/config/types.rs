use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration as stored in TOML files (with optional fields for merging)
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawStudyConfig {
    #[serde(default)]
    pub server: RawServerConfig,

    #[serde(default)]
    pub model: RawModelConfig,

    #[serde(default)]
    pub storage: RawStorageConfig,

    #[serde(default)]
    pub batch: RawBatchConfig,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawServerConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub cors_origins: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawModelConfig {
    pub provider: Option<ProviderKind>,
    pub name: Option<String>,
    pub ollama_host: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawStorageConfig {
    pub data_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawBatchConfig {
    pub concurrency: Option<usize>,
}

/// Final configuration with defaults applied
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StudyConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub model: ModelConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub batch: BatchConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address the API binds to
    pub host: String,

    /// Port the API listens on
    pub port: u16,

    /// Browser origins allowed to call the API
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            cors_origins: study_server::DEFAULT_CORS_ORIGINS
                .iter()
                .map(|o| o.to_string())
                .collect(),
        }
    }
}

/// Which backend answers model requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    Anthropic,
    Ollama,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    pub provider: ProviderKind,

    /// Model identifier sent with every request
    pub name: String,

    /// Ollama base URL, when the provider is ollama
    pub ollama_host: Option<String>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::default(),
            name: DEFAULT_MODEL.to_string(),
            ollama_host: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Where curricula, progress and generated content live
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: study_paths::data_dir(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Generation tasks run at once during preparation
    pub concurrency: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            concurrency: study_core::batch::DEFAULT_CONCURRENCY,
        }
    }
}

/// Default host for the study-buddy server
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default port for the study-buddy server
pub const DEFAULT_PORT: u16 = 8000;

/// Default model name
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let config = StudyConfig::default();
        assert_eq!(config.server.host, DEFAULT_HOST);
        assert_eq!(config.server.port, DEFAULT_PORT);
        assert_eq!(config.model.provider, ProviderKind::Anthropic);
        assert_eq!(config.model.name, DEFAULT_MODEL);
        assert!(config.model.ollama_host.is_none());
        assert_eq!(config.batch.concurrency, 4);
    }

    #[test]
    fn test_raw_config_parses_partial_toml() {
        let raw: RawStudyConfig = toml::from_str(
            r#"
            [model]
            provider = "ollama"
            name = "llama3"
            "#,
        )
        .unwrap();
        assert_eq!(raw.model.provider, Some(ProviderKind::Ollama));
        assert_eq!(raw.model.name.as_deref(), Some("llama3"));
        assert!(raw.server.port.is_none());
        assert!(raw.storage.data_dir.is_none());
    }

    #[test]
    fn test_unknown_provider_is_rejected() {
        let result: Result<RawStudyConfig, _> = toml::from_str("[model]\nprovider = \"gpt\"");
        assert!(result.is_err());
    }
}
