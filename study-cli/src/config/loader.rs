use super::types::{
    BatchConfig, ModelConfig, RawBatchConfig, RawModelConfig, RawServerConfig, RawStorageConfig,
    RawStudyConfig, ServerConfig, StorageConfig, StudyConfig,
};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load merged configuration (user + project)
    pub fn load() -> Result<StudyConfig> {
        let mut raw = RawStudyConfig::default();

        // Layer 1: User config
        raw = Self::merge_raw(raw, Self::read_raw(&Self::user_config_path())?);

        // Layer 2: Project config
        raw = Self::merge_raw(raw, Self::read_raw(&Self::project_config_path())?);

        Ok(Self::finalize(raw))
    }

    /// Get user config path
    pub fn user_config_path() -> PathBuf {
        study_paths::config_dir().join("config.toml")
    }

    /// Get project config path
    /// Can be overridden with STUDY_PROJECT_CONFIG_DIR (useful for isolated e2e tests)
    pub fn project_config_path() -> PathBuf {
        if let Ok(dir) = std::env::var("STUDY_PROJECT_CONFIG_DIR") {
            PathBuf::from(dir).join("config.toml")
        } else {
            PathBuf::from(".study-buddy/config.toml")
        }
    }

    /// Missing files read as an empty layer
    fn read_raw(path: &Path) -> Result<RawStudyConfig> {
        if !path.exists() {
            return Ok(RawStudyConfig::default());
        }
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        toml::from_str(&contents).with_context(|| format!("invalid config in {}", path.display()))
    }

    /// Merge two raw configs (overlay values override base only if explicitly set)
    fn merge_raw(base: RawStudyConfig, overlay: RawStudyConfig) -> RawStudyConfig {
        RawStudyConfig {
            server: RawServerConfig {
                host: overlay.server.host.or(base.server.host),
                port: overlay.server.port.or(base.server.port),
                cors_origins: overlay.server.cors_origins.or(base.server.cors_origins),
            },
            model: RawModelConfig {
                provider: overlay.model.provider.or(base.model.provider),
                name: overlay.model.name.or(base.model.name),
                ollama_host: overlay.model.ollama_host.or(base.model.ollama_host),
            },
            storage: RawStorageConfig {
                data_dir: overlay.storage.data_dir.or(base.storage.data_dir),
            },
            batch: RawBatchConfig {
                concurrency: overlay.batch.concurrency.or(base.batch.concurrency),
            },
        }
    }

    /// Apply defaults to unset fields
    fn finalize(raw: RawStudyConfig) -> StudyConfig {
        let server = ServerConfig::default();
        let model = ModelConfig::default();

        StudyConfig {
            server: ServerConfig {
                host: raw.server.host.unwrap_or(server.host),
                port: raw.server.port.unwrap_or(server.port),
                cors_origins: raw.server.cors_origins.unwrap_or(server.cors_origins),
            },
            model: ModelConfig {
                provider: raw.model.provider.unwrap_or(model.provider),
                name: raw.model.name.unwrap_or(model.name),
                ollama_host: raw.model.ollama_host,
            },
            storage: StorageConfig {
                data_dir: raw
                    .storage
                    .data_dir
                    .unwrap_or_else(|| StorageConfig::default().data_dir),
            },
            batch: BatchConfig {
                concurrency: raw
                    .batch
                    .concurrency
                    .filter(|n| *n > 0)
                    .unwrap_or_else(|| BatchConfig::default().concurrency),
            },
        }
    }

    /// Load a single config file with defaults applied (for testing)
    #[cfg(test)]
    pub fn load_from_path(path: &Path) -> Result<StudyConfig> {
        Ok(Self::finalize(Self::read_raw(path)?))
    }
}

#[cfg(test)]
mod tests {
    use super::super::types::{DEFAULT_MODEL, DEFAULT_PORT, ProviderKind};
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_load_from_missing_path_gives_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config = ConfigLoader::load_from_path(&temp_dir.path().join("none.toml")).unwrap();
        assert_eq!(config.server.port, DEFAULT_PORT);
        assert_eq!(config.model.name, DEFAULT_MODEL);
    }

    #[test]
    fn test_load_from_path_applies_file_values() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            r#"
[server]
port = 9100

[model]
provider = "ollama"
ollama_host = "http://gpu-box:11434"

[storage]
data_dir = "/srv/study"

[batch]
concurrency = 8
"#
        )
        .unwrap();

        let config = ConfigLoader::load_from_path(&path).unwrap();
        assert_eq!(config.server.port, 9100);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.model.provider, ProviderKind::Ollama);
        assert_eq!(
            config.model.ollama_host.as_deref(),
            Some("http://gpu-box:11434")
        );
        assert_eq!(config.storage.data_dir, PathBuf::from("/srv/study"));
        assert_eq!(config.batch.concurrency, 8);
    }

    #[test]
    fn test_load_from_path_rejects_bad_toml() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "[server\nport = ").unwrap();
        assert!(ConfigLoader::load_from_path(&path).is_err());
    }

    #[test]
    fn test_merge_raw_overlay_wins() {
        let base = RawStudyConfig {
            server: RawServerConfig {
                host: Some("0.0.0.0".to_string()),
                port: Some(9000),
                cors_origins: None,
            },
            model: RawModelConfig {
                name: Some("base-model".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        let overlay = RawStudyConfig {
            server: RawServerConfig {
                port: Some(9001),
                ..Default::default()
            },
            model: RawModelConfig {
                name: Some("overlay-model".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };

        let merged = ConfigLoader::merge_raw(base, overlay);
        assert_eq!(merged.server.host, Some("0.0.0.0".to_string()));
        assert_eq!(merged.server.port, Some(9001));
        assert_eq!(merged.model.name, Some("overlay-model".to_string()));
    }

    #[test]
    fn test_finalize_ignores_zero_concurrency() {
        let raw = RawStudyConfig {
            batch: RawBatchConfig {
                concurrency: Some(0),
            },
            ..Default::default()
        };
        assert_eq!(ConfigLoader::finalize(raw).batch.concurrency, 4);
    }

    #[test]
    fn test_user_config_path() {
        let path = ConfigLoader::user_config_path();
        assert!(path.to_string_lossy().contains("study-buddy"));
        assert!(path.ends_with("config.toml"));
    }
}
