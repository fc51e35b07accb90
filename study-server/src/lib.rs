//! study-server - HTTP API for study-buddy
//!
//! This crate exposes curriculum parsing, content generation, grading,
//! batch preparation and tutoring over HTTP. Long-running work (parsing,
//! preparation) streams progress as server-sent events.

mod error;
pub mod http;
mod state;

use std::sync::Arc;

use axum::http::{HeaderValue, Method, header};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;

pub use error::{ErrorResponse, ServerError};
pub use http::create_router;
pub use state::AppState;

/// Origins allowed by default: the web UI dev servers.
pub const DEFAULT_CORS_ORIGINS: &[&str] = &["http://localhost:5173", "http://localhost:3000"];

/// The main study-buddy server
pub struct StudyServer {
    config: ServerConfig,
    state: Arc<AppState>,
}

impl StudyServer {
    pub fn new(config: ServerConfig, state: Arc<AppState>) -> Self {
        Self { config, state }
    }

    /// Get the server configuration
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Get the shared application state
    pub fn state(&self) -> Arc<AppState> {
        Arc::clone(&self.state)
    }

    /// Run the server, binding to the configured address
    pub async fn run(self) -> Result<(), ServerError> {
        let addr = self.config.addr();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| ServerError::Bind {
                addr: addr.clone(),
                source: e,
            })?;

        tracing::info!("study-buddy server listening on {}", addr);

        let router = create_router(self.state).layer(cors_layer(&self.config.cors_origins));
        axum::serve(listener, router)
            .await
            .map_err(|e| ServerError::Internal(e.to_string()))?;

        Ok(())
    }
}

/// CORS for the configured browser origins. Unparsable origins are skipped.
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();
    tracing::debug!("CORS: allowing origins {:?}", origins);

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .allow_credentials(true)
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host address to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Browser origins allowed to call the API
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new("127.0.0.1", 8000)
    }
}

impl ServerConfig {
    /// Create a new ServerConfig with the specified host and port
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            cors_origins: DEFAULT_CORS_ORIGINS.iter().map(|o| o.to_string()).collect(),
        }
    }

    /// Returns the socket address string (e.g., "127.0.0.1:8000")
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use study_core::ModelClient;
    use study_core::testing::ScriptedProvider;

    #[test]
    fn test_server_config_default() {
        let config = ServerConfig::default();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8000);
        assert_eq!(config.cors_origins.len(), 2);
    }

    #[test]
    fn test_server_config_addr() {
        let config = ServerConfig::new("0.0.0.0", 9000);
        assert_eq!(config.addr(), "0.0.0.0:9000");
    }

    #[test]
    fn test_study_server_new() {
        let dir = tempfile::tempdir().unwrap();
        let model = ModelClient::new(Arc::new(ScriptedProvider::new(["unused"])), "m");
        let state = Arc::new(AppState::new(dir.path(), model));
        let server = StudyServer::new(ServerConfig::new("127.0.0.1", 9000), state);
        assert_eq!(server.config().port, 9000);
    }
}
