//! Serve command for running the HTTP API

use anyhow::Result;
use clap::Args;
use study_server::{ServerConfig, StudyServer};
use tracing::info;

use super::app_state;
use crate::config::ConfigLoader;

/// Arguments for the serve command
#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Port to listen on (overrides config)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Host to bind to (overrides config)
    #[arg(long)]
    pub host: Option<String>,
}

/// Run the server in the foreground
pub async fn run(args: ServeArgs) -> Result<()> {
    let config = ConfigLoader::load()?;
    let state = app_state(&config)?;

    let mut server_config = ServerConfig::new(
        args.host.unwrap_or(config.server.host),
        args.port.unwrap_or(config.server.port),
    );
    server_config.cors_origins = config.server.cors_origins;

    info!(
        data_dir = %config.storage.data_dir.display(),
        model = %config.model.name,
        "Starting study-buddy server on {}",
        server_config.addr()
    );

    StudyServer::new(server_config, state)
        .run()
        .await
        .map_err(Into::into)
}
