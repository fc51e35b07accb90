use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod config;

#[derive(Parser)]
#[command(name = "study", about = "Turn raw notes into a curriculum you can learn from")]
#[command(version, propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage model provider API keys
    Auth(commands::auth::AuthArgs),
    /// Manage configuration
    Config(commands::config::ConfigArgs),
    /// Inspect and delete stored curricula
    Curriculums(commands::curriculums::CurriculumsArgs),
    /// Generate every missing lesson and quiz for a curriculum
    Prepare(commands::prepare::PrepareArgs),
    /// Run the study-buddy server
    Serve(commands::serve::ServeArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Auth(args) => commands::auth::run(args),
        Commands::Config(args) => commands::config::run(args),
        Commands::Curriculums(args) => commands::curriculums::run(args),
        Commands::Prepare(args) => commands::prepare::run(args).await,
        Commands::Serve(args) => commands::serve::run(args).await,
    }
}
