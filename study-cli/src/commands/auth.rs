//! API key management for model providers

use std::io::BufRead;

use anyhow::{Result, bail};
use clap::{Args, Subcommand};

use super::credential_store;

#[derive(Args)]
pub struct AuthArgs {
    #[command(subcommand)]
    pub command: AuthCommands,
}

#[derive(Subcommand)]
pub enum AuthCommands {
    /// Store an API key in the system keyring
    Set {
        /// Provider name
        #[arg(default_value = "anthropic")]
        provider: String,
        /// API key; read from stdin when omitted
        #[arg(long)]
        key: Option<String>,
    },
    /// Remove a stored API key
    Delete {
        /// Provider name
        #[arg(default_value = "anthropic")]
        provider: String,
    },
    /// Show where the API key would be read from
    Status {
        /// Provider name
        #[arg(default_value = "anthropic")]
        provider: String,
    },
}

pub fn run(args: AuthArgs) -> Result<()> {
    let store = credential_store();

    match args.command {
        AuthCommands::Set { provider, key } => {
            let key = match key {
                Some(key) => key,
                None => {
                    eprintln!("Enter API key for {} (or set ANTHROPIC_API_KEY):", provider);
                    let mut line = String::new();
                    std::io::stdin().lock().read_line(&mut line)?;
                    line
                }
            };
            let key = key.trim();
            if key.is_empty() {
                bail!("API key cannot be empty");
            }
            store.set(&provider, key)?;
            println!("Credentials for '{}' stored in keyring.", provider);
        }
        AuthCommands::Delete { provider } => match store.delete(&provider) {
            Ok(()) => println!("Credentials for '{}' deleted.", provider),
            Err(study_models::Error::CredentialsNotFound(_)) => {
                println!("No credentials found for '{}'.", provider)
            }
            Err(e) => bail!("Failed to delete credentials: {}", e),
        },
        AuthCommands::Status { provider } => match store.credential_source(&provider) {
            Some(source) => println!("{}: configured ({})", provider, source),
            None => println!("{}: not configured", provider),
        },
    }

    Ok(())
}
