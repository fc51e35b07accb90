//! Credential management for API keys.
//!
//! API keys live in the system keyring, with environment variables as a
//! read-only fallback for CI and container deployments.
//!
//! # Example
//!
//! ```ignore
//! use study_models::auth::CredentialStore;
//!
//! let store = CredentialStore::new("study-buddy").with_env_fallback();
//! store.set("anthropic", "sk-ant-...")?;
//! let key = store.get("anthropic")?;
//! ```

use std::env;

use secrecy::{ExposeSecret, SecretString};
use tracing::debug;

use crate::{Error, Result};

/// An API key that never shows up in logs.
///
/// `Debug` prints `ApiKey([REDACTED])`; the value is only reachable through
/// [`expose_secret`](ApiKey::expose_secret).
#[derive(Clone)]
pub struct ApiKey(SecretString);

impl ApiKey {
    /// Create a new API key from a string.
    pub fn new(key: impl Into<String>) -> Self {
        Self(SecretString::from(key.into()))
    }

    /// Expose the secret key value. Only call this when building a request.
    pub fn expose_secret(&self) -> &str {
        self.0.expose_secret()
    }
}

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ApiKey([REDACTED])")
    }
}

impl From<String> for ApiKey {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for ApiKey {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Environment variable names for providers that need a key.
const ENV_VARS: &[(&str, &str)] = &[("anthropic", "ANTHROPIC_API_KEY")];

fn env_var_for_provider(provider: &str) -> Option<&'static str> {
    ENV_VARS
        .iter()
        .find(|(p, _)| *p == provider)
        .map(|(_, v)| *v)
}

/// Credential storage backed by the system keyring.
///
/// Lookup order is keyring, then environment (when `env_fallback` is on).
/// Writes always go to the keyring.
pub struct CredentialStore {
    service_name: String,
    env_fallback: bool,
}

impl CredentialStore {
    /// Create a new credential store for a keyring service name.
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            env_fallback: false,
        }
    }

    /// Also consult provider environment variables on lookup.
    pub fn with_env_fallback(mut self) -> Self {
        self.env_fallback = true;
        self
    }

    /// Get an API key for a provider.
    ///
    /// # Errors
    ///
    /// Returns `Error::CredentialsNotFound` if neither source has a key.
    pub fn get(&self, provider: &str) -> Result<ApiKey> {
        if let Some(key) = self.get_from_keyring(provider) {
            debug!(provider, "retrieved API key from keyring");
            return Ok(key);
        }

        if self.env_fallback {
            if let Some(key) = self.get_from_env(provider) {
                debug!(provider, "retrieved API key from environment");
                return Ok(key);
            }
        }

        Err(Error::CredentialsNotFound(provider.to_string()))
    }

    /// Store an API key for a provider in the system keyring.
    pub fn set(&self, provider: &str, key: &str) -> Result<()> {
        let entry = self.keyring_entry(provider)?;
        entry
            .set_password(key)
            .map_err(|e| Error::Keyring(e.to_string()))?;
        debug!(provider, "stored API key in keyring");
        Ok(())
    }

    /// Delete an API key from the system keyring.
    ///
    /// # Errors
    ///
    /// Returns `Error::CredentialsNotFound` if the keyring has no entry.
    pub fn delete(&self, provider: &str) -> Result<()> {
        let entry = self.keyring_entry(provider)?;
        entry.delete_credential().map_err(|e| match e {
            keyring::Error::NoEntry => Error::CredentialsNotFound(provider.to_string()),
            _ => Error::Keyring(e.to_string()),
        })?;
        debug!(provider, "deleted API key from keyring");
        Ok(())
    }

    /// Where the credential for `provider` would be read from, if anywhere.
    pub fn credential_source(&self, provider: &str) -> Option<CredentialSource> {
        if self.get_from_keyring(provider).is_some() {
            Some(CredentialSource::Keyring)
        } else if self.env_fallback && self.get_from_env(provider).is_some() {
            Some(CredentialSource::Environment)
        } else {
            None
        }
    }

    fn keyring_entry(&self, provider: &str) -> Result<keyring::Entry> {
        keyring::Entry::new(&self.service_name, provider).map_err(|e| Error::Keyring(e.to_string()))
    }

    fn get_from_keyring(&self, provider: &str) -> Option<ApiKey> {
        let entry = self.keyring_entry(provider).ok()?;
        entry.get_password().ok().map(ApiKey::new)
    }

    fn get_from_env(&self, provider: &str) -> Option<ApiKey> {
        let env_var = env_var_for_provider(provider)?;
        env::var(env_var)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(ApiKey::new)
    }
}

/// Source of a stored credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    /// Stored in system keyring.
    Keyring,
    /// From environment variable.
    Environment,
}

impl std::fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CredentialSource::Keyring => write!(f, "keyring"),
            CredentialSource::Environment => write!(f, "environment"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_key_debug_is_redacted() {
        let key = ApiKey::new("sk-ant-secret-12345");
        let debug = format!("{:?}", key);
        assert_eq!(debug, "ApiKey([REDACTED])");
        assert!(!debug.contains("sk-ant"));
    }

    #[test]
    fn api_key_from_string() {
        let key: ApiKey = "my-key".into();
        assert_eq!(key.expose_secret(), "my-key");

        let key: ApiKey = String::from("my-key").into();
        assert_eq!(key.expose_secret(), "my-key");
    }

    #[test]
    fn env_var_for_known_providers() {
        assert_eq!(env_var_for_provider("anthropic"), Some("ANTHROPIC_API_KEY"));
        assert_eq!(env_var_for_provider("ollama"), None);
    }

    #[test]
    fn credential_store_with_env_fallback() {
        let store = CredentialStore::new("test").with_env_fallback();
        assert!(store.env_fallback);
        assert_eq!(store.service_name, "test");
    }

    #[test]
    fn credential_store_without_fallback_fails_for_unknown_provider() {
        let store = CredentialStore::new("study-buddy-test-nonexistent");
        let result = store.get("unknown-provider");
        assert!(matches!(result, Err(Error::CredentialsNotFound(_))));
    }

    #[test]
    fn credential_store_env_fallback_works() {
        // SAFETY: this is the only test touching ANTHROPIC_API_KEY
        unsafe { env::set_var("ANTHROPIC_API_KEY", "test-key-from-env") };

        let store = CredentialStore::new("study-buddy-test-nonexistent").with_env_fallback();
        let result = store.get("anthropic");
        let source = store.credential_source("anthropic");

        // SAFETY: see above
        unsafe { env::remove_var("ANTHROPIC_API_KEY") };

        assert_eq!(result.unwrap().expose_secret(), "test-key-from-env");
        assert_eq!(source, Some(CredentialSource::Environment));
    }
}
