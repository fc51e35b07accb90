//! Error types for model providers.

use thiserror::Error;

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while talking to a model provider.
///
/// Callers only get human-readable text from a provider failure, so every
/// variant renders the upstream message verbatim where one exists.
#[derive(Debug, Error)]
pub enum Error {
    /// Credentials not found for provider.
    #[error("credentials not found for provider: {0}")]
    CredentialsNotFound(String),

    /// Failed to access system keyring.
    #[error("keyring error: {0}")]
    Keyring(String),

    /// The provider rejected the API key.
    #[error("invalid API key for provider: {0}")]
    InvalidApiKey(String),

    /// The provider is throttling requests.
    #[error("rate limit exceeded for {provider}: {message}")]
    RateLimited { provider: String, message: String },

    /// Provider API error.
    #[error("provider API error: {0}")]
    ProviderApi(String),

    /// Request failed before a response was received.
    #[error("request failed: {0}")]
    Request(String),

    /// The provider answered without any text content.
    #[error("empty response from {0}")]
    EmptyResponse(String),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
