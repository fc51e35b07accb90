//! Model provider trait and implementations.
//!
//! The [`ModelProvider`] trait is the single seam between study-buddy and a
//! generative model, hosted ([`AnthropicProvider`]) or local
//! ([`OllamaProvider`]).
//!
//! # Example
//!
//! ```ignore
//! use study_models::{ChatRequest, Message, ModelProvider};
//!
//! async fn ask(provider: &dyn ModelProvider) -> study_models::Result<String> {
//!     let request = ChatRequest::new("claude-sonnet-4-20250514", vec![Message::user("Hello!")])
//!         .max_tokens(256);
//!     Ok(provider.chat(request).await?.text)
//! }
//! ```

mod anthropic;
mod ollama;
mod types;

use async_trait::async_trait;

pub use anthropic::AnthropicProvider;
pub use ollama::OllamaProvider;
pub use types::*;

use crate::Result;

/// Trait for model providers.
///
/// Implementations perform exactly one request per call: no retries and no
/// timeout beyond what the underlying HTTP client applies.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Returns the provider name (e.g., "anthropic", "ollama").
    fn name(&self) -> &str;

    /// Perform a chat completion request.
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse>;
}
