//! Model providers for study-buddy.
//!
//! This crate provides:
//! - Credential management for API keys
//! - The [`ModelProvider`] trait, a unified chat interface
//! - Anthropic (hosted) and Ollama (local) implementations
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │              ModelProvider               │
//! │  ┌─────────────────┐ ┌────────────────┐  │
//! │  │    Anthropic    │ │     Ollama     │  │
//! │  │    Provider     │ │    Provider    │  │
//! │  └─────────────────┘ └────────────────┘  │
//! └──────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌──────────────────────────────────────────┐
//! │             CredentialStore              │
//! │      (System Keyring + Env Fallback)     │
//! └──────────────────────────────────────────┘
//! ```

mod error;

pub mod auth;
pub mod providers;

pub use auth::{ApiKey, CredentialStore};
pub use error::{Error, Result};
pub use providers::{
    AnthropicProvider, ChatRequest, ChatResponse, Message, ModelProvider, OllamaProvider, Role,
    StopReason, Usage,
};
