//! Model invocation for the engine.

use std::sync::Arc;

use study_models::{ChatRequest, Message, ModelProvider};
use tracing::debug;

/// A provider bound to one model name.
///
/// One request per call; no retries. Timeouts are whatever the provider's
/// HTTP client applies.
#[derive(Clone)]
pub struct ModelClient {
    provider: Arc<dyn ModelProvider>,
    model: String,
}

impl ModelClient {
    pub fn new(provider: Arc<dyn ModelProvider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Send a conversation and return the reply text.
    pub async fn invoke(
        &self,
        system: Option<&str>,
        messages: Vec<Message>,
        max_tokens: u32,
    ) -> study_models::Result<String> {
        let mut request = ChatRequest::new(&self.model, messages).max_tokens(max_tokens);
        if let Some(system) = system {
            request = request.system(system);
        }

        let response = self.provider.chat(request).await?;
        debug!(
            provider = self.provider.name(),
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            "model call finished"
        );
        Ok(response.text)
    }

    /// Single-turn convenience around [`invoke`](Self::invoke).
    pub async fn generate(&self, prompt: &str, max_tokens: u32) -> study_models::Result<String> {
        self.invoke(None, vec![Message::user(prompt)], max_tokens)
            .await
    }
}

impl std::fmt::Debug for ModelClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelClient")
            .field("provider", &self.provider.name())
            .field("model", &self.model)
            .finish()
    }
}
