//! In-process model provider for tests.
//!
//! Enabled for this crate's own tests and, through the `testing` feature,
//! for dependent crates.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use study_models::{ChatRequest, ChatResponse, Error, ModelProvider, StopReason, Usage};

type Responder = Box<dyn Fn(&ChatRequest) -> Result<String, String> + Send + Sync>;

enum Script {
    Queue(Mutex<VecDeque<Result<String, String>>>),
    Responder(Responder),
}

/// A [`ModelProvider`] that answers from a script and records every request.
///
/// An `Err(message)` step fails the call with [`Error::ProviderApi`].
pub struct ScriptedProvider {
    script: Script,
    requests: Mutex<Vec<ChatRequest>>,
    delay: Option<Duration>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedProvider {
    /// Reply with `replies` in order, then fail.
    pub fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::from_steps(replies.into_iter().map(|r| Ok(r.into())))
    }

    /// Play back a sequence of successes and failures.
    pub fn from_steps(steps: impl IntoIterator<Item = Result<String, String>>) -> Self {
        Self::with_script(Script::Queue(Mutex::new(steps.into_iter().collect())))
    }

    /// Fail every call with `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        let message = message.into();
        Self::from_fn(move |_| Err(message.clone()))
    }

    /// Compute each reply from the request.
    pub fn from_fn(f: impl Fn(&ChatRequest) -> Result<String, String> + Send + Sync + 'static) -> Self {
        Self::with_script(Script::Responder(Box::new(f)))
    }

    fn with_script(script: Script) -> Self {
        Self {
            script,
            requests: Mutex::new(Vec::new()),
            delay: None,
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    /// Hold every call open for `delay` before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Every request received so far.
    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or_default()
    }

    /// Highest number of calls that were in progress at once.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn next_step(&self, request: &ChatRequest) -> Result<String, String> {
        match &self.script {
            Script::Queue(queue) => queue
                .lock()
                .ok()
                .and_then(|mut q| q.pop_front())
                .unwrap_or_else(|| Err("script exhausted".to_string())),
            Script::Responder(f) => f(request),
        }
    }
}

#[async_trait]
impl ModelProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn chat(&self, request: ChatRequest) -> study_models::Result<ChatResponse> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match self.next_step(&request) {
            Ok(text) => Ok(ChatResponse {
                text,
                stop_reason: StopReason::EndTurn,
                usage: Usage::new(10, 10),
            }),
            Err(message) => Err(Error::ProviderApi(message)),
        }
    }
}
