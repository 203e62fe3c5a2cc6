//! Generative model implementations for Ada Node.
//!
//! # Supported Backends
//!
//! - **Mock**: deterministic, scriptable; used for demos and tests
//! - **Gemini**: Google's Gemini `generateContent` API (API key required)
//!
//! [`RetryingModel`] wraps any backend with retry-with-backoff on rate limits.

pub mod factory;
pub mod gemini;
pub mod retry;

use ada_abstraction::{GenerativeModel, ModelError, ModelParameters, VotableResponse};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::debug;

pub use factory::{ModelConfig, ModelFactory, ModelType};
pub use gemini::GeminiModel;
pub use retry::RetryingModel;

/// A deterministic implementation of [`GenerativeModel`].
///
/// Decisions are served from a script queue first, then from the default
/// decision. Text responses echo a short prefix of the prompt.
#[derive(Debug)]
pub struct MockModel {
    id: String,
    default_decision: VotableResponse,
    scripted: Mutex<VecDeque<Result<VotableResponse, ModelError>>>,
    text_calls: AtomicUsize,
    decision_calls: AtomicUsize,
}

impl MockModel {
    /// Creates a new `MockModel` that always confirms with confidence 0.9.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            default_decision: VotableResponse::new("confirm", "Mock approval", 0.9),
            scripted: Mutex::new(VecDeque::new()),
            text_calls: AtomicUsize::new(0),
            decision_calls: AtomicUsize::new(0),
        }
    }

    /// Replaces the decision returned once the script is exhausted.
    #[must_use]
    pub fn with_default_decision(mut self, decision: VotableResponse) -> Self {
        self.default_decision = decision;
        self
    }

    /// Queues decisions (or failures) to be returned in order.
    #[must_use]
    pub fn with_script(
        self,
        script: impl IntoIterator<Item = Result<VotableResponse, ModelError>>,
    ) -> Self {
        self.scripted.lock().unwrap_or_else(std::sync::PoisonError::into_inner).extend(script);
        self
    }

    /// Number of `generate_text` calls served.
    pub fn text_calls(&self) -> usize {
        self.text_calls.load(Ordering::SeqCst)
    }

    /// Number of `generate_decision` calls served.
    pub fn decision_calls(&self) -> usize {
        self.decision_calls.load(Ordering::SeqCst)
    }
}

impl Default for MockModel {
    fn default() -> Self {
        Self::new("mock")
    }
}

#[async_trait]
impl GenerativeModel for MockModel {
    async fn generate_text(
        &self,
        prompt: &str,
        parameters: Option<ModelParameters>,
    ) -> Result<String, ModelError> {
        self.text_calls.fetch_add(1, Ordering::SeqCst);
        debug!(model_id = %self.id, prompt_len = prompt.len(), parameters = ?parameters, "MockModel generating text");

        let preview: String = prompt.chars().take(80).collect();
        Ok(format!("[{}] Recommended option based on: {}", self.id, preview.trim()))
    }

    async fn generate_decision(&self, prompt: &str) -> Result<VotableResponse, ModelError> {
        self.decision_calls.fetch_add(1, Ordering::SeqCst);
        debug!(model_id = %self.id, prompt_len = prompt.len(), "MockModel generating decision");

        let next = self.scripted.lock().unwrap_or_else(std::sync::PoisonError::into_inner).pop_front();
        next.unwrap_or_else(|| Ok(self.default_decision.clone()))
    }

    fn model_id(&self) -> &str {
        &self.id
    }
}
