//! Retry-with-backoff wrapper for rate-limited backends.

use ada_abstraction::{GenerativeModel, ModelError, ModelParameters, VotableResponse};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Retries calls that fail with a rate-limit error, doubling the wait each time.
///
/// Errors that are not rate limits are returned immediately.
pub struct RetryingModel {
    inner: Arc<dyn GenerativeModel>,
    max_retries: u32,
    initial_backoff: Duration,
}

impl RetryingModel {
    /// Wraps `inner` with the given retry budget.
    pub fn new(inner: Arc<dyn GenerativeModel>, max_retries: u32, initial_backoff: Duration) -> Self {
        Self { inner, max_retries, initial_backoff }
    }

    fn backoff_for(&self, attempt: u32) -> Duration {
        self.initial_backoff.saturating_mul(2u32.saturating_pow(attempt))
    }
}

impl std::fmt::Debug for RetryingModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryingModel")
            .field("model_id", &self.inner.model_id())
            .field("max_retries", &self.max_retries)
            .field("initial_backoff", &self.initial_backoff)
            .finish()
    }
}

#[async_trait]
impl GenerativeModel for RetryingModel {
    async fn generate_text(
        &self,
        prompt: &str,
        parameters: Option<ModelParameters>,
    ) -> Result<String, ModelError> {
        let mut attempt = 0;
        loop {
            match self.inner.generate_text(prompt, parameters.clone()).await {
                Err(e) if e.is_rate_limited() && attempt < self.max_retries => {
                    let wait = self.backoff_for(attempt);
                    warn!(model_id = %self.inner.model_id(), attempt = attempt + 1, wait_ms = wait.as_millis() as u64, "Rate limited, retrying");
                    tokio::time::sleep(wait).await;
                    attempt += 1;
                }
                other => return other,
            }
        }
    }

    async fn generate_decision(&self, prompt: &str) -> Result<VotableResponse, ModelError> {
        let mut attempt = 0;
        loop {
            match self.inner.generate_decision(prompt).await {
                Err(e) if e.is_rate_limited() && attempt < self.max_retries => {
                    let wait = self.backoff_for(attempt);
                    warn!(model_id = %self.inner.model_id(), attempt = attempt + 1, wait_ms = wait.as_millis() as u64, "Rate limited, retrying");
                    tokio::time::sleep(wait).await;
                    attempt += 1;
                }
                other => return other,
            }
        }
    }

    fn model_id(&self) -> &str {
        self.inner.model_id()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MockModel;

    fn quota() -> ModelError {
        ModelError::QuotaExceeded { provider: "gemini".to_string(), message: None }
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_rate_limit_then_succeeds() {
        let mock = Arc::new(MockModel::new("m").with_script(vec![
            Err(quota()),
            Err(quota()),
            Ok(VotableResponse::new("confirm", "ok", 0.9)),
        ]));
        let model = RetryingModel::new(mock.clone(), 3, Duration::from_millis(500));

        let started = tokio::time::Instant::now();
        let decision = model.generate_decision("p").await.unwrap();
        assert_eq!(decision.decision, "confirm");
        assert_eq!(mock.decision_calls(), 3);
        // 500ms + 1000ms of virtual backoff
        assert!(started.elapsed() >= Duration::from_millis(1500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_budget() {
        let mock = Arc::new(MockModel::new("m").with_script(vec![Err(quota()), Err(quota()), Err(quota())]));
        let model = RetryingModel::new(mock.clone(), 2, Duration::from_millis(10));

        let err = model.generate_decision("p").await.unwrap_err();
        assert!(err.is_rate_limited());
        assert_eq!(mock.decision_calls(), 3);
    }

    #[tokio::test]
    async fn test_non_rate_limit_errors_are_not_retried() {
        let mock = Arc::new(
            MockModel::new("m").with_script(vec![Err(ModelError::RequestError("down".to_string()))]),
        );
        let model = RetryingModel::new(mock.clone(), 5, Duration::from_millis(10));

        assert!(model.generate_decision("p").await.is_err());
        assert_eq!(mock.decision_calls(), 1);
    }
}
