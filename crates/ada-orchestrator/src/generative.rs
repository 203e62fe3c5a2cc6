//! Boundary around the generative model.
//!
//! Model failures never propagate past this wrapper: text requests degrade to
//! a tagged fallback string and decision requests to `None`.

use ada_abstraction::{GenerativeModel, ModelError, VotableResponse};
use std::sync::Arc;
use tracing::warn;

/// Infallible facade over a [`GenerativeModel`].
#[derive(Clone)]
pub struct GenerativeService {
    model: Arc<dyn GenerativeModel>,
}

impl std::fmt::Debug for GenerativeService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerativeService").field("model_id", &self.model.model_id()).finish()
    }
}

impl GenerativeService {
    pub fn new(model: Arc<dyn GenerativeModel>) -> Self {
        Self { model }
    }

    pub fn model_id(&self) -> &str {
        self.model.model_id()
    }

    /// Generates text, or a tagged fallback when the model fails.
    pub async fn text(&self, prompt: &str) -> String {
        match self.model.generate_text(prompt, None).await {
            Ok(text) => text.trim().to_string(),
            Err(ModelError::MissingCredentials(_)) => {
                warn!(model_id = %self.model.model_id(), "No API key configured, using fallback text");
                format!("[Gemini API key not configured] Fallback: {prompt}")
            }
            Err(e) => {
                warn!(model_id = %self.model.model_id(), error = %e, "Text generation failed");
                format!("[Error generating content: {e}]")
            }
        }
    }

    /// Generates a structured decision, or `None` when the model fails.
    pub async fn decision(&self, prompt: &str) -> Option<VotableResponse> {
        match self.model.generate_decision(prompt).await {
            Ok(decision) => Some(decision),
            Err(e) => {
                warn!(model_id = %self.model.model_id(), error = %e, "Decision generation failed");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ada_abstraction::ModelParameters;
    use ada_models::MockModel;
    use async_trait::async_trait;

    struct FailingModel(ModelError);

    #[async_trait]
    impl GenerativeModel for FailingModel {
        async fn generate_text(
            &self,
            _prompt: &str,
            _parameters: Option<ModelParameters>,
        ) -> Result<String, ModelError> {
            Err(self.0.clone())
        }

        fn model_id(&self) -> &str {
            "failing"
        }
    }

    #[tokio::test]
    async fn test_text_passes_through() {
        let service = GenerativeService::new(Arc::new(MockModel::new("mock")));
        let text = service.text("pick a flight").await;
        assert!(text.contains("pick a flight"));
    }

    #[tokio::test]
    async fn test_missing_credentials_fallback() {
        let model = FailingModel(ModelError::MissingCredentials("GEMINI_API_KEY".into()));
        let service = GenerativeService::new(Arc::new(model));
        assert_eq!(service.text("hello").await, "[Gemini API key not configured] Fallback: hello");
    }

    #[tokio::test]
    async fn test_other_errors_are_tagged() {
        let service =
            GenerativeService::new(Arc::new(FailingModel(ModelError::RequestError("offline".into()))));
        assert!(service.text("hello").await.starts_with("[Error generating content:"));
        // The default decision path goes through generate_text and fails too.
        assert!(service.decision("vote").await.is_none());
    }

    #[tokio::test]
    async fn test_failed_decision_is_none() {
        let model = MockModel::new("mock").with_script([Err(ModelError::Other("boom".into()))]);
        let service = GenerativeService::new(Arc::new(model));
        assert!(service.decision("vote").await.is_none());
        assert_eq!(service.decision("vote").await.unwrap().decision, "confirm");
    }
}
