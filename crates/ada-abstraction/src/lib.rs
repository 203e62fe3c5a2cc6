//! Generative service abstraction for Ada Node.
//!
//! This crate defines the capability contract the orchestrator consumes:
//! "given a prompt, return text" and "given a prompt, return a structured
//! decision". Concrete backends live in `ada-models`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Represents an error that can occur when talking to a generative backend.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModelError {
    /// An error occurred during the API request (e.g., network issues, invalid request).
    #[error("Request Error: {0}")]
    RequestError(String),

    /// The model returned an error or an unusable body.
    #[error("Model Response Error: {0}")]
    ModelResponseError(String),

    /// An error occurred during serialization or deserialization.
    #[error("Serialization Error: {0}")]
    SerializationError(String),

    /// The model provider is not supported or configured.
    #[error("Unsupported Model Provider: {0}")]
    UnsupportedModelProvider(String),

    /// No credentials were configured for the backend.
    #[error("Missing credentials: {0}")]
    MissingCredentials(String),

    /// Provider quota exceeded or rate limit hit.
    #[error("Provider '{provider}' quota exceeded{}", message.as_ref().map(|m| format!(": {}", m)).unwrap_or_default())]
    QuotaExceeded {
        /// The provider name (e.g., "gemini").
        provider: String,
        /// Optional error message from the provider.
        #[serde(skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },

    /// Other unexpected errors.
    #[error("Other Model Error: {0}")]
    Other(String),
}

impl ModelError {
    /// Returns `true` when the error is a rate-limit signal worth retrying.
    #[must_use]
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::QuotaExceeded { .. })
    }
}

/// Parameters for controlling generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelParameters {
    /// Sampling temperature.
    pub temperature: Option<f32>,
    /// Nucleus sampling mass.
    pub top_p: Option<f32>,
    /// Maximum number of tokens to generate.
    pub max_tokens: Option<u32>,
}

impl Default for ModelParameters {
    fn default() -> Self {
        Self { temperature: Some(0.7), top_p: Some(0.9), max_tokens: None }
    }
}

/// A single structured decision: what was decided, why, and how sure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VotableResponse {
    /// The decision label (e.g. "confirm", "reject").
    pub decision: String,
    /// Free-text justification.
    pub reason: String,
    /// Confidence in `[0, 1]`.
    pub confidence: f64,
}

impl VotableResponse {
    /// Creates a response, clamping `confidence` into `[0, 1]`.
    pub fn new(decision: impl Into<String>, reason: impl Into<String>, confidence: f64) -> Self {
        let confidence = if confidence.is_nan() { 0.0 } else { confidence.clamp(0.0, 1.0) };
        Self { decision: decision.into(), reason: reason.into(), confidence }
    }

    /// Decision label lower-cased and trimmed, the form used for tallying.
    #[must_use]
    pub fn normalized_decision(&self) -> String {
        self.decision.trim().to_lowercase()
    }
}

/// Instruction appended to prompts when a structured decision is requested.
pub const DECISION_INSTRUCTION: &str = "Respond only with a JSON object of the form \
{\"decision\": \"confirm\" | \"reject\", \"reason\": string, \"confidence\": number between 0 and 1}.";

/// Parses a decision object out of raw model text.
///
/// Tolerates Markdown code fences and leading prose before the first `{`.
pub fn parse_decision(raw: &str) -> Result<VotableResponse, ModelError> {
    #[derive(Deserialize)]
    struct RawDecision {
        decision: String,
        #[serde(default)]
        reason: String,
        #[serde(default)]
        confidence: f64,
    }

    let start = raw.find('{');
    let end = raw.rfind('}');
    let body = match (start, end) {
        (Some(s), Some(e)) if s < e => &raw[s..=e],
        _ => {
            return Err(ModelError::SerializationError(format!(
                "no JSON object in decision response: {}",
                raw.trim()
            )));
        }
    };

    let parsed: RawDecision = serde_json::from_str(body)
        .map_err(|e| ModelError::SerializationError(format!("invalid decision JSON: {}", e)))?;

    if parsed.decision.trim().is_empty() {
        return Err(ModelError::ModelResponseError("decision field is empty".to_string()));
    }

    Ok(VotableResponse::new(parsed.decision, parsed.reason, parsed.confidence))
}

/// A generative text and decision backend.
///
/// All implementations must be `Send + Sync` so one instance can be shared by
/// the orchestrator and any presentation layer.
#[async_trait]
pub trait GenerativeModel: Send + Sync {
    /// Generates free text for the given prompt.
    ///
    /// # Errors
    /// Returns a `ModelError` if generation fails.
    async fn generate_text(
        &self,
        prompt: &str,
        parameters: Option<ModelParameters>,
    ) -> Result<String, ModelError>;

    /// Generates a structured decision for the given prompt.
    ///
    /// The default implementation asks for JSON via [`generate_text`](Self::generate_text)
    /// and parses it with [`parse_decision`].
    ///
    /// # Errors
    /// Returns a `ModelError` if generation or parsing fails.
    async fn generate_decision(&self, prompt: &str) -> Result<VotableResponse, ModelError> {
        let full_prompt = format!("{}\n\n{}", prompt, DECISION_INSTRUCTION);
        let raw = self.generate_text(&full_prompt, None).await?;
        parse_decision(&raw)
    }

    /// Returns the ID of the model.
    fn model_id(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_decision_plain_json() {
        let raw = r#"{"decision": "Confirm", "reason": "cheapest direct", "confidence": 0.82}"#;
        let decision = parse_decision(raw).unwrap();
        assert_eq!(decision.decision, "Confirm");
        assert_eq!(decision.normalized_decision(), "confirm");
        assert!((decision.confidence - 0.82).abs() < f64::EPSILON);
    }

    #[test]
    fn test_parse_decision_with_code_fence() {
        let raw = "Here you go:\n```json\n{\"decision\": \"reject\", \"reason\": \"too pricey\", \"confidence\": 0.4}\n```";
        let decision = parse_decision(raw).unwrap();
        assert_eq!(decision.normalized_decision(), "reject");
        assert_eq!(decision.reason, "too pricey");
    }

    #[test]
    fn test_parse_decision_clamps_confidence() {
        let raw = r#"{"decision": "confirm", "confidence": 3.5}"#;
        let decision = parse_decision(raw).unwrap();
        assert!((decision.confidence - 1.0).abs() < f64::EPSILON);
        assert!(decision.reason.is_empty());
    }

    #[test]
    fn test_parse_decision_rejects_non_json() {
        let err = parse_decision("I think we should confirm.").unwrap_err();
        assert!(matches!(err, ModelError::SerializationError(_)));
    }

    #[test]
    fn test_parse_decision_rejects_empty_decision() {
        let err = parse_decision(r#"{"decision": "  ", "confidence": 0.9}"#).unwrap_err();
        assert!(matches!(err, ModelError::ModelResponseError(_)));
    }

    #[test]
    fn test_normalized_decision_trims() {
        let response = VotableResponse::new("  CONFIRM \n", "ok", 0.9);
        assert_eq!(response.normalized_decision(), "confirm");
    }

    #[test]
    fn test_quota_error_display() {
        let err = ModelError::QuotaExceeded {
            provider: "gemini".to_string(),
            message: Some("RESOURCE_EXHAUSTED".to_string()),
        };
        assert_eq!(err.to_string(), "Provider 'gemini' quota exceeded: RESOURCE_EXHAUSTED");
        assert!(err.is_rate_limited());

        let bare = ModelError::QuotaExceeded { provider: "gemini".to_string(), message: None };
        assert_eq!(bare.to_string(), "Provider 'gemini' quota exceeded");
        assert!(!ModelError::Other("x".to_string()).is_rate_limited());
    }

    struct EchoModel(String);

    #[async_trait]
    impl GenerativeModel for EchoModel {
        async fn generate_text(
            &self,
            _prompt: &str,
            _parameters: Option<ModelParameters>,
        ) -> Result<String, ModelError> {
            Ok(self.0.clone())
        }

        fn model_id(&self) -> &str {
            "echo"
        }
    }

    #[tokio::test]
    async fn test_default_generate_decision_parses_text() {
        let model =
            EchoModel(r#"{"decision": "confirm", "reason": "fine", "confidence": 0.75}"#.to_string());
        let decision = model.generate_decision("pick one").await.unwrap();
        assert_eq!(decision.decision, "confirm");
        assert!((decision.confidence - 0.75).abs() < f64::EPSILON);
    }
}
