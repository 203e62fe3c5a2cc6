//! Google Gemini model implementation.
//!
//! Talks to the `generateContent` endpoint. Structured decisions are requested
//! with `responseMimeType = application/json` and parsed with
//! [`ada_abstraction::parse_decision`].

use ada_abstraction::{
    DECISION_INSTRUCTION, GenerativeModel, ModelError, ModelParameters, VotableResponse,
    parse_decision,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::env;
use tracing::{debug, error};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Google Gemini model implementation.
#[derive(Debug, Clone)]
pub struct GeminiModel {
    /// The model ID (e.g., "gemini-2.5-flash").
    model_id: String,
    /// The API key; `None` means every call fails with `MissingCredentials`.
    api_key: Option<String>,
    /// The base URL for the Gemini API.
    base_url: String,
    /// HTTP client for making requests.
    client: Client,
}

impl GeminiModel {
    /// Creates a model reading the key from `GEMINI_API_KEY` (or `API_KEY`).
    ///
    /// A missing key is not an error here: the model is still constructed and
    /// reports `MissingCredentials` on use, so callers can degrade gracefully.
    #[must_use]
    pub fn new(model_id: impl Into<String>) -> Self {
        let api_key = env::var("GEMINI_API_KEY").or_else(|_| env::var("API_KEY")).ok();
        Self {
            model_id: model_id.into(),
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            client: Client::new(),
        }
    }

    /// Creates a model with an explicit API key.
    #[must_use]
    pub fn with_api_key(model_id: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            model_id: model_id.into(),
            api_key: Some(api_key.into()),
            base_url: DEFAULT_BASE_URL.to_string(),
            client: Client::new(),
        }
    }

    /// Overrides the API base URL (used for tests and proxies).
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Whether an API key is configured.
    pub fn has_credentials(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.is_empty())
    }

    async fn generate(
        &self,
        prompt: &str,
        parameters: Option<ModelParameters>,
        json_response: bool,
    ) -> Result<String, ModelError> {
        let api_key = match self.api_key.as_deref() {
            Some(key) if !key.is_empty() => key,
            _ => {
                return Err(ModelError::MissingCredentials(
                    "GEMINI_API_KEY environment variable not set".to_string(),
                ));
            }
        };

        let url = format!("{}/models/{}:generateContent?key={}", self.base_url, self.model_id, api_key);
        let params = parameters.unwrap_or_default();

        let request_body = GeminiRequest {
            contents: vec![GeminiContent {
                role: "user".to_string(),
                parts: vec![GeminiPart { text: prompt.to_string() }],
            }],
            generation_config: Some(GeminiGenerationConfig {
                temperature: params.temperature,
                top_p: params.top_p,
                max_output_tokens: params.max_tokens,
                response_mime_type: json_response.then(|| "application/json".to_string()),
            }),
        };

        let response = self.client.post(&url).json(&request_body).send().await.map_err(|e| {
            error!(error = %e, "Failed to send request to Gemini API");
            ModelError::RequestError(format!("Network error: {}", e))
        })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            error!(status = %status, error = %error_text, "Gemini API returned error status");

            if status.as_u16() == 429 || status.as_u16() == 402 {
                return Err(ModelError::QuotaExceeded {
                    provider: "gemini".to_string(),
                    message: Some(error_text),
                });
            }

            return Err(ModelError::ModelResponseError(format!(
                "API error ({}): {}",
                status, error_text
            )));
        }

        let gemini_response: GeminiResponse = response.json().await.map_err(|e| {
            error!(error = %e, "Failed to parse Gemini API response");
            ModelError::SerializationError(format!("Failed to parse response: {}", e))
        })?;

        gemini_response
            .candidates
            .first()
            .and_then(|c| c.content.parts.first())
            .map(|p| p.text.clone())
            .ok_or_else(|| {
                error!("No content in Gemini API response");
                ModelError::ModelResponseError("No content in API response".to_string())
            })
    }
}

#[async_trait]
impl GenerativeModel for GeminiModel {
    async fn generate_text(
        &self,
        prompt: &str,
        parameters: Option<ModelParameters>,
    ) -> Result<String, ModelError> {
        debug!(model_id = %self.model_id, prompt_len = prompt.len(), "GeminiModel generating text");
        self.generate(prompt, parameters, false).await
    }

    async fn generate_decision(&self, prompt: &str) -> Result<VotableResponse, ModelError> {
        debug!(model_id = %self.model_id, prompt_len = prompt.len(), "GeminiModel generating decision");
        let full_prompt = format!("{}\n\n{}", prompt, DECISION_INSTRUCTION);
        let raw = self.generate(&full_prompt, None, true).await?;
        parse_decision(&raw)
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GeminiGenerationConfig>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    role: String,
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct GeminiPart {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: GeminiContent,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_serializes_camel_case() {
        let body = GeminiRequest {
            contents: vec![GeminiContent {
                role: "user".to_string(),
                parts: vec![GeminiPart { text: "hi".to_string() }],
            }],
            generation_config: Some(GeminiGenerationConfig {
                temperature: Some(0.7),
                top_p: Some(0.9),
                max_output_tokens: None,
                response_mime_type: Some("application/json".to_string()),
            }),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["generationConfig"]["responseMimeType"], "application/json");
        assert!(json["generationConfig"].get("maxOutputTokens").is_none());
        assert_eq!(json["contents"][0]["parts"][0]["text"], "hi");
    }

    #[tokio::test]
    async fn test_missing_key_reports_missing_credentials() {
        let model = GeminiModel::with_api_key("gemini-2.5-flash", "");
        assert!(!model.has_credentials());
        let err = model.generate_text("hello", None).await.unwrap_err();
        assert!(matches!(err, ModelError::MissingCredentials(_)));
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let model = GeminiModel::with_api_key("m", "k").with_base_url("http://localhost:1234/");
        assert_eq!(model.base_url, "http://localhost:1234");
    }
}
