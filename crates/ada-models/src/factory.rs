//! Model factory for creating model instances from configuration.

use crate::{GeminiModel, MockModel, RetryingModel};
use ada_abstraction::{GenerativeModel, ModelError};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Model type enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelType {
    /// Deterministic mock model.
    Mock,
    /// Google Gemini model.
    Gemini,
}

impl FromStr for ModelType {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mock" => Ok(Self::Mock),
            "gemini" | "google" => Ok(Self::Gemini),
            other => Err(ModelError::UnsupportedModelProvider(other.to_string())),
        }
    }
}

/// Model configuration.
#[derive(Debug, Clone)]
pub struct ModelConfig {
    /// The type of model to create.
    pub model_type: ModelType,
    /// The model ID (e.g., "gemini-2.5-flash").
    pub model_id: String,
    /// Optional API key (if not provided, loaded from the environment).
    pub api_key: Option<String>,
    /// Rate-limit retries; zero disables the retry wrapper.
    pub max_retries: u32,
    /// First backoff interval, doubled per retry.
    pub initial_backoff: Duration,
}

impl ModelConfig {
    /// Creates a new `ModelConfig` with no retries.
    #[must_use]
    pub fn new(model_type: ModelType, model_id: impl Into<String>) -> Self {
        Self {
            model_type,
            model_id: model_id.into(),
            api_key: None,
            max_retries: 0,
            initial_backoff: Duration::from_secs(1),
        }
    }

    /// Sets the API key for this configuration.
    #[must_use]
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Enables retry-with-backoff on rate limits.
    #[must_use]
    pub fn with_retries(mut self, max_retries: u32, initial_backoff: Duration) -> Self {
        self.max_retries = max_retries;
        self.initial_backoff = initial_backoff;
        self
    }
}

/// Factory for creating model instances.
pub struct ModelFactory;

impl ModelFactory {
    /// Creates a model instance from the given configuration.
    pub fn create(config: ModelConfig) -> Arc<dyn GenerativeModel> {
        debug!(model_type = ?config.model_type, model_id = %config.model_id, "Creating model instance");

        let base: Arc<dyn GenerativeModel> = match config.model_type {
            ModelType::Mock => Arc::new(MockModel::new(config.model_id)),
            ModelType::Gemini => Arc::new(match config.api_key {
                Some(key) => GeminiModel::with_api_key(config.model_id, key),
                None => GeminiModel::new(config.model_id),
            }),
        };

        if config.max_retries == 0 {
            base
        } else {
            Arc::new(RetryingModel::new(base, config.max_retries, config.initial_backoff))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_type_from_str() {
        assert_eq!("mock".parse::<ModelType>().unwrap(), ModelType::Mock);
        assert_eq!(" Gemini ".parse::<ModelType>().unwrap(), ModelType::Gemini);
        assert!(matches!(
            "openai".parse::<ModelType>(),
            Err(ModelError::UnsupportedModelProvider(_))
        ));
    }

    #[test]
    fn test_factory_creates_mock() {
        let model = ModelFactory::create(ModelConfig::new(ModelType::Mock, "mock-x"));
        assert_eq!(model.model_id(), "mock-x");
    }

    #[test]
    fn test_factory_wraps_with_retries() {
        let config = ModelConfig::new(ModelType::Gemini, "gemini-2.5-flash")
            .with_api_key("k")
            .with_retries(3, Duration::from_millis(100));
        let model = ModelFactory::create(config);
        assert_eq!(model.model_id(), "gemini-2.5-flash");
    }
}
