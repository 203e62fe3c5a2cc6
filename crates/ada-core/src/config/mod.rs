// Ada Node configuration
//
// Tuning values for sealing, voting, the simulated mesh, pacing and the
// generative model. Every field has a default so an empty file is valid.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{CoreError, Result};

/// Environment variable naming a configuration file.
pub const CONFIG_ENV_VAR: &str = "ADA_CONFIG";

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdaConfig {
    pub general: GeneralConfig,
    pub voting: VotingConfig,
    pub mesh: MeshConfig,
    pub pacing: PacingConfig,
    pub simulation: SimulationConfig,
    pub model: ModelSettings,
}

/// Sealing and log retention.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Persist a checkpoint after every successful task
    pub auto_seal: bool,
    /// Maximum number of activity log entries kept in memory
    pub log_capacity: usize,
    /// Newest log entries stored in a checkpoint
    pub checkpoint_log_limit: usize,
    /// JSON checkpoint file; in-memory store when absent
    pub checkpoint_path: Option<PathBuf>,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            auto_seal: true,
            log_capacity: 500,
            checkpoint_log_limit: 100,
            checkpoint_path: None,
        }
    }
}

/// Consensus voting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VotingConfig {
    pub enabled: bool,
    /// Minimum mean confidence for consensus
    pub confidence_threshold: f64,
    /// Majority decision that lets a task proceed to sealing
    pub confirm_decision: String,
    /// Model voters asked in addition to the tool outputs
    pub voter_count: usize,
}

impl Default for VotingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            confidence_threshold: 0.7,
            confirm_decision: "confirm".to_string(),
            voter_count: 0,
        }
    }
}

/// Simulated node-to-node exchanges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeshConfig {
    pub request_timeout_ms: u64,
    pub max_attempts: u32,
    pub failure_probability: f64,
    /// Linear backoff: attempt number times this step
    pub backoff_step_ms: u64,
    /// Inclusive latency range of one delivery attempt
    pub latency_ms: [u64; 2],
}

impl Default for MeshConfig {
    fn default() -> Self {
        Self {
            request_timeout_ms: 15_000,
            max_attempts: 3,
            failure_probability: 0.2,
            backoff_step_ms: 1_000,
            latency_ms: [50, 200],
        }
    }
}

impl MeshConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Backoff before retrying after the given failed attempt (1-based).
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.backoff_step_ms.saturating_mul(u64::from(attempt)))
    }
}

/// Artificial pauses against a rate-limited backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PacingConfig {
    pub tool_delay_ms: u64,
    pub seal_delay_ms: u64,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self { tool_delay_ms: 6_000, seal_delay_ms: 1_500 }
    }
}

impl PacingConfig {
    pub fn tool_delay(&self) -> Duration {
        Duration::from_millis(self.tool_delay_ms)
    }

    pub fn seal_delay(&self) -> Duration {
        Duration::from_millis(self.seal_delay_ms)
    }
}

/// Simulated provider and CRM behaviour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Inclusive latency range of a provider call
    pub provider_latency_ms: [u64; 2],
    /// Inclusive latency range of a CRM lookup
    pub crm_latency_ms: [u64; 2],
    /// Unknown customers resolve to the default profile
    pub crm_default_fallback: bool,
    /// Fixed RNG seed for reproducible runs
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            provider_latency_ms: [800, 1_500],
            crm_latency_ms: [500, 1_000],
            crm_default_fallback: true,
            seed: None,
        }
    }
}

/// Generative model selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSettings {
    /// `mock` or `gemini`
    pub model_type: String,
    pub model_id: String,
    /// Falls back to `GEMINI_API_KEY` when unset
    pub api_key: Option<String>,
    pub max_retries: u32,
    pub initial_backoff_ms: u64,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            model_type: "mock".to_string(),
            model_id: "gemini-2.5-flash".to_string(),
            api_key: None,
            max_retries: 3,
            initial_backoff_ms: 1_000,
        }
    }
}

impl AdaConfig {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    /// Returns error if the file cannot be read, parsed or validated
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            CoreError::Config(format!("Failed to read config file {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Loads `path`, else the file named by `ADA_CONFIG`, else the defaults.
    ///
    /// # Errors
    /// Returns error if a named file cannot be loaded
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load(path);
        }
        match std::env::var_os(CONFIG_ENV_VAR) {
            Some(env_path) if !env_path.is_empty() => Self::load(PathBuf::from(env_path)),
            _ => Ok(Self::default()),
        }
    }

    /// Parse configuration from a TOML string (may be wrapped in `[ada]`)
    ///
    /// # Errors
    /// Returns error if the TOML cannot be parsed or fails validation
    pub fn from_toml_str(toml_content: &str) -> Result<Self> {
        let value: toml::Value = toml::from_str(toml_content)?;
        let config_value = match value.get("ada") {
            Some(section) => section.clone(),
            None => value,
        };
        let config: Self = config_value.try_into()?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to pretty TOML.
    ///
    /// # Errors
    /// Returns error if serialization fails
    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Rejects values the simulation cannot run with.
    ///
    /// # Errors
    /// Returns `CoreError::Config` describing the first invalid field
    pub fn validate(&self) -> Result<()> {
        if self.general.log_capacity == 0 {
            return Err(CoreError::Config("general.log_capacity must be positive".into()));
        }
        if !(0.0..=1.0).contains(&self.voting.confidence_threshold) {
            return Err(CoreError::Config(format!(
                "voting.confidence_threshold must be within [0, 1], got {}",
                self.voting.confidence_threshold
            )));
        }
        if self.voting.confirm_decision.trim().is_empty() {
            return Err(CoreError::Config("voting.confirm_decision must not be empty".into()));
        }
        if self.mesh.max_attempts == 0 {
            return Err(CoreError::Config("mesh.max_attempts must be at least 1".into()));
        }
        if !(0.0..=1.0).contains(&self.mesh.failure_probability) {
            return Err(CoreError::Config(format!(
                "mesh.failure_probability must be within [0, 1], got {}",
                self.mesh.failure_probability
            )));
        }
        for (name, [min, max]) in [
            ("mesh.latency_ms", self.mesh.latency_ms),
            ("simulation.provider_latency_ms", self.simulation.provider_latency_ms),
            ("simulation.crm_latency_ms", self.simulation.crm_latency_ms),
        ] {
            if min > max {
                return Err(CoreError::Config(format!("{name} range is inverted: [{min}, {max}]")));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_yields_defaults() {
        let config = AdaConfig::from_toml_str("").unwrap();
        assert_eq!(config, AdaConfig::default());
        assert!(config.general.auto_seal);
        assert_eq!(config.general.log_capacity, 500);
        assert!((config.voting.confidence_threshold - 0.7).abs() < f64::EPSILON);
        assert_eq!(config.mesh.request_timeout(), Duration::from_secs(15));
        assert_eq!(config.mesh.max_attempts, 3);
        assert_eq!(config.pacing.tool_delay(), Duration::from_secs(6));
    }

    #[test]
    fn test_partial_sections_and_wrapper() {
        let toml = r#"
            [ada.voting]
            enabled = true
            voter_count = 2

            [ada.mesh]
            failure_probability = 0.0
        "#;
        let config = AdaConfig::from_toml_str(toml).unwrap();
        assert!(config.voting.enabled);
        assert_eq!(config.voting.voter_count, 2);
        assert_eq!(config.voting.confirm_decision, "confirm");
        assert!(config.mesh.failure_probability.abs() < f64::EPSILON);
        assert_eq!(config.mesh.max_attempts, 3);
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let err = AdaConfig::from_toml_str("[mesh]\nfailure_probability = 1.5").unwrap_err();
        assert!(err.to_string().contains("failure_probability"));

        let err = AdaConfig::from_toml_str("[mesh]\nmax_attempts = 0").unwrap_err();
        assert!(err.to_string().contains("max_attempts"));

        let err =
            AdaConfig::from_toml_str("[simulation]\nprovider_latency_ms = [900, 100]").unwrap_err();
        assert!(err.to_string().contains("inverted"));

        let err = AdaConfig::from_toml_str("[general]\nlog_capacity = 0").unwrap_err();
        assert!(matches!(err, CoreError::Config(_)));
    }

    #[test]
    fn test_backoff_is_linear() {
        let mesh = MeshConfig::default();
        assert_eq!(mesh.backoff_for(1), Duration::from_secs(1));
        assert_eq!(mesh.backoff_for(2), Duration::from_secs(2));
    }

    #[test]
    fn test_load_and_round_trip_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ada.toml");

        let mut config = AdaConfig::default();
        config.general.auto_seal = false;
        config.simulation.seed = Some(7);
        std::fs::write(&path, config.to_toml_string().unwrap()).unwrap();

        let loaded = AdaConfig::load_or_default(Some(&path)).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let err = AdaConfig::load("/nonexistent/ada.toml").unwrap_err();
        assert!(matches!(err, CoreError::Config(_)));
    }
}
