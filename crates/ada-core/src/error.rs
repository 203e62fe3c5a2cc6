//! Error types for Ada Node Core.

use thiserror::Error;

/// Core error type.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Configuration is invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The framework catalog is inconsistent.
    #[error("Catalog error: {0}")]
    Catalog(String),

    /// Checkpoint storage failed.
    #[error("Checkpoint error: {0}")]
    Checkpoint(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parse errors
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// TOML serialization errors
    #[error("TOML serialization error: {0}")]
    TomlWrite(#[from] toml::ser::Error),
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
