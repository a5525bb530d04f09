//! Error types for the sv-app service layer.

use std::path::PathBuf;

/// Failure reported at the engine-call boundary.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Engine call '{call}' failed: {message}")]
    CallFailed { call: &'static str, message: String },

    #[error("Engine does not support '{call}'")]
    Unsupported { call: &'static str },

    #[error("Unknown {what}: {name}")]
    Unknown { what: &'static str, name: String },

    #[error("Malformed engine payload: {0}")]
    Payload(#[from] sv_results::ResultsError),
}

pub type EngineResult<T> = Result<T, EngineError>;

/// Application error type shared by the CLI and the viewer.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Failed to read {path}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Unsupported config format: {path} (expected .yaml, .yml or .json)")]
    ConfigFormat { path: PathBuf },

    #[error("Configuration validation failed: {0}")]
    Validation(String),

    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("Results error: {0}")]
    Results(String),

    #[error("Plot error: {0}")]
    Plot(String),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for sv-app operations.
pub type AppResult<T> = Result<T, AppError>;

impl From<sv_results::ResultsError> for AppError {
    fn from(err: sv_results::ResultsError) -> Self {
        AppError::Results(err.to_string())
    }
}

impl From<sv_plot::PlotError> for AppError {
    fn from(err: sv_plot::PlotError) -> Self {
        AppError::Plot(err.to_string())
    }
}
