//! Error types for codegraph-mark
//!
//! Only resource acquisition and input loading fail a pass. Recoverable
//! conditions met while evaluating rules are logged and narrow the result set
//! (see `features::mark_evaluation::EvaluationError`).

use crate::config::ConfigError;
use thiserror::Error;

/// Main error type for codegraph-mark operations
#[derive(Debug, Error)]
pub enum MarkError {
    /// The program graph could not be reached
    #[error("Graph connection error: {0}")]
    Connection(String),

    /// Invalid rule model (duplicate names, malformed patterns)
    #[error("Model error: {0}")]
    Model(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON parsing / export error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Worker pool could not be created
    #[error("Thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl MarkError {
    /// Create a connection error
    pub fn connection(msg: impl Into<String>) -> Self {
        MarkError::Connection(msg.into())
    }

    /// Create a model error
    pub fn model(msg: impl Into<String>) -> Self {
        MarkError::Model(msg.into())
    }
}

/// Result type alias for codegraph-mark operations
pub type Result<T> = std::result::Result<T, MarkError>;
