//! Error types for MindEase trends

use thiserror::Error;

/// Errors that can occur while projecting mood trends
#[derive(Debug, Error)]
pub enum ProjectionError {
    #[error("Mood data unavailable: {0}")]
    DataUnavailable(String),

    #[error("No authenticated user")]
    Unauthenticated,

    #[error("Failed to parse mood rows: {0}")]
    ParseError(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Date parse error: {0}")]
    DateParseError(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl ProjectionError {
    /// Whether the caller should offer a retry rather than an empty state
    pub fn is_retryable(&self) -> bool {
        matches!(self, ProjectionError::DataUnavailable(_))
    }
}
