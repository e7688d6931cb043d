//! Error types for the Napper engine
//!
//! The estimators and forecasters never fail. These errors only surface at the
//! boundary: loading histories, validating them, and reading configuration.

use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur around a prediction request
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Failed to parse history payload: {0}")]
    ParseError(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Date parse error: {0}")]
    DateParseError(String),

    #[error("Invalid engine configuration: {0}")]
    InvalidConfig(String),

    #[error("Subject not found: {0}")]
    SubjectNotFound(Uuid),

    #[error("Invalid event history: {0}")]
    InvalidHistory(String),
}
