//! Error types for the query pipeline

use thiserror::Error;

/// Result type for pipeline operations
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Errors that can occur while drafting or correcting a query
///
/// The interactive surface collapses every variant into one fixed apology
/// message; the underlying cause is only preserved in the tracing output.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("model provider error: {0}")]
    Provider(String),

    #[error("model API error: {status_code} - {message}")]
    Api { status_code: u16, message: String },

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("schema error: {0}")]
    Schema(#[from] crate::schema::SchemaError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
