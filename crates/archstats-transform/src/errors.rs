use thiserror::Error;

/// Errors from turning a raw metrics body into field specs.
///
/// A transform failure aborts the owning group's current tick only.
#[derive(Debug, Error)]
pub enum TransformError {
    /// Body is not valid JSON
    #[error("failed to parse metrics JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Body parsed but does not match the expected shape
    #[error("unexpected metrics shape: {0}")]
    Shape(String),
}

pub type TransformResult<T> = Result<T, TransformError>;
