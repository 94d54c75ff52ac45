//! Test error types.

use thiserror::Error;

/// Errors raised by the test utilities.
#[derive(Error, Debug)]
pub enum TestError {
    /// A body is not the JSON a test expected.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A body is not UTF-8.
    #[error("body read error: {0}")]
    BodyRead(String),

    /// No request was recorded at this position.
    #[error("no request recorded at index {0}")]
    MissingRequest(usize),
}
