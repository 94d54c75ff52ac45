//! Telemetry error types.

use thiserror::Error;

/// Errors that can occur while installing telemetry.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The log filter could not be parsed or a subscriber is already installed.
    #[error("failed to initialize logging: {0}")]
    LoggingInit(String),
}
