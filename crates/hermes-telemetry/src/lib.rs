//! # Hermes Telemetry
//!
//! Logging setup and metric recording for Hermes clients.
//!
//! - [`logging`]: a `tracing-subscriber` registry with an env filter and
//!   JSON or pretty output
//! - [`metrics`]: metric names and recorders built on the `metrics` facade
//!
//! # Example
//!
//! ```rust,ignore
//! use hermes_telemetry::{init_logging, LogConfig};
//!
//! init_logging(&LogConfig::default())?;
//! hermes_telemetry::metrics::describe_metrics();
//! ```

#![doc(html_root_url = "https://docs.rs/hermes-telemetry/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod logging;
pub mod metrics;

pub use error::TelemetryError;
pub use logging::{init_logging, LogConfig};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
