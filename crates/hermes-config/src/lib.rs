//! Typed configuration for Hermes.
//!
//! - TOML and JSON files
//! - Environment overrides (`HERMES__SECTION__KEY`)
//! - Strict parsing: unknown fields fail
//! - Layered loading: defaults → file → environment
//!
//! # Sections
//!
//! | Section | Type | Drives |
//! |---------|------|--------|
//! | `generator` | [`GeneratorConfig`] | service id override, emitted module path |
//! | `protocol` | [`ProtocolConfig`] | timestamp defaults, error header |
//! | `waiter` | [`WaiterConfig`] | delay bounds, wait budget, attempts |
//! | `paginator` | [`PaginatorConfig`] | page size, duplicate-token handling |
//! | `client` | [`ClientConfig`] | endpoint, user agent |
//! | `telemetry` | [`TelemetryConfig`] | log level and format |
//!
//! # Example
//!
//! ```no_run
//! use hermes_config::ConfigLoader;
//!
//! # fn main() -> Result<(), hermes_config::ConfigError> {
//! let config = ConfigLoader::new()
//!     .with_dotenv()
//!     .with_optional_file("hermes.toml")?
//!     .with_env_prefix("HERMES")
//!     .load()?;
//!
//! println!("waiting at most {}s", config.waiter.max_wait_secs);
//! # Ok(())
//! # }
//! ```
//!
//! # File format
//!
//! ```toml
//! [protocol]
//! document_timestamp_format = "epoch-seconds"
//!
//! [waiter]
//! max_wait_secs = 600
//! max_attempts = 20
//!
//! [paginator]
//! page_size = 100
//!
//! [client]
//! endpoint = "https://storage.example.com"
//!
//! [telemetry]
//! level = "hermes_client=debug,info"
//! format = "pretty"
//! ```

#![doc(html_root_url = "https://docs.rs/hermes-config/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod error;
mod loader;
mod schema;

pub use config::HermesConfig;
pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::{
    ClientConfig, GeneratorConfig, LogFormat, PaginatorConfig, ProtocolConfig, TelemetryConfig,
    WaiterConfig,
};
