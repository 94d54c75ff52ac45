//! Configuration section types.

use hermes_core::TimestampFormat;
use serde::{Deserialize, Serialize};

/// Generation settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct GeneratorConfig {
    /// Overrides the service id declared by the model.
    #[serde(default)]
    pub service_id: Option<String>,

    /// Module path of the emitted client facade, e.g. `crate::storage`.
    #[serde(default)]
    pub module_path: Option<String>,
}

/// Wire protocol defaults.
///
/// # Example
///
/// ```
/// use hermes_config::ProtocolConfig;
/// use hermes_core::TimestampFormat;
///
/// let config = ProtocolConfig::default();
/// assert_eq!(config.header_timestamp_format, TimestampFormat::HttpDate);
/// assert_eq!(config.error_type_header, "X-Amzn-Errortype");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ProtocolConfig {
    /// Timestamp format for header bindings.
    #[serde(default = "default_header_format")]
    pub header_timestamp_format: TimestampFormat,

    /// Timestamp format for query bindings.
    #[serde(default = "default_date_time")]
    pub query_timestamp_format: TimestampFormat,

    /// Timestamp format for label bindings.
    #[serde(default = "default_date_time")]
    pub label_timestamp_format: TimestampFormat,

    /// Timestamp format inside the document body.
    #[serde(default = "default_document_format")]
    pub document_timestamp_format: TimestampFormat,

    /// Header carrying the error discriminator.
    #[serde(default = "default_error_type_header")]
    pub error_type_header: String,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            header_timestamp_format: default_header_format(),
            query_timestamp_format: default_date_time(),
            label_timestamp_format: default_date_time(),
            document_timestamp_format: default_document_format(),
            error_type_header: default_error_type_header(),
        }
    }
}

const fn default_header_format() -> TimestampFormat {
    TimestampFormat::HttpDate
}

const fn default_date_time() -> TimestampFormat {
    TimestampFormat::DateTime
}

const fn default_document_format() -> TimestampFormat {
    TimestampFormat::EpochSeconds
}

fn default_error_type_header() -> String {
    "X-Amzn-Errortype".to_string()
}

/// Waiter runtime defaults.
///
/// Delay bounds left unset fall back to the values declared by each waiter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct WaiterConfig {
    /// Minimum delay between attempts, in seconds.
    #[serde(default)]
    pub min_delay_secs: Option<u64>,

    /// Maximum delay between attempts, in seconds.
    #[serde(default)]
    pub max_delay_secs: Option<u64>,

    /// Total time budget, in seconds.
    #[serde(default = "default_max_wait")]
    pub max_wait_secs: u64,

    /// Attempt limit. `None` means only the time budget applies.
    #[serde(default)]
    pub max_attempts: Option<u32>,

    /// Emit a debug event per attempt.
    #[serde(default)]
    pub log_attempts: bool,

    /// Sleep the full computed delay instead of a random one.
    #[serde(default)]
    pub disable_jitter: bool,
}

impl Default for WaiterConfig {
    fn default() -> Self {
        Self {
            min_delay_secs: None,
            max_delay_secs: None,
            max_wait_secs: default_max_wait(),
            max_attempts: None,
            log_attempts: false,
            disable_jitter: false,
        }
    }
}

const fn default_max_wait() -> u64 {
    300
}

/// Paginator runtime defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct PaginatorConfig {
    /// Page size written to the page-size member, when the operation has one.
    #[serde(default)]
    pub page_size: Option<i64>,

    /// Stop when the service returns the token it was just given.
    #[serde(default = "default_true")]
    pub stop_on_duplicate_token: bool,
}

impl Default for PaginatorConfig {
    fn default() -> Self {
        Self {
            page_size: None,
            stop_on_duplicate_token: true,
        }
    }
}

/// Client runtime settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    /// Static endpoint, e.g. `https://storage.example.com`.
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Appended to the `User-Agent` header.
    #[serde(default)]
    pub user_agent_suffix: Option<String>,
}

/// Log output format.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// One JSON object per event.
    #[default]
    Json,
    /// Multi-line human-readable output.
    Pretty,
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct TelemetryConfig {
    /// Whether to install a subscriber at all.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Filter directive.
    #[serde(default = "default_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,

    /// Log span open and close events.
    #[serde(default)]
    pub span_events: bool,

    /// Include file and line.
    #[serde(default)]
    pub file_line_info: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: default_level(),
            format: LogFormat::Json,
            span_events: false,
            file_line_info: false,
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}

const fn default_true() -> bool {
    true
}
