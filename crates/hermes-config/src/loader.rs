//! Layered configuration loading.

use crate::schema::LogFormat;
use crate::{ConfigError, HermesConfig};
use hermes_core::TimestampFormat;
use std::fs;
use std::path::Path;

/// Builds a [`HermesConfig`] from layers, later layers winning:
///
/// 1. defaults
/// 2. a TOML or JSON file
/// 3. environment variables named `PREFIX__SECTION__KEY`
///
/// A file replaces the defaults wholesale; fields it omits take their
/// default values. Unknown fields in a file are rejected.
///
/// # Example
///
/// ```
/// use hermes_config::ConfigLoader;
///
/// let config = ConfigLoader::new()
///     .with_string("[waiter]\nmax_wait_secs = 60", "toml")
///     .unwrap()
///     .load()
///     .unwrap();
///
/// assert_eq!(config.waiter.max_wait_secs, 60);
/// ```
#[derive(Debug, Default)]
pub struct ConfigLoader {
    config: HermesConfig,
    env_prefix: Option<String>,
}

impl ConfigLoader {
    /// Creates a loader holding the defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a file; the extension picks the format.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file is missing, unreadable, malformed
    /// or carries unknown fields.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::file_not_found(path));
        }
        let content = fs::read_to_string(path).map_err(|e| ConfigError::read_error(path, e))?;
        let format = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_lowercase();
        self.config = parse(&content, &format)?;
        Ok(self)
    }

    /// Loads a file if it exists.
    ///
    /// # Errors
    ///
    /// Same as [`ConfigLoader::with_file`] for an existing file.
    pub fn with_optional_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            self.with_file(path)
        } else {
            Ok(self)
        }
    }

    /// Loads configuration text in the named format (`toml` or `json`).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if parsing fails.
    pub fn with_string(mut self, content: &str, format: &str) -> Result<Self, ConfigError> {
        self.config = parse(content, &format.to_lowercase())?;
        Ok(self)
    }

    /// Enables environment overrides, e.g. `HERMES__WAITER__MAX_ATTEMPTS=5`.
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_uppercase());
        self
    }

    /// Loads a `.env` file into the process environment, if present.
    #[must_use]
    pub fn with_dotenv(self) -> Self {
        let _ = dotenvy::dotenv();
        self
    }

    /// Applies environment overrides and validates.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for an unparsable variable or a failed
    /// [`HermesConfig::validate`].
    pub fn load(mut self) -> Result<HermesConfig, ConfigError> {
        if let Some(prefix) = self.env_prefix.take() {
            self.apply_env(&prefix, std::env::vars())?;
        }
        self.config.validate()?;
        Ok(self.config)
    }

    /// Returns the configuration without environment overrides or validation.
    #[must_use]
    pub fn load_unvalidated(self) -> HermesConfig {
        self.config
    }

    fn apply_env<I>(&mut self, prefix: &str, vars: I) -> Result<(), ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let marker = format!("{prefix}__");
        for (key, value) in vars {
            if let Some(rest) = key.strip_prefix(&marker) {
                let parts: Vec<&str> = rest.split("__").collect();
                self.apply_env_var(&key, &parts, &value)?;
            }
        }
        Ok(())
    }

    fn apply_env_var(&mut self, key: &str, parts: &[&str], value: &str) -> Result<(), ConfigError> {
        let config = &mut self.config;
        match parts {
            ["GENERATOR", "SERVICE_ID"] => config.generator.service_id = Some(value.to_string()),
            ["GENERATOR", "MODULE_PATH"] => config.generator.module_path = optional(value),

            ["PROTOCOL", "HEADER_TIMESTAMP_FORMAT"] => {
                config.protocol.header_timestamp_format = parse_format(key, value)?;
            }
            ["PROTOCOL", "QUERY_TIMESTAMP_FORMAT"] => {
                config.protocol.query_timestamp_format = parse_format(key, value)?;
            }
            ["PROTOCOL", "LABEL_TIMESTAMP_FORMAT"] => {
                config.protocol.label_timestamp_format = parse_format(key, value)?;
            }
            ["PROTOCOL", "DOCUMENT_TIMESTAMP_FORMAT"] => {
                config.protocol.document_timestamp_format = parse_format(key, value)?;
            }
            ["PROTOCOL", "ERROR_TYPE_HEADER"] => {
                config.protocol.error_type_header = value.to_string();
            }

            ["WAITER", "MIN_DELAY_SECS"] => {
                config.waiter.min_delay_secs = Some(parse_number(key, value)?);
            }
            ["WAITER", "MAX_DELAY_SECS"] => {
                config.waiter.max_delay_secs = Some(parse_number(key, value)?);
            }
            ["WAITER", "MAX_WAIT_SECS"] => config.waiter.max_wait_secs = parse_number(key, value)?,
            ["WAITER", "MAX_ATTEMPTS"] => {
                config.waiter.max_attempts = Some(parse_number(key, value)?);
            }
            ["WAITER", "LOG_ATTEMPTS"] => config.waiter.log_attempts = parse_bool(key, value)?,
            ["WAITER", "DISABLE_JITTER"] => config.waiter.disable_jitter = parse_bool(key, value)?,

            ["PAGINATOR", "PAGE_SIZE"] => {
                config.paginator.page_size = Some(parse_number(key, value)?);
            }
            ["PAGINATOR", "STOP_ON_DUPLICATE_TOKEN"] => {
                config.paginator.stop_on_duplicate_token = parse_bool(key, value)?;
            }

            ["CLIENT", "ENDPOINT"] => config.client.endpoint = optional(value),
            ["CLIENT", "USER_AGENT_SUFFIX"] => config.client.user_agent_suffix = optional(value),

            ["TELEMETRY", "ENABLED"] => config.telemetry.enabled = parse_bool(key, value)?,
            ["TELEMETRY", "LEVEL"] => config.telemetry.level = value.to_string(),
            ["TELEMETRY", "FORMAT"] => {
                config.telemetry.format = match value.to_lowercase().as_str() {
                    "json" => LogFormat::Json,
                    "pretty" => LogFormat::Pretty,
                    _ => {
                        return Err(ConfigError::env_parse_error(
                            key,
                            "expected 'json' or 'pretty'",
                        ))
                    }
                };
            }
            ["TELEMETRY", "SPAN_EVENTS"] => config.telemetry.span_events = parse_bool(key, value)?,
            ["TELEMETRY", "FILE_LINE_INFO"] => {
                config.telemetry.file_line_info = parse_bool(key, value)?;
            }

            _ => {}
        }
        Ok(())
    }
}

fn parse(content: &str, format: &str) -> Result<HermesConfig, ConfigError> {
    match format {
        "toml" => Ok(toml::from_str(content)?),
        "json" => Ok(serde_json::from_str(content)?),
        other => Err(ConfigError::UnsupportedFormat {
            format: other.to_string(),
        }),
    }
}

fn optional(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value
        .parse()
        .map_err(|_| ConfigError::env_parse_error(key, "expected integer"))
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::env_parse_error(key, "expected boolean")),
    }
}

fn parse_format(key: &str, value: &str) -> Result<TimestampFormat, ConfigError> {
    match value.to_lowercase().as_str() {
        "date-time" => Ok(TimestampFormat::DateTime),
        "http-date" => Ok(TimestampFormat::HttpDate),
        "epoch-seconds" => Ok(TimestampFormat::EpochSeconds),
        _ => Err(ConfigError::env_parse_error(
            key,
            "expected 'date-time', 'http-date' or 'epoch-seconds'",
        )),
    }
}
