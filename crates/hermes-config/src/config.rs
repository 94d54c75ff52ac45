//! The root configuration type.

use crate::{
    ClientConfig, ConfigError, GeneratorConfig, PaginatorConfig, ProtocolConfig,
    TelemetryConfig, WaiterConfig,
};
use serde::{Deserialize, Serialize};

/// Complete Hermes configuration.
///
/// Use [`ConfigLoader`](crate::ConfigLoader) to layer files and environment
/// variables over the defaults.
///
/// # Example
///
/// ```
/// use hermes_config::HermesConfig;
///
/// let config = HermesConfig::default();
/// assert!(config.validate().is_ok());
/// assert!(config.paginator.stop_on_duplicate_token);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct HermesConfig {
    /// Generation settings.
    #[serde(default)]
    pub generator: GeneratorConfig,

    /// Wire protocol defaults.
    #[serde(default)]
    pub protocol: ProtocolConfig,

    /// Waiter runtime defaults.
    #[serde(default)]
    pub waiter: WaiterConfig,

    /// Paginator runtime defaults.
    #[serde(default)]
    pub paginator: PaginatorConfig,

    /// Client runtime settings.
    #[serde(default)]
    pub client: ClientConfig,

    /// Logging settings.
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl HermesConfig {
    /// Validates cross-field constraints.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] if:
    /// - the service id override is empty
    /// - the waiter minimum delay exceeds the maximum delay
    /// - a delay, the wait budget or the page size is zero
    /// - the error type header is empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(id) = &self.generator.service_id {
            if id.trim().is_empty() {
                return Err(ConfigError::invalid_value(
                    "generator.service_id",
                    "must not be empty",
                ));
            }
        }

        if self.protocol.error_type_header.is_empty() {
            return Err(ConfigError::invalid_value(
                "protocol.error_type_header",
                "must not be empty",
            ));
        }

        let waiter = &self.waiter;
        if waiter.min_delay_secs == Some(0) {
            return Err(ConfigError::invalid_value(
                "waiter.min_delay_secs",
                "must be at least 1",
            ));
        }
        if let (Some(min), Some(max)) = (waiter.min_delay_secs, waiter.max_delay_secs) {
            if min > max {
                return Err(ConfigError::invalid_value(
                    "waiter.min_delay_secs",
                    format!("{min} exceeds waiter.max_delay_secs ({max})"),
                ));
            }
        }
        if waiter.max_wait_secs == 0 {
            return Err(ConfigError::invalid_value(
                "waiter.max_wait_secs",
                "must be at least 1",
            ));
        }

        if matches!(self.paginator.page_size, Some(size) if size <= 0) {
            return Err(ConfigError::invalid_value(
                "paginator.page_size",
                "must be positive",
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_inverted_delays() {
        let mut config = HermesConfig::default();
        config.waiter.min_delay_secs = Some(30);
        config.waiter.max_delay_secs = Some(10);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("waiter.min_delay_secs"));
    }

    #[test]
    fn test_rejects_empty_service_id() {
        let mut config = HermesConfig::default();
        config.generator.service_id = Some("  ".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_non_positive_page_size() {
        let mut config = HermesConfig::default();
        config.paginator.page_size = Some(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_equal_delays_are_valid() {
        let mut config = HermesConfig::default();
        config.waiter.min_delay_secs = Some(5);
        config.waiter.max_delay_secs = Some(5);
        assert!(config.validate().is_ok());
    }
}
