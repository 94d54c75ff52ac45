//! Protocol-level defaults.

use hermes_core::{BindingLocation, TimestampFormat};

/// Header carrying the error discriminator in REST + JSON services.
pub const ERROR_TYPE_HEADER: &str = "X-Amzn-Errortype";

/// Protocol defaults shared by every operation of a service.
///
/// Plain value struct; override fields with struct-update syntax:
///
/// ```
/// use hermes_core::TimestampFormat;
/// use hermes_protocol::ProtocolSettings;
///
/// let settings = ProtocolSettings {
///     document_timestamp_format: TimestampFormat::DateTime,
///     ..ProtocolSettings::default()
/// };
/// assert_eq!(settings.header_timestamp_format, TimestampFormat::HttpDate);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtocolSettings {
    /// Default format for header-bound timestamps.
    pub header_timestamp_format: TimestampFormat,
    /// Default format for query-bound timestamps.
    pub query_timestamp_format: TimestampFormat,
    /// Default format for label-bound timestamps.
    pub label_timestamp_format: TimestampFormat,
    /// Default format for timestamps inside the document body.
    pub document_timestamp_format: TimestampFormat,
    /// Header consulted first for the error discriminator.
    pub error_type_header: String,
}

impl Default for ProtocolSettings {
    fn default() -> Self {
        Self {
            header_timestamp_format: TimestampFormat::HttpDate,
            query_timestamp_format: TimestampFormat::DateTime,
            label_timestamp_format: TimestampFormat::DateTime,
            document_timestamp_format: TimestampFormat::EpochSeconds,
            error_type_header: ERROR_TYPE_HEADER.to_string(),
        }
    }
}

impl ProtocolSettings {
    /// Picks the timestamp format for a location; an explicit member format wins.
    #[must_use]
    pub fn timestamp_format(
        &self,
        location: BindingLocation,
        explicit: Option<TimestampFormat>,
    ) -> TimestampFormat {
        explicit.unwrap_or(match location {
            BindingLocation::Header | BindingLocation::PrefixHeaders => {
                self.header_timestamp_format
            }
            BindingLocation::Query => self.query_timestamp_format,
            BindingLocation::Label => self.label_timestamp_format,
            BindingLocation::Payload | BindingLocation::Document => {
                self.document_timestamp_format
            }
        })
    }
}
