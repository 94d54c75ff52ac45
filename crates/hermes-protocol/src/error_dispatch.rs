//! Error responses to modeled or generic service errors.
//!
//! A non-2xx response is classified in two steps. An [`ErrorCodeExtractor`]
//! pulls the discriminator and message out of the response, then the
//! [`ErrorDispatcher`] matches the discriminator against the operation's
//! declared error shapes. Matching is exact on the shape name (the part of
//! the shape id after `#`).

use crate::codec::DocumentCodec;
use crate::deserializer::ShapeReader;
use crate::settings::ProtocolSettings;
use crate::ProtocolError;
use hermes_core::{ApiError, DeserializationError, HttpResponse, Shape};
use serde_json::Value as Json;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Discriminator used when a response carries none.
pub const UNKNOWN_ERROR: &str = "UnknownError";

/// Discriminator and message extracted from an error response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorInfo {
    /// Error code, sanitized.
    pub code: String,
    /// Human-readable message.
    pub message: String,
}

/// Extracts the error discriminator from a response.
pub trait ErrorCodeExtractor: Send + Sync {
    /// Reads code and message; never fails.
    fn extract(&self, response: &HttpResponse) -> ErrorInfo;
}

/// Reads REST + JSON error discriminators.
///
/// The code comes from the error type header if present, else the body's
/// `code` or `__type` field. Codes like `aws.protocols#NotFound:http://...`
/// are reduced to `NotFound`.
///
/// ```
/// use hermes_core::HttpResponse;
/// use hermes_protocol::{ErrorCodeExtractor, JsonErrorCodeExtractor};
/// use http::StatusCode;
///
/// let extractor = JsonErrorCodeExtractor::default();
/// let response = HttpResponse::new(
///     StatusCode::NOT_FOUND,
///     r#"{"__type":"storage#NoSuchKey","message":"gone"}"#,
/// );
/// let info = extractor.extract(&response);
/// assert_eq!(info.code, "NoSuchKey");
/// assert_eq!(info.message, "gone");
/// ```
#[derive(Debug, Clone)]
pub struct JsonErrorCodeExtractor {
    header: String,
}

impl Default for JsonErrorCodeExtractor {
    fn default() -> Self {
        Self::new(crate::settings::ERROR_TYPE_HEADER)
    }
}

impl JsonErrorCodeExtractor {
    /// Creates an extractor consulting `header` first.
    pub fn new(header: impl Into<String>) -> Self {
        Self {
            header: header.into(),
        }
    }
}

impl ErrorCodeExtractor for JsonErrorCodeExtractor {
    fn extract(&self, response: &HttpResponse) -> ErrorInfo {
        let body: Option<Json> = serde_json::from_slice(&response.body).ok();
        let field = |names: &[&str]| {
            body.as_ref().and_then(|json| {
                names
                    .iter()
                    .find_map(|name| json.get(*name).and_then(Json::as_str))
                    .map(str::to_string)
            })
        };

        let code = response
            .headers
            .get(&self.header)
            .map(str::to_string)
            .or_else(|| field(&["code", "__type"]))
            .map(|raw| sanitize_code(&raw).to_string())
            .filter(|code| !code.is_empty())
            .unwrap_or_else(|| UNKNOWN_ERROR.to_string());

        let message = field(&["message", "Message", "errorMessage"])
            .unwrap_or_else(|| UNKNOWN_ERROR.to_string());

        ErrorInfo { code, message }
    }
}

/// Strips a namespace prefix and anything after `:`.
///
/// ```
/// use hermes_protocol::error_dispatch::sanitize_code;
///
/// assert_eq!(sanitize_code("ns.v1#Throttled:http://internal"), "Throttled");
/// assert_eq!(sanitize_code(" Throttled "), "Throttled");
/// ```
#[must_use]
pub fn sanitize_code(raw: &str) -> &str {
    let code = raw.split(':').next().unwrap_or(raw);
    let code = code.rsplit('#').next().unwrap_or(code);
    code.trim()
}

/// Returns the modeled name of an error shape.
#[must_use]
pub fn error_name(shape: &Shape) -> &str {
    shape.id.rsplit('#').next().unwrap_or(&shape.id)
}

/// Maps error responses onto an operation's declared errors.
#[derive(Clone)]
pub struct ErrorDispatcher {
    readers: HashMap<String, ShapeReader>,
    settings: ProtocolSettings,
    codec: Arc<dyn DocumentCodec>,
    extractor: Arc<dyn ErrorCodeExtractor>,
}

impl fmt::Debug for ErrorDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.readers.keys().collect();
        names.sort();
        f.debug_struct("ErrorDispatcher")
            .field("errors", &names)
            .finish_non_exhaustive()
    }
}

impl ErrorDispatcher {
    /// Builds a dispatcher over the declared error shapes.
    ///
    /// # Errors
    ///
    /// Fails if an error shape's bindings do not resolve.
    pub fn new(
        errors: &[Shape],
        settings: ProtocolSettings,
        codec: Arc<dyn DocumentCodec>,
        extractor: Arc<dyn ErrorCodeExtractor>,
    ) -> Result<Self, ProtocolError> {
        let readers = errors
            .iter()
            .map(|shape| Ok((error_name(shape).to_string(), ShapeReader::new(shape)?)))
            .collect::<Result<HashMap<_, _>, ProtocolError>>()?;
        Ok(Self {
            readers,
            settings,
            codec,
            extractor,
        })
    }

    /// Returns `true` if `code` names a declared error.
    #[must_use]
    pub fn is_modeled(&self, code: &str) -> bool {
        self.readers.contains_key(code)
    }

    /// Classifies an error response.
    ///
    /// # Errors
    ///
    /// Fails only if a matched error shape's members cannot be parsed.
    pub fn classify(&self, response: &HttpResponse) -> Result<ApiError, DeserializationError> {
        let ErrorInfo { code, message } = self.extractor.extract(response);
        let status = response.status.as_u16();

        let Some(reader) = self.readers.get(&code) else {
            tracing::warn!(
                code = %code,
                status = status,
                "service returned an undeclared error"
            );
            return Ok(ApiError::Generic {
                code,
                message,
                status,
            });
        };

        let fields = reader.read(response, &self.settings, self.codec.as_ref())?;
        tracing::debug!(code = %code, status = status, "matched declared error");
        Ok(ApiError::Modeled {
            name: code,
            message,
            fields,
            status,
        })
    }
}
