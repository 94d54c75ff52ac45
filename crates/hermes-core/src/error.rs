//! Error types for Hermes clients.
//!
//! Every invocation surfaces an [`OperationError`], which names the service
//! and operation and chains the underlying [`ErrorKind`]:
//!
//! | Kind | Raised when | Retried by the core |
//! |---|---|---|
//! | `Serialization` | building the wire request fails | never |
//! | `Deserialization` | a successful response cannot be parsed | never |
//! | `Api` | the service answered with an error status | never |
//! | `Transport` | the HTTP client failed | never |
//! | `Stack` | a per-call stack mutation failed | never |
//! | `Middleware` | a middleware unit failed | never |
//! | `Endpoint` | no endpoint could be resolved | never |
//! | `Canceled` | the call was canceled | never |

use crate::binding::BindingLocation;
use crate::value::Value;
use thiserror::Error;

/// Failure constructing the wire request.
#[derive(Error, Debug)]
pub enum SerializationError {
    /// The input is not a structure.
    #[error("input for `{shape}` must be a structure, got {found}")]
    InvalidInput {
        /// Input shape id.
        shape: String,
        /// Actual value kind.
        found: &'static str,
    },

    /// A required member is absent.
    #[error("required member `{member}` is missing")]
    MissingRequired {
        /// Member name.
        member: String,
    },

    /// A label resolved to an empty string.
    #[error("label member `{member}` must not be empty")]
    EmptyLabel {
        /// Member name.
        member: String,
    },

    /// A value does not match its shape.
    #[error("member `{member}` expected {expected}, got {found}")]
    TypeMismatch {
        /// Member name.
        member: String,
        /// Expected shape kind.
        expected: &'static str,
        /// Actual value kind.
        found: &'static str,
    },

    /// The structured-document codec failed.
    #[error("failed to encode document body: {message}")]
    Document {
        /// Codec message.
        message: String,
    },
}

/// Failure parsing a successful response.
#[derive(Error, Debug)]
pub enum DeserializationError {
    /// A bound scalar could not be parsed.
    #[error("failed to parse {location} `{name}` for member `{member}`: {reason}")]
    Binding {
        /// Member name.
        member: String,
        /// Location the value came from.
        location: BindingLocation,
        /// Wire name of the value.
        name: String,
        /// What went wrong.
        reason: String,
    },

    /// The body could not be decoded.
    #[error("failed to decode response body: {message}")]
    Body {
        /// Codec message.
        message: String,
    },
}

/// An error returned by the service.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    /// The discriminator matched a declared error.
    #[error("{name}: {message}")]
    Modeled {
        /// Modeled error name.
        name: String,
        /// Human-readable message.
        message: String,
        /// Deserialized error members.
        fields: Value,
        /// HTTP status code.
        status: u16,
    },

    /// The discriminator matched nothing; raw code and message are kept.
    #[error("{code}: {message}")]
    Generic {
        /// Raw discriminator.
        code: String,
        /// Human-readable message.
        message: String,
        /// HTTP status code.
        status: u16,
    },
}

impl ApiError {
    /// Returns the modeled name or raw code.
    #[must_use]
    pub fn code(&self) -> &str {
        match self {
            Self::Modeled { name, .. } => name,
            Self::Generic { code, .. } => code,
        }
    }

    /// Returns the message.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Modeled { message, .. } | Self::Generic { message, .. } => message,
        }
    }

    /// Returns the HTTP status code.
    #[must_use]
    pub const fn status(&self) -> u16 {
        match self {
            Self::Modeled { status, .. } | Self::Generic { status, .. } => *status,
        }
    }

    /// Returns `true` if the error matched a declared error shape.
    #[must_use]
    pub const fn is_modeled(&self) -> bool {
        matches!(self, Self::Modeled { .. })
    }
}

/// Failure reported by the HTTP client.
#[derive(Error, Debug)]
#[error("transport error: {message}")]
pub struct TransportError {
    /// Human-readable message.
    pub message: String,
    /// The underlying error.
    #[source]
    pub source: Option<anyhow::Error>,
}

impl TransportError {
    /// Creates a transport error with a message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a transport error wrapping a source error.
    pub fn with_source(message: impl Into<String>, source: impl Into<anyhow::Error>) -> Self {
        Self {
            message: message.into(),
            source: Some(source.into()),
        }
    }
}

/// What went wrong during an invocation.
#[derive(Error, Debug)]
pub enum ErrorKind {
    /// Request construction failed.
    #[error("serialization failed")]
    Serialization(#[from] SerializationError),

    /// Response parsing failed.
    #[error("deserialization failed")]
    Deserialization(#[from] DeserializationError),

    /// The service returned an error.
    #[error("api error {}", .0.code())]
    Api(#[from] ApiError),

    /// The transport failed.
    #[error("request send failed")]
    Transport(#[from] TransportError),

    /// A per-call stack mutation was rejected.
    #[error("stack `{stack}` rejected mutation: {message}")]
    Stack {
        /// Stack identifier.
        stack: String,
        /// What went wrong.
        message: String,
    },

    /// A middleware unit failed.
    #[error("middleware `{id}` failed: {message}")]
    Middleware {
        /// Unit identifier.
        id: String,
        /// What went wrong.
        message: String,
    },

    /// No endpoint could be resolved.
    #[error("failed to resolve endpoint: {message}")]
    Endpoint {
        /// What went wrong.
        message: String,
    },

    /// The client has no plan for the operation.
    #[error("unknown operation `{name}`")]
    UnknownOperation {
        /// Requested operation name.
        name: String,
    },

    /// The caller canceled the call.
    #[error("operation canceled")]
    Canceled,
}

impl ErrorKind {
    /// Returns a short label for logs and metrics.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Serialization(_) => "serialization",
            Self::Deserialization(_) => "deserialization",
            Self::Api(_) => "api",
            Self::Transport(_) => "transport",
            Self::Stack { .. } => "stack",
            Self::Middleware { .. } => "middleware",
            Self::Endpoint { .. } => "endpoint",
            Self::UnknownOperation { .. } => "unknown_operation",
            Self::Canceled => "canceled",
        }
    }

    /// Returns `true` if the failure happened before anything was sent and
    /// would recur on every attempt.
    #[must_use]
    pub const fn is_local(&self) -> bool {
        matches!(
            self,
            Self::Serialization(_) | Self::Stack { .. } | Self::UnknownOperation { .. }
        )
    }

    /// Creates a middleware error.
    #[must_use]
    pub fn middleware(id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Middleware {
            id: id.into(),
            message: message.into(),
        }
    }
}

/// The error every invocation returns, naming its service and operation.
///
/// # Example
///
/// ```
/// use hermes_core::{ApiError, ErrorKind, OperationError};
///
/// let err = OperationError::new(
///     "Storage",
///     "GetObject",
///     ErrorKind::Api(ApiError::Generic {
///         code: "Throttled".to_string(),
///         message: "slow down".to_string(),
///         status: 429,
///     }),
/// );
///
/// assert_eq!(err.api_error().map(ApiError::code), Some("Throttled"));
/// assert!(err.to_string().starts_with("operation error Storage: GetObject"));
/// ```
#[derive(Error, Debug)]
#[error("operation error {service}: {operation}, {kind}")]
pub struct OperationError {
    /// Service identifier.
    pub service: String,
    /// Operation name.
    pub operation: String,
    /// Underlying error.
    #[source]
    pub kind: ErrorKind,
}

impl OperationError {
    /// Wraps an error kind.
    #[must_use]
    pub fn new(service: impl Into<String>, operation: impl Into<String>, kind: ErrorKind) -> Self {
        Self {
            service: service.into(),
            operation: operation.into(),
            kind,
        }
    }

    /// Returns the service error, if the service answered with one.
    #[must_use]
    pub const fn api_error(&self) -> Option<&ApiError> {
        match &self.kind {
            ErrorKind::Api(err) => Some(err),
            _ => None,
        }
    }

    /// Returns `true` if the call was canceled.
    #[must_use]
    pub const fn is_canceled(&self) -> bool {
        matches!(self.kind, ErrorKind::Canceled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_operation_error_chains_source() {
        let err = OperationError::new(
            "Storage",
            "PutObject",
            ErrorKind::Serialization(SerializationError::MissingRequired {
                member: "Bucket".to_string(),
            }),
        );
        let kind = err.source().expect("kind is the source");
        let root = kind.source().expect("serialization error is chained");
        assert!(root.to_string().contains("Bucket"));
    }

    #[test]
    fn test_api_error_accessors() {
        let modeled = ApiError::Modeled {
            name: "NotFound".to_string(),
            message: "no such key".to_string(),
            fields: Value::structure(),
            status: 404,
        };
        assert!(modeled.is_modeled());
        assert_eq!(modeled.code(), "NotFound");
        assert_eq!(modeled.status(), 404);
        assert_eq!(modeled.to_string(), "NotFound: no such key");
    }

    #[test]
    fn test_transport_error_with_source() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset");
        let err = TransportError::with_source("connection lost", io);
        assert!(err.source().is_some());
    }

    #[test]
    fn test_local_failures() {
        let missing = ErrorKind::UnknownOperation {
            name: "Frobnicate".to_string(),
        };
        assert!(missing.is_local());
        assert_eq!(missing.label(), "unknown_operation");
        assert!(!ErrorKind::Transport(TransportError::new("reset")).is_local());
        assert!(!ErrorKind::Canceled.is_local());
    }
}
