//! # Hermes Protocol
//!
//! REST + JSON wire bindings for Hermes clients.
//!
//! - [`RequestSerializer`] turns an input [`Value`](hermes_core::Value) into
//!   an [`HttpRequest`](hermes_core::HttpRequest) following member bindings
//! - [`ResponseDeserializer`] turns a response into the output structure
//! - [`ErrorDispatcher`] maps error responses onto declared error shapes
//! - [`JsonCodec`] encodes and decodes the structured document body
//!
//! Serializers and deserializers are built once per operation from the
//! resolved model and reused for every call.

#![doc(html_root_url = "https://docs.rs/hermes-protocol/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod codec;
mod deserializer;
pub mod error_dispatch;
mod serializer;
mod settings;
pub mod timestamp;
pub mod wire;

pub use codec::{CodecError, DocumentCodec, JsonCodec};
pub use deserializer::ResponseDeserializer;
pub use error_dispatch::{
    ErrorCodeExtractor, ErrorDispatcher, ErrorInfo, JsonErrorCodeExtractor, UNKNOWN_ERROR,
};
pub use serializer::RequestSerializer;
pub use settings::{ProtocolSettings, ERROR_TYPE_HEADER};

use hermes_core::{BindingError, HttpResponse};
use thiserror::Error;

/// Headers carrying the service-assigned request id, in lookup order.
pub const REQUEST_ID_HEADERS: [&str; 2] = ["X-Amzn-Requestid", "X-Request-Id"];

/// Failure building a serializer or deserializer from the model.
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// Member bindings did not resolve.
    #[error(transparent)]
    Binding(#[from] BindingError),

    /// The HTTP trait names a method `http` cannot represent.
    #[error("operation `{operation}` declares invalid method `{method}`")]
    InvalidMethod {
        /// Operation name.
        operation: String,
        /// Declared method.
        method: String,
    },
}

/// Returns the request id the service attached to a response.
///
/// ```
/// use hermes_core::HttpResponse;
/// use http::StatusCode;
///
/// let response = HttpResponse::new(StatusCode::OK, "").with_header("x-request-id", "r-7");
/// assert_eq!(hermes_protocol::request_id(&response), Some("r-7"));
/// ```
#[must_use]
pub fn request_id(response: &HttpResponse) -> Option<&str> {
    REQUEST_ID_HEADERS
        .iter()
        .find_map(|name| response.headers.get(name))
}
