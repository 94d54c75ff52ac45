//! Values flowing through the stack.

use hermes_core::{HttpRequest, HttpResponse, Value};
use std::collections::BTreeMap;

/// What each unit receives on the way down.
///
/// Initialize units only look at `parameters`; Serialize units fill in
/// `request`; later units refine `request`.
#[derive(Debug, Clone, Default)]
pub struct StageInput {
    /// Operation input.
    pub parameters: Value,
    /// Request under construction. Created empty for every call.
    pub request: HttpRequest,
}

impl StageInput {
    /// Creates an input with a fresh empty request.
    #[must_use]
    pub fn new(parameters: Value) -> Self {
        Self {
            parameters,
            request: HttpRequest::default(),
        }
    }
}

/// What each unit returns on the way up.
#[derive(Debug, Clone, Default)]
pub struct StageOutput {
    /// Deserialized output. `Null` until the operation deserializer ran.
    pub result: Value,
    /// The raw response from the transport.
    pub raw_response: Option<HttpResponse>,
    /// Metadata collected on the response path.
    pub metadata: ResponseMetadata,
}

impl StageOutput {
    /// Wraps a raw response.
    #[must_use]
    pub fn from_response(response: HttpResponse) -> Self {
        Self {
            result: Value::Null,
            metadata: ResponseMetadata {
                status: Some(response.status.as_u16()),
                ..ResponseMetadata::default()
            },
            raw_response: Some(response),
        }
    }
}

/// Metadata about a completed call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseMetadata {
    /// HTTP status of the final response.
    pub status: Option<u16>,
    /// Service-assigned request id.
    pub request_id: Option<String>,
    /// Free-form values recorded by units.
    pub values: BTreeMap<String, String>,
}
