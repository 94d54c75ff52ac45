//! Canned response building.

use bytes::Bytes;
use hermes_core::HttpResponse;
use http::StatusCode;
use serde::Serialize;

/// Builds an [`HttpResponse`] for a scripted transport.
///
/// ```
/// use hermes_test::ResponseBuilder;
///
/// let response = ResponseBuilder::ok()
///     .json(&serde_json::json!({"State": "READY"}))
///     .request_id("req-1")
///     .build();
/// assert_eq!(response.headers.get("x-amzn-requestid"), Some("req-1"));
/// ```
#[derive(Debug, Clone)]
#[must_use]
pub struct ResponseBuilder {
    response: HttpResponse,
}

impl ResponseBuilder {
    /// Starts a response with a status.
    pub fn status(status: StatusCode) -> Self {
        Self {
            response: HttpResponse::new(status, Bytes::new()),
        }
    }

    /// Starts a `200 OK` response.
    pub fn ok() -> Self {
        Self::status(StatusCode::OK)
    }

    /// Starts a JSON error response carrying `code` and `message`.
    pub fn error(status: StatusCode, code: &str, message: &str) -> Self {
        Self::status(status).json(&serde_json::json!({
            "code": code,
            "message": message,
        }))
    }

    /// Appends a header.
    pub fn header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.response = self.response.with_header(name, value);
        self
    }

    /// Sets the service request id header.
    pub fn request_id(self, id: impl Into<String>) -> Self {
        self.header("x-amzn-requestid", id)
    }

    /// Sets a raw body.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.response.body = body.into();
        self
    }

    /// Sets a JSON body and its content type.
    ///
    /// # Panics
    ///
    /// Panics if `value` cannot be serialized.
    pub fn json<T: Serialize>(self, value: &T) -> Self {
        let body = serde_json::to_vec(value).expect("serializable test body");
        self.header("content-type", "application/json").body(body)
    }

    /// Finishes the response.
    #[must_use]
    pub fn build(self) -> HttpResponse {
        self.response
    }
}

impl From<ResponseBuilder> for HttpResponse {
    fn from(builder: ResponseBuilder) -> Self {
        builder.build()
    }
}

/// A `200 OK` response with a JSON body.
#[must_use]
pub fn ok_json(value: serde_json::Value) -> HttpResponse {
    ResponseBuilder::ok().json(&value).build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_response_body() {
        let response = ResponseBuilder::error(StatusCode::NOT_FOUND, "NoSuchJob", "gone").build();
        assert_eq!(response.status, StatusCode::NOT_FOUND);
        let body: serde_json::Value = serde_json::from_slice(&response.body).unwrap();
        assert_eq!(body["code"], "NoSuchJob");
        assert_eq!(response.headers.get("Content-Type"), Some("application/json"));
    }
}
