//! Transport and endpoint seams.
//!
//! Hermes never opens sockets. The application supplies an [`HttpClient`]
//! (hyper, reqwest, a test double, ...) and an [`EndpointResolver`].

use async_trait::async_trait;
use hermes_core::{ErrorKind, HttpRequest, HttpResponse, TransportError};
use hermes_middleware::CallContext;
use std::fmt;

/// Sends a fully built request and returns the buffered response.
///
/// Any status code is a successful send; only failures to exchange bytes
/// are errors.
///
/// # Example
///
/// ```
/// use async_trait::async_trait;
/// use hermes_client::HttpClient;
/// use hermes_core::{HttpRequest, HttpResponse, TransportError};
/// use http::StatusCode;
///
/// #[derive(Debug)]
/// struct AlwaysNoContent;
///
/// #[async_trait]
/// impl HttpClient for AlwaysNoContent {
///     async fn send(&self, _request: HttpRequest) -> Result<HttpResponse, TransportError> {
///         Ok(HttpResponse::new(StatusCode::NO_CONTENT, ""))
///     }
/// }
/// ```
#[async_trait]
pub trait HttpClient: Send + Sync + fmt::Debug {
    /// Sends one request.
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// Picks the endpoint of each call.
pub trait EndpointResolver: Send + Sync + fmt::Debug {
    /// Returns `scheme://host[:port][/base]` for the call.
    fn resolve(&self, ctx: &CallContext) -> Result<String, ErrorKind>;
}

/// One endpoint for every operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticEndpoint {
    url: String,
}

impl StaticEndpoint {
    /// Creates a resolver returning `url`.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

impl EndpointResolver for StaticEndpoint {
    fn resolve(&self, _ctx: &CallContext) -> Result<String, ErrorKind> {
        if self.url.starts_with("http://") || self.url.starts_with("https://") {
            Ok(self.url.clone())
        } else {
            Err(ErrorKind::Endpoint {
                message: format!("`{}` is not an http(s) URL", self.url),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_endpoint() {
        let ctx = CallContext::new("Storage", "GetObject");
        let ok = StaticEndpoint::new("https://storage.example.com");
        assert_eq!(ok.resolve(&ctx).unwrap(), "https://storage.example.com");

        let bad = StaticEndpoint::new("storage.example.com");
        assert!(matches!(bad.resolve(&ctx), Err(ErrorKind::Endpoint { .. })));
    }
}
