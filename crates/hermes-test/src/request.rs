//! Recorded request inspection.

use crate::error::TestError;
use hermes_core::HttpRequest;
use http::Method;
use serde::de::DeserializeOwned;

/// A request captured by [`ScriptedHttpClient`](crate::ScriptedHttpClient).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    inner: HttpRequest,
}

impl RecordedRequest {
    pub(crate) const fn new(inner: HttpRequest) -> Self {
        Self { inner }
    }

    /// Returns the method.
    #[must_use]
    pub const fn method(&self) -> &Method {
        &self.inner.method
    }

    /// Returns the escaped path.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.inner.path
    }

    /// Returns the full URL.
    #[must_use]
    pub fn url(&self) -> String {
        self.inner.url()
    }

    /// Returns the first value of a header.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.inner.headers.get(name)
    }

    /// Returns every value of a query parameter, in order.
    #[must_use]
    pub fn query(&self, key: &str) -> Vec<&str> {
        self.inner
            .query
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    /// Returns the body as text.
    pub fn text(&self) -> Result<&str, TestError> {
        std::str::from_utf8(&self.inner.body)
            .map_err(|e| TestError::BodyRead(format!("invalid UTF-8: {e}")))
    }

    /// Deserializes the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, TestError> {
        Ok(serde_json::from_slice(&self.inner.body)?)
    }

    /// Returns the underlying request.
    #[must_use]
    pub const fn as_http(&self) -> &HttpRequest {
        &self.inner
    }

    /// Asserts that a header has the expected value.
    ///
    /// # Panics
    ///
    /// Panics if the header is missing or differs.
    pub fn assert_header(&self, name: &str, expected: &str) -> &Self {
        assert_eq!(
            self.header(name),
            Some(expected),
            "Expected header {name} to be {expected}"
        );
        self
    }

    /// Asserts that a header is absent.
    ///
    /// # Panics
    ///
    /// Panics if the header is present.
    pub fn assert_no_header(&self, name: &str) -> &Self {
        assert!(
            !self.inner.headers.contains(name),
            "Expected no header {name}, got {:?}",
            self.header(name)
        );
        self
    }

    /// Asserts that a query parameter has exactly the expected values.
    ///
    /// # Panics
    ///
    /// Panics if the values differ.
    pub fn assert_query(&self, key: &str, expected: &[&str]) -> &Self {
        assert_eq!(self.query(key), expected, "Query parameter {key}");
        self
    }
}
