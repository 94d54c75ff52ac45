//! Wire messages.
//!
//! [`HttpRequest`] and [`HttpResponse`] are the transport-facing values the
//! pipeline builds and consumes. Header names are stored in canonical form
//! (see [`canonical_header_name`]) so the exact casing is preserved on the
//! wire, while lookups stay case-insensitive.

use bytes::Bytes;
use http::{Method, StatusCode};
use indexmap::IndexMap;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Characters left unescaped in query keys and values.
const QUERY_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Canonicalizes a header name.
///
/// The first letter and every letter following a `-` are uppercased; all
/// other letters are lowercased.
///
/// # Example
///
/// ```
/// use hermes_core::canonical_header_name;
///
/// assert_eq!(canonical_header_name("x-my-header"), "X-My-Header");
/// assert_eq!(canonical_header_name("CONTENT-TYPE"), "Content-Type");
/// ```
#[must_use]
pub fn canonical_header_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper = true;
    for c in name.chars() {
        if upper {
            out.extend(c.to_uppercase());
        } else {
            out.extend(c.to_lowercase());
        }
        upper = c == '-';
    }
    out
}

/// Ordered multi-valued headers keyed by canonical name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: IndexMap<String, Vec<String>>,
}

impl Headers {
    /// Creates an empty header set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces all values of a header.
    pub fn insert(&mut self, name: &str, value: impl Into<String>) {
        self.entries
            .insert(canonical_header_name(name), vec![value.into()]);
    }

    /// Appends a value to a header.
    pub fn append(&mut self, name: &str, value: impl Into<String>) {
        self.entries
            .entry(canonical_header_name(name))
            .or_default()
            .push(value.into());
    }

    /// Returns the first value of a header.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .get(&canonical_header_name(name))
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    /// Returns every value of a header.
    #[must_use]
    pub fn get_all(&self, name: &str) -> &[String] {
        self.entries
            .get(&canonical_header_name(name))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Returns `true` if the header is present.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(&canonical_header_name(name))
    }

    /// Removes a header, returning its values.
    pub fn remove(&mut self, name: &str) -> Option<Vec<String>> {
        self.entries.shift_remove(&canonical_header_name(name))
    }

    /// Iterates over `(canonical name, values)` in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(name, values)| (name.as_str(), values.as_slice()))
    }

    /// Returns the number of distinct header names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no headers are set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for Headers {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut headers = Self::new();
        for (name, value) in iter {
            headers.append(name.as_ref(), value);
        }
        headers
    }
}

/// An outgoing request.
///
/// The request is a plain value: it is cloned for every attempt rather than
/// reused, so a body is never consumed twice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    /// HTTP method.
    pub method: Method,
    /// Endpoint prefix (`scheme://host[:port][/base]`), set during Finalize.
    pub endpoint: Option<String>,
    /// Escaped path.
    pub path: String,
    /// Unescaped query pairs, in order.
    pub query: Vec<(String, String)>,
    /// Headers.
    pub headers: Headers,
    /// Body bytes.
    pub body: Bytes,
}

impl Default for HttpRequest {
    fn default() -> Self {
        Self::new(Method::GET, "/")
    }
}

impl HttpRequest {
    /// Creates an empty request.
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            endpoint: None,
            path: path.into(),
            query: Vec::new(),
            headers: Headers::new(),
            body: Bytes::new(),
        }
    }

    /// Returns `true` if a query parameter with this key is already set.
    #[must_use]
    pub fn has_query(&self, key: &str) -> bool {
        self.query.iter().any(|(k, _)| k == key)
    }

    /// Renders the escaped query string, without the leading `?`.
    ///
    /// Every pair is written as `key=value`, so an empty value renders as
    /// `key=`.
    #[must_use]
    pub fn query_string(&self) -> String {
        self.query
            .iter()
            .map(|(k, v)| {
                format!(
                    "{}={}",
                    utf8_percent_encode(k, QUERY_ENCODE_SET),
                    utf8_percent_encode(v, QUERY_ENCODE_SET)
                )
            })
            .collect::<Vec<_>>()
            .join("&")
    }

    /// Renders the full URL (or path and query when no endpoint is set).
    #[must_use]
    pub fn url(&self) -> String {
        let mut url = self
            .endpoint
            .as_deref()
            .map(|e| e.trim_end_matches('/').to_string())
            .unwrap_or_default();
        url.push_str(&self.path);
        if !self.query.is_empty() {
            url.push('?');
            url.push_str(&self.query_string());
        }
        url
    }
}

/// An incoming response, fully buffered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// Status code.
    pub status: StatusCode,
    /// Headers.
    pub headers: Headers,
    /// Body bytes.
    pub body: Bytes,
}

impl HttpResponse {
    /// Creates a response with no headers.
    #[must_use]
    pub fn new(status: StatusCode, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers: Headers::new(),
            body: body.into(),
        }
    }

    /// Adds a header, for literal construction.
    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.append(name, value);
        self
    }

    /// Returns `true` for a status in `200..=299`.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_canonical_header_name() {
        assert_eq!(canonical_header_name("x-my-header"), "X-My-Header");
        assert_eq!(canonical_header_name("X-AMZ-META-"), "X-Amz-Meta-");
        assert_eq!(canonical_header_name("etag"), "Etag");
        assert_eq!(canonical_header_name(""), "");
    }

    #[test]
    fn test_headers_case_insensitive_lookup() {
        let mut headers = Headers::new();
        headers.append("x-list", "a");
        headers.append("X-LIST", "b");
        assert_eq!(headers.get_all("X-List"), &["a".to_string(), "b".to_string()]);
        assert_eq!(headers.iter().next().unwrap().0, "X-List");
        assert_eq!(headers.len(), 1);
    }

    #[test]
    fn test_insert_replaces() {
        let mut headers = Headers::new();
        headers.append("content-type", "text/plain");
        headers.insert("Content-Type", "application/json");
        assert_eq!(headers.get_all("content-type").len(), 1);
        assert_eq!(headers.get("content-type"), Some("application/json"));
    }

    #[test]
    fn test_url_rendering() {
        let mut request = HttpRequest::new(Method::GET, "/items/a%20b");
        request.endpoint = Some("https://api.example.com/".to_string());
        request.query.push(("prefix".to_string(), "x y/z".to_string()));
        request.query.push(("versions".to_string(), String::new()));
        assert_eq!(
            request.url(),
            "https://api.example.com/items/a%20b?prefix=x%20y%2Fz&versions="
        );
    }

    #[test]
    fn test_empty_query_values_keep_the_separator() {
        let mut request = HttpRequest::new(Method::GET, "/things");
        request.query.push(("tagging".to_string(), String::new()));
        request.query.push(("name".to_string(), String::new()));
        request.query.push(("x-id".to_string(), "Put".to_string()));
        assert_eq!(request.query_string(), "tagging=&name=&x-id=Put");
        assert_eq!(request.url(), "/things?tagging=&name=&x-id=Put");
    }

    proptest! {
        #[test]
        fn prop_canonicalization_is_idempotent(name in "[a-zA-Z0-9-]{0,24}") {
            let once = canonical_header_name(&name);
            prop_assert_eq!(canonical_header_name(&once), once.clone());
            prop_assert!(once.eq_ignore_ascii_case(&name));
        }
    }
}
