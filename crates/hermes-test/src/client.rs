//! Scripted in-memory transport.

use crate::error::TestError;
use crate::request::RecordedRequest;
use async_trait::async_trait;
use hermes_client::HttpClient;
use hermes_core::{HttpRequest, HttpResponse, TransportError};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

#[derive(Debug)]
enum Scripted {
    Response(HttpResponse),
    Failure(String),
}

#[derive(Debug, Default)]
struct State {
    script: VecDeque<Scripted>,
    requests: Vec<HttpRequest>,
}

/// An [`HttpClient`] that replays scripted responses in order and records
/// every request it receives.
///
/// Clones share the script, so a test keeps one handle for assertions and
/// hands another to the client builder.
///
/// ```
/// use hermes_test::{ResponseBuilder, ScriptedHttpClient};
///
/// let http = ScriptedHttpClient::new()
///     .respond(ResponseBuilder::ok().body("{}"))
///     .fail("connection reset");
/// assert_eq!(http.remaining(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ScriptedHttpClient {
    state: Arc<Mutex<State>>,
    latency: Option<Duration>,
}

impl ScriptedHttpClient {
    /// Creates a transport with an empty script.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a response.
    #[must_use]
    pub fn respond(self, response: impl Into<HttpResponse>) -> Self {
        self.lock().script.push_back(Scripted::Response(response.into()));
        self
    }

    /// Queues a transport failure.
    #[must_use]
    pub fn fail(self, message: impl Into<String>) -> Self {
        self.lock().script.push_back(Scripted::Failure(message.into()));
        self
    }

    /// Delays every response by `latency`.
    #[must_use]
    pub const fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Returns the number of scripted entries not yet consumed.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.lock().script.len()
    }

    /// Returns the number of requests received.
    #[must_use]
    pub fn request_count(&self) -> usize {
        self.lock().requests.len()
    }

    /// Returns every request received, in order.
    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.lock()
            .requests
            .iter()
            .cloned()
            .map(RecordedRequest::new)
            .collect()
    }

    /// Returns the request received at `index`.
    pub fn request(&self, index: usize) -> Result<RecordedRequest, TestError> {
        self.lock()
            .requests
            .get(index)
            .cloned()
            .map(RecordedRequest::new)
            .ok_or(TestError::MissingRequest(index))
    }

    /// Asserts that the whole script was consumed.
    ///
    /// # Panics
    ///
    /// Panics if scripted entries remain.
    pub fn assert_exhausted(&self) {
        let remaining = self.remaining();
        assert_eq!(remaining, 0, "{remaining} scripted responses were never sent");
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[async_trait]
impl HttpClient for ScriptedHttpClient {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        let next = {
            let mut state = self.lock();
            state.requests.push(request);
            state.script.pop_front()
        };
        match next {
            Some(Scripted::Response(response)) => Ok(response),
            Some(Scripted::Failure(message)) => Err(TransportError::new(message)),
            None => Err(TransportError::new("script exhausted")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ResponseBuilder;
    use http::{Method, StatusCode};

    #[tokio::test]
    async fn test_replays_in_order_and_records() {
        let http = ScriptedHttpClient::new()
            .respond(ResponseBuilder::status(StatusCode::ACCEPTED))
            .fail("reset");
        let handle = http.clone();

        let first = http.send(HttpRequest::new(Method::GET, "/a")).await.unwrap();
        assert_eq!(first.status, StatusCode::ACCEPTED);
        let second = http.send(HttpRequest::new(Method::GET, "/b")).await;
        assert_eq!(second.unwrap_err().message, "reset");
        let third = http.send(HttpRequest::new(Method::GET, "/c")).await;
        assert!(third.is_err());

        assert_eq!(handle.request_count(), 3);
        assert_eq!(handle.request(1).unwrap().path(), "/b");
        assert!(matches!(handle.request(3), Err(TestError::MissingRequest(3))));
        handle.assert_exhausted();
    }

    #[test]
    fn test_empty_script_fails_sends() {
        let http = ScriptedHttpClient::new();
        let result = tokio_test::block_on(http.send(HttpRequest::new(Method::DELETE, "/x")));
        assert_eq!(result.unwrap_err().message, "script exhausted");
        assert_eq!(http.request_count(), 1);
    }
}
