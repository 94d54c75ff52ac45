//! Build-stage units.

use hermes_codegen::builtin;
use hermes_core::ErrorKind;
use hermes_middleware::{BoxFuture, CallContext, Middleware, Next, StageInput, StageOutput};
use http::Method;

/// Sets `Content-Length` from the body unless a unit already set it.
///
/// Bodiless `POST`, `PUT` and `PATCH` requests get an explicit `0`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ComputeContentLength;

impl Middleware for ComputeContentLength {
    fn id(&self) -> &str {
        builtin::COMPUTE_CONTENT_LENGTH
    }

    fn handle<'a>(
        &'a self,
        ctx: &'a mut CallContext,
        mut input: StageInput,
        next: Next<'a>,
    ) -> BoxFuture<'a, Result<StageOutput, ErrorKind>> {
        Box::pin(async move {
            let request = &mut input.request;
            let needs_length = !request.body.is_empty()
                || matches!(request.method, Method::POST | Method::PUT | Method::PATCH);
            if needs_length && !request.headers.contains("content-length") {
                let length = request.body.len().to_string();
                request.headers.insert("content-length", length);
            }
            next.run(ctx, input).await
        })
    }
}

/// Sets `User-Agent`, keeping any value placed by earlier units in front.
#[derive(Debug, Clone)]
pub struct UserAgent {
    value: String,
}

impl UserAgent {
    /// Product token of this crate, e.g. `hermes/0.1.0`.
    pub const PRODUCT: &'static str = concat!("hermes/", env!("CARGO_PKG_VERSION"));

    /// Creates the unit with a full header value.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }

    /// Builds the header value from an optional application suffix.
    #[must_use]
    pub fn with_suffix(suffix: Option<&str>) -> Self {
        match suffix.filter(|s| !s.is_empty()) {
            Some(suffix) => Self::new(format!("{} {suffix}", Self::PRODUCT)),
            None => Self::new(Self::PRODUCT),
        }
    }

    /// Returns the value this unit appends.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }
}

impl Middleware for UserAgent {
    fn id(&self) -> &str {
        builtin::USER_AGENT
    }

    fn handle<'a>(
        &'a self,
        ctx: &'a mut CallContext,
        mut input: StageInput,
        next: Next<'a>,
    ) -> BoxFuture<'a, Result<StageOutput, ErrorKind>> {
        Box::pin(async move {
            let headers = &mut input.request.headers;
            let value = match headers.get("user-agent") {
                Some(existing) => format!("{existing} {}", self.value),
                None => self.value.clone(),
            };
            headers.insert("user-agent", value);
            next.run(ctx, input).await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hermes_core::{HttpRequest, HttpResponse, Value};
    use http::StatusCode;

    /// Terminal that echoes the request headers it saw back as the body.
    fn echo<'a>() -> Next<'a> {
        Next::terminal(|_ctx, input: StageInput| {
            let seen = input
                .request
                .headers
                .iter()
                .map(|(name, values)| format!("{name}={}", values.join(",")))
                .collect::<Vec<_>>()
                .join(";");
            Box::pin(async move { Ok(StageOutput::from_response(HttpResponse::new(StatusCode::OK, seen))) })
        })
    }

    fn input(method: Method, body: &'static str) -> StageInput {
        let mut input = StageInput::new(Value::Null);
        input.request = HttpRequest::new(method, "/");
        input.request.body = body.into();
        input
    }

    async fn seen(unit: &dyn Middleware, input: StageInput) -> String {
        let mut ctx = CallContext::new("S", "Op");
        let output = unit.handle(&mut ctx, input, echo()).await.unwrap();
        String::from_utf8(output.raw_response.unwrap().body.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_content_length_from_body() {
        assert_eq!(
            seen(&ComputeContentLength, input(Method::PUT, "hello")).await,
            "Content-Length=5"
        );
    }

    #[tokio::test]
    async fn test_empty_post_gets_zero_and_get_gets_nothing() {
        assert_eq!(
            seen(&ComputeContentLength, input(Method::POST, "")).await,
            "Content-Length=0"
        );
        assert_eq!(seen(&ComputeContentLength, input(Method::GET, "")).await, "");
    }

    #[tokio::test]
    async fn test_user_agent_appends_to_existing() {
        let mut request = input(Method::GET, "");
        request.request.headers.insert("user-agent", "my-app/2.0");
        let unit = UserAgent::with_suffix(Some("ci"));
        assert_eq!(
            seen(&unit, request).await,
            format!("User-Agent=my-app/2.0 {} ci", UserAgent::PRODUCT)
        );
    }
}
