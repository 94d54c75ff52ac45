//! Request signing.
//!
//! The `Signing` unit hands the finalized request to the configured
//! [`Signer`]. Signers run after the endpoint is resolved, so they see the
//! full URL.

use hermes_core::{ErrorKind, HttpRequest};
use hermes_middleware::CallContext;
use std::fmt;

/// Applies an auth scheme to an outgoing request.
pub trait Signer: Send + Sync + fmt::Debug {
    /// Scheme name, for logs.
    fn scheme(&self) -> &str;

    /// Signs the request in place.
    fn sign(&self, request: &mut HttpRequest, ctx: &CallContext) -> Result<(), ErrorKind>;
}

/// Sends requests unsigned.
#[derive(Debug, Clone, Copy, Default)]
pub struct Anonymous;

impl Signer for Anonymous {
    fn scheme(&self) -> &str {
        "anonymous"
    }

    fn sign(&self, _request: &mut HttpRequest, _ctx: &CallContext) -> Result<(), ErrorKind> {
        Ok(())
    }
}

/// Sets `Authorization: Bearer <token>`.
#[derive(Clone)]
pub struct BearerToken {
    token: String,
}

impl BearerToken {
    /// Creates a signer for a static token.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BearerToken").field("token", &"<redacted>").finish()
    }
}

impl Signer for BearerToken {
    fn scheme(&self) -> &str {
        "bearer"
    }

    fn sign(&self, request: &mut HttpRequest, _ctx: &CallContext) -> Result<(), ErrorKind> {
        if self.token.is_empty() {
            return Err(ErrorKind::middleware("Signing", "bearer token is empty"));
        }
        request
            .headers
            .insert("authorization", format!("Bearer {}", self.token));
        Ok(())
    }
}
