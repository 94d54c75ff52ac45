//! Finalize-stage units.

use crate::auth::Signer;
use crate::transport::EndpointResolver;
use hermes_codegen::builtin;
use hermes_core::ErrorKind;
use hermes_middleware::{BoxFuture, CallContext, Middleware, Next, StageInput, StageOutput};
use std::sync::Arc;

/// Prefixes the request with the resolved endpoint.
#[derive(Debug, Clone)]
pub struct ResolveEndpoint {
    resolver: Arc<dyn EndpointResolver>,
}

impl ResolveEndpoint {
    /// Creates the unit.
    #[must_use]
    pub fn new(resolver: Arc<dyn EndpointResolver>) -> Self {
        Self { resolver }
    }
}

impl Middleware for ResolveEndpoint {
    fn id(&self) -> &str {
        builtin::RESOLVE_ENDPOINT
    }

    fn handle<'a>(
        &'a self,
        ctx: &'a mut CallContext,
        mut input: StageInput,
        next: Next<'a>,
    ) -> BoxFuture<'a, Result<StageOutput, ErrorKind>> {
        Box::pin(async move {
            let endpoint = self.resolver.resolve(ctx)?;
            tracing::debug!(endpoint = %endpoint, "resolved endpoint");
            input.request.endpoint = Some(endpoint);
            next.run(ctx, input).await
        })
    }
}

/// Applies the configured [`Signer`].
#[derive(Debug, Clone)]
pub struct Signing {
    signer: Arc<dyn Signer>,
}

impl Signing {
    /// Creates the unit.
    #[must_use]
    pub fn new(signer: Arc<dyn Signer>) -> Self {
        Self { signer }
    }
}

impl Middleware for Signing {
    fn id(&self) -> &str {
        builtin::SIGNING
    }

    fn handle<'a>(
        &'a self,
        ctx: &'a mut CallContext,
        mut input: StageInput,
        next: Next<'a>,
    ) -> BoxFuture<'a, Result<StageOutput, ErrorKind>> {
        Box::pin(async move {
            self.signer.sign(&mut input.request, ctx)?;
            tracing::trace!(scheme = self.signer.scheme(), "signed request");
            next.run(ctx, input).await
        })
    }
}
