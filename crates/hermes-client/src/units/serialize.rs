//! Serialize-stage unit.

use hermes_codegen::builtin;
use hermes_core::ErrorKind;
use hermes_middleware::{BoxFuture, CallContext, Middleware, Next, StageInput, StageOutput};
use hermes_protocol::RequestSerializer;
use std::sync::Arc;

/// Header carrying the per-call invocation id.
pub const INVOCATION_ID_HEADER: &str = "X-Hermes-Invocation-Id";

/// Builds the wire request from the input parameters.
#[derive(Debug, Clone)]
pub struct OperationSerializer {
    serializer: Arc<RequestSerializer>,
}

impl OperationSerializer {
    /// Wraps an operation's serializer.
    #[must_use]
    pub fn new(serializer: Arc<RequestSerializer>) -> Self {
        Self { serializer }
    }
}

impl Middleware for OperationSerializer {
    fn id(&self) -> &str {
        builtin::OPERATION_SERIALIZER
    }

    fn handle<'a>(
        &'a self,
        ctx: &'a mut CallContext,
        mut input: StageInput,
        next: Next<'a>,
    ) -> BoxFuture<'a, Result<StageOutput, ErrorKind>> {
        Box::pin(async move {
            let mut request = self.serializer.serialize(&input.parameters)?;
            request
                .headers
                .insert(INVOCATION_ID_HEADER, ctx.invocation_id().to_string());
            tracing::debug!(
                method = %request.method,
                path = %request.path,
                body_bytes = request.body.len(),
                "serialized request"
            );
            input.request = request;
            next.run(ctx, input).await
        })
    }
}
