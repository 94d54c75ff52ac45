//! Deserialize-stage units.
//!
//! These act on the way back up: each calls `next` first and then works
//! on the output the units below it produced.

use hermes_codegen::builtin;
use hermes_core::ErrorKind;
use hermes_middleware::{BoxFuture, CallContext, Middleware, Next, StageInput, StageOutput};
use hermes_protocol::ResponseDeserializer;
use std::sync::Arc;

/// Copies the service request id into the response metadata.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestIdRetriever;

impl Middleware for RequestIdRetriever {
    fn id(&self) -> &str {
        builtin::REQUEST_ID_RETRIEVER
    }

    fn handle<'a>(
        &'a self,
        ctx: &'a mut CallContext,
        input: StageInput,
        next: Next<'a>,
    ) -> BoxFuture<'a, Result<StageOutput, ErrorKind>> {
        Box::pin(async move {
            let mut output = next.run(ctx, input).await?;
            let request_id = output
                .raw_response
                .as_ref()
                .and_then(hermes_protocol::request_id)
                .map(str::to_string);
            if request_id.is_some() {
                output.metadata.request_id = request_id;
            }
            Ok(output)
        })
    }
}

/// Turns the raw response into the operation output or a service error.
#[derive(Debug, Clone)]
pub struct OperationDeserializer {
    deserializer: Arc<ResponseDeserializer>,
}

impl OperationDeserializer {
    /// Wraps an operation's deserializer.
    #[must_use]
    pub fn new(deserializer: Arc<ResponseDeserializer>) -> Self {
        Self { deserializer }
    }
}

impl Middleware for OperationDeserializer {
    fn id(&self) -> &str {
        builtin::OPERATION_DESERIALIZER
    }

    fn handle<'a>(
        &'a self,
        ctx: &'a mut CallContext,
        input: StageInput,
        next: Next<'a>,
    ) -> BoxFuture<'a, Result<StageOutput, ErrorKind>> {
        Box::pin(async move {
            let mut output = next.run(ctx, input).await?;
            let response = output.raw_response.as_ref().ok_or_else(|| {
                ErrorKind::middleware(builtin::OPERATION_DESERIALIZER, "no response to deserialize")
            })?;
            match self.deserializer.deserialize(response) {
                Ok(value) => {
                    output.result = value;
                    Ok(output)
                }
                Err(err) => {
                    if let ErrorKind::Api(api) = &err {
                        tracing::debug!(
                            code = api.code(),
                            status = api.status(),
                            request_id = ?hermes_protocol::request_id(response),
                            "service returned an error"
                        );
                    }
                    Err(err)
                }
            }
        })
    }
}
