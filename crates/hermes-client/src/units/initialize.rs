//! Initialize-stage units.

use hermes_codegen::builtin;
use hermes_core::{ErrorKind, OperationBindings, SerializationError};
use hermes_middleware::{BoxFuture, CallContext, Middleware, Next, StageInput, StageOutput};
use hermes_telemetry::metrics;
use std::time::Instant;
use tracing::Instrument;

/// Opens the invocation span, logs the outcome and records metrics.
///
/// Runs first, so its span covers every other unit and the transport.
#[derive(Debug, Clone, Copy, Default)]
pub struct OperationLogging;

impl Middleware for OperationLogging {
    fn id(&self) -> &str {
        builtin::OPERATION_LOGGING
    }

    fn handle<'a>(
        &'a self,
        ctx: &'a mut CallContext,
        input: StageInput,
        next: Next<'a>,
    ) -> BoxFuture<'a, Result<StageOutput, ErrorKind>> {
        Box::pin(async move {
            let service = ctx.service().to_string();
            let operation = ctx.operation().to_string();
            let span = tracing::info_span!(
                "invoke",
                service = %service,
                operation = %operation,
                invocation_id = %ctx.invocation_id(),
            );

            let started = Instant::now();
            let result = next.run(ctx, input).instrument(span.clone()).await;
            let elapsed = started.elapsed();

            span.in_scope(|| match &result {
                Ok(output) => tracing::debug!(
                    status = ?output.metadata.status,
                    request_id = ?output.metadata.request_id,
                    duration_ms = elapsed.as_secs_f64() * 1000.0,
                    "invocation succeeded"
                ),
                Err(err) => tracing::debug!(
                    error = %err,
                    kind = err.label(),
                    duration_ms = elapsed.as_secs_f64() * 1000.0,
                    "invocation failed"
                ),
            });
            metrics::record_invocation(
                &service,
                &operation,
                result.as_ref().err().map(ErrorKind::label),
                elapsed,
            );
            result
        })
    }
}

/// Rejects inputs missing a required member before anything is built.
#[derive(Debug, Clone)]
pub struct ValidateRequired {
    required: Vec<String>,
}

impl ValidateRequired {
    /// Collects the required members of the input bindings.
    #[must_use]
    pub fn new(bindings: &OperationBindings) -> Self {
        Self {
            required: bindings
                .bindings()
                .iter()
                .filter(|b| b.required)
                .map(|b| b.member.clone())
                .collect(),
        }
    }
}

impl Middleware for ValidateRequired {
    fn id(&self) -> &str {
        builtin::VALIDATE_REQUIRED
    }

    fn handle<'a>(
        &'a self,
        ctx: &'a mut CallContext,
        input: StageInput,
        next: Next<'a>,
    ) -> BoxFuture<'a, Result<StageOutput, ErrorKind>> {
        Box::pin(async move {
            // Non-structure inputs are reported by the serializer.
            if input.parameters.fields().is_some() || input.parameters.is_null() {
                if let Some(member) = self
                    .required
                    .iter()
                    .find(|member| input.parameters.get(member).is_none())
                {
                    return Err(ErrorKind::Serialization(
                        SerializationError::MissingRequired {
                            member: member.clone(),
                        },
                    ));
                }
            }
            next.run(ctx, input).await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hermes_core::{HttpResponse, Member, PathTemplate, Shape, Value};
    use http::StatusCode;

    fn ok_terminal<'a>() -> Next<'a> {
        Next::terminal(|_ctx, _input| {
            Box::pin(async { Ok(StageOutput::from_response(HttpResponse::new(StatusCode::OK, ""))) })
        })
    }

    fn validator() -> ValidateRequired {
        let input = Shape::structure(
            "GetInput",
            vec![
                Member::new("Id", Shape::string("Id")).required().label(),
                Member::new("Verbose", Shape::boolean("Verbose")).query("verbose"),
            ],
        );
        let template = PathTemplate::parse("/items/{Id}").unwrap();
        ValidateRequired::new(&OperationBindings::resolve_input(&input, Some(&template)).unwrap())
    }

    #[tokio::test]
    async fn test_missing_required_member() {
        let unit = validator();
        let mut ctx = CallContext::new("S", "Get");
        let input = StageInput::new(Value::structure().with("Verbose", true));
        let err = unit.handle(&mut ctx, input, ok_terminal()).await.unwrap_err();
        assert!(matches!(
            err,
            ErrorKind::Serialization(SerializationError::MissingRequired { ref member }) if member == "Id"
        ));
    }

    #[tokio::test]
    async fn test_null_counts_as_missing() {
        let unit = validator();
        let mut ctx = CallContext::new("S", "Get");
        let input = StageInput::new(Value::structure().with("Id", Value::Null));
        assert!(unit.handle(&mut ctx, input, ok_terminal()).await.is_err());
    }

    #[tokio::test]
    async fn test_present_member_passes() {
        let unit = validator();
        let mut ctx = CallContext::new("S", "Get");
        let input = StageInput::new(Value::structure().with("Id", "42"));
        assert!(unit.handle(&mut ctx, input, ok_terminal()).await.is_ok());
    }

    #[tokio::test]
    async fn test_logging_passes_result_through() {
        let mut ctx = CallContext::new("S", "Get");
        let output = OperationLogging
            .handle(&mut ctx, StageInput::new(Value::Null), ok_terminal())
            .await
            .unwrap();
        assert_eq!(output.metadata.status, Some(200));
    }
}
