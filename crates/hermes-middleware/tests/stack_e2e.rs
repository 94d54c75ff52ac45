//! End-to-end stack tests.
//!
//! These tests register units through the slot registrar, instantiate a
//! per-call stack from the resulting template and run it against an
//! in-memory terminal handler:
//!
//! 1. Request path - units run stage by stage in registrar order
//! 2. Response path - Deserialize units post-process outer-in
//! 3. Per-call mutation - one instance changes without touching the template

use bytes::Bytes;
use hermes_core::{ErrorKind, HttpResponse, Value};
use hermes_middleware::{
    BoxFuture, CallContext, Directive, FnMiddleware, Middleware, Next, RelativePosition,
    SlotRegistrar, Stage, StageInput, StageOutput, UnitRegistry,
};
use http::StatusCode;
use std::sync::Arc;

/// Appends its id to the `x-trail` request header.
struct RequestMark(&'static str);

impl Middleware for RequestMark {
    fn id(&self) -> &str {
        self.0
    }

    fn handle<'a>(
        &'a self,
        ctx: &'a mut CallContext,
        mut input: StageInput,
        next: Next<'a>,
    ) -> BoxFuture<'a, Result<StageOutput, ErrorKind>> {
        Box::pin(async move {
            input.request.headers.append("x-trail", self.0);
            next.run(ctx, input).await
        })
    }
}

/// Calls `next` first, then appends its id to the response trail.
struct ResponseMark(&'static str);

impl Middleware for ResponseMark {
    fn id(&self) -> &str {
        self.0
    }

    fn handle<'a>(
        &'a self,
        ctx: &'a mut CallContext,
        input: StageInput,
        next: Next<'a>,
    ) -> BoxFuture<'a, Result<StageOutput, ErrorKind>> {
        Box::pin(async move {
            let mut output = next.run(ctx, input).await?;
            output
                .metadata
                .values
                .entry("trail".to_string())
                .or_default()
                .push_str(self.0);
            Ok(output)
        })
    }
}

fn transport(
    _ctx: &mut CallContext,
    input: StageInput,
) -> BoxFuture<'static, Result<StageOutput, ErrorKind>> {
    Box::pin(async move {
        let trail = input.request.headers.get_all("x-trail").join(",");
        Ok(StageOutput::from_response(HttpResponse::new(
            StatusCode::OK,
            Bytes::from(trail),
        )))
    })
}

fn registry() -> UnitRegistry {
    let mut registry = UnitRegistry::new();
    registry
        .register(RequestMark("Validate"))
        .register(RequestMark("Serializer"))
        .register(RequestMark("ContentLength"))
        .register(RequestMark("UserAgent"))
        .register(RequestMark("Endpoint"))
        .register(RequestMark("Signing"))
        .register(ResponseMark("RequestId"))
        .register(ResponseMark("Deserializer"));
    registry
}

fn registrar() -> SlotRegistrar {
    let mut registrar = SlotRegistrar::new();
    registrar
        .register(
            Stage::Initialize,
            [Directive::add(RelativePosition::After, ["Validate"])],
        )
        .unwrap();
    registrar
        .register(
            Stage::Serialize,
            [Directive::add(RelativePosition::After, ["Serializer"])],
        )
        .unwrap();
    registrar
        .register(
            Stage::Build,
            [
                Directive::add(RelativePosition::After, ["ContentLength"]),
                Directive::insert("ContentLength", RelativePosition::Before, ["UserAgent"]),
            ],
        )
        .unwrap();
    registrar
        .register(
            Stage::Finalize,
            [Directive::add(RelativePosition::After, ["Endpoint", "Signing"])],
        )
        .unwrap();
    registrar
        .register(
            Stage::Deserialize,
            [Directive::add(RelativePosition::After, ["RequestId", "Deserializer"])],
        )
        .unwrap();
    registrar
}

#[tokio::test]
async fn test_request_path_follows_template_order() {
    let template = registrar().build().unwrap();
    let stack = template.instantiate("GetObject", &registry()).unwrap();

    let mut ctx = CallContext::new("Storage", "GetObject");
    let output = stack
        .handle(&mut ctx, StageInput::new(Value::structure()), transport)
        .await
        .unwrap();

    assert_eq!(
        output.raw_response.unwrap().body,
        Bytes::from_static(b"Validate,Serializer,UserAgent,ContentLength,Endpoint,Signing")
    );
}

#[tokio::test]
async fn test_response_path_is_outer_in() {
    let template = registrar().build().unwrap();
    let stack = template.instantiate("GetObject", &registry()).unwrap();

    let mut ctx = CallContext::new("Storage", "GetObject");
    let output = stack
        .handle(&mut ctx, StageInput::new(Value::structure()), transport)
        .await
        .unwrap();

    // Deserializer is closer to the transport, so it sees the response first.
    assert_eq!(output.metadata.values["trail"], "DeserializerRequestId");
}

#[tokio::test]
async fn test_per_call_mutation_leaves_template_untouched() {
    let template = registrar().build().unwrap();
    let registry = registry();

    let mut first = template.instantiate("GetObject", &registry).unwrap();
    first.remove("Signing").unwrap();
    first
        .insert(
            Stage::Build,
            Arc::new(FnMiddleware::new(
                "Presign",
                |ctx, mut input, next| {
                    Box::pin(async move {
                        input.request.headers.append("x-trail", "Presign");
                        next.run(ctx, input).await
                    })
                },
            )),
            "UserAgent",
            RelativePosition::After,
        )
        .unwrap();

    let second = template.instantiate("GetObject", &registry).unwrap();

    let mut ctx = CallContext::new("Storage", "GetObject");
    let mutated = first
        .handle(&mut ctx, StageInput::new(Value::structure()), transport)
        .await
        .unwrap();
    assert_eq!(
        mutated.raw_response.unwrap().body,
        Bytes::from_static(b"Validate,Serializer,UserAgent,Presign,ContentLength,Endpoint")
    );

    assert_eq!(second.ids(Stage::Finalize), ["Endpoint", "Signing"]);
    assert_eq!(template.ids(Stage::Finalize), ["Endpoint", "Signing"]);
}

#[tokio::test]
async fn test_unit_error_stops_the_chain() {
    let mut registry = registry();
    registry.register(FnMiddleware::new(
        "Validate",
        |_ctx, _input, _next| {
            Box::pin(async move { Err(ErrorKind::middleware("Validate", "bad input")) })
        },
    ));
    let stack = registrar()
        .build()
        .unwrap()
        .instantiate("GetObject", &registry)
        .unwrap();

    let mut ctx = CallContext::new("Storage", "GetObject");
    let err = stack
        .handle(&mut ctx, StageInput::new(Value::structure()), transport)
        .await
        .unwrap_err();
    assert!(matches!(err, ErrorKind::Middleware { ref id, .. } if id == "Validate"));
}
