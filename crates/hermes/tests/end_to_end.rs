//! Generation, configuration and the runtime client working together over a
//! scripted transport.

use hermes::prelude::*;
use hermes::setup;
use hermes_test::{ok_json, ResponseBuilder, ScriptedHttpClient};
use serde_json::json;
use std::time::Duration;

const MODEL: &str = r#"{
    "id": "Queues",
    "version": "2024-02-01",
    "operations": [
        {
            "name": "GetQueue",
            "input": {"id": "GetQueueInput", "type": "structure", "members": [
                {"name": "Name", "target": {"id": "Name", "type": "string"},
                 "traits": {"required": true, "http_label": true}}
            ]},
            "output": {"id": "GetQueueOutput", "type": "structure", "members": [
                {"name": "State", "target": {"id": "State", "type": "string"}}
            ]},
            "errors": [{"id": "queues#QueueNotFound", "type": "structure", "members": []}],
            "http": {"method": "GET", "uri": "/queues/{Name}"},
            "waiters": [{
                "name": "QueueReady",
                "min_delay": 1,
                "max_delay": 10,
                "acceptors": [
                    {"state": "success", "matcher": {"output": {
                        "path": "State", "expected": "READY", "comparator": "stringEquals"}}},
                    {"state": "failure", "matcher": {"output": {
                        "path": "State", "expected": "DELETED", "comparator": "stringEquals"}}},
                    {"state": "retry", "matcher": {"errorType": "QueueNotFound"}}
                ]
            }]
        },
        {
            "name": "CreateQueue",
            "input": {"id": "CreateQueueInput", "type": "structure", "members": [
                {"name": "Name", "target": {"id": "Name", "type": "string"}, "traits": {"required": true}},
                {"name": "Token", "target": {"id": "Token", "type": "string"},
                 "traits": {"http_header": "x-client-token"}}
            ]},
            "output": {"id": "CreateQueueOutput", "type": "structure", "members": [
                {"name": "Arn", "target": {"id": "Arn", "type": "string"}}
            ]},
            "http": {"method": "POST", "uri": "/queues"}
        },
        {
            "name": "ListQueues",
            "input": {"id": "ListQueuesInput", "type": "structure", "members": [
                {"name": "Cursor", "target": {"id": "Cursor", "type": "string"},
                 "traits": {"http_query": "cursor"}}
            ]},
            "output": {"id": "ListQueuesOutput", "type": "structure", "members": [
                {"name": "Next", "target": {"id": "Cursor", "type": "string"}},
                {"name": "Queues", "target": {"id": "Queues", "type": "list",
                    "member": {"id": "Name", "type": "string"}}}
            ]},
            "http": {"method": "GET", "uri": "/queues"},
            "paginated": {"input_token": "Cursor", "output_token": "Next", "items": "Queues"}
        }
    ]
}"#;

const CONFIG: &str = r#"
[protocol]
error_type_header = "X-Error-Code"

[waiter]
disable_jitter = true
max_wait_secs = 120

[client]
endpoint = "https://queues.example.com"
user_agent_suffix = "integration/1"
"#;

fn config() -> anyhow::Result<HermesConfig> {
    Ok(ConfigLoader::new().with_string(CONFIG, "toml")?.load()?)
}

fn client(http: &ScriptedHttpClient, config: &HermesConfig) -> anyhow::Result<Client> {
    let model: ServiceModel = serde_json::from_str(MODEL)?;
    let plan = setup::generate(model, config)?;
    Ok(setup::client_builder(plan, config)
        .http_client(http.clone())
        .build()?)
}

fn queue(name: &str) -> Value {
    Value::structure().with("Name", name)
}

#[tokio::test]
async fn test_post_carries_body_headers_and_identity() -> anyhow::Result<()> {
    let config = config()?;
    let http = ScriptedHttpClient::new().respond(
        ResponseBuilder::ok()
            .json(&json!({"Arn": "arn:queue/orders"}))
            .request_id("req-7"),
    );
    let client = client(&http, &config)?;

    let input = queue("orders").with("Token", "t-1");
    let output = client
        .invoke("CreateQueue", input, InvokeOptions::default())
        .await?;

    assert_eq!(output.value.get("Arn"), Some(&Value::from("arn:queue/orders")));
    assert_eq!(output.metadata.request_id.as_deref(), Some("req-7"));

    let request = http.request(0)?;
    assert_eq!(request.url(), "https://queues.example.com/queues");
    let body: serde_json::Value = request.json()?;
    assert_eq!(body, json!({"Name": "orders"}));
    let length = request.text()?.len().to_string();
    request
        .assert_header("x-client-token", "t-1")
        .assert_header("content-type", "application/json")
        .assert_header("content-length", &length);
    assert!(request
        .header("user-agent")
        .is_some_and(|agent| agent.starts_with("hermes/") && agent.ends_with(" integration/1")));
    assert!(request.header("x-hermes-invocation-id").is_some());
    http.assert_exhausted();
    Ok(())
}

#[tokio::test]
async fn test_error_header_from_config_classifies_errors() -> anyhow::Result<()> {
    let config = config()?;
    let http = ScriptedHttpClient::new().respond(
        ResponseBuilder::status(http::StatusCode::NOT_FOUND)
            .header("X-Error-Code", "QueueNotFound")
            .json(&json!({})),
    );
    let client = client(&http, &config)?;

    let err = client
        .invoke("GetQueue", queue("missing"), InvokeOptions::default())
        .await
        .unwrap_err();

    let api = err.api_error().expect("service error");
    assert_eq!(api.code(), "QueueNotFound");
    assert!(api.is_modeled());
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_waiter_retries_until_ready() -> anyhow::Result<()> {
    let config = config()?;
    let http = ScriptedHttpClient::new()
        .respond(ok_json(json!({"State": "CREATING"})))
        .respond(ResponseBuilder::error(
            http::StatusCode::NOT_FOUND,
            "QueueNotFound",
            "not yet visible",
        ))
        .respond(ok_json(json!({"State": "READY"})));
    let client = client(&http, &config)?;

    let started = tokio::time::Instant::now();
    let output = client
        .waiter("GetQueue", "QueueReady")?
        .wait(queue("orders"), WaiterOptions::from(&config.waiter))
        .await?;

    assert_eq!(output.get("State"), Some(&Value::from("READY")));
    assert_eq!(http.request_count(), 3);
    assert!(started.elapsed() >= Duration::from_secs(3));
    for request in http.requests() {
        assert_eq!(request.path(), "/queues/orders");
    }
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_waiter_failure_state() -> anyhow::Result<()> {
    let config = config()?;
    let http = ScriptedHttpClient::new().respond(ok_json(json!({"State": "DELETED"})));
    let client = client(&http, &config)?;

    let err = client
        .waiter("GetQueue", "QueueReady")?
        .wait(queue("orders"), WaiterOptions::from(&config.waiter))
        .await
        .unwrap_err();
    assert!(matches!(err, WaiterError::FailureState { .. }));
    Ok(())
}

#[tokio::test]
async fn test_paginator_stops_on_repeated_cursor() -> anyhow::Result<()> {
    let config = config()?;
    let http = ScriptedHttpClient::new()
        .respond(ok_json(json!({"Next": "c1", "Queues": ["a", "b"]})))
        .respond(ok_json(json!({"Next": "c1", "Queues": ["c"]})));
    let client = client(&http, &config)?;

    let mut pages = client.paginator(
        "ListQueues",
        Value::structure(),
        PaginatorOptions::from(&config.paginator),
    )?;
    let items = pages.items().await?;

    assert_eq!(items, vec![Value::from("a"), Value::from("b"), Value::from("c")]);
    let requests = http.requests();
    requests[0].assert_query("cursor", &[]);
    requests[1].assert_query("cursor", &["c1"]);
    http.assert_exhausted();
    Ok(())
}

#[tokio::test]
async fn test_transport_failure_is_reported_per_operation() -> anyhow::Result<()> {
    let config = config()?;
    let http = ScriptedHttpClient::new().fail("connection reset");
    let client = client(&http, &config)?;

    let err = client
        .invoke("GetQueue", queue("orders"), InvokeOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(err.kind, ErrorKind::Transport(_)));
    assert!(err.to_string().starts_with("operation error Queues: GetQueue"));
    Ok(())
}
