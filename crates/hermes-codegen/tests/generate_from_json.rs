//! Generation from a serialized service description.

use hermes_codegen::emit::ClientEmitter;
use hermes_codegen::{Attempt, Generator, GeneratorSettings};
use hermes_core::{AcceptorState, ServiceModel, Value};
use hermes_middleware::Stage;

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
                    {"state": "retry", "matcher": {"errorType": "QueueNotFound"}}
                ]
            }]
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

#[test]
fn test_json_model_generates_plans_and_facade() -> anyhow::Result<()> {
    let model: ServiceModel = serde_json::from_str(MODEL)?;
    let plan = Generator::new(model, GeneratorSettings::default()).generate()?;

    let get = plan.operation("GetQueue").expect("GetQueue plan");
    assert_eq!(
        get.template().ids(Stage::Deserialize),
        ["RequestIdRetriever", "OperationDeserializer"]
    );
    assert!(get.deserializer().errors().is_modeled("QueueNotFound"));

    let waiter = get.waiter("QueueReady").expect("waiter compiled");
    let ready = Value::structure().with("State", "READY");
    assert_eq!(
        waiter.evaluate(&Value::structure(), Attempt::Output(&ready))?,
        AcceptorState::Success
    );

    let list = plan.operation("ListQueues").expect("ListQueues plan");
    let paginator = list.paginator().expect("paginated");
    let page = Value::structure()
        .with("Next", "c2")
        .with("Queues", vec![Value::from("a"), Value::from("b")]);
    assert_eq!(paginator.next_token(&page), Value::from("c2"));
    assert_eq!(paginator.page_items(&page).len(), 2);

    let source = ClientEmitter::new(&plan).emit()?;
    assert!(source.contains("pub struct QueuesClient {"));
    assert!(source.contains("pub async fn wait_until_queue_ready("));
    assert!(source.contains("pub fn list_queues_paginator("));
    Ok(())
}
