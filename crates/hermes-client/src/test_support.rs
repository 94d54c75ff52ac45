//! Shared fixtures for unit tests.

use crate::transport::HttpClient;
use crate::Client;
use async_trait::async_trait;
use hermes_codegen::{Generator, GeneratorSettings, ServicePlan};
use hermes_core::{
    AcceptorDefinition, AcceptorState, HttpRequest, HttpResponse, HttpTrait, Matcher, Member,
    Operation, PaginatedTrait, PathComparator, PathMatcher, ServiceModel, Shape, TransportError,
    WaiterDefinition,
};
use http::StatusCode;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Replays canned responses and records every request.
#[derive(Debug, Default)]
pub(crate) struct Replay {
    responses: Mutex<VecDeque<HttpResponse>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl Replay {
    pub(crate) fn new(responses: Vec<HttpResponse>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::default(),
        })
    }

    pub(crate) fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpClient for Replay {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self.requests.lock().unwrap().push(request);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| TransportError::new("no response scripted"))
    }
}

pub(crate) fn json(body: &'static str) -> HttpResponse {
    HttpResponse::new(StatusCode::OK, body).with_header("content-type", "application/json")
}

pub(crate) fn not_found() -> HttpResponse {
    HttpResponse::new(StatusCode::NOT_FOUND, r#"{"code":"JobNotFound","message":"no job"}"#)
}

fn state_is(state: AcceptorState, expected: &str) -> AcceptorDefinition {
    AcceptorDefinition::new(
        state,
        Matcher::Output(PathMatcher::new(
            "State",
            expected,
            PathComparator::StringEquals,
        )),
    )
}

/// A two-operation job service: `GetJob` with the `JobDone` waiter and a
/// paginated `ListJobs`.
pub(crate) fn jobs_plan() -> ServicePlan {
    let model = ServiceModel::new("Jobs", "2024-01-01")
        .operation(
            Operation::new(
                "GetJob",
                Shape::structure(
                    "GetJobInput",
                    vec![Member::new("Id", Shape::string("Id")).required().label()],
                ),
                Shape::structure(
                    "GetJobOutput",
                    vec![Member::new("State", Shape::string("State"))],
                ),
            )
            .http(HttpTrait::new("GET", "/jobs/{Id}"))
            .error(Shape::structure("jobs#JobNotFound", vec![]))
            .waiter(
                WaiterDefinition::new(
                    "JobDone",
                    vec![
                        state_is(AcceptorState::Success, "DONE"),
                        state_is(AcceptorState::Failure, "FAILED"),
                    ],
                )
                .delays(2, 8),
            ),
        )
        .operation(
            Operation::new(
                "ListJobs",
                Shape::structure(
                    "ListJobsInput",
                    vec![
                        Member::new("Token", Shape::string("Token")).query("token"),
                        Member::new("Limit", Shape::integer("Limit")).query("limit"),
                    ],
                ),
                Shape::structure(
                    "ListJobsOutput",
                    vec![
                        Member::new("Next", Shape::string("Token")),
                        Member::new("Jobs", Shape::list("JobIds", Shape::string("Id"))),
                    ],
                ),
            )
            .http(HttpTrait::new("GET", "/jobs"))
            .paginated(PaginatedTrait {
                input_token: Some("Token".into()),
                output_token: Some("Next".into()),
                page_size: Some("Limit".into()),
                items: Some("Jobs".into()),
                more_results: None,
            }),
        );
    Generator::new(model, GeneratorSettings::default())
        .generate()
        .unwrap()
}

pub(crate) fn client(http: &Arc<Replay>) -> Client {
    Client::builder(jobs_plan())
        .shared_http_client(http.clone())
        .endpoint("https://jobs.example.com")
        .build()
        .unwrap()
}
