//! The resolved service description.
//!
//! These types are the read-only view of a service that the generator
//! consumes. They are produced by an external model resolver (or loaded with
//! serde from its JSON output) and never mutated afterwards.
//!
//! # Example
//!
//! ```
//! use hermes_core::{HttpTrait, Operation, ServiceModel, Shape};
//!
//! let model = ServiceModel::new("Storage", "2024-01-01").operation(
//!     Operation::new(
//!         "ListBuckets",
//!         Shape::structure("ListBucketsInput", vec![]),
//!         Shape::structure("ListBucketsOutput", vec![]),
//!     )
//!     .http(HttpTrait::new("GET", "/buckets")),
//! );
//!
//! assert!(model.get_operation("ListBuckets").is_some());
//! ```

use crate::shape::Shape;
use serde::{Deserialize, Serialize};

/// The whole service: identity plus operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceModel {
    /// Service identifier used in error messages and metrics.
    pub id: String,
    /// API version string.
    pub version: String,
    /// Operations in declaration order.
    #[serde(default)]
    pub operations: Vec<Operation>,
}

impl ServiceModel {
    /// Creates an empty service model.
    #[must_use]
    pub fn new(id: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            version: version.into(),
            operations: Vec::new(),
        }
    }

    /// Adds an operation.
    #[must_use]
    pub fn operation(mut self, operation: Operation) -> Self {
        self.operations.push(operation);
        self
    }

    /// Looks up an operation by name.
    #[must_use]
    pub fn get_operation(&self, name: &str) -> Option<&Operation> {
        self.operations.iter().find(|op| op.name == name)
    }
}

/// HTTP binding of an operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpTrait {
    /// HTTP method, e.g. `GET`.
    pub method: String,
    /// Path template with optional literal query, e.g. `/b/{Bucket}?list-type=2`.
    pub uri: String,
    /// Status code of a successful response.
    #[serde(default = "default_success_code")]
    pub code: u16,
}

fn default_success_code() -> u16 {
    200
}

impl HttpTrait {
    /// Creates an HTTP binding with the default success code.
    #[must_use]
    pub fn new(method: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            uri: uri.into(),
            code: default_success_code(),
        }
    }
}

/// Pagination members of an operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PaginatedTrait {
    /// Input member receiving the continuation token.
    pub input_token: Option<String>,
    /// Dotted output path producing the next token.
    pub output_token: Option<String>,
    /// Input member receiving the page size.
    pub page_size: Option<String>,
    /// Dotted output path of the paginated items.
    pub items: Option<String>,
    /// Output boolean member that must be `true` for the token to count.
    pub more_results: Option<String>,
}

/// A single operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Operation {
    /// Operation name.
    pub name: String,
    /// Input structure.
    pub input: Shape,
    /// Output structure.
    pub output: Shape,
    /// Declared error structures.
    #[serde(default)]
    pub errors: Vec<Shape>,
    /// HTTP binding, when the protocol is HTTP-bound.
    #[serde(default)]
    pub http: Option<HttpTrait>,
    /// Waiters polling this operation.
    #[serde(default)]
    pub waiters: Vec<WaiterDefinition>,
    /// Pagination definition.
    #[serde(default)]
    pub paginated: Option<PaginatedTrait>,
    /// Operation documentation.
    #[serde(default)]
    pub documentation: Option<String>,
}

impl Operation {
    /// Creates an operation with no errors, waiters or pagination.
    #[must_use]
    pub fn new(name: impl Into<String>, input: Shape, output: Shape) -> Self {
        Self {
            name: name.into(),
            input,
            output,
            errors: Vec::new(),
            http: None,
            waiters: Vec::new(),
            paginated: None,
            documentation: None,
        }
    }

    /// Sets the HTTP binding.
    #[must_use]
    pub fn http(mut self, http: HttpTrait) -> Self {
        self.http = Some(http);
        self
    }

    /// Declares an error shape.
    #[must_use]
    pub fn error(mut self, error: Shape) -> Self {
        self.errors.push(error);
        self
    }

    /// Adds a waiter definition.
    #[must_use]
    pub fn waiter(mut self, waiter: WaiterDefinition) -> Self {
        self.waiters.push(waiter);
        self
    }

    /// Sets the pagination definition.
    #[must_use]
    pub fn paginated(mut self, paginated: PaginatedTrait) -> Self {
        self.paginated = Some(paginated);
        self
    }

    /// Sets the documentation.
    #[must_use]
    pub fn documentation(mut self, docs: impl Into<String>) -> Self {
        self.documentation = Some(docs.into());
        self
    }
}

/// A waiter declared on an operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaiterDefinition {
    /// Waiter name, e.g. `BucketExists`.
    pub name: String,
    /// Documentation.
    #[serde(default)]
    pub documentation: Option<String>,
    /// Minimum delay between attempts, in seconds.
    #[serde(default = "default_min_delay")]
    pub min_delay: u64,
    /// Maximum delay between attempts, in seconds.
    #[serde(default = "default_max_delay")]
    pub max_delay: u64,
    /// Acceptors in declaration order.
    pub acceptors: Vec<AcceptorDefinition>,
}

fn default_min_delay() -> u64 {
    2
}

fn default_max_delay() -> u64 {
    120
}

impl WaiterDefinition {
    /// Creates a waiter with default delays.
    #[must_use]
    pub fn new(name: impl Into<String>, acceptors: Vec<AcceptorDefinition>) -> Self {
        Self {
            name: name.into(),
            documentation: None,
            min_delay: default_min_delay(),
            max_delay: default_max_delay(),
            acceptors,
        }
    }

    /// Overrides the delay bounds.
    #[must_use]
    pub fn delays(mut self, min_delay: u64, max_delay: u64) -> Self {
        self.min_delay = min_delay;
        self.max_delay = max_delay;
        self
    }
}

/// The state an acceptor transitions the waiter into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AcceptorState {
    /// Stop waiting, the resource reached the desired state.
    Success,
    /// Stop waiting, the resource can never reach the desired state.
    Failure,
    /// Keep polling.
    Retry,
}

/// One acceptor: a matcher plus the resulting state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcceptorDefinition {
    /// State entered when the matcher matches.
    pub state: AcceptorState,
    /// The predicate.
    pub matcher: Matcher,
}

impl AcceptorDefinition {
    /// Creates an acceptor.
    #[must_use]
    pub const fn new(state: AcceptorState, matcher: Matcher) -> Self {
        Self { state, matcher }
    }
}

/// Acceptor predicates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Matcher {
    /// Path evaluated against the output.
    Output(PathMatcher),
    /// Path evaluated against `{"input": .., "output": ..}`.
    InputOutput(PathMatcher),
    /// `true` matches a successful call, `false` matches any failure.
    Success(bool),
    /// Matches an error by its modeled name or generic code.
    ErrorType(String),
}

/// Path-based predicate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathMatcher {
    /// Path expression.
    pub path: String,
    /// Expected value, as text.
    pub expected: String,
    /// How the path result is compared with `expected`.
    pub comparator: PathComparator,
}

impl PathMatcher {
    /// Creates a path matcher.
    #[must_use]
    pub fn new(
        path: impl Into<String>,
        expected: impl Into<String>,
        comparator: PathComparator,
    ) -> Self {
        Self {
            path: path.into(),
            expected: expected.into(),
            comparator,
        }
    }
}

/// Comparators for path matchers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PathComparator {
    /// Exact string match.
    StringEquals,
    /// Boolean match, `expected` parsed as a boolean.
    BooleanEquals,
    /// Every element of a non-empty list equals `expected`.
    AllStringEquals,
    /// At least one element of a list equals `expected`.
    AnyStringEquals,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_waiter_defaults() {
        let waiter = WaiterDefinition::new(
            "BucketExists",
            vec![AcceptorDefinition::new(
                AcceptorState::Success,
                Matcher::Success(true),
            )],
        );
        assert_eq!(waiter.min_delay, 2);
        assert_eq!(waiter.max_delay, 120);
    }

    #[test]
    fn test_operation_deserializes_with_defaults() {
        let json = r#"{
            "name": "DescribeTable",
            "input": {"id": "In", "type": "structure", "members": []},
            "output": {"id": "Out", "type": "structure", "members": []},
            "http": {"method": "POST", "uri": "/tables"},
            "waiters": [{
                "name": "TableExists",
                "acceptors": [
                    {"state": "success", "matcher": {"output": {
                        "path": "Table.Status", "expected": "ACTIVE",
                        "comparator": "stringEquals"}}},
                    {"state": "retry", "matcher": {"errorType": "ResourceNotFound"}}
                ]
            }]
        }"#;
        let op: Operation = serde_json::from_str(json).expect("valid operation");
        assert_eq!(op.http.as_ref().unwrap().code, 200);
        assert_eq!(op.waiters[0].acceptors.len(), 2);
        assert!(matches!(
            op.waiters[0].acceptors[1].matcher,
            Matcher::ErrorType(ref name) if name == "ResourceNotFound"
        ));
    }
}
