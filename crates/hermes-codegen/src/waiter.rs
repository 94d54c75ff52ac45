//! Waiter plans: compiled acceptors and their evaluation.
//!
//! Acceptors are evaluated in declaration order against the outcome of one
//! attempt; the first match decides the next state. When nothing matches the
//! waiter keeps polling.

use crate::path::{PathError, PathExpr};
use hermes_core::{
    AcceptorState, ApiError, ErrorKind, Matcher, Member, Operation, OperationError, PathComparator,
    PathMatcher, Shape, Value, WaiterDefinition,
};
use std::time::Duration;
use thiserror::Error;

/// Failure evaluating an acceptor.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EvaluationError {
    /// The path result has the wrong type for the comparator.
    #[error("path `{path}` produced {found}, which {comparator:?} cannot compare")]
    TypeMismatch {
        /// Path text.
        path: String,
        /// Comparator.
        comparator: PathComparator,
        /// Kind of the value produced.
        found: &'static str,
    },

    /// A boolean comparator's expected value is not a boolean.
    #[error("expected value `{expected}` of path `{path}` is not a boolean")]
    InvalidExpected {
        /// Path text.
        path: String,
        /// The expected text.
        expected: String,
    },
}

/// The outcome of one waiter attempt.
#[derive(Debug, Clone, Copy)]
pub enum Attempt<'a> {
    /// The call returned an output.
    Output(&'a Value),
    /// The call failed.
    Failed(&'a OperationError),
}

/// A compiled acceptor matcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcceptorMatcher {
    /// Path over the output.
    Output(PathAcceptor),
    /// Path over `{"input": .., "output": ..}`.
    InputOutput(PathAcceptor),
    /// Success or failure of the call.
    Success(bool),
    /// Error name or code.
    ErrorType(String),
}

/// A path, expected value and comparator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathAcceptor {
    /// The parsed path.
    pub path: PathExpr,
    /// Expected value as text.
    pub expected: String,
    /// Comparator.
    pub comparator: PathComparator,
}

impl PathAcceptor {
    fn compile(matcher: &PathMatcher, root: &Shape) -> Result<Self, PathError> {
        let path = PathExpr::parse(&matcher.path)?;
        path.check(root)?;
        Ok(Self {
            path,
            expected: matcher.expected.clone(),
            comparator: matcher.comparator,
        })
    }

    fn matches(&self, root: &Value) -> Result<bool, EvaluationError> {
        let result = self.path.evaluate(root);
        if result.is_null() {
            return Ok(false);
        }
        let mismatch = |found: &Value| EvaluationError::TypeMismatch {
            path: self.path.to_string(),
            comparator: self.comparator,
            found: found.kind_name(),
        };

        match self.comparator {
            PathComparator::StringEquals => {
                let text = comparable_text(&result).ok_or_else(|| mismatch(&result))?;
                Ok(text == self.expected)
            }
            PathComparator::BooleanEquals => {
                let expected: bool =
                    self.expected
                        .parse()
                        .map_err(|_| EvaluationError::InvalidExpected {
                            path: self.path.to_string(),
                            expected: self.expected.clone(),
                        })?;
                let actual = result.as_bool().ok_or_else(|| mismatch(&result))?;
                Ok(actual == expected)
            }
            PathComparator::AllStringEquals | PathComparator::AnyStringEquals => {
                let items = result.as_list().ok_or_else(|| mismatch(&result))?;
                let mut equal = Vec::with_capacity(items.len());
                for item in items {
                    let text = comparable_text(item).ok_or_else(|| mismatch(item))?;
                    equal.push(text == self.expected);
                }
                Ok(if self.comparator == PathComparator::AllStringEquals {
                    !equal.is_empty() && equal.iter().all(|e| *e)
                } else {
                    equal.iter().any(|e| *e)
                })
            }
        }
    }
}

fn comparable_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Integer(i) => Some(i.to_string()),
        _ => None,
    }
}

/// One compiled acceptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Acceptor {
    /// State entered on match.
    pub state: AcceptorState,
    /// The predicate.
    pub matcher: AcceptorMatcher,
}

impl Acceptor {
    /// Evaluates the acceptor against one attempt.
    pub fn matches(&self, input: &Value, attempt: Attempt<'_>) -> Result<bool, EvaluationError> {
        match (&self.matcher, attempt) {
            (AcceptorMatcher::Success(expected), Attempt::Output(_)) => Ok(*expected),
            (AcceptorMatcher::Success(expected), Attempt::Failed(_)) => Ok(!*expected),
            (AcceptorMatcher::Output(path), Attempt::Output(output)) => path.matches(output),
            (AcceptorMatcher::InputOutput(path), Attempt::Output(output)) => {
                let root = Value::structure()
                    .with("input", input.clone())
                    .with("output", output.clone());
                path.matches(&root)
            }
            (AcceptorMatcher::ErrorType(name), Attempt::Failed(err)) => {
                Ok(match &err.kind {
                    ErrorKind::Api(ApiError::Modeled { name: modeled, .. }) => modeled == name,
                    ErrorKind::Api(ApiError::Generic { code, message, .. }) => {
                        code == name || message.contains(name.as_str())
                    }
                    _ => false,
                })
            }
            (AcceptorMatcher::Output(_) | AcceptorMatcher::InputOutput(_), Attempt::Failed(_))
            | (AcceptorMatcher::ErrorType(_), Attempt::Output(_)) => Ok(false),
        }
    }
}

/// A waiter compiled for one operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaiterPlan {
    /// Waiter name.
    pub name: String,
    /// Documentation.
    pub documentation: Option<String>,
    /// Lower bound between attempts.
    pub min_delay: Duration,
    /// Upper bound between attempts.
    pub max_delay: Duration,
    /// Acceptors in declaration order.
    pub acceptors: Vec<Acceptor>,
}

impl WaiterPlan {
    /// Compiles a waiter definition against its operation's shapes.
    pub fn compile(operation: &Operation, definition: &WaiterDefinition) -> Result<Self, PathError> {
        let input_output = Shape::structure(
            format!("{}InputOutput", operation.name),
            vec![
                Member::new("input", operation.input.clone()),
                Member::new("output", operation.output.clone()),
            ],
        );

        let acceptors = definition
            .acceptors
            .iter()
            .map(|acceptor| {
                let matcher = match &acceptor.matcher {
                    Matcher::Output(path) => {
                        AcceptorMatcher::Output(PathAcceptor::compile(path, &operation.output)?)
                    }
                    Matcher::InputOutput(path) => {
                        AcceptorMatcher::InputOutput(PathAcceptor::compile(path, &input_output)?)
                    }
                    Matcher::Success(success) => AcceptorMatcher::Success(*success),
                    Matcher::ErrorType(name) => AcceptorMatcher::ErrorType(name.clone()),
                };
                Ok(Acceptor {
                    state: acceptor.state,
                    matcher,
                })
            })
            .collect::<Result<Vec<_>, PathError>>()?;

        Ok(Self {
            name: definition.name.clone(),
            documentation: definition.documentation.clone(),
            min_delay: Duration::from_secs(definition.min_delay),
            max_delay: Duration::from_secs(definition.max_delay),
            acceptors,
        })
    }

    /// Decides the state after one attempt; `Retry` when nothing matches.
    pub fn evaluate(
        &self,
        input: &Value,
        attempt: Attempt<'_>,
    ) -> Result<AcceptorState, EvaluationError> {
        for acceptor in &self.acceptors {
            if acceptor.matches(input, attempt)? {
                return Ok(acceptor.state);
            }
        }
        Ok(AcceptorState::Retry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hermes_core::AcceptorDefinition;

    fn describe_table() -> Operation {
        Operation::new(
            "DescribeTable",
            Shape::structure(
                "DescribeTableInput",
                vec![Member::new("Name", Shape::string("Name"))],
            ),
            Shape::structure(
                "DescribeTableOutput",
                vec![
                    Member::new("Status", Shape::string("Status")),
                    Member::new("Ready", Shape::boolean("Ready")),
                    Member::new("Name", Shape::string("Name")),
                    Member::new(
                        "Replicas",
                        Shape::list(
                            "Replicas",
                            Shape::structure(
                                "Replica",
                                vec![Member::new("Status", Shape::string("Status"))],
                            ),
                        ),
                    ),
                ],
            ),
        )
    }

    fn plan(acceptors: Vec<AcceptorDefinition>) -> WaiterPlan {
        WaiterPlan::compile(
            &describe_table(),
            &WaiterDefinition::new("TableReady", acceptors),
        )
        .unwrap()
    }

    fn output(status: &str) -> Value {
        Value::structure().with("Status", status)
    }

    fn api_error(err: ApiError) -> OperationError {
        OperationError::new("Db", "DescribeTable", ErrorKind::Api(err))
    }

    #[test]
    fn test_first_match_wins() {
        let plan = plan(vec![
            AcceptorDefinition::new(
                AcceptorState::Failure,
                Matcher::Output(PathMatcher::new("Status", "FAILED", PathComparator::StringEquals)),
            ),
            AcceptorDefinition::new(AcceptorState::Success, Matcher::Success(true)),
        ]);
        let input = Value::structure();
        assert_eq!(
            plan.evaluate(&input, Attempt::Output(&output("FAILED"))),
            Ok(AcceptorState::Failure)
        );
        assert_eq!(
            plan.evaluate(&input, Attempt::Output(&output("ACTIVE"))),
            Ok(AcceptorState::Success)
        );
    }

    #[test]
    fn test_unmatched_failure_retries() {
        let plan = plan(vec![AcceptorDefinition::new(
            AcceptorState::Success,
            Matcher::Output(PathMatcher::new("Status", "ACTIVE", PathComparator::StringEquals)),
        )]);
        let err = api_error(ApiError::Generic {
            code: "Throttled".into(),
            message: "slow down".into(),
            status: 429,
        });
        assert_eq!(
            plan.evaluate(&Value::structure(), Attempt::Failed(&err)),
            Ok(AcceptorState::Retry)
        );
    }

    #[test]
    fn test_error_type_matches_name_code_or_message() {
        let plan = plan(vec![AcceptorDefinition::new(
            AcceptorState::Retry,
            Matcher::ErrorType("ResourceNotFound".into()),
        )]);
        let input = Value::structure();
        let modeled = api_error(ApiError::Modeled {
            name: "ResourceNotFound".into(),
            message: String::new(),
            fields: Value::structure(),
            status: 404,
        });
        let by_message = api_error(ApiError::Generic {
            code: "Unknown".into(),
            message: "ResourceNotFound: table gone".into(),
            status: 400,
        });
        let other = api_error(ApiError::Generic {
            code: "Throttled".into(),
            message: String::new(),
            status: 429,
        });
        assert!(plan.acceptors[0].matches(&input, Attempt::Failed(&modeled)).unwrap());
        assert!(plan.acceptors[0].matches(&input, Attempt::Failed(&by_message)).unwrap());
        assert!(!plan.acceptors[0].matches(&input, Attempt::Failed(&other)).unwrap());
    }

    #[test]
    fn test_list_comparators() {
        let all = plan(vec![AcceptorDefinition::new(
            AcceptorState::Success,
            Matcher::Output(PathMatcher::new(
                "Replicas[].Status",
                "ACTIVE",
                PathComparator::AllStringEquals,
            )),
        )]);
        let any = plan(vec![AcceptorDefinition::new(
            AcceptorState::Failure,
            Matcher::Output(PathMatcher::new(
                "Replicas[].Status",
                "FAILED",
                PathComparator::AnyStringEquals,
            )),
        )]);
        let replicas = |statuses: &[&str]| {
            Value::structure().with(
                "Replicas",
                statuses
                    .iter()
                    .map(|s| Value::structure().with("Status", *s))
                    .collect::<Vec<_>>(),
            )
        };
        let input = Value::structure();

        let mixed = replicas(&["ACTIVE", "FAILED"]);
        assert_eq!(all.evaluate(&input, Attempt::Output(&mixed)), Ok(AcceptorState::Retry));
        assert_eq!(any.evaluate(&input, Attempt::Output(&mixed)), Ok(AcceptorState::Failure));

        let empty = replicas(&[]);
        assert_eq!(all.evaluate(&input, Attempt::Output(&empty)), Ok(AcceptorState::Retry));

        let ready = replicas(&["ACTIVE", "ACTIVE"]);
        assert_eq!(all.evaluate(&input, Attempt::Output(&ready)), Ok(AcceptorState::Success));
    }

    #[test]
    fn test_input_output_path() {
        let plan = plan(vec![AcceptorDefinition::new(
            AcceptorState::Success,
            Matcher::InputOutput(PathMatcher::new(
                "output.Name",
                "orders",
                PathComparator::StringEquals,
            )),
        )]);
        let input = Value::structure().with("Name", "orders");
        let out = Value::structure().with("Name", "orders");
        assert_eq!(plan.evaluate(&input, Attempt::Output(&out)), Ok(AcceptorState::Success));
    }

    #[test]
    fn test_evaluation_errors() {
        let bad_bool = plan(vec![AcceptorDefinition::new(
            AcceptorState::Success,
            Matcher::Output(PathMatcher::new("Ready", "yes", PathComparator::BooleanEquals)),
        )]);
        let out = Value::structure().with("Ready", true);
        assert!(matches!(
            bad_bool.evaluate(&Value::structure(), Attempt::Output(&out)),
            Err(EvaluationError::InvalidExpected { .. })
        ));

        let wrong_type = plan(vec![AcceptorDefinition::new(
            AcceptorState::Success,
            Matcher::Output(PathMatcher::new("Ready", "true", PathComparator::StringEquals)),
        )]);
        assert!(matches!(
            wrong_type.evaluate(&Value::structure(), Attempt::Output(&out)),
            Err(EvaluationError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_unknown_member_fails_compilation() {
        let result = WaiterPlan::compile(
            &describe_table(),
            &WaiterDefinition::new(
                "Broken",
                vec![AcceptorDefinition::new(
                    AcceptorState::Success,
                    Matcher::Output(PathMatcher::new("State", "x", PathComparator::StringEquals)),
                )],
            ),
        );
        assert!(matches!(result, Err(PathError::UnknownMember { .. })));
    }
}
