//! Paginator plans: where the continuation token lives on each side.

use crate::path::{PathError, PathExpr};
use hermes_core::{Operation, PaginatedTrait, Shape, ShapeKind, Value};
use thiserror::Error;

/// Failure compiling a pagination definition.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PaginationError {
    /// A required part of the definition is missing.
    #[error("pagination of `{operation}` lacks {what}")]
    Incomplete {
        /// Operation name.
        operation: String,
        /// The missing part.
        what: &'static str,
    },

    /// A top-level input member does not exist.
    #[error("pagination of `{operation}` names unknown input member `{member}`")]
    UnknownInputMember {
        /// Operation name.
        operation: String,
        /// Member name.
        member: String,
    },

    /// An output path does not resolve.
    #[error("pagination of `{operation}` has an invalid output path")]
    OutputPath {
        /// Operation name.
        operation: String,
        /// The path error.
        #[source]
        source: PathError,
    },
}

/// A pagination definition compiled for one operation.
///
/// ```
/// use hermes_codegen::paginator::PaginatorPlan;
/// use hermes_core::{Member, Operation, PaginatedTrait, Shape, Value};
///
/// let operation = Operation::new(
///     "ListJobs",
///     Shape::structure("ListJobsInput", vec![Member::new("Token", Shape::string("T"))]),
///     Shape::structure("ListJobsOutput", vec![Member::new("Next", Shape::string("T"))]),
/// );
/// let plan = PaginatorPlan::compile(
///     &operation,
///     &PaginatedTrait {
///         input_token: Some("Token".into()),
///         output_token: Some("Next".into()),
///         ..PaginatedTrait::default()
///     },
/// )
/// .unwrap();
///
/// let output = Value::structure().with("Next", "page-2");
/// assert_eq!(plan.next_token(&output), Value::from("page-2"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginatorPlan {
    /// Input member receiving the token.
    pub input_token: String,
    /// Output path carrying the next token.
    pub output_token: PathExpr,
    /// Input member receiving the page size.
    pub page_size: Option<String>,
    /// Output path of the boolean "more results" flag.
    pub more_results: Option<PathExpr>,
    /// Output path of the page items.
    pub items: Option<PathExpr>,
}

impl PaginatorPlan {
    /// Compiles a pagination trait against the operation's shapes.
    pub fn compile(operation: &Operation, paginated: &PaginatedTrait) -> Result<Self, PaginationError> {
        let incomplete = |what| PaginationError::Incomplete {
            operation: operation.name.clone(),
            what,
        };
        let input_token = paginated
            .input_token
            .clone()
            .ok_or_else(|| incomplete("an input token"))?;
        let output_token = paginated
            .output_token
            .as_deref()
            .ok_or_else(|| incomplete("an output token"))?;

        for member in std::iter::once(&input_token).chain(paginated.page_size.as_ref()) {
            if !has_member(&operation.input, member) {
                return Err(PaginationError::UnknownInputMember {
                    operation: operation.name.clone(),
                    member: member.clone(),
                });
            }
        }

        let output_path = |text: &str| {
            let path = PathExpr::parse(text).and_then(|path| {
                path.check(&operation.output)?;
                Ok(path)
            });
            path.map_err(|source| PaginationError::OutputPath {
                operation: operation.name.clone(),
                source,
            })
        };

        Ok(Self {
            input_token,
            output_token: output_path(output_token)?,
            page_size: paginated.page_size.clone(),
            more_results: paginated.more_results.as_deref().map(output_path).transpose()?,
            items: paginated.items.as_deref().map(output_path).transpose()?,
        })
    }

    /// Extracts the next token from an output.
    ///
    /// An absent token is null even if the "more results" flag is set; a
    /// present token is discarded unless the flag, when modeled, is `true`.
    #[must_use]
    pub fn next_token(&self, output: &Value) -> Value {
        let token = self.output_token.evaluate(output);
        if token.is_null() {
            return Value::Null;
        }
        if let Some(flag) = &self.more_results {
            if flag.evaluate(output).as_bool() != Some(true) {
                return Value::Null;
            }
        }
        token
    }

    /// Builds the input of the next page request.
    #[must_use]
    pub fn page_input(&self, input: &Value, token: &Value, limit: Option<i64>) -> Value {
        let mut next = input.clone();
        if token.is_null() {
            next.remove(&self.input_token);
        } else {
            next.set(self.input_token.clone(), token.clone());
        }
        if let (Some(member), Some(limit)) = (&self.page_size, limit) {
            next.set(member.clone(), limit);
        }
        next
    }

    /// Returns the items of one page; empty when no items path is modeled.
    #[must_use]
    pub fn page_items(&self, output: &Value) -> Vec<Value> {
        match self.items.as_ref().map(|path| path.evaluate(output)) {
            Some(Value::List(items)) => items,
            Some(Value::Null) | None => Vec::new(),
            Some(other) => vec![other],
        }
    }
}

fn has_member(shape: &Shape, name: &str) -> bool {
    matches!(&shape.kind, ShapeKind::Structure { .. }) && shape.member(name).is_some()
}

/// Returns `true` if a token means another page exists.
///
/// Null never continues and string tokens must be non-empty.
#[must_use]
pub fn token_continues(token: &Value) -> bool {
    match token {
        Value::Null => false,
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}
