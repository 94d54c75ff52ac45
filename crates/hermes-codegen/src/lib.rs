//! # Hermes Codegen
//!
//! Turns a resolved service model into immutable per-operation plans.
//!
//! Generation runs once; its output is shared by every call:
//!
//! - [`Generator`] validates the model and builds a [`ServicePlan`]
//! - each [`OperationPlan`] holds the request serializer, response
//!   deserializer, validated [`StackTemplate`](hermes_middleware::StackTemplate),
//!   compiled [`WaiterPlan`]s and optional [`PaginatorPlan`]
//! - [`GeneratorExtension`]s adjust settings and contribute middleware
//! - [`emit::ClientEmitter`] renders a typed client facade as source
//!
//! Every failure is reported before any plan is returned.

#![doc(html_root_url = "https://docs.rs/hermes-codegen/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod builtin;
pub mod emit;
mod error;
pub mod extension;
mod generator;
pub mod paginator;
pub mod path;
mod plan;
pub mod waiter;

pub use error::GenerationError;
pub use extension::{ConfigMap, GeneratorExtension, Registration};
pub use generator::{
    Generator, GeneratorSettings, ERROR_TYPE_HEADER_KEY, SERVICE_ID_KEY, SERVICE_VERSION_KEY,
};
pub use paginator::{PaginationError, PaginatorPlan};
pub use path::{PathError, PathExpr};
pub use plan::{OperationPlan, ServicePlan};
pub use waiter::{Acceptor, AcceptorMatcher, Attempt, EvaluationError, WaiterPlan};
