//! # Hermes Core
//!
//! Core types shared by every Hermes crate.
//!
//! This crate provides the foundational types used throughout Hermes:
//!
//! - [`ServiceModel`] / [`Operation`] - the resolved, read-only service description
//! - [`Shape`] / [`ShapeKind`] / [`Member`] - the type graph with member traits
//! - [`Value`] - structured values carried through the pipeline
//! - [`OperationBindings`] - where each member travels on the wire
//! - [`HttpRequest`] / [`HttpResponse`] / [`Headers`] - wire messages
//! - [`OperationError`] - the error every invocation surfaces

#![doc(html_root_url = "https://docs.rs/hermes-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod binding;
pub mod error;
pub mod message;
pub mod model;
pub mod shape;
pub mod uri;
mod value;

pub use binding::{BindingError, BindingLocation, MemberBinding, OperationBindings};
pub use error::{
    ApiError, DeserializationError, ErrorKind, OperationError, SerializationError, TransportError,
};
pub use message::{canonical_header_name, Headers, HttpRequest, HttpResponse};
pub use model::{
    AcceptorDefinition, AcceptorState, HttpTrait, Matcher, Operation, PaginatedTrait,
    PathComparator, PathMatcher, ServiceModel, WaiterDefinition,
};
pub use shape::{Member, MemberTraits, Shape, ShapeKind, TimestampFormat};
pub use uri::{LabelSegment, PathTemplate, Segment};
pub use value::Value;
