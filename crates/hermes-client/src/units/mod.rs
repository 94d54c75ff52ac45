//! Built-in middleware units.
//!
//! Every generated operation registers these ids (see
//! [`hermes_codegen::builtin`]); the client supplies their implementations
//! when it is built.
//!
//! | Stage | Unit |
//! |-------|------|
//! | Initialize | [`OperationLogging`], [`ValidateRequired`] |
//! | Serialize | [`OperationSerializer`] |
//! | Build | [`ComputeContentLength`], [`UserAgent`] |
//! | Finalize | [`ResolveEndpoint`], [`Signing`] |
//! | Deserialize | [`RequestIdRetriever`], [`OperationDeserializer`] |

mod build;
mod deserialize;
mod finalize;
mod initialize;
mod serialize;

pub use build::{ComputeContentLength, UserAgent};
pub use deserialize::{OperationDeserializer, RequestIdRetriever};
pub use finalize::{ResolveEndpoint, Signing};
pub use initialize::{OperationLogging, ValidateRequired};
pub use serialize::{OperationSerializer, INVOCATION_ID_HEADER};

use crate::auth::Signer;
use crate::transport::EndpointResolver;
use hermes_codegen::OperationPlan;
use hermes_middleware::stack::SharedUnit;
use hermes_middleware::{Middleware, UnitRegistry};
use std::sync::Arc;

/// Client-wide collaborators shared by the built-in units.
#[derive(Debug, Clone)]
pub(crate) struct Runtime {
    pub(crate) resolver: Arc<dyn EndpointResolver>,
    pub(crate) signer: Arc<dyn Signer>,
    pub(crate) user_agent: String,
}

/// Adds the built-in units of one operation to `registry`.
///
/// A unit an extension already registered under a built-in id is kept.
pub(crate) fn register_builtins(registry: &mut UnitRegistry, plan: &OperationPlan, runtime: &Runtime) {
    let builtins: [SharedUnit; 9] = [
        Arc::new(OperationLogging),
        Arc::new(ValidateRequired::new(plan.serializer().bindings())),
        Arc::new(OperationSerializer::new(Arc::clone(plan.serializer()))),
        Arc::new(ComputeContentLength),
        Arc::new(UserAgent::new(runtime.user_agent.clone())),
        Arc::new(ResolveEndpoint::new(Arc::clone(&runtime.resolver))),
        Arc::new(Signing::new(Arc::clone(&runtime.signer))),
        Arc::new(RequestIdRetriever),
        Arc::new(OperationDeserializer::new(Arc::clone(plan.deserializer()))),
    ];
    for unit in builtins {
        if !registry.contains(unit.id()) {
            registry.register_shared(unit);
        }
    }
}
