//! Generated plans.
//!
//! A [`ServicePlan`] is the output of generation: one immutable
//! [`OperationPlan`] per operation, shared by every call through an `Arc`.

use crate::extension::ConfigMap;
use crate::paginator::PaginatorPlan;
use crate::waiter::WaiterPlan;
use hermes_core::Operation;
use hermes_middleware::{StackTemplate, UnitRegistry};
use hermes_protocol::{RequestSerializer, ResponseDeserializer};
use indexmap::IndexMap;
use std::sync::Arc;

/// Everything needed to invoke one operation.
#[derive(Debug, Clone)]
pub struct OperationPlan {
    pub(crate) operation: Arc<Operation>,
    pub(crate) serializer: Arc<RequestSerializer>,
    pub(crate) deserializer: Arc<ResponseDeserializer>,
    pub(crate) template: StackTemplate,
    pub(crate) units: UnitRegistry,
    pub(crate) waiters: Vec<WaiterPlan>,
    pub(crate) paginator: Option<PaginatorPlan>,
}

impl OperationPlan {
    /// Returns the operation name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.operation.name
    }

    /// Returns the resolved operation.
    #[must_use]
    pub fn operation(&self) -> &Arc<Operation> {
        &self.operation
    }

    /// Returns the request serializer.
    #[must_use]
    pub fn serializer(&self) -> &Arc<RequestSerializer> {
        &self.serializer
    }

    /// Returns the response deserializer.
    #[must_use]
    pub fn deserializer(&self) -> &Arc<ResponseDeserializer> {
        &self.deserializer
    }

    /// Returns the validated unit order.
    #[must_use]
    pub const fn template(&self) -> &StackTemplate {
        &self.template
    }

    /// Returns the units contributed by extensions.
    #[must_use]
    pub const fn extension_units(&self) -> &UnitRegistry {
        &self.units
    }

    /// Returns the compiled waiters.
    #[must_use]
    pub fn waiters(&self) -> &[WaiterPlan] {
        &self.waiters
    }

    /// Looks up a waiter by name.
    #[must_use]
    pub fn waiter(&self, name: &str) -> Option<&WaiterPlan> {
        self.waiters.iter().find(|w| w.name == name)
    }

    /// Returns the paginator, if the operation is paginated.
    #[must_use]
    pub const fn paginator(&self) -> Option<&PaginatorPlan> {
        self.paginator.as_ref()
    }
}

/// The generated plan of a whole service.
#[derive(Debug, Clone)]
pub struct ServicePlan {
    pub(crate) service_id: String,
    pub(crate) version: String,
    pub(crate) config: ConfigMap,
    pub(crate) operations: IndexMap<String, OperationPlan>,
}

impl ServicePlan {
    /// Returns the service id.
    #[must_use]
    pub fn service_id(&self) -> &str {
        &self.service_id
    }

    /// Returns the service version.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Returns the merged generation settings.
    #[must_use]
    pub const fn config(&self) -> &ConfigMap {
        &self.config
    }

    /// Looks up an operation plan.
    #[must_use]
    pub fn operation(&self, name: &str) -> Option<&OperationPlan> {
        self.operations.get(name)
    }

    /// Iterates operation plans in model order.
    pub fn operations(&self) -> impl Iterator<Item = &OperationPlan> {
        self.operations.values()
    }

    /// Returns the number of operations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    /// Returns `true` if the service has no operations.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}
