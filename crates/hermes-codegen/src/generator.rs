//! The generator entry point.

use crate::builtin;
use crate::error::GenerationError;
use crate::extension::{self, ConfigMap, GeneratorExtension};
use crate::paginator::PaginatorPlan;
use crate::plan::{OperationPlan, ServicePlan};
use crate::waiter::WaiterPlan;
use hermes_core::{Operation, ServiceModel};
use hermes_middleware::{SlotRegistrar, UnitRegistry};
use hermes_protocol::{DocumentCodec, JsonCodec, ProtocolSettings, RequestSerializer, ResponseDeserializer};
use indexmap::IndexMap;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// Config key overriding the error type header.
pub const ERROR_TYPE_HEADER_KEY: &str = "protocol.error_type_header";
/// Config key holding the service id.
pub const SERVICE_ID_KEY: &str = "service.id";
/// Config key holding the service version.
pub const SERVICE_VERSION_KEY: &str = "service.version";

/// Settings of one generation run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeneratorSettings {
    /// Wire protocol defaults.
    pub protocol: ProtocolSettings,
}

/// Turns a resolved [`ServiceModel`] into a [`ServicePlan`].
///
/// # Example
///
/// ```
/// use hermes_codegen::{Generator, GeneratorSettings};
/// use hermes_core::{HttpTrait, Member, Operation, ServiceModel, Shape};
/// use hermes_middleware::Stage;
///
/// let model = ServiceModel::new("Storage", "2024-01-01").operation(
///     Operation::new(
///         "GetObject",
///         Shape::structure(
///             "GetObjectInput",
///             vec![Member::new("Key", Shape::string("Key")).required().label()],
///         ),
///         Shape::structure("GetObjectOutput", vec![]),
///     )
///     .http(HttpTrait::new("GET", "/objects/{Key}")),
/// );
///
/// let plan = Generator::new(model, GeneratorSettings::default())
///     .generate()
///     .unwrap();
///
/// let get = plan.operation("GetObject").unwrap();
/// assert_eq!(get.template().ids(Stage::Serialize), ["OperationSerializer"]);
/// ```
pub struct Generator {
    model: ServiceModel,
    settings: GeneratorSettings,
    extensions: Vec<Box<dyn GeneratorExtension>>,
    codec: Option<Arc<dyn DocumentCodec>>,
}

impl fmt::Debug for Generator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Generator")
            .field("service", &self.model.id)
            .field("settings", &self.settings)
            .field(
                "extensions",
                &self.extensions.iter().map(|e| e.name()).collect::<Vec<_>>(),
            )
            .finish_non_exhaustive()
    }
}

impl Generator {
    /// Creates a generator with no extensions.
    #[must_use]
    pub fn new(model: ServiceModel, settings: GeneratorSettings) -> Self {
        Self {
            model,
            settings,
            extensions: Vec::new(),
            codec: None,
        }
    }

    /// Sets the extension list.
    #[must_use]
    pub fn with_extensions(mut self, extensions: Vec<Box<dyn GeneratorExtension>>) -> Self {
        self.extensions = extensions;
        self
    }

    /// Replaces the document codec; defaults to [`JsonCodec`].
    #[must_use]
    pub fn with_codec(mut self, codec: Arc<dyn DocumentCodec>) -> Self {
        self.codec = Some(codec);
        self
    }

    /// Runs generation.
    pub fn generate(mut self) -> Result<ServicePlan, GenerationError> {
        if self.model.id.trim().is_empty() {
            return Err(GenerationError::EmptyServiceId);
        }
        extension::order(&mut self.extensions);

        let mut config = ConfigMap::new();
        config.set(SERVICE_ID_KEY, self.model.id.as_str());
        config.set(SERVICE_VERSION_KEY, self.model.version.as_str());
        config.set(
            ERROR_TYPE_HEADER_KEY,
            self.settings.protocol.error_type_header.as_str(),
        );
        for extension in &self.extensions {
            extension.configure(&mut config);
        }

        let mut protocol = self.settings.protocol.clone();
        if let Some(header) = config.get_str(ERROR_TYPE_HEADER_KEY) {
            protocol.error_type_header = header.to_string();
        }
        let codec = self.codec.clone().unwrap_or_else(|| {
            Arc::new(JsonCodec::new(protocol.document_timestamp_format)) as Arc<dyn DocumentCodec>
        });

        let mut operations = IndexMap::with_capacity(self.model.operations.len());
        for operation in &self.model.operations {
            if operations.contains_key(&operation.name) {
                return Err(GenerationError::DuplicateOperation {
                    operation: operation.name.clone(),
                });
            }
            let plan = self.operation_plan(operation, &protocol, &codec)?;
            tracing::debug!(
                service = %self.model.id,
                operation = %operation.name,
                units = plan.template.len(),
                waiters = plan.waiters.len(),
                paginated = plan.paginator.is_some(),
                "generated operation plan"
            );
            operations.insert(operation.name.clone(), plan);
        }

        tracing::info!(
            service = %self.model.id,
            operations = operations.len(),
            extensions = self.extensions.len(),
            "generated service plan"
        );

        Ok(ServicePlan {
            service_id: self.model.id,
            version: self.model.version,
            config,
            operations,
        })
    }

    fn operation_plan(
        &self,
        operation: &Operation,
        protocol: &ProtocolSettings,
        codec: &Arc<dyn DocumentCodec>,
    ) -> Result<OperationPlan, GenerationError> {
        let protocol_error = |source| GenerationError::Protocol {
            operation: operation.name.clone(),
            source,
        };
        let serializer = RequestSerializer::new(operation, protocol.clone(), codec.clone())
            .map_err(protocol_error)?;
        let deserializer = ResponseDeserializer::new(operation, protocol.clone(), codec.clone())
            .map_err(protocol_error)?;

        let registrar_error = |source| GenerationError::Registrar {
            operation: operation.name.clone(),
            source,
        };
        let mut registrar = SlotRegistrar::new();
        for (stage, directives) in builtin::registrations() {
            registrar
                .register(stage, directives)
                .map_err(registrar_error)?;
        }

        let mut units = UnitRegistry::new();
        for extension in &self.extensions {
            for registration in extension.registrations(operation) {
                let provided: HashSet<&str> =
                    registration.units.iter().map(|unit| unit.id()).collect();
                if let Some(missing) = registration
                    .directive
                    .ids()
                    .iter()
                    .find(|id| !provided.contains(id.as_str()))
                {
                    return Err(GenerationError::MissingUnit {
                        operation: operation.name.clone(),
                        extension: extension.name().to_string(),
                        id: missing.clone(),
                    });
                }
                registrar
                    .register(registration.stage, [registration.directive.clone()])
                    .map_err(registrar_error)?;
                for unit in registration.units {
                    units.register_shared(unit);
                }
            }
        }
        let template = registrar.build().map_err(registrar_error)?;

        let waiters = operation
            .waiters
            .iter()
            .map(|definition| {
                WaiterPlan::compile(operation, definition).map_err(|source| {
                    GenerationError::Waiter {
                        operation: operation.name.clone(),
                        waiter: definition.name.clone(),
                        source,
                    }
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let paginator = operation
            .paginated
            .as_ref()
            .map(|paginated| PaginatorPlan::compile(operation, paginated))
            .transpose()?;

        Ok(OperationPlan {
            operation: Arc::new(operation.clone()),
            serializer: Arc::new(serializer),
            deserializer: Arc::new(deserializer),
            template,
            units,
            waiters,
            paginator,
        })
    }
}
