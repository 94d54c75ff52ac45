//! Wiring a loaded [`HermesConfig`] into generation and the runtime client.

use hermes_client::{Client, ClientBuilder, ClientError};
use hermes_codegen::emit::ClientEmitter;
use hermes_codegen::{GenerationError, Generator, GeneratorSettings, ServicePlan};
use hermes_config::{ConfigError, HermesConfig, ProtocolConfig};
use hermes_core::ServiceModel;
use hermes_protocol::ProtocolSettings;
use hermes_telemetry::{LogConfig, TelemetryError};
use thiserror::Error;

/// A setup step failed.
#[derive(Error, Debug)]
pub enum SetupError {
    /// Configuration could not be loaded or is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The model could not be turned into plans.
    #[error(transparent)]
    Generation(#[from] GenerationError),

    /// The runtime client could not be built.
    #[error(transparent)]
    Client(#[from] ClientError),

    /// Logging could not be installed.
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),
}

/// Maps the `[protocol]` section onto generator settings.
#[must_use]
pub fn generator_settings(config: &HermesConfig) -> GeneratorSettings {
    GeneratorSettings {
        protocol: protocol_settings(&config.protocol),
    }
}

fn protocol_settings(config: &ProtocolConfig) -> ProtocolSettings {
    ProtocolSettings {
        header_timestamp_format: config.header_timestamp_format,
        query_timestamp_format: config.query_timestamp_format,
        label_timestamp_format: config.label_timestamp_format,
        document_timestamp_format: config.document_timestamp_format,
        error_type_header: config.error_type_header.clone(),
    }
}

/// Creates a generator for `model`, applying the service id override.
#[must_use]
pub fn generator(mut model: ServiceModel, config: &HermesConfig) -> Generator {
    if let Some(service_id) = &config.generator.service_id {
        tracing::debug!(declared = %model.id, service_id = %service_id, "overriding service id");
        model.id.clone_from(service_id);
    }
    Generator::new(model, generator_settings(config))
}

/// Generates the plan of `model` with default extensions.
pub fn generate(model: ServiceModel, config: &HermesConfig) -> Result<ServicePlan, SetupError> {
    Ok(generator(model, config).generate()?)
}

/// Renders the typed facade of `plan`.
pub fn emit_client(plan: &ServicePlan, config: &HermesConfig) -> Result<String, SetupError> {
    let mut emitter = ClientEmitter::new(plan);
    if let Some(path) = &config.generator.module_path {
        emitter = emitter.module_path(path.clone());
    }
    Ok(emitter.emit()?)
}

/// Starts a client builder with the `[client]` section applied.
#[must_use]
pub fn client_builder(plan: ServicePlan, config: &HermesConfig) -> ClientBuilder {
    Client::builder(plan).config(&config.client)
}

/// Installs logging per the `[telemetry]` section and describes metrics.
pub fn init_telemetry(config: &HermesConfig) -> Result<(), SetupError> {
    hermes_telemetry::init_logging(&LogConfig::from(&config.telemetry))?;
    hermes_telemetry::metrics::describe_metrics();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use hermes_core::{Operation, Shape, TimestampFormat};

    fn model() -> ServiceModel {
        ServiceModel::new("jobs", "2024-01-01").operation(Operation::new(
            "Ping",
            Shape::structure("PingInput", vec![]),
            Shape::structure("PingOutput", vec![]),
        ))
    }

    #[test]
    fn test_protocol_section_reaches_settings() {
        let mut config = HermesConfig::default();
        config.protocol.header_timestamp_format = TimestampFormat::EpochSeconds;
        config.protocol.error_type_header = "X-Error-Code".into();

        let settings = generator_settings(&config);
        assert_eq!(
            settings.protocol.header_timestamp_format,
            TimestampFormat::EpochSeconds
        );
        assert_eq!(settings.protocol.error_type_header, "X-Error-Code");
    }

    #[test]
    fn test_service_id_override_and_module_path() {
        let mut config = HermesConfig::default();
        config.generator.service_id = Some("Scheduler".into());
        config.generator.module_path = Some("crate::sched".into());

        let plan = generate(model(), &config).unwrap();
        assert_eq!(plan.service_id(), "Scheduler");

        let source = emit_client(&plan, &config).unwrap();
        assert!(source.contains("pub struct SchedulerClient {"));
    }
}
