//! Ids and placement of the built-in middleware units.
//!
//! The generator only orders ids; the client supplies the implementations.

use hermes_middleware::{Directive, RelativePosition, Stage};

/// Invocation span, log line and metrics.
pub const OPERATION_LOGGING: &str = "OperationLogging";
/// Required input members are present.
pub const VALIDATE_REQUIRED: &str = "ValidateRequired";
/// Runs the request serializer.
pub const OPERATION_SERIALIZER: &str = "OperationSerializer";
/// Sets `Content-Length`.
pub const COMPUTE_CONTENT_LENGTH: &str = "ComputeContentLength";
/// Sets `User-Agent`.
pub const USER_AGENT: &str = "UserAgent";
/// Prefixes the request with the resolved endpoint.
pub const RESOLVE_ENDPOINT: &str = "ResolveEndpoint";
/// Applies the configured auth scheme.
pub const SIGNING: &str = "Signing";
/// Records the request id into metadata.
pub const REQUEST_ID_RETRIEVER: &str = "RequestIdRetriever";
/// Runs the deserializer and error dispatcher.
pub const OPERATION_DESERIALIZER: &str = "OperationDeserializer";

/// Every built-in id with its stage, in execution order.
pub const ALL: [(Stage, &str); 9] = [
    (Stage::Initialize, OPERATION_LOGGING),
    (Stage::Initialize, VALIDATE_REQUIRED),
    (Stage::Serialize, OPERATION_SERIALIZER),
    (Stage::Build, COMPUTE_CONTENT_LENGTH),
    (Stage::Build, USER_AGENT),
    (Stage::Finalize, RESOLVE_ENDPOINT),
    (Stage::Finalize, SIGNING),
    (Stage::Deserialize, REQUEST_ID_RETRIEVER),
    (Stage::Deserialize, OPERATION_DESERIALIZER),
];

/// Directives placing the built-ins, one group per stage.
///
/// The request id is read on the way back after the deserializer produced
/// the output, so it sits outside it.
pub fn registrations() -> Vec<(Stage, Vec<Directive>)> {
    vec![
        (
            Stage::Initialize,
            vec![Directive::add(
                RelativePosition::After,
                [OPERATION_LOGGING, VALIDATE_REQUIRED],
            )],
        ),
        (
            Stage::Serialize,
            vec![Directive::add(RelativePosition::After, [OPERATION_SERIALIZER])],
        ),
        (
            Stage::Build,
            vec![Directive::add(
                RelativePosition::After,
                [COMPUTE_CONTENT_LENGTH, USER_AGENT],
            )],
        ),
        (
            Stage::Finalize,
            vec![
                Directive::add(RelativePosition::After, [SIGNING]),
                Directive::insert(SIGNING, RelativePosition::Before, [RESOLVE_ENDPOINT]),
            ],
        ),
        (
            Stage::Deserialize,
            vec![Directive::add(
                RelativePosition::After,
                [REQUEST_ID_RETRIEVER, OPERATION_DESERIALIZER],
            )],
        ),
    ]
}

/// Returns `true` for a built-in id.
#[must_use]
pub fn is_builtin(id: &str) -> bool {
    ALL.iter().any(|(_, builtin)| *builtin == id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hermes_middleware::SlotRegistrar;

    #[test]
    fn test_registrations_match_table() {
        let mut registrar = SlotRegistrar::new();
        for (stage, directives) in registrations() {
            registrar.register(stage, directives).unwrap();
        }
        let template = registrar.build().unwrap();
        let order: Vec<_> = template.iter().collect();
        assert_eq!(order, ALL);
    }
}
