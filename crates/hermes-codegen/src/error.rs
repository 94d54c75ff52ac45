//! Generation failures.

use crate::paginator::PaginationError;
use crate::path::PathError;
use hermes_middleware::RegistrarError;
use hermes_protocol::ProtocolError;
use thiserror::Error;

/// Why a service could not be generated.
///
/// Generation fails closed: the first invalid operation aborts it and no
/// partial plan is returned.
#[derive(Error, Debug)]
pub enum GenerationError {
    /// The model has no service id.
    #[error("service id must not be empty")]
    EmptyServiceId,

    /// Two operations share a name.
    #[error("operation `{operation}` is declared twice")]
    DuplicateOperation {
        /// Operation name.
        operation: String,
    },

    /// Wire bindings did not resolve.
    #[error("operation `{operation}` has invalid bindings")]
    Protocol {
        /// Operation name.
        operation: String,
        /// Underlying error.
        #[source]
        source: ProtocolError,
    },

    /// A slot directive was rejected.
    #[error("operation `{operation}` has an invalid middleware order")]
    Registrar {
        /// Operation name.
        operation: String,
        /// Underlying error.
        #[source]
        source: RegistrarError,
    },

    /// An extension registered an id without supplying its unit.
    #[error("extension `{extension}` orders `{id}` for `{operation}` but provides no unit for it")]
    MissingUnit {
        /// Operation name.
        operation: String,
        /// Extension name.
        extension: String,
        /// Unit id.
        id: String,
    },

    /// A waiter acceptor path is invalid.
    #[error("waiter `{waiter}` of `{operation}` is invalid")]
    Waiter {
        /// Operation name.
        operation: String,
        /// Waiter name.
        waiter: String,
        /// Underlying error.
        #[source]
        source: PathError,
    },

    /// The pagination definition is invalid.
    #[error(transparent)]
    Pagination(#[from] PaginationError),

    /// Writing emitted source failed.
    #[error("failed to emit source")]
    Emit(#[from] std::fmt::Error),
}
