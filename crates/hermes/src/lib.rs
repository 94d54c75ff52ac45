//! # Hermes
//!
//! **Model-driven SDK clients: generation plus runtime.**
//!
//! Hermes turns a resolved service model into immutable per-operation plans
//! and runs them through a five-stage middleware pipeline:
//!
//! ```text
//! Initialize → Serialize → Build → Finalize → HttpClient
//!                                                 ↓
//!                  Output ← Deserialize ←─────────┘
//! ```
//!
//! - [`codegen`] validates the model and builds serializers, deserializers,
//!   stack templates, waiter and paginator plans
//! - [`client`] invokes operations, waits on resources and walks pages
//! - [`config`] loads `HermesConfig` from defaults, files and environment
//! - [`telemetry`] installs structured logging and names the metrics
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use hermes::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConfigLoader::new().with_optional_file("hermes.toml")?.load()?;
//!     hermes::setup::init_telemetry(&config)?;
//!
//!     let plan = hermes::setup::generate(model(), &config)?;
//!     let client = hermes::setup::client_builder(plan, &config)
//!         .http_client(MyTransport::default())
//!         .build()?;
//!
//!     let job = client
//!         .waiter("GetJob", "JobDone")?
//!         .wait(input(), WaiterOptions::from(&config.waiter))
//!         .await?;
//!     println!("{job:?}");
//!     Ok(())
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/hermes/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Re-export core types
pub use hermes_core as core;

// Re-export middleware types
pub use hermes_middleware as middleware;

// Re-export wire protocol types
pub use hermes_protocol as protocol;

// Re-export generation types
pub use hermes_codegen as codegen;

// Re-export runtime client types
pub use hermes_client as client;

// Re-export configuration types
pub use hermes_config as config;

// Re-export telemetry types
pub use hermes_telemetry as telemetry;

pub mod setup;

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```rust
/// use hermes::prelude::*;
///
/// let options = WaiterOptions::default();
/// assert!(options.max_attempts.is_none());
/// ```
pub mod prelude {
    pub use hermes_core::{
        ApiError, ErrorKind, HttpRequest, HttpResponse, OperationError, ServiceModel, Value,
    };

    pub use hermes_middleware::{
        CallContext, FnMiddleware, Middleware, Next, RelativePosition, Stack, Stage, StageInput,
        StageOutput,
    };

    pub use hermes_codegen::{Generator, GeneratorExtension, GeneratorSettings, ServicePlan};

    pub use hermes_client::{
        Client, EndpointResolver, HttpClient, InvokeOptions, Output, Paginator, PaginatorError,
        PaginatorOptions, Signer, Waiter, WaiterError, WaiterOptions,
    };

    pub use hermes_config::{ConfigLoader, HermesConfig};

    pub use crate::setup::SetupError;
}
