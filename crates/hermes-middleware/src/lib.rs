//! # Hermes Middleware
//!
//! The five-stage middleware stack that every Hermes invocation runs through.
//!
//! ## Stages
//!
//! ```text
//! parameters → Initialize → Serialize → Build → Finalize → Deserialize → transport
//!                                                                           ↓
//! output     ←──────────────────────────────────────────── Deserialize ←────┘
//! ```
//!
//! | Stage | Sees | Typical units |
//! |-------|------|---------------|
//! | Initialize | input parameters | validation, logging |
//! | Serialize | parameters + empty request | operation serializer |
//! | Build | request | content length, user agent |
//! | Finalize | request | endpoint, signing |
//! | Deserialize | raw response on the way back | request id, operation deserializer |
//!
//! ## Ordering
//!
//! Unit order within a stage is decided at generation time by the
//! [`SlotRegistrar`], which turns `Add`/`Insert` directives into a
//! [`StackTemplate`]. Every call instantiates its own [`Stack`] from the
//! shared template; stacks are never shared between calls.
//!
//! ## Example
//!
//! ```
//! use hermes_middleware::{Directive, RelativePosition, SlotRegistrar, Stage};
//!
//! let mut registrar = SlotRegistrar::new();
//! registrar
//!     .register(
//!         Stage::Build,
//!         [
//!             Directive::add(RelativePosition::After, ["ComputeContentLength"]),
//!             Directive::insert("ComputeContentLength", RelativePosition::Before, ["UserAgent"]),
//!         ],
//!     )
//!     .unwrap();
//!
//! let template = registrar.build().unwrap();
//! assert_eq!(template.ids(Stage::Build), ["UserAgent", "ComputeContentLength"]);
//! ```

#![doc(html_root_url = "https://docs.rs/hermes-middleware/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod context;
pub mod middleware;
pub mod registrar;
pub mod stack;
pub mod stage;
pub mod types;

pub use context::CallContext;
pub use middleware::{BoxFuture, FnMiddleware, Middleware, Next, Terminal};
pub use registrar::{Directive, RegistrarError, SlotRegistrar, StackTemplate, UnitRegistry};
pub use stack::{RelativePosition, Stack, StackError};
pub use stage::Stage;
pub use types::{ResponseMetadata, StageInput, StageOutput};
