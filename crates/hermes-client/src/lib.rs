//! # Hermes Client
//!
//! Runs generated operation plans against a real service.
//!
//! A [`Client`] owns one [`ServicePlan`](hermes_codegen::ServicePlan), a
//! transport and the collaborators of the built-in middleware units:
//!
//! - [`Client::invoke`] assembles a fresh stack per call and runs it with
//!   the [`HttpClient`] as the terminal handler
//! - [`Waiter`] polls an operation until an acceptor decides the outcome
//! - [`Paginator`] walks every page of a paginated operation
//!
//! ## Example
//!
//! ```no_run
//! use hermes_client::{Client, InvokeOptions};
//! use hermes_core::Value;
//! # async fn run(
//! #     plan: hermes_codegen::ServicePlan,
//! #     http: std::sync::Arc<dyn hermes_client::HttpClient>,
//! # ) -> Result<(), Box<dyn std::error::Error>> {
//!
//! let client = Client::builder(plan)
//!     .shared_http_client(http)
//!     .endpoint("https://jobs.example.com")
//!     .build()?;
//!
//! let output = client
//!     .invoke("GetJob", Value::structure().with("Id", "j-1"), InvokeOptions::default())
//!     .await?;
//! println!("request id: {:?}", output.metadata.request_id);
//! # Ok(())
//! # }
//! ```

#![doc(html_root_url = "https://docs.rs/hermes-client/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod auth;
mod client;
mod paginator;
pub mod transport;
pub mod units;
mod waiter;

#[cfg(test)]
mod test_support;

pub use auth::{Anonymous, BearerToken, Signer};
pub use client::{
    Client, ClientBuilder, ClientError, InvokeOptions, Output, StackMutator, USER_AGENT_SUFFIX_KEY,
};
pub use paginator::{Paginator, PaginatorError, PaginatorOptions};
pub use transport::{EndpointResolver, HttpClient, StaticEndpoint};
pub use waiter::{Waiter, WaiterError, WaiterOptions};
