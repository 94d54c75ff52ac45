//! # Hermes Test
//!
//! Test utilities for Hermes clients: an in-memory transport that replays
//! scripted responses, plus builders and assertions for both directions.
//!
//! ## Example
//!
//! ```ignore
//! use hermes_client::{Client, InvokeOptions};
//! use hermes_test::{ResponseBuilder, ScriptedHttpClient};
//!
//! #[tokio::test]
//! async fn test_get_job() {
//!     let http = ScriptedHttpClient::new()
//!         .respond(ResponseBuilder::ok().json(&serde_json::json!({"State": "DONE"})));
//!     let client = Client::builder(plan())
//!         .http_client(http.clone())
//!         .endpoint("https://jobs.example.com")
//!         .build()
//!         .unwrap();
//!
//!     client.invoke("GetJob", input(), InvokeOptions::default()).await.unwrap();
//!
//!     assert_eq!(http.request(0).unwrap().path(), "/jobs/j-1");
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/hermes-test/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod client;
mod error;
mod request;
mod response;

pub use client::ScriptedHttpClient;
pub use error::TestError;
pub use request::RecordedRequest;
pub use response::{ok_json, ResponseBuilder};
