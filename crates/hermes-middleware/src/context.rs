//! Per-call context.
//!
//! The [`CallContext`] carries state through one invocation's stack. It is
//! created fresh for every call and dropped when the call returns.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Context that flows through the middleware stack.
///
/// Units can stash typed values in the context for units further down the
/// chain (or on the response path) using [`CallContext::set_extension`].
///
/// # Example
///
/// ```
/// use hermes_middleware::context::CallContext;
///
/// #[derive(Debug, PartialEq)]
/// struct SigningRegion(String);
///
/// let mut ctx = CallContext::new("Storage", "GetObject");
/// ctx.set_extension(SigningRegion("eu-west-1".to_string()));
///
/// assert_eq!(ctx.operation(), "GetObject");
/// assert_eq!(
///     ctx.get_extension::<SigningRegion>(),
///     Some(&SigningRegion("eu-west-1".to_string()))
/// );
/// ```
#[derive(Debug)]
pub struct CallContext {
    /// Service identifier.
    service: String,

    /// Operation name.
    operation: String,

    /// Unique id of this invocation, sent to the service for correlation.
    invocation_id: Uuid,

    /// When the call started.
    started_at: Instant,

    /// Caller-supplied cancellation.
    cancellation: CancellationToken,

    /// Type-erased extension data.
    extensions: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl CallContext {
    /// Creates a context with a fresh invocation id and no cancellation.
    #[must_use]
    pub fn new(service: impl Into<String>, operation: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            operation: operation.into(),
            invocation_id: Uuid::now_v7(),
            started_at: Instant::now(),
            cancellation: CancellationToken::new(),
            extensions: HashMap::new(),
        }
    }

    /// Attaches a cancellation token.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// Returns the service identifier.
    #[must_use]
    pub fn service(&self) -> &str {
        &self.service
    }

    /// Returns the operation name.
    #[must_use]
    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// Returns the invocation id.
    #[must_use]
    pub const fn invocation_id(&self) -> Uuid {
        self.invocation_id
    }

    /// Returns the time elapsed since the call started.
    #[must_use]
    pub fn elapsed(&self) -> std::time::Duration {
        self.started_at.elapsed()
    }

    /// Returns the cancellation token.
    #[must_use]
    pub const fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    /// Returns `true` if the caller canceled the call.
    #[must_use]
    pub fn is_canceled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    /// Stores a typed extension value, replacing any previous value of the type.
    pub fn set_extension<T: Any + Send + Sync>(&mut self, value: T) {
        self.extensions.insert(TypeId::of::<T>(), Box::new(value));
    }

    /// Returns a typed extension value.
    #[must_use]
    pub fn get_extension<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.extensions
            .get(&TypeId::of::<T>())
            .and_then(|boxed| boxed.downcast_ref())
    }

    /// Removes a typed extension value.
    pub fn remove_extension<T: Any + Send + Sync>(&mut self) -> Option<T> {
        self.extensions
            .remove(&TypeId::of::<T>())
            .and_then(|boxed| boxed.downcast().ok())
            .map(|boxed| *boxed)
    }
}
