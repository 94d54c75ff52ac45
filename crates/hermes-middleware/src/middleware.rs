//! Core middleware trait and types.
//!
//! This module defines the [`Middleware`] trait every unit implements. A unit
//! receives the call context, the stage input and a [`Next`] callback; it
//! may act before calling `next` (request path) and after it returns
//! (response path).
//!
//! # Example
//!
//! ```ignore
//! use hermes_middleware::{BoxFuture, CallContext, Middleware, Next, StageInput, StageOutput};
//! use hermes_core::ErrorKind;
//!
//! struct TraceHeader;
//!
//! impl Middleware for TraceHeader {
//!     fn id(&self) -> &str {
//!         "TraceHeader"
//!     }
//!
//!     fn handle<'a>(
//!         &'a self,
//!         ctx: &'a mut CallContext,
//!         mut input: StageInput,
//!         next: Next<'a>,
//!     ) -> BoxFuture<'a, Result<StageOutput, ErrorKind>> {
//!         Box::pin(async move {
//!             input.request.headers.insert("x-trace", ctx.invocation_id().to_string());
//!             next.run(ctx, input).await
//!         })
//!     }
//! }
//! ```

use crate::context::CallContext;
use crate::types::{StageInput, StageOutput};
use hermes_core::ErrorKind;
use std::future::Future;
use std::pin::Pin;

/// A boxed, sendable future.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The terminal handler at the end of the chain (the transport).
pub type Terminal<'a> = Box<
    dyn FnOnce(&mut CallContext, StageInput) -> BoxFuture<'static, Result<StageOutput, ErrorKind>>
        + Send
        + 'a,
>;

/// A middleware unit.
///
/// # Invariants
///
/// - `id` is unique within a stack
/// - Units MUST call `next.run()` at most once
/// - Units hold only immutable captured state; per-call state lives in the
///   [`CallContext`]
pub trait Middleware: Send + Sync + 'static {
    /// Returns the unit identifier.
    fn id(&self) -> &str;

    /// Processes the input through this unit.
    fn handle<'a>(
        &'a self,
        ctx: &'a mut CallContext,
        input: StageInput,
        next: Next<'a>,
    ) -> BoxFuture<'a, Result<StageOutput, ErrorKind>>;
}

/// Callback to invoke the rest of the chain.
///
/// Consumed by [`Next::run`], so it can only be invoked once.
pub struct Next<'a> {
    inner: NextInner<'a>,
}

enum NextInner<'a> {
    /// More units to run.
    Chain {
        middleware: &'a dyn Middleware,
        next: Box<Next<'a>>,
    },
    /// End of chain.
    Terminal(Terminal<'a>),
}

impl<'a> Next<'a> {
    /// Creates a `Next` that will invoke the given unit.
    pub(crate) fn new(middleware: &'a dyn Middleware, next: Next<'a>) -> Self {
        Self {
            inner: NextInner::Chain {
                middleware,
                next: Box::new(next),
            },
        }
    }

    /// Creates a terminal `Next`.
    pub fn terminal<F>(f: F) -> Self
    where
        F: FnOnce(&mut CallContext, StageInput) -> BoxFuture<'static, Result<StageOutput, ErrorKind>>
            + Send
            + 'a,
    {
        Self {
            inner: NextInner::Terminal(Box::new(f)),
        }
    }

    /// Invokes the next unit or the terminal handler.
    pub async fn run(
        self,
        ctx: &mut CallContext,
        input: StageInput,
    ) -> Result<StageOutput, ErrorKind> {
        if ctx.is_canceled() {
            return Err(ErrorKind::Canceled);
        }
        match self.inner {
            NextInner::Chain { middleware, next } => middleware.handle(ctx, input, *next).await,
            NextInner::Terminal(terminal) => terminal(ctx, input).await,
        }
    }
}

/// A unit built from a closure.
///
/// # Example
///
/// ```ignore
/// let unit = FnMiddleware::new("Stamp", |ctx, mut input, next| {
///     Box::pin(async move {
///         input.request.headers.insert("x-stamp", "1");
///         next.run(ctx, input).await
///     })
/// });
/// ```
pub struct FnMiddleware<F> {
    id: String,
    func: F,
}

impl<F> FnMiddleware<F>
where
    F: for<'a> Fn(
            &'a mut CallContext,
            StageInput,
            Next<'a>,
        ) -> BoxFuture<'a, Result<StageOutput, ErrorKind>>
        + Send
        + Sync
        + 'static,
{
    /// Creates a closure-based unit.
    ///
    /// The bound lives on the constructor so closure signatures are inferred.
    pub fn new(id: impl Into<String>, func: F) -> Self {
        Self {
            id: id.into(),
            func,
        }
    }
}

impl<F> Middleware for FnMiddleware<F>
where
    F: for<'a> Fn(
            &'a mut CallContext,
            StageInput,
            Next<'a>,
        ) -> BoxFuture<'a, Result<StageOutput, ErrorKind>>
        + Send
        + Sync
        + 'static,
{
    fn id(&self) -> &str {
        &self.id
    }

    fn handle<'a>(
        &'a self,
        ctx: &'a mut CallContext,
        input: StageInput,
        next: Next<'a>,
    ) -> BoxFuture<'a, Result<StageOutput, ErrorKind>> {
        (self.func)(ctx, input, next)
    }
}
