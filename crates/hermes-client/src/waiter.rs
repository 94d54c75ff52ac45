//! Waiter runtime: polls an operation until an acceptor settles the outcome.

use crate::client::{Client, InvokeOptions};
use hermes_codegen::{Attempt, EvaluationError, WaiterPlan};
use hermes_config::WaiterConfig;
use hermes_core::{AcceptorState, OperationError, Value};
use hermes_telemetry::metrics;
use rand::Rng;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Why a waiter stopped without reaching `Success`.
#[derive(Error, Debug)]
pub enum WaiterError {
    /// An acceptor could not be evaluated.
    #[error(transparent)]
    Evaluation(#[from] EvaluationError),

    /// The attempt limit or time budget ran out.
    #[error("waiter `{waiter}` gave up after {attempts} attempts")]
    Exhausted {
        /// Waiter name.
        waiter: String,
        /// Attempts made.
        attempts: u32,
    },

    /// A `Failure` acceptor matched.
    #[error("waiter `{waiter}` entered a failure state")]
    FailureState {
        /// Waiter name.
        waiter: String,
    },

    /// The caller canceled the wait.
    #[error("waiter canceled")]
    Canceled,

    /// An attempt failed before reaching the service.
    #[error(transparent)]
    Operation(OperationError),

    /// No such waiter is declared on the operation.
    #[error("operation `{operation}` has no waiter `{waiter}`")]
    UnknownWaiter {
        /// Operation name.
        operation: String,
        /// Requested waiter.
        waiter: String,
    },

    /// The options cannot drive a wait.
    #[error("invalid waiter options: {message}")]
    InvalidOptions {
        /// What is wrong.
        message: String,
    },
}

/// Overrides for one wait.
///
/// Delays default to the waiter's declared bounds.
///
/// ```
/// use hermes_client::WaiterOptions;
/// use std::time::Duration;
///
/// let options = WaiterOptions {
///     max_wait: Duration::from_secs(60),
///     max_attempts: Some(10),
///     ..WaiterOptions::default()
/// };
/// assert!(options.min_delay.is_none());
/// ```
#[derive(Debug, Clone)]
pub struct WaiterOptions {
    /// Lower delay bound.
    pub min_delay: Option<Duration>,
    /// Upper delay bound.
    pub max_delay: Option<Duration>,
    /// Total time budget.
    pub max_wait: Duration,
    /// Attempt limit.
    pub max_attempts: Option<u32>,
    /// Log every attempt at debug level.
    pub log_attempts: bool,
    /// Use the exact backoff delay.
    pub disable_jitter: bool,
    /// Cancels both attempts and sleeps.
    pub cancellation: Option<CancellationToken>,
    /// Options applied to every attempt.
    pub invoke: InvokeOptions,
}

impl Default for WaiterOptions {
    fn default() -> Self {
        Self {
            min_delay: None,
            max_delay: None,
            max_wait: Duration::from_secs(300),
            max_attempts: None,
            log_attempts: false,
            disable_jitter: false,
            cancellation: None,
            invoke: InvokeOptions::default(),
        }
    }
}

impl From<&WaiterConfig> for WaiterOptions {
    fn from(config: &WaiterConfig) -> Self {
        Self {
            min_delay: config.min_delay_secs.map(Duration::from_secs),
            max_delay: config.max_delay_secs.map(Duration::from_secs),
            max_wait: Duration::from_secs(config.max_wait_secs),
            max_attempts: config.max_attempts,
            log_attempts: config.log_attempts,
            disable_jitter: config.disable_jitter,
            ..Self::default()
        }
    }
}

/// A waiter bound to a client.
#[derive(Debug, Clone)]
pub struct Waiter {
    client: Client,
    operation: String,
    plan: WaiterPlan,
}

impl Waiter {
    pub(crate) fn new(client: Client, operation: &str, plan: WaiterPlan) -> Self {
        Self {
            client,
            operation: operation.to_string(),
            plan,
        }
    }

    /// Returns the waiter name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.plan.name
    }

    /// Returns the polled operation.
    #[must_use]
    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// Polls until an acceptor returns `Success` or `Failure`.
    ///
    /// Every attempt sends a fresh request built from a clone of `input`.
    /// A failed call that no acceptor matches is retried, except failures
    /// raised before the request left the client, which abort the wait.
    /// `Success` reached through an error acceptor yields `Value::Null`.
    pub async fn wait(&self, input: Value, options: WaiterOptions) -> Result<Value, WaiterError> {
        let min_delay = options.min_delay.unwrap_or(self.plan.min_delay);
        let max_delay = options.max_delay.unwrap_or(self.plan.max_delay);
        if min_delay.is_zero() {
            return Err(self.invalid("min_delay must be positive"));
        }
        if min_delay > max_delay {
            return Err(self.invalid(format!(
                "min_delay ({}s) exceeds max_delay ({}s)",
                min_delay.as_secs_f64(),
                max_delay.as_secs_f64()
            )));
        }
        if options.max_wait.is_zero() {
            return Err(self.invalid("max_wait must be positive"));
        }

        let cancellation = options.cancellation.clone().unwrap_or_default();
        let invoke = options.invoke.clone().cancellation(cancellation.clone());
        let service = self.client.service_id();
        let deadline = Instant::now() + options.max_wait;
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            let outcome = self
                .client
                .invoke(&self.operation, input.clone(), invoke.clone())
                .await;
            let (state, value) = match outcome {
                Ok(output) => (
                    self.plan.evaluate(&input, Attempt::Output(&output.value))?,
                    output.value,
                ),
                Err(err) if err.is_canceled() => return Err(WaiterError::Canceled),
                Err(err) if err.kind.is_local() => return Err(WaiterError::Operation(err)),
                Err(err) => (self.plan.evaluate(&input, Attempt::Failed(&err))?, Value::Null),
            };

            metrics::record_waiter_attempt(service, &self.plan.name, state_label(state));
            if options.log_attempts {
                tracing::debug!(
                    service = %service,
                    operation = %self.operation,
                    waiter = %self.plan.name,
                    attempt,
                    state = state_label(state),
                    "waiter attempt"
                );
            }

            match state {
                AcceptorState::Success => return Ok(value),
                AcceptorState::Failure => {
                    return Err(WaiterError::FailureState {
                        waiter: self.plan.name.clone(),
                    });
                }
                AcceptorState::Retry => {}
            }

            if options.max_attempts.is_some_and(|max| attempt >= max) {
                return Err(self.exhausted(attempt));
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining <= min_delay {
                return Err(self.exhausted(attempt));
            }
            let mut delay = backoff(min_delay, max_delay, attempt, options.disable_jitter);
            if remaining.saturating_sub(delay) < min_delay {
                delay = remaining - min_delay;
            }

            tokio::select! {
                biased;
                () = cancellation.cancelled() => return Err(WaiterError::Canceled),
                () = tokio::time::sleep(delay) => {}
            }
        }
    }

    fn exhausted(&self, attempts: u32) -> WaiterError {
        tracing::debug!(waiter = %self.plan.name, attempts, "waiter exhausted");
        WaiterError::Exhausted {
            waiter: self.plan.name.clone(),
            attempts,
        }
    }

    fn invalid(&self, message: impl Into<String>) -> WaiterError {
        let message = message.into();
        tracing::warn!(waiter = %self.plan.name, %message, "rejected waiter options");
        WaiterError::InvalidOptions { message }
    }
}

const fn state_label(state: AcceptorState) -> &'static str {
    match state {
        AcceptorState::Success => "success",
        AcceptorState::Failure => "failure",
        AcceptorState::Retry => "retry",
    }
}

/// Delay before the attempt after `attempt`: `min * 2^(attempt-1)` capped
/// at `max`, then drawn uniformly from `[min, delay]` unless jitter is off.
fn backoff(min: Duration, max: Duration, attempt: u32, disable_jitter: bool) -> Duration {
    let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
    let delay = min.saturating_mul(factor).min(max);
    if disable_jitter || delay <= min {
        return delay;
    }
    rand::rng().random_range(min..=delay)
}
