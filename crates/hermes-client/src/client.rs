//! The invocation orchestrator.

use crate::auth::{Anonymous, Signer};
use crate::paginator::{Paginator, PaginatorError, PaginatorOptions};
use crate::transport::{EndpointResolver, HttpClient, StaticEndpoint};
use crate::units::{self, Runtime, UserAgent};
use crate::waiter::{Waiter, WaiterError};
use hermes_codegen::ServicePlan;
use hermes_config::ClientConfig;
use hermes_core::{ErrorKind, OperationError, Value};
use hermes_middleware::{
    BoxFuture, CallContext, RegistrarError, ResponseMetadata, Stack, StackError, StageInput,
    StageOutput, UnitRegistry,
};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Plan config key read for the `User-Agent` suffix when the builder sets none.
pub const USER_AGENT_SUFFIX_KEY: &str = "client.user_agent_suffix";

/// A per-call change to the freshly instantiated stack.
pub type StackMutator = Arc<dyn Fn(&mut Stack) -> Result<(), StackError> + Send + Sync>;

/// Why a client could not be built.
#[derive(Error, Debug)]
pub enum ClientError {
    /// No transport was configured.
    #[error("no HTTP client configured")]
    MissingHttpClient,

    /// No endpoint or endpoint resolver was configured.
    #[error("no endpoint configured")]
    MissingEndpoint,

    /// An operation's template names a unit nobody provides.
    #[error("operation `{operation}` cannot be assembled")]
    Registrar {
        /// Operation name.
        operation: String,
        /// Underlying error.
        #[source]
        source: RegistrarError,
    },
}

/// Per-call options.
///
/// # Example
///
/// ```
/// use hermes_client::InvokeOptions;
/// use hermes_middleware::{FnMiddleware, RelativePosition, Stage};
/// use std::sync::Arc;
/// use tokio_util::sync::CancellationToken;
///
/// let options = InvokeOptions::default()
///     .cancellation(CancellationToken::new())
///     .mutate(|stack| {
///         let unit = FnMiddleware::new("TraceHeader", |ctx, mut input, next| {
///             Box::pin(async move {
///                 input.request.headers.insert("x-trace", "on");
///                 next.run(ctx, input).await
///             })
///         });
///         stack.add(Stage::Build, Arc::new(unit), RelativePosition::After)
///     });
/// assert_eq!(options.mutator_count(), 1);
/// ```
#[derive(Clone, Default)]
pub struct InvokeOptions {
    cancellation: Option<CancellationToken>,
    mutators: Vec<StackMutator>,
}

impl InvokeOptions {
    /// Makes the call cancelable.
    #[must_use]
    pub fn cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Adds a stack mutator, applied in insertion order.
    #[must_use]
    pub fn mutate<F>(mut self, mutator: F) -> Self
    where
        F: Fn(&mut Stack) -> Result<(), StackError> + Send + Sync + 'static,
    {
        self.mutators.push(Arc::new(mutator));
        self
    }

    /// Returns the number of stack mutators.
    #[must_use]
    pub fn mutator_count(&self) -> usize {
        self.mutators.len()
    }
}

impl fmt::Debug for InvokeOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InvokeOptions")
            .field("cancellation", &self.cancellation)
            .field("mutators", &self.mutators.len())
            .finish()
    }
}

/// The result of a successful call.
#[derive(Debug, Clone, PartialEq)]
pub struct Output {
    /// Deserialized output structure.
    pub value: Value,
    /// Status, request id and unit-recorded values.
    pub metadata: ResponseMetadata,
}

/// Configures a [`Client`].
pub struct ClientBuilder {
    plan: Arc<ServicePlan>,
    http: Option<Arc<dyn HttpClient>>,
    resolver: Option<Arc<dyn EndpointResolver>>,
    signer: Arc<dyn Signer>,
    user_agent_suffix: Option<String>,
}

impl ClientBuilder {
    /// Sets the transport.
    #[must_use]
    pub fn http_client(mut self, client: impl HttpClient + 'static) -> Self {
        self.http = Some(Arc::new(client));
        self
    }

    /// Sets a shared transport.
    #[must_use]
    pub fn shared_http_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.http = Some(client);
        self
    }

    /// Uses one endpoint for every call.
    #[must_use]
    pub fn endpoint(self, url: impl Into<String>) -> Self {
        self.endpoint_resolver(StaticEndpoint::new(url))
    }

    /// Sets the endpoint resolver.
    #[must_use]
    pub fn endpoint_resolver(mut self, resolver: impl EndpointResolver + 'static) -> Self {
        self.resolver = Some(Arc::new(resolver));
        self
    }

    /// Sets the signer. Defaults to [`Anonymous`].
    #[must_use]
    pub fn signer(mut self, signer: impl Signer + 'static) -> Self {
        self.signer = Arc::new(signer);
        self
    }

    /// Appends an application token to `User-Agent`.
    #[must_use]
    pub fn user_agent_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.user_agent_suffix = Some(suffix.into());
        self
    }

    /// Applies the `[client]` configuration section.
    #[must_use]
    pub fn config(mut self, config: &ClientConfig) -> Self {
        if let Some(endpoint) = &config.endpoint {
            self = self.endpoint(endpoint.clone());
        }
        if let Some(suffix) = &config.user_agent_suffix {
            self = self.user_agent_suffix(suffix.clone());
        }
        self
    }

    /// Builds the client, checking that every operation can be assembled.
    pub fn build(self) -> Result<Client, ClientError> {
        let http = self.http.ok_or(ClientError::MissingHttpClient)?;
        let resolver = self.resolver.ok_or(ClientError::MissingEndpoint)?;
        let suffix = self
            .user_agent_suffix
            .or_else(|| self.plan.config().get_str(USER_AGENT_SUFFIX_KEY).map(str::to_string));
        let runtime = Runtime {
            resolver,
            signer: self.signer,
            user_agent: UserAgent::with_suffix(suffix.as_deref()).value().to_string(),
        };

        let mut registries = HashMap::with_capacity(self.plan.len());
        for operation in self.plan.operations() {
            let mut registry = operation.extension_units().clone();
            units::register_builtins(&mut registry, operation, &runtime);
            operation
                .template()
                .verify(&registry)
                .map_err(|source| ClientError::Registrar {
                    operation: operation.name().to_string(),
                    source,
                })?;
            registries.insert(operation.name().to_string(), registry);
        }

        tracing::info!(
            service = %self.plan.service_id(),
            operations = registries.len(),
            signer = runtime.signer.scheme(),
            "client ready"
        );
        Ok(Client {
            inner: Arc::new(ClientInner {
                plan: self.plan,
                registries,
                http,
            }),
        })
    }
}

impl fmt::Debug for ClientBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientBuilder")
            .field("service", &self.plan.service_id())
            .field("http", &self.http)
            .field("resolver", &self.resolver)
            .field("signer", &self.signer)
            .finish_non_exhaustive()
    }
}

struct ClientInner {
    plan: Arc<ServicePlan>,
    registries: HashMap<String, UnitRegistry>,
    http: Arc<dyn HttpClient>,
}

/// Invokes operations of one generated service.
///
/// Cheap to clone; clones share the plan and transport. Every call builds
/// its own stack from the operation's template, so calls never share
/// mutable state.
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("service", &self.inner.plan.service_id())
            .field("operations", &self.inner.registries.len())
            .field("http", &self.inner.http)
            .finish()
    }
}

impl Client {
    /// Starts building a client for a generated plan.
    #[must_use]
    pub fn builder(plan: impl Into<Arc<ServicePlan>>) -> ClientBuilder {
        ClientBuilder {
            plan: plan.into(),
            http: None,
            resolver: None,
            signer: Arc::new(Anonymous),
            user_agent_suffix: None,
        }
    }

    /// Returns the plan this client runs.
    #[must_use]
    pub fn plan(&self) -> &ServicePlan {
        &self.inner.plan
    }

    /// Returns the service id.
    #[must_use]
    pub fn service_id(&self) -> &str {
        self.inner.plan.service_id()
    }

    /// Invokes one operation.
    ///
    /// The input runs through Initialize, Serialize, Build and Finalize,
    /// is sent by the [`HttpClient`] and comes back through Deserialize.
    /// Every failure names the service and operation.
    pub async fn invoke(
        &self,
        operation: &str,
        input: Value,
        options: InvokeOptions,
    ) -> Result<Output, OperationError> {
        let service = self.service_id();
        let fail = |kind: ErrorKind| OperationError::new(service, operation, kind);

        let registry = self.inner.registries.get(operation).ok_or_else(|| {
            fail(ErrorKind::UnknownOperation {
                name: operation.to_string(),
            })
        })?;
        let plan = self.inner.plan.operation(operation).ok_or_else(|| {
            fail(ErrorKind::UnknownOperation {
                name: operation.to_string(),
            })
        })?;

        let stack_id = format!("{service}.{operation}");
        let mut stack = plan
            .template()
            .instantiate(stack_id.as_str(), registry)
            .map_err(|err| {
                fail(ErrorKind::Stack {
                    stack: stack_id.clone(),
                    message: err.to_string(),
                })
            })?;
        for mutator in &options.mutators {
            mutator(&mut stack).map_err(|err| fail(err.into()))?;
        }

        let mut ctx = CallContext::new(service, operation)
            .with_cancellation(options.cancellation.unwrap_or_default());
        let http = Arc::clone(&self.inner.http);
        let transport = move |ctx: &mut CallContext,
                              input: StageInput|
              -> BoxFuture<'static, Result<StageOutput, ErrorKind>> {
            let cancellation = ctx.cancellation().clone();
            Box::pin(async move {
                tokio::select! {
                    biased;
                    () = cancellation.cancelled() => Err(ErrorKind::Canceled),
                    response = http.send(input.request) => Ok(StageOutput::from_response(response?)),
                }
            })
        };

        let output = stack
            .handle(&mut ctx, StageInput::new(input), transport)
            .await
            .map_err(fail)?;
        Ok(Output {
            value: output.result,
            metadata: output.metadata,
        })
    }

    /// Returns a waiter declared on `operation`.
    pub fn waiter(&self, operation: &str, name: &str) -> Result<Waiter, WaiterError> {
        let plan = self
            .inner
            .plan
            .operation(operation)
            .and_then(|op| op.waiter(name))
            .ok_or_else(|| WaiterError::UnknownWaiter {
                operation: operation.to_string(),
                waiter: name.to_string(),
            })?;
        Ok(Waiter::new(self.clone(), operation, plan.clone()))
    }

    /// Returns a paginator over `operation`, starting from `input`.
    pub fn paginator(
        &self,
        operation: &str,
        input: Value,
        options: PaginatorOptions,
    ) -> Result<Paginator, PaginatorError> {
        let plan = self
            .inner
            .plan
            .operation(operation)
            .and_then(|op| op.paginator())
            .ok_or_else(|| PaginatorError::NotPaginated {
                operation: operation.to_string(),
            })?;
        Ok(Paginator::new(
            self.clone(),
            operation,
            plan.clone(),
            input,
            options,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{client, jobs_plan, json, not_found, Replay};
    use crate::units::INVOCATION_ID_HEADER;
    use hermes_core::ApiError;
    use hermes_middleware::{FnMiddleware, RelativePosition, Stage};

    fn get_job() -> Value {
        Value::structure().with("Id", "j-1")
    }

    #[tokio::test]
    async fn test_invoke_runs_full_pipeline() {
        let http = Replay::new(vec![
            json(r#"{"State":"RUNNING"}"#).with_header("x-amzn-requestid", "req-42")
        ]);
        let output = client(&http)
            .invoke("GetJob", get_job(), InvokeOptions::default())
            .await
            .unwrap();

        assert_eq!(output.value.get("State"), Some(&Value::from("RUNNING")));
        assert_eq!(output.metadata.request_id.as_deref(), Some("req-42"));

        let request = &http.requests()[0];
        assert_eq!(request.url(), "https://jobs.example.com/jobs/j-1");
        assert!(request.headers.contains(INVOCATION_ID_HEADER));
        assert_eq!(request.headers.get("user-agent"), Some(UserAgent::PRODUCT));
    }

    #[tokio::test]
    async fn test_api_error_names_operation() {
        let http = Replay::new(vec![not_found()]);
        let err = client(&http)
            .invoke("GetJob", get_job(), InvokeOptions::default())
            .await
            .unwrap_err();

        assert_eq!(err.service, "Jobs");
        assert_eq!(err.operation, "GetJob");
        assert_eq!(err.api_error().map(ApiError::code), Some("JobNotFound"));
    }

    #[tokio::test]
    async fn test_unknown_operation() {
        let http = Replay::new(vec![]);
        let err = client(&http)
            .invoke("DeleteJob", get_job(), InvokeOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err.kind, ErrorKind::UnknownOperation { ref name } if name == "DeleteJob"));
    }

    #[tokio::test]
    async fn test_mutator_touches_only_its_call() {
        let http = Replay::new(vec![json("{}"), json("{}")]);
        let client = client(&http);
        let options = InvokeOptions::default().mutate(|stack| {
            let unit = FnMiddleware::new("Tracer", |ctx, mut input, next| {
                Box::pin(async move {
                    input.request.headers.insert("x-trace", "on");
                    next.run(ctx, input).await
                })
            });
            stack.add(Stage::Build, Arc::new(unit), RelativePosition::After)
        });

        client.invoke("GetJob", get_job(), options).await.unwrap();
        client
            .invoke("GetJob", get_job(), InvokeOptions::default())
            .await
            .unwrap();

        let requests = http.requests();
        assert_eq!(requests[0].headers.get("x-trace"), Some("on"));
        assert!(!requests[1].headers.contains("x-trace"));
    }

    #[tokio::test]
    async fn test_failed_mutator_aborts_call() {
        let http = Replay::new(vec![]);
        let options = InvokeOptions::default().mutate(|stack| stack.remove("Missing").map(|_| ()));
        let err = client(&http)
            .invoke("GetJob", get_job(), options)
            .await
            .unwrap_err();
        assert!(matches!(err.kind, ErrorKind::Stack { .. }));
        assert!(http.requests().is_empty());
    }

    #[tokio::test]
    async fn test_canceled_before_send() {
        let http = Replay::new(vec![json("{}")]);
        let token = CancellationToken::new();
        token.cancel();

        let err = client(&http)
            .invoke("GetJob", get_job(), InvokeOptions::default().cancellation(token))
            .await
            .unwrap_err();
        assert!(err.is_canceled());
    }

    #[test]
    fn test_builder_requires_transport_and_endpoint() {
        assert!(matches!(
            Client::builder(jobs_plan()).endpoint("https://x.example.com").build(),
            Err(ClientError::MissingHttpClient)
        ));
        assert!(matches!(
            Client::builder(jobs_plan())
                .shared_http_client(Replay::new(vec![]))
                .build(),
            Err(ClientError::MissingEndpoint)
        ));
    }

    #[tokio::test]
    async fn test_user_agent_suffix() {
        let http = Replay::new(vec![json("{}")]);
        let client = Client::builder(jobs_plan())
            .shared_http_client(http.clone())
            .config(&ClientConfig {
                endpoint: Some("https://jobs.example.com".into()),
                user_agent_suffix: Some("app/2".into()),
            })
            .build()
            .unwrap();

        client
            .invoke("GetJob", get_job(), InvokeOptions::default())
            .await
            .unwrap();
        let expected = format!("{} app/2", UserAgent::PRODUCT);
        assert_eq!(http.requests()[0].headers.get("user-agent"), Some(expected.as_str()));
    }
}
