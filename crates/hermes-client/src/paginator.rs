//! Paginator runtime: walks every page of a paginated operation.

use crate::client::{Client, InvokeOptions};
use hermes_codegen::paginator::token_continues;
use hermes_codegen::PaginatorPlan;
use hermes_config::PaginatorConfig;
use hermes_core::{OperationError, Value};
use thiserror::Error;

/// Why a page could not be fetched.
#[derive(Error, Debug)]
pub enum PaginatorError {
    /// Every page has already been returned.
    #[error("no more pages")]
    NoMorePages,

    /// The page request failed.
    #[error(transparent)]
    Operation(#[from] OperationError),

    /// The operation declares no pagination.
    #[error("operation `{operation}` is not paginated")]
    NotPaginated {
        /// Operation name.
        operation: String,
    },
}

/// Options for one pagination.
#[derive(Debug, Clone)]
pub struct PaginatorOptions {
    /// Page size written to the page-size member, when modeled.
    pub limit: Option<i64>,
    /// Stop when the service returns the token it was just sent.
    pub stop_on_duplicate_token: bool,
    /// Options applied to every page request.
    pub invoke: InvokeOptions,
}

impl Default for PaginatorOptions {
    fn default() -> Self {
        Self {
            limit: None,
            stop_on_duplicate_token: true,
            invoke: InvokeOptions::default(),
        }
    }
}

impl From<&PaginatorConfig> for PaginatorOptions {
    fn from(config: &PaginatorConfig) -> Self {
        Self {
            limit: config.page_size,
            stop_on_duplicate_token: config.stop_on_duplicate_token,
            invoke: InvokeOptions::default(),
        }
    }
}

/// Fetches pages one at a time.
///
/// ```no_run
/// # async fn run(client: hermes_client::Client) -> Result<(), hermes_client::PaginatorError> {
/// use hermes_client::PaginatorOptions;
/// use hermes_core::Value;
///
/// let mut pages = client.paginator("ListJobs", Value::structure(), PaginatorOptions::default())?;
/// while pages.has_more_pages() {
///     let page = pages.next_page().await?;
///     println!("{page:?}");
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Paginator {
    client: Client,
    operation: String,
    plan: PaginatorPlan,
    input: Value,
    options: PaginatorOptions,
    first_page: bool,
    next_token: Value,
    pages: usize,
}

impl Paginator {
    pub(crate) fn new(
        client: Client,
        operation: &str,
        plan: PaginatorPlan,
        input: Value,
        options: PaginatorOptions,
    ) -> Self {
        let next_token = input.get(&plan.input_token).cloned().unwrap_or(Value::Null);
        Self {
            client,
            operation: operation.to_string(),
            plan,
            input,
            options,
            first_page: true,
            next_token,
            pages: 0,
        }
    }

    /// Returns `true` until the last page has been fetched.
    #[must_use]
    pub fn has_more_pages(&self) -> bool {
        self.first_page || token_continues(&self.next_token)
    }

    /// Returns the number of pages fetched so far.
    #[must_use]
    pub const fn pages(&self) -> usize {
        self.pages
    }

    /// Fetches the next page.
    pub async fn next_page(&mut self) -> Result<Value, PaginatorError> {
        if !self.has_more_pages() {
            return Err(PaginatorError::NoMorePages);
        }

        let input = self
            .plan
            .page_input(&self.input, &self.next_token, self.options.limit);
        let output = self
            .client
            .invoke(&self.operation, input, self.options.invoke.clone())
            .await?;

        let token = self.plan.next_token(&output.value);
        let previous = std::mem::replace(&mut self.next_token, token);
        if self.options.stop_on_duplicate_token
            && token_continues(&previous)
            && previous == self.next_token
        {
            tracing::debug!(
                operation = %self.operation,
                page = self.pages + 1,
                "service repeated its continuation token, stopping"
            );
            self.next_token = Value::Null;
        }
        self.first_page = false;
        self.pages += 1;
        Ok(output.value)
    }

    /// Fetches the remaining pages and collects their items.
    pub async fn items(&mut self) -> Result<Vec<Value>, PaginatorError> {
        let mut items = Vec::new();
        while self.has_more_pages() {
            let page = self.next_page().await?;
            items.extend(self.plan.page_items(&page));
        }
        Ok(items)
    }
}
