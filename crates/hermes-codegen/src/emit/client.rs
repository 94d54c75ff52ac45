//! Typed client facade emission.

use super::ir::{Expr, FieldDef, Function, Item, Module, Param, Stmt, TypePath};
use super::printer::Printer;
use crate::error::GenerationError;
use crate::plan::{OperationPlan, ServicePlan};
use crate::waiter::WaiterPlan;

const CLIENT: &str = "hermes_client::Client";
const INVOKE_OPTIONS: &str = "hermes_client::InvokeOptions";
const OUTPUT: &str = "hermes_client::Output";
const WAITER_OPTIONS: &str = "hermes_client::WaiterOptions";
const WAITER_ERROR: &str = "hermes_client::WaiterError";
const PAGINATOR: &str = "hermes_client::Paginator";
const PAGINATOR_OPTIONS: &str = "hermes_client::PaginatorOptions";
const PAGINATOR_ERROR: &str = "hermes_client::PaginatorError";
const VALUE: &str = "hermes_core::Value";
const OPERATION_ERROR: &str = "hermes_core::OperationError";

/// Emits a typed facade over the runtime client.
///
/// The facade has one async method per operation, one `wait_until_*`
/// method per waiter and one `*_paginator` method per paginated operation.
#[derive(Debug)]
pub struct ClientEmitter<'a> {
    plan: &'a ServicePlan,
    module_path: String,
}

impl<'a> ClientEmitter<'a> {
    /// Creates an emitter for a service plan.
    #[must_use]
    pub fn new(plan: &'a ServicePlan) -> Self {
        Self {
            plan,
            module_path: format!("crate::{}", snake_case(plan.service_id())),
        }
    }

    /// Overrides the module path of the emitted file.
    #[must_use]
    pub fn module_path(mut self, path: impl Into<String>) -> Self {
        self.module_path = path.into();
        self
    }

    /// Returns the facade type name, e.g. `StorageClient`.
    #[must_use]
    pub fn client_name(&self) -> String {
        let mut name: String = self
            .plan
            .service_id()
            .split(|c: char| !c.is_ascii_alphanumeric())
            .filter(|part| !part.is_empty())
            .map(|part| {
                let mut chars = part.chars();
                chars
                    .next()
                    .map(|first| first.to_ascii_uppercase().to_string() + chars.as_str())
                    .unwrap_or_default()
            })
            .collect();
        name.push_str("Client");
        name
    }

    /// Builds the IR module.
    #[must_use]
    pub fn module(&self) -> Module {
        let name = self.client_name();
        let mut functions = vec![Function {
            docs: vec!["Wraps a configured runtime client.".into()],
            name: "new".into(),
            params: vec![Param::new("inner", TypePath::parse(CLIENT))],
            ret: Some(TypePath::local("Self")),
            body: vec![Stmt::Tail(Expr::StructLit {
                name: "Self".into(),
                fields: vec![("inner".into(), Expr::ident("inner"))],
            })],
            ..Function::default()
        }];

        for operation in self.plan.operations() {
            functions.push(invoke_fn(operation));
            for waiter in operation.waiters() {
                functions.push(waiter_fn(operation, waiter));
            }
            if operation.paginator().is_some() {
                functions.push(paginator_fn(operation));
            }
        }

        Module {
            path: self.module_path.clone(),
            docs: vec![format!(
                "Client for the `{}` service, version `{}`.",
                self.plan.service_id(),
                self.plan.version()
            )],
            items: vec![
                Item::Struct {
                    docs: vec![format!(
                        "Typed facade over [`Client`] for `{}`.",
                        self.plan.service_id()
                    )],
                    derives: vec!["Debug".into(), "Clone".into()],
                    name: name.clone(),
                    fields: vec![FieldDef {
                        name: "inner".into(),
                        ty: TypePath::parse(CLIENT),
                    }],
                },
                Item::Impl {
                    target: name,
                    functions,
                },
            ],
        }
    }

    /// Renders the facade source.
    pub fn emit(&self) -> Result<String, GenerationError> {
        let source = Printer::new().render(&self.module())?;
        tracing::debug!(
            service = %self.plan.service_id(),
            bytes = source.len(),
            "emitted client facade"
        );
        Ok(source)
    }
}

fn docs(operation: &OperationPlan, fallback: String) -> Vec<String> {
    operation
        .operation()
        .documentation
        .as_deref()
        .map_or_else(|| vec![fallback], |text| text.lines().map(str::to_string).collect())
}

fn invoke_fn(operation: &OperationPlan) -> Function {
    Function {
        docs: docs(operation, format!("Invokes `{}`.", operation.name())),
        name: snake_case(operation.name()),
        is_async: true,
        receiver: true,
        params: vec![Param::new("input", TypePath::parse(VALUE))],
        ret: Some(
            TypePath::local("Result")
                .generic(TypePath::parse(OUTPUT))
                .generic(TypePath::parse(OPERATION_ERROR)),
        ),
        body: vec![Stmt::Tail(
            Expr::self_field("inner")
                .method(
                    "invoke",
                    vec![
                        Expr::str(operation.name()),
                        Expr::ident("input"),
                        Expr::assoc(TypePath::parse(INVOKE_OPTIONS), "default", Vec::new()),
                    ],
                )
                .awaited(),
        )],
    }
}

fn waiter_fn(operation: &OperationPlan, waiter: &WaiterPlan) -> Function {
    let mut docs = waiter.documentation.as_deref().map_or_else(
        || vec![format!("Polls `{}` until `{}` is reached.", operation.name(), waiter.name)],
        |text| text.lines().map(str::to_string).collect(),
    );
    docs.push(String::new());
    docs.push(format!(
        "Delays between attempts range from {}s to {}s.",
        waiter.min_delay.as_secs(),
        waiter.max_delay.as_secs()
    ));

    Function {
        docs,
        name: format!("wait_until_{}", snake_case(&waiter.name)),
        is_async: true,
        receiver: true,
        params: vec![
            Param::new("input", TypePath::parse(VALUE)),
            Param::new("options", TypePath::parse(WAITER_OPTIONS)),
        ],
        ret: Some(
            TypePath::local("Result")
                .generic(TypePath::parse(VALUE))
                .generic(TypePath::parse(WAITER_ERROR)),
        ),
        body: vec![
            Stmt::Let {
                name: "waiter".into(),
                value: Expr::self_field("inner")
                    .method(
                        "waiter",
                        vec![Expr::str(operation.name()), Expr::str(&waiter.name)],
                    )
                    .tried(),
            },
            Stmt::Tail(
                Expr::ident("waiter")
                    .method("wait", vec![Expr::ident("input"), Expr::ident("options")])
                    .awaited(),
            ),
        ],
    }
}

fn paginator_fn(operation: &OperationPlan) -> Function {
    Function {
        docs: vec![format!(
            "Returns a paginator walking every page of `{}`.",
            operation.name()
        )],
        name: format!("{}_paginator", snake_case(operation.name())),
        is_async: false,
        receiver: true,
        params: vec![
            Param::new("input", TypePath::parse(VALUE)),
            Param::new("options", TypePath::parse(PAGINATOR_OPTIONS)),
        ],
        ret: Some(
            TypePath::local("Result")
                .generic(TypePath::parse(PAGINATOR))
                .generic(TypePath::parse(PAGINATOR_ERROR)),
        ),
        body: vec![Stmt::Tail(Expr::self_field("inner").method(
            "paginator",
            vec![
                Expr::str(operation.name()),
                Expr::ident("input"),
                Expr::ident("options"),
            ],
        ))],
    }
}

/// Converts a `PascalCase` name to `snake_case`, keeping acronyms together.
///
/// ```
/// use hermes_codegen::emit::snake_case;
///
/// assert_eq!(snake_case("GetObject"), "get_object");
/// assert_eq!(snake_case("DescribeDBInstances"), "describe_db_instances");
/// assert_eq!(snake_case("ListV2Items"), "list_v2_items");
/// ```
#[must_use]
pub fn snake_case(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);
    for (i, c) in chars.iter().enumerate() {
        if !c.is_ascii_alphanumeric() {
            if !out.ends_with('_') && !out.is_empty() {
                out.push('_');
            }
            continue;
        }
        if c.is_ascii_uppercase() && i > 0 {
            let prev = chars[i - 1];
            let next_lower = chars.get(i + 1).is_some_and(char::is_ascii_lowercase);
            let boundary = prev.is_ascii_lowercase()
                || prev.is_ascii_digit()
                || (prev.is_ascii_uppercase() && next_lower);
            if boundary && !out.ends_with('_') {
                out.push('_');
            }
        }
        out.push(c.to_ascii_lowercase());
    }
    out
}
