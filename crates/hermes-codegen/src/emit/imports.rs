//! Import collection.

use super::ir::Module;
use std::collections::{BTreeMap, BTreeSet};

/// Returns the `use` lines a module needs.
///
/// Every referenced type outside the module itself is imported once. Lines
/// are sorted by module and types sharing a module are grouped.
#[must_use]
pub fn collect(module: &Module) -> Vec<String> {
    let mut by_module: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    for item in &module.items {
        item.visit_types(&mut |ty| {
            let path = ty.module();
            if path.is_empty() || path == module.path {
                return;
            }
            by_module
                .entry(path)
                .or_default()
                .insert(ty.name().to_string());
        });
    }

    by_module
        .into_iter()
        .map(|(path, names)| match names.len() {
            1 => format!("use {path}::{};", names.into_iter().collect::<String>()),
            _ => format!(
                "use {path}::{{{}}};",
                names.into_iter().collect::<Vec<_>>().join(", ")
            ),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emit::ir::{Expr, FieldDef, Function, Item, Param, Stmt, TypePath};

    #[test]
    fn test_imports_are_grouped_sorted_and_deduplicated() {
        let value = TypePath::parse("hermes_core::Value");
        let module = Module {
            path: "crate::jobs".into(),
            docs: Vec::new(),
            items: vec![
                Item::Struct {
                    docs: Vec::new(),
                    derives: Vec::new(),
                    name: "JobsClient".into(),
                    fields: vec![FieldDef {
                        name: "inner".into(),
                        ty: TypePath::parse("hermes_client::Client"),
                    }],
                },
                Item::Impl {
                    target: "JobsClient".into(),
                    functions: vec![Function {
                        name: "get".into(),
                        receiver: true,
                        params: vec![Param::new("input", value.clone())],
                        ret: Some(
                            TypePath::local("Result")
                                .generic(value)
                                .generic(TypePath::parse("hermes_core::OperationError")),
                        ),
                        body: vec![Stmt::Tail(Expr::assoc(
                            TypePath::parse("hermes_client::InvokeOptions"),
                            "default",
                            Vec::new(),
                        ))],
                        ..Function::default()
                    }],
                },
                Item::Struct {
                    docs: Vec::new(),
                    derives: Vec::new(),
                    name: "Local".into(),
                    fields: vec![FieldDef {
                        name: "sibling".into(),
                        ty: TypePath::parse("crate::jobs::Sibling"),
                    }],
                },
            ],
        };

        assert_eq!(
            collect(&module),
            [
                "use hermes_client::{Client, InvokeOptions};",
                "use hermes_core::{OperationError, Value};",
            ]
        );
    }
}
