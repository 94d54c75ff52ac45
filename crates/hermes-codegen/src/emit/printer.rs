//! Renders the IR as Rust source.

use super::imports;
use super::ir::{Expr, Function, Item, Module, Stmt};
use std::fmt::{self, Write};

/// Header placed at the top of every emitted file.
pub const FILE_HEADER: &str = "// Code generated by hermes-codegen. DO NOT EDIT.";

const INDENT: &str = "    ";

/// Writes modules with four-space indentation.
#[derive(Debug, Default)]
pub struct Printer {
    out: String,
    depth: usize,
}

impl Printer {
    /// Creates an empty printer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Renders a whole module, imports included.
    pub fn render(mut self, module: &Module) -> Result<String, fmt::Error> {
        self.line(FILE_HEADER)?;
        if !module.docs.is_empty() {
            self.blank()?;
            for doc in &module.docs {
                self.doc("//!", doc)?;
            }
        }

        let imports = imports::collect(module);
        if !imports.is_empty() {
            self.blank()?;
            for import in imports {
                self.line(&import)?;
            }
        }

        for item in &module.items {
            self.blank()?;
            self.item(item)?;
        }
        Ok(self.out)
    }

    fn line(&mut self, text: &str) -> fmt::Result {
        for _ in 0..self.depth {
            self.out.push_str(INDENT);
        }
        writeln!(self.out, "{text}")
    }

    fn blank(&mut self) -> fmt::Result {
        writeln!(self.out)
    }

    fn doc(&mut self, marker: &str, text: &str) -> fmt::Result {
        if text.is_empty() {
            self.line(marker)
        } else {
            self.line(&format!("{marker} {text}"))
        }
    }

    fn item(&mut self, item: &Item) -> fmt::Result {
        match item {
            Item::Struct {
                docs,
                derives,
                name,
                fields,
            } => {
                for doc in docs {
                    self.doc("///", doc)?;
                }
                if !derives.is_empty() {
                    self.line(&format!("#[derive({})]", derives.join(", ")))?;
                }
                self.line(&format!("pub struct {name} {{"))?;
                self.depth += 1;
                for field in fields {
                    self.line(&format!("{}: {},", field.name, field.ty))?;
                }
                self.depth -= 1;
                self.line("}")
            }
            Item::Impl { target, functions } => {
                self.line(&format!("impl {target} {{"))?;
                self.depth += 1;
                for (i, function) in functions.iter().enumerate() {
                    if i > 0 {
                        self.blank()?;
                    }
                    self.function(function)?;
                }
                self.depth -= 1;
                self.line("}")
            }
        }
    }

    fn function(&mut self, function: &Function) -> fmt::Result {
        for doc in &function.docs {
            self.doc("///", doc)?;
        }
        let mut params = Vec::with_capacity(function.params.len() + 1);
        if function.receiver {
            params.push("&self".to_string());
        }
        params.extend(function.params.iter().map(|p| format!("{}: {}", p.name, p.ty)));

        let mut signature = String::from("pub ");
        if function.is_async {
            signature.push_str("async ");
        }
        write!(signature, "fn {}({})", function.name, params.join(", "))?;
        if let Some(ret) = &function.ret {
            write!(signature, " -> {ret}")?;
        }
        signature.push_str(" {");
        self.line(&signature)?;

        self.depth += 1;
        for stmt in &function.body {
            let text = match stmt {
                Stmt::Let { name, value } => format!("let {name} = {};", expr(value)),
                Stmt::Expr(value) => format!("{};", expr(value)),
                Stmt::Tail(value) => expr(value),
            };
            self.line(&text)?;
        }
        self.depth -= 1;
        self.line("}")
    }
}

fn args(args: &[Expr]) -> String {
    args.iter().map(expr).collect::<Vec<_>>().join(", ")
}

/// Renders one expression.
#[must_use]
pub fn expr(value: &Expr) -> String {
    match value {
        Expr::Ident(name) => name.clone(),
        Expr::Str(text) => format!("{text:?}"),
        Expr::AssocCall { ty, function, args: a } => format!("{ty}::{function}({})", args(a)),
        Expr::MethodCall {
            receiver,
            method,
            args: a,
        } => format!("{}.{method}({})", expr(receiver), args(a)),
        Expr::Field { receiver, name } => format!("{}.{name}", expr(receiver)),
        Expr::StructLit { name, fields } => {
            let fields = fields
                .iter()
                .map(|(field, value)| match value {
                    Expr::Ident(ident) if ident == field => field.clone(),
                    other => format!("{field}: {}", expr(other)),
                })
                .collect::<Vec<_>>()
                .join(", ");
            format!("{name} {{ {fields} }}")
        }
        Expr::Await(inner) => format!("{}.await", expr(inner)),
        Expr::Try(inner) => format!("{}?", expr(inner)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emit::ir::{FieldDef, Param, TypePath};

    #[test]
    fn test_expression_rendering() {
        let call = Expr::self_field("inner")
            .method(
                "invoke",
                vec![
                    Expr::str("GetJob"),
                    Expr::ident("input"),
                    Expr::assoc(TypePath::parse("hermes_client::InvokeOptions"), "default", vec![]),
                ],
            )
            .awaited()
            .tried();
        assert_eq!(
            expr(&call),
            r#"self.inner.invoke("GetJob", input, InvokeOptions::default()).await?"#
        );

        let lit = Expr::StructLit {
            name: "Self".into(),
            fields: vec![
                ("inner".into(), Expr::ident("inner")),
                ("name".into(), Expr::str("x")),
            ],
        };
        assert_eq!(expr(&lit), r#"Self { inner, name: "x" }"#);
    }

    #[test]
    fn test_module_rendering() {
        let module = Module {
            path: "crate::demo".into(),
            docs: vec!["Demo.".into()],
            items: vec![
                Item::Struct {
                    docs: vec!["A client.".into()],
                    derives: vec!["Debug".into(), "Clone".into()],
                    name: "Demo".into(),
                    fields: vec![FieldDef {
                        name: "inner".into(),
                        ty: TypePath::parse("hermes_client::Client"),
                    }],
                },
                Item::Impl {
                    target: "Demo".into(),
                    functions: vec![Function {
                        name: "new".into(),
                        params: vec![Param::new("inner", TypePath::parse("hermes_client::Client"))],
                        ret: Some(TypePath::local("Self")),
                        body: vec![Stmt::Tail(Expr::StructLit {
                            name: "Self".into(),
                            fields: vec![("inner".into(), Expr::ident("inner"))],
                        })],
                        ..Function::default()
                    }],
                },
            ],
        };

        let expected = "\
// Code generated by hermes-codegen. DO NOT EDIT.

//! Demo.

use hermes_client::Client;

/// A client.
#[derive(Debug, Clone)]
pub struct Demo {
    inner: Client,
}

impl Demo {
    pub fn new(inner: Client) -> Self {
        Self { inner }
    }
}
";
        assert_eq!(Printer::new().render(&module).unwrap(), expected);
    }
}
