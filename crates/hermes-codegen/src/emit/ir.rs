//! Structured representation of emitted Rust source.
//!
//! Types are always [`TypePath`]s and values always [`Expr`]s, so the import
//! pass can see every referenced type.

use std::fmt;

/// A possibly generic type, e.g. `hermes_core::Value` or `Result<A, B>`.
///
/// ```
/// use hermes_codegen::emit::TypePath;
///
/// let ty = TypePath::local("Result")
///     .generic(TypePath::parse("hermes_client::Output"))
///     .generic(TypePath::parse("hermes_core::OperationError"));
/// assert_eq!(ty.to_string(), "Result<Output, OperationError>");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypePath {
    module: Vec<String>,
    name: String,
    generics: Vec<TypePath>,
}

impl TypePath {
    /// Parses a `::`-separated path; the last segment is the type name.
    #[must_use]
    pub fn parse(path: &str) -> Self {
        let mut segments: Vec<String> = path.split("::").map(str::to_string).collect();
        let name = segments.pop().unwrap_or_default();
        Self {
            module: segments,
            name,
            generics: Vec::new(),
        }
    }

    /// A type that needs no import (prelude or same module).
    #[must_use]
    pub fn local(name: impl Into<String>) -> Self {
        Self {
            module: Vec::new(),
            name: name.into(),
            generics: Vec::new(),
        }
    }

    /// Appends a generic argument.
    #[must_use]
    pub fn generic(mut self, argument: TypePath) -> Self {
        self.generics.push(argument);
        self
    }

    /// Returns the bare type name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the module path, empty for local types.
    #[must_use]
    pub fn module(&self) -> String {
        self.module.join("::")
    }

    /// Visits this type and every generic argument, depth first.
    pub fn visit(&self, f: &mut impl FnMut(&TypePath)) {
        f(self);
        for argument in &self.generics {
            argument.visit(f);
        }
    }
}

impl fmt::Display for TypePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if let Some((first, rest)) = self.generics.split_first() {
            write!(f, "<{first}")?;
            for argument in rest {
                write!(f, ", {argument}")?;
            }
            f.write_str(">")?;
        }
        Ok(())
    }
}

/// An expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    /// A bare identifier or `self`.
    Ident(String),
    /// A string literal.
    Str(String),
    /// `Type::function(args)`.
    AssocCall {
        /// The type.
        ty: TypePath,
        /// Associated function name.
        function: String,
        /// Arguments.
        args: Vec<Expr>,
    },
    /// `receiver.method(args)`.
    MethodCall {
        /// Receiver expression.
        receiver: Box<Expr>,
        /// Method name.
        method: String,
        /// Arguments.
        args: Vec<Expr>,
    },
    /// `receiver.field`.
    Field {
        /// Receiver expression.
        receiver: Box<Expr>,
        /// Field name.
        name: String,
    },
    /// `Name { field: value }`, shorthand when the value is the same identifier.
    StructLit {
        /// Struct name, usually `Self`.
        name: String,
        /// Field initializers.
        fields: Vec<(String, Expr)>,
    },
    /// `expr.await`.
    Await(Box<Expr>),
    /// `expr?`.
    Try(Box<Expr>),
}

impl Expr {
    /// Creates an identifier.
    #[must_use]
    pub fn ident(name: impl Into<String>) -> Self {
        Self::Ident(name.into())
    }

    /// Creates a string literal.
    #[must_use]
    pub fn str(value: impl Into<String>) -> Self {
        Self::Str(value.into())
    }

    /// `self.field`.
    #[must_use]
    pub fn self_field(name: impl Into<String>) -> Self {
        Self::Field {
            receiver: Box::new(Self::ident("self")),
            name: name.into(),
        }
    }

    /// `Type::function(args)`.
    #[must_use]
    pub fn assoc(ty: TypePath, function: impl Into<String>, args: Vec<Expr>) -> Self {
        Self::AssocCall {
            ty,
            function: function.into(),
            args,
        }
    }

    /// `self.method(args)`.
    #[must_use]
    pub fn method(self, method: impl Into<String>, args: Vec<Expr>) -> Self {
        Self::MethodCall {
            receiver: Box::new(self),
            method: method.into(),
            args,
        }
    }

    /// `self.await`.
    #[must_use]
    pub fn awaited(self) -> Self {
        Self::Await(Box::new(self))
    }

    /// `self?`.
    #[must_use]
    pub fn tried(self) -> Self {
        Self::Try(Box::new(self))
    }

    /// Visits every type the expression references.
    pub fn visit_types(&self, f: &mut impl FnMut(&TypePath)) {
        match self {
            Self::Ident(_) | Self::Str(_) => {}
            Self::AssocCall { ty, args, .. } => {
                ty.visit(f);
                args.iter().for_each(|arg| arg.visit_types(f));
            }
            Self::MethodCall { receiver, args, .. } => {
                receiver.visit_types(f);
                args.iter().for_each(|arg| arg.visit_types(f));
            }
            Self::Field { receiver, .. } => receiver.visit_types(f),
            Self::StructLit { fields, .. } => {
                fields.iter().for_each(|(_, value)| value.visit_types(f));
            }
            Self::Await(inner) | Self::Try(inner) => inner.visit_types(f),
        }
    }
}

/// A statement inside a function body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stmt {
    /// `let name = value;`
    Let {
        /// Binding name.
        name: String,
        /// Initializer.
        value: Expr,
    },
    /// `expr;`
    Expr(Expr),
    /// Trailing expression without a semicolon.
    Tail(Expr),
}

impl Stmt {
    fn expr(&self) -> &Expr {
        match self {
            Self::Let { value, .. } => value,
            Self::Expr(expr) | Self::Tail(expr) => expr,
        }
    }
}

/// A function parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    /// Parameter name.
    pub name: String,
    /// Parameter type.
    pub ty: TypePath,
}

impl Param {
    /// Creates a parameter.
    #[must_use]
    pub fn new(name: impl Into<String>, ty: TypePath) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// A free or associated function.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Function {
    /// Doc comment lines.
    pub docs: Vec<String>,
    /// Function name.
    pub name: String,
    /// `async fn`.
    pub is_async: bool,
    /// Takes `&self`.
    pub receiver: bool,
    /// Parameters after the receiver.
    pub params: Vec<Param>,
    /// Return type; `None` for `()`.
    pub ret: Option<TypePath>,
    /// Body statements.
    pub body: Vec<Stmt>,
}

/// A struct field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDef {
    /// Field name.
    pub name: String,
    /// Field type.
    pub ty: TypePath,
}

/// A top-level item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Item {
    /// `pub struct Name { fields }`.
    Struct {
        /// Doc comment lines.
        docs: Vec<String>,
        /// Derived traits.
        derives: Vec<String>,
        /// Struct name.
        name: String,
        /// Private fields.
        fields: Vec<FieldDef>,
    },
    /// `impl Target { functions }`.
    Impl {
        /// Implementing type name.
        target: String,
        /// Public functions.
        functions: Vec<Function>,
    },
}

impl Item {
    /// Visits every type the item references.
    pub fn visit_types(&self, f: &mut impl FnMut(&TypePath)) {
        match self {
            Self::Struct { fields, .. } => fields.iter().for_each(|field| field.ty.visit(f)),
            Self::Impl { functions, .. } => {
                for function in functions {
                    function.params.iter().for_each(|param| param.ty.visit(f));
                    if let Some(ret) = &function.ret {
                        ret.visit(f);
                    }
                    function.body.iter().for_each(|stmt| stmt.expr().visit_types(f));
                }
            }
        }
    }
}

/// One emitted source file.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Module {
    /// Module path of the file itself, e.g. `crate::jobs`.
    pub path: String,
    /// Inner doc comment lines.
    pub docs: Vec<String>,
    /// Items in order.
    pub items: Vec<Item>,
}
