//! Source emission.
//!
//! Generated source is built as a structured [`Module`] and rendered by the
//! [`Printer`]; imports are derived from the IR rather than written by hand.

mod client;
pub mod imports;
mod ir;
mod printer;

pub use client::{snake_case, ClientEmitter};
pub use ir::{Expr, FieldDef, Function, Item, Module, Param, Stmt, TypePath};
pub use printer::{Printer, FILE_HEADER};
