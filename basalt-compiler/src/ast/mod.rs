//! The abstract syntax tree produced by the parser.
//!
//! Statements, expressions and types are closed enums; every variant records
//! the token that began its production. `render` produces the indented debug
//! tree used for golden comparisons, and is deliberately free of source
//! positions.

pub mod eval;
pub mod expr;
pub mod stmt;
pub mod types;

pub use eval::EvalValue;
pub use expr::{BinaryOp, Expr, UnaryOp};
pub use stmt::{Stmt, VariableDeclaration};
pub use types::{promote_arithmetic, Primitive, Type};

/// Indentation prefix for one level of the rendered tree.
pub(crate) fn tree_prefix(depth: usize) -> String {
    "    ".repeat(depth)
}
