//! Front-end and IR lowering core for the Basalt language.
//!
//! The pipeline runs `token sequence → Parser → AST → preprocess → lower →
//! SSA module`. Parse errors accumulate and are reported together; lowering
//! errors are fatal to the compilation unit.

pub mod ast;
pub mod diagnostics;
pub mod frontend;
pub mod ir;

use diagnostics::Diagnostic;
use frontend::lexer::Token;
use thiserror::Error;

pub use ir::ir_generator::{lower, Lowered, Lowerer, LoweredUnit};

/// What went wrong during lowering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SemanticErrorKind {
    /// A name with no binding in any live symbol frame.
    Unbound,
    /// A pointer-carrying declaration outside an `unsafe` region.
    UnsafeOutsideUnsafe,
    /// A reference-typed declaration with no initializer.
    ReferenceWithoutInit,
    /// Reserved: assignment through a const-qualified left-hand side.
    WriteToConst,
    /// A call whose callee is not a function.
    NotCallable,
    /// `&` applied to something that is not an lvalue.
    NotLvalue,
    /// A return statement disagreeing with the function's return type.
    ReturnMismatch,
    /// A return statement outside any function body.
    ReturnOutsideFunction,
    /// An array initializer list used as an ordinary expression.
    ArrayInitOutsidePlace,
}

#[derive(Error, Debug)]
pub enum CompileError {
    #[error("Lexical error: {0}")]
    Lexical(#[from] frontend::lexer::LexicalError),

    #[error("Parsing failed with {} error(s)", .errors.len())]
    Parse { errors: Vec<Diagnostic> },

    #[error("{message}")]
    Semantic {
        kind: SemanticErrorKind,
        token: Token,
        message: String,
    },
}

/// Lex and parse `source` into its AST.
pub fn parse_to_ast(source: &str) -> Result<ast::Stmt, CompileError> {
    let tokens = frontend::lexer::lex(source)?;
    let mut parser = frontend::parser::Parser::new(tokens);
    match parser.parse() {
        Some(root) => Ok(root),
        None => Err(CompileError::Parse {
            errors: parser.take_errors(),
        }),
    }
}

/// Compile `source` all the way to the SSA module.
pub fn compile_to_ir(source: &str) -> Result<LoweredUnit, CompileError> {
    let root = parse_to_ast(source)?;
    ir::ir_generator::lower(&root)
}
