//! AST to IR lowering.
//!
//! Lowering is a two-pass walk: the preprocess pass registers every function
//! declaration so forward references resolve, then the emit pass produces
//! the SSA module through the builder.

pub mod context;
pub mod expr;
pub mod stmt;

pub use context::{Lowered, Lowerer};

use crate::ast::Stmt;
use crate::diagnostics::Diagnostic;
use crate::ir::Module;
use crate::CompileError;
use log::debug;

/// A lowered compilation unit plus the warnings produced along the way.
#[derive(Debug)]
pub struct LoweredUnit {
    pub module: Module,
    pub warnings: Vec<Diagnostic>,
}

/// Lower one compilation unit.
pub fn lower(root: &Stmt) -> Result<LoweredUnit, CompileError> {
    debug!("lowering compilation unit");

    let mut lowerer = Lowerer::new();
    lowerer.preprocess_stmt(root);
    lowerer.lower_stmt(root)?;

    let (module, warnings) = lowerer.finish();
    Ok(LoweredUnit { module, warnings })
}
