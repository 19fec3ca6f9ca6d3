//! IR optimizations.
//!
//! A small framework for running per-function passes over a module. One
//! pass is requested after every lowered function body.

use super::ir::{FuncRef, Instr, Module, ValueKind, ValueRef};
use log::trace;

/// A per-function optimization pass.
pub trait FunctionPass {
    fn run(&mut self, module: &mut Module, func: FuncRef);
}

/// Manages and executes a sequence of function passes.
pub struct PassManager {
    passes: Vec<Box<dyn FunctionPass>>,
}

impl PassManager {
    pub fn new() -> Self {
        Self { passes: Vec::new() }
    }

    pub fn add_pass(&mut self, pass: Box<dyn FunctionPass>) {
        self.passes.push(pass);
    }

    pub fn run_passes(&mut self, module: &mut Module, func: FuncRef) {
        for pass in &mut self.passes {
            pass.run(module, func);
        }
    }
}

impl Default for PassManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Folds integer arithmetic over two constant operands into a constant.
pub struct ConstantFolder;

impl ConstantFolder {
    fn fold(module: &Module, v: ValueRef) -> Option<i64> {
        let ValueKind::Instr(instr) = &module.value(v).kind else {
            return None;
        };
        let (op, lhs, rhs): (fn(i64, i64) -> Option<i64>, _, _) = match instr {
            Instr::Add { lhs, rhs } => (i64::checked_add, *lhs, *rhs),
            Instr::Sub { lhs, rhs } => (i64::checked_sub, *lhs, *rhs),
            Instr::Mul { lhs, rhs } => (i64::checked_mul, *lhs, *rhs),
            Instr::SDiv { lhs, rhs } => (
                |a, b| if b == 0 { None } else { a.checked_div(b) },
                *lhs,
                *rhs,
            ),
            _ => return None,
        };
        let l = const_int(module, lhs)?;
        let r = const_int(module, rhs)?;
        op(l, r)
    }
}

fn const_int(module: &Module, v: ValueRef) -> Option<i64> {
    match module.value(v).kind {
        ValueKind::ConstInt { value } => Some(value),
        _ => None,
    }
}

impl FunctionPass for ConstantFolder {
    fn run(&mut self, module: &mut Module, func: FuncRef) {
        let mut folded = 0usize;
        let block_count = module.function(func).blocks.len();

        for bi in 0..block_count {
            let instrs = module.function(func).blocks[bi].instrs.clone();
            let mut kept = Vec::with_capacity(instrs.len());

            for v in instrs {
                match Self::fold(module, v) {
                    Some(value) => {
                        module.value_mut(v).kind = ValueKind::ConstInt { value };
                        folded += 1;
                    }
                    None => kept.push(v),
                }
            }

            module.function_mut(func).blocks[bi].instrs = kept;
        }

        if folded > 0 {
            trace!(
                "constant folding replaced {folded} instruction(s) in `{}`",
                module.function(func).name
            );
        }
    }
}

/// Run the default pass pipeline over one function.
pub fn optimize_function(module: &mut Module, func: FuncRef) {
    let mut pm = PassManager::new();
    pm.add_pass(Box::new(ConstantFolder));
    pm.run_passes(module, func);
}
