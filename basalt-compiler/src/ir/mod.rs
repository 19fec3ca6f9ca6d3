pub mod builder;
pub mod ir;
pub mod ir_generator;
pub mod opt;
pub mod symbol_table;

pub use builder::Builder;
pub use ir::{
    BasicBlock, BlockRef, FuncRef, Function, Instr, IrType, Linkage, Module, ValueData, ValueKind,
    ValueRef,
};
pub use symbol_table::SymbolTable;
