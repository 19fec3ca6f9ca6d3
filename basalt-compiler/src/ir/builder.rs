//! The instruction builder the lowerer drives.
//!
//! The builder owns the module under construction plus one piece of ambient
//! state, the insertion point. Every `build_*` call appends an instruction
//! value at the insertion point and returns its handle.

use super::ir::{
    BasicBlock, BlockRef, FuncRef, Function, Instr, IrType, Linkage, Module, ValueData, ValueKind,
    ValueRef,
};

#[derive(Debug, Default)]
pub struct Builder {
    module: Module,
    position: Option<BlockRef>,
}

impl Builder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn module(&self) -> &Module {
        &self.module
    }

    pub fn module_mut(&mut self) -> &mut Module {
        &mut self.module
    }

    pub fn finish(self) -> Module {
        self.module
    }

    // --- Functions and blocks ---

    /// Create a function and its argument values, or return the existing
    /// handle when a function of the same name and signature is already
    /// present. Re-registration refreshes the parameter names.
    pub fn add_function(
        &mut self,
        name: &str,
        param_names: Vec<String>,
        param_types: Vec<IrType>,
        return_type: IrType,
        linkage: Linkage,
    ) -> ValueRef {
        if let Some(existing) = self.module.get_function(name) {
            let f = self.module.function(existing);
            if f.param_types == param_types && f.return_type == return_type {
                let value = f.value;
                self.module.function_mut(existing).param_names = param_names;
                return value;
            }
        }

        let func = FuncRef(self.module.functions.len() as u32);
        let ty = IrType::Function {
            params: param_types.clone(),
            ret: Box::new(return_type.clone()),
        };
        let value = self.module.push_value(ValueData {
            ty,
            kind: ValueKind::Function(func),
        });
        let args = param_types
            .iter()
            .enumerate()
            .map(|(index, ty)| {
                self.module.push_value(ValueData {
                    ty: ty.clone(),
                    kind: ValueKind::Argument { func, index },
                })
            })
            .collect();

        self.module.functions.push(Function {
            name: name.to_string(),
            linkage,
            param_types,
            param_names,
            return_type,
            blocks: Vec::new(),
            value,
            args,
        });
        value
    }

    pub fn append_block(&mut self, func: FuncRef, label: &str) -> BlockRef {
        let function = self.module.function_mut(func);
        let index = function.blocks.len() as u32;
        function.blocks.push(BasicBlock {
            label: label.to_string(),
            instrs: Vec::new(),
        });
        BlockRef { func, index }
    }

    pub fn position_at_end(&mut self, block: BlockRef) {
        self.position = Some(block);
    }

    pub fn clear_position(&mut self) {
        self.position = None;
    }

    pub fn insertion_block(&self) -> Option<BlockRef> {
        self.position
    }

    /// The function owning the current insertion point.
    pub fn current_function(&self) -> Option<FuncRef> {
        self.position.map(|b| b.func)
    }

    pub fn return_type_of(&self, func: FuncRef) -> IrType {
        self.module.function(func).return_type.clone()
    }

    pub fn func_value(&self, func: FuncRef) -> ValueRef {
        self.module.function(func).value
    }

    pub fn func_arg(&self, func: FuncRef, index: usize) -> Option<ValueRef> {
        self.module.function(func).args.get(index).copied()
    }

    // --- Constants and globals ---

    pub fn const_int(&mut self, bits: u32, value: i64) -> ValueRef {
        self.module.push_value(ValueData {
            ty: IrType::Int { bits },
            kind: ValueKind::ConstInt { value },
        })
    }

    pub fn const_i8(&mut self, value: i8) -> ValueRef {
        self.const_int(8, i64::from(value))
    }

    pub fn const_i32(&mut self, value: i32) -> ValueRef {
        self.const_int(32, i64::from(value))
    }

    pub fn const_i64(&mut self, value: i64) -> ValueRef {
        self.const_int(64, value)
    }

    /// The all-zero constant of `ty`.
    pub fn zero_value(&mut self, ty: &IrType) -> ValueRef {
        let kind = match ty {
            IrType::Int { .. } => ValueKind::ConstInt { value: 0 },
            IrType::Half | IrType::Float | IrType::Double => ValueKind::ConstFloat { value: 0.0 },
            _ => ValueKind::ConstNull,
        };
        self.module.push_value(ValueData {
            ty: ty.clone(),
            kind,
        })
    }

    /// Intern `text` as a NUL-terminated global byte array and return the
    /// address of its first byte.
    pub fn global_string(&mut self, text: &str) -> ValueRef {
        let mut bytes = text.as_bytes().to_vec();
        bytes.push(0);
        let index = self.module.strings.len();
        self.module.strings.push(bytes);
        self.module.push_value(ValueData {
            ty: IrType::ptr_to(IrType::Int { bits: 8 }),
            kind: ValueKind::GlobalString { index },
        })
    }

    // --- Instructions ---

    fn insert(&mut self, ty: IrType, instr: Instr) -> ValueRef {
        let block = self
            .position
            .expect("instruction built with no insertion point");
        let value = self.module.push_value(ValueData {
            ty,
            kind: ValueKind::Instr(instr),
        });
        self.module.function_mut(block.func).blocks[block.index as usize]
            .instrs
            .push(value);
        value
    }

    pub fn build_alloca(&mut self, allocated: IrType, name: &str) -> ValueRef {
        let ty = IrType::ptr_to(allocated.clone());
        self.insert(
            ty,
            Instr::Alloca {
                allocated,
                align: 0,
                name: name.to_string(),
            },
        )
    }

    pub fn set_alignment(&mut self, value: ValueRef, align: u32) {
        if let ValueKind::Instr(Instr::Alloca { align: a, .. }) = &mut self.module.value_mut(value).kind
        {
            *a = align;
        }
    }

    pub fn build_load(&mut self, ptr: ValueRef) -> ValueRef {
        let ty = self
            .module
            .type_of(ptr)
            .pointee()
            .cloned()
            .unwrap_or(IrType::Void);
        self.insert(ty, Instr::Load { ptr })
    }

    pub fn build_store(&mut self, value: ValueRef, ptr: ValueRef) -> ValueRef {
        self.insert(IrType::Void, Instr::Store { value, ptr })
    }

    /// Inbounds element-address computation. The first index steps through
    /// the pointer; each further index steps into the pointed-to aggregate.
    pub fn build_in_bounds_gep(&mut self, ptr: ValueRef, indices: Vec<ValueRef>) -> ValueRef {
        let mut ty = self
            .module
            .type_of(ptr)
            .pointee()
            .cloned()
            .unwrap_or(IrType::Void);
        for _ in 1..indices.len() {
            ty = match ty {
                IrType::Array { element, .. } => *element,
                other => other,
            };
        }
        self.insert(IrType::ptr_to(ty), Instr::GetElementPtr { ptr, indices })
    }

    pub fn build_add(&mut self, lhs: ValueRef, rhs: ValueRef) -> ValueRef {
        let ty = self.module.type_of(lhs).clone();
        self.insert(ty, Instr::Add { lhs, rhs })
    }

    pub fn build_sub(&mut self, lhs: ValueRef, rhs: ValueRef) -> ValueRef {
        let ty = self.module.type_of(lhs).clone();
        self.insert(ty, Instr::Sub { lhs, rhs })
    }

    pub fn build_mul(&mut self, lhs: ValueRef, rhs: ValueRef) -> ValueRef {
        let ty = self.module.type_of(lhs).clone();
        self.insert(ty, Instr::Mul { lhs, rhs })
    }

    pub fn build_sdiv(&mut self, lhs: ValueRef, rhs: ValueRef) -> ValueRef {
        let ty = self.module.type_of(lhs).clone();
        self.insert(ty, Instr::SDiv { lhs, rhs })
    }

    pub fn build_call(&mut self, callee: ValueRef, arguments: Vec<ValueRef>) -> ValueRef {
        let ty = match self.module.type_of(callee) {
            IrType::Function { ret, .. } => (**ret).clone(),
            _ => IrType::Void,
        };
        self.insert(ty, Instr::Call { callee, arguments })
    }

    pub fn build_ret(&mut self, value: ValueRef) -> ValueRef {
        self.insert(IrType::Void, Instr::Ret { value: Some(value) })
    }

    pub fn build_ret_void(&mut self) -> ValueRef {
        self.insert(IrType::Void, Instr::Ret { value: None })
    }

    // --- Probes ---

    pub fn as_function(&self, v: ValueRef) -> Option<FuncRef> {
        self.module.as_function(v)
    }

    pub fn load_source(&self, v: ValueRef) -> Option<ValueRef> {
        self.module.load_source(v)
    }

    pub fn is_return(&self, v: ValueRef) -> bool {
        self.module.is_return(v)
    }
}
