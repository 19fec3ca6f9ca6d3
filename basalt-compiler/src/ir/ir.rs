//! The SSA intermediate representation handed to the backend.
//!
//! A `Module` owns an arena of values addressed by `ValueRef`, a list of
//! functions made of labelled basic blocks, and the byte-string globals.
//! Instructions are values; a block is an ordered list of instruction
//! values. `to_lines` prints the module in an LLVM-flavoured textual form
//! used by tests and debugging.

use std::collections::{HashMap, HashSet};
use std::fmt;

/// Handle to a value in the module's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ValueRef(pub(crate) u32);

/// Handle to a function of the module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FuncRef(pub(crate) u32);

/// Handle to a basic block within a function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockRef {
    pub(crate) func: FuncRef,
    pub(crate) index: u32,
}

impl BlockRef {
    pub fn function(&self) -> FuncRef {
        self.func
    }
}

/// Backend types.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IrType {
    Void,
    Int { bits: u32 },
    Half,
    Float,
    Double,
    Ptr(Box<IrType>),
    Array { element: Box<IrType>, length: u64 },
    Function { params: Vec<IrType>, ret: Box<IrType> },
}

impl IrType {
    pub fn ptr_to(pointee: IrType) -> Self {
        IrType::Ptr(Box::new(pointee))
    }

    pub fn is_void(&self) -> bool {
        matches!(self, IrType::Void)
    }

    pub fn pointee(&self) -> Option<&IrType> {
        match self {
            IrType::Ptr(pointee) => Some(pointee),
            _ => None,
        }
    }
}

impl fmt::Display for IrType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IrType::Void => write!(f, "void"),
            IrType::Int { bits } => write!(f, "i{bits}"),
            IrType::Half => write!(f, "half"),
            IrType::Float => write!(f, "float"),
            IrType::Double => write!(f, "double"),
            IrType::Ptr(pointee) => write!(f, "{pointee}*"),
            IrType::Array { element, length } => write!(f, "[{length} x {element}]"),
            IrType::Function { params, ret } => {
                write!(f, "{ret} (")?;
                for (i, p) in params.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{p}")?;
                }
                write!(f, ")")
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Linkage {
    External,
    Internal,
}

impl fmt::Display for Linkage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Linkage::External => write!(f, "external"),
            Linkage::Internal => write!(f, "internal"),
        }
    }
}

/// An instruction; each one is a value in the arena.
#[derive(Debug, Clone, PartialEq)]
pub enum Instr {
    Alloca {
        allocated: IrType,
        align: u32,
        name: String,
    },
    Load {
        ptr: ValueRef,
    },
    Store {
        value: ValueRef,
        ptr: ValueRef,
    },
    /// Inbounds element-address computation.
    GetElementPtr {
        ptr: ValueRef,
        indices: Vec<ValueRef>,
    },
    Add {
        lhs: ValueRef,
        rhs: ValueRef,
    },
    Sub {
        lhs: ValueRef,
        rhs: ValueRef,
    },
    Mul {
        lhs: ValueRef,
        rhs: ValueRef,
    },
    SDiv {
        lhs: ValueRef,
        rhs: ValueRef,
    },
    Call {
        callee: ValueRef,
        arguments: Vec<ValueRef>,
    },
    Ret {
        value: Option<ValueRef>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum ValueKind {
    ConstInt { value: i64 },
    ConstFloat { value: f64 },
    ConstNull,
    GlobalString { index: usize },
    Function(FuncRef),
    Argument { func: FuncRef, index: usize },
    Instr(Instr),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValueData {
    pub ty: IrType,
    pub kind: ValueKind,
}

#[derive(Debug, Clone)]
pub struct BasicBlock {
    pub label: String,
    pub instrs: Vec<ValueRef>,
}

#[derive(Debug, Clone)]
pub struct Function {
    pub name: String,
    pub linkage: Linkage,
    pub param_types: Vec<IrType>,
    pub param_names: Vec<String>,
    pub return_type: IrType,
    pub blocks: Vec<BasicBlock>,
    /// The function's own value in the arena.
    pub value: ValueRef,
    /// Incoming-argument values, one per parameter.
    pub args: Vec<ValueRef>,
}

/// A lowered compilation unit.
#[derive(Debug, Clone, Default)]
pub struct Module {
    pub(crate) values: Vec<ValueData>,
    pub(crate) functions: Vec<Function>,
    pub(crate) strings: Vec<Vec<u8>>,
}

impl Module {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push_value(&mut self, data: ValueData) -> ValueRef {
        let r = ValueRef(self.values.len() as u32);
        self.values.push(data);
        r
    }

    pub fn value(&self, v: ValueRef) -> &ValueData {
        &self.values[v.0 as usize]
    }

    pub(crate) fn value_mut(&mut self, v: ValueRef) -> &mut ValueData {
        &mut self.values[v.0 as usize]
    }

    pub fn type_of(&self, v: ValueRef) -> &IrType {
        &self.value(v).ty
    }

    pub fn functions(&self) -> &[Function] {
        &self.functions
    }

    pub fn function(&self, f: FuncRef) -> &Function {
        &self.functions[f.0 as usize]
    }

    pub(crate) fn function_mut(&mut self, f: FuncRef) -> &mut Function {
        &mut self.functions[f.0 as usize]
    }

    /// Look a function up by name.
    pub fn get_function(&self, name: &str) -> Option<FuncRef> {
        self.functions
            .iter()
            .position(|f| f.name == name)
            .map(|i| FuncRef(i as u32))
    }

    pub fn global_strings(&self) -> &[Vec<u8>] {
        &self.strings
    }

    /// If `v` is a function value, its handle.
    pub fn as_function(&self, v: ValueRef) -> Option<FuncRef> {
        match self.value(v).kind {
            ValueKind::Function(f) => Some(f),
            _ => None,
        }
    }

    /// If `v` is a load instruction, the address it loads from.
    pub fn load_source(&self, v: ValueRef) -> Option<ValueRef> {
        match self.value(v).kind {
            ValueKind::Instr(Instr::Load { ptr }) => Some(ptr),
            _ => None,
        }
    }

    /// Whether `v` is a return instruction.
    pub fn is_return(&self, v: ValueRef) -> bool {
        matches!(self.value(v).kind, ValueKind::Instr(Instr::Ret { .. }))
    }

    pub fn to_lines(&self) -> Vec<String> {
        let mut out = Vec::new();

        for (i, bytes) in self.strings.iter().enumerate() {
            out.push(format!(
                "@.str.{} = constant [{} x i8] c\"{}\"",
                i,
                bytes.len(),
                escape_bytes(bytes)
            ));
        }

        for function in &self.functions {
            if !out.is_empty() {
                out.push(String::new());
            }
            let names = self.local_names(function);

            let params = function
                .param_types
                .iter()
                .zip(function.args.iter())
                .map(|(ty, arg)| format!("{ty} {}", names[arg]))
                .collect::<Vec<_>>()
                .join(", ");
            out.push(format!(
                "define {} {} @{}({}) {{",
                function.linkage, function.return_type, function.name, params
            ));

            for block in &function.blocks {
                out.push(format!("{}:", block.label));
                for &v in &block.instrs {
                    out.push(format!("  {}", self.instr_line(v, &names)));
                }
            }
            out.push("}".to_string());
        }

        out
    }

    /// Assign printable names to the argument and instruction values of one
    /// function: arguments and named allocas keep their source names where
    /// unique, everything else numbers off as `%tN`.
    fn local_names(&self, function: &Function) -> HashMap<ValueRef, String> {
        let mut names = HashMap::new();
        let mut used = HashSet::new();
        let mut temp = 0usize;

        let mut assign = |v: ValueRef,
                          wanted: Option<&str>,
                          names: &mut HashMap<ValueRef, String>,
                          used: &mut HashSet<String>,
                          temp: &mut usize| {
            let name = match wanted {
                Some(w) if !w.is_empty() && !used.contains(w) => w.to_string(),
                _ => {
                    let t = format!("t{temp}");
                    *temp += 1;
                    t
                }
            };
            used.insert(name.clone());
            names.insert(v, format!("%{name}"));
        };

        for (i, &arg) in function.args.iter().enumerate() {
            let wanted = function.param_names.get(i).map(String::as_str);
            assign(arg, wanted, &mut names, &mut used, &mut temp);
        }
        for block in &function.blocks {
            for &v in &block.instrs {
                let wanted = match &self.value(v).kind {
                    ValueKind::Instr(Instr::Alloca { name, .. }) => Some(name.as_str()),
                    _ => None,
                };
                assign(v, wanted, &mut names, &mut used, &mut temp);
            }
        }

        names
    }

    fn operand(&self, v: ValueRef, names: &HashMap<ValueRef, String>) -> String {
        match &self.value(v).kind {
            ValueKind::ConstInt { value } => value.to_string(),
            ValueKind::ConstFloat { value } => format!("{value:?}"),
            ValueKind::ConstNull => "null".to_string(),
            ValueKind::GlobalString { index } => format!("@.str.{index}"),
            ValueKind::Function(f) => format!("@{}", self.function(*f).name),
            _ => names.get(&v).cloned().unwrap_or_else(|| "%?".to_string()),
        }
    }

    fn typed_operand(&self, v: ValueRef, names: &HashMap<ValueRef, String>) -> String {
        format!("{} {}", self.type_of(v), self.operand(v, names))
    }

    fn instr_line(&self, v: ValueRef, names: &HashMap<ValueRef, String>) -> String {
        let data = self.value(v);
        let ValueKind::Instr(instr) = &data.kind else {
            return String::new();
        };
        let dest = names.get(&v).cloned().unwrap_or_else(|| "%?".to_string());

        match instr {
            Instr::Alloca {
                allocated, align, ..
            } => {
                if *align > 0 {
                    format!("{dest} = alloca {allocated}, align {align}")
                } else {
                    format!("{dest} = alloca {allocated}")
                }
            }
            Instr::Load { ptr } => format!(
                "{dest} = load {}, {}",
                data.ty,
                self.typed_operand(*ptr, names)
            ),
            Instr::Store { value, ptr } => format!(
                "store {}, {}",
                self.typed_operand(*value, names),
                self.typed_operand(*ptr, names)
            ),
            Instr::GetElementPtr { ptr, indices } => {
                let mut line = format!(
                    "{dest} = getelementptr inbounds {}",
                    self.typed_operand(*ptr, names)
                );
                for &index in indices {
                    line += &format!(", {}", self.typed_operand(index, names));
                }
                line
            }
            Instr::Add { lhs, rhs } => format!(
                "{dest} = add {}, {}",
                self.typed_operand(*lhs, names),
                self.operand(*rhs, names)
            ),
            Instr::Sub { lhs, rhs } => format!(
                "{dest} = sub {}, {}",
                self.typed_operand(*lhs, names),
                self.operand(*rhs, names)
            ),
            Instr::Mul { lhs, rhs } => format!(
                "{dest} = mul {}, {}",
                self.typed_operand(*lhs, names),
                self.operand(*rhs, names)
            ),
            Instr::SDiv { lhs, rhs } => format!(
                "{dest} = sdiv {}, {}",
                self.typed_operand(*lhs, names),
                self.operand(*rhs, names)
            ),
            Instr::Call { callee, arguments } => {
                let args = arguments
                    .iter()
                    .map(|&a| self.typed_operand(a, names))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!(
                    "{dest} = call {} {}({})",
                    data.ty,
                    self.operand(*callee, names),
                    args
                )
            }
            Instr::Ret { value } => match value {
                Some(v) => format!("ret {}", self.typed_operand(*v, names)),
                None => "ret void".to_string(),
            },
        }
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in self.to_lines() {
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}

fn escape_bytes(bytes: &[u8]) -> String {
    let mut out = String::new();
    for &b in bytes {
        if (0x20..0x7f).contains(&b) && b != b'"' && b != b'\\' {
            out.push(b as char);
        } else {
            out += &format!("\\{b:02X}");
        }
    }
    out
}
