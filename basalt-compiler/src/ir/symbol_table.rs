use super::ir::ValueRef;
use std::collections::HashMap;

/// A stack of lexical frames mapping names to lowered addresses.
///
/// The root frame exists for the whole lowering run; `Scope` lowering pushes
/// and pops one frame per brace pair. Lookup walks from the innermost frame
/// outward.
#[derive(Debug, Clone)]
pub struct SymbolTable {
    frames: Vec<HashMap<String, ValueRef>>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self {
            frames: vec![HashMap::new()],
        }
    }

    pub fn push_frame(&mut self) {
        self.frames.push(HashMap::new());
    }

    pub fn pop_frame(&mut self) {
        debug_assert!(self.frames.len() > 1, "root frame popped");
        self.frames.pop();
    }

    /// Number of live frames, root included.
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Bind `name` in the innermost frame, shadowing outer bindings.
    pub fn insert(&mut self, name: impl Into<String>, value: ValueRef) {
        if let Some(frame) = self.frames.last_mut() {
            frame.insert(name.into(), value);
        }
    }

    /// Drop `name` from the innermost frame only.
    pub fn remove(&mut self, name: &str) {
        if let Some(frame) = self.frames.last_mut() {
            frame.remove(name);
        }
    }

    pub fn lookup(&self, name: &str) -> Option<ValueRef> {
        self.frames
            .iter()
            .rev()
            .find_map(|frame| frame.get(name).copied())
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}
