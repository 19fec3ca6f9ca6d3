use crate::ast::Type;
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::frontend::lexer::Token;
use crate::ir::{Builder, FuncRef, Module, SymbolTable, ValueRef};
use crate::{CompileError, SemanticErrorKind};

/// Result of lowering one expression: the produced value, plus the source
/// type it carries when one is known.
#[derive(Debug, Clone)]
pub struct Lowered {
    pub value: ValueRef,
    pub ty: Option<Type>,
}

impl Lowered {
    pub fn untyped(value: ValueRef) -> Self {
        Self { value, ty: None }
    }

    pub fn typed(value: ValueRef, ty: Type) -> Self {
        Self {
            value,
            ty: Some(ty),
        }
    }
}

/// The ambient state of one lowering run: the builder with its insertion
/// point, the symbol-frame stack, the unsafe-region flag, and the function
/// whose body is currently being lowered.
pub struct Lowerer {
    pub builder: Builder,
    pub symbols: SymbolTable,
    in_unsafe_block: bool,
    current_function: Option<FuncRef>,
    diagnostics: Diagnostics,
}

impl Lowerer {
    pub fn new() -> Self {
        Self {
            builder: Builder::new(),
            symbols: SymbolTable::new(),
            in_unsafe_block: false,
            current_function: None,
            diagnostics: Diagnostics::new(),
        }
    }

    pub fn finish(self) -> (Module, Vec<Diagnostic>) {
        let (_, warnings) = self.diagnostics.into_parts();
        (self.builder.finish(), warnings)
    }

    pub fn in_unsafe_block(&self) -> bool {
        self.in_unsafe_block
    }

    pub fn current_function(&self) -> Option<FuncRef> {
        self.current_function
    }

    pub fn warnings(&self) -> &[Diagnostic] {
        self.diagnostics.warnings()
    }

    pub(crate) fn warn(&mut self, token: &Token, message: &str) {
        self.diagnostics
            .add_warning(Diagnostic::new(token.clone(), message));
    }

    pub(crate) fn error(
        &self,
        kind: SemanticErrorKind,
        token: &Token,
        message: String,
    ) -> CompileError {
        CompileError::Semantic {
            kind,
            token: token.clone(),
            message,
        }
    }

    /// Run `f` under a fresh symbol frame. The frame is popped on every exit
    /// path, so a failure inside `f` cannot leave the stack deeper than it
    /// was on entry.
    pub(crate) fn with_scope<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        self.symbols.push_frame();
        let result = f(self);
        self.symbols.pop_frame();
        result
    }

    /// Run `f` with the unsafe-region flag raised, restoring the previous
    /// value afterwards.
    pub(crate) fn with_unsafe<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        let previous = self.in_unsafe_block;
        self.in_unsafe_block = true;
        let result = f(self);
        self.in_unsafe_block = previous;
        result
    }

    /// Run `f` with `func` as the current function.
    pub(crate) fn with_function<R>(&mut self, func: FuncRef, f: impl FnOnce(&mut Self) -> R) -> R {
        let previous = self.current_function.take();
        self.current_function = Some(func);
        let result = f(self);
        self.current_function = previous;
        result
    }
}

impl Default for Lowerer {
    fn default() -> Self {
        Self::new()
    }
}
