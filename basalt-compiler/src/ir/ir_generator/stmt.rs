use super::context::{Lowered, Lowerer};
use crate::ast::{Expr, Stmt, Type, VariableDeclaration};
use crate::frontend::lexer::Token;
use crate::ir::{opt, Linkage, ValueRef};
use crate::{CompileError, SemanticErrorKind};
use log::debug;

impl Lowerer {
    /// Pre-lowering walk. Registers every function declaration in the
    /// current symbol frame with a backend handle built from its parameter
    /// and return types, so forward references resolve during the emit
    /// pass. Everything else is a structural descent.
    pub fn preprocess_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Block { statements, .. } | Stmt::Scope { statements, .. } => {
                for statement in statements {
                    self.preprocess_stmt(statement);
                }
            }
            Stmt::Expression { expression, .. } => self.preprocess_expr(expression),
            Stmt::VariableDeclaration(decl) => {
                if let Some(initializer) = &decl.initializer {
                    self.preprocess_expr(initializer);
                }
            }
            Stmt::FunctionDeclaration {
                return_type,
                name,
                parameters,
                body,
                ..
            } => self.preprocess_function(return_type, name, parameters, body),
            Stmt::Return { value, .. } => {
                if let Some(expression) = value {
                    self.preprocess_expr(expression);
                }
            }
            Stmt::Unsafe { inner, .. } => self.preprocess_stmt(inner),
        }
    }

    fn preprocess_function(
        &mut self,
        return_type: &Type,
        name: &str,
        parameters: &[VariableDeclaration],
        body: &Stmt,
    ) {
        self.preprocess_stmt(body);
        for parameter in parameters {
            if let Some(initializer) = &parameter.initializer {
                self.preprocess_expr(initializer);
            }
        }

        let param_names = parameters.iter().map(|p| p.name.clone()).collect();
        let param_types = parameters.iter().map(|p| p.ty.lower()).collect();
        let function = self.builder.add_function(
            name,
            param_names,
            param_types,
            return_type.lower(),
            Linkage::External,
        );

        self.symbols.insert(name, function);
    }

    /// Emit IR for one statement, yielding the produced value when there is
    /// one.
    pub fn lower_stmt(&mut self, stmt: &Stmt) -> Result<Option<Lowered>, CompileError> {
        match stmt {
            Stmt::Block { statements, .. } => {
                let mut last = None;
                for statement in statements {
                    last = self.lower_stmt(statement)?;
                }
                Ok(last)
            }
            Stmt::Scope { statements, .. } => self.with_scope(|this| {
                let mut last = None;
                for statement in statements {
                    last = this.lower_stmt(statement)?;
                }
                Ok(last)
            }),
            Stmt::Expression { expression, .. } => Ok(Some(self.lower_expr(expression)?)),
            Stmt::VariableDeclaration(decl) => self.lower_variable_declaration(decl),
            Stmt::FunctionDeclaration {
                token,
                name,
                parameters,
                body,
                ..
            } => self.lower_function_declaration(token, name, parameters, body),
            Stmt::Return { token, value } => self.lower_return(token, value.as_ref()),
            Stmt::Unsafe { token, inner } => {
                if self.in_unsafe_block() {
                    self.warn(token, "Unnecessary unsafe statement");
                    self.lower_stmt(inner)
                } else {
                    self.with_unsafe(|this| this.lower_stmt(inner))
                }
            }
        }
    }

    fn lower_variable_declaration(
        &mut self,
        decl: &VariableDeclaration,
    ) -> Result<Option<Lowered>, CompileError> {
        if !self.in_unsafe_block() && !decl.ty.is_safe() {
            return Err(self.error(
                SemanticErrorKind::UnsafeOutsideUnsafe,
                &decl.token,
                "Unsafe declaration outside of unsafe statement".to_string(),
            ));
        }

        let slot = self.builder.build_alloca(decl.ty.lower(), &decl.name);
        self.builder.set_alignment(slot, 4);

        if matches!(decl.ty, Type::LValueReference { .. }) {
            if decl.initializer.is_none() {
                return Err(self.error(
                    SemanticErrorKind::ReferenceWithoutInit,
                    &decl.token,
                    "Expected initialization value in declaration of reference variable"
                        .to_string(),
                ));
            }
            // Reference binding is unimplemented; the declaration produces
            // nothing and binds no symbol.
            return Ok(None);
        } else if let Some(initializer) = &decl.initializer {
            if let Expr::ArrayInitList { elements, .. } = initializer {
                self.lower_array_init(slot, elements)?;
            } else {
                let value = self.lower_expr(initializer)?;
                self.builder.build_store(value.value, slot);
            }
        }

        self.symbols.insert(decl.name.clone(), slot);
        Ok(Some(Lowered::untyped(slot)))
    }

    /// Store an initializer list into the array behind `dest`, element by
    /// element along contiguous memory. Nested lists recurse at the current
    /// element address. The list's shape is not validated against the
    /// destination type.
    fn lower_array_init(&mut self, dest: ValueRef, elements: &[Expr]) -> Result<(), CompileError> {
        let zero = self.builder.const_i64(0);
        let mut element_ptr = self.builder.build_in_bounds_gep(dest, vec![zero, zero]);

        for (i, element) in elements.iter().enumerate() {
            match element {
                Expr::ArrayInitList {
                    elements: nested, ..
                } => self.lower_array_init(element_ptr, nested)?,
                _ => {
                    let value = self.lower_expr(element)?;
                    self.builder.build_store(value.value, element_ptr);
                }
            }

            if i + 1 < elements.len() {
                let one = self.builder.const_i64(1);
                element_ptr = self.builder.build_in_bounds_gep(element_ptr, vec![one]);
            }
        }

        Ok(())
    }

    fn lower_function_declaration(
        &mut self,
        token: &Token,
        name: &str,
        parameters: &[VariableDeclaration],
        body: &Stmt,
    ) -> Result<Option<Lowered>, CompileError> {
        debug!("lowering function `{name}`");

        let handle = self
            .symbols
            .lookup(name)
            .and_then(|v| self.builder.as_function(v).map(|f| (v, f)));
        let Some((func_value, func)) = handle else {
            return Err(self.error(
                SemanticErrorKind::Unbound,
                token,
                format!("Unbound symbol \"{name}\""),
            ));
        };

        self.with_function(func, |this| {
            let entry = this.builder.append_block(func, "entry");
            this.builder.position_at_end(entry);

            for (index, parameter) in parameters.iter().enumerate() {
                if let Some(arg) = this.builder.func_arg(func, index) {
                    let slot = this.builder.build_alloca(parameter.ty.lower(), &parameter.name);
                    this.builder.build_store(arg, slot);
                    this.symbols.insert(parameter.name.clone(), slot);
                }
            }

            let body_value = this.lower_stmt(body)?;

            let terminated = body_value
                .as_ref()
                .map_or(false, |v| this.builder.is_return(v.value));
            if !terminated {
                let return_type = this.builder.return_type_of(func);
                if return_type.is_void() {
                    this.builder.build_ret_void();
                } else {
                    let null_value = this.builder.zero_value(&return_type);
                    this.builder.build_ret(null_value);
                    this.warn(
                        token,
                        "Expected return statement at the end of non-void returning function \
                         declaration; null value will be returned",
                    );
                }
            }

            opt::optimize_function(this.builder.module_mut(), func);

            for parameter in parameters {
                this.symbols.remove(&parameter.name);
            }

            Ok(Some(Lowered::untyped(func_value)))
        })
    }

    fn lower_return(
        &mut self,
        token: &Token,
        value: Option<&Expr>,
    ) -> Result<Option<Lowered>, CompileError> {
        let Some(func) = self.current_function() else {
            return Err(self.error(
                SemanticErrorKind::ReturnOutsideFunction,
                token,
                "Return statement outside of function body".to_string(),
            ));
        };
        let return_type = self.builder.return_type_of(func);

        match value {
            Some(expression) => {
                if return_type.is_void() {
                    return Err(self.error(
                        SemanticErrorKind::ReturnMismatch,
                        token,
                        "Unexpected value return statement in void function".to_string(),
                    ));
                }
                let lowered = self.lower_expr(expression)?;
                Ok(Some(Lowered::untyped(self.builder.build_ret(lowered.value))))
            }
            None => {
                if !return_type.is_void() {
                    return Err(self.error(
                        SemanticErrorKind::ReturnMismatch,
                        token,
                        "Expected value return statement in non-void returning function"
                            .to_string(),
                    ));
                }
                Ok(Some(Lowered::untyped(self.builder.build_ret_void())))
            }
        }
    }
}
