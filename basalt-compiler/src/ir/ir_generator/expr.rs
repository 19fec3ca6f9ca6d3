use super::context::{Lowered, Lowerer};
use crate::ast::{promote_arithmetic, BinaryOp, Expr, Primitive, Type, UnaryOp};
use crate::frontend::lexer::Token;
use crate::{CompileError, SemanticErrorKind};

impl Lowerer {
    /// Structural walk matching the statement-side preprocess pass.
    pub fn preprocess_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::IntegerLiteral { .. }
            | Expr::CharacterLiteral { .. }
            | Expr::StringLiteral { .. }
            | Expr::Identifier { .. } => {}
            Expr::Binary { lhs, rhs, .. } => {
                self.preprocess_expr(lhs);
                self.preprocess_expr(rhs);
            }
            Expr::Unary { operand, .. } => self.preprocess_expr(operand),
            Expr::Call {
                callee, arguments, ..
            } => {
                self.preprocess_expr(callee);
                for argument in arguments {
                    self.preprocess_expr(argument);
                }
            }
            Expr::ArrayInitList { elements, .. } => {
                for element in elements {
                    self.preprocess_expr(element);
                }
            }
            Expr::Unsafe { inner, .. } => self.preprocess_expr(inner),
        }
    }

    /// Emit IR for one expression.
    pub fn lower_expr(&mut self, expr: &Expr) -> Result<Lowered, CompileError> {
        match expr {
            Expr::IntegerLiteral { value, .. } => {
                let constant = self.builder.const_i32(*value);
                Ok(Lowered::typed(constant, Type::simple(Primitive::Int)))
            }
            Expr::CharacterLiteral { value, .. } => {
                let constant = self.builder.const_i8(*value as i8);
                Ok(Lowered::typed(constant, Type::simple(Primitive::Char)))
            }
            Expr::StringLiteral { value, .. } => {
                Ok(Lowered::untyped(self.builder.global_string(value)))
            }
            Expr::Identifier { token, name } => {
                let Some(address) = self.symbols.lookup(name) else {
                    return Err(self.error(
                        SemanticErrorKind::Unbound,
                        token,
                        format!("Unbound symbol \"{name}\""),
                    ));
                };
                Ok(Lowered::untyped(self.builder.build_load(address)))
            }
            Expr::Binary { token, op, lhs, rhs } => self.lower_binary(token, *op, lhs, rhs),
            Expr::Unary { token, op, operand } => self.lower_unary(token, *op, operand),
            Expr::Call {
                token,
                callee,
                arguments,
            } => self.lower_call(token, callee, arguments),
            Expr::ArrayInitList { token, .. } => Err(self.error(
                SemanticErrorKind::ArrayInitOutsidePlace,
                token,
                "Expected expression".to_string(),
            )),
            Expr::Unsafe { token, inner } => {
                if self.in_unsafe_block() {
                    self.warn(token, "Unnecessary unsafe expression");
                    self.lower_expr(inner)
                } else {
                    self.with_unsafe(|this| this.lower_expr(inner))
                }
            }
        }
    }

    fn lower_binary(
        &mut self,
        _token: &Token,
        op: BinaryOp,
        lhs: &Expr,
        rhs: &Expr,
    ) -> Result<Lowered, CompileError> {
        let lhs_value = self.lower_expr(lhs)?;
        let rhs_value = self.lower_expr(rhs)?;

        match op {
            BinaryOp::Add => {
                let value = self.builder.build_add(lhs_value.value, rhs_value.value);
                Ok(Lowered {
                    value,
                    ty: arithmetic_type(&lhs_value, &rhs_value),
                })
            }
            BinaryOp::Sub => {
                let value = self.builder.build_sub(lhs_value.value, rhs_value.value);
                Ok(Lowered {
                    value,
                    ty: arithmetic_type(&lhs_value, &rhs_value),
                })
            }
            BinaryOp::Mul => {
                let value = self.builder.build_mul(lhs_value.value, rhs_value.value);
                Ok(Lowered {
                    value,
                    ty: arithmetic_type(&lhs_value, &rhs_value),
                })
            }
            BinaryOp::Div => {
                // Signed division regardless of operand signedness.
                let value = self.builder.build_sdiv(lhs_value.value, rhs_value.value);
                Ok(Lowered {
                    value,
                    ty: arithmetic_type(&lhs_value, &rhs_value),
                })
            }
            BinaryOp::Assign => {
                // A left-hand side that lowered to a load designates the
                // loaded address; write there. Anything else is written to
                // directly.
                let value = match self.builder.load_source(lhs_value.value) {
                    Some(address) => self.builder.build_store(rhs_value.value, address),
                    None => self.builder.build_store(rhs_value.value, lhs_value.value),
                };
                Ok(Lowered {
                    value,
                    ty: lhs_value.ty,
                })
            }
        }
    }

    fn lower_unary(
        &mut self,
        token: &Token,
        op: UnaryOp,
        operand: &Expr,
    ) -> Result<Lowered, CompileError> {
        let operand_value = self.lower_expr(operand)?;

        match op {
            UnaryOp::Plus => {
                let one = self.builder.const_i32(1);
                let value = self.builder.build_mul(one, operand_value.value);
                Ok(Lowered {
                    value,
                    ty: operand_value.ty,
                })
            }
            UnaryOp::Minus => {
                let minus_one = self.builder.const_i32(-1);
                let value = self.builder.build_mul(minus_one, operand_value.value);
                Ok(Lowered {
                    value,
                    ty: operand_value.ty,
                })
            }
            UnaryOp::Deref => Ok(Lowered::untyped(
                self.builder.build_load(operand_value.value),
            )),
            UnaryOp::AddressOf => {
                if operand.is_lvalue() {
                    if let Some(address) = self.builder.load_source(operand_value.value) {
                        return Ok(Lowered {
                            value: address,
                            ty: operand_value.ty.map(Type::pointer),
                        });
                    }
                }

                Err(self.error(
                    SemanticErrorKind::NotLvalue,
                    token,
                    "Expected lvalue for operand of reference operator".to_string(),
                ))
            }
        }
    }

    fn lower_call(
        &mut self,
        token: &Token,
        callee: &Expr,
        arguments: &[Expr],
    ) -> Result<Lowered, CompileError> {
        // An identifier callee resolves straight through the symbol table;
        // any other callee is lowered and must already be a function handle.
        let callee_value = match callee {
            Expr::Identifier { name, .. } => self.symbols.lookup(name),
            other => Some(self.lower_expr(other)?.value),
        };

        let function = callee_value.filter(|&v| self.builder.as_function(v).is_some());
        let Some(function) = function else {
            return Err(self.error(
                SemanticErrorKind::NotCallable,
                token,
                "Expected callable function expression".to_string(),
            ));
        };

        let mut args = Vec::with_capacity(arguments.len());
        for argument in arguments {
            args.push(self.lower_expr(argument)?.value);
        }

        Ok(Lowered::untyped(self.builder.build_call(function, args)))
    }
}

fn arithmetic_type(lhs: &Lowered, rhs: &Lowered) -> Option<Type> {
    match (&lhs.ty, &rhs.ty) {
        (Some(l), Some(r)) => promote_arithmetic(l, r),
        _ => None,
    }
}
