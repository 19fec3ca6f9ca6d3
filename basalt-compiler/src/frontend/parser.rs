//! Recursive-descent parser over the token sequence.
//!
//! One token of lookahead, no backtracking beyond the alternation the
//! grammar itself expresses, and no panic-mode resynchronization: a failed
//! production reports at most one diagnostic and unwinds to its caller.
//! `parse` succeeds iff the accumulated error set is empty.

use super::lexer::{Token, TokenKind};
use crate::ast::{BinaryOp, Expr, Primitive, Stmt, Type, VariableDeclaration};
use crate::diagnostics::{Diagnostic, Diagnostics};

pub struct Parser {
    tokens: Vec<Token>,
    position: usize,
    diagnostics: Diagnostics,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        let mut tokens = tokens;
        if tokens.is_empty() {
            tokens.push(Token::empty());
        }
        Self {
            tokens,
            position: 0,
            diagnostics: Diagnostics::new(),
        }
    }

    /// Drive the top-level `block` production. Returns the tree only when no
    /// error was recorded anywhere in the run.
    pub fn parse(&mut self) -> Option<Stmt> {
        self.block()
    }

    pub fn errors(&self) -> &[Diagnostic] {
        self.diagnostics.errors()
    }

    pub fn take_errors(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics).into_parts().0
    }

    // --- Cursor primitives ---

    pub fn current(&self) -> &Token {
        &self.tokens[self.position]
    }

    pub fn previous(&self) -> &Token {
        &self.tokens[self.position - 1]
    }

    pub fn peek_next(&self) -> &Token {
        &self.tokens[(self.position + 1).min(self.tokens.len() - 1)]
    }

    /// Advance over the current token iff it has the given kind. The `Eof`
    /// sentinel is never accepted, so the cursor cannot run off the end.
    fn accept(&mut self, kind: TokenKind) -> bool {
        if kind != TokenKind::Eof && self.current().kind == kind {
            self.position += 1;
            return true;
        }
        false
    }

    fn expected(&mut self, what: &str) {
        let token = self.current().clone();
        let message = format!("Expected {}, but got \"{}\"", what, token.text);
        self.diagnostics.add_error(Diagnostic::new(token, message));
    }

    fn unexpected(&mut self) {
        let token = self.current().clone();
        let message = format!("Unexpected \"{}\"", token.text);
        self.diagnostics.add_error(Diagnostic::new(token, message));
    }

    // --- Statements ---

    fn block(&mut self) -> Option<Stmt> {
        let mut statements = Vec::new();
        while let Some(statement) = self.scope() {
            statements.push(statement);
        }

        if self.diagnostics.has_errors() {
            None
        } else {
            let token = statements
                .first()
                .map(|s| s.token().clone())
                .unwrap_or_else(Token::empty);
            Some(Stmt::Block { token, statements })
        }
    }

    fn scope(&mut self) -> Option<Stmt> {
        if self.accept(TokenKind::LBrace) {
            let scope_start = self.previous().clone();

            let mut statements = Vec::new();
            while let Some(statement) = self.var_decl() {
                statements.push(statement);
            }

            if self.accept(TokenKind::RBrace) {
                Some(Stmt::Scope {
                    token: scope_start,
                    statements,
                })
            } else {
                self.expected("'}'");
                None
            }
        } else {
            self.var_decl()
        }
    }

    fn var_decl(&mut self) -> Option<Stmt> {
        let Some(ty) = self.parse_type() else {
            return self.return_stmt();
        };
        let decl_start = ty.token().clone();

        if self.accept(TokenKind::Identifier) {
            let name = self.previous().text.clone();

            if self.accept(TokenKind::Assign) {
                let Some(initializer) = self.expr() else {
                    self.expected("expression");
                    return None;
                };
                if self.accept(TokenKind::Semicolon) {
                    return Some(Stmt::VariableDeclaration(VariableDeclaration {
                        token: decl_start,
                        ty,
                        name,
                        initializer: Some(initializer),
                    }));
                }
                self.expected("';'");
                return None;
            } else if self.accept(TokenKind::Semicolon) {
                return Some(Stmt::VariableDeclaration(VariableDeclaration {
                    token: decl_start,
                    ty,
                    name,
                    initializer: None,
                }));
            } else if self.accept(TokenKind::LParen) {
                return self.func_decl(decl_start, ty, name);
            }
        }

        self.expected("identifier");
        None
    }

    fn func_decl(&mut self, decl_start: Token, return_type: Type, name: String) -> Option<Stmt> {
        let mut parameters = Vec::new();

        loop {
            if let Some(param_type) = self.parse_type() {
                if param_type.is_void() {
                    // `(void)` means an empty parameter list; nothing may
                    // follow it.
                    if self.accept(TokenKind::RParen) {
                        break;
                    }
                    self.unexpected();
                    return None;
                }

                if self.accept(TokenKind::Identifier) {
                    let param_name = self.previous().text.clone();
                    parameters.push(VariableDeclaration {
                        token: decl_start.clone(),
                        ty: param_type,
                        name: param_name,
                        initializer: None,
                    });
                    if self.accept(TokenKind::Comma) {
                        continue;
                    }
                } else if self.accept(TokenKind::Comma) {
                    parameters.push(VariableDeclaration {
                        token: decl_start.clone(),
                        ty: param_type,
                        name: String::new(),
                        initializer: None,
                    });
                    continue;
                }
            } else if self.accept(TokenKind::RParen) {
                break;
            } else {
                self.unexpected();
                return None;
            }
        }

        let Some(body) = self.scope() else {
            self.unexpected();
            return None;
        };

        Some(Stmt::FunctionDeclaration {
            token: decl_start,
            return_type,
            name,
            parameters,
            body: Box::new(body),
        })
    }

    fn return_stmt(&mut self) -> Option<Stmt> {
        if self.accept(TokenKind::Return) {
            let return_start = self.previous().clone();

            if self.accept(TokenKind::Semicolon) {
                return Some(Stmt::Return {
                    token: return_start,
                    value: None,
                });
            }

            let Some(value) = self.expr() else {
                self.expected("expression");
                return None;
            };

            if self.accept(TokenKind::Semicolon) {
                Some(Stmt::Return {
                    token: return_start,
                    value: Some(value),
                })
            } else {
                self.expected("';'");
                None
            }
        } else {
            self.expr_stmt()
        }
    }

    fn expr_stmt(&mut self) -> Option<Stmt> {
        let statement_start = self.current().clone();

        let expression = self.expr()?;

        if self.accept(TokenKind::Semicolon) {
            Some(Stmt::Expression {
                token: statement_start,
                expression,
            })
        } else {
            self.expected("';'");
            None
        }
    }

    // --- Expressions ---

    fn expr(&mut self) -> Option<Expr> {
        self.assign()
    }

    /// Right-associative assignment: operands are collected left to right,
    /// the last becomes the seed, the rest fold in from the right.
    fn assign(&mut self) -> Option<Expr> {
        let assign_start = self.current().clone();

        let first = self.addsub()?;
        let mut operands = vec![first];

        while self.accept(TokenKind::Assign) {
            let Some(rhs) = self.addsub() else {
                self.expected("expression");
                return None;
            };
            operands.push(rhs);
        }

        let mut result = operands.pop()?;
        while let Some(operand) = operands.pop() {
            result = Expr::Binary {
                token: assign_start.clone(),
                op: BinaryOp::Assign,
                lhs: Box::new(operand),
                rhs: Box::new(result),
            };
        }

        Some(result)
    }

    fn addsub(&mut self) -> Option<Expr> {
        let addsub_start = self.current().clone();

        let mut lhs = self.muldiv()?;

        loop {
            let op = if self.accept(TokenKind::Plus) {
                BinaryOp::Add
            } else if self.accept(TokenKind::Minus) {
                BinaryOp::Sub
            } else {
                break;
            };

            let Some(rhs) = self.muldiv() else {
                self.expected("expression");
                return None;
            };
            lhs = Expr::Binary {
                token: addsub_start.clone(),
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }

        Some(lhs)
    }

    fn muldiv(&mut self) -> Option<Expr> {
        let muldiv_start = self.current().clone();

        let mut lhs = self.func_call()?;

        loop {
            let op = if self.accept(TokenKind::Multiply) {
                BinaryOp::Mul
            } else if self.accept(TokenKind::Divide) {
                BinaryOp::Div
            } else {
                break;
            };

            // The right operand is restricted to a bare number.
            let Some(rhs) = self.number() else {
                self.expected("expression");
                return None;
            };
            lhs = Expr::Binary {
                token: muldiv_start.clone(),
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }

        Some(lhs)
    }

    fn func_call(&mut self) -> Option<Expr> {
        let call_start = self.current().clone();

        let callee = self.atom()?;

        if !self.accept(TokenKind::LParen) {
            return Some(callee);
        }

        let mut arguments = Vec::new();
        if !self.accept(TokenKind::RParen) {
            loop {
                let Some(argument) = self.expr() else {
                    self.expected("expression");
                    return None;
                };
                arguments.push(argument);

                if self.accept(TokenKind::Comma) {
                    continue;
                }
                if self.accept(TokenKind::RParen) {
                    break;
                }
                self.expected("')'");
                return None;
            }
        }

        Some(Expr::Call {
            token: call_start,
            callee: Box::new(callee),
            arguments,
        })
    }

    fn atom(&mut self) -> Option<Expr> {
        if let Some(number) = self.number() {
            return Some(number);
        }
        self.identifier()
    }

    fn number(&mut self) -> Option<Expr> {
        if self.accept(TokenKind::DecInteger) {
            let token = self.previous().clone();
            return match token.text.parse::<i32>() {
                Ok(value) => Some(Expr::IntegerLiteral { token, value }),
                Err(_) => {
                    let message = format!("Unexpected \"{}\"", token.text);
                    self.diagnostics.add_error(Diagnostic::new(token, message));
                    None
                }
            };
        }
        None
    }

    fn identifier(&mut self) -> Option<Expr> {
        if self.accept(TokenKind::Identifier) {
            let token = self.previous().clone();
            let name = token.text.clone();
            return Some(Expr::Identifier { token, name });
        }
        None
    }

    // --- Types ---

    fn parse_type(&mut self) -> Option<Type> {
        self.simple_type()
    }

    fn simple_type(&mut self) -> Option<Type> {
        if self.accept(TokenKind::Unsigned) {
            let type_start = self.previous().clone();
            // Bare `unsigned` defaults to `unsigned int`.
            let primitive = self.width_keyword().unwrap_or(Primitive::Int);
            Some(Type::Simple {
                token: type_start,
                primitive,
                is_unsigned: true,
            })
        } else if self.accept(TokenKind::Signed) {
            let type_start = self.previous().clone();
            let primitive = self.width_keyword().unwrap_or(Primitive::Int);
            Some(Type::Simple {
                token: type_start,
                primitive,
                is_unsigned: false,
            })
        } else if let Some(primitive) = self.width_keyword() {
            let type_start = self.previous().clone();
            Some(Type::Simple {
                token: type_start,
                primitive,
                is_unsigned: false,
            })
        } else if self.accept(TokenKind::Void) {
            let type_start = self.previous().clone();
            Some(Type::Simple {
                token: type_start,
                primitive: Primitive::Void,
                is_unsigned: false,
            })
        } else {
            None
        }
    }

    fn width_keyword(&mut self) -> Option<Primitive> {
        if self.accept(TokenKind::Char) {
            Some(Primitive::Char)
        } else if self.accept(TokenKind::Short) {
            Some(Primitive::Short)
        } else if self.accept(TokenKind::Int) {
            Some(Primitive::Int)
        } else if self.accept(TokenKind::Long) {
            Some(Primitive::Long)
        } else {
            None
        }
    }
}
