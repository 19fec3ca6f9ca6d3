use super::tree_prefix;
use crate::frontend::lexer::Token;
use std::fmt;

/// Binary operators the expression grammar produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Assign,
    Add,
    Sub,
    Mul,
    Div,
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BinaryOp::Assign => "=",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Plus,
    Minus,
    /// `*x`, value-at-address
    Deref,
    /// `&x`, address-of
    AddressOf,
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            UnaryOp::Plus => "+",
            UnaryOp::Minus => "-",
            UnaryOp::Deref => "*",
            UnaryOp::AddressOf => "&",
        };
        write!(f, "{s}")
    }
}

/// A source-language expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    IntegerLiteral {
        token: Token,
        value: i32,
    },
    CharacterLiteral {
        token: Token,
        value: u8,
    },
    StringLiteral {
        token: Token,
        value: String,
    },
    Identifier {
        token: Token,
        name: String,
    },
    Binary {
        token: Token,
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Unary {
        token: Token,
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Call {
        token: Token,
        callee: Box<Expr>,
        arguments: Vec<Expr>,
    },
    /// `{ e, e, ... }`; only legal as a declaration initializer.
    ArrayInitList {
        token: Token,
        elements: Vec<Expr>,
    },
    Unsafe {
        token: Token,
        inner: Box<Expr>,
    },
}

impl Expr {
    pub fn integer(value: i32) -> Self {
        Expr::IntegerLiteral {
            token: Token::empty(),
            value,
        }
    }

    pub fn character(value: u8) -> Self {
        Expr::CharacterLiteral {
            token: Token::empty(),
            value,
        }
    }

    pub fn string(value: impl Into<String>) -> Self {
        Expr::StringLiteral {
            token: Token::empty(),
            value: value.into(),
        }
    }

    pub fn identifier(name: impl Into<String>) -> Self {
        Expr::Identifier {
            token: Token::empty(),
            name: name.into(),
        }
    }

    pub fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Self {
        Expr::Binary {
            token: Token::empty(),
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    pub fn unary(op: UnaryOp, operand: Expr) -> Self {
        Expr::Unary {
            token: Token::empty(),
            op,
            operand: Box::new(operand),
        }
    }

    pub fn call(callee: Expr, arguments: Vec<Expr>) -> Self {
        Expr::Call {
            token: Token::empty(),
            callee: Box::new(callee),
            arguments,
        }
    }

    pub fn array_init(elements: Vec<Expr>) -> Self {
        Expr::ArrayInitList {
            token: Token::empty(),
            elements,
        }
    }

    pub fn unsafe_expr(inner: Expr) -> Self {
        Expr::Unsafe {
            token: Token::empty(),
            inner: Box::new(inner),
        }
    }

    pub fn token(&self) -> &Token {
        match self {
            Expr::IntegerLiteral { token, .. } => token,
            Expr::CharacterLiteral { token, .. } => token,
            Expr::StringLiteral { token, .. } => token,
            Expr::Identifier { token, .. } => token,
            Expr::Binary { token, .. } => token,
            Expr::Unary { token, .. } => token,
            Expr::Call { token, .. } => token,
            Expr::ArrayInitList { token, .. } => token,
            Expr::Unsafe { token, .. } => token,
        }
    }

    /// Whether this expression designates a storage location.
    pub fn is_lvalue(&self) -> bool {
        matches!(self, Expr::Identifier { .. })
    }

    /// Whether this expression stays clear of raw-address operations. An
    /// `unsafe` wrapper vouches for everything inside it.
    pub fn is_safe(&self) -> bool {
        match self {
            Expr::IntegerLiteral { .. }
            | Expr::CharacterLiteral { .. }
            | Expr::StringLiteral { .. }
            | Expr::Identifier { .. } => true,
            Expr::Binary { lhs, rhs, .. } => lhs.is_safe() && rhs.is_safe(),
            Expr::Unary { op, operand, .. } => match op {
                UnaryOp::Deref | UnaryOp::AddressOf => false,
                UnaryOp::Plus | UnaryOp::Minus => operand.is_safe(),
            },
            Expr::Call {
                callee, arguments, ..
            } => callee.is_safe() && arguments.iter().all(Expr::is_safe),
            Expr::ArrayInitList { elements, .. } => elements.iter().all(Expr::is_safe),
            Expr::Unsafe { .. } => true,
        }
    }

    pub fn render(&self, depth: usize) -> String {
        match self {
            Expr::IntegerLiteral { value, .. } => {
                format!("{}IntegerLiteral({})", tree_prefix(depth), value)
            }
            Expr::CharacterLiteral { value, .. } => {
                format!("{}CharacterLiteral({})", tree_prefix(depth), *value as char)
            }
            Expr::StringLiteral { value, .. } => {
                format!("{}StringLiteral({})", tree_prefix(depth), value)
            }
            Expr::Identifier { name, .. } => {
                format!("{}Identifier(\"{}\")", tree_prefix(depth), name)
            }
            Expr::Binary { op, lhs, rhs, .. } => {
                let mut tree = format!("{}BinaryOperation:\n", tree_prefix(depth));
                tree += &format!("{}lhs:\n{}\n", tree_prefix(depth + 1), lhs.render(depth + 2));
                tree += &format!("{}rhs:\n{}\n", tree_prefix(depth + 1), rhs.render(depth + 2));
                tree += &format!("{}op:\n{}{}", tree_prefix(depth + 1), tree_prefix(depth + 2), op);
                tree
            }
            Expr::Unary { op, operand, .. } => {
                let mut tree = format!("{}UnaryOperation:\n", tree_prefix(depth));
                tree += &format!(
                    "{}operand:\n{}\n",
                    tree_prefix(depth + 1),
                    operand.render(depth + 2)
                );
                tree += &format!("{}op:\n{}{}", tree_prefix(depth + 1), tree_prefix(depth + 2), op);
                tree
            }
            Expr::Call {
                callee, arguments, ..
            } => {
                let mut tree = format!("{}FunctionCall:\n", tree_prefix(depth));
                tree += &format!(
                    "{}callee:\n{}\n",
                    tree_prefix(depth + 1),
                    callee.render(depth + 2)
                );
                if arguments.is_empty() {
                    tree += &format!("{}arguments: empty", tree_prefix(depth + 1));
                } else {
                    tree += &format!("{}arguments:", tree_prefix(depth + 1));
                    for argument in arguments {
                        tree += &format!("\n{}", argument.render(depth + 2));
                    }
                }
                tree
            }
            Expr::ArrayInitList { elements, .. } => {
                let mut tree = format!("{}ArrayInitList:\n", tree_prefix(depth));
                if elements.is_empty() {
                    tree += &format!("{}elements: empty", tree_prefix(depth + 1));
                } else {
                    tree += &format!("{}elements:", tree_prefix(depth + 1));
                    for element in elements {
                        tree += &format!("\n{}", element.render(depth + 2));
                    }
                }
                tree
            }
            Expr::Unsafe { inner, .. } => format!(
                "{}UnsafeExpression:\n{}expression:\n{}",
                tree_prefix(depth),
                tree_prefix(depth + 1),
                inner.render(depth + 2)
            ),
        }
    }
}
