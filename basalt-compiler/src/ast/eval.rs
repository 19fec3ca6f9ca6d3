//! Compile-time expression evaluation.
//!
//! Evaluation is best-effort: any overflow, division by zero, or operand the
//! evaluator cannot fold reports failure as an absent result.

use super::expr::{BinaryOp, Expr, UnaryOp};

/// A value the compile-time evaluator can hold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EvalValue {
    Int(i64),
    UInt(u64),
    Double(f64),
}

impl EvalValue {
    pub fn add(self, other: Self) -> Option<Self> {
        apply(self, other, i64::checked_add, u64::checked_add, |a, b| a + b)
    }

    pub fn sub(self, other: Self) -> Option<Self> {
        apply(self, other, i64::checked_sub, u64::checked_sub, |a, b| a - b)
    }

    pub fn mul(self, other: Self) -> Option<Self> {
        apply(self, other, i64::checked_mul, u64::checked_mul, |a, b| a * b)
    }

    pub fn div(self, other: Self) -> Option<Self> {
        apply(
            self,
            other,
            |a, b| if b == 0 { None } else { a.checked_div(b) },
            |a, b| if b == 0 { None } else { Some(a / b) },
            |a, b| a / b,
        )
    }
}

/// Align the operand pair and apply the matching operation. Floating wins
/// over integer; at integer/integer the unsigned representation wins, and a
/// negative signed operand cannot be aligned to it.
fn apply(
    lhs: EvalValue,
    rhs: EvalValue,
    int_op: impl Fn(i64, i64) -> Option<i64>,
    uint_op: impl Fn(u64, u64) -> Option<u64>,
    double_op: impl Fn(f64, f64) -> f64,
) -> Option<EvalValue> {
    use EvalValue::*;

    match (lhs, rhs) {
        (Double(a), Double(b)) => Some(Double(double_op(a, b))),
        (Double(a), Int(b)) => Some(Double(double_op(a, b as f64))),
        (Double(a), UInt(b)) => Some(Double(double_op(a, b as f64))),
        (Int(a), Double(b)) => Some(Double(double_op(a as f64, b))),
        (UInt(a), Double(b)) => Some(Double(double_op(a as f64, b))),
        (UInt(a), UInt(b)) => uint_op(a, b).map(UInt),
        (Int(a), UInt(b)) => uint_op(u64::try_from(a).ok()?, b).map(UInt),
        (UInt(a), Int(b)) => uint_op(a, u64::try_from(b).ok()?).map(UInt),
        (Int(a), Int(b)) => int_op(a, b).map(Int),
    }
}

impl Expr {
    /// Evaluate this expression at compile time, if its whole tree folds.
    pub fn evaluate(&self) -> Option<EvalValue> {
        match self {
            Expr::IntegerLiteral { value, .. } => Some(EvalValue::Int(i64::from(*value))),
            Expr::Binary { op, lhs, rhs, .. } => {
                let lhs_value = lhs.evaluate()?;
                let rhs_value = rhs.evaluate()?;
                match op {
                    BinaryOp::Add => lhs_value.add(rhs_value),
                    BinaryOp::Sub => lhs_value.sub(rhs_value),
                    BinaryOp::Mul => lhs_value.mul(rhs_value),
                    BinaryOp::Div => lhs_value.div(rhs_value),
                    BinaryOp::Assign => None,
                }
            }
            Expr::Unary { op, operand, .. } => {
                let value = operand.evaluate()?;
                match op {
                    UnaryOp::Plus => EvalValue::Int(0).add(value),
                    UnaryOp::Minus => EvalValue::Int(0).sub(value),
                    UnaryOp::Deref | UnaryOp::AddressOf => None,
                }
            }
            _ => None,
        }
    }
}
