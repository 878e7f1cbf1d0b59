use crate::interpreter::error::{Result, RuntimeError::DivideByZero};
use crate::parse::BinaryOp;

/// Applies a binary operator to two already evaluated operands.
///
/// Arithmetic wraps on overflow. Comparisons give 0 or 1, and `&`/`|` are
/// bitwise, so they act as logical and/or on comparison results.
pub fn apply(op: BinaryOp, lhs: i64, rhs: i64) -> Result {
    Ok(match op {
        BinaryOp::And => lhs & rhs,
        BinaryOp::Or => lhs | rhs,
        BinaryOp::Equal => (lhs == rhs) as i64,
        BinaryOp::NotEqual => (lhs != rhs) as i64,
        BinaryOp::GreaterEqual => (lhs >= rhs) as i64,
        BinaryOp::LessEqual => (lhs <= rhs) as i64,
        BinaryOp::Greater => (lhs > rhs) as i64,
        BinaryOp::Less => (lhs < rhs) as i64,
        BinaryOp::Add => lhs.wrapping_add(rhs),
        BinaryOp::Subtract => lhs.wrapping_sub(rhs),
        BinaryOp::Multiply => lhs.wrapping_mul(rhs),
        BinaryOp::Divide => {
            if rhs == 0 {
                return Err(DivideByZero);
            }
            lhs.wrapping_div(rhs)
        }
        BinaryOp::Modulo => {
            if rhs == 0 {
                return Err(DivideByZero);
            }
            lhs.wrapping_rem(rhs)
        }
    })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::interpreter::RuntimeError;

    #[test]
    fn truncating_division() {
        assert_eq!(apply(BinaryOp::Divide, 7, 2).unwrap(), 3);
        assert_eq!(apply(BinaryOp::Divide, -7, 2).unwrap(), -3);
        assert_eq!(apply(BinaryOp::Modulo, -7, 2).unwrap(), -1);
        assert_eq!(apply(BinaryOp::Divide, i64::MIN, -1).unwrap(), i64::MIN);
    }

    #[test]
    fn zero_divisor() {
        assert!(matches!(
            apply(BinaryOp::Divide, 1, 0),
            Err(RuntimeError::DivideByZero)
        ));
        assert!(matches!(
            apply(BinaryOp::Modulo, 1, 0),
            Err(RuntimeError::DivideByZero)
        ));
    }

    #[test]
    fn logic_is_bitwise() {
        assert_eq!(apply(BinaryOp::And, 1, 0).unwrap(), 0);
        assert_eq!(apply(BinaryOp::Or, 1, 0).unwrap(), 1);
        assert_eq!(apply(BinaryOp::And, 6, 3).unwrap(), 2);
    }

    #[test]
    fn wrapping_arithmetic() {
        assert_eq!(apply(BinaryOp::Add, i64::MAX, 1).unwrap(), i64::MIN);
    }
}
