//! Arithmetic builtins
//!
//! All take three arguments `(a, b, c)`. Integer inputs stay integral
//! (overflow is an arithmetic error); any decimal input makes the result
//! decimal.

use crate::builtins::helpers::{bind_or_check, compare_numbers, number_arg};
use crate::builtins::{BuiltinError, BuiltinResult};
use crate::term::{Number, Term};

#[derive(Clone, Copy)]
enum Op {
    Add,
    Sub,
    Mul,
}

fn apply(op: Op, a: Number, b: Number) -> Result<Number, BuiltinError> {
    match (a, b) {
        (Number::Integer(x), Number::Integer(y)) => {
            let r = match op {
                Op::Add => x.checked_add(y),
                Op::Sub => x.checked_sub(y),
                Op::Mul => x.checked_mul(y),
            };
            r.map(Number::Integer)
                .ok_or_else(|| BuiltinError::Arithmetic(format!("integer overflow on {} and {}", x, y)))
        }
        _ => {
            let (x, y) = (a.as_f64(), b.as_f64());
            Ok(Number::Decimal(match op {
                Op::Add => x + y,
                Op::Sub => x - y,
                Op::Mul => x * y,
            }))
        }
    }
}

/// Solve `a op b = c` for whichever single argument is unbound
///
/// `inverse_a` computes `a` from `(b, c)`, `inverse_b` computes `b` from
/// `(a, c)`.
fn solve(
    args: &[Term],
    op: Op,
    inverse_a: Option<(Op, bool)>,
    inverse_b: Option<(Op, bool)>,
) -> Result<BuiltinResult, BuiltinError> {
    let a = number_arg(args, 0);
    let b = number_arg(args, 1);

    match (a, b, inverse_a, inverse_b) {
        (Ok(a), Ok(b), _, _) => Ok(bind_or_check(args, 2, Term::number(apply(op, a, b)?))),
        (Err(BuiltinError::Unbound { .. }), Ok(b), Some((inv, swap)), _) => {
            let c = number_arg(args, 2)?;
            let a = if swap { apply(inv, b, c)? } else { apply(inv, c, b)? };
            Ok(bind_or_check(args, 0, Term::number(a)))
        }
        (Ok(a), Err(BuiltinError::Unbound { .. }), _, Some((inv, swap))) => {
            let c = number_arg(args, 2)?;
            let b = if swap { apply(inv, a, c)? } else { apply(inv, c, a)? };
            Ok(bind_or_check(args, 1, Term::number(b)))
        }
        (Err(e), _, _, _) | (_, Err(e), _, _) => Err(e),
    }
}

/// `sum(a, b, c)`: a + b = c; solves for any one unknown
pub fn sum(args: &[Term]) -> Result<BuiltinResult, BuiltinError> {
    // a = c - b, b = c - a
    solve(args, Op::Add, Some((Op::Sub, false)), Some((Op::Sub, false)))
}

/// `difference(a, b, c)`: a - b = c; solves for any one unknown
pub fn difference(args: &[Term]) -> Result<BuiltinResult, BuiltinError> {
    // a = c + b, b = a - c
    solve(args, Op::Sub, Some((Op::Add, false)), Some((Op::Sub, true)))
}

/// `product(a, b, c)`: a * b = c
pub fn product(args: &[Term]) -> Result<BuiltinResult, BuiltinError> {
    solve(args, Op::Mul, None, None)
}

/// `quotient(a, b, c)`: a / b = c
///
/// Exact integer division stays integral; anything else is decimal.
pub fn quotient(args: &[Term]) -> Result<BuiltinResult, BuiltinError> {
    let a = number_arg(args, 0)?;
    let b = number_arg(args, 1)?;
    let q = match (a, b) {
        (_, Number::Integer(0)) => {
            return Err(BuiltinError::Arithmetic("division by zero".to_string()))
        }
        (_, Number::Decimal(d)) if d == 0.0 => {
            return Err(BuiltinError::Arithmetic("division by zero".to_string()))
        }
        (Number::Integer(x), Number::Integer(y)) if x.checked_rem(y) == Some(0) => x
            .checked_div(y)
            .map(Number::Integer)
            .ok_or_else(|| BuiltinError::Arithmetic(format!("integer overflow on {} / {}", x, y)))?,
        _ => Number::Decimal(a.as_f64() / b.as_f64()),
    };
    Ok(bind_or_check(args, 2, Term::number(q)))
}

/// `min(a, b, c)`: c is the smaller of a and b
pub fn min(args: &[Term]) -> Result<BuiltinResult, BuiltinError> {
    pick(args, |ord| ord.is_le())
}

/// `max(a, b, c)`: c is the larger of a and b
pub fn max(args: &[Term]) -> Result<BuiltinResult, BuiltinError> {
    pick(args, |ord| ord.is_ge())
}

fn pick(
    args: &[Term],
    keep_first: impl Fn(std::cmp::Ordering) -> bool,
) -> Result<BuiltinResult, BuiltinError> {
    let a = number_arg(args, 0)?;
    let b = number_arg(args, 1)?;
    let ord = compare_numbers(a, b)
        .ok_or_else(|| BuiltinError::Arithmetic("unordered numbers (NaN)".to_string()))?;
    let winner = if keep_first(ord) { &args[0] } else { &args[1] };
    Ok(bind_or_check(args, 2, winner.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sum_forward_binds_result() {
        let args = vec![Term::integer(2), Term::integer(3), Term::var("c")];
        assert_eq!(sum(&args), Ok(BuiltinResult::Success(vec![(2, Term::integer(5))])));
    }

    #[test]
    fn test_sum_backward_solves_operand() {
        let args = vec![Term::var("a"), Term::integer(3), Term::integer(10)];
        assert_eq!(sum(&args), Ok(BuiltinResult::Success(vec![(0, Term::integer(7))])));
    }

    #[test]
    fn test_sum_checks_bound_result() {
        let args = vec![Term::integer(2), Term::integer(3), Term::integer(6)];
        assert_eq!(sum(&args), Ok(BuiltinResult::Failure));
    }

    #[test]
    fn test_difference_solves_subtrahend() {
        let args = vec![Term::integer(10), Term::var("b"), Term::integer(4)];
        assert_eq!(difference(&args), Ok(BuiltinResult::Success(vec![(1, Term::integer(6))])));
    }

    #[test]
    fn test_mixed_types_become_decimal() {
        let args = vec![Term::integer(2), Term::decimal(0.5), Term::var("c")];
        assert_eq!(product(&args), Ok(BuiltinResult::Success(vec![(2, Term::decimal(1.0))])));
    }

    #[test]
    fn test_overflow_is_arithmetic_error() {
        let args = vec![Term::integer(i64::MAX), Term::integer(1), Term::var("c")];
        assert!(matches!(sum(&args), Err(BuiltinError::Arithmetic(_))));
    }

    #[test]
    fn test_quotient() {
        let exact = vec![Term::integer(9), Term::integer(3), Term::var("c")];
        assert_eq!(quotient(&exact), Ok(BuiltinResult::Success(vec![(2, Term::integer(3))])));

        let inexact = vec![Term::integer(7), Term::integer(2), Term::var("c")];
        assert_eq!(quotient(&inexact), Ok(BuiltinResult::Success(vec![(2, Term::decimal(3.5))])));

        let by_zero = vec![Term::integer(7), Term::integer(0), Term::var("c")];
        assert!(matches!(quotient(&by_zero), Err(BuiltinError::Arithmetic(_))));
    }

    #[test]
    fn test_unbound_operands() {
        let args = vec![Term::var("a"), Term::var("b"), Term::integer(1)];
        assert_eq!(sum(&args), Err(BuiltinError::Unbound { index: 0 }));
        assert_eq!(product(&args), Err(BuiltinError::Unbound { index: 0 }));
    }

    #[test]
    fn test_min_max() {
        let args = vec![Term::integer(4), Term::integer(9), Term::var("c")];
        assert_eq!(min(&args), Ok(BuiltinResult::Success(vec![(2, Term::integer(4))])));
        assert_eq!(max(&args), Ok(BuiltinResult::Success(vec![(2, Term::integer(9))])));
    }
}
