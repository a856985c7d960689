//! Comparison builtins

use std::cmp::Ordering;

use crate::builtins::helpers::{bound_arg, compare_numbers, number_arg, same_value};
use crate::builtins::{BuiltinError, BuiltinResult};
use crate::term::Term;

/// `equal(a, b)`: value equality, numeric across datatypes
pub fn equal(args: &[Term]) -> Result<BuiltinResult, BuiltinError> {
    let a = bound_arg(args, 0)?;
    let b = bound_arg(args, 1)?;
    Ok(BuiltinResult::from_bool(same_value(a, b)))
}

/// `notEqual(a, b)`
pub fn not_equal(args: &[Term]) -> Result<BuiltinResult, BuiltinError> {
    let a = bound_arg(args, 0)?;
    let b = bound_arg(args, 1)?;
    Ok(BuiltinResult::from_bool(!same_value(a, b)))
}

fn compare(args: &[Term], test: impl Fn(Ordering) -> bool) -> Result<BuiltinResult, BuiltinError> {
    let a = number_arg(args, 0)?;
    let b = number_arg(args, 1)?;
    Ok(BuiltinResult::from_bool(compare_numbers(a, b).map_or(false, test)))
}

/// `lessThan(a, b)`: a < b
pub fn less_than(args: &[Term]) -> Result<BuiltinResult, BuiltinError> {
    compare(args, Ordering::is_lt)
}

/// `greaterThan(a, b)`: a > b
pub fn greater_than(args: &[Term]) -> Result<BuiltinResult, BuiltinError> {
    compare(args, Ordering::is_gt)
}

/// `le(a, b)`: a <= b
pub fn le(args: &[Term]) -> Result<BuiltinResult, BuiltinError> {
    compare(args, Ordering::is_le)
}

/// `ge(a, b)`: a >= b
pub fn ge(args: &[Term]) -> Result<BuiltinResult, BuiltinError> {
    compare(args, Ordering::is_ge)
}
