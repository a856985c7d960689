//! Math builtins
//!
//! Implements arithmetic and comparison procedures.
//!
//! # Bidirectional Procedures
//!
//! `sum` and `difference` solve for any single unbound operand:
//! - `sum(?a, 3, 10)` binds `?a` to 7
//! - `difference(10, ?b, 4)` binds `?b` to 6

mod arithmetic;
mod comparison;

pub use arithmetic::*;
pub use comparison::*;

use super::{Arity, BuiltinRegistry};

/// Register every math builtin
pub fn register(registry: &mut BuiltinRegistry) {
    // Comparison
    registry.register("equal", Arity::Exact(2), equal);
    registry.register("notEqual", Arity::Exact(2), not_equal);
    registry.register("lessThan", Arity::Exact(2), less_than);
    registry.register("greaterThan", Arity::Exact(2), greater_than);
    registry.register("le", Arity::Exact(2), le);
    registry.register("ge", Arity::Exact(2), ge);

    // Arithmetic
    registry.register("sum", Arity::Exact(3), sum);
    registry.register("difference", Arity::Exact(3), difference);
    registry.register("product", Arity::Exact(3), product);
    registry.register("quotient", Arity::Exact(3), quotient);
    registry.register("min", Arity::Exact(3), min);
    registry.register("max", Arity::Exact(3), max);
}
