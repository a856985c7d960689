//! Node tests and binding builtins
//!
//! The kind tests (`isLiteral`, `isBNode`, ...) accept unbound arguments: an
//! unbound variable is not a literal, so `notLiteral(?x)` holds for it.

use super::helpers::bind_or_check;
use super::{Arity, BuiltinError, BuiltinRegistry, BuiltinResult};
use crate::term::Term;

/// Register every node builtin
pub fn register(registry: &mut BuiltinRegistry) {
    registry.register("isLiteral", Arity::Exact(1), is_literal);
    registry.register("notLiteral", Arity::Exact(1), not_literal);
    registry.register("isBNode", Arity::Exact(1), is_bnode);
    registry.register("notBNode", Arity::Exact(1), not_bnode);
    registry.register("isFunctor", Arity::Exact(1), is_functor);
    registry.register("bound", Arity::AtLeast(1), bound);
    registry.register("unbound", Arity::AtLeast(1), unbound);
    registry.register("makeTemp", Arity::Exact(1), make_temp);
}

pub fn is_literal(args: &[Term]) -> Result<BuiltinResult, BuiltinError> {
    Ok(BuiltinResult::from_bool(matches!(args[0], Term::Literal(_))))
}

pub fn not_literal(args: &[Term]) -> Result<BuiltinResult, BuiltinError> {
    Ok(BuiltinResult::from_bool(!matches!(args[0], Term::Literal(_))))
}

pub fn is_bnode(args: &[Term]) -> Result<BuiltinResult, BuiltinError> {
    Ok(BuiltinResult::from_bool(matches!(args[0], Term::BlankNode(_))))
}

pub fn not_bnode(args: &[Term]) -> Result<BuiltinResult, BuiltinError> {
    Ok(BuiltinResult::from_bool(!matches!(args[0], Term::BlankNode(_))))
}

pub fn is_functor(args: &[Term]) -> Result<BuiltinResult, BuiltinError> {
    Ok(BuiltinResult::from_bool(matches!(args[0], Term::Functor(_))))
}

/// `bound(?x, ...)`: every argument is bound
pub fn bound(args: &[Term]) -> Result<BuiltinResult, BuiltinError> {
    Ok(BuiltinResult::from_bool(args.iter().all(|a| !a.is_variable())))
}

/// `unbound(?x, ...)`: every argument is unbound
pub fn unbound(args: &[Term]) -> Result<BuiltinResult, BuiltinError> {
    Ok(BuiltinResult::from_bool(args.iter().all(Term::is_variable)))
}

/// `makeTemp(?x)`: bind `?x` to a fresh blank node
///
/// Fails if `?x` is already bound.
pub fn make_temp(args: &[Term]) -> Result<BuiltinResult, BuiltinError> {
    if !args[0].is_variable() {
        return Ok(BuiltinResult::Failure);
    }
    Ok(bind_or_check(args, 0, Term::fresh_blank()))
}
