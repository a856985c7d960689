//! Shared utility functions for builtin implementations
//!
//! This module provides common operations used across the builtin groups:
//! - Argument extraction (numbers, lexical forms) with typed errors
//! - Result binding (check a bound argument, or bind an unbound one)
//! - Value equality across numeric datatypes

use std::cmp::Ordering;

use super::{BuiltinError, BuiltinResult};
use crate::term::{Number, Term};

// ============================================================================
// Argument Extraction
// ============================================================================

/// Describe a term's kind for error messages
pub fn kind_of(term: &Term) -> String {
    match term {
        Term::Uri(_) => "URI".to_string(),
        Term::Literal(l) => format!("literal {}", l),
        Term::BlankNode(_) => "blank node".to_string(),
        Term::Variable(v) => format!("unbound {}", v),
        Term::Functor(f) => format!("functor {}", f.name()),
    }
}

/// Extract a numeric argument
pub fn number_arg(args: &[Term], index: usize) -> Result<Number, BuiltinError> {
    match &args[index] {
        Term::Variable(_) => Err(BuiltinError::Unbound { index }),
        Term::Literal(lit) => lit.as_number().ok_or_else(|| BuiltinError::Type {
            index,
            expected: "number",
            found: kind_of(&args[index]),
        }),
        other => Err(BuiltinError::Type {
            index,
            expected: "number",
            found: kind_of(other),
        }),
    }
}

/// Extract a bound argument of any kind
pub fn bound_arg(args: &[Term], index: usize) -> Result<&Term, BuiltinError> {
    match &args[index] {
        Term::Variable(_) => Err(BuiltinError::Unbound { index }),
        term => Ok(term),
    }
}

/// Lexical form of a bound argument
///
/// Literals give their value, URIs their full string, blank nodes their
/// label.
pub fn lexical_arg(args: &[Term], index: usize) -> Result<String, BuiltinError> {
    match bound_arg(args, index)? {
        Term::Literal(lit) => Ok(lit.value().to_string()),
        Term::Uri(uri) => Ok(uri.as_str().to_string()),
        Term::BlankNode(b) => Ok(b.to_string()),
        other => Err(BuiltinError::Type {
            index,
            expected: "node",
            found: kind_of(other),
        }),
    }
}

// ============================================================================
// Result Binding
// ============================================================================

/// Succeed by binding argument `index` to `value`, or by checking it
///
/// A bound argument must be value-equal to `value`.
pub fn bind_or_check(args: &[Term], index: usize, value: Term) -> BuiltinResult {
    match &args[index] {
        Term::Variable(_) => BuiltinResult::Success(vec![(index, value)]),
        existing => BuiltinResult::from_bool(same_value(existing, &value)),
    }
}

// ============================================================================
// Value Comparison
// ============================================================================

/// Compare two numbers, exactly when both are integers
pub fn compare_numbers(a: Number, b: Number) -> Option<Ordering> {
    match (a, b) {
        (Number::Integer(x), Number::Integer(y)) => Some(x.cmp(&y)),
        _ => a.as_f64().partial_cmp(&b.as_f64()),
    }
}

/// Value equality: numeric literals compare by value, everything else by term
pub fn same_value(a: &Term, b: &Term) -> bool {
    if let (Term::Literal(la), Term::Literal(lb)) = (a, b) {
        if let (Some(na), Some(nb)) = (la.as_number(), lb.as_number()) {
            return compare_numbers(na, nb) == Some(Ordering::Equal);
        }
    }
    a == b
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_arg_errors() {
        let args = vec![Term::var("x"), Term::uri("urn:a"), Term::integer(3)];
        assert_eq!(number_arg(&args, 0), Err(BuiltinError::Unbound { index: 0 }));
        assert!(matches!(number_arg(&args, 1), Err(BuiltinError::Type { index: 1, .. })));
        assert_eq!(number_arg(&args, 2), Ok(Number::Integer(3)));
    }

    #[test]
    fn test_same_value_across_types() {
        assert!(same_value(&Term::integer(2), &Term::decimal(2.0)));
        assert!(!same_value(&Term::integer(2), &Term::literal("two")));
        assert!(same_value(&Term::uri("urn:a"), &Term::uri("urn:a")));
    }

    #[test]
    fn test_bind_or_check() {
        let args = vec![Term::var("x"), Term::integer(5)];
        assert_eq!(
            bind_or_check(&args, 0, Term::integer(5)),
            BuiltinResult::Success(vec![(0, Term::integer(5))])
        );
        assert!(bind_or_check(&args, 1, Term::integer(5)).is_success());
        assert_eq!(bind_or_check(&args, 1, Term::integer(6)), BuiltinResult::Failure);
    }
}
