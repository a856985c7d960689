//! String builtins

use regex::Regex;

use super::helpers::{bind_or_check, kind_of, lexical_arg};
use super::{Arity, BuiltinError, BuiltinRegistry, BuiltinResult};
use crate::term::Term;

/// Register every string builtin
pub fn register(registry: &mut BuiltinRegistry) {
    registry.register("regex", Arity::AtLeast(2), regex);
    registry.register("strConcat", Arity::AtLeast(1), str_concat);
}

/// `regex(text, pattern, ?g1, ...)`: text matches pattern
///
/// Extra arguments receive the capture groups, in order, as plain literals.
pub fn regex(args: &[Term]) -> Result<BuiltinResult, BuiltinError> {
    let text = lexical_arg(args, 0)?;
    let pattern = lexical_arg(args, 1)?;
    let re = Regex::new(&pattern).map_err(|e| BuiltinError::Type {
        index: 1,
        expected: "regular expression",
        found: format!("{} ({})", kind_of(&args[1]), e),
    })?;

    let Some(caps) = re.captures(&text) else {
        return Ok(BuiltinResult::Failure);
    };

    let mut bindings = Vec::new();
    for offset in 2..args.len() {
        let group = caps.get(offset - 1).map(|m| m.as_str()).unwrap_or("");
        match bind_or_check(args, offset, Term::literal(group)) {
            BuiltinResult::Success(mut b) => bindings.append(&mut b),
            BuiltinResult::Failure => return Ok(BuiltinResult::Failure),
        }
    }
    Ok(BuiltinResult::Success(bindings))
}

/// `strConcat(a, b, ..., ?out)`: concatenate lexical forms into the last argument
pub fn str_concat(args: &[Term]) -> Result<BuiltinResult, BuiltinError> {
    let last = args.len() - 1;
    let mut out = String::new();
    for index in 0..last {
        out.push_str(&lexical_arg(args, index)?);
    }
    Ok(bind_or_check(args, last, Term::literal(out)))
}
