//! Built-in procedures callable from rule bodies
//!
//! A builtin is a body clause written as a functor, e.g. `sum(?a, ?b, ?c)`.
//! Calls are resolved against a [`BuiltinRegistry`] once, when the rule store
//! is built; an unknown name or a wrong argument count is a configuration
//! error at that point, never at query time.
//!
//! Implemented groups:
//! - math: arithmetic and numeric comparison
//! - nodes: term-kind tests, `bound`/`unbound`, `makeTemp`
//! - strings: `regex`, `strConcat`
//!
//! A builtin receives its arguments with the current bindings already
//! substituted; arguments that are still unbound arrive as variables. It
//! either fails, or succeeds with values for some of its (variable)
//! argument positions.

use std::fmt;

use indexmap::IndexMap;
use thiserror::Error;

use crate::term::Term;

pub mod helpers;
pub mod math;
pub mod nodes;
pub mod strings;

/// Result of evaluating a builtin
#[derive(Debug, Clone, PartialEq)]
pub enum BuiltinResult {
    /// The call holds; bind each listed argument position to its value
    Success(Vec<(usize, Term)>),
    /// The call does not hold
    Failure,
}

impl BuiltinResult {
    /// Success with no new bindings
    pub fn holds() -> Self {
        BuiltinResult::Success(Vec::new())
    }

    /// Success or failure from a test
    pub fn from_bool(ok: bool) -> Self {
        if ok {
            Self::holds()
        } else {
            BuiltinResult::Failure
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, BuiltinResult::Success(_))
    }
}

/// Errors raised while evaluating a builtin
///
/// All but `Fatal` only fail the current clause attempt.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BuiltinError {
    /// An argument that must be bound was not
    #[error("argument {index} is unbound")]
    Unbound { index: usize },
    /// An argument had the wrong kind of value
    #[error("argument {index}: expected {expected}, found {found}")]
    Type {
        index: usize,
        expected: &'static str,
        found: String,
    },
    /// Numeric failure (division by zero, overflow)
    #[error("arithmetic error: {0}")]
    Arithmetic(String),
    /// Abort the whole query
    #[error("fatal: {0}")]
    Fatal(String),
}

impl BuiltinError {
    /// Whether the error aborts reasoning instead of failing one clause
    pub fn is_fatal(&self) -> bool {
        matches!(self, BuiltinError::Fatal(_))
    }
}

/// A builtin implementation: resolved arguments in, result out
pub type BuiltinFn = fn(&[Term]) -> Result<BuiltinResult, BuiltinError>;

/// Accepted argument counts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exact(usize),
    AtLeast(usize),
}

impl Arity {
    pub fn accepts(&self, n: usize) -> bool {
        match *self {
            Arity::Exact(k) => n == k,
            Arity::AtLeast(k) => n >= k,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Exact(k) => write!(f, "{}", k),
            Arity::AtLeast(k) => write!(f, "at least {}", k),
        }
    }
}

/// A registered builtin
#[derive(Clone, Copy)]
pub struct Builtin {
    name: &'static str,
    arity: Arity,
    func: BuiltinFn,
}

impl Builtin {
    pub fn new(name: &'static str, arity: Arity, func: BuiltinFn) -> Self {
        Builtin { name, arity, func }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn arity(&self) -> Arity {
        self.arity
    }

    /// Run the builtin on already-substituted arguments
    pub fn call(&self, args: &[Term]) -> Result<BuiltinResult, BuiltinError> {
        (self.func)(args)
    }
}

impl fmt::Debug for Builtin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Builtin({}/{})", self.name, self.arity)
    }
}

/// Registry of builtins by name
#[derive(Debug, Clone)]
pub struct BuiltinRegistry {
    builtins: IndexMap<&'static str, Builtin>,
}

impl Default for BuiltinRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl BuiltinRegistry {
    /// Create a new registry with the standard builtins
    pub fn new() -> Self {
        let mut registry = Self::empty();
        math::register(&mut registry);
        nodes::register(&mut registry);
        strings::register(&mut registry);
        registry
    }

    /// Create a registry with no builtins
    pub fn empty() -> Self {
        BuiltinRegistry {
            builtins: IndexMap::new(),
        }
    }

    /// Register a builtin, replacing any previous one with the same name
    pub fn register(&mut self, name: &'static str, arity: Arity, func: BuiltinFn) {
        self.builtins.insert(name, Builtin::new(name, arity, func));
    }

    /// Check if a name is registered
    pub fn is_builtin(&self, name: &str) -> bool {
        self.builtins.contains_key(name)
    }

    /// Look up a builtin
    pub fn get(&self, name: &str) -> Option<&Builtin> {
        self.builtins.get(name)
    }

    /// Registered names in registration order
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.builtins.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.builtins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.builtins.is_empty()
    }
}
