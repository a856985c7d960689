//! Functor (compound term) representation
//!
//! Functors appear in two roles: as builtin calls in rule bodies
//! (`sum(?a, ?b, ?c)`) and as structured values inside triples
//! (`?x rb:violation error("msg", ?y)`).

use std::fmt;
use std::sync::Arc;

use super::Term;

/// A compound term: a name applied to ordered arguments
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Functor {
    name: Arc<str>,
    args: Vec<Term>,
}

impl Functor {
    /// Create a functor from a name and its arguments
    pub fn new(name: impl Into<Arc<str>>, args: Vec<Term>) -> Self {
        Functor {
            name: name.into(),
            args,
        }
    }

    /// The functor name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The arguments, in order
    pub fn args(&self) -> &[Term] {
        &self.args
    }

    /// Number of arguments
    pub fn arity(&self) -> usize {
        self.args.len()
    }

    /// True if no argument contains a variable
    pub fn is_ground(&self) -> bool {
        self.args.iter().all(Term::is_ground)
    }

    /// Rebuild with transformed arguments, keeping the name
    pub fn map_args(&self, f: impl FnMut(&Term) -> Term) -> Functor {
        Functor {
            name: Arc::clone(&self.name),
            args: self.args.iter().map(f).collect(),
        }
    }
}

impl fmt::Debug for Functor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name)?;
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{:?}", arg)?;
        }
        write!(f, ")")
    }
}

impl fmt::Display for Functor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name)?;
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", arg)?;
        }
        write!(f, ")")
    }
}
