//! Term and triple representations
//!
//! This module defines the core data types the reasoner works over:
//! - URIs (named nodes)
//! - Literals (with optional datatype or language tag)
//! - Blank nodes (anonymous nodes)
//! - Variables (rule-local, indexed into a binding environment)
//! - Functors (compound terms: builtin calls and structured values)
//!
//! plus [`Triple`] (also used as a pattern) and [`BindingEnv`], the
//! substitution environment of one rule instance.

use std::fmt;
use std::sync::Arc;

pub mod uri;
mod literal;
mod blank;
mod variable;
mod functor;
mod env;

pub use uri::Uri;
pub use literal::{Literal, Datatype, Number};
pub use blank::BlankNode;
pub use variable::Variable;
pub use functor::Functor;
pub use env::BindingEnv;

use crate::core::ns;

/// A term in a triple, rule clause, or query
#[derive(Clone, PartialEq, Eq, Hash)]
pub enum Term {
    /// A URI reference (named node)
    Uri(Arc<Uri>),
    /// A literal value
    Literal(Arc<Literal>),
    /// A blank node (anonymous)
    BlankNode(BlankNode),
    /// A variable (for patterns/rules)
    Variable(Variable),
    /// A compound term
    Functor(Arc<Functor>),
}

impl Term {
    /// Create a URI term
    pub fn uri(s: impl Into<String>) -> Self {
        Term::Uri(Arc::new(Uri::new(s.into())))
    }

    /// Create a plain literal
    pub fn literal(s: impl Into<String>) -> Self {
        Term::Literal(Arc::new(Literal::plain(s.into())))
    }

    /// Create a typed literal
    pub fn typed_literal(value: impl Into<String>, datatype: impl Into<String>) -> Self {
        Term::Literal(Arc::new(Literal::typed(value.into(), datatype.into())))
    }

    /// Create a language-tagged literal
    pub fn lang_literal(value: impl Into<String>, lang: impl Into<String>) -> Self {
        Term::Literal(Arc::new(Literal::with_language(value.into(), lang.into())))
    }

    /// Create an `xsd:integer` literal
    pub fn integer(value: i64) -> Self {
        Term::typed_literal(value.to_string(), format!("{}integer", ns::XSD))
    }

    /// Create an `xsd:decimal` literal
    pub fn decimal(value: f64) -> Self {
        Term::typed_literal(value.to_string(), format!("{}decimal", ns::XSD))
    }

    /// Create a literal from a computed number, keeping integers integral
    pub fn number(value: Number) -> Self {
        match value {
            Number::Integer(i) => Term::integer(i),
            Number::Decimal(d) => Term::decimal(d),
        }
    }

    /// Create a blank node with a label
    pub fn blank(label: impl Into<String>) -> Self {
        Term::BlankNode(BlankNode::labeled(label.into()))
    }

    /// Create a fresh blank node
    pub fn fresh_blank() -> Self {
        Term::BlankNode(BlankNode::fresh())
    }

    /// Create a variable; its slot is assigned by the owning rule or query
    pub fn var(name: impl Into<Arc<str>>) -> Self {
        Term::Variable(Variable::unindexed(name))
    }

    /// Create a compound term
    pub fn functor(name: impl Into<Arc<str>>, args: Vec<Term>) -> Self {
        Term::Functor(Arc::new(Functor::new(name, args)))
    }

    /// Check if this term is a variable
    pub fn is_variable(&self) -> bool {
        matches!(self, Term::Variable(_))
    }

    /// Check if this term is ground (contains no variables)
    pub fn is_ground(&self) -> bool {
        match self {
            Term::Uri(_) | Term::Literal(_) | Term::BlankNode(_) => true,
            Term::Variable(_) => false,
            Term::Functor(f) => f.is_ground(),
        }
    }

    /// Get the URI if this is a URI term
    pub fn as_uri(&self) -> Option<&Uri> {
        match self {
            Term::Uri(u) => Some(u),
            _ => None,
        }
    }

    /// Get the literal if this is a literal term
    pub fn as_literal(&self) -> Option<&Literal> {
        match self {
            Term::Literal(l) => Some(l),
            _ => None,
        }
    }

    /// Get the functor if this is a compound term
    pub fn as_functor(&self) -> Option<&Functor> {
        match self {
            Term::Functor(f) => Some(f),
            _ => None,
        }
    }

    /// Get the variable if this is a variable term
    pub fn as_variable(&self) -> Option<&Variable> {
        match self {
            Term::Variable(v) => Some(v),
            _ => None,
        }
    }

    /// Check whether a ground term is an instance of this (pattern) term
    pub fn matches(&self, ground: &Term) -> bool {
        match_term(self, ground, &mut Vec::new())
    }

    /// Rebuild the term with every variable passed through `f`
    pub fn map_variables(&self, f: &mut impl FnMut(&Variable) -> Term) -> Term {
        match self {
            Term::Variable(v) => f(v),
            Term::Functor(func) => {
                Term::Functor(Arc::new(func.map_args(|arg| arg.map_variables(&mut *f))))
            }
            _ => self.clone(),
        }
    }

    /// Push every variable occurring in this term, in order, onto `out`
    pub fn collect_variables(&self, out: &mut Vec<Variable>) {
        match self {
            Term::Variable(v) => {
                if !out.contains(v) {
                    out.push(v.clone());
                }
            }
            Term::Functor(f) => {
                for arg in f.args() {
                    arg.collect_variables(out);
                }
            }
            _ => {}
        }
    }
}

impl fmt::Debug for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Uri(u) => write!(f, "{:?}", u),
            Term::Literal(l) => write!(f, "{:?}", l),
            Term::BlankNode(b) => write!(f, "{:?}", b),
            Term::Variable(v) => write!(f, "{:?}", v),
            Term::Functor(func) => write!(f, "{:?}", func),
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Uri(u) => write!(f, "{}", u),
            Term::Literal(l) => write!(f, "{}", l),
            Term::BlankNode(b) => write!(f, "{}", b),
            Term::Variable(v) => write!(f, "{}", v),
            Term::Functor(func) => write!(f, "{}", func),
        }
    }
}

/// A triple (statement)
///
/// The same type doubles as a pattern: any position may hold a variable.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Triple {
    pub subject: Term,
    pub predicate: Term,
    pub object: Term,
}

/// A triple whose positions may be variables; used for rule clauses and queries
pub type TriplePattern = Triple;

impl Triple {
    pub fn new(subject: Term, predicate: Term, object: Term) -> Self {
        Triple { subject, predicate, object }
    }

    /// Check if this triple contains any variables
    pub fn has_variables(&self) -> bool {
        !self.is_ground()
    }

    /// Check if this triple is ground (no variables)
    pub fn is_ground(&self) -> bool {
        self.subject.is_ground() && self.predicate.is_ground() && self.object.is_ground()
    }

    /// Iterate over subject, predicate, object
    pub fn terms(&self) -> [&Term; 3] {
        [&self.subject, &self.predicate, &self.object]
    }

    /// Distinct variables in first-occurrence order
    pub fn variables(&self) -> Vec<Variable> {
        let mut vars = Vec::new();
        for term in self.terms() {
            term.collect_variables(&mut vars);
        }
        vars
    }

    /// Apply `f` to every variable in the triple
    pub fn map_variables(&self, mut f: impl FnMut(&Variable) -> Term) -> Triple {
        Triple {
            subject: self.subject.map_variables(&mut f),
            predicate: self.predicate.map_variables(&mut f),
            object: self.object.map_variables(&mut f),
        }
    }

    /// Check whether a ground triple is an instance of this pattern
    ///
    /// Repeated variables must match the same value.
    pub fn matches(&self, ground: &Triple) -> bool {
        let mut seen: Vec<(&Variable, &Term)> = Vec::new();
        match_term(&self.subject, &ground.subject, &mut seen)
            && match_term(&self.predicate, &ground.predicate, &mut seen)
            && match_term(&self.object, &ground.object, &mut seen)
    }

    /// Canonical form used as a tabling key
    ///
    /// Variables are renamed `_0`, `_1`, ... by first occurrence, with matching
    /// slot indexes, so `(?a p ?b)` and `(?x p ?y)` normalize identically.
    pub fn normalize(&self) -> Triple {
        let vars = self.variables();
        self.map_variables(|v| {
            let idx = vars.iter().position(|u| u == v).unwrap_or(0);
            Term::Variable(Variable::new(format!("_{}", idx), idx))
        })
    }
}

fn match_term<'a>(pattern: &'a Term, ground: &'a Term, seen: &mut Vec<(&'a Variable, &'a Term)>) -> bool {
    match (pattern, ground) {
        (Term::Variable(var), _) => {
            if let Some((_, bound)) = seen.iter().find(|(v, _)| *v == var) {
                *bound == ground
            } else {
                seen.push((var, ground));
                true
            }
        }
        (Term::Functor(p), Term::Functor(g)) => {
            p.name() == g.name()
                && p.arity() == g.arity()
                && p.args().iter().zip(g.args()).all(|(pa, ga)| match_term(pa, ga, seen))
        }
        _ => pattern == ground,
    }
}

impl fmt::Debug for Triple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:?} {:?} {:?})", self.subject, self.predicate, self.object)
    }
}

impl fmt::Display for Triple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({} {} {})", self.subject, self.predicate, self.object)
    }
}
