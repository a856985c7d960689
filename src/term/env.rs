//! Binding environments
//!
//! A `BindingEnv` is the substitution accumulated while resolving one rule
//! instance. Slots are indexed by [`Variable::index`]; bound values are always
//! ground, so resolving a term never has to chase variable chains.

use std::sync::Arc;

use super::{Term, Triple, Variable};

/// Fixed-size substitution for one rule instance
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BindingEnv {
    slots: Vec<Option<Term>>,
}

impl BindingEnv {
    /// Create an environment with `size` unbound slots
    pub fn new(size: usize) -> Self {
        BindingEnv {
            slots: vec![None; size],
        }
    }

    /// Number of slots
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Value bound to a variable, if any
    pub fn get(&self, var: &Variable) -> Option<&Term> {
        self.slots.get(var.index()).and_then(Option::as_ref)
    }

    /// Bind a variable to a ground value
    ///
    /// Returns false if the slot already holds a different value or if the
    /// variable's index is out of range.
    pub fn bind(&mut self, var: &Variable, value: Term) -> bool {
        debug_assert!(value.is_ground(), "binding {:?} to non-ground {:?}", var, value);
        match self.slots.get_mut(var.index()) {
            Some(Some(existing)) => *existing == value,
            Some(slot) => {
                *slot = Some(value);
                true
            }
            None => false,
        }
    }

    /// Substitute bound variables; unbound ones are left in place
    pub fn resolve(&self, term: &Term) -> Term {
        match term {
            Term::Variable(v) => self.get(v).cloned().unwrap_or_else(|| term.clone()),
            Term::Functor(f) if !f.is_ground() => {
                Term::Functor(Arc::new(f.map_args(|arg| self.resolve(arg))))
            }
            _ => term.clone(),
        }
    }

    /// Substitute bound variables in every position of a pattern
    pub fn instantiate(&self, pattern: &Triple) -> Triple {
        Triple {
            subject: self.resolve(&pattern.subject),
            predicate: self.resolve(&pattern.predicate),
            object: self.resolve(&pattern.object),
        }
    }

    /// One-way match of a pattern term against a ground term
    ///
    /// Unbound pattern variables are bound; bound ones must agree. The
    /// environment may be partially updated on failure, so callers match
    /// against a clone (see [`BindingEnv::match_triple`]).
    pub fn unify(&mut self, pattern: &Term, ground: &Term) -> bool {
        match (pattern, ground) {
            (Term::Variable(v), _) => {
                if !ground.is_ground() {
                    return false;
                }
                self.bind(v, ground.clone())
            }
            (Term::Functor(p), Term::Functor(g)) => {
                p.name() == g.name()
                    && p.arity() == g.arity()
                    && p.args().iter().zip(g.args()).all(|(pa, ga)| self.unify(pa, ga))
            }
            _ => pattern == ground,
        }
    }

    /// Match a body clause against a ground triple, returning the extended env
    pub fn match_triple(&self, pattern: &Triple, ground: &Triple) -> Option<BindingEnv> {
        let mut env = self.clone();
        let ok = env.unify(&pattern.subject, &ground.subject)
            && env.unify(&pattern.predicate, &ground.predicate)
            && env.unify(&pattern.object, &ground.object);
        ok.then_some(env)
    }

    /// Unify a rule head with a goal pattern
    ///
    /// Goal variables belong to the caller and are never bound here; a head
    /// variable is bound only when the goal holds a ground term in that
    /// position. The head instantiated after the body succeeds must still be
    /// checked against the goal, since repeated goal variables are not
    /// constrained at this point.
    pub fn unify_with_goal(&mut self, head: &Triple, goal: &Triple) -> bool {
        self.unify_goal_term(&head.subject, &goal.subject)
            && self.unify_goal_term(&head.predicate, &goal.predicate)
            && self.unify_goal_term(&head.object, &goal.object)
    }

    fn unify_goal_term(&mut self, head: &Term, goal: &Term) -> bool {
        match (head, goal) {
            (_, Term::Variable(_)) => true,
            (Term::Variable(v), _) => {
                if goal.is_ground() {
                    self.bind(v, goal.clone())
                } else {
                    self.get(v).map_or(true, |bound| goal.matches(bound))
                }
            }
            (Term::Functor(h), Term::Functor(g)) => {
                h.name() == g.name()
                    && h.arity() == g.arity()
                    && h.args().iter().zip(g.args()).all(|(ha, ga)| self.unify_goal_term(ha, ga))
            }
            _ => head == goal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn var(name: &str, index: usize) -> Term {
        Term::Variable(Variable::new(name, index))
    }

    #[test]
    fn test_bind_and_resolve() {
        let mut env = BindingEnv::new(2);
        let x = Variable::new("x", 0);
        assert!(env.bind(&x, Term::uri("urn:a")));
        assert!(env.bind(&x, Term::uri("urn:a")));
        assert!(!env.bind(&x, Term::uri("urn:b")));

        assert_eq!(env.resolve(&var("x", 0)), Term::uri("urn:a"));
        assert_eq!(env.resolve(&var("y", 1)), var("y", 1));
    }

    #[test]
    fn test_resolve_inside_functor() {
        let mut env = BindingEnv::new(1);
        env.bind(&Variable::new("x", 0), Term::literal("boom"));
        let f = Term::functor("error", vec![var("x", 0)]);
        assert_eq!(env.resolve(&f), Term::functor("error", vec![Term::literal("boom")]));
    }

    #[test]
    fn test_match_triple_repeated_variable() {
        let env = BindingEnv::new(1);
        let pattern = Triple::new(var("x", 0), Term::uri("urn:p"), var("x", 0));

        let same = Triple::new(Term::uri("urn:a"), Term::uri("urn:p"), Term::uri("urn:a"));
        let diff = Triple::new(Term::uri("urn:a"), Term::uri("urn:p"), Term::uri("urn:b"));

        assert!(env.match_triple(&pattern, &same).is_some());
        assert!(env.match_triple(&pattern, &diff).is_none());
    }

    #[test]
    fn test_match_does_not_touch_original() {
        let env = BindingEnv::new(2);
        let pattern = Triple::new(var("x", 0), Term::uri("urn:p"), var("y", 1));
        let ground = Triple::new(Term::uri("urn:a"), Term::uri("urn:p"), Term::uri("urn:b"));

        let extended = env.match_triple(&pattern, &ground).unwrap();
        assert_eq!(extended.get(&Variable::new("y", 1)), Some(&Term::uri("urn:b")));
        assert_eq!(env.get(&Variable::new("y", 1)), None);
    }

    #[test]
    fn test_unify_with_goal_binds_only_from_ground_goal_terms() {
        let mut env = BindingEnv::new(2);
        let head = Triple::new(var("x", 0), Term::uri("urn:ancestor"), var("y", 1));
        let goal = Triple::new(Term::uri("urn:a"), Term::uri("urn:ancestor"), Term::var("q"));

        assert!(env.unify_with_goal(&head, &goal));
        assert_eq!(env.get(&Variable::new("x", 0)), Some(&Term::uri("urn:a")));
        assert_eq!(env.get(&Variable::new("y", 1)), None);
    }

    #[test]
    fn test_unify_with_goal_rejects_constant_clash() {
        let mut env = BindingEnv::new(0);
        let head = Triple::new(Term::uri("urn:a"), Term::uri("urn:p"), Term::uri("urn:b"));
        let goal = Triple::new(Term::var("s"), Term::uri("urn:q"), Term::var("o"));
        assert!(!env.unify_with_goal(&head, &goal));
    }
}
