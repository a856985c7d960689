//! Rules and the indexed rule store
//!
//! A [`Rule`] is an ordered body of clauses (triple patterns or builtin
//! calls) and one or more head entries (triple patterns, or a nested rule to
//! install as a backward rule when the outer rule fires). Rules are
//! immutable once built and shared as `Arc<Rule>`.
//!
//! Variables are numbered by first occurrence when a rule is built, body
//! first, then heads, then nested rules. That number is the variable's slot
//! in the rule's [`BindingEnv`](crate::term::BindingEnv).

use std::fmt;
use std::sync::Arc;

use crate::error::{ErrorCode, ReasonerResult};
use crate::term::{BindingEnv, Functor, Term, Triple, TriplePattern, Variable};

mod store;

pub use store::{CompiledClause, CompiledRule, RuleSet, RuleStore};

/// Which engine(s) a rule is evaluated by
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Fired eagerly by the forward engine
    Forward,
    /// Proved on demand by the tabled backward engine
    Backward,
    /// Used by both engines
    Both,
}

impl Direction {
    pub fn is_forward(&self) -> bool {
        matches!(self, Direction::Forward | Direction::Both)
    }

    pub fn is_backward(&self) -> bool {
        matches!(self, Direction::Backward | Direction::Both)
    }
}

/// One premise of a rule body
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ClauseEntry {
    /// Matched against the graph (or proved, for tabled predicates)
    Pattern(TriplePattern),
    /// Evaluated by a builtin
    Call(Functor),
}

impl ClauseEntry {
    /// Pattern clause from its three terms
    pub fn pattern(subject: Term, predicate: Term, object: Term) -> Self {
        ClauseEntry::Pattern(Triple::new(subject, predicate, object))
    }

    /// Builtin call clause
    pub fn call(name: impl Into<Arc<str>>, args: Vec<Term>) -> Self {
        ClauseEntry::Call(Functor::new(name, args))
    }

    fn map_variables(&self, f: &mut impl FnMut(&Variable) -> Term) -> ClauseEntry {
        match self {
            ClauseEntry::Pattern(t) => ClauseEntry::Pattern(t.map_variables(&mut *f)),
            ClauseEntry::Call(func) => {
                ClauseEntry::Call(func.map_args(|arg| arg.map_variables(&mut *f)))
            }
        }
    }

    fn collect_variables(&self, out: &mut Vec<Variable>) {
        match self {
            ClauseEntry::Pattern(t) => {
                for term in t.terms() {
                    term.collect_variables(out);
                }
            }
            ClauseEntry::Call(func) => {
                for arg in func.args() {
                    arg.collect_variables(out);
                }
            }
        }
    }
}

impl From<Triple> for ClauseEntry {
    fn from(t: Triple) -> Self {
        ClauseEntry::Pattern(t)
    }
}

/// One conclusion of a rule
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum HeadEntry {
    /// Asserted (forward) or proved (backward)
    Pattern(TriplePattern),
    /// Installed as a backward rule when the outer rule fires
    Rule(Arc<Rule>),
}

impl HeadEntry {
    pub fn pattern(subject: Term, predicate: Term, object: Term) -> Self {
        HeadEntry::Pattern(Triple::new(subject, predicate, object))
    }
}

impl From<Triple> for HeadEntry {
    fn from(t: Triple) -> Self {
        HeadEntry::Pattern(t)
    }
}

impl From<Rule> for HeadEntry {
    fn from(r: Rule) -> Self {
        HeadEntry::Rule(Arc::new(r))
    }
}

/// A rule: body clauses, head entries, direction
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Rule {
    name: Option<String>,
    body: Vec<ClauseEntry>,
    head: Vec<HeadEntry>,
    direction: Direction,
    num_vars: usize,
}

impl Rule {
    /// Build a rule, numbering its variables by first occurrence
    pub fn new(body: Vec<ClauseEntry>, head: Vec<HeadEntry>, direction: Direction) -> Self {
        let mut vars = Vec::new();
        for clause in &body {
            clause.collect_variables(&mut vars);
        }
        for entry in &head {
            collect_head_variables(entry, &mut vars);
        }

        let names: Vec<Arc<str>> = dedup_names(&vars);
        let mut renumber = |v: &Variable| {
            let idx = names.iter().position(|n| &**n == v.name()).unwrap_or(0);
            Term::Variable(Variable::new(Arc::clone(&names[idx]), idx))
        };

        let body = body.iter().map(|c| c.map_variables(&mut renumber)).collect();
        let head = head
            .iter()
            .map(|h| renumber_head(h, &mut renumber))
            .collect();

        Rule {
            name: None,
            body,
            head,
            direction,
            num_vars: names.len(),
        }
    }

    /// Forward rule: `body -> head`
    pub fn forward(body: Vec<ClauseEntry>, head: Vec<HeadEntry>) -> Self {
        Self::new(body, head, Direction::Forward)
    }

    /// Backward rule: `head <- body`
    pub fn backward(head: TriplePattern, body: Vec<ClauseEntry>) -> Self {
        Self::new(body, vec![HeadEntry::Pattern(head)], Direction::Backward)
    }

    /// Attach a name (used in logs and derivations)
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Name for diagnostics: the given name or the rule's text
    pub fn label(&self) -> String {
        self.name.clone().unwrap_or_else(|| self.to_string())
    }

    pub fn body(&self) -> &[ClauseEntry] {
        &self.body
    }

    pub fn head(&self) -> &[HeadEntry] {
        &self.head
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Number of binding slots a rule instance needs
    pub fn num_vars(&self) -> usize {
        self.num_vars
    }

    /// True if the body has no pattern clauses (fires once, unconditionally)
    pub fn is_axiom(&self) -> bool {
        self.body.iter().all(|c| matches!(c, ClauseEntry::Call(_)))
    }

    /// The single head pattern of a backward rule
    pub fn head_pattern(&self) -> Option<&TriplePattern> {
        match self.head.as_slice() {
            [HeadEntry::Pattern(p)] => Some(p),
            _ => None,
        }
    }

    /// Check the rule is well formed for its direction and safe
    ///
    /// Nested rule heads are not checked for safety here: their variables may
    /// be bound by the outer rule when it fires.
    pub fn validate(&self) -> ReasonerResult<()> {
        crate::reasoner_ensure!(
            !self.head.is_empty(),
            ErrorCode::MalformedRule,
            "rule {} has no head",
            self.label()
        );

        if self.direction.is_backward() {
            crate::reasoner_ensure!(
                self.head_pattern().is_some(),
                ErrorCode::MalformedRule,
                "backward rule {} must have exactly one head pattern and no nested rules",
                self.label()
            );
        }

        let mut bound = Vec::new();
        for clause in &self.body {
            clause.collect_variables(&mut bound);
        }
        for entry in &self.head {
            if let HeadEntry::Pattern(p) = entry {
                if let Some(v) = p.variables().into_iter().find(|v| !bound.contains(v)) {
                    return Err(crate::reasoner_error!(
                        ErrorCode::UnsafeVariable,
                        "head variable {} of rule {} does not occur in the body",
                        v,
                        self.label()
                    )
                    .with_context("rule", self.label())
                    .with_context("variable", v.to_string()));
                }
            }
        }
        Ok(())
    }
}

fn collect_head_variables(entry: &HeadEntry, out: &mut Vec<Variable>) {
    match entry {
        HeadEntry::Pattern(t) => {
            for term in t.terms() {
                term.collect_variables(out);
            }
        }
        HeadEntry::Rule(r) => {
            for clause in &r.body {
                clause.collect_variables(out);
            }
            for e in &r.head {
                collect_head_variables(e, out);
            }
        }
    }
}

fn renumber_head(entry: &HeadEntry, f: &mut impl FnMut(&Variable) -> Term) -> HeadEntry {
    match entry {
        HeadEntry::Pattern(t) => HeadEntry::Pattern(t.map_variables(&mut *f)),
        HeadEntry::Rule(r) => {
            let body = r.body.iter().map(|c| c.map_variables(&mut *f)).collect();
            let head = r.head.iter().map(|h| renumber_head(h, &mut *f)).collect();
            HeadEntry::Rule(Arc::new(Rule {
                name: r.name.clone(),
                body,
                head,
                direction: r.direction,
                num_vars: r.num_vars,
            }))
        }
    }
}

/// Variables are identified by name while a rule is being built
fn dedup_names(vars: &[Variable]) -> Vec<Arc<str>> {
    let mut names: Vec<Arc<str>> = Vec::new();
    for v in vars {
        if !names.iter().any(|n| &**n == v.name()) {
            names.push(Arc::from(v.name()));
        }
    }
    names
}

/// Instantiate a nested head rule with the outer rule's bindings
///
/// Bound variables are replaced by their values; the remaining ones are
/// renumbered from zero, so the result is a standalone backward rule.
pub(crate) fn instantiate_nested(rule: &Rule, env: &BindingEnv) -> Rule {
    let mut substitute = |v: &Variable| {
        env.get(v)
            .cloned()
            .unwrap_or_else(|| Term::Variable(v.clone()))
    };
    let body = rule.body.iter().map(|c| c.map_variables(&mut substitute)).collect();
    let head = rule
        .head
        .iter()
        .map(|h| renumber_head(h, &mut substitute))
        .collect();
    let rebuilt = Rule::new(body, head, Direction::Backward);
    match &rule.name {
        Some(name) => rebuilt.named(name.clone()),
        None => rebuilt,
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(name) = &self.name {
            write!(f, "[{}: ", name)?;
        } else {
            write!(f, "[")?;
        }
        let body: Vec<String> = self
            .body
            .iter()
            .map(|c| match c {
                ClauseEntry::Pattern(t) => t.to_string(),
                ClauseEntry::Call(func) => func.to_string(),
            })
            .collect();
        let head: Vec<String> = self
            .head
            .iter()
            .map(|h| match h {
                HeadEntry::Pattern(t) => t.to_string(),
                HeadEntry::Rule(r) => r.to_string(),
            })
            .collect();
        match self.direction {
            Direction::Backward => write!(f, "{} <- {}]", head.join(" "), body.join(" ")),
            Direction::Forward => write!(f, "{} -> {}]", body.join(" "), head.join(" ")),
            Direction::Both => write!(f, "{} <-> {}]", body.join(" "), head.join(" ")),
        }
    }
}
