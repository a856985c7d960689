//! Rule store: validated, compiled and indexed rules
//!
//! Built once per reasoner and shared read-only (`Arc<RuleStore>`) by every
//! inference graph it binds. Backward rules installed at run time by forward
//! firings go into an inference-graph-local [`RuleSet`] instead.

use std::sync::Arc;

use fnv::FnvHashSet;
use indexmap::IndexMap;
use tracing::debug;

use super::{ClauseEntry, HeadEntry, Rule};
use crate::builtins::{Builtin, BuiltinRegistry};
use crate::error::{ErrorCode, ReasonerResult};
use crate::term::{BindingEnv, Term, TriplePattern};

// ============================================================================
// Compiled rules
// ============================================================================

/// A body clause with its builtin resolved
#[derive(Clone, Debug)]
pub enum CompiledClause {
    Pattern(TriplePattern),
    Call { builtin: Builtin, args: Vec<Term> },
}

/// A validated rule with builtins resolved to function pointers
#[derive(Debug)]
pub struct CompiledRule {
    rule: Arc<Rule>,
    body: Vec<CompiledClause>,
}

impl CompiledRule {
    /// Validate a rule and resolve its builtin calls
    pub fn compile(rule: Arc<Rule>, registry: &BuiltinRegistry) -> ReasonerResult<Self> {
        rule.validate()?;
        let body = resolve_body(&rule, rule.body(), registry)?;
        check_nested_calls(&rule, registry)?;
        Ok(CompiledRule { rule, body })
    }

    pub fn rule(&self) -> &Arc<Rule> {
        &self.rule
    }

    pub fn body(&self) -> &[CompiledClause] {
        &self.body
    }

    pub fn num_vars(&self) -> usize {
        self.rule.num_vars()
    }

    /// Head pattern (backward rules have exactly one)
    pub fn head_pattern(&self) -> Option<&TriplePattern> {
        self.rule.head_pattern()
    }

    /// Whether this backward rule's head could produce answers for `goal`
    pub fn head_matches(&self, goal: &TriplePattern) -> bool {
        match self.head_pattern() {
            Some(head) => BindingEnv::new(self.num_vars()).unify_with_goal(head, goal),
            None => false,
        }
    }
}

fn resolve_body(
    rule: &Rule,
    body: &[ClauseEntry],
    registry: &BuiltinRegistry,
) -> ReasonerResult<Vec<CompiledClause>> {
    body.iter()
        .map(|clause| match clause {
            ClauseEntry::Pattern(p) => Ok(CompiledClause::Pattern(p.clone())),
            ClauseEntry::Call(f) => {
                let builtin = resolve_call(rule, f.name(), f.arity(), registry)?;
                Ok(CompiledClause::Call {
                    builtin,
                    args: f.args().to_vec(),
                })
            }
        })
        .collect()
}

fn resolve_call(
    rule: &Rule,
    name: &str,
    arity: usize,
    registry: &BuiltinRegistry,
) -> ReasonerResult<Builtin> {
    let Some(builtin) = registry.get(name).copied() else {
        return Err(crate::reasoner_error!(
            ErrorCode::UnknownBuiltin,
            "rule {} calls unknown builtin {}",
            rule.label(),
            name
        )
        .with_context("builtin", name));
    };
    crate::reasoner_ensure!(
        builtin.arity().accepts(arity),
        ErrorCode::BuiltinArity,
        "builtin {} takes {} arguments, rule {} passes {}",
        name,
        builtin.arity(),
        rule.label(),
        arity
    );
    Ok(builtin)
}

/// Builtins inside nested rules are resolved up front too
fn check_nested_calls(rule: &Rule, registry: &BuiltinRegistry) -> ReasonerResult<()> {
    for entry in rule.head() {
        if let HeadEntry::Rule(nested) = entry {
            resolve_body(nested, nested.body(), registry)?;
            check_nested_calls(nested, registry)?;
        }
    }
    Ok(())
}

// ============================================================================
// Backward rule set
// ============================================================================

/// Backward rules indexed by head predicate
///
/// Rules whose head predicate is a variable live in a wildcard bucket that
/// every lookup also consults.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<Arc<CompiledRule>>,
    by_predicate: IndexMap<Term, Vec<usize>>,
    wildcard: Vec<usize>,
    seen: FnvHashSet<Arc<Rule>>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a compiled backward rule; returns false if an identical rule is present
    pub fn insert(&mut self, compiled: Arc<CompiledRule>) -> bool {
        if !self.seen.insert(Arc::clone(compiled.rule())) {
            return false;
        }
        let idx = self.rules.len();
        match compiled.head_pattern().map(|h| &h.predicate) {
            Some(pred) if pred.is_ground() => {
                self.by_predicate.entry(pred.clone()).or_default().push(idx);
            }
            _ => self.wildcard.push(idx),
        }
        self.rules.push(compiled);
        true
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Every rule, in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &Arc<CompiledRule>> {
        self.rules.iter()
    }

    /// Rules that might prove `pattern`, in index order
    ///
    /// A bound predicate selects its bucket followed by the wildcard bucket;
    /// an unbound predicate selects every rule.
    pub fn candidates<'a>(&'a self, pattern: &TriplePattern) -> Vec<&'a Arc<CompiledRule>> {
        if !pattern.predicate.is_ground() {
            return self.rules.iter().collect();
        }
        let bucket = self
            .by_predicate
            .get(&pattern.predicate)
            .map(Vec::as_slice)
            .unwrap_or(&[]);
        bucket
            .iter()
            .chain(self.wildcard.iter())
            .map(|&i| &self.rules[i])
            .collect()
    }

    /// Whether any rule's head can match `pattern`
    pub fn can_prove(&self, pattern: &TriplePattern) -> bool {
        self.candidates(pattern).iter().any(|r| r.head_matches(pattern))
    }
}

// ============================================================================
// Rule store
// ============================================================================

/// Position of a pattern clause inside a forward rule
pub type ClauseRef = (usize, usize);

/// All rules of a reasoner, validated and indexed
#[derive(Debug)]
pub struct RuleStore {
    rules: Vec<Arc<Rule>>,
    forward: Vec<Arc<CompiledRule>>,
    forward_index: IndexMap<Term, Vec<ClauseRef>>,
    forward_wildcard: Vec<ClauseRef>,
    axioms: Vec<usize>,
    backward: RuleSet,
    registry: Arc<BuiltinRegistry>,
}

impl RuleStore {
    /// Validate, compile and index a rule list
    ///
    /// Fails on the first malformed or unsafe rule, unknown builtin or
    /// arity mismatch; no partial store is returned.
    pub fn index(rules: Vec<Rule>, registry: Arc<BuiltinRegistry>) -> ReasonerResult<Self> {
        let mut store = RuleStore {
            rules: Vec::with_capacity(rules.len()),
            forward: Vec::new(),
            forward_index: IndexMap::new(),
            forward_wildcard: Vec::new(),
            axioms: Vec::new(),
            backward: RuleSet::new(),
            registry,
        };

        for rule in rules {
            let rule = Arc::new(rule);
            let compiled = Arc::new(CompiledRule::compile(Arc::clone(&rule), &store.registry)?);

            if rule.direction().is_forward() {
                let fidx = store.forward.len();
                if rule.is_axiom() {
                    store.axioms.push(fidx);
                }
                for (cidx, clause) in compiled.body().iter().enumerate() {
                    if let CompiledClause::Pattern(p) = clause {
                        if p.predicate.is_ground() {
                            store
                                .forward_index
                                .entry(p.predicate.clone())
                                .or_default()
                                .push((fidx, cidx));
                        } else {
                            store.forward_wildcard.push((fidx, cidx));
                        }
                    }
                }
                store.forward.push(Arc::clone(&compiled));
            }

            if rule.direction().is_backward() {
                store.backward.insert(compiled);
            }
            store.rules.push(rule);
        }

        debug!(
            rules = store.rules.len(),
            forward = store.forward.len(),
            backward = store.backward.len(),
            axioms = store.axioms.len(),
            "rule store built"
        );
        Ok(store)
    }

    /// The rules as given, in declaration order
    pub fn rules(&self) -> &[Arc<Rule>] {
        &self.rules
    }

    pub fn forward_rules(&self) -> &[Arc<CompiledRule>] {
        &self.forward
    }

    pub fn backward_rules(&self) -> &RuleSet {
        &self.backward
    }

    /// Forward rules with no pattern clauses
    pub fn axioms(&self) -> impl Iterator<Item = &Arc<CompiledRule>> {
        self.axioms.iter().map(|&i| &self.forward[i])
    }

    /// Forward `(rule, clause)` pairs a triple with this predicate can trigger
    ///
    /// Indexed entries come first, then variable-predicate clauses.
    pub fn forward_triggers<'a>(&'a self, predicate: &Term) -> impl Iterator<Item = ClauseRef> + 'a {
        let bucket = self
            .forward_index
            .get(predicate)
            .map(Vec::as_slice)
            .unwrap_or(&[]);
        bucket.iter().chain(self.forward_wildcard.iter()).copied()
    }

    /// Backward rules that might prove `pattern`
    pub fn backward_candidates<'a>(&'a self, pattern: &TriplePattern) -> Vec<&'a Arc<CompiledRule>> {
        self.backward.candidates(pattern)
    }

    /// Whether a backward rule head can match `pattern`
    pub fn is_tabled(&self, pattern: &TriplePattern) -> bool {
        self.backward.can_prove(pattern)
    }

    /// Whether any rule body has a pattern clause on this predicate
    pub fn uses_predicate(&self, predicate: &Term) -> bool {
        self.forward_index.contains_key(predicate)
            || self.backward.iter().any(|rule| {
                rule.body().iter().any(|clause| {
                    matches!(clause, CompiledClause::Pattern(p) if &p.predicate == predicate)
                })
            })
    }

    pub fn registry(&self) -> &Arc<BuiltinRegistry> {
        &self.registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::Direction;
    use crate::term::Triple;

    fn p(s: Term, pred: &str, o: Term) -> Triple {
        Triple::new(s, Term::uri(pred), o)
    }

    fn registry() -> Arc<BuiltinRegistry> {
        Arc::new(BuiltinRegistry::new())
    }

    #[test]
    fn test_split_and_index() {
        let rules = vec![
            Rule::forward(
                vec![p(Term::var("x"), "urn:type", Term::uri("urn:Dog")).into()],
                vec![p(Term::var("x"), "urn:type", Term::uri("urn:Animal")).into()],
            ),
            Rule::backward(
                p(Term::var("x"), "urn:anc", Term::var("y")),
                vec![p(Term::var("x"), "urn:par", Term::var("y")).into()],
            ),
            Rule::new(
                vec![Triple::new(Term::var("s"), Term::var("p"), Term::var("o")).into()],
                vec![p(Term::var("s"), "urn:mentions", Term::var("o")).into()],
                Direction::Both,
            ),
        ];
        let store = RuleStore::index(rules, registry()).unwrap();

        assert_eq!(store.rules().len(), 3);
        assert_eq!(store.forward_rules().len(), 2);
        assert_eq!(store.backward_rules().len(), 2);

        let triggers: Vec<_> = store.forward_triggers(&Term::uri("urn:type")).collect();
        assert_eq!(triggers, vec![(0, 0), (1, 0)]);
        let other: Vec<_> = store.forward_triggers(&Term::uri("urn:zzz")).collect();
        assert_eq!(other, vec![(1, 0)]);
    }

    #[test]
    fn test_backward_candidates_and_tabling() {
        let rules = vec![Rule::backward(
            p(Term::var("x"), "urn:anc", Term::var("y")),
            vec![p(Term::var("x"), "urn:par", Term::var("y")).into()],
        )];
        let store = RuleStore::index(rules, registry()).unwrap();

        let goal = p(Term::uri("urn:a"), "urn:anc", Term::var("y"));
        assert_eq!(store.backward_candidates(&goal).len(), 1);
        assert!(store.is_tabled(&goal));
        assert!(!store.is_tabled(&p(Term::var("x"), "urn:par", Term::var("y"))));
        assert!(store.is_tabled(&Triple::new(Term::var("s"), Term::var("p"), Term::var("o"))));
    }

    #[test]
    fn test_constant_head_is_not_tabled_for_other_subject() {
        let rules = vec![Rule::backward(
            p(Term::uri("urn:a"), "urn:q", Term::var("y")),
            vec![p(Term::uri("urn:a"), "urn:p", Term::var("y")).into()],
        )];
        let store = RuleStore::index(rules, registry()).unwrap();
        assert!(store.is_tabled(&p(Term::uri("urn:a"), "urn:q", Term::var("o"))));
        assert!(!store.is_tabled(&p(Term::uri("urn:b"), "urn:q", Term::var("o"))));
    }

    #[test]
    fn test_uses_predicate() {
        let rules = vec![
            Rule::forward(
                vec![p(Term::var("x"), "urn:type", Term::uri("urn:Dog")).into()],
                vec![p(Term::var("x"), "urn:tag", Term::uri("urn:dog")).into()],
            ),
            Rule::backward(
                p(Term::var("x"), "urn:anc", Term::var("y")),
                vec![p(Term::var("x"), "urn:par", Term::var("y")).into()],
            ),
        ];
        let store = RuleStore::index(rules, registry()).unwrap();
        assert!(store.uses_predicate(&Term::uri("urn:type")));
        assert!(store.uses_predicate(&Term::uri("urn:par")));
        assert!(!store.uses_predicate(&Term::uri("urn:tag")));
        assert!(!store.uses_predicate(&Term::uri("urn:anc")));
    }

    #[test]
    fn test_unknown_builtin_rejected() {
        let rules = vec![Rule::forward(
            vec![
                p(Term::var("x"), "urn:p", Term::var("y")).into(),
                ClauseEntry::call("frobnicate", vec![Term::var("x")]),
            ],
            vec![p(Term::var("y"), "urn:p", Term::var("x")).into()],
        )];
        let err = RuleStore::index(rules, registry()).unwrap_err();
        assert_eq!(err.code, ErrorCode::UnknownBuiltin);
    }

    #[test]
    fn test_arity_mismatch_rejected() {
        let rules = vec![Rule::forward(
            vec![
                p(Term::var("x"), "urn:p", Term::var("y")).into(),
                ClauseEntry::call("sum", vec![Term::var("x"), Term::var("y")]),
            ],
            vec![p(Term::var("y"), "urn:p", Term::var("x")).into()],
        )];
        let err = RuleStore::index(rules, registry()).unwrap_err();
        assert_eq!(err.code, ErrorCode::BuiltinArity);
    }

    #[test]
    fn test_nested_rule_builtins_checked() {
        let nested = Rule::backward(
            p(Term::var("a"), "urn:q", Term::var("b")),
            vec![
                p(Term::var("a"), "urn:p", Term::var("b")).into(),
                ClauseEntry::call("nope", vec![]),
            ],
        );
        let rules = vec![Rule::forward(
            vec![p(Term::var("x"), "urn:flag", Term::var("y")).into()],
            vec![nested.into()],
        )];
        let err = RuleStore::index(rules, registry()).unwrap_err();
        assert_eq!(err.code, ErrorCode::UnknownBuiltin);
    }

    #[test]
    fn test_rule_set_dedups() {
        let rule = Arc::new(Rule::backward(
            p(Term::var("x"), "urn:q", Term::var("y")),
            vec![p(Term::var("x"), "urn:p", Term::var("y")).into()],
        ));
        let reg = BuiltinRegistry::new();
        let mut set = RuleSet::new();
        assert!(set.insert(Arc::new(CompiledRule::compile(Arc::clone(&rule), &reg).unwrap())));
        assert!(!set.insert(Arc::new(CompiledRule::compile(rule, &reg).unwrap())));
        assert_eq!(set.len(), 1);
    }
}
