//! Inference graphs
//!
//! An [`InfGraph`] answers pattern queries over raw data, the bound schema
//! closure and forward deductions, extended by tabled backward proof search:
//!
//! - a pattern no backward rule can prove is a plain union lookup
//! - any other pattern is answered by its generator, pumped lazily as the
//!   caller pulls from [`Find`]
//!
//! Adding a triple extends the forward closure incrementally; deleting one
//! recomputes it. Both drop every tabled goal, so later queries see the new
//! state.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use super::SchemaClosure;
use crate::config::ReasoningConfig;
use crate::core::{ns, Graph};
use crate::error::{ErrorCode, ReasonerError, ReasonerResult};
use crate::reasoning::{
    BackwardEngine, BackwardStats, BuiltinFailure, Context, Derivation, DerivationFormatter,
    ForwardEngine, ForwardStats, GeneratorId, RuleView, Severity, Sources, ValidityEntry,
    ValidityReport,
};
use crate::rules::RuleStore;
use crate::store::Store;
use crate::term::{Term, Triple, TriplePattern};

/// Snapshot of an inference graph's counters
#[derive(Debug, Clone, Copy, Serialize)]
pub struct InfGraphStats {
    pub raw: usize,
    pub schema: usize,
    pub deductions: usize,
    pub tabled_goals: usize,
    pub schema_forward: ForwardStats,
    pub forward: ForwardStats,
    pub backward: BackwardStats,
}

/// A data graph bound to a reasoner
pub struct InfGraph {
    rules: Arc<RuleStore>,
    config: ReasoningConfig,
    schema: Arc<SchemaClosure>,
    data: Store,
    forward: ForwardEngine,
    backward: BackwardEngine,
    closed: bool,
}

impl InfGraph {
    pub(super) fn new(
        rules: Arc<RuleStore>,
        config: ReasoningConfig,
        schema: Arc<SchemaClosure>,
        data: Store,
    ) -> ReasonerResult<Self> {
        let forward = ForwardEngine::new(Arc::clone(&rules), &config)
            .with_installed(schema.installed().clone());
        let backward = BackwardEngine::new(&config);
        let mut graph = InfGraph {
            rules,
            config,
            schema,
            data,
            forward,
            backward,
            closed: false,
        };
        if graph.config.mode.runs_forward() {
            graph.forward.run(&graph.data, graph.schema.graph())?;
        }
        debug!(
            raw = graph.data.len(),
            deductions = graph.forward.deductions().len(),
            mode = graph.config.mode.as_str(),
            "inference graph bound"
        );
        Ok(graph)
    }

    /// The source graphs and rule view, split from the mutable backward engine
    fn parts(&mut self) -> (&mut BackwardEngine, Context<'_>) {
        let base = self
            .config
            .mode
            .runs_backward()
            .then(|| self.rules.backward_rules());
        let ctx = Context {
            sources: Sources::new(&self.data, self.schema.graph(), self.forward.deductions()),
            rules: RuleView::new(base, self.forward.installed()),
        };
        (&mut self.backward, ctx)
    }

    fn sources(&self) -> Sources<'_> {
        Sources::new(&self.data, self.schema.graph(), self.forward.deductions())
    }

    fn ensure_open(&self) -> ReasonerResult<()> {
        if self.closed {
            return Err(ReasonerError::closed());
        }
        Ok(())
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Lazily answer a pattern
    ///
    /// Answers come raw data first, then schema, then forward deductions,
    /// then backward proofs, each at most once. A fatal builtin error is
    /// yielded as an `Err` item and ends the iteration.
    pub fn find(&mut self, pattern: &TriplePattern) -> Find<'_> {
        if self.closed {
            return Find {
                inner: FindInner::Failed(Some(ReasonerError::closed())),
            };
        }

        let generator = {
            let (backward, ctx) = self.parts();
            ctx.rules
                .is_tabled(pattern)
                .then(|| backward.generator_for(&ctx, pattern))
        };
        match generator {
            Some(generator) => Find {
                inner: FindInner::Tabled {
                    graph: self,
                    generator,
                    next: 0,
                },
            },
            None => {
                let graph: &InfGraph = self;
                Find {
                    inner: FindInner::Direct(Box::new(graph.sources().find(pattern))),
                }
            }
        }
    }

    /// All answers to a pattern
    pub fn query(&mut self, pattern: &TriplePattern) -> ReasonerResult<Vec<Triple>> {
        self.find(pattern).collect()
    }

    /// Whether a ground triple holds
    pub fn contains(&mut self, triple: &Triple) -> ReasonerResult<bool> {
        self.find(triple).next().transpose().map(|t| t.is_some())
    }

    // ========================================================================
    // Updates
    // ========================================================================

    /// Add a raw triple; false if it was already present
    pub fn add(&mut self, triple: Triple) -> ReasonerResult<bool> {
        self.ensure_open()?;
        crate::reasoner_ensure!(
            triple.is_ground(),
            ErrorCode::NonGroundTriple,
            "cannot add non-ground triple {}",
            triple
        );
        if !self.data.insert(triple.clone()) {
            return Ok(false);
        }
        if self.config.mode.runs_forward() {
            self.forward.add_triple(&self.data, self.schema.graph(), triple)?;
        }
        self.backward.reset();
        Ok(true)
    }

    /// Remove a raw triple and recompute the forward closure
    ///
    /// Returns false if the triple was not in the raw data.
    pub fn delete(&mut self, triple: &Triple) -> ReasonerResult<bool> {
        self.ensure_open()?;
        if !self.data.remove(triple) {
            return Ok(false);
        }
        self.rebuild()?;
        Ok(true)
    }

    fn rebuild(&mut self) -> ReasonerResult<()> {
        self.forward = ForwardEngine::new(Arc::clone(&self.rules), &self.config)
            .with_installed(self.schema.installed().clone());
        if self.config.mode.runs_forward() {
            self.forward.run(&self.data, self.schema.graph())?;
        }
        self.backward.reset();
        debug!(deductions = self.forward.deductions().len(), "forward closure rebuilt");
        Ok(())
    }

    /// Drop every tabled goal; forward deductions are kept
    pub fn reset(&mut self) {
        self.backward.reset();
    }

    /// Release the tables; later queries and updates fail
    pub fn close(&mut self) {
        self.backward.reset();
        self.closed = true;
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    // ========================================================================
    // Validation
    // ========================================================================

    /// Check the graph for rule-reported violations
    ///
    /// While validating, a `(_:b rb:validation on())` triple is asserted so
    /// rules guarded on it fire; it is retracted afterwards. Conclusions
    /// `(?x rb:violation ?report)` become report entries. A forward run
    /// that hit the firing threshold and rejected installed rules are
    /// reported as warnings.
    pub fn validate(&mut self) -> ValidityReport {
        let mut report = ValidityReport::new();
        if self.closed {
            report.add(ValidityEntry::new(
                Severity::Error,
                "closed",
                ReasonerError::closed().message,
            ));
            return report;
        }

        let switch = self
            .rules
            .uses_predicate(&Term::uri(ns::RB_VALIDATION))
            .then(|| Triple::new(Term::fresh_blank(), Term::uri(ns::RB_VALIDATION), Term::functor("on", vec![])));
        if let Some(flag) = &switch {
            if let Err(e) = self.add(flag.clone()) {
                report.add(ValidityEntry::new(Severity::Error, "reasoning", e.to_string()));
            }
        }

        let violations = Triple::new(Term::var("x"), Term::uri(ns::RB_VIOLATION), Term::var("r"));
        match self.query(&violations) {
            Ok(found) => {
                for triple in &found {
                    report.add(ValidityEntry::from_violation(triple));
                }
            }
            Err(e) => report.add(ValidityEntry::new(Severity::Error, "reasoning", e.to_string())),
        }

        if let Some(flag) = &switch {
            if let Err(e) = self.delete(flag) {
                report.add(ValidityEntry::new(Severity::Error, "reasoning", e.to_string()));
            }
        }

        if self.schema.stats().threshold_exceeded || self.forward.stats().threshold_exceeded {
            report.add(ValidityEntry::new(
                Severity::Warning,
                "threshold",
                format!(
                    "forward chaining stopped after {} rule firings; deductions may be incomplete",
                    self.config.rule_threshold
                ),
            ));
        }
        for rejected in self.forward.rejected() {
            report.add(ValidityEntry::new(Severity::Warning, "rule", rejected.message.clone()));
        }

        if !report.is_valid() {
            warn!(errors = report.errors().count(), "validation failed");
        }
        debug!(entries = report.len(), "validation finished");
        report
    }

    // ========================================================================
    // Introspection
    // ========================================================================

    /// Recorded derivations of a triple from the schema, forward and backward logs
    pub fn derivations(&self, triple: &Triple) -> Vec<&Derivation> {
        self.schema
            .derivations()
            .get(triple)
            .iter()
            .chain(self.forward.derivations().get(triple))
            .chain(self.backward.derivations().get(triple))
            .collect()
    }

    /// Derivation tree of a triple as indented text
    pub fn explain(&self, triple: &Triple) -> String {
        DerivationFormatter::with_lookup(|t| self.derivations(t)).to_text(triple)
    }

    /// Soft builtin errors seen by either engine
    pub fn builtin_errors(&self) -> Vec<&BuiltinFailure> {
        self.forward
            .failures()
            .iter()
            .chain(self.backward.failures())
            .collect()
    }

    pub fn raw(&self) -> &Store {
        &self.data
    }

    pub fn deductions(&self) -> &Store {
        self.forward.deductions()
    }

    pub fn schema(&self) -> &Store {
        self.schema.graph()
    }

    pub fn config(&self) -> &ReasoningConfig {
        &self.config
    }

    pub fn stats(&self) -> InfGraphStats {
        InfGraphStats {
            raw: self.data.len(),
            schema: self.schema.graph().len(),
            deductions: self.forward.deductions().len(),
            tabled_goals: self.backward.len(),
            schema_forward: self.schema.stats(),
            forward: self.forward.stats(),
            backward: self.backward.stats(),
        }
    }
}

// ============================================================================
// Find iterator
// ============================================================================

/// Lazy answers to one pattern
pub struct Find<'a> {
    inner: FindInner<'a>,
}

enum FindInner<'a> {
    Direct(Box<dyn Iterator<Item = Triple> + 'a>),
    Tabled {
        graph: &'a mut InfGraph,
        generator: GeneratorId,
        next: usize,
    },
    Failed(Option<ReasonerError>),
}

impl Iterator for Find<'_> {
    type Item = ReasonerResult<Triple>;

    fn next(&mut self) -> Option<Self::Item> {
        let item = match &mut self.inner {
            FindInner::Direct(iter) => iter.next().map(Ok),
            FindInner::Failed(err) => err.take().map(Err),
            FindInner::Tabled {
                graph,
                generator,
                next,
            } => next_tabled(graph, *generator, next),
        };
        if matches!(item, Some(Err(_))) {
            self.inner = FindInner::Failed(None);
        }
        item
    }
}

fn next_tabled(
    graph: &mut InfGraph,
    generator: GeneratorId,
    next: &mut usize,
) -> Option<ReasonerResult<Triple>> {
    let batch = graph.config.pump_batch;
    loop {
        if let Some(answer) = graph.backward.result(generator, *next) {
            *next += 1;
            return Some(Ok(answer.clone()));
        }
        if graph.backward.is_complete(generator) {
            return None;
        }
        let (backward, ctx) = graph.parts();
        if let Err(e) = backward.pump(&ctx, generator, batch) {
            warn!(goal = %backward.goal(generator), error = %e, "query aborted");
            backward.reset();
            return Some(Err(e));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtins::{Arity, BuiltinError, BuiltinResult};
    use crate::config::ReasoningMode;
    use crate::reasoner::Reasoner;
    use crate::rules::{ClauseEntry, Rule};

    fn t(s: &str, p: &str, o: &str) -> Triple {
        Triple::new(Term::uri(s), Term::uri(p), Term::uri(o))
    }

    fn pat(s: Term, p: &str, o: Term) -> Triple {
        Triple::new(s, Term::uri(p), o)
    }

    fn v(name: &str) -> Term {
        Term::var(name)
    }

    fn ancestor_rules() -> Vec<Rule> {
        vec![
            Rule::backward(
                pat(v("x"), "urn:anc", v("y")),
                vec![pat(v("x"), "urn:parent", v("y")).into()],
            ),
            Rule::backward(
                pat(v("x"), "urn:anc", v("z")),
                vec![
                    pat(v("x"), "urn:anc", v("y")).into(),
                    pat(v("y"), "urn:parent", v("z")).into(),
                ],
            ),
        ]
    }

    /// `anc(x, y) :- parent(x, z), anc(z, y)`
    fn right_recursive_ancestor_rules() -> Vec<Rule> {
        vec![
            Rule::backward(
                pat(v("x"), "urn:anc", v("y")),
                vec![pat(v("x"), "urn:parent", v("y")).into()],
            ),
            Rule::backward(
                pat(v("x"), "urn:anc", v("y")),
                vec![
                    pat(v("x"), "urn:parent", v("z")).into(),
                    pat(v("z"), "urn:anc", v("y")).into(),
                ],
            ),
        ]
    }

    fn family() -> Store {
        Store::from_triples(vec![
            t("urn:a", "urn:parent", "urn:b"),
            t("urn:b", "urn:parent", "urn:c"),
        ])
    }

    fn objects(triples: &[Triple]) -> Vec<Term> {
        triples.iter().map(|t| t.object.clone()).collect()
    }

    fn halt(_args: &[Term]) -> Result<BuiltinResult, BuiltinError> {
        Err(BuiltinError::Fatal("halt called".into()))
    }

    #[test]
    fn test_symmetric_rule_closure() {
        let reasoner = Reasoner::new(vec![Rule::forward(
            vec![pat(v("x"), "urn:p", v("y")).into()],
            vec![pat(v("y"), "urn:p", v("x")).into()],
        )])
        .unwrap();
        let mut graph = reasoner
            .bind(Store::from_triples(vec![t("urn:a", "urn:p", "urn:b")]))
            .unwrap();

        let all = graph.query(&pat(v("s"), "urn:p", v("o"))).unwrap();
        assert_eq!(all, vec![t("urn:a", "urn:p", "urn:b"), t("urn:b", "urn:p", "urn:a")]);
        assert_eq!(graph.deductions().len(), 1);
    }

    #[test]
    fn test_forward_type_propagation() {
        let reasoner = Reasoner::new(vec![Rule::forward(
            vec![pat(v("x"), "urn:type", Term::uri("urn:Dog")).into()],
            vec![pat(v("x"), "urn:type", Term::uri("urn:Animal")).into()],
        )])
        .unwrap();
        let mut graph = reasoner
            .bind(Store::from_triples(vec![t("urn:rex", "urn:type", "urn:Dog")]))
            .unwrap();
        assert!(graph.contains(&t("urn:rex", "urn:type", "urn:Animal")).unwrap());
        assert!(!graph.contains(&t("urn:rex", "urn:type", "urn:Cat")).unwrap());
    }

    #[test]
    fn test_tabled_ancestor_query() {
        let reasoner = Reasoner::new(ancestor_rules()).unwrap();
        let mut graph = reasoner.bind(family()).unwrap();

        let answers = graph.query(&pat(Term::uri("urn:a"), "urn:anc", v("w"))).unwrap();
        assert_eq!(objects(&answers), vec![Term::uri("urn:b"), Term::uri("urn:c")]);
        assert!(graph.stats().backward.generators_completed >= 1);
    }

    #[test]
    fn test_right_recursive_ancestor_after_partial_find() {
        let reasoner = Reasoner::builder()
            .rules(right_recursive_ancestor_rules())
            .reasoning(ReasoningConfig {
                pump_batch: 1,
                ..ReasoningConfig::default()
            })
            .build()
            .unwrap();
        let mut graph = reasoner.bind(family()).unwrap();
        let from_b = pat(Term::uri("urn:b"), "urn:anc", v("w"));

        // leave the b goal partly pumped before asking about a
        {
            let mut find = graph.find(&from_b);
            let first = find.next().unwrap().unwrap();
            assert_eq!(first, t("urn:b", "urn:anc", "urn:c"));
        }

        let answers = graph.query(&pat(Term::uri("urn:a"), "urn:anc", v("w"))).unwrap();
        assert_eq!(
            answers,
            vec![t("urn:a", "urn:anc", "urn:b"), t("urn:a", "urn:anc", "urn:c")]
        );
        assert_eq!(graph.query(&from_b).unwrap(), vec![t("urn:b", "urn:anc", "urn:c")]);
    }

    #[test]
    fn test_right_recursive_ancestor_terminates_on_cycles() {
        let reasoner = Reasoner::new(right_recursive_ancestor_rules()).unwrap();
        let mut graph = reasoner
            .bind(Store::from_triples(vec![
                t("urn:a", "urn:parent", "urn:b"),
                t("urn:b", "urn:parent", "urn:c"),
                t("urn:c", "urn:parent", "urn:a"),
            ]))
            .unwrap();

        let from_a = objects(&graph.query(&pat(Term::uri("urn:a"), "urn:anc", v("w"))).unwrap());
        assert_eq!(from_a.len(), 3);
        for node in ["urn:a", "urn:b", "urn:c"] {
            assert!(from_a.contains(&Term::uri(node)));
        }

        let all = graph.query(&pat(v("x"), "urn:anc", v("y"))).unwrap();
        assert_eq!(all.len(), 9);
        for (i, answer) in all.iter().enumerate() {
            assert!(!all[i + 1..].contains(answer));
        }
        assert_eq!(graph.query(&pat(Term::uri("urn:b"), "urn:anc", v("w"))).unwrap().len(), 3);
    }

    #[test]
    fn test_lazy_find_yields_each_answer_once() {
        let reasoner = Reasoner::builder()
            .rules(ancestor_rules())
            .reasoning(ReasoningConfig {
                pump_batch: 1,
                ..ReasoningConfig::default()
            })
            .build()
            .unwrap();
        let mut graph = reasoner
            .bind(Store::from_triples(vec![
                t("urn:a", "urn:parent", "urn:b"),
                t("urn:b", "urn:parent", "urn:c"),
                t("urn:c", "urn:parent", "urn:a"),
            ]))
            .unwrap();

        let mut find = graph.find(&pat(Term::uri("urn:a"), "urn:anc", v("w")));
        let first = find.next().unwrap().unwrap();
        assert_eq!(first.object, Term::uri("urn:b"));
        let rest: Vec<Triple> = find.map(Result::unwrap).collect();
        assert_eq!(objects(&rest), vec![Term::uri("urn:c"), Term::uri("urn:a")]);
    }

    #[test]
    fn test_repeated_queries_are_deterministic() {
        let reasoner = Reasoner::new(ancestor_rules()).unwrap();
        let goal = pat(v("x"), "urn:anc", v("y"));

        let mut first = reasoner.bind(family()).unwrap();
        let once = first.query(&goal).unwrap();
        let twice = first.query(&goal).unwrap();
        let mut second = reasoner.bind(family()).unwrap();
        let fresh = second.query(&goal).unwrap();

        assert_eq!(once.len(), 3);
        assert_eq!(once, twice);
        assert_eq!(once, fresh);
    }

    #[test]
    fn test_hybrid_answer_order() {
        let reasoner = Reasoner::new(vec![
            Rule::forward(
                vec![pat(v("x"), "urn:q", v("y")).into()],
                vec![pat(v("x"), "urn:p", v("y")).into()],
            ),
            Rule::backward(
                pat(v("x"), "urn:p", v("y")),
                vec![pat(v("x"), "urn:r", v("y")).into()],
            ),
        ])
        .unwrap();
        let mut graph = reasoner
            .bind(Store::from_triples(vec![
                t("urn:e", "urn:p", "urn:f"),
                t("urn:a", "urn:q", "urn:b"),
                t("urn:c", "urn:r", "urn:d"),
            ]))
            .unwrap();

        let answers = graph.query(&pat(v("s"), "urn:p", v("o"))).unwrap();
        assert_eq!(
            answers,
            vec![
                t("urn:e", "urn:p", "urn:f"),
                t("urn:a", "urn:p", "urn:b"),
                t("urn:c", "urn:p", "urn:d"),
            ]
        );
    }

    #[test]
    fn test_schema_is_shared_but_data_isolated() {
        let reasoner = Reasoner::new(vec![Rule::forward(
            vec![
                pat(v("x"), "urn:type", v("c")).into(),
                pat(v("c"), "urn:sub", v("d")).into(),
            ],
            vec![pat(v("x"), "urn:type", v("d")).into()],
        )])
        .unwrap()
        .bind_schema(Store::from_triples(vec![t("urn:Dog", "urn:sub", "urn:Animal")]))
        .unwrap();

        let mut rex = reasoner
            .bind(Store::from_triples(vec![t("urn:rex", "urn:type", "urn:Dog")]))
            .unwrap();
        let mut fido = reasoner
            .bind(Store::from_triples(vec![t("urn:fido", "urn:type", "urn:Dog")]))
            .unwrap();

        assert!(rex.contains(&t("urn:rex", "urn:type", "urn:Animal")).unwrap());
        assert!(!rex.contains(&t("urn:fido", "urn:type", "urn:Animal")).unwrap());
        assert!(fido.contains(&t("urn:fido", "urn:type", "urn:Animal")).unwrap());
        assert!(fido.contains(&t("urn:Dog", "urn:sub", "urn:Animal")).unwrap());

        rex.add(t("urn:tom", "urn:type", "urn:Dog")).unwrap();
        assert!(rex.contains(&t("urn:tom", "urn:type", "urn:Animal")).unwrap());
        assert!(!fido.contains(&t("urn:tom", "urn:type", "urn:Animal")).unwrap());
    }

    #[test]
    fn test_fatal_builtin_aborts_query() {
        let reasoner = Reasoner::builder()
            .register_builtin("halt", Arity::Exact(0), halt)
            .rule(Rule::backward(
                pat(v("x"), "urn:stop", v("y")),
                vec![
                    pat(v("x"), "urn:parent", v("y")).into(),
                    ClauseEntry::call("halt", vec![]),
                ],
            ))
            .build()
            .unwrap();
        let mut graph = reasoner.bind(family()).unwrap();

        let mut find = graph.find(&pat(v("x"), "urn:stop", v("y")));
        let err = find.next().unwrap().unwrap_err();
        assert_eq!(err.code, ErrorCode::BuiltinFailed);
        assert!(find.next().is_none());
        drop(find);

        let err = graph.query(&pat(v("x"), "urn:stop", v("y"))).unwrap_err();
        assert_eq!(err.code, ErrorCode::BuiltinFailed);
    }

    #[test]
    fn test_validate_reports_violations() {
        let reasoner = Reasoner::new(vec![Rule::forward(
            vec![
                pat(v("x"), "urn:age", v("a")).into(),
                ClauseEntry::call("lessThan", vec![v("a"), Term::integer(0)]),
            ],
            vec![pat(
                v("x"),
                ns::RB_VIOLATION,
                Term::functor("error", vec![Term::literal("negative age"), v("a")]),
            )
            .into()],
        )])
        .unwrap();
        let mut graph = reasoner
            .bind(Store::from_triples(vec![
                Triple::new(Term::uri("urn:ann"), Term::uri("urn:age"), Term::integer(30)),
                Triple::new(Term::uri("urn:bob"), Term::uri("urn:age"), Term::integer(-2)),
            ]))
            .unwrap();

        let report = graph.validate();
        assert!(!report.is_valid());
        assert_eq!(report.len(), 1);
        let entry = &report.entries()[0];
        assert_eq!(entry.description, "negative age");
        assert_eq!(entry.culprit.as_deref(), Some("urn:bob"));
        assert_eq!(entry.details, vec!["-2".to_string()]);
    }

    #[test]
    fn test_validation_switch_is_temporary() {
        let reasoner = Reasoner::new(vec![Rule::forward(
            vec![
                pat(v("v"), ns::RB_VALIDATION, Term::functor("on", vec![])).into(),
                pat(v("x"), "urn:type", Term::uri("urn:Unicorn")).into(),
            ],
            vec![pat(
                v("x"),
                ns::RB_VIOLATION,
                Term::functor("warn", vec![Term::literal("unicorns are not real")]),
            )
            .into()],
        )])
        .unwrap();
        let mut graph = reasoner
            .bind(Store::from_triples(vec![t("urn:uma", "urn:type", "urn:Unicorn")]))
            .unwrap();
        let violations = pat(v("x"), ns::RB_VIOLATION, v("r"));
        assert!(graph.query(&violations).unwrap().is_empty());

        let report = graph.validate();
        assert!(report.is_valid());
        assert_eq!(report.warnings().count(), 1);

        assert!(graph.query(&violations).unwrap().is_empty());
        assert_eq!(graph.raw().len(), 1);
    }

    #[test]
    fn test_validate_warns_on_threshold() {
        let reasoner = Reasoner::builder()
            .rule(Rule::forward(
                vec![
                    pat(v("x"), "urn:p", v("y")).into(),
                    ClauseEntry::call("makeTemp", vec![v("t")]),
                ],
                vec![pat(v("y"), "urn:p", v("t")).into()],
            ))
            .reasoning(ReasoningConfig {
                rule_threshold: 5,
                ..ReasoningConfig::default()
            })
            .build()
            .unwrap();
        let mut graph = reasoner
            .bind(Store::from_triples(vec![t("urn:a", "urn:p", "urn:b")]))
            .unwrap();

        assert!(graph.stats().forward.threshold_exceeded);
        assert_eq!(graph.stats().forward.firings, 5);
        // stopped chaining never turns into an error
        assert!(graph.add(t("urn:c", "urn:p", "urn:d")).unwrap());
        assert!(graph.contains(&t("urn:a", "urn:p", "urn:b")).unwrap());
        let report = graph.validate();
        assert!(report.is_valid());
        assert_eq!(report.warnings().next().map(|e| e.kind.as_str()), Some("threshold"));
    }

    #[test]
    fn test_forward_installed_rule_answers_queries() {
        let nested = Rule::backward(
            pat(v("x"), "urn:grandparent", v("z")),
            vec![
                pat(v("x"), "urn:parent", v("y")).into(),
                pat(v("y"), "urn:parent", v("z")).into(),
            ],
        );
        let reasoner = Reasoner::new(vec![Rule::forward(
            vec![pat(v("k"), "urn:enable", Term::uri("urn:grandparents")).into()],
            vec![nested.into()],
        )])
        .unwrap();
        let mut graph = reasoner.bind(family()).unwrap();
        let goal = pat(Term::uri("urn:a"), "urn:grandparent", v("z"));
        assert!(graph.query(&goal).unwrap().is_empty());

        graph
            .add(t("urn:config", "urn:enable", "urn:grandparents"))
            .unwrap();
        assert_eq!(graph.stats().forward.rules_installed, 1);
        let answers = graph.query(&goal).unwrap();
        assert_eq!(answers, vec![t("urn:a", "urn:grandparent", "urn:c")]);
    }

    #[test]
    fn test_modes() {
        let rules = vec![
            Rule::forward(
                vec![pat(v("x"), "urn:q", v("y")).into()],
                vec![pat(v("x"), "urn:p", v("y")).into()],
            ),
            Rule::backward(
                pat(v("x"), "urn:p", v("y")),
                vec![pat(v("x"), "urn:r", v("y")).into()],
            ),
        ];
        let data = || {
            Store::from_triples(vec![t("urn:a", "urn:q", "urn:b"), t("urn:c", "urn:r", "urn:d")])
        };
        let goal = pat(v("s"), "urn:p", v("o"));

        for (mode, expected) in [
            (ReasoningMode::Forward, vec![t("urn:a", "urn:p", "urn:b")]),
            (ReasoningMode::Backward, vec![t("urn:c", "urn:p", "urn:d")]),
        ] {
            let reasoner = Reasoner::builder()
                .rules(rules.clone())
                .reasoning(ReasoningConfig {
                    mode,
                    ..ReasoningConfig::default()
                })
                .build()
                .unwrap();
            let mut graph = reasoner.bind(data()).unwrap();
            assert_eq!(graph.query(&goal).unwrap(), expected, "mode {:?}", mode);
        }
    }

    #[test]
    fn test_add_and_delete() {
        let reasoner = Reasoner::new(vec![Rule::forward(
            vec![pat(v("x"), "urn:type", Term::uri("urn:Dog")).into()],
            vec![pat(v("x"), "urn:type", Term::uri("urn:Animal")).into()],
        )])
        .unwrap();
        let mut graph = reasoner.bind(Store::new()).unwrap();
        let dog = t("urn:rex", "urn:type", "urn:Dog");
        let animal = t("urn:rex", "urn:type", "urn:Animal");

        assert!(graph.add(dog.clone()).unwrap());
        assert!(!graph.add(dog.clone()).unwrap());
        assert!(graph.contains(&animal).unwrap());

        assert!(graph.delete(&dog).unwrap());
        assert!(!graph.delete(&dog).unwrap());
        assert!(!graph.contains(&animal).unwrap());
        assert!(graph.deductions().is_empty());

        let err = graph.add(pat(v("x"), "urn:type", Term::uri("urn:Dog"))).unwrap_err();
        assert_eq!(err.code, ErrorCode::NonGroundTriple);
    }

    #[test]
    fn test_add_invalidates_tabled_goals() {
        let reasoner = Reasoner::new(ancestor_rules()).unwrap();
        let mut graph = reasoner.bind(family()).unwrap();
        let goal = pat(Term::uri("urn:a"), "urn:anc", v("w"));
        assert_eq!(graph.query(&goal).unwrap().len(), 2);

        graph.add(t("urn:c", "urn:parent", "urn:d")).unwrap();
        assert_eq!(graph.stats().tabled_goals, 0);
        assert_eq!(graph.query(&goal).unwrap().len(), 3);
    }

    #[test]
    fn test_closed_graph_rejects_use() {
        let reasoner = Reasoner::new(ancestor_rules()).unwrap();
        let mut graph = reasoner.bind(family()).unwrap();
        graph.close();

        assert!(graph.is_closed());
        let err = graph.query(&pat(v("x"), "urn:anc", v("y"))).unwrap_err();
        assert_eq!(err.code, ErrorCode::GraphClosed);
        let err = graph.add(t("urn:x", "urn:parent", "urn:y")).unwrap_err();
        assert_eq!(err.code, ErrorCode::GraphClosed);
        assert!(!graph.validate().is_valid());
    }

    #[test]
    fn test_derivations_are_recorded() {
        let reasoner = Reasoner::builder()
            .rules(ancestor_rules())
            .rule(
                Rule::forward(
                    vec![pat(v("x"), "urn:type", Term::uri("urn:Dog")).into()],
                    vec![pat(v("x"), "urn:type", Term::uri("urn:Animal")).into()],
                )
                .named("dogs"),
            )
            .reasoning(ReasoningConfig {
                derivation_logging: true,
                ..ReasoningConfig::default()
            })
            .build()
            .unwrap();
        let mut data = family();
        data.insert(t("urn:rex", "urn:type", "urn:Dog"));
        let mut graph = reasoner.bind(data).unwrap();

        let animal = t("urn:rex", "urn:type", "urn:Animal");
        let forward = graph.derivations(&animal);
        assert_eq!(forward.len(), 1);
        assert_eq!(forward[0].premises, vec![t("urn:rex", "urn:type", "urn:Dog")]);
        assert!(graph.explain(&animal).contains("dogs"));

        graph.query(&pat(Term::uri("urn:a"), "urn:anc", v("w"))).unwrap();
        let grand = t("urn:a", "urn:anc", "urn:c");
        let backward = graph.derivations(&grand);
        assert_eq!(backward.len(), 1);
        assert_eq!(
            backward[0].premises,
            vec![t("urn:a", "urn:anc", "urn:b"), t("urn:b", "urn:parent", "urn:c")]
        );
    }
}
