//! Hybrid reasoner facade
//!
//! A [`Reasoner`] holds an indexed rule store and a configuration. Binding it
//! produces inference graphs:
//!
//! - [`Reasoner::bind_schema`] closes a schema graph under the forward rules
//!   once and returns a reasoner that shares the closure with every graph it
//!   binds
//! - [`Reasoner::bind`] wraps a data graph in an [`InfGraph`] with its own
//!   forward deductions, installed rules and tabling state
//!
//! Rules are validated when the reasoner is built, so a bad rule set never
//! produces a reasoner.

use std::sync::Arc;

use tracing::debug;

use crate::builtins::{Arity, BuiltinFn, BuiltinRegistry};
use crate::config::{ReasonerConfig, ReasoningConfig};
use crate::core::Graph;
use crate::error::ReasonerResult;
use crate::reasoning::{DerivationLog, ForwardEngine, ForwardStats};
use crate::rules::{Rule, RuleSet, RuleStore};
use crate::store::Store;

mod infgraph;

pub use infgraph::{Find, InfGraph, InfGraphStats};

/// A schema graph closed under the forward rules
#[derive(Debug, Default)]
pub struct SchemaClosure {
    graph: Store,
    installed: RuleSet,
    stats: ForwardStats,
    derivations: DerivationLog,
}

impl SchemaClosure {
    /// Schema triples plus their forward deductions
    pub fn graph(&self) -> &Store {
        &self.graph
    }

    /// Backward rules installed while closing the schema
    pub fn installed(&self) -> &RuleSet {
        &self.installed
    }

    pub fn stats(&self) -> ForwardStats {
        self.stats
    }

    pub fn derivations(&self) -> &DerivationLog {
        &self.derivations
    }
}

/// Rules plus configuration, ready to bind data
#[derive(Debug, Clone)]
pub struct Reasoner {
    rules: Arc<RuleStore>,
    config: ReasoningConfig,
    schema: Arc<SchemaClosure>,
}

impl Reasoner {
    /// Reasoner over `rules` with the standard builtins and default config
    pub fn new(rules: Vec<Rule>) -> ReasonerResult<Self> {
        ReasonerBuilder::new().rules(rules).build()
    }

    pub fn builder() -> ReasonerBuilder {
        ReasonerBuilder::new()
    }

    pub fn rules(&self) -> &Arc<RuleStore> {
        &self.rules
    }

    pub fn config(&self) -> &ReasoningConfig {
        &self.config
    }

    pub fn schema(&self) -> &SchemaClosure {
        &self.schema
    }

    /// Close `schema` under the forward rules and return a reasoner bound to it
    ///
    /// Replaces any schema bound earlier. The closure is computed once and
    /// shared read-only by every graph the returned reasoner binds.
    pub fn bind_schema(&self, schema: Store) -> ReasonerResult<Reasoner> {
        let closure = if self.config.mode.runs_forward() {
            let mut engine = ForwardEngine::new(Arc::clone(&self.rules), &self.config);
            engine.run(&schema, &Store::new())?;
            let stats = engine.stats();
            let (deductions, installed, derivations) = engine.into_parts();
            let mut graph = schema;
            for triple in deductions.iter() {
                graph.insert(triple.clone());
            }
            SchemaClosure {
                graph,
                installed,
                stats,
                derivations,
            }
        } else {
            SchemaClosure {
                graph: schema,
                ..SchemaClosure::default()
            }
        };

        debug!(
            triples = closure.graph.len(),
            installed = closure.installed.len(),
            "schema bound"
        );
        Ok(Reasoner {
            rules: Arc::clone(&self.rules),
            config: self.config.clone(),
            schema: Arc::new(closure),
        })
    }

    /// Wrap a data graph in a new inference graph
    ///
    /// Runs the forward rules over the data (unless the mode is backward
    /// only) before returning.
    pub fn bind(&self, data: Store) -> ReasonerResult<InfGraph> {
        InfGraph::new(
            Arc::clone(&self.rules),
            self.config.clone(),
            Arc::clone(&self.schema),
            data,
        )
    }
}

/// Builder for [`Reasoner`]
pub struct ReasonerBuilder {
    rules: Vec<Rule>,
    registry: BuiltinRegistry,
    config: ReasonerConfig,
}

impl Default for ReasonerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ReasonerBuilder {
    pub fn new() -> Self {
        ReasonerBuilder {
            rules: Vec::new(),
            registry: BuiltinRegistry::new(),
            config: ReasonerConfig::default(),
        }
    }

    pub fn rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn rules(mut self, rules: impl IntoIterator<Item = Rule>) -> Self {
        self.rules.extend(rules);
        self
    }

    /// Replace the builtin registry
    pub fn builtins(mut self, registry: BuiltinRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Add or replace one builtin
    pub fn register_builtin(mut self, name: &'static str, arity: Arity, func: BuiltinFn) -> Self {
        self.registry.register(name, arity, func);
        self
    }

    pub fn config(mut self, config: ReasonerConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace only the reasoning section of the configuration
    pub fn reasoning(mut self, reasoning: ReasoningConfig) -> Self {
        self.config.reasoning = reasoning;
        self
    }

    /// Validate the configuration, then compile and index the rules
    pub fn build(self) -> ReasonerResult<Reasoner> {
        self.config.validate()?;
        let rules = RuleStore::index(self.rules, Arc::new(self.registry))?;
        Ok(Reasoner {
            rules: Arc::new(rules),
            config: self.config.reasoning,
            schema: Arc::new(SchemaClosure::default()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::rules::ClauseEntry;
    use crate::term::{Term, Triple};

    fn t(s: &str, p: &str, o: &str) -> Triple {
        Triple::new(Term::uri(s), Term::uri(p), Term::uri(o))
    }

    fn subclass_rule() -> Rule {
        Rule::forward(
            vec![
                Triple::new(Term::var("c"), Term::uri("urn:sub"), Term::var("d")).into(),
                Triple::new(Term::var("d"), Term::uri("urn:sub"), Term::var("e")).into(),
            ],
            vec![Triple::new(Term::var("c"), Term::uri("urn:sub"), Term::var("e")).into()],
        )
    }

    #[test]
    fn test_build_rejects_unknown_builtin() {
        let rule = Rule::forward(
            vec![
                Triple::new(Term::var("x"), Term::uri("urn:p"), Term::uri("urn:o")).into(),
                ClauseEntry::call("noSuchBuiltin", vec![Term::var("x")]),
            ],
            vec![Triple::new(Term::var("x"), Term::uri("urn:q"), Term::uri("urn:o")).into()],
        );
        let err = Reasoner::new(vec![rule]).unwrap_err();
        assert_eq!(err.code, ErrorCode::UnknownBuiltin);
    }

    #[test]
    fn test_build_rejects_bad_config() {
        let mut config = ReasonerConfig::default();
        config.reasoning.pump_batch = 0;
        let err = Reasoner::builder().config(config).build().unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidConfigValue);
    }

    #[test]
    fn test_bind_schema_closes_schema_once() {
        let reasoner = Reasoner::new(vec![subclass_rule()]).unwrap();
        let schema = Store::from_triples(vec![
            t("urn:Dog", "urn:sub", "urn:Mammal"),
            t("urn:Mammal", "urn:sub", "urn:Animal"),
        ]);
        let bound = reasoner.bind_schema(schema).unwrap();

        assert!(bound.schema().graph().contains(&t("urn:Dog", "urn:sub", "urn:Animal")));
        assert_eq!(bound.schema().graph().len(), 3);
        assert_eq!(bound.schema().stats().deductions, 1);
        // the unbound reasoner keeps its empty schema
        assert!(reasoner.schema().graph().is_empty());
    }

    #[test]
    fn test_bind_schema_again_replaces_closure() {
        let reasoner = Reasoner::new(vec![subclass_rule()]).unwrap();
        let first = Store::from_triples(vec![
            t("urn:Dog", "urn:sub", "urn:Mammal"),
            t("urn:Mammal", "urn:sub", "urn:Animal"),
        ]);
        let second = Store::from_triples(vec![
            t("urn:Oak", "urn:sub", "urn:Tree"),
            t("urn:Tree", "urn:sub", "urn:Plant"),
        ]);
        let bound = reasoner
            .bind_schema(first)
            .unwrap()
            .bind_schema(second)
            .unwrap();

        let closure = bound.schema().graph();
        assert_eq!(closure.len(), 3);
        assert!(closure.contains(&t("urn:Oak", "urn:sub", "urn:Plant")));
        assert!(!closure.contains(&t("urn:Dog", "urn:sub", "urn:Mammal")));
        assert!(!closure.contains(&t("urn:Dog", "urn:sub", "urn:Animal")));

        let mut graph = bound.bind(Store::new()).unwrap();
        assert!(graph.contains(&t("urn:Oak", "urn:sub", "urn:Plant")).unwrap());
        assert!(!graph.contains(&t("urn:Dog", "urn:sub", "urn:Animal")).unwrap());
    }

    #[test]
    fn test_backward_mode_leaves_schema_open() {
        let config = ReasoningConfig {
            mode: crate::config::ReasoningMode::Backward,
            ..ReasoningConfig::default()
        };
        let reasoner = Reasoner::builder()
            .rule(subclass_rule())
            .reasoning(config)
            .build()
            .unwrap();
        let bound = reasoner
            .bind_schema(Store::from_triples(vec![
                t("urn:Dog", "urn:sub", "urn:Mammal"),
                t("urn:Mammal", "urn:sub", "urn:Animal"),
            ]))
            .unwrap();
        assert_eq!(bound.schema().graph().len(), 2);
    }
}
