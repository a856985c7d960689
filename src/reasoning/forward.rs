//! Forward chaining engine
//!
//! Incremental, data-driven inference:
//! 1. Axioms (rules without pattern clauses) fire once
//! 2. Each raw triple is pushed on the agenda
//! 3. A popped triple is matched against every forward clause with its
//!    predicate (plus variable-predicate clauses); the rest of the body is
//!    matched left to right against raw, schema and deductions
//! 4. New head triples go to the deductions graph and back on the agenda;
//!    nested head rules are installed as backward rules
//! 5. Repeat until the agenda is empty or the firing threshold is hit

use std::collections::VecDeque;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, trace, warn};

use super::derivation::{Derivation, DerivationLog};
use super::{eval_call, BuiltinFailure, Sources};
use crate::config::ReasoningConfig;
use crate::core::Graph;
use crate::error::{ReasonerError, ReasonerResult};
use crate::rules::{self, CompiledClause, CompiledRule, HeadEntry, Rule, RuleSet, RuleStore};
use crate::store::Store;
use crate::term::{BindingEnv, Triple};

/// Counters for one forward engine
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ForwardStats {
    /// Complete body matches applied
    pub firings: usize,
    /// Triples added to the deductions graph
    pub deductions: usize,
    /// Backward rules installed from nested heads
    pub rules_installed: usize,
    /// Chaining stopped at the firing threshold
    pub threshold_exceeded: bool,
}

/// A complete body match waiting to be applied
struct Firing {
    rule: Arc<CompiledRule>,
    env: BindingEnv,
    premises: Vec<Triple>,
}

/// Incremental forward chainer
pub struct ForwardEngine {
    rules: Arc<RuleStore>,
    deductions: Store,
    installed: RuleSet,
    agenda: VecDeque<Triple>,
    threshold: usize,
    trace: bool,
    record: bool,
    derivations: DerivationLog,
    failures: Vec<BuiltinFailure>,
    rejected: Vec<ReasonerError>,
    stats: ForwardStats,
}

impl ForwardEngine {
    /// Create an engine with an empty deductions graph
    pub fn new(rules: Arc<RuleStore>, config: &ReasoningConfig) -> Self {
        ForwardEngine {
            rules,
            deductions: Store::new(),
            installed: RuleSet::new(),
            agenda: VecDeque::new(),
            threshold: config.rule_threshold,
            trace: config.trace,
            record: config.derivation_logging,
            derivations: DerivationLog::new(),
            failures: Vec::new(),
            rejected: Vec::new(),
            stats: ForwardStats::default(),
        }
    }

    /// Start from rules already installed (e.g. by the schema pass)
    pub fn with_installed(mut self, installed: RuleSet) -> Self {
        self.installed = installed;
        self
    }

    /// Initial pass: fire axioms, then chain from every raw triple
    ///
    /// `schema` is read but not pushed: it is expected to be closed under the
    /// forward rules already.
    pub fn run(&mut self, raw: &Store, schema: &Store) -> ReasonerResult<()> {
        let axioms: Vec<Arc<CompiledRule>> = self.rules.axioms().cloned().collect();
        for rule in axioms {
            let firings = self.match_from(raw, schema, &rule, None, BindingEnv::new(rule.num_vars()), Vec::new())?;
            if !self.apply(raw, schema, firings) {
                break;
            }
        }

        self.agenda.extend(raw.iter().cloned());
        self.drain(raw, schema)?;

        debug!(
            firings = self.stats.firings,
            deductions = self.stats.deductions,
            installed = self.stats.rules_installed,
            threshold_exceeded = self.stats.threshold_exceeded,
            "forward pass finished"
        );
        Ok(())
    }

    /// Chain from one triple newly added to `raw`
    pub fn add_triple(&mut self, raw: &Store, schema: &Store, triple: Triple) -> ReasonerResult<()> {
        if self.deductions.contains(&triple) {
            return Ok(());
        }
        self.agenda.push_back(triple);
        self.drain(raw, schema)
    }

    fn drain(&mut self, raw: &Store, schema: &Store) -> ReasonerResult<()> {
        while let Some(triple) = self.agenda.pop_front() {
            if self.stats.threshold_exceeded {
                self.agenda.clear();
                break;
            }
            let triggers: Vec<(usize, usize)> = self.rules.forward_triggers(&triple.predicate).collect();
            for (rule_idx, clause_idx) in triggers {
                let rule = Arc::clone(&self.rules.forward_rules()[rule_idx]);
                let CompiledClause::Pattern(pattern) = &rule.body()[clause_idx] else {
                    unreachable!("forward index points at a call clause of {}", rule.rule().label());
                };
                let Some(env) = BindingEnv::new(rule.num_vars()).match_triple(pattern, &triple) else {
                    continue;
                };
                let premises = if self.record { vec![triple.clone()] } else { Vec::new() };
                let firings = self.match_from(raw, schema, &rule, Some(clause_idx), env, premises)?;
                if !self.apply(raw, schema, firings) {
                    break;
                }
            }
        }
        Ok(())
    }

    /// Every completion of `rule`'s body from `env`, skipping the trigger clause
    fn match_from(
        &mut self,
        raw: &Store,
        schema: &Store,
        rule: &Arc<CompiledRule>,
        trigger: Option<usize>,
        env: BindingEnv,
        premises: Vec<Triple>,
    ) -> ReasonerResult<Vec<Firing>> {
        let mut matcher = Matcher {
            sources: Sources::new(raw, schema, &self.deductions),
            rule,
            trigger,
            record: self.record,
            failures: &mut self.failures,
            out: Vec::new(),
        };
        matcher.extend(0, env, premises)?;
        Ok(matcher.out)
    }

    /// Apply firings in order; false once the threshold stops chaining
    fn apply(&mut self, raw: &Store, schema: &Store, firings: Vec<Firing>) -> bool {
        for firing in firings {
            if self.threshold > 0 && self.stats.firings >= self.threshold {
                if !self.stats.threshold_exceeded {
                    warn!(threshold = self.threshold, "forward rule threshold exceeded, chaining stopped");
                }
                self.stats.threshold_exceeded = true;
                self.agenda.clear();
                return false;
            }
            self.stats.firings += 1;
            if self.trace {
                trace!(rule = %firing.rule.rule().label(), "forward rule fired");
            }

            for head in firing.rule.rule().head() {
                match head {
                    HeadEntry::Pattern(pattern) => {
                        let triple = firing.env.instantiate(pattern);
                        if !triple.is_ground()
                            || Sources::new(raw, schema, &self.deductions).contains(&triple)
                        {
                            continue;
                        }
                        if self.trace {
                            trace!(triple = %triple, "deduced");
                        }
                        if self.record {
                            self.derivations.record(Derivation::new(
                                Arc::clone(firing.rule.rule()),
                                triple.clone(),
                                firing.premises.clone(),
                            ));
                        }
                        self.deductions.insert(triple.clone());
                        self.stats.deductions += 1;
                        self.agenda.push_back(triple);
                    }
                    HeadEntry::Rule(nested) => self.install(nested, &firing.env),
                }
            }
        }
        true
    }

    fn install(&mut self, nested: &Rule, env: &BindingEnv) {
        let rule = Arc::new(rules::instantiate_nested(nested, env));
        match CompiledRule::compile(Arc::clone(&rule), self.rules.registry()) {
            Ok(compiled) => {
                if self.installed.insert(Arc::new(compiled)) {
                    self.stats.rules_installed += 1;
                    debug!(rule = %rule, "installed backward rule");
                }
            }
            Err(e) => {
                warn!(rule = %rule, error = %e, "nested rule rejected");
                self.rejected.push(e);
            }
        }
    }

    pub fn deductions(&self) -> &Store {
        &self.deductions
    }

    /// Backward rules installed by nested heads
    pub fn installed(&self) -> &RuleSet {
        &self.installed
    }

    pub fn stats(&self) -> ForwardStats {
        self.stats
    }

    pub fn derivations(&self) -> &DerivationLog {
        &self.derivations
    }

    /// Builtin calls that failed with a soft error
    pub fn failures(&self) -> &[BuiltinFailure] {
        &self.failures
    }

    /// Nested rules that failed validation when instantiated
    pub fn rejected(&self) -> &[ReasonerError] {
        &self.rejected
    }

    /// Take the deductions and installed rules, leaving the engine empty
    pub fn into_parts(self) -> (Store, RuleSet, DerivationLog) {
        (self.deductions, self.installed, self.derivations)
    }
}

/// Left-to-right body matcher for one rule
struct Matcher<'a, 'r> {
    sources: Sources<'a>,
    rule: &'r Arc<CompiledRule>,
    trigger: Option<usize>,
    record: bool,
    failures: &'a mut Vec<BuiltinFailure>,
    out: Vec<Firing>,
}

impl<'a, 'r> Matcher<'a, 'r> {
    fn extend(&mut self, clause: usize, env: BindingEnv, premises: Vec<Triple>) -> ReasonerResult<()> {
        let rule: &'r Arc<CompiledRule> = self.rule;
        let Some(entry) = rule.body().get(clause) else {
            self.out.push(Firing {
                rule: Arc::clone(rule),
                env,
                premises,
            });
            return Ok(());
        };
        if self.trigger == Some(clause) {
            return self.extend(clause + 1, env, premises);
        }

        match entry {
            CompiledClause::Pattern(pattern) => {
                let goal = env.instantiate(pattern);
                let matches: Vec<Triple> = self.sources.find(&goal).collect();
                for triple in matches {
                    let Some(next) = env.match_triple(pattern, &triple) else {
                        continue;
                    };
                    let mut premises = premises.clone();
                    if self.record {
                        premises.push(triple);
                    }
                    self.extend(clause + 1, next, premises)?;
                }
                Ok(())
            }
            CompiledClause::Call { builtin, args } => {
                match eval_call(builtin, args, &env, rule, self.failures)? {
                    Some(next) => self.extend(clause + 1, next, premises),
                    None => Ok(()),
                }
            }
        }
    }
}
