//! Inference engines and the pieces they share
//!
//! # Engines
//!
//! - [`forward::ForwardEngine`]: incremental, data-driven chaining into a
//!   deductions graph; installs backward rules from rule-valued heads
//! - [`backward::BackwardEngine`]: tabled, goal-directed proof search over
//!   raw, schema and deduced triples
//!
//! # Shared pieces
//!
//! - [`Sources`]: the union of raw data, schema and deductions
//! - [`RuleView`]: the backward rules in effect (shared store plus the
//!   rules installed at run time)
//! - [`eval_call`]: builtin evaluation with soft/fatal error split
//! - [`derivation`] and [`validity`]: derivation records and validity reports

use std::sync::Arc;

use serde::Serialize;
use tracing::warn;

use crate::builtins::{Builtin, BuiltinResult};
use crate::core::Graph;
use crate::error::{ReasonerError, ReasonerResult};
use crate::rules::{CompiledRule, RuleSet};
use crate::store::Store;
use crate::term::{BindingEnv, Term, Triple, TriplePattern};

pub mod backward;
pub mod derivation;
pub mod forward;
pub mod validity;

pub use backward::{BackwardEngine, BackwardStats, GeneratorId};
pub use derivation::{Derivation, DerivationFormatter, DerivationLog};
pub use forward::{ForwardEngine, ForwardStats};
pub use validity::{Severity, ValidityEntry, ValidityReport};

// ============================================================================
// Sources
// ============================================================================

/// The three graphs an inference graph reasons over, read as one
///
/// A triple present in more than one graph is reported once, from the first
/// graph holding it (raw, then schema, then deductions).
#[derive(Clone, Copy)]
pub struct Sources<'a> {
    graphs: [&'a Store; 3],
}

impl<'a> Sources<'a> {
    pub fn new(raw: &'a Store, schema: &'a Store, deductions: &'a Store) -> Self {
        Sources {
            graphs: [raw, schema, deductions],
        }
    }

    /// Every matching triple, raw first, without duplicates
    pub fn find(&self, pattern: &TriplePattern) -> impl Iterator<Item = Triple> + 'a {
        let graphs = self.graphs;
        let pattern = pattern.clone();
        (0..graphs.len()).flat_map(move |i| {
            graphs[i]
                .find(&pattern)
                .filter(move |t| !graphs[..i].iter().any(|g| g.contains(t)))
        })
    }

    pub fn contains(&self, triple: &Triple) -> bool {
        self.graphs.iter().any(|g| g.contains(triple))
    }

    /// Total triples over all graphs, duplicates counted once per graph
    pub fn len(&self) -> usize {
        self.graphs.iter().map(|g| g.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.graphs.iter().all(|g| g.is_empty())
    }
}

// ============================================================================
// Rule view
// ============================================================================

/// Backward rules in effect for one inference graph
///
/// `base` is the reasoner's backward rule set (absent in forward-only mode);
/// `installed` holds rules added by forward firings.
#[derive(Clone, Copy)]
pub struct RuleView<'a> {
    base: Option<&'a RuleSet>,
    installed: &'a RuleSet,
}

impl<'a> RuleView<'a> {
    pub fn new(base: Option<&'a RuleSet>, installed: &'a RuleSet) -> Self {
        RuleView { base, installed }
    }

    /// Candidate rules for a goal: shared rules first, then installed ones
    pub fn candidates(&self, pattern: &TriplePattern) -> Vec<Arc<CompiledRule>> {
        self.base
            .into_iter()
            .flat_map(|set| set.candidates(pattern))
            .chain(self.installed.candidates(pattern))
            .filter(|rule| rule.head_matches(pattern))
            .cloned()
            .collect()
    }

    /// Whether some backward rule can prove instances of `pattern`
    pub fn is_tabled(&self, pattern: &TriplePattern) -> bool {
        self.base.map_or(false, |set| set.can_prove(pattern)) || self.installed.can_prove(pattern)
    }
}

/// Everything an engine reads while proving goals
#[derive(Clone, Copy)]
pub struct Context<'a> {
    pub sources: Sources<'a>,
    pub rules: RuleView<'a>,
}

// ============================================================================
// Builtin evaluation
// ============================================================================

/// A builtin call that failed with a non-fatal error
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BuiltinFailure {
    /// Label of the rule whose body made the call
    pub rule: String,
    /// Builtin name
    pub builtin: String,
    /// Error text
    pub message: String,
}

/// Evaluate a builtin call clause under `env`
///
/// Returns the extended environment if the call holds, `None` if it fails.
/// Soft errors fail the call and are appended to `failures`; a fatal error
/// is returned as [`ErrorCode::BuiltinFailed`](crate::error::ErrorCode).
pub fn eval_call(
    builtin: &Builtin,
    args: &[Term],
    env: &BindingEnv,
    rule: &CompiledRule,
    failures: &mut Vec<BuiltinFailure>,
) -> ReasonerResult<Option<BindingEnv>> {
    let resolved: Vec<Term> = args.iter().map(|a| env.resolve(a)).collect();
    match builtin.call(&resolved) {
        Ok(BuiltinResult::Failure) => Ok(None),
        Ok(BuiltinResult::Success(bindings)) => {
            let mut next = env.clone();
            for (position, value) in bindings {
                let ok = match resolved.get(position) {
                    Some(Term::Variable(var)) => next.bind(var, value),
                    Some(given) => *given == value,
                    None => false,
                };
                if !ok {
                    return Ok(None);
                }
            }
            Ok(Some(next))
        }
        Err(e) if e.is_fatal() => Err(ReasonerError::builtin_failed(builtin.name(), e.to_string())
            .with_context("rule", rule.rule().label())),
        Err(e) => {
            let label = rule.rule().label();
            warn!(builtin = builtin.name(), rule = %label, error = %e, "builtin call failed");
            failures.push(BuiltinFailure {
                rule: label,
                builtin: builtin.name().to_string(),
                message: e.to_string(),
            });
            Ok(None)
        }
    }
}
