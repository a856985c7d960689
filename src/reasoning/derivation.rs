//! Derivation records
//!
//! When derivation logging is enabled, every forward deduction and every new
//! backward answer is recorded as a [`Derivation`]: the rule that fired, the
//! conclusion, and the triples that matched the rule's pattern clauses.
//! [`DerivationFormatter`] renders a derivation tree as indented text or
//! JSON.

use std::fmt::Write;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::Serialize;

use crate::rules::Rule;
use crate::term::Triple;

/// One rule application
#[derive(Debug, Clone, PartialEq)]
pub struct Derivation {
    pub rule: Arc<Rule>,
    pub conclusion: Triple,
    pub premises: Vec<Triple>,
}

impl Derivation {
    pub fn new(rule: Arc<Rule>, conclusion: Triple, premises: Vec<Triple>) -> Self {
        Derivation {
            rule,
            conclusion,
            premises,
        }
    }
}

/// Derivations by conclusion, in recording order
#[derive(Debug, Clone, Default)]
pub struct DerivationLog {
    entries: IndexMap<Triple, Vec<Derivation>>,
}

impl DerivationLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a derivation; identical repeats are ignored
    pub fn record(&mut self, derivation: Derivation) {
        let bucket = self.entries.entry(derivation.conclusion.clone()).or_default();
        if !bucket.contains(&derivation) {
            bucket.push(derivation);
        }
    }

    pub fn get(&self, conclusion: &Triple) -> &[Derivation] {
        self.entries.get(conclusion).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of distinct conclusions
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &Derivation> {
        self.entries.values().flatten()
    }
}

// ============================================================================
// Formatting
// ============================================================================

/// Serializable derivation tree node
#[derive(Debug, Clone, Serialize)]
pub struct DerivationNode {
    pub conclusion: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub premises: Vec<DerivationNode>,
}

/// Renders the derivation tree of a triple
///
/// Premises with derivations of their own are expanded recursively; a
/// premise already on the current path is printed without expansion.
pub struct DerivationFormatter<'a> {
    lookup: Box<dyn Fn(&Triple) -> Vec<&'a Derivation> + 'a>,
    max_depth: usize,
}

impl<'a> DerivationFormatter<'a> {
    /// Formatter over a single log
    pub fn new(log: &'a DerivationLog) -> Self {
        Self::with_lookup(move |t| log.get(t).iter().collect())
    }

    /// Formatter over any derivation source
    pub fn with_lookup(lookup: impl Fn(&Triple) -> Vec<&'a Derivation> + 'a) -> Self {
        DerivationFormatter {
            lookup: Box::new(lookup),
            max_depth: 32,
        }
    }

    /// Limit expansion depth
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Build the tree for a conclusion, following the first derivation of each triple
    pub fn tree(&self, conclusion: &Triple) -> DerivationNode {
        self.node(conclusion, &mut Vec::new())
    }

    fn node(&self, conclusion: &Triple, path: &mut Vec<Triple>) -> DerivationNode {
        let derivations = (self.lookup)(conclusion);
        let expand = path.len() < self.max_depth && !path.contains(conclusion);
        match derivations.first() {
            Some(d) if expand => {
                path.push(conclusion.clone());
                let premises = d.premises.iter().map(|p| self.node(p, path)).collect();
                path.pop();
                DerivationNode {
                    conclusion: conclusion.to_string(),
                    rule: Some(d.rule.label()),
                    premises,
                }
            }
            _ => DerivationNode {
                conclusion: conclusion.to_string(),
                rule: None,
                premises: Vec::new(),
            },
        }
    }

    /// Indented text, one triple per line
    pub fn to_text(&self, conclusion: &Triple) -> String {
        let mut output = String::new();
        write_node(&mut output, &self.tree(conclusion), 0);
        output
    }

    pub fn to_json(&self, conclusion: &Triple) -> String {
        serde_json::to_string_pretty(&self.tree(conclusion)).unwrap_or_default()
    }
}

fn write_node(output: &mut String, node: &DerivationNode, depth: usize) {
    let indent = "  ".repeat(depth);
    match &node.rule {
        Some(rule) => {
            let _ = writeln!(output, "{}{}  <= {}", indent, node.conclusion, rule);
        }
        None => {
            let _ = writeln!(output, "{}{}", indent, node.conclusion);
        }
    }
    for premise in &node.premises {
        write_node(output, premise, depth + 1);
    }
}
