//! Validity reports
//!
//! Rules signal problems by concluding `rb:violation` triples:
//!
//! - `(?x rb:violation error('description', ?arg, ...))` reports an error
//! - `(?x rb:violation warn('description', ?arg, ...))` reports a warning
//! - a plain literal object is reported as an error with that description
//!
//! The report also carries engine conditions such as a forward run stopped
//! at the firing threshold.

use std::fmt;

use serde::Serialize;

use crate::term::{Term, Triple};

/// Severity of a report entry
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// One reported problem
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ValidityEntry {
    pub severity: Severity,
    /// `violation` for rule conclusions, otherwise the engine condition
    pub kind: String,
    pub description: String,
    /// The offending resource, for rule conclusions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub culprit: Option<String>,
    /// Extra arguments of the report functor
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<String>,
}

impl ValidityEntry {
    pub fn new(severity: Severity, kind: impl Into<String>, description: impl Into<String>) -> Self {
        ValidityEntry {
            severity,
            kind: kind.into(),
            description: description.into(),
            culprit: None,
            details: Vec::new(),
        }
    }

    /// Entry for a `(culprit rb:violation report)` conclusion
    pub fn from_violation(triple: &Triple) -> Self {
        let culprit = Some(lexical(&triple.subject));
        match &triple.object {
            Term::Functor(report) => {
                let severity = if report.name().eq_ignore_ascii_case("warn") {
                    Severity::Warning
                } else {
                    Severity::Error
                };
                let mut args = report.args().iter().map(lexical);
                ValidityEntry {
                    severity,
                    kind: "violation".to_string(),
                    description: args.next().unwrap_or_else(|| report.name().to_string()),
                    culprit,
                    details: args.collect(),
                }
            }
            other => ValidityEntry {
                severity: Severity::Error,
                kind: "violation".to_string(),
                description: lexical(other),
                culprit,
                details: Vec::new(),
            },
        }
    }
}

fn lexical(term: &Term) -> String {
    match term {
        Term::Literal(lit) => lit.value().to_string(),
        Term::Uri(uri) => uri.as_str().to_string(),
        other => other.to_string(),
    }
}

impl fmt::Display for ValidityEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity, self.kind, self.description)?;
        if let Some(culprit) = &self.culprit {
            write!(f, " (culprit {})", culprit)?;
        }
        Ok(())
    }
}

/// Result of validating an inference graph
#[derive(Clone, Debug, Default, Serialize)]
pub struct ValidityReport {
    entries: Vec<ValidityEntry>,
}

impl ValidityReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, entry: ValidityEntry) {
        if !self.entries.contains(&entry) {
            self.entries.push(entry);
        }
    }

    /// No errors (warnings allowed)
    pub fn is_valid(&self) -> bool {
        self.errors().next().is_none()
    }

    /// No entries at all
    pub fn is_clean(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[ValidityEntry] {
        &self.entries
    }

    pub fn errors(&self) -> impl Iterator<Item = &ValidityEntry> {
        self.entries.iter().filter(|e| e.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &ValidityEntry> {
        self.entries.iter().filter(|e| e.severity == Severity::Warning)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    /// Plain text, one entry per line
    pub fn to_text(&self) -> String {
        let mut output = if self.is_valid() {
            format!("Validity: PASSED ({} warning(s))\n", self.warnings().count())
        } else {
            format!("Validity: FAILED ({} error(s))\n", self.errors().count())
        };
        for entry in &self.entries {
            output.push_str(&format!("  {}\n", entry));
        }
        output
    }
}
