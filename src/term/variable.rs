//! Rule variable representation
//!
//! A variable carries a display name and the slot index it occupies in the
//! binding environment of its owning rule. Indexes are assigned when a rule is
//! built (first occurrence order), so two variables are the same variable only
//! if both name and index agree.

use std::fmt;
use std::sync::Arc;

/// A variable in a rule clause or query pattern
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Variable {
    name: Arc<str>,
    index: usize,
}

impl Variable {
    /// Create a variable bound to a specific environment slot
    pub fn new(name: impl Into<Arc<str>>, index: usize) -> Self {
        Variable {
            name: name.into(),
            index,
        }
    }

    /// Create a variable whose slot has not been assigned yet
    ///
    /// Rules and the tabling cache renumber these when they take ownership.
    pub fn unindexed(name: impl Into<Arc<str>>) -> Self {
        Self::new(name, 0)
    }

    /// Get the variable name (without the leading `?`)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the binding slot index
    pub fn index(&self) -> usize {
        self.index
    }

    /// Same name, different slot
    pub fn with_index(&self, index: usize) -> Self {
        Variable {
            name: Arc::clone(&self.name),
            index,
        }
    }
}

impl fmt::Debug for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "?{}#{}", self.name, self.index)
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "?{}", self.name)
    }
}
