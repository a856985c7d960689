//! Blank node representation

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counter for generating unique blank node IDs
static BLANK_COUNTER: AtomicU64 = AtomicU64::new(0);

/// A blank node (anonymous node)
///
/// Labeled blank nodes compare by label so that data built in code can refer
/// to the same node twice; fresh nodes (minted by `makeTemp`) compare by id.
#[derive(Clone, PartialEq, Eq, Hash)]
pub enum BlankNode {
    /// Node with a caller-chosen label
    Labeled(String),
    /// Node minted by the reasoner
    Fresh(u64),
}

impl BlankNode {
    /// Create a fresh blank node with a unique ID
    pub fn fresh() -> Self {
        BlankNode::Fresh(BLANK_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Create a blank node with a label
    pub fn labeled(label: String) -> Self {
        BlankNode::Labeled(label)
    }

    /// Get the label if present
    pub fn label(&self) -> Option<&str> {
        match self {
            BlankNode::Labeled(label) => Some(label),
            BlankNode::Fresh(_) => None,
        }
    }
}

impl fmt::Debug for BlankNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl fmt::Display for BlankNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlankNode::Labeled(label) => write!(f, "_:{}", label),
            BlankNode::Fresh(id) => write!(f, "_:t{}", id),
        }
    }
}
