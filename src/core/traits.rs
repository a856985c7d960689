//! Graph capability traits
//!
//! The reasoner consumes triple storage through these two narrow traits:
//! - [`Graph`]: pattern-matching `find`, `contains`, `len`
//! - [`GraphMut`]: `add`, `delete`
//!
//! Raw data and schema graphs are only ever read through [`Graph`]; the
//! forward engine's deductions graph is the one place that is written.

use crate::term::{Triple, TriplePattern};

// ============================================================================
// Read access
// ============================================================================

/// Read-only access to a set of triples
pub trait Graph: Send + Sync {
    /// Find every triple matching the pattern
    ///
    /// Variables in any position act as wildcards; repeated variables must
    /// bind consistently. Iteration order must be deterministic for an
    /// unchanged graph.
    fn find<'a>(&'a self, pattern: &TriplePattern) -> Box<dyn Iterator<Item = Triple> + 'a>;

    /// Check if a ground triple is present
    fn contains(&self, triple: &Triple) -> bool {
        self.find(triple).next().is_some()
    }

    /// Number of triples
    fn len(&self) -> usize;

    /// Check if the graph is empty
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ============================================================================
// Write access
// ============================================================================

/// Mutation of a set of triples
pub trait GraphMut: Graph {
    /// Add a triple, returning true if it was not already present
    fn add(&mut self, triple: Triple) -> bool;

    /// Remove a triple, returning true if it was present
    fn delete(&mut self, triple: &Triple) -> bool;

    /// Add multiple triples from any iterator
    fn add_all<I: IntoIterator<Item = Triple>>(&mut self, triples: I)
    where
        Self: Sized,
    {
        for triple in triples {
            self.add(triple);
        }
    }
}
