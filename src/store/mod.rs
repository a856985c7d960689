//! In-memory triple store
//!
//! A store holds a set of triples in insertion order and answers pattern
//! queries through per-position indexes. It is the reference implementation
//! of the [`Graph`]/[`GraphMut`] capability: raw data, schema and the
//! forward engine's deductions are all kept in `Store`s.

use indexmap::{IndexMap, IndexSet};

use crate::core::{Graph, GraphMut};
use crate::term::{Term, Triple, TriplePattern};

/// A set of triples with subject/predicate/object indexes
#[derive(Clone, Default)]
pub struct Store {
    /// The triples in this store, insertion ordered
    triples: IndexSet<Triple>,
    /// Index by subject
    by_subject: IndexMap<Term, IndexSet<Triple>>,
    /// Index by predicate
    by_predicate: IndexMap<Term, IndexSet<Triple>>,
    /// Index by object
    by_object: IndexMap<Term, IndexSet<Triple>>,
}

impl Store {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from triples
    pub fn from_triples(triples: impl IntoIterator<Item = Triple>) -> Self {
        let mut store = Store::new();
        for triple in triples {
            store.insert(triple);
        }
        store
    }

    /// Add a ground triple; returns false if it was already present
    pub fn insert(&mut self, triple: Triple) -> bool {
        debug_assert!(triple.is_ground(), "store only holds ground triples: {:?}", triple);
        if self.triples.contains(&triple) {
            return false;
        }

        self.by_subject
            .entry(triple.subject.clone())
            .or_default()
            .insert(triple.clone());
        self.by_predicate
            .entry(triple.predicate.clone())
            .or_default()
            .insert(triple.clone());
        self.by_object
            .entry(triple.object.clone())
            .or_default()
            .insert(triple.clone());
        self.triples.insert(triple);
        true
    }

    /// Remove a triple; returns false if it was not present
    pub fn remove(&mut self, triple: &Triple) -> bool {
        if !self.triples.shift_remove(triple) {
            return false;
        }
        for (index, key) in [
            (&mut self.by_subject, &triple.subject),
            (&mut self.by_predicate, &triple.predicate),
            (&mut self.by_object, &triple.object),
        ] {
            if let Some(bucket) = index.get_mut(key) {
                bucket.shift_remove(triple);
                if bucket.is_empty() {
                    index.shift_remove(key);
                }
            }
        }
        true
    }

    /// Clear all triples
    pub fn clear(&mut self) {
        self.triples.clear();
        self.by_subject.clear();
        self.by_predicate.clear();
        self.by_object.clear();
    }

    /// Iterate over all triples in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &Triple> {
        self.triples.iter()
    }

    /// Smallest candidate set for a pattern
    fn candidates(&self, pattern: &TriplePattern) -> &IndexSet<Triple> {
        let mut best: Option<&IndexSet<Triple>> = None;
        for (index, key) in [
            (&self.by_subject, &pattern.subject),
            (&self.by_predicate, &pattern.predicate),
            (&self.by_object, &pattern.object),
        ] {
            if !key.is_ground() {
                continue;
            }
            match index.get(key) {
                Some(bucket) => {
                    if best.map_or(true, |b| bucket.len() < b.len()) {
                        best = Some(bucket);
                    }
                }
                None => return EMPTY.get_or_init(IndexSet::new),
            }
        }
        best.unwrap_or(&self.triples)
    }
}

static EMPTY: std::sync::OnceLock<IndexSet<Triple>> = std::sync::OnceLock::new();

impl Graph for Store {
    fn find<'a>(&'a self, pattern: &TriplePattern) -> Box<dyn Iterator<Item = Triple> + 'a> {
        if pattern.is_ground() {
            let hit = self.triples.get(pattern).cloned();
            return Box::new(hit.into_iter());
        }
        let pattern = pattern.clone();
        let candidates = self.candidates(&pattern).iter();
        Box::new(
            candidates
                .filter(move |t| pattern.matches(t))
                .cloned(),
        )
    }

    fn contains(&self, triple: &Triple) -> bool {
        self.triples.contains(triple)
    }

    fn len(&self) -> usize {
        self.triples.len()
    }
}

impl GraphMut for Store {
    fn add(&mut self, triple: Triple) -> bool {
        self.insert(triple)
    }

    fn delete(&mut self, triple: &Triple) -> bool {
        self.remove(triple)
    }
}

impl FromIterator<Triple> for Store {
    fn from_iter<I: IntoIterator<Item = Triple>>(iter: I) -> Self {
        Store::from_triples(iter)
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Store {{")?;
        for triple in &self.triples {
            writeln!(f, "  {:?}", triple)?;
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(s: &str, p: &str, o: &str) -> Triple {
        Triple::new(Term::uri(s), Term::uri(p), Term::uri(o))
    }

    #[test]
    fn test_store_add_dedups() {
        let mut store = Store::new();
        assert!(store.add(t("urn:a", "urn:p", "urn:b")));
        assert!(!store.add(t("urn:a", "urn:p", "urn:b")));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_find_by_each_position() {
        let store = Store::from_triples(vec![
            t("urn:a", "urn:p", "urn:b"),
            t("urn:b", "urn:p", "urn:c"),
            t("urn:a", "urn:q", "urn:c"),
        ]);

        let by_s: Vec<_> = store
            .find(&Triple::new(Term::uri("urn:a"), Term::var("p"), Term::var("o")))
            .collect();
        assert_eq!(by_s, vec![t("urn:a", "urn:p", "urn:b"), t("urn:a", "urn:q", "urn:c")]);

        let by_o: Vec<_> = store
            .find(&Triple::new(Term::var("s"), Term::var("p"), Term::uri("urn:c")))
            .collect();
        assert_eq!(by_o.len(), 2);

        let none: Vec<_> = store
            .find(&Triple::new(Term::var("s"), Term::uri("urn:missing"), Term::var("o")))
            .collect();
        assert!(none.is_empty());
    }

    #[test]
    fn test_find_repeated_variable() {
        let store = Store::from_triples(vec![
            t("urn:a", "urn:p", "urn:a"),
            t("urn:a", "urn:p", "urn:b"),
        ]);
        let hits: Vec<_> = store
            .find(&Triple::new(Term::var("x"), Term::uri("urn:p"), Term::var("x")))
            .collect();
        assert_eq!(hits, vec![t("urn:a", "urn:p", "urn:a")]);
    }

    #[test]
    fn test_delete_keeps_order() {
        let mut store = Store::from_triples(vec![
            t("urn:a", "urn:p", "urn:b"),
            t("urn:b", "urn:p", "urn:c"),
            t("urn:c", "urn:p", "urn:d"),
        ]);
        assert!(store.delete(&t("urn:b", "urn:p", "urn:c")));
        assert!(!store.delete(&t("urn:b", "urn:p", "urn:c")));

        let all: Vec<_> = store.iter().cloned().collect();
        assert_eq!(all, vec![t("urn:a", "urn:p", "urn:b"), t("urn:c", "urn:p", "urn:d")]);
        assert!(store
            .find(&Triple::new(Term::uri("urn:b"), Term::var("p"), Term::var("o")))
            .next()
            .is_none());
    }
}
