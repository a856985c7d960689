//! fbreason - hybrid forward/backward rule reasoner
//!
//! Rules over RDF-style triples, evaluated two ways at once:
//!
//! - forward rules run eagerly over the data and extend a deductions graph;
//!   a forward rule may conclude a new backward rule
//! - backward rules answer pattern queries on demand with tabled (memoized)
//!   proof search, so left-recursive and mutually recursive rule sets
//!   terminate
//!
//! # Architecture
//!
//! - [`term`] - terms, triples, patterns and binding environments
//! - [`store`] - the indexed triple store behind every graph
//! - [`rules`] - rule representation, validation, compilation and indexing
//! - [`builtins`] - procedures callable from rule bodies
//! - [`reasoning`] - the forward engine, the tabled backward engine,
//!   derivation records and validity reports
//! - [`reasoner`] - the [`Reasoner`] facade and [`InfGraph`] inference graphs
//! - [`config`] - TOML configuration with profiles and env overrides
//! - [`error`] - error codes and the crate error type
//!
//! # Example
//!
//! ```rust
//! use fbreason::{Reasoner, Rule, Store, Term, Triple};
//!
//! let parent = |a: &str, b: &str| Triple::new(Term::uri(a), Term::uri("urn:parent"), Term::uri(b));
//! let anc = |a: Term, b: Term| Triple::new(a, Term::uri("urn:anc"), b);
//!
//! let reasoner = Reasoner::new(vec![
//!     Rule::backward(
//!         anc(Term::var("x"), Term::var("y")),
//!         vec![parent_pattern("x", "y").into()],
//!     ),
//!     Rule::backward(
//!         anc(Term::var("x"), Term::var("z")),
//!         vec![anc(Term::var("x"), Term::var("y")).into(), parent_pattern("y", "z").into()],
//!     ),
//! ])?;
//!
//! let mut graph = reasoner.bind(Store::from_triples(vec![
//!     parent("urn:a", "urn:b"),
//!     parent("urn:b", "urn:c"),
//! ]))?;
//! let answers = graph.query(&anc(Term::uri("urn:a"), Term::var("w")))?;
//! assert_eq!(answers.len(), 2);
//!
//! fn parent_pattern(a: &str, b: &str) -> Triple {
//!     Triple::new(Term::var(a), Term::uri("urn:parent"), Term::var(b))
//! }
//! # Ok::<(), fbreason::ReasonerError>(())
//! ```

pub mod builtins;
pub mod config;
pub mod core;
pub mod error;
pub mod reasoner;
pub mod reasoning;
pub mod rules;
pub mod store;
pub mod term;

// Re-export core types
pub use crate::core::{ns, Graph, GraphMut};
pub use term::{BindingEnv, BlankNode, Datatype, Functor, Literal, Number, Term, Triple, TriplePattern, Uri, Variable};
pub use store::Store;

// Re-export rule types
pub use rules::{ClauseEntry, Direction, HeadEntry, Rule, RuleSet, RuleStore};
pub use builtins::{Arity, Builtin, BuiltinError, BuiltinFn, BuiltinRegistry, BuiltinResult};

// Re-export the reasoner facade
pub use reasoner::{Find, InfGraph, InfGraphStats, Reasoner, ReasonerBuilder, SchemaClosure};
pub use reasoning::{
    BackwardStats, BuiltinFailure, Derivation, DerivationFormatter, DerivationLog, ForwardStats,
    Severity, ValidityEntry, ValidityReport,
};

// Re-export configuration types
pub use config::{
    ConfigError, GeneralConfig, LogLevel, ProfileConfig, ReasonerConfig, ReasoningConfig,
    ReasoningMode, ReasoningProfile,
};

// Re-export error types
pub use error::{ErrorCode, ErrorContext, ReasonerError, ReasonerResult};
