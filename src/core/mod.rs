//! Core abstractions and common definitions for fbreason
//!
//! This module provides:
//! - `traits`: the `Graph`/`GraphMut` capability the reasoner reads and writes through
//! - `namespaces`: Standard RDF and rule-base namespace URI constants

pub mod traits;
pub mod namespaces;

pub use traits::*;
pub use namespaces::ns;
