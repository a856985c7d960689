//! Standard namespace URI constants
//!
//! These constants provide compile-time verified namespace URIs for
//! use throughout the codebase, eliminating string typos.

/// Standard namespace URI constants
pub mod ns {
    // W3C Core Vocabularies
    /// RDF namespace
    pub const RDF: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
    /// RDF Schema namespace
    pub const RDFS: &str = "http://www.w3.org/2000/01/rdf-schema#";
    /// XML Schema Datatypes namespace
    pub const XSD: &str = "http://www.w3.org/2001/XMLSchema#";
    /// OWL Web Ontology Language namespace
    pub const OWL: &str = "http://www.w3.org/2002/07/owl#";

    // Reasoner vocabulary
    /// Rule-base namespace (rb:) for validation conclusions
    pub const RB: &str = "http://jena.hpl.hp.com/2003/RuleReasoner#";

    /// `rdf:type`
    pub const RDF_TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";
    /// `rb:violation`, the predicate validation rules conclude with
    pub const RB_VIOLATION: &str = "http://jena.hpl.hp.com/2003/RuleReasoner#violation";
    /// `rb:validation`, asserted to switch validation rules on
    pub const RB_VALIDATION: &str = "http://jena.hpl.hp.com/2003/RuleReasoner#validation";

    /// Helper to construct a full URI from namespace and local name
    #[inline]
    pub fn uri(namespace: &str, local: &str) -> String {
        format!("{}{}", namespace, local)
    }

    /// Check if a URI belongs to a namespace
    #[inline]
    pub fn in_namespace(uri: &str, namespace: &str) -> bool {
        uri.starts_with(namespace)
    }

    /// Extract local name from a URI given its namespace
    #[inline]
    pub fn local_name<'a>(uri: &'a str, namespace: &str) -> Option<&'a str> {
        uri.strip_prefix(namespace)
    }
}
