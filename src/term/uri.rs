//! URI (IRI) representation

use std::fmt;

/// A URI reference
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Uri {
    value: String,
}

impl Uri {
    /// Create a new URI
    pub fn new(value: String) -> Self {
        Uri { value }
    }

    /// Get the URI as a string slice
    pub fn as_str(&self) -> &str {
        &self.value
    }

    /// Get the namespace (everything up to and including the last # or /)
    pub fn namespace(&self) -> &str {
        match self.split_point() {
            Some(pos) => &self.value[..=pos],
            None => &self.value,
        }
    }

    /// Get the local name (fragment or last path segment)
    pub fn local_name(&self) -> &str {
        match self.split_point() {
            Some(pos) => &self.value[pos + 1..],
            None => &self.value,
        }
    }

    fn split_point(&self) -> Option<usize> {
        self.value.rfind('#').or_else(|| self.value.rfind('/'))
    }
}

impl fmt::Debug for Uri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>", self.value)
    }
}

impl fmt::Display for Uri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>", self.value)
    }
}

impl From<&str> for Uri {
    fn from(s: &str) -> Self {
        Uri::new(s.to_string())
    }
}

impl From<String> for Uri {
    fn from(s: String) -> Self {
        Uri::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_namespace() {
        let uri = Uri::new("http://example.org/foo#bar".into());
        assert_eq!(uri.namespace(), "http://example.org/foo#");
        assert_eq!(uri.local_name(), "bar");

        let uri2 = Uri::new("http://example.org/path/name".into());
        assert_eq!(uri2.namespace(), "http://example.org/path/");
        assert_eq!(uri2.local_name(), "name");
    }

    #[test]
    fn test_opaque_uri() {
        let uri = Uri::from("urn:dog");
        assert_eq!(uri.local_name(), "urn:dog");
        assert_eq!(format!("{}", uri), "<urn:dog>");
    }
}
