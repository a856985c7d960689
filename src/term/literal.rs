//! Literal value representation

use std::fmt;

use crate::core::ns;

/// Datatype for a literal
#[derive(Clone, PartialEq, Eq, Hash)]
pub enum Datatype {
    /// Plain literal (no datatype)
    Plain,
    /// Language-tagged literal
    Language(String),
    /// Typed literal with datatype URI
    Typed(String),
}

/// An RDF literal value
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Literal {
    value: String,
    datatype: Datatype,
}

/// Numeric view of a literal, used by the arithmetic builtins
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Number {
    Integer(i64),
    Decimal(f64),
}

impl Number {
    pub fn as_f64(self) -> f64 {
        match self {
            Number::Integer(i) => i as f64,
            Number::Decimal(d) => d,
        }
    }
}

impl Literal {
    /// Create a plain literal
    pub fn plain(value: String) -> Self {
        Literal {
            value,
            datatype: Datatype::Plain,
        }
    }

    /// Create a typed literal
    pub fn typed(value: String, datatype: String) -> Self {
        Literal {
            value,
            datatype: Datatype::Typed(datatype),
        }
    }

    /// Create a language-tagged literal
    pub fn with_language(value: String, lang: String) -> Self {
        Literal {
            value,
            datatype: Datatype::Language(lang.to_lowercase()),
        }
    }

    /// Get the lexical value
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Get the datatype
    pub fn datatype(&self) -> &Datatype {
        &self.datatype
    }

    /// Check if this is a plain literal
    pub fn is_plain(&self) -> bool {
        matches!(self.datatype, Datatype::Plain)
    }

    /// Get the language tag if present
    pub fn language(&self) -> Option<&str> {
        match &self.datatype {
            Datatype::Language(lang) => Some(lang),
            _ => None,
        }
    }

    /// Get the datatype URI if present
    pub fn datatype_uri(&self) -> Option<&str> {
        match &self.datatype {
            Datatype::Typed(uri) => Some(uri),
            _ => None,
        }
    }

    /// Interpret the literal as a number
    ///
    /// `xsd:integer`-family literals yield `Integer`, other numeric XSD types
    /// yield `Decimal`. Plain literals are accepted when they parse cleanly.
    pub fn as_number(&self) -> Option<Number> {
        match &self.datatype {
            Datatype::Typed(dt) if is_integer_type(dt) => {
                self.value.trim().parse().ok().map(Number::Integer)
            }
            Datatype::Typed(dt) if is_decimal_type(dt) => {
                self.value.trim().parse().ok().map(Number::Decimal)
            }
            Datatype::Typed(_) | Datatype::Language(_) => None,
            Datatype::Plain => {
                if let Ok(i) = self.value.parse::<i64>() {
                    Some(Number::Integer(i))
                } else {
                    self.value.parse::<f64>().ok().map(Number::Decimal)
                }
            }
        }
    }
}

fn is_integer_type(dt: &str) -> bool {
    dt.strip_prefix(ns::XSD).map_or(false, |local| {
        matches!(
            local,
            "integer" | "int" | "long" | "short" | "byte" | "nonNegativeInteger"
                | "positiveInteger" | "negativeInteger" | "nonPositiveInteger"
                | "unsignedInt" | "unsignedLong" | "unsignedShort" | "unsignedByte"
        )
    })
}

fn is_decimal_type(dt: &str) -> bool {
    dt.strip_prefix(ns::XSD)
        .map_or(false, |local| matches!(local, "decimal" | "float" | "double"))
}

impl fmt::Debug for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.datatype {
            Datatype::Plain => write!(f, "\"{}\"", self.value),
            Datatype::Language(lang) => write!(f, "\"{}\"@{}", self.value, lang),
            Datatype::Typed(dt) => write!(f, "\"{}\"^^<{}>", self.value, dt),
        }
    }
}
