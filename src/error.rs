//! Structured error handling for fbreason
//!
//! Provides a unified error type with:
//! - Error codes for programmatic handling
//! - Structured error responses (JSON-friendly)
//! - Context preservation through error chains
//!
//! # Error Categories
//!
//! - Rule configuration (1xxx): malformed or unsafe rules, unknown builtins.
//!   Raised eagerly when a rule store is built; no partial reasoner is returned.
//! - Reasoning (2xxx): hard builtin aborts and other inference failures
//! - Graph (3xxx): graph-capability misuse
//! - Config (7xxx): configuration files and profiles
//! - Internal (9xxx)
//!
//! Soft builtin failures and threshold exceedance are not errors; they are
//! recorded on the inference graph and surface through its validity report.
//!
//! # Example
//!
//! ```rust,ignore
//! use fbreason::error::{ReasonerError, ErrorCode};
//!
//! fn check(rule_name: &str) -> Result<(), ReasonerError> {
//!     Err(ReasonerError::new(ErrorCode::UnsafeVariable, "head variable ?y unbound")
//!         .with_context("rule", rule_name))
//! }
//! ```

use std::collections::HashMap;
use std::fmt;
use serde::{Deserialize, Serialize};

// ============================================================================
// Error Codes
// ============================================================================

/// Unique error codes for programmatic error handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Rule configuration errors (1xxx)
    /// Generic rule error
    RuleError = 1000,
    /// Structurally invalid rule
    MalformedRule = 1001,
    /// Head variable that no body clause binds
    UnsafeVariable = 1002,
    /// Call to a builtin that is not registered
    UnknownBuiltin = 1003,
    /// Builtin called with the wrong number of arguments
    BuiltinArity = 1004,

    // Reasoning errors (2xxx)
    /// Generic reasoning error
    ReasoningError = 2000,
    /// Builtin raised a hard abort
    BuiltinFailed = 2001,
    /// Inference graph used after close
    GraphClosed = 2003,

    // Graph errors (3xxx)
    /// Non-ground triple where a ground one is required
    NonGroundTriple = 3001,

    // Config errors (7xxx)
    /// Generic config error
    ConfigError = 7000,
    /// Config file not found
    ConfigNotFound = 7001,
    /// Invalid config syntax
    InvalidConfigSyntax = 7002,
    /// Unknown profile
    UnknownProfile = 7003,
    /// Invalid config value
    InvalidConfigValue = 7004,

    // Internal errors (9xxx)
    /// Internal error
    InternalError = 9000,
}

impl ErrorCode {
    /// Get the numeric code value
    pub fn code(&self) -> u32 {
        *self as u32
    }

    /// Get a short description of the error code
    pub fn description(&self) -> &'static str {
        match self {
            ErrorCode::RuleError => "Rule error",
            ErrorCode::MalformedRule => "Malformed rule",
            ErrorCode::UnsafeVariable => "Unsafe variable in rule head",
            ErrorCode::UnknownBuiltin => "Unknown builtin",
            ErrorCode::BuiltinArity => "Builtin arity mismatch",

            ErrorCode::ReasoningError => "Reasoning error",
            ErrorCode::BuiltinFailed => "Builtin evaluation failed",
            ErrorCode::GraphClosed => "Inference graph is closed",

            ErrorCode::NonGroundTriple => "Triple is not ground",

            ErrorCode::ConfigError => "Configuration error",
            ErrorCode::ConfigNotFound => "Configuration file not found",
            ErrorCode::InvalidConfigSyntax => "Invalid configuration syntax",
            ErrorCode::UnknownProfile => "Unknown profile",
            ErrorCode::InvalidConfigValue => "Invalid configuration value",

            ErrorCode::InternalError => "Internal error",
        }
    }

    /// Whether the code belongs to the rule configuration family
    pub fn is_rule_config(&self) -> bool {
        (1000..2000).contains(&self.code())
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

// ============================================================================
// Error Context
// ============================================================================

/// Additional context information for an error
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorContext {
    /// Key-value pairs of context information
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub fields: HashMap<String, String>,
    /// Source location (file:line)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Stack of error causes
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub causes: Vec<String>,
}

impl ErrorContext {
    /// Create a new empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field to the context
    pub fn field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Add source location
    pub fn at(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Add a cause to the error chain
    pub fn cause(mut self, cause: impl Into<String>) -> Self {
        self.causes.push(cause.into());
        self
    }
}

// ============================================================================
// Main Error Type
// ============================================================================

/// The main error type for fbreason
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReasonerError {
    /// Error code for programmatic handling
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Additional context
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<ErrorContext>,
    /// Hint for resolving the error
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ReasonerError {
    /// Create a new error with a code and message
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            context: None,
            hint: None,
        }
    }

    // ========================================================================
    // Factory methods for common error types
    // ========================================================================

    /// Create a malformed-rule error
    pub fn malformed_rule(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::MalformedRule, message)
    }

    /// Create a reasoning error
    pub fn reasoning(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ReasoningError, message)
    }

    /// Create a hard builtin failure
    pub fn builtin_failed(builtin: &str, message: impl Into<String>) -> Self {
        Self::new(ErrorCode::BuiltinFailed, message).with_context("builtin", builtin)
    }

    /// Create a graph-closed error
    pub fn closed() -> Self {
        Self::new(ErrorCode::GraphClosed, "inference graph has been closed")
    }

    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigError, message)
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    // ========================================================================
    // Builder methods
    // ========================================================================

    /// Set the error code
    pub fn with_code(mut self, code: ErrorCode) -> Self {
        self.code = code;
        self
    }

    /// Add context to the error
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let ctx = self.context.get_or_insert_with(ErrorContext::new);
        ctx.fields.insert(key.into(), value.into());
        self
    }

    /// Add a cause to the error chain
    pub fn with_cause(mut self, cause: impl Into<String>) -> Self {
        let ctx = self.context.get_or_insert_with(ErrorContext::new);
        ctx.causes.push(cause.into());
        self
    }

    /// Add source location
    pub fn at(mut self, location: impl Into<String>) -> Self {
        let ctx = self.context.get_or_insert_with(ErrorContext::new);
        ctx.location = Some(location.into());
        self
    }

    /// Add a hint for resolving the error
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Check if this error came from rule validation
    pub fn is_rule_config(&self) -> bool {
        self.code.is_rule_config()
    }

    /// Convert to JSON string
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!(r#"{{"code":"INTERNAL_ERROR","message":"{}"}}"#, self.message)
        })
    }

    /// Convert to pretty JSON string
    pub fn to_json_pretty(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| self.to_json())
    }
}

impl fmt::Display for ReasonerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code.code(), self.message)?;

        if let Some(ref ctx) = self.context {
            if let Some(ref loc) = ctx.location {
                write!(f, " at {}", loc)?;
            }
            if !ctx.causes.is_empty() {
                write!(f, "\nCaused by:")?;
                for cause in &ctx.causes {
                    write!(f, "\n  - {}", cause)?;
                }
            }
        }

        if let Some(ref hint) = self.hint {
            write!(f, "\nHint: {}", hint)?;
        }

        Ok(())
    }
}

impl std::error::Error for ReasonerError {}

// ============================================================================
// Conversions from other error types
// ============================================================================

impl From<std::io::Error> for ReasonerError {
    fn from(err: std::io::Error) -> Self {
        let code = match err.kind() {
            std::io::ErrorKind::NotFound => ErrorCode::ConfigNotFound,
            _ => ErrorCode::InternalError,
        };
        ReasonerError::new(code, err.to_string())
    }
}

impl From<toml::de::Error> for ReasonerError {
    fn from(err: toml::de::Error) -> Self {
        ReasonerError::config(err.to_string())
            .with_code(ErrorCode::InvalidConfigSyntax)
    }
}

// ============================================================================
// Result type alias
// ============================================================================

/// A Result type using ReasonerError
pub type ReasonerResult<T> = Result<T, ReasonerError>;

// ============================================================================
// Macros for convenient error creation
// ============================================================================

/// Create a ReasonerError with context from the current location
#[macro_export]
macro_rules! reasoner_error {
    ($code:expr, $msg:expr) => {
        $crate::error::ReasonerError::new($code, $msg)
            .at(format!("{}:{}", file!(), line!()))
    };
    ($code:expr, $fmt:expr, $($arg:tt)*) => {
        $crate::error::ReasonerError::new($code, format!($fmt, $($arg)*))
            .at(format!("{}:{}", file!(), line!()))
    };
}

/// Bail out early with an error
#[macro_export]
macro_rules! reasoner_bail {
    ($code:expr, $msg:expr) => {
        return Err($crate::reasoner_error!($code, $msg))
    };
    ($code:expr, $fmt:expr, $($arg:tt)*) => {
        return Err($crate::reasoner_error!($code, $fmt, $($arg)*))
    };
}

/// Ensure a condition holds, or return an error
#[macro_export]
macro_rules! reasoner_ensure {
    ($cond:expr, $code:expr, $msg:expr) => {
        if !$cond {
            $crate::reasoner_bail!($code, $msg);
        }
    };
    ($cond:expr, $code:expr, $fmt:expr, $($arg:tt)*) => {
        if !$cond {
            $crate::reasoner_bail!($code, $fmt, $($arg)*);
        }
    };
}

// ============================================================================
// Tests
// ============================================================================
