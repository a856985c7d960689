//! Configuration system for fbreason
//!
//! Provides a flexible configuration system supporting:
//! - TOML configuration files
//! - Environment variable overrides
//! - Reasoning profiles (default, fast, thorough)
//! - Multiple config file locations
//!
//! A `ReasonerConfig` is fixed once a reasoner is built: it is shared
//! read-only with every inference graph the reasoner binds.
//!
//! # Configuration File Locations
//!
//! Configuration files are searched in order (first found wins):
//! 1. `./fbreason.toml` - Project-local configuration
//! 2. `~/.config/fbreason/config.toml` - User configuration (XDG)
//! 3. `~/.fbreason/config.toml` - User configuration (legacy)
//!
//! # Environment Variables
//!
//! - `FBREASON_PROFILE` - Reasoning profile (default, fast, thorough)
//! - `FBREASON_RULE_THRESHOLD` - Forward rule firing limit
//! - `FBREASON_LOG_LEVEL` - Logging verbosity (quiet, normal, verbose, debug)
//! - `FBREASON_DERIVATION_LOGGING` - Record derivations (true/false)
//! - `FBREASON_TRACE` - Per-step trace events (true/false)
//! - `FBREASON_PUMP_BATCH` - Results per generator run
//! - `FBREASON_MODE` - hybrid, forward or backward
//!
//! # Example Configuration
//!
//! ```toml
//! # fbreason.toml
//!
//! [general]
//! log_level = "normal"
//!
//! [reasoning]
//! profile = "default"
//! rule_threshold = 10000
//! derivation_logging = false
//! trace = false
//! pump_batch = 64
//! mode = "hybrid"
//! ```

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::error::{ErrorCode, ReasonerError};

// ============================================================================
// Configuration Schema
// ============================================================================

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ReasonerConfig {
    /// General settings
    pub general: GeneralConfig,
    /// Reasoning settings
    pub reasoning: ReasoningConfig,
    /// Profile-specific overrides
    pub profiles: IndexMap<String, ProfileConfig>,
}

/// General configuration options
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct GeneralConfig {
    /// Logging level; applied by the caller's `tracing` subscriber via
    /// [`LogLevel::tracing_level`]
    pub log_level: LogLevel,
}

/// Reasoning configuration options
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReasoningConfig {
    /// Reasoning profile to use
    pub profile: ReasoningProfile,
    /// Maximum forward rule firings per chaining run (0 = unlimited)
    pub rule_threshold: usize,
    /// Record a derivation for every deduced triple
    pub derivation_logging: bool,
    /// Emit per-step trace events
    pub trace: bool,
    /// Results a generator may produce per scheduler turn
    pub pump_batch: usize,
    /// Which rule directions are evaluated
    pub mode: ReasoningMode,
}

impl Default for ReasoningConfig {
    fn default() -> Self {
        Self {
            profile: ReasoningProfile::Default,
            rule_threshold: 10000,
            derivation_logging: false,
            trace: false,
            pump_batch: 64,
            mode: ReasoningMode::Hybrid,
        }
    }
}

/// Profile-specific configuration overrides
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ProfileConfig {
    /// Override rule_threshold
    pub rule_threshold: Option<usize>,
    /// Override derivation_logging
    pub derivation_logging: Option<bool>,
    /// Override pump_batch
    pub pump_batch: Option<usize>,
    /// Override mode
    pub mode: Option<ReasoningMode>,
    /// Description of the profile
    pub description: Option<String>,
}

// ============================================================================
// Enums
// ============================================================================

/// Log level options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Quiet,
    #[default]
    Normal,
    Verbose,
    Debug,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Quiet => "quiet",
            LogLevel::Normal => "normal",
            LogLevel::Verbose => "verbose",
            LogLevel::Debug => "debug",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "quiet" | "q" | "0" => Some(LogLevel::Quiet),
            "normal" | "n" | "1" => Some(LogLevel::Normal),
            "verbose" | "v" | "2" => Some(LogLevel::Verbose),
            "debug" | "d" | "3" => Some(LogLevel::Debug),
            _ => None,
        }
    }

    /// The `tracing` level a subscriber should filter at
    pub fn tracing_level(&self) -> tracing::Level {
        match self {
            LogLevel::Quiet => tracing::Level::ERROR,
            LogLevel::Normal => tracing::Level::WARN,
            LogLevel::Verbose => tracing::Level::DEBUG,
            LogLevel::Debug => tracing::Level::TRACE,
        }
    }
}

/// Which rule directions take part in reasoning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReasoningMode {
    /// Forward rules run eagerly, backward rules answer queries
    #[default]
    Hybrid,
    /// Only forward rules (plus backward rules they install)
    Forward,
    /// Only backward rules
    Backward,
}

impl ReasoningMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReasoningMode::Hybrid => "hybrid",
            ReasoningMode::Forward => "forward",
            ReasoningMode::Backward => "backward",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "hybrid" | "both" => Some(ReasoningMode::Hybrid),
            "forward" | "fwd" => Some(ReasoningMode::Forward),
            "backward" | "bwd" | "tabled" => Some(ReasoningMode::Backward),
            _ => None,
        }
    }

    /// Whether forward rules are run
    pub fn runs_forward(&self) -> bool {
        !matches!(self, ReasoningMode::Backward)
    }

    /// Whether declared backward rules are used
    pub fn runs_backward(&self) -> bool {
        !matches!(self, ReasoningMode::Forward)
    }
}

/// Reasoning profile presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReasoningProfile {
    /// Balanced defaults
    #[default]
    Default,
    /// Low threshold, no bookkeeping
    Fast,
    /// High threshold with derivations recorded
    Thorough,
    /// Custom profile (use profiles section)
    Custom,
}

impl ReasoningProfile {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReasoningProfile::Default => "default",
            ReasoningProfile::Fast => "fast",
            ReasoningProfile::Thorough => "thorough",
            ReasoningProfile::Custom => "custom",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "default" | "" => Some(ReasoningProfile::Default),
            "fast" | "performance" | "perf" => Some(ReasoningProfile::Fast),
            "thorough" | "complete" | "full" => Some(ReasoningProfile::Thorough),
            "custom" => Some(ReasoningProfile::Custom),
            _ => None,
        }
    }

    /// Get the recommended rule_threshold for this profile
    pub fn default_rule_threshold(&self) -> usize {
        match self {
            ReasoningProfile::Default => 10000,
            ReasoningProfile::Fast => 1000,
            ReasoningProfile::Thorough => 1_000_000,
            ReasoningProfile::Custom => 10000,
        }
    }

    /// Get a description of this profile
    pub fn description(&self) -> &'static str {
        match self {
            ReasoningProfile::Default => "Hybrid reasoning with a 10000 firing threshold",
            ReasoningProfile::Fast => "Low firing threshold, large pump batches, no derivations",
            ReasoningProfile::Thorough => "High firing threshold with derivation logging",
            ReasoningProfile::Custom => "User-defined profile",
        }
    }
}

// ============================================================================
// Builder-style setters
// ============================================================================

impl ReasonerConfig {
    /// Create a new default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the forward rule firing threshold
    pub fn with_rule_threshold(mut self, threshold: usize) -> Self {
        self.reasoning.rule_threshold = threshold;
        self
    }

    /// Enable or disable derivation logging
    pub fn with_derivation_logging(mut self, on: bool) -> Self {
        self.reasoning.derivation_logging = on;
        self
    }

    /// Enable or disable per-step trace events
    pub fn with_trace(mut self, on: bool) -> Self {
        self.reasoning.trace = on;
        self
    }

    /// Set the reasoning mode
    pub fn with_mode(mut self, mode: ReasoningMode) -> Self {
        self.reasoning.mode = mode;
        self
    }

    /// Set how many results a generator may produce per turn
    pub fn with_pump_batch(mut self, batch: usize) -> Self {
        self.reasoning.pump_batch = batch;
        self
    }

    /// Check knob values that cannot be expressed in the type system
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.reasoning.pump_batch == 0 {
            return Err(ConfigError::InvalidValue {
                key: "reasoning.pump_batch".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

// ============================================================================
// Configuration Loading
// ============================================================================

impl ReasonerConfig {
    /// Load configuration from default locations
    ///
    /// Searches for config files in order:
    /// 1. ./fbreason.toml
    /// 2. ~/.config/fbreason/config.toml
    /// 3. ~/.fbreason/config.toml
    ///
    /// Then applies environment variable overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        for path in Self::config_paths() {
            if path.exists() {
                config = Self::load_from_file(&path)?;
                break;
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e.to_string()))?;

        toml::from_str(&content).map_err(|e| ConfigError::Parse(path.to_path_buf(), e.to_string()))
    }

    /// Load configuration from a TOML string
    pub fn load_from_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content)
            .map_err(|e| ConfigError::Parse(PathBuf::from("<string>"), e.to_string()))
    }

    /// Get the list of config file search paths
    pub fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("./fbreason.toml")];

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("fbreason").join("config.toml"));
        }

        if let Some(home_dir) = dirs::home_dir() {
            paths.push(home_dir.join(".fbreason").join("config.toml"));
        }

        paths
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = env::var("FBREASON_PROFILE") {
            if let Err(e) = self.apply_profile(&val) {
                warn!(profile = %val, error = %e, "ignoring FBREASON_PROFILE");
            }
        }

        if let Ok(val) = env::var("FBREASON_RULE_THRESHOLD") {
            if let Ok(threshold) = val.parse::<usize>() {
                self.reasoning.rule_threshold = threshold;
            }
        }

        if let Ok(val) = env::var("FBREASON_LOG_LEVEL") {
            if let Some(level) = LogLevel::from_str(&val) {
                self.general.log_level = level;
            }
        }

        if let Ok(val) = env::var("FBREASON_DERIVATION_LOGGING") {
            self.reasoning.derivation_logging = parse_flag(&val);
        }

        if let Ok(val) = env::var("FBREASON_TRACE") {
            self.reasoning.trace = parse_flag(&val);
        }

        if let Ok(val) = env::var("FBREASON_PUMP_BATCH") {
            if let Ok(batch) = val.parse::<usize>() {
                self.reasoning.pump_batch = batch;
            }
        }

        if let Ok(val) = env::var("FBREASON_MODE") {
            if let Some(mode) = ReasoningMode::from_str(&val) {
                self.reasoning.mode = mode;
            }
        }
    }

    /// Apply a named profile's settings
    pub fn apply_profile(&mut self, name: &str) -> Result<(), ConfigError> {
        if let Some(profile) = ReasoningProfile::from_str(name) {
            self.reasoning.profile = profile;
            self.reasoning.rule_threshold = profile.default_rule_threshold();

            match profile {
                ReasoningProfile::Fast => {
                    self.reasoning.derivation_logging = false;
                    self.reasoning.trace = false;
                    self.reasoning.pump_batch = 256;
                }
                ReasoningProfile::Thorough => {
                    self.reasoning.derivation_logging = true;
                    self.reasoning.pump_batch = 16;
                }
                _ => {}
            }
            return Ok(());
        }

        if let Some(custom) = self.profiles.get(name).cloned() {
            self.reasoning.profile = ReasoningProfile::Custom;
            if let Some(threshold) = custom.rule_threshold {
                self.reasoning.rule_threshold = threshold;
            }
            if let Some(on) = custom.derivation_logging {
                self.reasoning.derivation_logging = on;
            }
            if let Some(batch) = custom.pump_batch {
                self.reasoning.pump_batch = batch;
            }
            if let Some(mode) = custom.mode {
                self.reasoning.mode = mode;
            }
            return Ok(());
        }

        Err(ConfigError::UnknownProfile(name.to_string()))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))
    }

    /// List all available profiles
    pub fn available_profiles(&self) -> Vec<(&str, &str)> {
        let mut profiles = vec![
            ("default", ReasoningProfile::Default.description()),
            ("fast", ReasoningProfile::Fast.description()),
            ("thorough", ReasoningProfile::Thorough.description()),
        ];

        for (name, config) in &self.profiles {
            let desc = config.description.as_deref().unwrap_or("Custom profile");
            profiles.push((name.as_str(), desc));
        }

        profiles
    }
}

fn parse_flag(val: &str) -> bool {
    matches!(val.to_lowercase().as_str(), "true" | "1" | "yes" | "on")
}

// ============================================================================
// Error Types
// ============================================================================

/// Configuration errors
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// IO error reading config file
    #[error("IO error reading {}: {}", .0.display(), .1)]
    Io(PathBuf, String),
    /// Parse error in config file
    #[error("Parse error in {}: {}", .0.display(), .1)]
    Parse(PathBuf, String),
    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),
    /// Unknown profile name
    #[error("Unknown profile: {0}")]
    UnknownProfile(String),
    /// Value out of range
    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

impl From<ConfigError> for ReasonerError {
    fn from(err: ConfigError) -> Self {
        let code = match &err {
            ConfigError::Io(..) => ErrorCode::ConfigNotFound,
            ConfigError::Parse(..) => ErrorCode::InvalidConfigSyntax,
            ConfigError::Serialize(_) => ErrorCode::ConfigError,
            ConfigError::UnknownProfile(_) => ErrorCode::UnknownProfile,
            ConfigError::InvalidValue { .. } => ErrorCode::InvalidConfigValue,
        };
        ReasonerError::new(code, err.to_string())
    }
}

// ============================================================================
// Tests
// ============================================================================
