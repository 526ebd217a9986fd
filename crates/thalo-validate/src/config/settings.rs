//! Configuration settings

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thalo_core::Severity;

/// Errors from reading configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("unknown severity `{0}` (expected error, warning, info or off)")]
    InvalidSeverity(String),

    #[error("expected `code=severity`, found `{0}`")]
    InvalidOverride(String),
}

/// Configured severity of a rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleSeverity {
    /// Findings are errors (fail the check)
    Error,
    /// Findings are warnings
    Warning,
    /// Findings are informational
    Info,
    /// Rule is never evaluated
    Off,
}

impl RuleSeverity {
    /// Diagnostic severity, or None if the rule is off
    pub fn to_severity(self) -> Option<Severity> {
        match self {
            RuleSeverity::Error => Some(Severity::Error),
            RuleSeverity::Warning => Some(Severity::Warning),
            RuleSeverity::Info => Some(Severity::Info),
            RuleSeverity::Off => None,
        }
    }

    /// Check if this severity means the rule is enabled
    pub fn is_enabled(self) -> bool {
        self != RuleSeverity::Off
    }
}

impl From<Severity> for RuleSeverity {
    fn from(severity: Severity) -> Self {
        match severity {
            Severity::Error => RuleSeverity::Error,
            Severity::Warning => RuleSeverity::Warning,
            Severity::Info => RuleSeverity::Info,
        }
    }
}

impl FromStr for RuleSeverity {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "error" => Ok(RuleSeverity::Error),
            "warning" | "warn" => Ok(RuleSeverity::Warning),
            "info" => Ok(RuleSeverity::Info),
            "off" => Ok(RuleSeverity::Off),
            _ => Err(ConfigError::InvalidSeverity(s.to_string())),
        }
    }
}

/// Per-rule severity overrides; rules not listed keep their default
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CheckConfig {
    rules: BTreeMap<String, RuleSeverity>,
}

impl CheckConfig {
    /// Create a config with every rule at its default severity
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a rule's severity
    pub fn set(&mut self, code: impl Into<String>, severity: RuleSeverity) {
        self.rules.insert(code.into(), severity);
    }

    /// Builder form of [`CheckConfig::set`]
    pub fn with_rule(mut self, code: impl Into<String>, severity: RuleSeverity) -> Self {
        self.set(code, severity);
        self
    }

    /// Effective severity of a rule
    pub fn severity(&self, code: &str, default: Severity) -> RuleSeverity {
        self.rules
            .get(code)
            .copied()
            .unwrap_or_else(|| default.into())
    }

    /// Apply a `code=severity` override
    pub fn apply_override(&mut self, spec: &str) -> Result<(), ConfigError> {
        let (code, severity) = spec
            .split_once('=')
            .ok_or_else(|| ConfigError::InvalidOverride(spec.to_string()))?;
        let code = code.trim();
        if code.is_empty() {
            return Err(ConfigError::InvalidOverride(spec.to_string()));
        }
        self.set(code, severity.parse()?);
        Ok(())
    }

    /// Configured rule codes
    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.rules.keys().map(String::as_str)
    }
}

/// Top-level `thalo.toml` structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// `[rules]` table
    pub rules: CheckConfig,
    /// `[workspace]` table
    pub workspace: WorkspaceSettings,
}

impl Settings {
    /// Parse settings from a TOML string
    pub fn from_toml_str(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }
}

/// File discovery configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkspaceSettings {
    /// File extensions to load, without the dot
    pub extensions: Vec<String>,
    /// Directory or file names to skip
    pub exclude: Vec<String>,
}

impl Default for WorkspaceSettings {
    fn default() -> Self {
        Self {
            extensions: vec!["thalo".to_string(), "md".to_string()],
            exclude: vec!["node_modules".to_string()],
        }
    }
}
