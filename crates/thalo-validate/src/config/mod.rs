//! Checker configuration
//!
//! Rule severities are loaded from `thalo.toml` in the workspace root:
//!
//! ```toml
//! [rules]
//! unknown-field = "error"
//! empty-section = "off"
//!
//! [workspace]
//! extensions = ["thalo", "md"]
//! exclude = ["node_modules", "archive"]
//! ```
//!
//! Command-line `code=severity` overrides are applied on top with
//! [`CheckConfig::apply_override`].

mod settings;

#[cfg(test)]
mod tests;

pub use settings::{CheckConfig, ConfigError, RuleSeverity, Settings, WorkspaceSettings};
