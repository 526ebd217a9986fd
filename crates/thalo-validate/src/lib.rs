//! thalo-validate - Rule-based checker for Thalo workspaces
//!
//! Every rule inspects one document against the whole workspace, so a
//! diagnostic can depend on schemas and links defined in other files.
//!
//! # Architecture
//!
//! Individual rules implement the [`Rule`] trait. The [`Checker`] owns the
//! registered rules, resolves each one's severity from a [`CheckConfig`]
//! and collects diagnostics in a stable order. Rules configured `off` are
//! never evaluated.
//!
//! # Example
//!
//! ```
//! use thalo_core::Workspace;
//! use thalo_validate::{check, CheckConfig};
//!
//! let mut workspace = Workspace::new();
//! workspace
//!     .add_document("2026-01-05T18:00Z create journal \"Test\" #test\n  field: value\n", "a.thalo")
//!     .unwrap();
//!
//! let diagnostics = check(&workspace, &CheckConfig::default());
//! assert_eq!(diagnostics.len(), 1);
//! assert_eq!(diagnostics[0].code, "unknown-entity");
//! ```

pub mod config;
pub mod rules;
pub mod types;

use thalo_ast::Span;
use thalo_core::{Diagnostic, Document, Severity, Workspace};
use tracing::{debug, warn};

pub use config::{CheckConfig, ConfigError, RuleSeverity, Settings, WorkspaceSettings};

/// What a rule is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleCategory {
    Instance,
    Link,
    Schema,
    Metadata,
    Content,
}

impl RuleCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleCategory::Instance => "instance",
            RuleCategory::Link => "link",
            RuleCategory::Schema => "schema",
            RuleCategory::Metadata => "metadata",
            RuleCategory::Content => "content",
        }
    }
}

impl std::fmt::Display for RuleCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Trait for checker rules
///
/// A rule reads one document and the workspace it belongs to, and reports
/// findings through the [`RuleContext`]. Rules never mutate the workspace.
pub trait Rule: Send + Sync {
    /// Unique kebab-case code (e.g., "unknown-entity")
    fn code(&self) -> &'static str;

    fn category(&self) -> RuleCategory;

    /// Severity used when the configuration does not name the rule
    fn default_severity(&self) -> Severity;

    /// Get a human-readable description of the rule
    fn description(&self) -> &'static str;

    /// Inspect `doc` and report findings
    fn evaluate(&self, doc: &Document, workspace: &Workspace, ctx: &mut RuleContext<'_>);
}

/// Sink for one rule's findings in one document
pub struct RuleContext<'a> {
    file: &'a str,
    code: &'static str,
    severity: Severity,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> RuleContext<'a> {
    pub fn new(file: &'a str, code: &'static str, severity: Severity) -> Self {
        Self {
            file,
            code,
            severity,
            diagnostics: Vec::new(),
        }
    }

    /// File being checked
    pub fn file(&self) -> &'a str {
        self.file
    }

    /// A diagnostic carrying this rule's code, severity and file
    pub fn diagnostic(&self, span: Span, message: impl Into<String>) -> Diagnostic {
        Diagnostic::new(self.severity, message)
            .with_code(self.code)
            .with_file(self.file)
            .with_span(span)
    }

    /// Report a finding
    pub fn report(&mut self, span: Span, message: impl Into<String>) {
        let diagnostic = self.diagnostic(span, message);
        self.push(diagnostic);
    }

    /// Report a prepared diagnostic
    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}

/// Runs the registered rules over a workspace
pub struct Checker {
    rules: Vec<Box<dyn Rule>>,
}

impl Default for Checker {
    fn default() -> Self {
        Self::new()
    }
}

impl Checker {
    /// Create a checker with every built-in rule
    pub fn new() -> Self {
        Self {
            rules: rules::builtin(),
        }
    }

    /// Create an empty checker (for custom rule sets)
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    /// Add a rule to the checker
    pub fn add_rule(&mut self, rule: Box<dyn Rule>) {
        self.rules.push(rule);
    }

    /// Get the number of registered rules
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Look up a registered rule by code
    pub fn rule(&self, code: &str) -> Option<&dyn Rule> {
        self.rules
            .iter()
            .find(|rule| rule.code() == code)
            .map(|rule| rule.as_ref())
    }

    /// Codes and descriptions of all registered rules
    pub fn rule_descriptions(&self) -> Vec<(&'static str, &'static str)> {
        self.rules
            .iter()
            .map(|rule| (rule.code(), rule.description()))
            .collect()
    }

    /// Check every document, in filename order
    pub fn check(&self, workspace: &Workspace, config: &CheckConfig) -> Vec<Diagnostic> {
        self.warn_unknown_codes(config);
        let enabled = self.enabled(config);
        let mut diagnostics = Vec::new();
        for doc in workspace.all_models() {
            run(&enabled, doc, workspace, &mut diagnostics);
        }
        sort(&mut diagnostics);
        debug!(
            documents = workspace.document_count(),
            rules = enabled.len(),
            diagnostics = diagnostics.len(),
            "checked workspace"
        );
        diagnostics
    }

    /// Check a single document
    pub fn check_document(&self, workspace: &Workspace, file: &str, config: &CheckConfig) -> Vec<Diagnostic> {
        let Some(doc) = workspace.get_model(file) else {
            return Vec::new();
        };
        let enabled = self.enabled(config);
        let mut diagnostics = Vec::new();
        run(&enabled, doc, workspace, &mut diagnostics);
        sort(&mut diagnostics);
        diagnostics
    }

    /// Rules that are not off, with their effective severity
    fn enabled(&self, config: &CheckConfig) -> Vec<(&dyn Rule, Severity)> {
        self.rules
            .iter()
            .filter_map(|rule| {
                config
                    .severity(rule.code(), rule.default_severity())
                    .to_severity()
                    .map(|severity| (rule.as_ref(), severity))
            })
            .collect()
    }

    fn warn_unknown_codes(&self, config: &CheckConfig) {
        for code in config.codes() {
            if self.rule(code).is_none() {
                warn!(code, "configuration names an unknown rule");
            }
        }
    }
}

fn run(enabled: &[(&dyn Rule, Severity)], doc: &Document, workspace: &Workspace, out: &mut Vec<Diagnostic>) {
    for (rule, severity) in enabled {
        let mut ctx = RuleContext::new(doc.filename(), rule.code(), *severity);
        rule.evaluate(doc, workspace, &mut ctx);
        out.extend(ctx.into_diagnostics());
    }
}

fn sort(diagnostics: &mut [Diagnostic]) {
    diagnostics.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
}

/// Check a workspace with the built-in rules
pub fn check(workspace: &Workspace, config: &CheckConfig) -> Vec<Diagnostic> {
    Checker::new().check(workspace, config)
}

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingRule {
        calls: Arc<AtomicUsize>,
    }

    impl Rule for CountingRule {
        fn code(&self) -> &'static str {
            "counting"
        }

        fn category(&self) -> RuleCategory {
            RuleCategory::Instance
        }

        fn default_severity(&self) -> Severity {
            Severity::Warning
        }

        fn description(&self) -> &'static str {
            "Reports every entry"
        }

        fn evaluate(&self, doc: &Document, _workspace: &Workspace, ctx: &mut RuleContext<'_>) {
            self.calls.fetch_add(1, Ordering::SeqCst);
            for entry in doc.entries() {
                ctx.report(entry.header_span(), "entry");
            }
        }
    }

    fn workspace() -> Workspace {
        let mut ws = Workspace::new();
        ws.add_document("2026-01-02T00:00Z create note \"B\"\n", "b.thalo").unwrap();
        ws.add_document("2026-01-01T00:00Z create note \"A\"\n\n2026-01-03T00:00Z create note \"C\"\n", "a.thalo")
            .unwrap();
        ws
    }

    fn counting() -> (Checker, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut checker = Checker::empty();
        checker.add_rule(Box::new(CountingRule { calls: calls.clone() }));
        (checker, calls)
    }

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_builtin_rules_registered() {
        let checker = Checker::new();
        assert_eq!(checker.rule_count(), 31);
        let unknown = checker.rule("unknown-entity").unwrap();
        assert_eq!(unknown.category(), RuleCategory::Instance);
        assert_eq!(unknown.default_severity(), Severity::Error);
        assert!(checker.rule("no-such-rule").is_none());
    }

    #[test]
    fn test_rule_codes_are_unique() {
        let checker = Checker::new();
        let mut codes: Vec<_> = checker.rule_descriptions().into_iter().map(|(code, _)| code).collect();
        codes.sort_unstable();
        let before = codes.len();
        codes.dedup();
        assert_eq!(codes.len(), before);
    }

    #[test]
    fn test_output_sorted_by_file_then_position() {
        let (checker, _) = counting();
        let diagnostics = checker.check(&workspace(), &CheckConfig::default());
        let places: Vec<_> = diagnostics.iter().map(|d| (d.file.as_str(), d.line())).collect();
        assert_eq!(places, vec![("a.thalo", 1), ("a.thalo", 3), ("b.thalo", 1)]);
        assert!(diagnostics.iter().all(|d| d.code == "counting" && d.is_warning()));
    }

    #[test]
    fn test_configured_severity_applies() {
        let (checker, _) = counting();
        let config = CheckConfig::new().with_rule("counting", RuleSeverity::Error);
        assert!(checker.check(&workspace(), &config).iter().all(Diagnostic::is_error));
    }

    #[test]
    fn test_off_rule_never_evaluated() {
        let (checker, calls) = counting();
        let config = CheckConfig::new().with_rule("counting", RuleSeverity::Off);
        assert!(checker.check(&workspace(), &config).is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        checker.check(&workspace(), &CheckConfig::default());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_check_document() {
        let (checker, calls) = counting();
        let ws = workspace();
        let diagnostics = checker.check_document(&ws, "b.thalo", &CheckConfig::default());
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(checker.check_document(&ws, "missing.thalo", &CheckConfig::default()).is_empty());
    }
}
