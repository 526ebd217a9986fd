//! Command-line application
//!
//! This module contains the CLI argument parsing and command
//! implementations. Commands write to a caller-supplied writer so they can
//! be driven from tests; only [`run_cli`] touches stdout and the exit code.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::json;
use thalo_core::{parse_queries, Diagnostic, Diagnostics, QueryMatch};
use thalo_validate::{Checker, Rule, Settings};
use tracing::debug;

use crate::loader::{build_workspace, load};

/// Config files looked up in the current directory when `--config` is absent
const CONFIG_CANDIDATES: [&str; 2] = ["thalo.toml", ".thalo.toml"];

/// Output format for command results
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output
    #[default]
    Text,
    /// JSON output for editors and scripts
    Json,
}

#[derive(Parser)]
#[command(name = "thalo")]
#[command(author, version, about = "Check and query Thalo knowledge bases", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check .thalo and markdown files for issues
    Check {
        /// Files or directories to check
        #[arg(default_value = ".")]
        paths: Vec<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,

        /// Config file (defaults to thalo.toml in the current directory)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Override a rule severity, e.g. `unknown-field=off`
        #[arg(long = "rule", value_name = "CODE=SEVERITY")]
        rules: Vec<String>,
    },

    /// List instance entries matching a query
    Query {
        /// Query text, e.g. `lore where #career and subject = ^self`
        query: String,

        /// Files or directories to search
        #[arg(default_value = ".")]
        paths: Vec<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,

        /// Config file (defaults to thalo.toml in the current directory)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// List the built-in rules and their default severities
    Rules,
}

/// Counts reported by a check run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CheckSummary {
    pub files: usize,
    pub errors: usize,
    pub warnings: usize,
    pub infos: usize,
}

impl CheckSummary {
    fn from_diagnostics(files: usize, diagnostics: &Diagnostics) -> Self {
        Self {
            files,
            errors: diagnostics.error_count(),
            warnings: diagnostics.warning_count(),
            infos: diagnostics.info_count(),
        }
    }

    /// Whether the run should fail
    pub fn has_errors(&self) -> bool {
        self.errors > 0
    }
}

/// Run the CLI application
pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();
    let mut stdout = std::io::stdout().lock();

    match cli.command {
        Commands::Check {
            paths,
            format,
            config,
            rules,
        } => {
            let summary = check_command(&paths, format, config.as_deref(), &rules, &mut stdout)?;
            if summary.has_errors() {
                stdout.flush()?;
                std::process::exit(1);
            }
        }
        Commands::Query {
            query,
            paths,
            format,
            config,
        } => {
            query_command(&query, &paths, format, config.as_deref(), &mut stdout)?;
        }
        Commands::Rules => {
            rules_command(&mut stdout)?;
        }
    }

    Ok(())
}

/// Execute the check command
pub fn check_command(
    paths: &[PathBuf],
    format: OutputFormat,
    config_path: Option<&Path>,
    overrides: &[String],
    out: &mut dyn Write,
) -> Result<CheckSummary> {
    let mut settings = load_settings(config_path)?;
    for rule in overrides {
        settings
            .rules
            .apply_override(rule)
            .with_context(|| format!("Invalid --rule value: {}", rule))?;
    }

    let files = load(paths, &settings.workspace)?;
    let workspace = build_workspace(&files)?;
    let diagnostics = Diagnostics::from(Checker::new().check(&workspace, &settings.rules));
    let summary = CheckSummary::from_diagnostics(files.len(), &diagnostics);
    debug!(?summary, "check finished");

    match format {
        OutputFormat::Json => {
            let records: Vec<_> = diagnostics.iter().map(Diagnostic::to_record).collect();
            let json = serde_json::to_string_pretty(&records)
                .context("Failed to serialize diagnostics to JSON")?;
            writeln!(out, "{}", json)?;
        }
        OutputFormat::Text => {
            if diagnostics.is_empty() {
                writeln!(out, "✓ No issues found in {} file(s)", summary.files)?;
            } else {
                for diag in diagnostics.iter() {
                    writeln!(out, "{}", diag)?;
                    writeln!(out)?;
                }
                writeln!(
                    out,
                    "Found {} error(s) and {} warning(s) in {} file(s)",
                    summary.errors, summary.warnings, summary.files
                )?;
            }
        }
    }

    Ok(summary)
}

/// Execute the query command, returning the number of matches
pub fn query_command(
    query: &str,
    paths: &[PathBuf],
    format: OutputFormat,
    config_path: Option<&Path>,
    out: &mut dyn Write,
) -> Result<usize> {
    let queries = parse_queries(query).with_context(|| format!("Invalid query: {}", query))?;
    let settings = load_settings(config_path)?;
    let files = load(paths, &settings.workspace)?;
    let workspace = build_workspace(&files)?;
    let matches = workspace.query(&queries);

    match format {
        OutputFormat::Json => {
            let records: Vec<_> = matches.iter().map(match_record).collect();
            let json = serde_json::to_string_pretty(&records)
                .context("Failed to serialize query results to JSON")?;
            writeln!(out, "{}", json)?;
        }
        OutputFormat::Text => {
            for m in &matches {
                let (entity, title) = names(m);
                writeln!(
                    out,
                    "{}:{}  {} {} \"{}\"",
                    m.file,
                    m.entry.header.span.start_point.row + 1,
                    m.timestamp(),
                    entity,
                    title
                )?;
            }
        }
    }

    Ok(matches.len())
}

/// Execute the rules command
pub fn rules_command(out: &mut dyn Write) -> Result<()> {
    let checker = Checker::new();
    for (code, description) in checker.rule_descriptions() {
        let severity = checker
            .rule(code)
            .map(|rule| rule.default_severity().to_string())
            .unwrap_or_default();
        writeln!(out, "{:<32} {:<8} {}", code, severity, description)?;
    }
    Ok(())
}

fn names<'a>(m: &QueryMatch<'a>) -> (&'a str, &'a str) {
    let entity = m.entry.entity.as_ref().map(|e| e.name.as_str()).unwrap_or_default();
    let title = m.entry.header.title.as_ref().map(|t| t.text.as_str()).unwrap_or_default();
    (entity, title)
}

fn match_record(m: &QueryMatch<'_>) -> serde_json::Value {
    let (entity, title) = names(m);
    json!({
        "file": m.file,
        "line": m.entry.header.span.start_point.row + 1,
        "timestamp": m.timestamp(),
        "entity": entity,
        "title": title,
        "link": m.entry.header.link.as_ref().map(|l| l.id.as_str()),
    })
}

/// Load settings from an explicit path or the current directory
pub fn load_settings(config_path: Option<&Path>) -> Result<Settings> {
    match config_path {
        Some(path) => {
            if !path.exists() {
                anyhow::bail!("Config file not found: {}", path.display());
            }
            read_settings(path)
        }
        None => match CONFIG_CANDIDATES.into_iter().map(Path::new).find(|p| p.exists()) {
            Some(path) => read_settings(path),
            None => Ok(Settings::default()),
        },
    }
}

fn read_settings(path: &Path) -> Result<Settings> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config: {}", path.display()))?;
    Settings::from_toml_str(&content)
        .with_context(|| format!("Failed to parse config: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_check_defaults() {
        let args = vec!["thalo", "check"];
        let cli = Cli::try_parse_from(args).unwrap();

        match cli.command {
            Commands::Check {
                paths,
                format,
                config,
                rules,
            } => {
                assert_eq!(paths, vec![PathBuf::from(".")]);
                assert_eq!(format, OutputFormat::Text);
                assert!(config.is_none());
                assert!(rules.is_empty());
            }
            _ => panic!("Expected Check command"),
        }
    }

    #[test]
    fn test_cli_parse_check_with_options() {
        let args = vec![
            "thalo",
            "check",
            "notes",
            "journal.md",
            "--format",
            "json",
            "--config",
            "custom.toml",
            "--rule",
            "unknown-field=off",
            "--rule",
            "empty-section=warning",
        ];
        let cli = Cli::try_parse_from(args).unwrap();

        match cli.command {
            Commands::Check {
                paths,
                format,
                config,
                rules,
            } => {
                assert_eq!(paths, vec![PathBuf::from("notes"), PathBuf::from("journal.md")]);
                assert_eq!(format, OutputFormat::Json);
                assert_eq!(config, Some(PathBuf::from("custom.toml")));
                assert_eq!(rules, vec!["unknown-field=off", "empty-section=warning"]);
            }
            _ => panic!("Expected Check command"),
        }
    }

    #[test]
    fn test_cli_parse_query() {
        let args = vec!["thalo", "query", "lore where #career", "notes"];
        let cli = Cli::try_parse_from(args).unwrap();

        match cli.command {
            Commands::Query {
                query,
                paths,
                format,
                config,
            } => {
                assert_eq!(query, "lore where #career");
                assert_eq!(paths, vec![PathBuf::from("notes")]);
                assert_eq!(format, OutputFormat::Text);
                assert!(config.is_none());
            }
            _ => panic!("Expected Query command"),
        }
    }

    #[test]
    fn test_cli_parse_rules() {
        let cli = Cli::try_parse_from(vec!["thalo", "rules"]).unwrap();
        assert!(matches!(cli.command, Commands::Rules));
    }

    #[test]
    fn test_cli_query_requires_text() {
        assert!(Cli::try_parse_from(vec!["thalo", "query"]).is_err());
    }

    #[test]
    fn test_cli_rejects_unknown_format() {
        assert!(Cli::try_parse_from(vec!["thalo", "check", "--format", "xml"]).is_err());
    }

    #[test]
    fn test_load_settings_missing_file() {
        let err = load_settings(Some(Path::new("does-not-exist.toml"))).unwrap_err();
        assert!(err.to_string().contains("Config file not found"));
    }

    #[test]
    fn test_summary_counts() {
        let diagnostics = Diagnostics::from(vec![
            Diagnostic::error("a"),
            Diagnostic::warning("b"),
            Diagnostic::warning("c"),
            Diagnostic::info("d"),
        ]);
        let summary = CheckSummary::from_diagnostics(2, &diagnostics);
        assert_eq!(
            summary,
            CheckSummary {
                files: 2,
                errors: 1,
                warnings: 2,
                infos: 1
            }
        );
        assert!(summary.has_errors());
    }

    #[test]
    fn test_rules_command_lists_every_rule() {
        let mut out = Vec::new();
        rules_command(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().count(), Checker::new().rule_count());
        assert!(text.contains("unknown-entity"));
    }
}
