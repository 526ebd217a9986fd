//! thalo-cli - Command-line interface library
//!
//! Loads `.thalo` and markdown files from disk into a
//! [`thalo_core::Workspace`] and exposes the commands behind the `thalo`
//! binary:
//! - Check: run the validation rules and report diagnostics
//! - Query: list instance entries matching a query
//! - Rules: list the built-in rules
//!
//! # Library Usage
//!
//! ```no_run
//! use std::path::PathBuf;
//! use thalo_cli::{check_command, OutputFormat};
//!
//! let mut out = Vec::new();
//! let summary = check_command(&[PathBuf::from("notes")], OutputFormat::Json, None, &[], &mut out)?;
//! println!("{} error(s)", summary.errors);
//! # Ok::<(), anyhow::Error>(())
//! ```
//!
//! # Binary Usage
//!
//! ```bash
//! # Check every .thalo and .md file under the current directory
//! thalo check
//!
//! # Silence a rule for one run
//! thalo check notes --rule unknown-field=off --format json
//!
//! # Query entries
//! thalo query "lore where #career and subject = ^self" notes
//! ```

pub mod app;
pub mod loader;

// Re-export main entry point and types
pub use app::{check_command, load_settings, query_command, rules_command};
pub use app::{run_cli, CheckSummary, OutputFormat};
pub use loader::{build_workspace, discover, load, SourceFile};
