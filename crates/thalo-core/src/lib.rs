//! thalo-core - Incremental semantic workspace for Thalo
//!
//! Parses `.thalo` files and markdown files with embedded ```` ```thalo ````
//! blocks, and keeps a Schema Registry and Link Index consistent across
//! add, update and remove of documents.
//!
//! # Example
//!
//! ```
//! use thalo_core::Workspace;
//!
//! let mut workspace = Workspace::new();
//! workspace
//!     .add_document(
//!         "2026-01-01T00:00Z define-entity lore \"Knowledge\"\n  # Metadata\n  subject: link\n",
//!         "schema.thalo",
//!     )
//!     .unwrap();
//! workspace
//!     .add_document("2026-01-05T18:00Z create lore \"Note\" ^note\n  subject: ^self\n", "notes.thalo")
//!     .unwrap();
//!
//! assert!(workspace.schema_registry().get("lore").is_some());
//! assert_eq!(workspace.get_link_definition("note").unwrap().entry.file, "notes.thalo");
//! ```

pub mod diagnostics;
pub mod document;
pub mod edit;
pub mod error;
pub mod links;
pub mod query;
pub mod schema;
pub mod source_map;
pub mod synthesis;
pub mod syntax;
pub mod workspace;

// Re-export main types
pub use diagnostics::{Diagnostic, DiagnosticRecord, Diagnostics, Severity};
pub use document::{Document, FileKind, SourceBlock};
pub use edit::{compute_edit, InputEdit};
pub use error::{Error, Result};
pub use links::{EntryRef, LinkChanges, LinkDefinition, LinkIndex, LinkOccurrence, LinkReference};
pub use query::{parse_queries, QueryError, QueryMatch};
pub use schema::{EntitySchema, FieldSchema, SchemaRegistry, SectionSchema};
pub use source_map::SourceMap;
pub use synthesis::{Checkpoint, SynthesisStatus};
pub use workspace::{SemanticModel, Workspace};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
