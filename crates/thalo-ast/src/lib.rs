//! thalo-ast - Typed syntax tree definitions
//!
//! This crate provides the AST produced by the Thalo syntax layer: entries
//! and their headers, metadata values, field type expressions, queries, and
//! the syntax-error nodes that stand in for malformed sub-fields.
//!
//! Nodes carry their own [`Span`] and never point back at their owning file
//! or entry; consumers pair facts with `(file, span)` instead.

pub mod entry;
pub mod error;
pub mod query;
pub mod span;
pub mod timestamp;
pub mod types;
pub mod value;

pub use entry::{
    ActualizeEntry, ContentLine, Entry, EntryKind, FieldDefinition, Header, InstanceDirective,
    InstanceEntry, Metadata, Removal, SchemaDirective, SchemaEntry, Section, SectionDefinition,
    SynthesisEntry, Title,
};
pub use error::{Parsed, SyntaxError, SyntaxErrorCode};
pub use query::{Condition, Query};
pub use span::{Point, Relocate, Shift, Span};
pub use timestamp::{Date, Time, Timestamp, Timezone};
pub use types::{PrimitiveType, TypeExpression};
pub use value::{DateRange, DateValue, Ident, LinkRef, PartialDate, Tag, Value, ValueContent};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_syntax_error_serializes_kebab_code() {
        let err = SyntaxError::new(
            SyntaxErrorCode::MissingTimezone,
            "Timestamp is missing a timezone",
            Span::default(),
        );
        let json = serde_json::to_string(&err).unwrap();
        assert!(json.contains("\"code\":\"missing-timezone\""));
        assert_eq!(err.code.to_string(), "missing-timezone");
    }
}
