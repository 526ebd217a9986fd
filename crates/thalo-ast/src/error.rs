//! Syntax-error nodes
//!
//! Recoverable grammar defects are stored in the tree where the expected
//! node would have been, so one bad token never hides the rest of a file.

use serde::{Deserialize, Serialize};

use crate::span::{Relocate, Shift, Span};

/// Stable codes for recoverable syntax defects
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SyntaxErrorCode {
    /// Timestamp without `Z` or `+HH:MM`
    MissingTimezone,
    /// Top-level line that is not an entry header
    InvalidHeader,
    /// Word after the timestamp is not a known directive
    UnknownDirective,
    /// Instance or schema header without an entity name
    MissingEntity,
    /// Header without a quoted title
    MissingTitle,
    /// Quoted string without its closing quote
    UnterminatedString,
    /// Leftover token in a header
    UnexpectedToken,
    /// `actualize-synthesis` without a `^target`
    MissingLinkTarget,
    /// Body line that is not `key: value`
    InvalidMetadataLine,
    /// Metadata value that cannot be read
    InvalidValue,
    /// Query list that cannot be read
    InvalidQuery,
    /// Field type that cannot be read
    InvalidTypeExpression,
    /// Field default that cannot be read
    InvalidDefaultValue,
    /// Schema field line that cannot be read
    InvalidFieldDefinition,
    /// Schema section line that cannot be read
    InvalidSectionDefinition,
    /// `# Something` heading inside a schema entry that is not a schema block
    UnknownSchemaBlock,
    /// Schema body line outside any `# Metadata`/`# Sections` block
    ContentOutsideBlock,
    /// Indented line with no entry to belong to
    UnexpectedIndentation,
}

impl SyntaxErrorCode {
    /// The kebab-case code string
    pub fn as_str(&self) -> &'static str {
        match self {
            SyntaxErrorCode::MissingTimezone => "missing-timezone",
            SyntaxErrorCode::InvalidHeader => "invalid-header",
            SyntaxErrorCode::UnknownDirective => "unknown-directive",
            SyntaxErrorCode::MissingEntity => "missing-entity",
            SyntaxErrorCode::MissingTitle => "missing-title",
            SyntaxErrorCode::UnterminatedString => "unterminated-string",
            SyntaxErrorCode::UnexpectedToken => "unexpected-token",
            SyntaxErrorCode::MissingLinkTarget => "missing-link-target",
            SyntaxErrorCode::InvalidMetadataLine => "invalid-metadata-line",
            SyntaxErrorCode::InvalidValue => "invalid-value",
            SyntaxErrorCode::InvalidQuery => "invalid-query",
            SyntaxErrorCode::InvalidTypeExpression => "invalid-type-expression",
            SyntaxErrorCode::InvalidDefaultValue => "invalid-default-value",
            SyntaxErrorCode::InvalidFieldDefinition => "invalid-field-definition",
            SyntaxErrorCode::InvalidSectionDefinition => "invalid-section-definition",
            SyntaxErrorCode::UnknownSchemaBlock => "unknown-schema-block",
            SyntaxErrorCode::ContentOutsideBlock => "content-outside-block",
            SyntaxErrorCode::UnexpectedIndentation => "unexpected-indentation",
        }
    }
}

impl std::fmt::Display for SyntaxErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A syntax-error node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyntaxError {
    pub code: SyntaxErrorCode,
    pub message: String,
    pub span: Span,
}

impl SyntaxError {
    pub fn new(code: SyntaxErrorCode, message: impl Into<String>, span: Span) -> Self {
        Self {
            code,
            message: message.into(),
            span,
        }
    }
}

impl Relocate for SyntaxError {
    fn relocate(&mut self, shift: &Shift) {
        self.span.relocate(shift);
    }
}

/// A grammar sub-field: the typed node, or the error that stands in for it
pub type Parsed<T> = Result<T, SyntaxError>;
