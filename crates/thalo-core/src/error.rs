//! Internal error type
//!
//! Malformed user input never reaches this type: it becomes syntax-error
//! nodes in the tree. These variants signal that the grammar produced a shape
//! the builder does not expect, which is a bug.

use thiserror::Error;

/// Internal contract violations
#[derive(Debug, Error, PartialEq)]
pub enum Error {
    /// A child the grammar guarantees is absent
    #[error("syntax tree has no `{expected}` node inside `{parent}`")]
    MissingNode {
        parent: String,
        expected: String,
    },

    /// A child of a kind the parent cannot hold
    #[error("unexpected `{found}` node inside `{parent}`")]
    UnexpectedNode { parent: String, found: String },

    /// A token whose text does not fit its rule
    #[error("malformed `{rule}` token `{text}`")]
    MalformedToken { rule: String, text: String },
}

/// Result alias for core operations
pub type Result<T> = std::result::Result<T, Error>;
