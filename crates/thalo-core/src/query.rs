//! Query engine
//!
//! `lore where #career and subject = ^self, journal` selects instance
//! entries across the workspace.

use thalo_ast::{Condition, InstanceEntry, Query};
use thiserror::Error;

use crate::syntax::{build_queries, Line};
use crate::workspace::Workspace;

/// Query text that could not be read
#[derive(Debug, Error, PartialEq)]
pub enum QueryError {
    #[error("empty query")]
    Empty,

    #[error("invalid query: {0}")]
    Invalid(String),

    #[error(transparent)]
    Internal(#[from] crate::error::Error),
}

/// Parse a comma-separated query list
pub fn parse_queries(text: &str) -> Result<Vec<Query>, QueryError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(QueryError::Empty);
    }
    let line = Line {
        row: 0,
        start: 0,
        margin: 0,
        text,
    };
    build_queries(line, 0, text)?.map_err(|err| QueryError::Invalid(err.message))
}

/// An instance entry selected by a query
#[derive(Debug, Clone, Copy)]
pub struct QueryMatch<'a> {
    pub file: &'a str,
    pub entry: &'a InstanceEntry,
}

impl QueryMatch<'_> {
    /// Canonical timestamp, the entry's implicit link id
    pub fn timestamp(&self) -> String {
        self.entry.header.timestamp.canonical()
    }
}

/// Check if an instance entry satisfies every condition of a query
pub fn entry_matches(query: &Query, entry: &InstanceEntry) -> bool {
    let entity = match &entry.entity {
        Ok(ident) => ident,
        Err(_) => return false,
    };
    if entity.name != query.entity.name {
        return false;
    }
    query.conditions.iter().all(|condition| match condition {
        Condition::Tag(tag) => entry.header.tags.iter().any(|t| t.name == tag.name),
        Condition::Link(link) => {
            entry.header.link.as_ref().is_some_and(|l| l.id == link.id)
                || entry
                    .metadata
                    .iter()
                    .any(|m| m.value.links().iter().any(|l| l.id == link.id))
        }
        Condition::Field { key, value, .. } => {
            let expected = value.normalized();
            entry
                .metadata
                .iter()
                .filter(|m| m.key.name == key.name)
                .any(|m| m.value.normalized() == expected)
        }
    })
}

impl Workspace {
    /// Instance entries matching any of the queries, oldest first
    pub fn query(&self, queries: &[Query]) -> Vec<QueryMatch<'_>> {
        let mut results: Vec<QueryMatch<'_>> = self
            .all_models()
            .flat_map(|doc| {
                doc.instance_entries().map(move |entry| QueryMatch {
                    file: doc.filename(),
                    entry,
                })
            })
            .filter(|m| queries.iter().any(|q| entry_matches(q, m.entry)))
            .collect();
        results.sort_by(|a, b| {
            a.entry
                .header
                .timestamp
                .instant()
                .cmp(&b.entry.header.timestamp.instant())
                .then_with(|| a.file.cmp(b.file))
                .then_with(|| a.entry.span.start.cmp(&b.entry.span.start))
        });
        results
    }
}
