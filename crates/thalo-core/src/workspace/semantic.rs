//! Per-document semantic view
//!
//! Entries annotated with how their entity and links resolve against the
//! current Schema Registry and Link Index. No diagnostics live here; the
//! checker derives those.

use thalo_ast::{Entry, EntryKind, Span};

use crate::document::Document;
use crate::links::{EntryRef, LinkFragment, LinkIndex};
use crate::schema::SchemaRegistry;

/// How an entry's entity name resolves
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityResolution {
    /// The entry names no entity (synthesis, actualize, or unreadable name)
    None,
    /// A schema exists for the entity
    Known(String),
    /// No schema exists for the entity
    Unknown(String),
}

impl EntityResolution {
    pub fn is_unknown(&self) -> bool {
        matches!(self, EntityResolution::Unknown(_))
    }
}

/// A link reference and the entry it currently points at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLink {
    pub id: String,
    pub span: Span,
    pub key: Option<String>,
    pub target: Option<EntryRef>,
}

impl ResolvedLink {
    pub fn is_resolved(&self) -> bool {
        self.target.is_some()
    }
}

/// One entry with its resolutions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryModel {
    /// Position in [`Document::entries`]
    pub index: usize,
    pub kind: EntryKind,
    pub span: Span,
    pub timestamp: String,
    pub entity: EntityResolution,
    pub links: Vec<ResolvedLink>,
}

/// Semantic view of one document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SemanticModel {
    pub file: String,
    pub entries: Vec<EntryModel>,
}

impl SemanticModel {
    /// Resolve a document against the workspace indices
    pub fn build(doc: &Document, registry: &SchemaRegistry, links: &LinkIndex) -> Self {
        let entries = doc
            .entries()
            .iter()
            .enumerate()
            .map(|(index, entry)| {
                let entity = match entry {
                    Entry::Instance(_) | Entry::Schema(_) => match entry.entity() {
                        Some(ident) if registry.has(&ident.name) => {
                            EntityResolution::Known(ident.name.clone())
                        }
                        Some(ident) => EntityResolution::Unknown(ident.name.clone()),
                        None => EntityResolution::None,
                    },
                    Entry::Synthesis(_) | Entry::Actualize(_) => EntityResolution::None,
                };

                let fragment = LinkFragment::collect(doc.filename(), std::slice::from_ref(entry));
                let resolved = fragment
                    .references
                    .into_iter()
                    .map(|reference| ResolvedLink {
                        target: links.get_definition(&reference.id).map(|d| d.entry.clone()),
                        id: reference.id,
                        span: reference.span,
                        key: reference.key,
                    })
                    .collect();

                EntryModel {
                    index,
                    kind: entry.kind(),
                    span: entry.span(),
                    timestamp: entry.timestamp().canonical(),
                    entity,
                    links: resolved,
                }
            })
            .collect();

        Self {
            file: doc.filename().to_string(),
            entries,
        }
    }

    /// Links with no definition anywhere
    pub fn unresolved_links(&self) -> impl Iterator<Item = &ResolvedLink> {
        self.entries
            .iter()
            .flat_map(|e| e.links.iter())
            .filter(|link| !link.is_resolved())
    }

    /// Entries naming an entity with no schema
    pub fn unknown_entities(&self) -> impl Iterator<Item = &EntryModel> {
        self.entries.iter().filter(|e| e.entity.is_unknown())
    }
}
