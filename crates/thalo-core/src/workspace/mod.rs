//! Workspace
//!
//! One consistent multi-file state: the documents, the Schema Registry and
//! Link Index folded from them, and a semantic model per document.
//!
//! Every mutation treats the file as "retract, then add": the document's
//! previous contributions leave both indices before the new ones enter.
//! Semantic models that may have changed are recomputed before the mutation
//! returns, so readers never see stale state.

mod semantic;

#[cfg(test)]
mod tests;

use std::collections::{BTreeMap, BTreeSet};

use thalo_ast::Entry;
use tracing::debug;

use crate::document::{Document, FileKind};
use crate::error::Result;
use crate::links::{LinkChanges, LinkDefinition, LinkIndex, LinkOccurrence};
use crate::schema::SchemaRegistry;

pub use semantic::{EntityResolution, EntryModel, ResolvedLink, SemanticModel};

/// The multi-file state machine
#[derive(Debug, Clone, Default)]
pub struct Workspace {
    documents: BTreeMap<String, Document>,
    registry: SchemaRegistry,
    links: LinkIndex,
    models: BTreeMap<String, SemanticModel>,
    /// Documents whose models the last mutation recomputed
    last_invalidated: BTreeSet<String>,
}

impl Workspace {
    /// Create a new empty workspace
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file, or replace the content of a known one
    pub fn add_document(&mut self, source: &str, filename: &str) -> Result<()> {
        self.put_document(source, filename, None)
    }

    /// Add or replace a file, parsing it as `kind` whatever its name
    ///
    /// The kind sticks: later [`Workspace::add_document`] calls for the same
    /// file no longer sniff it.
    pub fn add_document_as(&mut self, source: &str, filename: &str, kind: FileKind) -> Result<()> {
        self.put_document(source, filename, Some(kind))
    }

    fn put_document(&mut self, source: &str, filename: &str, kind: Option<FileKind>) -> Result<()> {
        // Work on a copy so a failed re-parse leaves the workspace untouched
        let doc = match (self.documents.get(filename), kind) {
            (Some(existing), kind) => {
                let mut doc = existing.clone();
                if let Some(kind) = kind {
                    doc.set_kind(kind);
                }
                doc.update(source)?;
                doc
            }
            (None, Some(kind)) => Document::parse_as(source, filename, kind)?,
            (None, None) => Document::parse(source, filename)?,
        };

        let schema_changes = self.registry.update_document(filename, doc.schema_entries());
        let link_changes = self.links.update_document(filename, &doc.link_fragment());
        self.documents.insert(filename.to_string(), doc);

        self.invalidate(filename, &schema_changes, &link_changes);
        debug!(
            file = filename,
            entities = schema_changes.len(),
            invalidated = self.last_invalidated.len(),
            "document added"
        );
        Ok(())
    }

    /// Remove a file; returns false when it was not present
    pub fn remove_document(&mut self, filename: &str) -> bool {
        if self.documents.remove(filename).is_none() {
            return false;
        }
        let schema_changes = self.registry.remove_document(filename);
        let link_changes = self.links.remove_document(filename);

        self.invalidate(filename, &schema_changes, &link_changes);
        debug!(
            file = filename,
            entities = schema_changes.len(),
            invalidated = self.last_invalidated.len(),
            "document removed"
        );
        true
    }

    /// Recompute the models a mutation of `filename` may have changed
    fn invalidate(&mut self, filename: &str, schema_changes: &BTreeSet<String>, link_changes: &LinkChanges) {
        let mut dirty: BTreeSet<String> = BTreeSet::new();
        dirty.insert(filename.to_string());

        if !schema_changes.is_empty() {
            dirty.extend(self.documents.keys().cloned());
        } else {
            for id in &link_changes.definitions {
                dirty.extend(self.links.referencing_files(id).into_iter().map(str::to_string));
                dirty.extend(self.links.defining_files(id).into_iter().map(str::to_string));
            }
        }

        for file in &dirty {
            match self.documents.get(file) {
                Some(doc) => {
                    let model = SemanticModel::build(doc, &self.registry, &self.links);
                    self.models.insert(file.clone(), model);
                }
                None => {
                    self.models.remove(file);
                }
            }
        }
        self.last_invalidated = dirty;
    }

    /// The document for a file
    pub fn get_model(&self, filename: &str) -> Option<&Document> {
        self.documents.get(filename)
    }

    /// Every document, in filename order
    pub fn all_models(&self) -> impl Iterator<Item = &Document> {
        self.documents.values()
    }

    /// Every filename, sorted
    pub fn files(&self) -> impl Iterator<Item = &str> {
        self.documents.keys().map(String::as_str)
    }

    pub fn document_count(&self) -> usize {
        self.documents.len()
    }

    pub fn schema_registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    pub fn link_index(&self) -> &LinkIndex {
        &self.links
    }

    /// The resolved view of a file
    pub fn semantic_model(&self, filename: &str) -> Option<&SemanticModel> {
        self.models.get(filename)
    }

    /// Files whose models the last mutation recomputed
    pub fn last_invalidated(&self) -> &BTreeSet<String> {
        &self.last_invalidated
    }

    pub fn get_link_definition(&self, id: &str) -> Option<&LinkDefinition> {
        self.links.get_definition(id)
    }

    pub fn get_link_references(&self, id: &str, include_definition: bool) -> Vec<LinkOccurrence<'_>> {
        self.links.get_references(id, include_definition)
    }

    /// Look up an entry by explicit link id or canonical timestamp
    pub fn find_entry(&self, id: &str) -> Option<(&Document, &Entry)> {
        let definition = self.links.get_definition(id)?;
        let doc = self.documents.get(&definition.entry.file)?;
        let entry = doc
            .entries()
            .iter()
            .find(|entry| entry.span() == definition.entry.span)?;
        Some((doc, entry))
    }
}
