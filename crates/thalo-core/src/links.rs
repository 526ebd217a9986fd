//! Link Index
//!
//! Stores which entries define each link id and which entries reference it,
//! across all workspace documents. Each document's contribution is tracked
//! so an update can retract it completely before the new one is added.

use std::collections::{BTreeSet, HashMap};

use thalo_ast::{Entry, EntryKind, Span};

/// The entry a link fact belongs to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryRef {
    pub file: String,
    /// Span of the whole entry
    pub span: Span,
    pub kind: EntryKind,
    /// Canonical timestamp of the entry
    pub timestamp: String,
}

impl EntryRef {
    pub fn new(file: &str, entry: &Entry) -> Self {
        Self {
            file: file.to_string(),
            span: entry.span(),
            kind: entry.kind(),
            timestamp: entry.timestamp().canonical(),
        }
    }
}

/// An entry that answers to a link id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkDefinition {
    pub id: String,
    /// The `^id` token, or the timestamp for implicit ids
    pub span: Span,
    pub entry: EntryRef,
}

/// One occurrence of `^id` pointing at another entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkReference {
    pub id: String,
    pub span: Span,
    pub entry: EntryRef,
    /// Metadata key holding the link, if any
    pub key: Option<String>,
}

/// Either side of a link, as returned by [`LinkIndex::get_references`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkOccurrence<'a> {
    Definition(&'a LinkDefinition),
    Reference(&'a LinkReference),
}

impl<'a> LinkOccurrence<'a> {
    pub fn file(&self) -> &'a str {
        match self {
            LinkOccurrence::Definition(d) => &d.entry.file,
            LinkOccurrence::Reference(r) => &r.entry.file,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            LinkOccurrence::Definition(d) => d.span,
            LinkOccurrence::Reference(r) => r.span,
        }
    }
}

/// Link facts of one document
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinkFragment {
    /// Explicit `^id` definitions
    pub definitions: Vec<LinkDefinition>,
    /// Implicit timestamp ids
    pub timestamps: Vec<LinkDefinition>,
    pub references: Vec<LinkReference>,
}

impl LinkFragment {
    /// Collect the link facts of a document's entries
    pub fn collect(file: &str, entries: &[Entry]) -> Self {
        let mut fragment = Self::default();
        for entry in entries {
            let owner = EntryRef::new(file, entry);

            if entry.kind() != EntryKind::Actualize {
                if let Some(link) = entry.link() {
                    fragment.definitions.push(LinkDefinition {
                        id: link.id.clone(),
                        span: link.span,
                        entry: owner.clone(),
                    });
                }
                fragment.timestamps.push(LinkDefinition {
                    id: owner.timestamp.clone(),
                    span: entry.timestamp().span,
                    entry: owner.clone(),
                });
            }

            if let Entry::Actualize(actualize) = entry {
                if let Ok(target) = &actualize.target {
                    fragment.references.push(LinkReference {
                        id: target.id.clone(),
                        span: target.span,
                        entry: owner.clone(),
                        key: None,
                    });
                }
            }

            for metadata in entry.metadata() {
                for link in metadata.value.links() {
                    fragment.references.push(LinkReference {
                        id: link.id.clone(),
                        span: link.span,
                        entry: owner.clone(),
                        key: Some(metadata.key.name.clone()),
                    });
                }
            }
        }
        fragment
    }

    /// Ids referenced by this fragment
    pub fn referenced_ids(&self) -> BTreeSet<String> {
        self.references.iter().map(|r| r.id.clone()).collect()
    }
}

/// What a document update changed in the index
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkChanges {
    /// Ids the document defined before or after the update
    pub definitions: BTreeSet<String>,
    /// Ids the document referenced before or after the update
    pub references: BTreeSet<String>,
}

impl LinkChanges {
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty() && self.references.is_empty()
    }
}

/// Ids contributed by one document, for cleanup on update
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Contribution {
    definitions: BTreeSet<String>,
    timestamps: BTreeSet<String>,
    references: BTreeSet<String>,
}

/// Workspace-wide link index
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinkIndex {
    /// Explicit ids, each list sorted by (file, offset)
    definitions: HashMap<String, Vec<LinkDefinition>>,
    /// Timestamp ids, each list sorted by (file, offset)
    timestamps: HashMap<String, Vec<LinkDefinition>>,
    /// Referenced ids, each list sorted by (file, offset)
    references: HashMap<String, Vec<LinkReference>>,
    /// Document → ids it contributed
    documents: HashMap<String, Contribution>,
}

fn definition_order(a: &LinkDefinition, b: &LinkDefinition) -> std::cmp::Ordering {
    (&a.entry.file, a.span.start).cmp(&(&b.entry.file, b.span.start))
}

fn retract<T>(map: &mut HashMap<String, Vec<T>>, ids: &BTreeSet<String>, keep: impl Fn(&T) -> bool) {
    for id in ids {
        if let Some(list) = map.get_mut(id) {
            list.retain(&keep);
            if list.is_empty() {
                map.remove(id);
            }
        }
    }
}

impl LinkIndex {
    /// Create a new empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an index from every document's fragment at once
    pub fn rebuild_from<'a>(fragments: impl IntoIterator<Item = (&'a str, &'a LinkFragment)>) -> Self {
        let mut index = Self::new();
        for (file, fragment) in fragments {
            index.update_document(file, fragment);
        }
        index
    }

    /// Replace a document's contribution
    pub fn update_document(&mut self, file: &str, fragment: &LinkFragment) -> LinkChanges {
        let mut changes = self.remove_document(file);

        let mut contribution = Contribution::default();
        for definition in &fragment.definitions {
            let list = self.definitions.entry(definition.id.clone()).or_default();
            list.push(definition.clone());
            list.sort_by(definition_order);
            contribution.definitions.insert(definition.id.clone());
        }
        for definition in &fragment.timestamps {
            let list = self.timestamps.entry(definition.id.clone()).or_default();
            list.push(definition.clone());
            list.sort_by(definition_order);
            contribution.timestamps.insert(definition.id.clone());
        }
        for reference in &fragment.references {
            let list = self.references.entry(reference.id.clone()).or_default();
            list.push(reference.clone());
            list.sort_by(|a, b| (&a.entry.file, a.span.start).cmp(&(&b.entry.file, b.span.start)));
            contribution.references.insert(reference.id.clone());
        }

        changes.definitions.extend(contribution.definitions.iter().cloned());
        changes.definitions.extend(contribution.timestamps.iter().cloned());
        changes.references.extend(contribution.references.iter().cloned());
        self.documents.insert(file.to_string(), contribution);
        changes
    }

    /// Retract a document's contribution
    pub fn remove_document(&mut self, file: &str) -> LinkChanges {
        let mut changes = LinkChanges::default();
        let Some(contribution) = self.documents.remove(file) else {
            return changes;
        };

        retract(&mut self.definitions, &contribution.definitions, |d| d.entry.file != file);
        retract(&mut self.timestamps, &contribution.timestamps, |d| d.entry.file != file);
        retract(&mut self.references, &contribution.references, |r| r.entry.file != file);

        changes.definitions.extend(contribution.definitions);
        changes.definitions.extend(contribution.timestamps);
        changes.references.extend(contribution.references);
        changes
    }

    /// Resolve an id: explicit ids first, then timestamps
    ///
    /// When several entries share the id, the last in (file, offset) order
    /// wins; the checker reports the collision.
    pub fn get_definition(&self, id: &str) -> Option<&LinkDefinition> {
        self.definitions
            .get(id)
            .and_then(|list| list.last())
            .or_else(|| self.timestamps.get(id).and_then(|list| list.last()))
    }

    /// All explicit definitions of an id
    pub fn get_definitions(&self, id: &str) -> &[LinkDefinition] {
        self.definitions.get(id).map(Vec::as_slice).unwrap_or_default()
    }

    /// All entries whose timestamp is `timestamp`
    pub fn entries_at(&self, timestamp: &str) -> &[LinkDefinition] {
        self.timestamps
            .get(timestamp)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// References to an id, optionally preceded by its definition
    pub fn get_references(&self, id: &str, include_definition: bool) -> Vec<LinkOccurrence<'_>> {
        let mut occurrences = Vec::new();
        if include_definition {
            if let Some(definition) = self.get_definition(id) {
                occurrences.push(LinkOccurrence::Definition(definition));
            }
        }
        if let Some(references) = self.references.get(id) {
            occurrences.extend(references.iter().map(LinkOccurrence::Reference));
        }
        occurrences
    }

    /// Check if an id resolves
    pub fn is_defined(&self, id: &str) -> bool {
        self.get_definition(id).is_some()
    }

    /// Explicit ids defined by more than one entry
    pub fn duplicate_ids(&self) -> impl Iterator<Item = (&str, &[LinkDefinition])> {
        self.definitions
            .iter()
            .filter(|(_, list)| list.len() > 1)
            .map(|(id, list)| (id.as_str(), list.as_slice()))
    }

    /// Documents holding references to an id
    pub fn referencing_files(&self, id: &str) -> BTreeSet<&str> {
        self.references
            .get(id)
            .map(|refs| refs.iter().map(|r| r.entry.file.as_str()).collect())
            .unwrap_or_default()
    }

    /// Documents defining an id, explicitly or by timestamp
    pub fn defining_files(&self, id: &str) -> BTreeSet<&str> {
        self.definitions
            .get(id)
            .into_iter()
            .chain(self.timestamps.get(id))
            .flatten()
            .map(|d| d.entry.file.as_str())
            .collect()
    }
}
