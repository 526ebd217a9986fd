//! Schema Registry
//!
//! Folds `define-entity` and `alter-entity` entries into one current
//! [`EntitySchema`] per entity name.
//!
//! Contributions are grouped by entity and ordered by (UTC instant, file,
//! byte offset). The first `define-entity` in that order is the base; every
//! `alter-entity` is then applied in order. Entities with no
//! `define-entity` have no schema.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use thalo_ast::{SchemaDirective, SchemaEntry, Span, TypeExpression, Value};
use tracing::debug;

/// Where a schema fact came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaSource {
    pub file: String,
    /// Canonical timestamp of the schema entry
    pub timestamp: String,
    /// Span of the definition line (or of the entry for whole-entity facts)
    pub span: Span,
}

/// A metadata field an entity accepts
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSchema {
    pub name: String,
    pub optional: bool,
    /// `None` when the written type could not be read
    pub type_expr: Option<TypeExpression>,
    pub default: Option<Value>,
    pub description: Option<String>,
    pub source: SchemaSource,
}

/// A content section an entity accepts
#[derive(Debug, Clone, PartialEq)]
pub struct SectionSchema {
    pub name: String,
    pub optional: bool,
    pub description: Option<String>,
    pub source: SchemaSource,
}

/// The current contract of one entity
#[derive(Debug, Clone, PartialEq)]
pub struct EntitySchema {
    pub name: String,
    pub description: Option<String>,
    pub fields: Vec<FieldSchema>,
    pub sections: Vec<SectionSchema>,
    pub defined_by: SchemaSource,
    pub altered_by: Vec<SchemaSource>,
}

impl EntitySchema {
    pub fn field(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn section(&self, name: &str) -> Option<&SectionSchema> {
        self.sections.iter().find(|s| s.name == name)
    }

    pub fn required_fields(&self) -> impl Iterator<Item = &FieldSchema> {
        self.fields.iter().filter(|f| !f.optional)
    }

    pub fn required_sections(&self) -> impl Iterator<Item = &SectionSchema> {
        self.sections.iter().filter(|s| !s.optional)
    }

    fn apply(&mut self, entry: &SchemaEntry, file: &str) {
        let source = |span: Span| SchemaSource {
            file: file.to_string(),
            timestamp: entry.header.timestamp.canonical(),
            span,
        };

        for field in &entry.fields {
            let schema = FieldSchema {
                name: field.name.name.clone(),
                optional: field.optional,
                type_expr: field.type_expr.as_ref().ok().cloned(),
                default: field.default.as_ref().and_then(|d| d.as_ref().ok()).cloned(),
                description: field.description.clone(),
                source: source(field.span),
            };
            match self.fields.iter_mut().find(|f| f.name == schema.name) {
                Some(existing) => *existing = schema,
                None => self.fields.push(schema),
            }
        }
        for section in &entry.sections {
            let schema = SectionSchema {
                name: section.name.name.clone(),
                optional: section.optional,
                description: section.description.clone(),
                source: source(section.span),
            };
            match self.sections.iter_mut().find(|s| s.name == schema.name) {
                Some(existing) => *existing = schema,
                None => self.sections.push(schema),
            }
        }
        for removal in &entry.removed_fields {
            self.fields.retain(|f| f.name != removal.name.name);
        }
        for removal in &entry.removed_sections {
            self.sections.retain(|s| s.name != removal.name.name);
        }
    }
}

/// One schema entry feeding the registry
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaContribution {
    pub file: String,
    pub entry: SchemaEntry,
}

impl SchemaContribution {
    fn order_key(&self) -> (i64, &str, usize) {
        (
            self.entry.header.timestamp.instant(),
            &self.file,
            self.entry.span.start,
        )
    }

    pub fn is_define(&self) -> bool {
        self.entry.directive == SchemaDirective::DefineEntity
    }

    /// Check if this contribution is the given entry
    pub fn is(&self, file: &str, entry: &SchemaEntry) -> bool {
        self.file == file && self.entry.span.start == entry.span.start
    }
}

/// Workspace-wide schema state
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaRegistry {
    /// Entity → contributions in fold order
    contributions: BTreeMap<String, Vec<SchemaContribution>>,
    /// File → entities it contributes to
    documents: HashMap<String, BTreeSet<String>>,
    /// Entity → folded schema
    schemas: BTreeMap<String, EntitySchema>,
}

fn fold(group: &[SchemaContribution], stop: Option<(&str, usize)>) -> Option<EntitySchema> {
    let stop_at = |c: &SchemaContribution| stop.is_some_and(|(file, start)| c.file == file && c.entry.span.start == start);
    let end = group.iter().position(stop_at).unwrap_or(group.len());
    let applied = &group[..end];

    // A full fold still applies alterations that sort before the define;
    // a partial fold only knows defines up to its stop point.
    let candidates = if stop.is_some() { applied } else { group };
    let base = candidates.iter().find(|c| c.is_define())?;
    let entity = base.entry.entity.as_ref().ok()?;
    let mut schema = EntitySchema {
        name: entity.name.clone(),
        description: base.entry.header.title.as_ref().ok().map(|t| t.text.clone()),
        fields: Vec::new(),
        sections: Vec::new(),
        defined_by: SchemaSource {
            file: base.file.clone(),
            timestamp: base.entry.header.timestamp.canonical(),
            span: base.entry.header.span,
        },
        altered_by: Vec::new(),
    };
    schema.apply(&base.entry, &base.file);

    for alteration in applied.iter().filter(|c| !c.is_define()) {
        schema.apply(&alteration.entry, &alteration.file);
        schema.altered_by.push(SchemaSource {
            file: alteration.file.clone(),
            timestamp: alteration.entry.header.timestamp.canonical(),
            span: alteration.entry.header.span,
        });
    }
    Some(schema)
}

impl SchemaRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from every schema entry at once
    pub fn rebuild_from<'a>(entries: impl IntoIterator<Item = (&'a str, &'a SchemaEntry)>) -> Self {
        let mut by_file: BTreeMap<&str, Vec<&SchemaEntry>> = BTreeMap::new();
        for (file, entry) in entries {
            by_file.entry(file).or_default().push(entry);
        }
        let mut registry = Self::new();
        for (file, entries) in by_file {
            registry.update_document(file, entries);
        }
        registry
    }

    /// Replace a document's contributions
    ///
    /// Returns the entities whose contributions changed; only those groups
    /// are re-folded.
    pub fn update_document<'a>(
        &mut self,
        file: &str,
        entries: impl IntoIterator<Item = &'a SchemaEntry>,
    ) -> BTreeSet<String> {
        let mut incoming: BTreeMap<String, Vec<SchemaContribution>> = BTreeMap::new();
        for entry in entries {
            if let Ok(entity) = &entry.entity {
                incoming
                    .entry(entity.name.clone())
                    .or_default()
                    .push(SchemaContribution {
                        file: file.to_string(),
                        entry: entry.clone(),
                    });
            }
        }

        let previous = self.documents.remove(file).unwrap_or_default();
        let mut changed = BTreeSet::new();
        for name in previous.iter().chain(incoming.keys()) {
            let old: Vec<&SchemaContribution> = self
                .contributions
                .get(name)
                .map(|group| group.iter().filter(|c| c.file == file).collect())
                .unwrap_or_default();
            let new: Vec<&SchemaContribution> = incoming.get(name).map(|v| v.iter().collect()).unwrap_or_default();
            if old != new {
                changed.insert(name.clone());
            }
        }

        for name in &changed {
            let group = self.contributions.entry(name.clone()).or_default();
            group.retain(|c| c.file != file);
            if let Some(added) = incoming.get(name) {
                group.extend(added.iter().cloned());
            }
            group.sort_by(|a, b| a.order_key().cmp(&b.order_key()));
            self.refold(name);
        }

        if !incoming.is_empty() {
            self.documents
                .insert(file.to_string(), incoming.keys().cloned().collect());
        }
        if !changed.is_empty() {
            debug!(file, entities = changed.len(), "schema contributions changed");
        }
        changed
    }

    /// Retract a document's contributions
    pub fn remove_document(&mut self, file: &str) -> BTreeSet<String> {
        self.update_document(file, std::iter::empty())
    }

    fn refold(&mut self, name: &str) {
        let folded = match self.contributions.get(name) {
            Some(group) if !group.is_empty() => fold(group, None),
            _ => {
                self.contributions.remove(name);
                None
            }
        };
        match folded {
            Some(schema) => {
                self.schemas.insert(name.to_string(), schema);
            }
            None => {
                self.schemas.remove(name);
            }
        }
    }

    /// The current schema of an entity
    pub fn get(&self, name: &str) -> Option<&EntitySchema> {
        self.schemas.get(name)
    }

    pub fn has(&self, name: &str) -> bool {
        self.schemas.contains_key(name)
    }

    /// Entities with a schema, sorted
    pub fn entity_names(&self) -> impl Iterator<Item = &str> {
        self.schemas.keys().map(String::as_str)
    }

    /// Schema entries of an entity in fold order
    pub fn contributions(&self, name: &str) -> &[SchemaContribution] {
        self.contributions
            .get(name)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// The schema as it stood just before a given contribution applied
    ///
    /// `None` when no define sorts before that contribution.
    pub fn fold_until(&self, name: &str, file: &str, entry: &SchemaEntry) -> Option<EntitySchema> {
        fold(self.contributions.get(name)?, Some((file, entry.span.start)))
    }
}
