//! Entries
//!
//! An entry is one top-level timestamped unit. The four kinds form a closed
//! union; shared header data is reachable through accessors on [`Entry`].

use serde::{Deserialize, Serialize};

use crate::error::{Parsed, SyntaxError};
use crate::span::{Relocate, Shift, Span};
use crate::timestamp::Timestamp;
use crate::types::TypeExpression;
use crate::value::{Ident, LinkRef, Tag, Value, ValueContent};

/// Quoted header title (or schema description)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Title {
    pub text: String,
    pub span: Span,
}

/// Header data shared by instance, schema and synthesis entries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Header {
    pub timestamp: Timestamp,
    pub title: Parsed<Title>,
    /// Explicit `^id`
    pub link: Option<LinkRef>,
    pub tags: Vec<Tag>,
    /// The whole header line
    pub span: Span,
}

/// `key: value`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    pub key: Ident,
    pub value: Value,
    pub span: Span,
}

/// One body line of a content section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentLine {
    pub text: String,
    pub span: Span,
}

/// A `# Heading` and the lines under it
///
/// Content written before the first heading is kept in a section whose
/// `heading` is `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub heading: Option<Ident>,
    pub lines: Vec<ContentLine>,
    pub span: Span,
}

impl Section {
    pub fn name(&self) -> Option<&str> {
        self.heading.as_ref().map(|h| h.name.as_str())
    }

    /// Check if the section has no non-blank lines
    pub fn is_empty(&self) -> bool {
        self.lines.iter().all(|line| line.text.trim().is_empty())
    }

    /// Body text joined with newlines
    pub fn text(&self) -> String {
        self.lines
            .iter()
            .map(|line| line.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
            .trim()
            .to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InstanceDirective {
    Create,
    Update,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SchemaDirective {
    DefineEntity,
    AlterEntity,
}

impl SchemaDirective {
    pub fn keyword(&self) -> &'static str {
        match self {
            SchemaDirective::DefineEntity => "define-entity",
            SchemaDirective::AlterEntity => "alter-entity",
        }
    }
}

/// `create`/`update` of an entity instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceEntry {
    pub directive: InstanceDirective,
    pub entity: Parsed<Ident>,
    pub header: Header,
    pub metadata: Vec<Metadata>,
    pub sections: Vec<Section>,
    pub errors: Vec<SyntaxError>,
    pub span: Span,
}

/// `name?: type = default ; "description"`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDefinition {
    pub name: Ident,
    pub optional: bool,
    pub type_expr: Parsed<TypeExpression>,
    pub default: Option<Parsed<Value>>,
    pub description: Option<String>,
    pub span: Span,
}

/// `Name? ; "description"`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionDefinition {
    pub name: Ident,
    pub optional: bool,
    pub description: Option<String>,
    pub span: Span,
}

/// A line of a `# Remove Metadata` or `# Remove Sections` block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Removal {
    pub name: Ident,
    pub reason: Option<String>,
    pub span: Span,
}

/// `define-entity`/`alter-entity`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaEntry {
    pub directive: SchemaDirective,
    pub entity: Parsed<Ident>,
    pub header: Header,
    pub fields: Vec<FieldDefinition>,
    pub sections: Vec<SectionDefinition>,
    pub removed_fields: Vec<Removal>,
    pub removed_sections: Vec<Removal>,
    pub errors: Vec<SyntaxError>,
    pub span: Span,
}

/// `define-synthesis "Title" ^id`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynthesisEntry {
    pub header: Header,
    pub metadata: Vec<Metadata>,
    pub sections: Vec<Section>,
    pub errors: Vec<SyntaxError>,
    pub span: Span,
}

impl SynthesisEntry {
    /// The `sources:` metadata value
    pub fn sources(&self) -> Option<&Value> {
        self.metadata
            .iter()
            .find(|m| m.key.name == "sources")
            .map(|m| &m.value)
    }

    /// Parsed source queries (empty when missing or unreadable)
    pub fn source_queries(&self) -> &[crate::query::Query] {
        match self.sources().map(|v| &v.content) {
            Some(Ok(ValueContent::Query(queries))) => queries,
            _ => &[],
        }
    }

    /// The `# Prompt` section
    pub fn prompt_section(&self) -> Option<&Section> {
        self.sections
            .iter()
            .find(|s| s.name().is_some_and(|n| n.eq_ignore_ascii_case("prompt")))
    }

    /// Prompt text, if any non-blank text was written
    pub fn prompt(&self) -> Option<String> {
        self.prompt_section()
            .map(Section::text)
            .filter(|text| !text.is_empty())
    }
}

/// `actualize-synthesis ^target`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActualizeEntry {
    pub timestamp: Timestamp,
    pub target: Parsed<LinkRef>,
    pub tags: Vec<Tag>,
    pub metadata: Vec<Metadata>,
    pub errors: Vec<SyntaxError>,
    pub header_span: Span,
    pub span: Span,
}

impl ActualizeEntry {
    /// The `updated:` metadata value
    pub fn updated(&self) -> Option<&Value> {
        self.metadata
            .iter()
            .find(|m| m.key.name == "updated")
            .map(|m| &m.value)
    }
}

/// Discriminant of [`Entry`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Instance,
    Schema,
    Synthesis,
    Actualize,
}

/// A top-level entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Entry {
    Instance(InstanceEntry),
    Schema(SchemaEntry),
    Synthesis(SynthesisEntry),
    Actualize(ActualizeEntry),
}

impl Entry {
    pub fn kind(&self) -> EntryKind {
        match self {
            Entry::Instance(_) => EntryKind::Instance,
            Entry::Schema(_) => EntryKind::Schema,
            Entry::Synthesis(_) => EntryKind::Synthesis,
            Entry::Actualize(_) => EntryKind::Actualize,
        }
    }

    /// Shared header, when the entry kind has one
    pub fn header(&self) -> Option<&Header> {
        match self {
            Entry::Instance(e) => Some(&e.header),
            Entry::Schema(e) => Some(&e.header),
            Entry::Synthesis(e) => Some(&e.header),
            Entry::Actualize(_) => None,
        }
    }

    pub fn timestamp(&self) -> &Timestamp {
        match self {
            Entry::Instance(e) => &e.header.timestamp,
            Entry::Schema(e) => &e.header.timestamp,
            Entry::Synthesis(e) => &e.header.timestamp,
            Entry::Actualize(e) => &e.timestamp,
        }
    }

    pub fn title(&self) -> Option<&str> {
        self.header()
            .and_then(|h| h.title.as_ref().ok())
            .map(|t| t.text.as_str())
    }

    /// Explicit link id; actualize entries are not addressable
    pub fn link(&self) -> Option<&LinkRef> {
        self.header().and_then(|h| h.link.as_ref())
    }

    pub fn tags(&self) -> &[Tag] {
        match self {
            Entry::Instance(e) => &e.header.tags,
            Entry::Schema(e) => &e.header.tags,
            Entry::Synthesis(e) => &e.header.tags,
            Entry::Actualize(e) => &e.tags,
        }
    }

    pub fn has_tag(&self, name: &str) -> bool {
        self.tags().iter().any(|t| t.name == name)
    }

    pub fn span(&self) -> Span {
        match self {
            Entry::Instance(e) => e.span,
            Entry::Schema(e) => e.span,
            Entry::Synthesis(e) => e.span,
            Entry::Actualize(e) => e.span,
        }
    }

    /// Span of the header line
    pub fn header_span(&self) -> Span {
        match self {
            Entry::Actualize(e) => e.header_span,
            _ => self.header().map(|h| h.span).unwrap_or_default(),
        }
    }

    /// Entity name for instance and schema entries
    pub fn entity(&self) -> Option<&Ident> {
        match self {
            Entry::Instance(e) => e.entity.as_ref().ok(),
            Entry::Schema(e) => e.entity.as_ref().ok(),
            Entry::Synthesis(_) | Entry::Actualize(_) => None,
        }
    }

    pub fn metadata(&self) -> &[Metadata] {
        match self {
            Entry::Instance(e) => &e.metadata,
            Entry::Synthesis(e) => &e.metadata,
            Entry::Actualize(e) => &e.metadata,
            Entry::Schema(_) => &[],
        }
    }

    pub fn sections(&self) -> &[Section] {
        match self {
            Entry::Instance(e) => &e.sections,
            Entry::Synthesis(e) => &e.sections,
            Entry::Schema(_) | Entry::Actualize(_) => &[],
        }
    }

    /// Every syntax-error node inside this entry, in source order
    pub fn syntax_errors(&self) -> Vec<&SyntaxError> {
        let mut errors = Vec::new();
        if let Err(err) = &self.timestamp().timezone {
            errors.push(err);
        }
        if let Some(Err(err)) = self.header().map(|h| &h.title) {
            errors.push(err);
        }
        match self {
            Entry::Instance(e) => {
                if let Err(err) = &e.entity {
                    errors.push(err);
                }
                errors.extend(&e.errors);
                collect_value_errors(&e.metadata, &mut errors);
            }
            Entry::Schema(e) => {
                if let Err(err) = &e.entity {
                    errors.push(err);
                }
                errors.extend(&e.errors);
                for field in &e.fields {
                    if let Err(err) = &field.type_expr {
                        errors.push(err);
                    }
                    if let Some(Err(err)) = &field.default {
                        errors.push(err);
                    }
                }
            }
            Entry::Synthesis(e) => {
                errors.extend(&e.errors);
                collect_value_errors(&e.metadata, &mut errors);
            }
            Entry::Actualize(e) => {
                if let Err(err) = &e.target {
                    errors.push(err);
                }
                errors.extend(&e.errors);
                collect_value_errors(&e.metadata, &mut errors);
            }
        }
        errors.sort_by_key(|err| err.span.start);
        errors
    }
}

fn collect_value_errors<'a>(metadata: &'a [Metadata], out: &mut Vec<&'a SyntaxError>) {
    for entry in metadata {
        if let Err(err) = &entry.value.content {
            out.push(err);
        }
    }
}

impl Relocate for Title {
    fn relocate(&mut self, shift: &Shift) {
        self.span.relocate(shift);
    }
}

impl Relocate for Header {
    fn relocate(&mut self, shift: &Shift) {
        self.timestamp.relocate(shift);
        self.title.relocate(shift);
        self.link.relocate(shift);
        self.tags.relocate(shift);
        self.span.relocate(shift);
    }
}

impl Relocate for Metadata {
    fn relocate(&mut self, shift: &Shift) {
        self.key.relocate(shift);
        self.value.relocate(shift);
        self.span.relocate(shift);
    }
}

impl Relocate for ContentLine {
    fn relocate(&mut self, shift: &Shift) {
        self.span.relocate(shift);
    }
}

impl Relocate for Section {
    fn relocate(&mut self, shift: &Shift) {
        self.heading.relocate(shift);
        self.lines.relocate(shift);
        self.span.relocate(shift);
    }
}

impl Relocate for FieldDefinition {
    fn relocate(&mut self, shift: &Shift) {
        self.name.relocate(shift);
        if let Err(err) = &mut self.type_expr {
            err.relocate(shift);
        }
        self.default.relocate(shift);
        self.span.relocate(shift);
    }
}

impl Relocate for SectionDefinition {
    fn relocate(&mut self, shift: &Shift) {
        self.name.relocate(shift);
        self.span.relocate(shift);
    }
}

impl Relocate for Removal {
    fn relocate(&mut self, shift: &Shift) {
        self.name.relocate(shift);
        self.span.relocate(shift);
    }
}

impl Relocate for Entry {
    fn relocate(&mut self, shift: &Shift) {
        match self {
            Entry::Instance(e) => {
                e.entity.relocate(shift);
                e.header.relocate(shift);
                e.metadata.relocate(shift);
                e.sections.relocate(shift);
                e.errors.relocate(shift);
                e.span.relocate(shift);
            }
            Entry::Schema(e) => {
                e.entity.relocate(shift);
                e.header.relocate(shift);
                e.fields.relocate(shift);
                e.sections.relocate(shift);
                e.removed_fields.relocate(shift);
                e.removed_sections.relocate(shift);
                e.errors.relocate(shift);
                e.span.relocate(shift);
            }
            Entry::Synthesis(e) => {
                e.header.relocate(shift);
                e.metadata.relocate(shift);
                e.sections.relocate(shift);
                e.errors.relocate(shift);
                e.span.relocate(shift);
            }
            Entry::Actualize(e) => {
                e.timestamp.relocate(shift);
                e.target.relocate(shift);
                e.tags.relocate(shift);
                e.metadata.relocate(shift);
                e.errors.relocate(shift);
                e.header_span.relocate(shift);
                e.span.relocate(shift);
            }
        }
    }
}
