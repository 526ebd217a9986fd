//! Built-in rules
//!
//! Rules are grouped by what they inspect. Each is a unit struct
//! implementing [`Rule`](crate::Rule); [`builtin`] registers all of them.

pub mod content;
pub mod instance;
pub mod link;
pub mod metadata;
pub mod schema;


use thalo_ast::{InstanceEntry, Span};
use thalo_core::{EntitySchema, Workspace};

use crate::Rule;

/// Every built-in rule, in registration order
pub fn builtin() -> Vec<Box<dyn Rule>> {
    vec![
        // Instance
        Box::new(instance::UnknownEntity),
        Box::new(instance::DuplicateTimestamp),
        Box::new(instance::MissingTimezone),
        Box::new(instance::SyntaxErrorRule),
        Box::new(instance::SynthesisMissingSources),
        Box::new(instance::SynthesisUnknownQueryEntity),
        // Metadata
        Box::new(metadata::MissingRequiredField),
        Box::new(metadata::UnknownField),
        Box::new(metadata::InvalidFieldType),
        Box::new(metadata::EmptyRequiredValue),
        Box::new(metadata::DuplicateMetadataKey),
        Box::new(metadata::InvalidDateRangeValue),
        Box::new(metadata::ActualizeMissingUpdated),
        // Content
        Box::new(content::MissingRequiredSection),
        Box::new(content::UnknownSection),
        Box::new(content::DuplicateSectionHeading),
        Box::new(content::EmptySection),
        Box::new(content::SynthesisMissingPrompt),
        // Link
        Box::new(link::UnresolvedLink),
        Box::new(link::DuplicateLinkId),
        Box::new(link::SynthesisMissingLinkId),
        Box::new(link::ActualizeUnresolvedTarget),
        // Schema
        Box::new(schema::DuplicateEntityDefinition),
        Box::new(schema::AlterUndefinedEntity),
        Box::new(schema::AlterBeforeDefine),
        Box::new(schema::DuplicateFieldInSchema),
        Box::new(schema::DuplicateSectionInSchema),
        Box::new(schema::RemoveUndefinedField),
        Box::new(schema::RemoveUndefinedSection),
        Box::new(schema::InvalidDefaultValue),
        Box::new(schema::DefineEntityRequiresSection),
    ]
}

/// The resolved schema of an instance entry's entity
fn schema_of<'w>(workspace: &'w Workspace, entry: &InstanceEntry) -> Option<&'w EntitySchema> {
    let entity = entry.entity.as_ref().ok()?;
    workspace.schema_registry().get(&entity.name)
}

/// `file:line` of a span, for notes pointing at other locations
fn location(file: &str, span: &Span) -> String {
    format!("{}:{}", file, span.start_point.row + 1)
}
