//! Metadata rules: required, unknown, typed and well-formed values

use std::collections::HashSet;

use thalo_ast::{Entry, Metadata, Value, ValueContent};
use thalo_core::{Document, Severity, Workspace};

use super::schema_of;
use crate::types::matches_type;
use crate::{Rule, RuleCategory, RuleContext};

/// Required schema field absent from an instance entry
pub struct MissingRequiredField;

impl Rule for MissingRequiredField {
    fn code(&self) -> &'static str {
        "missing-required-field"
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::Metadata
    }

    fn default_severity(&self) -> Severity {
        Severity::Error
    }

    fn description(&self) -> &'static str {
        "Instance entries must set every required field of their entity"
    }

    fn evaluate(&self, doc: &Document, workspace: &Workspace, ctx: &mut RuleContext<'_>) {
        for entry in doc.instance_entries() {
            let Some(schema) = schema_of(workspace, entry) else {
                continue;
            };
            // A default fills the field in
            let missing = schema
                .required_fields()
                .filter(|field| field.default.is_none())
                .filter(|field| !entry.metadata.iter().any(|m| m.key.name == field.name));
            for field in missing {
                let mut diagnostic = ctx
                    .diagnostic(
                        entry.header.span,
                        format!("Missing required field '{}' for entity '{}'", field.name, schema.name),
                    )
                    .with_help(format!("Add `{}:` to the metadata", field.name));
                if let Some(ty) = &field.type_expr {
                    diagnostic = diagnostic.with_note(format!("expected type: {}", ty));
                }
                ctx.push(diagnostic);
            }
        }
    }
}

/// Metadata key the entity's schema does not declare
pub struct UnknownField;

impl Rule for UnknownField {
    fn code(&self) -> &'static str {
        "unknown-field"
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::Metadata
    }

    fn default_severity(&self) -> Severity {
        Severity::Warning
    }

    fn description(&self) -> &'static str {
        "Metadata keys should be declared by the entity schema"
    }

    fn evaluate(&self, doc: &Document, workspace: &Workspace, ctx: &mut RuleContext<'_>) {
        for entry in doc.instance_entries() {
            let Some(schema) = schema_of(workspace, entry) else {
                continue;
            };
            for metadata in &entry.metadata {
                if schema.field(&metadata.key.name).is_none() {
                    ctx.report(
                        metadata.key.span,
                        format!("Unknown field '{}' for entity '{}'", metadata.key.name, schema.name),
                    );
                }
            }
        }
    }
}

/// Value that does not satisfy its field's type
pub struct InvalidFieldType;

impl Rule for InvalidFieldType {
    fn code(&self) -> &'static str {
        "invalid-field-type"
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::Metadata
    }

    fn default_severity(&self) -> Severity {
        Severity::Error
    }

    fn description(&self) -> &'static str {
        "Metadata values must match the declared field type"
    }

    fn evaluate(&self, doc: &Document, workspace: &Workspace, ctx: &mut RuleContext<'_>) {
        for entry in doc.instance_entries() {
            let Some(schema) = schema_of(workspace, entry) else {
                continue;
            };
            for metadata in &entry.metadata {
                let Some(ty) = schema.field(&metadata.key.name).and_then(|f| f.type_expr.as_ref()) else {
                    continue;
                };
                // Empty values belong to empty-required-value, unreadable ones to syntax-error
                let Ok(content) = &metadata.value.content else {
                    continue;
                };
                if matches!(content, ValueContent::Empty) || matches_type(ty, content) {
                    continue;
                }
                ctx.report(
                    metadata.value.span,
                    format!(
                        "Field '{}' expects {}, found {}",
                        metadata.key.name,
                        ty,
                        content.kind_name()
                    ),
                );
            }
        }
    }
}

/// Required field written with no value
pub struct EmptyRequiredValue;

impl Rule for EmptyRequiredValue {
    fn code(&self) -> &'static str {
        "empty-required-value"
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::Metadata
    }

    fn default_severity(&self) -> Severity {
        Severity::Error
    }

    fn description(&self) -> &'static str {
        "Required fields must not be left empty"
    }

    fn evaluate(&self, doc: &Document, workspace: &Workspace, ctx: &mut RuleContext<'_>) {
        for entry in doc.instance_entries() {
            let Some(schema) = schema_of(workspace, entry) else {
                continue;
            };
            for metadata in &entry.metadata {
                let required = schema.field(&metadata.key.name).is_some_and(|f| !f.optional);
                if required && metadata.value.is_empty() {
                    ctx.report(
                        metadata.span,
                        format!("Required field '{}' has no value", metadata.key.name),
                    );
                }
            }
        }
    }
}

/// The same key twice in one entry
pub struct DuplicateMetadataKey;

impl Rule for DuplicateMetadataKey {
    fn code(&self) -> &'static str {
        "duplicate-metadata-key"
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::Metadata
    }

    fn default_severity(&self) -> Severity {
        Severity::Error
    }

    fn description(&self) -> &'static str {
        "A metadata key may appear only once per entry"
    }

    fn evaluate(&self, doc: &Document, _workspace: &Workspace, ctx: &mut RuleContext<'_>) {
        for entry in doc.entries() {
            let mut seen = HashSet::new();
            for metadata in entry.metadata() {
                if !seen.insert(metadata.key.name.as_str()) {
                    ctx.report(
                        metadata.key.span,
                        format!("Duplicate metadata key '{}'", metadata.key.name),
                    );
                }
            }
        }
    }
}

/// Date range that ends before it starts
pub struct InvalidDateRangeValue;

impl Rule for InvalidDateRangeValue {
    fn code(&self) -> &'static str {
        "invalid-date-range-value"
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::Metadata
    }

    fn default_severity(&self) -> Severity {
        Severity::Error
    }

    fn description(&self) -> &'static str {
        "Date ranges must not end before they start"
    }

    fn evaluate(&self, doc: &Document, _workspace: &Workspace, ctx: &mut RuleContext<'_>) {
        for entry in doc.entries() {
            for metadata in entry.metadata() {
                check_ranges(&metadata.value, metadata, ctx);
            }
        }
    }
}

fn check_ranges(value: &Value, metadata: &Metadata, ctx: &mut RuleContext<'_>) {
    match &value.content {
        Ok(ValueContent::DateRange(range)) if !range.is_ordered() => {
            ctx.report(
                value.span,
                format!("Date range '{}' in '{}' ends before it starts", value.raw, metadata.key.name),
            );
        }
        Ok(ValueContent::Array(items)) => {
            for item in items {
                check_ranges(item, metadata, ctx);
            }
        }
        _ => {}
    }
}

/// Actualize entry without a datetime `updated:`
pub struct ActualizeMissingUpdated;

impl Rule for ActualizeMissingUpdated {
    fn code(&self) -> &'static str {
        "actualize-missing-updated"
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::Metadata
    }

    fn default_severity(&self) -> Severity {
        Severity::Error
    }

    fn description(&self) -> &'static str {
        "actualize-synthesis entries must record when they were updated"
    }

    fn evaluate(&self, doc: &Document, _workspace: &Workspace, ctx: &mut RuleContext<'_>) {
        for entry in doc.entries() {
            let Entry::Actualize(actualize) = entry else {
                continue;
            };
            match actualize.updated().map(|v| (v, &v.content)) {
                None => {
                    let diagnostic = ctx
                        .diagnostic(actualize.header_span, "Actualize entry has no `updated:` timestamp")
                        .with_help("Add `updated: <timestamp of the newest source seen>`");
                    ctx.push(diagnostic);
                }
                Some((_, Ok(ValueContent::Datetime(_)))) | Some((_, Err(_))) => {}
                Some((value, Ok(content))) => {
                    ctx.report(
                        value.span,
                        format!("`updated:` must be a timestamp, found {}", content.kind_name()),
                    );
                }
            }
        }
    }
}
