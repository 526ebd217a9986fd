//! Schema rules: fold-order invariants and well-formed definitions

use std::collections::HashSet;

use thalo_ast::{Removal, SchemaDirective, SchemaEntry};
use thalo_core::{Document, EntitySchema, Severity, Workspace};

use super::location;
use crate::types::matches_value;
use crate::{Rule, RuleCategory, RuleContext};

/// Schema entries of a document with a readable entity name
fn named_schema_entries(doc: &Document) -> impl Iterator<Item = (&str, &SchemaEntry)> {
    doc.schema_entries()
        .filter_map(|entry| entry.entity.as_ref().ok().map(|e| (e.name.as_str(), entry)))
}

fn alterations(doc: &Document) -> impl Iterator<Item = (&str, &SchemaEntry)> {
    named_schema_entries(doc).filter(|(_, e)| e.directive == SchemaDirective::AlterEntity)
}

/// Second and later `define-entity` of the same name
pub struct DuplicateEntityDefinition;

impl Rule for DuplicateEntityDefinition {
    fn code(&self) -> &'static str {
        "duplicate-entity-definition"
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::Schema
    }

    fn default_severity(&self) -> Severity {
        Severity::Error
    }

    fn description(&self) -> &'static str {
        "An entity may be defined only once; use alter-entity to change it"
    }

    fn evaluate(&self, doc: &Document, workspace: &Workspace, ctx: &mut RuleContext<'_>) {
        let registry = workspace.schema_registry();
        for (name, entry) in named_schema_entries(doc) {
            if entry.directive != SchemaDirective::DefineEntity {
                continue;
            }
            let Some(first) = registry.contributions(name).iter().find(|c| c.is_define()) else {
                continue;
            };
            if first.is(doc.filename(), entry) {
                continue;
            }
            let diagnostic = ctx
                .diagnostic(entry.header.span, format!("Entity '{}' is already defined", name))
                .with_note(format!(
                    "first defined at {}",
                    location(&first.file, &first.entry.header.span)
                ))
                .with_help(format!("Use `alter-entity {}` to change it", name));
            ctx.push(diagnostic);
        }
    }
}

/// `alter-entity` of a name no `define-entity` introduces
pub struct AlterUndefinedEntity;

impl Rule for AlterUndefinedEntity {
    fn code(&self) -> &'static str {
        "alter-undefined-entity"
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::Schema
    }

    fn default_severity(&self) -> Severity {
        Severity::Error
    }

    fn description(&self) -> &'static str {
        "alter-entity must target an entity defined somewhere in the workspace"
    }

    fn evaluate(&self, doc: &Document, workspace: &Workspace, ctx: &mut RuleContext<'_>) {
        let registry = workspace.schema_registry();
        for (name, entry) in alterations(doc) {
            if registry.contributions(name).iter().any(|c| c.is_define()) {
                continue;
            }
            let span = entry.entity.as_ref().map(|e| e.span).unwrap_or(entry.header.span);
            ctx.report(span, format!("Cannot alter undefined entity '{}'", name));
        }
    }
}

/// `alter-entity` ordered before the entity's first `define-entity`
pub struct AlterBeforeDefine;

impl Rule for AlterBeforeDefine {
    fn code(&self) -> &'static str {
        "alter-before-define"
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::Schema
    }

    fn default_severity(&self) -> Severity {
        Severity::Error
    }

    fn description(&self) -> &'static str {
        "alter-entity timestamps must come after the entity's define-entity"
    }

    fn evaluate(&self, doc: &Document, workspace: &Workspace, ctx: &mut RuleContext<'_>) {
        let registry = workspace.schema_registry();
        for (name, entry) in alterations(doc) {
            let group = registry.contributions(name);
            let Some(define) = group.iter().position(|c| c.is_define()) else {
                continue;
            };
            let Some(alter) = group.iter().position(|c| c.is(doc.filename(), entry)) else {
                continue;
            };
            if alter > define {
                continue;
            }
            let first = &group[define];
            let diagnostic = ctx
                .diagnostic(
                    entry.header.timestamp.span,
                    format!(
                        "alter-entity {} at {} comes before its definition at {}",
                        name,
                        entry.header.timestamp,
                        first.entry.header.timestamp
                    ),
                )
                .with_note(format!(
                    "defined at {}",
                    location(&first.file, &first.entry.header.span)
                ));
            ctx.push(diagnostic);
        }
    }
}

/// The same field name twice in one schema entry
pub struct DuplicateFieldInSchema;

impl Rule for DuplicateFieldInSchema {
    fn code(&self) -> &'static str {
        "duplicate-field-in-schema"
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::Schema
    }

    fn default_severity(&self) -> Severity {
        Severity::Error
    }

    fn description(&self) -> &'static str {
        "A schema entry may declare each field once"
    }

    fn evaluate(&self, doc: &Document, _workspace: &Workspace, ctx: &mut RuleContext<'_>) {
        for entry in doc.schema_entries() {
            let mut seen = HashSet::new();
            for field in &entry.fields {
                if !seen.insert(field.name.name.as_str()) {
                    ctx.report(field.name.span, format!("Field '{}' is declared twice", field.name.name));
                }
            }
        }
    }
}

/// The same section name twice in one schema entry
pub struct DuplicateSectionInSchema;

impl Rule for DuplicateSectionInSchema {
    fn code(&self) -> &'static str {
        "duplicate-section-in-schema"
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::Schema
    }

    fn default_severity(&self) -> Severity {
        Severity::Error
    }

    fn description(&self) -> &'static str {
        "A schema entry may declare each section once"
    }

    fn evaluate(&self, doc: &Document, _workspace: &Workspace, ctx: &mut RuleContext<'_>) {
        for entry in doc.schema_entries() {
            let mut seen = HashSet::new();
            for section in &entry.sections {
                if !seen.insert(section.name.name.as_str()) {
                    ctx.report(
                        section.name.span,
                        format!("Section '{}' is declared twice", section.name.name),
                    );
                }
            }
        }
    }
}

/// Removals the schema does not have at that point of the fold
fn check_removals<'a>(
    doc: &'a Document,
    workspace: &Workspace,
    removals: impl Fn(&'a SchemaEntry) -> &'a [Removal],
    present: impl Fn(&EntitySchema, &str) -> bool,
    what: &str,
    ctx: &mut RuleContext<'_>,
) {
    let registry = workspace.schema_registry();
    for (name, entry) in alterations(doc) {
        // No define anywhere; alter-undefined-entity reports this
        if !registry.has(name) {
            continue;
        }
        // Before the first define nothing can be removed
        let before = registry.fold_until(name, doc.filename(), entry);
        for removal in removals(entry) {
            if !before.as_ref().is_some_and(|schema| present(schema, &removal.name.name)) {
                ctx.report(
                    removal.name.span,
                    format!("Cannot remove undefined {} '{}' from '{}'", what, removal.name.name, name),
                );
            }
        }
    }
}

/// `# Remove Metadata` naming a field the entity does not have
pub struct RemoveUndefinedField;

impl Rule for RemoveUndefinedField {
    fn code(&self) -> &'static str {
        "remove-undefined-field"
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::Schema
    }

    fn default_severity(&self) -> Severity {
        Severity::Warning
    }

    fn description(&self) -> &'static str {
        "Removed fields should exist in the schema being altered"
    }

    fn evaluate(&self, doc: &Document, workspace: &Workspace, ctx: &mut RuleContext<'_>) {
        check_removals(
            doc,
            workspace,
            |entry| entry.removed_fields.as_slice(),
            |schema, name| schema.field(name).is_some(),
            "field",
            ctx,
        );
    }
}

/// `# Remove Sections` naming a section the entity does not have
pub struct RemoveUndefinedSection;

impl Rule for RemoveUndefinedSection {
    fn code(&self) -> &'static str {
        "remove-undefined-section"
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::Schema
    }

    fn default_severity(&self) -> Severity {
        Severity::Warning
    }

    fn description(&self) -> &'static str {
        "Removed sections should exist in the schema being altered"
    }

    fn evaluate(&self, doc: &Document, workspace: &Workspace, ctx: &mut RuleContext<'_>) {
        check_removals(
            doc,
            workspace,
            |entry| entry.removed_sections.as_slice(),
            |schema, name| schema.section(name).is_some(),
            "section",
            ctx,
        );
    }
}

/// Field default that does not satisfy the field's own type
pub struct InvalidDefaultValue;

impl Rule for InvalidDefaultValue {
    fn code(&self) -> &'static str {
        "invalid-default-value"
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::Schema
    }

    fn default_severity(&self) -> Severity {
        Severity::Error
    }

    fn description(&self) -> &'static str {
        "Field defaults must match the field type"
    }

    fn evaluate(&self, doc: &Document, _workspace: &Workspace, ctx: &mut RuleContext<'_>) {
        for entry in doc.schema_entries() {
            for field in &entry.fields {
                let (Ok(ty), Some(Ok(default))) = (&field.type_expr, &field.default) else {
                    continue;
                };
                if matches_value(ty, default) {
                    continue;
                }
                ctx.report(
                    default.span,
                    format!(
                        "Default '{}' of field '{}' does not match type {}",
                        default.raw, field.name.name, ty
                    ),
                );
            }
        }
    }
}

/// `define-entity` with no `# Sections` entries
pub struct DefineEntityRequiresSection;

impl Rule for DefineEntityRequiresSection {
    fn code(&self) -> &'static str {
        "define-entity-requires-section"
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::Schema
    }

    fn default_severity(&self) -> Severity {
        Severity::Warning
    }

    fn description(&self) -> &'static str {
        "define-entity should declare at least one content section"
    }

    fn evaluate(&self, doc: &Document, _workspace: &Workspace, ctx: &mut RuleContext<'_>) {
        for (name, entry) in named_schema_entries(doc) {
            if entry.directive == SchemaDirective::DefineEntity && entry.sections.is_empty() {
                let diagnostic = ctx
                    .diagnostic(entry.header.span, format!("Entity '{}' declares no sections", name))
                    .with_help("Add a `# Sections` block with at least one section name");
                ctx.push(diagnostic);
            }
        }
    }
}
