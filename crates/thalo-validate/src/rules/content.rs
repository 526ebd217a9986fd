//! Content section rules

use std::collections::HashSet;

use thalo_ast::{Ident, Section};
use thalo_core::{Document, Severity, Workspace};

use super::schema_of;
use crate::{Rule, RuleCategory, RuleContext};

fn headings(sections: &[Section]) -> impl Iterator<Item = &Ident> {
    sections.iter().filter_map(|s| s.heading.as_ref())
}

/// Required schema section absent from an instance entry
pub struct MissingRequiredSection;

impl Rule for MissingRequiredSection {
    fn code(&self) -> &'static str {
        "missing-required-section"
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::Content
    }

    fn default_severity(&self) -> Severity {
        Severity::Error
    }

    fn description(&self) -> &'static str {
        "Instance entries must include every required section of their entity"
    }

    fn evaluate(&self, doc: &Document, workspace: &Workspace, ctx: &mut RuleContext<'_>) {
        for entry in doc.instance_entries() {
            let Some(schema) = schema_of(workspace, entry) else {
                continue;
            };
            for section in schema.required_sections() {
                if headings(&entry.sections).any(|h| h.name == section.name) {
                    continue;
                }
                let diagnostic = ctx
                    .diagnostic(
                        entry.header.span,
                        format!("Missing required section '{}' for entity '{}'", section.name, schema.name),
                    )
                    .with_help(format!("Add a `# {}` section", section.name));
                ctx.push(diagnostic);
            }
        }
    }
}

/// Section heading the entity's schema does not declare
pub struct UnknownSection;

impl Rule for UnknownSection {
    fn code(&self) -> &'static str {
        "unknown-section"
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::Content
    }

    fn default_severity(&self) -> Severity {
        Severity::Warning
    }

    fn description(&self) -> &'static str {
        "Section headings should be declared by the entity schema"
    }

    fn evaluate(&self, doc: &Document, workspace: &Workspace, ctx: &mut RuleContext<'_>) {
        for entry in doc.instance_entries() {
            let Some(schema) = schema_of(workspace, entry) else {
                continue;
            };
            for heading in headings(&entry.sections) {
                if schema.section(&heading.name).is_none() {
                    ctx.report(
                        heading.span,
                        format!("Unknown section '{}' for entity '{}'", heading.name, schema.name),
                    );
                }
            }
        }
    }
}

/// The same heading twice in one entry
pub struct DuplicateSectionHeading;

impl Rule for DuplicateSectionHeading {
    fn code(&self) -> &'static str {
        "duplicate-section-heading"
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::Content
    }

    fn default_severity(&self) -> Severity {
        Severity::Warning
    }

    fn description(&self) -> &'static str {
        "A section heading should appear only once per entry"
    }

    fn evaluate(&self, doc: &Document, _workspace: &Workspace, ctx: &mut RuleContext<'_>) {
        for entry in doc.entries() {
            let mut seen = HashSet::new();
            for heading in headings(entry.sections()) {
                if !seen.insert(heading.name.as_str()) {
                    ctx.report(heading.span, format!("Duplicate section '{}'", heading.name));
                }
            }
        }
    }
}

/// Instance section with a heading and no text
pub struct EmptySection;

impl Rule for EmptySection {
    fn code(&self) -> &'static str {
        "empty-section"
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::Content
    }

    fn default_severity(&self) -> Severity {
        Severity::Info
    }

    fn description(&self) -> &'static str {
        "Sections with a heading but no content"
    }

    fn evaluate(&self, doc: &Document, _workspace: &Workspace, ctx: &mut RuleContext<'_>) {
        for entry in doc.instance_entries() {
            for section in entry.sections.iter().filter(|s| s.is_empty()) {
                if let Some(heading) = &section.heading {
                    ctx.report(heading.span, format!("Section '{}' is empty", heading.name));
                }
            }
        }
    }
}

/// Synthesis without prompt text
pub struct SynthesisMissingPrompt;

impl Rule for SynthesisMissingPrompt {
    fn code(&self) -> &'static str {
        "synthesis-missing-prompt"
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::Content
    }

    fn default_severity(&self) -> Severity {
        Severity::Error
    }

    fn description(&self) -> &'static str {
        "define-synthesis entries must have a non-empty # Prompt section"
    }

    fn evaluate(&self, doc: &Document, _workspace: &Workspace, ctx: &mut RuleContext<'_>) {
        for synthesis in doc.synthesis_entries() {
            if synthesis.prompt().is_some() {
                continue;
            }
            let (span, message) = match synthesis.prompt_section() {
                Some(section) => (section.span, "Synthesis prompt is empty"),
                None => (synthesis.header.span, "Synthesis has no # Prompt section"),
            };
            ctx.report(span, message);
        }
    }
}
