//! Entry-level rules: entities, timestamps, syntax and synthesis sources

use thalo_ast::{Entry, EntryKind, SyntaxErrorCode};
use thalo_core::{Document, Severity, Workspace};

use super::location;
use crate::{Rule, RuleCategory, RuleContext};

/// Instance entry naming an entity with no schema
pub struct UnknownEntity;

impl Rule for UnknownEntity {
    fn code(&self) -> &'static str {
        "unknown-entity"
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::Instance
    }

    fn default_severity(&self) -> Severity {
        Severity::Error
    }

    fn description(&self) -> &'static str {
        "Instance entries must use an entity defined with define-entity"
    }

    fn evaluate(&self, doc: &Document, workspace: &Workspace, ctx: &mut RuleContext<'_>) {
        let Some(model) = workspace.semantic_model(doc.filename()) else {
            return;
        };
        for unknown in model.unknown_entities().filter(|m| m.kind == EntryKind::Instance) {
            let Some(entity) = doc.entries().get(unknown.index).and_then(Entry::entity) else {
                continue;
            };
            let diagnostic = ctx
                .diagnostic(entity.span, format!("Unknown entity '{}'", entity.name))
                .with_help(format!("Define it with `define-entity {}`", entity.name));
            ctx.push(diagnostic);
        }
    }
}

/// Entries without an explicit id whose timestamp another entry shares
///
/// The timestamp is then an ambiguous implicit id.
pub struct DuplicateTimestamp;

impl Rule for DuplicateTimestamp {
    fn code(&self) -> &'static str {
        "duplicate-timestamp"
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::Instance
    }

    fn default_severity(&self) -> Severity {
        Severity::Error
    }

    fn description(&self) -> &'static str {
        "Entries sharing a timestamp need an explicit ^id to be told apart"
    }

    fn evaluate(&self, doc: &Document, workspace: &Workspace, ctx: &mut RuleContext<'_>) {
        for entry in doc.entries() {
            if entry.kind() == EntryKind::Actualize || entry.link().is_some() {
                continue;
            }
            let timestamp = entry.timestamp();
            let canonical = timestamp.canonical();
            let sharing = workspace.link_index().entries_at(&canonical);
            if sharing.len() < 2 {
                continue;
            }

            let mut diagnostic = ctx
                .diagnostic(
                    timestamp.span,
                    format!("Timestamp {} is shared by {} entries", canonical, sharing.len()),
                )
                .with_help("Add an explicit ^id to tell the entries apart");
            let others = sharing
                .iter()
                .filter(|d| !(d.entry.file == doc.filename() && d.entry.span == entry.span()));
            for other in others {
                diagnostic = diagnostic.with_note(format!(
                    "also used at {}",
                    location(&other.entry.file, &other.span)
                ));
            }
            ctx.push(diagnostic);
        }
    }
}

/// Timestamps written without `Z` or an offset
pub struct MissingTimezone;

impl Rule for MissingTimezone {
    fn code(&self) -> &'static str {
        "missing-timezone"
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::Instance
    }

    fn default_severity(&self) -> Severity {
        Severity::Error
    }

    fn description(&self) -> &'static str {
        "Entry timestamps must carry a timezone"
    }

    fn evaluate(&self, doc: &Document, _workspace: &Workspace, ctx: &mut RuleContext<'_>) {
        for entry in doc.entries() {
            let timestamp = entry.timestamp();
            if let Err(err) = &timestamp.timezone {
                let diagnostic = ctx
                    .diagnostic(err.span, format!("Timestamp {} has no timezone", timestamp))
                    .with_help(format!("Write {}Z for UTC", timestamp));
                ctx.push(diagnostic);
            }
        }
    }
}

/// Every syntax-error node other than a missing timezone
pub struct SyntaxErrorRule;

impl Rule for SyntaxErrorRule {
    fn code(&self) -> &'static str {
        "syntax-error"
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::Instance
    }

    fn default_severity(&self) -> Severity {
        Severity::Error
    }

    fn description(&self) -> &'static str {
        "Text that does not follow the Thalo grammar"
    }

    fn evaluate(&self, doc: &Document, _workspace: &Workspace, ctx: &mut RuleContext<'_>) {
        for err in doc.syntax_errors() {
            if err.code == SyntaxErrorCode::MissingTimezone {
                continue;
            }
            let diagnostic = ctx.diagnostic(err.span, err.message.clone()).with_note(err.code.as_str());
            ctx.push(diagnostic);
        }
    }
}

/// Synthesis without a `sources:` query list
pub struct SynthesisMissingSources;

impl Rule for SynthesisMissingSources {
    fn code(&self) -> &'static str {
        "synthesis-missing-sources"
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::Instance
    }

    fn default_severity(&self) -> Severity {
        Severity::Error
    }

    fn description(&self) -> &'static str {
        "define-synthesis entries must list their sources"
    }

    fn evaluate(&self, doc: &Document, _workspace: &Workspace, ctx: &mut RuleContext<'_>) {
        for synthesis in doc.synthesis_entries() {
            match synthesis.sources() {
                None => {
                    let diagnostic = ctx
                        .diagnostic(synthesis.header.span, "Synthesis has no sources")
                        .with_help("Add `sources: <entity> where <conditions>`");
                    ctx.push(diagnostic);
                }
                Some(value) if value.is_empty() => {
                    ctx.report(value.span, "Synthesis sources are empty");
                }
                // Unreadable queries are syntax errors
                Some(_) => {}
            }
        }
    }
}

/// Synthesis source query over an entity with no schema
pub struct SynthesisUnknownQueryEntity;

impl Rule for SynthesisUnknownQueryEntity {
    fn code(&self) -> &'static str {
        "synthesis-unknown-query-entity"
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::Instance
    }

    fn default_severity(&self) -> Severity {
        Severity::Warning
    }

    fn description(&self) -> &'static str {
        "Synthesis sources should query defined entities"
    }

    fn evaluate(&self, doc: &Document, workspace: &Workspace, ctx: &mut RuleContext<'_>) {
        let registry = workspace.schema_registry();
        for synthesis in doc.synthesis_entries() {
            for query in synthesis.source_queries() {
                if !registry.has(&query.entity.name) {
                    ctx.report(
                        query.entity.span,
                        format!("Source query uses unknown entity '{}'", query.entity.name),
                    );
                }
            }
        }
    }
}
