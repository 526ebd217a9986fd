//! Link Index consistency rules

use thalo_ast::{Entry, EntryKind};
use thalo_core::{Document, Severity, Workspace};

use super::location;
use crate::{Rule, RuleCategory, RuleContext};

/// Metadata link with no definition anywhere in the workspace
///
/// Reported once per occurrence. Actualize targets have their own rule.
pub struct UnresolvedLink;

impl Rule for UnresolvedLink {
    fn code(&self) -> &'static str {
        "unresolved-link"
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::Link
    }

    fn default_severity(&self) -> Severity {
        Severity::Error
    }

    fn description(&self) -> &'static str {
        "Links must point at an explicit ^id or an entry timestamp"
    }

    fn evaluate(&self, doc: &Document, workspace: &Workspace, ctx: &mut RuleContext<'_>) {
        let Some(model) = workspace.semantic_model(doc.filename()) else {
            return;
        };
        for link in model.unresolved_links().filter(|link| link.key.is_some()) {
            ctx.report(link.span, format!("Unresolved link '^{}'", link.id));
        }
    }
}

/// Explicit id declared by more than one entry
pub struct DuplicateLinkId;

impl Rule for DuplicateLinkId {
    fn code(&self) -> &'static str {
        "duplicate-link-id"
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::Link
    }

    fn default_severity(&self) -> Severity {
        Severity::Error
    }

    fn description(&self) -> &'static str {
        "Each explicit ^id may be declared by only one entry"
    }

    fn evaluate(&self, doc: &Document, workspace: &Workspace, ctx: &mut RuleContext<'_>) {
        for (id, definitions) in workspace.link_index().duplicate_ids() {
            for definition in definitions.iter().filter(|d| d.entry.file == doc.filename()) {
                let mut diagnostic = ctx.diagnostic(
                    definition.span,
                    format!("Link id '^{}' is declared {} times", id, definitions.len()),
                );
                for other in definitions.iter().filter(|d| *d != definition) {
                    diagnostic =
                        diagnostic.with_note(format!("also declared at {}", location(&other.entry.file, &other.span)));
                }
                ctx.push(diagnostic);
            }
        }
    }
}

/// Synthesis without an explicit id
pub struct SynthesisMissingLinkId;

impl Rule for SynthesisMissingLinkId {
    fn code(&self) -> &'static str {
        "synthesis-missing-link-id"
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::Link
    }

    fn default_severity(&self) -> Severity {
        Severity::Error
    }

    fn description(&self) -> &'static str {
        "define-synthesis entries need an explicit ^id for actualize-synthesis to target"
    }

    fn evaluate(&self, doc: &Document, _workspace: &Workspace, ctx: &mut RuleContext<'_>) {
        for synthesis in doc.synthesis_entries() {
            if synthesis.header.link.is_none() {
                let diagnostic = ctx
                    .diagnostic(synthesis.header.span, "Synthesis has no explicit ^id")
                    .with_help("Add a ^id after the title");
                ctx.push(diagnostic);
            }
        }
    }
}

/// Actualize target that is not a known synthesis
pub struct ActualizeUnresolvedTarget;

impl Rule for ActualizeUnresolvedTarget {
    fn code(&self) -> &'static str {
        "actualize-unresolved-target"
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::Link
    }

    fn default_severity(&self) -> Severity {
        Severity::Error
    }

    fn description(&self) -> &'static str {
        "actualize-synthesis must target a define-synthesis entry"
    }

    fn evaluate(&self, doc: &Document, workspace: &Workspace, ctx: &mut RuleContext<'_>) {
        for entry in doc.entries() {
            let Entry::Actualize(actualize) = entry else {
                continue;
            };
            // A missing target is a syntax error
            let Ok(target) = &actualize.target else {
                continue;
            };
            match workspace.get_link_definition(&target.id) {
                None => ctx.report(target.span, format!("Unresolved synthesis '^{}'", target.id)),
                Some(definition) if definition.entry.kind != EntryKind::Synthesis => ctx.report(
                    target.span,
                    format!("'^{}' is not a synthesis", target.id),
                ),
                Some(_) => {}
            }
        }
    }
}
