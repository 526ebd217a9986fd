//! Synthesis checkpoints
//!
//! A synthesis is brought up to date by an `actualize-synthesis` entry whose
//! `updated:` value marks the newest source it has seen. Everything its
//! source queries match after that checkpoint is pending.

use thalo_ast::{DateValue, Entry, Query, SynthesisEntry, Value, ValueContent};

use crate::query::QueryMatch;
use crate::workspace::Workspace;

/// A point after which entries count as new
#[derive(Debug, Clone, PartialEq)]
pub enum Checkpoint {
    Timestamp(DateValue),
}

impl Checkpoint {
    /// Read a checkpoint from a datetime metadata value
    pub fn from_value(value: &Value) -> Option<Self> {
        match &value.content {
            Ok(ValueContent::Datetime(date)) => Some(Checkpoint::Timestamp(date.clone())),
            _ => None,
        }
    }

    /// Minutes since the Unix epoch, in UTC
    pub fn instant(&self) -> i64 {
        match self {
            Checkpoint::Timestamp(date) => date.instant(),
        }
    }
}

/// Where a synthesis stands against its sources
#[derive(Debug, Clone)]
pub struct SynthesisStatus<'a> {
    pub file: &'a str,
    pub synthesis: &'a SynthesisEntry,
    /// Latest `updated:` among the synthesis's actualize entries
    pub checkpoint: Option<Checkpoint>,
    /// Source matches newer than the checkpoint, oldest first
    pub pending: Vec<QueryMatch<'a>>,
}

impl SynthesisStatus<'_> {
    pub fn is_up_to_date(&self) -> bool {
        self.pending.is_empty()
    }
}

impl Workspace {
    /// Matches of `queries` strictly after `checkpoint`
    pub fn entries_since(&self, queries: &[Query], checkpoint: &Checkpoint) -> Vec<QueryMatch<'_>> {
        let since = checkpoint.instant();
        self.query(queries)
            .into_iter()
            .filter(|m| m.entry.header.timestamp.instant() > since)
            .collect()
    }

    /// The state of the synthesis with explicit link id `id`
    pub fn synthesis_status(&self, id: &str) -> Option<SynthesisStatus<'_>> {
        let (doc, entry) = self.find_entry(id)?;
        let Entry::Synthesis(synthesis) = entry else {
            return None;
        };

        let checkpoint = self
            .all_models()
            .flat_map(|doc| doc.actualize_entries())
            .filter(|a| a.target.as_ref().is_ok_and(|t| t.id == id))
            .filter_map(|a| a.updated().and_then(Checkpoint::from_value))
            .max_by_key(Checkpoint::instant);

        let queries = synthesis.source_queries();
        let pending = match &checkpoint {
            Some(checkpoint) => self.entries_since(queries, checkpoint),
            None => self.query(queries),
        };

        Some(SynthesisStatus {
            file: doc.filename(),
            synthesis,
            checkpoint,
            pending,
        })
    }
}
