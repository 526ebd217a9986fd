//! Parsed blocks with chunk reuse
//!
//! A [`SyntaxTree`] is the parse of one block of Thalo text, kept as a list
//! of chunks. Chunks are context-free: each one's items depend only on its
//! own lines, so after an edit every chunk whose text and start offset are
//! unchanged can be reused instead of rebuilt.

use thalo_ast::{Entry, Relocate, Shift, SyntaxError};
use tracing::debug;

use super::builder::build_chunk;
use super::lines::{chunk_lines, split_lines};
use crate::edit::InputEdit;
use crate::error::Result;

/// One top-level item of a block
#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    Entry(Entry),
    /// A region that could not become an entry at all
    Error(SyntaxError),
}

impl Relocate for Item {
    fn relocate(&mut self, shift: &Shift) {
        match self {
            Item::Entry(entry) => entry.relocate(shift),
            Item::Error(err) => err.relocate(shift),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Chunk {
    start: usize,
    start_row: usize,
    text: String,
    item: Item,
}

impl Chunk {
    fn end(&self) -> usize {
        self.start + self.text.len()
    }
}

/// Parse result for one block, in block coordinates
#[derive(Debug, Clone, Default)]
pub struct SyntaxTree {
    chunks: Vec<Chunk>,
    /// Leading spaces stripped from each line before parsing
    margin: usize,
    reused: usize,
}

impl SyntaxTree {
    /// Parse `text`, reusing unchanged chunks of `previous`
    ///
    /// `previous` must already have had the edit applied with
    /// [`SyntaxTree::edit`]; chunks are reused only when their start offset,
    /// row and text all still match.
    pub fn parse(text: &str, previous: Option<&SyntaxTree>) -> Result<Self> {
        Self::parse_indented(text, 0, previous)
    }

    /// Parse `text` whose lines all carry up to `margin` spaces of outer
    /// indentation, as inside an indented markdown fence
    ///
    /// Positions stay in `text` coordinates. A previous tree parsed with a
    /// different margin contributes nothing.
    pub fn parse_indented(text: &str, margin: usize, previous: Option<&SyntaxTree>) -> Result<Self> {
        let lines = split_lines(text, margin);
        let previous = previous.filter(|p| p.margin == margin);
        let mut chunks = Vec::new();
        let mut reused = 0;

        for range in chunk_lines(&lines) {
            let (start, end) = range.byte_range(&lines);
            let chunk_text = &text[start..end];
            let start_row = lines[range.first].row;

            if let Some(old) = previous.and_then(|p| p.find(start, start_row, chunk_text)) {
                chunks.push(old.clone());
                reused += 1;
                continue;
            }

            chunks.push(Chunk {
                start,
                start_row,
                text: chunk_text.to_string(),
                item: build_chunk(&lines, &range)?,
            });
        }

        if previous.is_some() {
            debug!(chunks = chunks.len(), reused, "incremental re-parse");
        }
        Ok(Self {
            chunks,
            margin,
            reused,
        })
    }

    fn find(&self, start: usize, start_row: usize, text: &str) -> Option<&Chunk> {
        let index = self.chunks.binary_search_by_key(&start, |c| c.start).ok()?;
        let chunk = &self.chunks[index];
        (chunk.start_row == start_row && chunk.text == text).then_some(chunk)
    }

    /// Bring the tree in line with an edit of its text
    ///
    /// Chunks touching the edited range are dropped; chunks after it are
    /// shifted to their new position. Chunks before it are untouched.
    pub fn edit(&mut self, edit: &InputEdit) {
        let shift = Shift::rows(
            edit.new_end_byte as isize - edit.old_end_byte as isize,
            edit.new_end_position.row as isize - edit.old_end_position.row as isize,
        );
        self.chunks
            .retain(|c| c.end() < edit.start_byte || c.start > edit.old_end_byte);
        for chunk in &mut self.chunks {
            if chunk.start > edit.old_end_byte && !shift.is_identity() {
                chunk.start = shift.offset(chunk.start);
                chunk.start_row = chunk.start_row.saturating_add_signed(shift.rows);
                chunk.item.relocate(&shift);
            }
        }
    }

    /// Items in source order
    pub fn items(&self) -> impl Iterator<Item = &Item> {
        self.chunks.iter().map(|c| &c.item)
    }

    /// How many chunks the last parse took from the previous tree
    pub fn reused_count(&self) -> usize {
        self.reused
    }
}

impl PartialEq for SyntaxTree {
    /// Trees are equal when they hold the same items, however they were built
    fn eq(&self, other: &Self) -> bool {
        self.chunks == other.chunks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edit::compute_edit;

    const TEXT: &str = "2026-01-01T09:00Z create lore \"First\" #a\n  subject: ^self\n\n2026-01-02T09:00Z create lore \"Second\"\n  subject: ^other\n";

    fn entries(tree: &SyntaxTree) -> Vec<&Entry> {
        tree.items()
            .filter_map(|item| match item {
                Item::Entry(e) => Some(e),
                Item::Error(_) => None,
            })
            .collect()
    }

    #[test]
    fn test_parse_two_entries() {
        let tree = SyntaxTree::parse(TEXT, None).unwrap();
        let entries = entries(&tree);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].title(), Some("First"));
        assert_eq!(entries[1].span().start_point.row, 3);
    }

    #[test]
    fn test_edit_in_first_entry_reuses_second() {
        let mut tree = SyntaxTree::parse(TEXT, None).unwrap();
        let new_text = TEXT.replace("\"First\"", "\"First entry\"");
        let edit = compute_edit(TEXT, &new_text);
        tree.edit(&edit);
        let reparsed = SyntaxTree::parse(&new_text, Some(&tree)).unwrap();

        assert_eq!(reparsed.reused_count(), 1);
        assert_eq!(reparsed, SyntaxTree::parse(&new_text, None).unwrap());
    }

    #[test]
    fn test_inserted_lines_shift_later_chunks() {
        let mut tree = SyntaxTree::parse(TEXT, None).unwrap();
        let new_text = TEXT.replace("  subject: ^self\n", "  subject: ^self\n  mood: calm\n  kind: note\n");
        tree.edit(&compute_edit(TEXT, &new_text));
        let reparsed = SyntaxTree::parse(&new_text, Some(&tree)).unwrap();

        assert_eq!(reparsed.reused_count(), 1);
        let fresh = SyntaxTree::parse(&new_text, None).unwrap();
        assert_eq!(reparsed, fresh);
        assert_eq!(entries(&reparsed)[1].span().start_point.row, 5);
    }

    #[test]
    fn test_indented_parse_keeps_text_positions() {
        let indented: String = TEXT
            .lines()
            .map(|line| if line.is_empty() { "\n".to_string() } else { format!("  {}\n", line) })
            .collect();
        let tree = SyntaxTree::parse_indented(&indented, 2, None).unwrap();
        let entries = entries(&tree);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].span().start_point.column, 2);
        let key = &entries[0].metadata()[0].key;
        assert_eq!(key.name, "subject");
        assert_eq!(&indented[key.span.start..key.span.end], "subject");
        assert_eq!(key.span.start_point.column, 4);

        let flat = SyntaxTree::parse(&indented, Some(&tree)).unwrap();
        assert_eq!(flat.reused_count(), 0);
    }
}
