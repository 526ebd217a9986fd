//! Text edits
//!
//! [`compute_edit`] describes the change between two texts as one replaced
//! range, found by stripping the common prefix and suffix. That is all the
//! incremental re-parse needs: chunks outside the range are shifted, chunks
//! inside it are rebuilt.

use thalo_ast::Point;

/// One contiguous replacement, in both old and new coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InputEdit {
    pub start_byte: usize,
    pub old_end_byte: usize,
    pub new_end_byte: usize,
    pub start_position: Point,
    pub old_end_position: Point,
    pub new_end_position: Point,
}

impl InputEdit {
    /// Check if the edit changes nothing
    pub fn is_empty(&self) -> bool {
        self.start_byte == self.old_end_byte && self.start_byte == self.new_end_byte
    }

    /// Replay the edit on `old`, taking inserted text from `new`
    pub fn apply(&self, old: &str, new: &str) -> String {
        let mut out = String::with_capacity(new.len());
        out.push_str(&old[..self.start_byte]);
        out.push_str(&new[self.start_byte..self.new_end_byte]);
        out.push_str(&old[self.old_end_byte..]);
        out
    }
}

/// Row/column of a byte offset
pub fn point_at(text: &str, offset: usize) -> Point {
    let before = &text.as_bytes()[..offset.min(text.len())];
    let row = before.iter().filter(|&&b| b == b'\n').count();
    let line_start = before
        .iter()
        .rposition(|&b| b == b'\n')
        .map(|i| i + 1)
        .unwrap_or(0);
    Point::new(row, before.len() - line_start)
}

/// Minimal single-range edit turning `old` into `new`
///
/// Offsets always fall on UTF-8 character boundaries of both texts.
pub fn compute_edit(old: &str, new: &str) -> InputEdit {
    let (old_bytes, new_bytes) = (old.as_bytes(), new.as_bytes());

    let mut prefix = old_bytes
        .iter()
        .zip(new_bytes)
        .take_while(|(a, b)| a == b)
        .count();
    while !old.is_char_boundary(prefix) || !new.is_char_boundary(prefix) {
        prefix -= 1;
    }

    let max_suffix = old.len().min(new.len()) - prefix;
    let mut suffix = old_bytes
        .iter()
        .rev()
        .zip(new_bytes.iter().rev())
        .take(max_suffix)
        .take_while(|(a, b)| a == b)
        .count();
    while !old.is_char_boundary(old.len() - suffix) || !new.is_char_boundary(new.len() - suffix) {
        suffix -= 1;
    }

    let old_end = old.len() - suffix;
    let new_end = new.len() - suffix;
    InputEdit {
        start_byte: prefix,
        old_end_byte: old_end,
        new_end_byte: new_end,
        start_position: point_at(old, prefix),
        old_end_position: point_at(old, old_end),
        new_end_position: point_at(new, new_end),
    }
}
