//! Block ↔ file position mapping
//!
//! A pure `.thalo` file is one block with the identity map. In markdown,
//! every ```` ```thalo ```` fence is a block whose text starts at
//! `char_offset` / `line_offset` of the file. A fence indented inside a
//! list item records that indent; it is stripped from every block line
//! before parsing, but block positions still count it.

use thalo_ast::{Point, Shift};

/// Position translation for one source block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SourceMap {
    /// Byte offset of the block start in the file
    pub char_offset: usize,
    /// Row of the block start in the file
    pub line_offset: usize,
    /// Column of the block start, applied to the block's first row only
    pub column_offset: usize,
    /// Rows the block covers
    pub line_count: usize,
    /// Block length in bytes
    pub len: usize,
    /// Spaces of fence indentation stripped from each block line
    pub indent: usize,
    /// The block ends with a newline that `line_count` does not count, so
    /// its end is column 0 of row `line_count`
    pub ends_after_newline: bool,
}

impl SourceMap {
    /// Map for a whole-file block
    pub fn identity(text: &str) -> Self {
        Self {
            char_offset: 0,
            line_offset: 0,
            column_offset: 0,
            line_count: text.matches('\n').count() + 1,
            len: text.len(),
            indent: 0,
            ends_after_newline: false,
        }
    }

    /// Map for a block embedded at a file position
    ///
    /// A trailing newline ends the block's last row; the row after it belongs
    /// to whatever follows (the closing fence).
    pub fn embedded(char_offset: usize, line_offset: usize, column_offset: usize, text: &str) -> Self {
        let newlines = text.matches('\n').count();
        let line_count = if text.is_empty() {
            0
        } else {
            newlines + usize::from(!text.ends_with('\n'))
        };
        Self {
            char_offset,
            line_offset,
            column_offset,
            line_count,
            len: text.len(),
            indent: 0,
            ends_after_newline: text.ends_with('\n'),
        }
    }

    pub fn with_indent(mut self, indent: usize) -> Self {
        self.indent = indent;
        self
    }

    /// Check if this map is the identity
    pub fn is_identity(&self) -> bool {
        self.char_offset == 0 && self.line_offset == 0 && self.column_offset == 0
    }

    pub fn to_file_point(&self, point: Point) -> Point {
        let column = if point.row == 0 {
            point.column + self.column_offset
        } else {
            point.column
        };
        Point::new(point.row + self.line_offset, column)
    }

    /// Block position of a file point, or `None` outside the block
    ///
    /// The block's end position is inside, as for [`SourceMap::to_block_offset`].
    pub fn to_block_point(&self, point: Point) -> Option<Point> {
        if point.row < self.line_offset {
            return None;
        }
        let row = point.row - self.line_offset;
        if row == self.line_count && self.ends_after_newline && point.column == 0 {
            return Some(Point::new(row, 0));
        }
        if row >= self.line_count {
            return None;
        }
        let column = if row == 0 {
            point.column.checked_sub(self.column_offset)?
        } else {
            point.column
        };
        Some(Point::new(row, column))
    }

    pub fn to_file_offset(&self, offset: usize) -> usize {
        offset + self.char_offset
    }

    /// Block offset of a file offset, or `None` outside the block
    ///
    /// The offset just past the last byte is inside.
    pub fn to_block_offset(&self, offset: usize) -> Option<usize> {
        let local = offset.checked_sub(self.char_offset)?;
        (local <= self.len).then_some(local)
    }

    /// The shift that moves block-coordinate nodes into file coordinates
    pub fn shift(&self) -> Shift {
        Shift {
            bytes: self.char_offset as isize,
            rows: self.line_offset as isize,
            columns: self.column_offset as isize,
            anchor_row: 0,
        }
    }
}
