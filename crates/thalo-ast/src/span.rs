//! Source positions
//!
//! Every node in the AST carries a [`Span`]: a byte range plus the
//! row/column points at both ends. Rows and columns are 0-based and columns
//! count bytes, so a span can be sliced straight out of the source text.

use serde::{Deserialize, Serialize};

/// A 0-based row/column position
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Point {
    /// Row (line) index, 0-based
    pub row: usize,
    /// Byte column within the row, 0-based
    pub column: usize,
}

impl Point {
    /// Create a new point
    pub fn new(row: usize, column: usize) -> Self {
        Self { row, column }
    }
}

impl std::fmt::Display for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.row + 1, self.column + 1)
    }
}

/// A range in the source text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Span {
    /// Start offset in bytes (inclusive)
    pub start: usize,
    /// End offset in bytes (exclusive)
    pub end: usize,
    /// Point of `start`
    pub start_point: Point,
    /// Point of `end`
    pub end_point: Point,
}

impl Span {
    /// Create a span from offsets and points
    pub fn new(start: usize, end: usize, start_point: Point, end_point: Point) -> Self {
        Self {
            start,
            end,
            start_point,
            end_point,
        }
    }

    /// Create a span within a single row
    pub fn on_row(row: usize, start_column: usize, line_start: usize, len: usize) -> Self {
        Self {
            start: line_start + start_column,
            end: line_start + start_column + len,
            start_point: Point::new(row, start_column),
            end_point: Point::new(row, start_column + len),
        }
    }

    /// Create an empty span at one position
    pub fn point(offset: usize, point: Point) -> Self {
        Self::new(offset, offset, point, point)
    }

    /// Length in bytes
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Check if the span is empty
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Check if this span contains a byte offset
    pub fn contains(&self, offset: usize) -> bool {
        offset >= self.start && offset < self.end
    }

    /// Check if this span fully contains another
    pub fn encloses(&self, other: &Span) -> bool {
        other.start >= self.start && other.end <= self.end
    }

    /// Merge two spans into one that covers both
    pub fn merge(&self, other: &Span) -> Span {
        let (start, start_point) = if self.start <= other.start {
            (self.start, self.start_point)
        } else {
            (other.start, other.start_point)
        };
        let (end, end_point) = if self.end >= other.end {
            (self.end, self.end_point)
        } else {
            (other.end, other.end_point)
        };
        Span::new(start, end, start_point, end_point)
    }
}

/// A translation of positions from one coordinate space into another
///
/// `bytes` and `rows` apply to every position. `columns` only applies to
/// positions on `anchor_row` (before translation), which is how an embedded
/// block whose first line starts mid-row maps into its file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Shift {
    pub bytes: isize,
    pub rows: isize,
    pub columns: isize,
    pub anchor_row: usize,
}

impl Shift {
    /// A shift that moves whole rows (no column change)
    pub fn rows(bytes: isize, rows: isize) -> Self {
        Self {
            bytes,
            rows,
            columns: 0,
            anchor_row: 0,
        }
    }

    /// Check if this shift is a no-op
    pub fn is_identity(&self) -> bool {
        self.bytes == 0 && self.rows == 0 && self.columns == 0
    }

    /// Translate a byte offset
    pub fn offset(&self, offset: usize) -> usize {
        offset.saturating_add_signed(self.bytes)
    }

    /// Translate a point
    pub fn point(&self, point: Point) -> Point {
        let column = if point.row == self.anchor_row {
            point.column.saturating_add_signed(self.columns)
        } else {
            point.column
        };
        Point::new(point.row.saturating_add_signed(self.rows), column)
    }
}

/// Types whose positions can be translated in place
///
/// Implemented by every AST node so whole subtrees can move between
/// coordinate spaces (block to file, or old text to edited text).
pub trait Relocate {
    fn relocate(&mut self, shift: &Shift);
}

impl Relocate for Span {
    fn relocate(&mut self, shift: &Shift) {
        self.start = shift.offset(self.start);
        self.end = shift.offset(self.end);
        self.start_point = shift.point(self.start_point);
        self.end_point = shift.point(self.end_point);
    }
}

impl<T: Relocate> Relocate for Option<T> {
    fn relocate(&mut self, shift: &Shift) {
        if let Some(inner) = self {
            inner.relocate(shift);
        }
    }
}

impl<T: Relocate> Relocate for Vec<T> {
    fn relocate(&mut self, shift: &Shift) {
        for item in self {
            item.relocate(shift);
        }
    }
}

impl<T: Relocate> Relocate for Box<T> {
    fn relocate(&mut self, shift: &Shift) {
        self.as_mut().relocate(shift);
    }
}

impl<T: Relocate, E: Relocate> Relocate for Result<T, E> {
    fn relocate(&mut self, shift: &Shift) {
        match self {
            Ok(inner) => inner.relocate(shift),
            Err(err) => err.relocate(shift),
        }
    }
}
