//! Line scanning and chunking
//!
//! Thalo is line-structured: an entry starts at a non-indented line and owns
//! every following indented, blank or comment line up to the next one.

use thalo_ast::{Point, Span};

/// One source line, without its terminator
#[derive(Debug, Clone, Copy)]
pub(crate) struct Line<'a> {
    pub row: usize,
    /// Byte offset of the first character
    pub start: usize,
    /// Leading bytes stripped before `text`, e.g. the indent of a markdown fence
    pub margin: usize,
    pub text: &'a str,
}

impl<'a> Line<'a> {
    /// Bytes of leading spaces and tabs
    pub fn indent(&self) -> usize {
        self.text.len() - self.text.trim_start_matches([' ', '\t']).len()
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    pub fn is_comment(&self) -> bool {
        self.text.trim_start().starts_with("//")
    }

    pub fn is_indented(&self) -> bool {
        self.indent() > 0
    }

    /// Text without surrounding whitespace
    pub fn content(&self) -> &'a str {
        self.text.trim()
    }

    /// Column where [`Line::content`] starts
    pub fn content_column(&self) -> usize {
        self.indent()
    }

    /// Span of `len` bytes starting at `column`
    pub fn span(&self, column: usize, len: usize) -> Span {
        Span::on_row(self.row, self.margin + column, self.start, len)
    }

    /// Span of the trimmed content
    pub fn content_span(&self) -> Span {
        self.span(self.content_column(), self.content().len())
    }

    /// Empty span at a column
    pub fn point(&self, column: usize) -> Span {
        let column = self.margin + column;
        Span::point(self.start + column, Point::new(self.row, column))
    }

    /// Empty span just after the content
    pub fn end_point(&self) -> Span {
        self.point(self.content_column() + self.content().len())
    }
}

/// Split text into lines, dropping `\n` and a trailing `\r`
///
/// Up to `margin` leading spaces are stripped from every line.
pub(crate) fn split_lines(text: &str, margin: usize) -> Vec<Line<'_>> {
    let mut lines = Vec::new();
    let mut start = 0;
    for (row, raw) in text.split('\n').enumerate() {
        let raw_text = raw.strip_suffix('\r').unwrap_or(raw);
        let spaces = raw_text.len() - raw_text.trim_start_matches(' ').len();
        let margin = spaces.min(margin);
        lines.push(Line {
            row,
            start,
            margin,
            text: &raw_text[margin..],
        });
        start += raw.len() + 1;
    }
    lines
}

/// A run of lines forming one entry (or one stray indented region)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ChunkRange {
    /// Index of the first line
    pub first: usize,
    /// Index of the last non-blank, non-comment line
    pub last: usize,
    /// Indented lines with no header above them
    pub orphan: bool,
}

impl ChunkRange {
    /// Byte range from the first line's text to the end of the last line
    pub fn byte_range(&self, lines: &[Line<'_>]) -> (usize, usize) {
        let first = &lines[self.first];
        let last = &lines[self.last];
        (first.start + first.margin, last.start + last.margin + last.text.len())
    }

    pub fn span(&self, lines: &[Line<'_>]) -> Span {
        let (start, end) = self.byte_range(lines);
        let first = &lines[self.first];
        let last = &lines[self.last];
        Span::new(
            start,
            end,
            Point::new(first.row, first.margin),
            Point::new(last.row, last.margin + last.text.len()),
        )
    }
}

/// Group lines into chunks
///
/// Blank and comment lines never start or end a chunk by themselves; they
/// belong to the chunk around them only when content follows.
pub(crate) fn chunk_lines(lines: &[Line<'_>]) -> Vec<ChunkRange> {
    let mut chunks: Vec<ChunkRange> = Vec::new();
    let mut current: Option<ChunkRange> = None;

    for (index, line) in lines.iter().enumerate() {
        if line.is_blank() || line.is_comment() {
            continue;
        }
        if !line.is_indented() {
            chunks.extend(current.take());
            current = Some(ChunkRange {
                first: index,
                last: index,
                orphan: false,
            });
            continue;
        }
        match current.as_mut() {
            Some(chunk) => chunk.last = index,
            None => {
                current = Some(ChunkRange {
                    first: index,
                    last: index,
                    orphan: true,
                })
            }
        }
    }
    chunks.extend(current);
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_lines_offsets() {
        let lines = split_lines("a\r\nbc\n\nd", 0);
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0].text, "a");
        assert_eq!(lines[1].start, 3);
        assert_eq!(lines[1].text, "bc");
        assert_eq!(lines[3].start, 7);
    }

    #[test]
    fn test_chunks_skip_comments_and_trailing_blanks() {
        let text = "// intro\n2026-01-01T00:00Z create a \"A\"\n  k: v\n\n  body\n\n// gap\n2026-01-02T00:00Z create a \"B\"\n";
        let lines = split_lines(text, 0);
        let chunks = chunk_lines(&lines);
        assert_eq!(chunks.len(), 2);
        assert_eq!((chunks[0].first, chunks[0].last), (1, 4));
        assert_eq!((chunks[1].first, chunks[1].last), (7, 7));
        let (start, end) = chunks[0].byte_range(&lines);
        assert_eq!(&text[start..end], "2026-01-01T00:00Z create a \"A\"\n  k: v\n\n  body");
    }

    #[test]
    fn test_leading_indentation_is_orphan() {
        let lines = split_lines("  stray\n\tmore\nheader", 0);
        let chunks = chunk_lines(&lines);
        assert_eq!(chunks.len(), 2);
        assert!(chunks[0].orphan);
        assert_eq!(chunks[0].last, 1);
        assert!(!chunks[1].orphan);
    }

    #[test]
    fn test_margin_is_stripped_but_kept_in_positions() {
        let text = "  2026-01-01T00:00Z create a \"A\"\n    k: v\n ragged\n";
        let lines = split_lines(text, 2);
        assert_eq!(lines[0].text, "2026-01-01T00:00Z create a \"A\"");
        assert_eq!(lines[1].text, "  k: v");
        assert_eq!((lines[2].margin, lines[2].text), (1, "ragged"));

        let chunks = chunk_lines(&lines);
        assert_eq!(chunks.len(), 2);
        assert_eq!((chunks[0].first, chunks[0].last), (0, 1));
        let (start, end) = chunks[0].byte_range(&lines);
        assert_eq!(&text[start..end], "2026-01-01T00:00Z create a \"A\"\n    k: v");
        assert_eq!(chunks[0].span(&lines).start_point, Point::new(0, 2));

        let key = lines[1].span(2, 1);
        assert_eq!(&text[key.start..key.end], "k");
        assert_eq!(key.start_point, Point::new(1, 4));
    }
}
