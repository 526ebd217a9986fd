//! Documents
//!
//! A [`Document`] owns one file's text, its source blocks (each with a
//! [`SourceMap`] and its own [`SyntaxTree`]) and the entries of all blocks
//! translated into file coordinates.

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use thalo_ast::{
    ActualizeEntry, Entry, InstanceEntry, Point, Relocate, SchemaEntry, SynthesisEntry,
    SyntaxError,
};

use crate::edit::compute_edit;
use crate::error::Result;
use crate::links::LinkFragment;
use crate::source_map::SourceMap;
use crate::syntax::{Item, SyntaxTree};

/// How a file holds Thalo text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileKind {
    /// The whole file is Thalo
    Thalo,
    /// Markdown with ```` ```thalo ```` fenced blocks
    Markdown,
}

impl FileKind {
    /// Classify by extension, then by looking for a thalo fence
    pub fn detect(filename: &str, source: &str) -> Self {
        let extension = Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("thalo") => FileKind::Thalo,
            Some("md") | Some("markdown") => FileKind::Markdown,
            _ if source.lines().any(|line| fence_open().is_match(line)) => FileKind::Markdown,
            _ => FileKind::Thalo,
        }
    }
}

fn fence_open() -> &'static Regex {
    static FENCE_RE: OnceLock<Regex> = OnceLock::new();
    FENCE_RE.get_or_init(|| {
        Regex::new(r"^( {0,3})(`{3,}|~{3,})[ \t]*thalo[ \t]*\r?$").expect("fence pattern is valid")
    })
}

/// A closing fence: same character, at least as long, nothing after it
fn closes(line: &str, fence: &str) -> bool {
    let trimmed = line.trim_end_matches(['\r', ' ', '\t']);
    let indent = trimmed.len() - trimmed.trim_start_matches(' ').len();
    if indent > 3 {
        return false;
    }
    let body = &trimmed[indent..];
    let Some(marker) = fence.chars().next() else {
        return false;
    };
    body.len() >= fence.len() && body.chars().all(|c| c == marker)
}

struct OpenFence {
    marker: String,
    indent: usize,
    start: usize,
    start_row: usize,
}

impl OpenFence {
    fn close(self, source: &str, end: usize) -> (usize, SourceMap) {
        let text = &source[self.start..end];
        let map = SourceMap::embedded(self.start, self.start_row, 0, text).with_indent(self.indent);
        (self.start, map)
    }
}

/// Text ranges of every thalo fence body in a markdown file
///
/// The block keeps the fence's indentation in its text; the map records it
/// so the parser can strip it from each line.
fn extract_markdown_blocks(source: &str) -> Vec<(usize, SourceMap)> {
    let mut blocks = Vec::new();
    let mut open: Option<OpenFence> = None;
    let mut offset = 0;

    for (row, line) in source.split('\n').enumerate() {
        let next = offset + line.len() + 1;
        match open.take() {
            None => {
                if let Some(caps) = fence_open().captures(line) {
                    open = Some(OpenFence {
                        marker: caps[2].to_string(),
                        indent: caps[1].len(),
                        start: next.min(source.len()),
                        start_row: row + 1,
                    });
                }
            }
            Some(fence) if closes(line, &fence.marker) => blocks.push(fence.close(source, offset)),
            Some(fence) => open = Some(fence),
        }
        offset = next;
    }

    // An unclosed fence runs to the end of the file
    if let Some(fence) = open {
        blocks.push(fence.close(source, source.len()));
    }
    blocks
}

/// One block of Thalo text inside a file
#[derive(Debug, Clone)]
pub struct SourceBlock {
    text: String,
    map: SourceMap,
    tree: SyntaxTree,
}

impl SourceBlock {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn source_map(&self) -> &SourceMap {
        &self.map
    }

    pub fn tree(&self) -> &SyntaxTree {
        &self.tree
    }
}

/// One workspace file
#[derive(Debug, Clone)]
pub struct Document {
    filename: String,
    source: String,
    kind: FileKind,
    explicit_kind: bool,
    blocks: Vec<SourceBlock>,
    entries: Vec<Entry>,
    errors: Vec<SyntaxError>,
}

impl Document {
    /// Parse a file, classifying it by name and content
    pub fn parse(source: &str, filename: &str) -> Result<Self> {
        let kind = FileKind::detect(filename, source);
        let mut doc = Self::empty(filename, kind, false);
        doc.update(source)?;
        Ok(doc)
    }

    /// Parse a file as the given kind
    pub fn parse_as(source: &str, filename: &str, kind: FileKind) -> Result<Self> {
        let mut doc = Self::empty(filename, kind, true);
        doc.update(source)?;
        Ok(doc)
    }

    fn empty(filename: &str, kind: FileKind, explicit_kind: bool) -> Self {
        Self {
            filename: filename.to_string(),
            source: String::new(),
            kind,
            explicit_kind,
            blocks: Vec::new(),
            entries: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Fix the kind; later updates no longer classify the text
    pub fn set_kind(&mut self, kind: FileKind) {
        self.kind = kind;
        self.explicit_kind = true;
    }

    /// Replace the text, re-parsing incrementally
    ///
    /// Each new block is diffed against the old block at the same index and
    /// that block's tree is edited and handed to the re-parse.
    pub fn update(&mut self, source: &str) -> Result<()> {
        if !self.explicit_kind {
            self.kind = FileKind::detect(&self.filename, source);
        }
        let ranges = match self.kind {
            FileKind::Thalo => vec![(0, SourceMap::identity(source))],
            FileKind::Markdown => extract_markdown_blocks(source),
        };

        let mut previous = std::mem::take(&mut self.blocks).into_iter();
        let mut blocks = Vec::with_capacity(ranges.len());
        for (start, map) in ranges {
            let text = &source[start..start + map.len];
            let tree = match previous.next() {
                Some(mut old) => {
                    let edit = compute_edit(&old.text, text);
                    old.tree.edit(&edit);
                    SyntaxTree::parse_indented(text, map.indent, Some(&old.tree))?
                }
                None => SyntaxTree::parse_indented(text, map.indent, None)?,
            };
            blocks.push(SourceBlock {
                text: text.to_string(),
                map,
                tree,
            });
        }

        self.source = source.to_string();
        self.blocks = blocks;
        self.collect_items();
        Ok(())
    }

    /// Translate block items into file coordinates
    fn collect_items(&mut self) {
        self.entries.clear();
        self.errors.clear();
        for block in &self.blocks {
            let shift = block.map.shift();
            for item in block.tree.items() {
                let mut item = item.clone();
                if !shift.is_identity() {
                    item.relocate(&shift);
                }
                match item {
                    Item::Entry(entry) => self.entries.push(entry),
                    Item::Error(err) => self.errors.push(err),
                }
            }
        }
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn kind(&self) -> FileKind {
        self.kind
    }

    pub fn blocks(&self) -> &[SourceBlock] {
        &self.blocks
    }

    /// Entries of all blocks, in source order
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Regions that did not become entries
    pub fn item_errors(&self) -> &[SyntaxError] {
        &self.errors
    }

    /// Every syntax-error node in the file, in source order
    pub fn syntax_errors(&self) -> Vec<&SyntaxError> {
        let mut errors: Vec<&SyntaxError> = self.errors.iter().collect();
        for entry in &self.entries {
            errors.extend(entry.syntax_errors());
        }
        errors.sort_by_key(|err| err.span.start);
        errors
    }

    /// The block containing a file point
    pub fn block_at(&self, point: Point) -> Option<&SourceBlock> {
        self.blocks
            .iter()
            .find(|block| block.map.to_block_point(point).is_some())
    }

    /// The entry whose span contains a file offset
    pub fn entry_at(&self, offset: usize) -> Option<&Entry> {
        self.entries.iter().find(|entry| {
            let span = entry.span();
            span.start <= offset && offset <= span.end
        })
    }

    pub fn instance_entries(&self) -> impl Iterator<Item = &InstanceEntry> {
        self.entries.iter().filter_map(|entry| match entry {
            Entry::Instance(e) => Some(e),
            _ => None,
        })
    }

    pub fn schema_entries(&self) -> impl Iterator<Item = &SchemaEntry> {
        self.entries.iter().filter_map(|entry| match entry {
            Entry::Schema(e) => Some(e),
            _ => None,
        })
    }

    pub fn synthesis_entries(&self) -> impl Iterator<Item = &SynthesisEntry> {
        self.entries.iter().filter_map(|entry| match entry {
            Entry::Synthesis(e) => Some(e),
            _ => None,
        })
    }

    pub fn actualize_entries(&self) -> impl Iterator<Item = &ActualizeEntry> {
        self.entries.iter().filter_map(|entry| match entry {
            Entry::Actualize(e) => Some(e),
            _ => None,
        })
    }

    /// This file's share of the Link Index
    pub fn link_fragment(&self) -> LinkFragment {
        LinkFragment::collect(&self.filename, &self.entries)
    }

    /// Entity names used by instance entries and synthesis queries
    pub fn referenced_entities(&self) -> BTreeSet<String> {
        let mut names: BTreeSet<String> = self
            .instance_entries()
            .filter_map(|e| e.entity.as_ref().ok())
            .map(|ident| ident.name.clone())
            .collect();
        for synthesis in self.synthesis_entries() {
            names.extend(synthesis.source_queries().iter().map(|q| q.entity.name.clone()));
        }
        names
    }

    /// Entity names defined or altered in this file
    pub fn schema_entities(&self) -> BTreeSet<String> {
        self.schema_entries()
            .filter_map(|e| e.entity.as_ref().ok())
            .map(|ident| ident.name.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use thalo_ast::EntryKind;

    const MARKDOWN: &str = "# Notes\n\nSome prose.\n\n```thalo\n2026-01-05T18:00Z create lore \"Inside\" ^inside\n  subject: ^self\n```\n\nMore prose.\n\n~~~~thalo\n2026-01-06T18:00Z create lore \"Second\"\n~~~~\n";

    #[test]
    fn test_detect_kind() {
        assert_eq!(FileKind::detect("a.thalo", ""), FileKind::Thalo);
        assert_eq!(FileKind::detect("a.MD", ""), FileKind::Markdown);
        assert_eq!(FileKind::detect("notes.txt", "```thalo\n```\n"), FileKind::Markdown);
        assert_eq!(FileKind::detect("notes.txt", "plain"), FileKind::Thalo);
    }

    #[test]
    fn test_markdown_blocks_map_to_file_rows() {
        let doc = Document::parse(MARKDOWN, "notes.md").unwrap();
        assert_eq!(doc.blocks().len(), 2);
        assert_eq!(doc.entries().len(), 2);

        let first = &doc.entries()[0];
        assert_eq!(first.title(), Some("Inside"));
        assert_eq!(first.span().start_point, Point::new(5, 0));
        let link = first.link().unwrap();
        assert_eq!(&doc.source()[link.span.start..link.span.end], "^inside");
        assert_eq!(doc.entries()[1].span().start_point.row, 12);
    }

    #[test]
    fn test_block_at_picks_block() {
        let doc = Document::parse(MARKDOWN, "notes.md").unwrap();
        assert!(doc.block_at(Point::new(0, 0)).is_none());
        let block = doc.block_at(Point::new(6, 2)).unwrap();
        assert!(block.text().contains("Inside"));
        let second = doc.block_at(Point::new(12, 0)).unwrap();
        assert!(second.text().contains("Second"));
        // The closing fence starts where the block ends
        assert!(doc.block_at(Point::new(7, 0)).is_some());
        assert!(doc.block_at(Point::new(7, 1)).is_none());
        assert!(doc.block_at(Point::new(9, 0)).is_none());
    }

    #[test]
    fn test_parse_as_overrides_detection() {
        let doc = Document::parse_as(MARKDOWN, "notes.thalo", FileKind::Markdown).unwrap();
        assert_eq!(doc.kind(), FileKind::Markdown);
        assert_eq!(doc.blocks().len(), 2);
        assert_eq!(doc.blocks()[0].source_map().line_offset, 5);
        assert_eq!(doc.blocks()[1].source_map().line_offset, 12);

        let thalo = "2026-01-06T18:00Z create lore \"Plain\"\n";
        let mut doc = Document::parse_as(thalo, "notes.md", FileKind::Thalo).unwrap();
        assert_eq!(doc.blocks().len(), 1);
        assert!(doc.blocks()[0].source_map().is_identity());
        assert_eq!(doc.entries().len(), 1);

        doc.update(MARKDOWN).unwrap();
        assert_eq!(doc.kind(), FileKind::Thalo);
        assert_eq!(doc.blocks().len(), 1);
    }

    #[test]
    fn test_indented_fence_strips_indent() {
        let source = "- item\n\n  ```thalo\n  2026-01-05T18:00Z create lore \"Nested\" ^nested\n    subject: ^self\n  ```\n";
        let doc = Document::parse(source, "list.md").unwrap();
        assert_eq!(doc.blocks().len(), 1);
        assert_eq!(doc.blocks()[0].source_map().indent, 2);
        assert!(doc.syntax_errors().is_empty());

        let entry = &doc.entries()[0];
        assert_eq!(entry.span().start_point, Point::new(3, 2));
        let link = entry.link().unwrap();
        assert_eq!(&source[link.span.start..link.span.end], "^nested");
        let key = &entry.metadata()[0].key;
        assert_eq!(key.name, "subject");
        assert_eq!(key.span.start_point, Point::new(4, 4));
    }

    #[test]
    fn test_unclosed_fence_runs_to_end() {
        let doc = Document::parse("```thalo\n2026-01-05T18:00Z create lore \"X\"\n", "a.md").unwrap();
        assert_eq!(doc.entries().len(), 1);
    }

    #[test]
    fn test_update_matches_fresh_parse() {
        let mut doc = Document::parse(MARKDOWN, "notes.md").unwrap();
        let changed = MARKDOWN.replace("\"Second\"", "\"Second, edited\" #tag");
        doc.update(&changed).unwrap();
        let fresh = Document::parse(&changed, "notes.md").unwrap();
        assert_eq!(doc.entries(), fresh.entries());
        assert_eq!(doc.blocks()[0].tree().reused_count(), 1);
    }

    #[test]
    fn test_entry_at_and_facts() {
        let source = "2026-01-01T00:00Z define-entity lore \"Lore\"\n  # Metadata\n  subject: link\n\n2026-01-02T00:00Z create lore \"X\"\n  subject: ^a\n";
        let doc = Document::parse(source, "a.thalo").unwrap();
        let offset = source.find("subject: ^a").unwrap();
        assert_eq!(doc.entry_at(offset).map(Entry::kind), Some(EntryKind::Instance));
        assert!(doc.schema_entities().contains("lore"));
        assert!(doc.referenced_entities().contains("lore"));
        assert_eq!(doc.link_fragment().references.len(), 1);
    }
}
