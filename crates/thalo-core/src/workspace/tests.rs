//! Workspace tests
//!
//! Mutation sequences must leave the indices equal to a fresh build from the
//! same file contents, and must recompute exactly the affected models.

use super::*;

const SCHEMA: &str = "2026-01-01T00:00Z define-entity reference \"A cited source\"\n  # Metadata\n  url?: string\n";
const USES_SCHEMA: &str = "2026-01-05T10:00Z create reference \"Paper\" ^paper\n  url: \"https://example.org\"\n";
const LINKS_PAPER: &str = "2026-01-06T10:00Z create note \"Reading\"\n  source: ^paper\n";
const UNRELATED: &str = "2026-01-07T10:00Z create note \"Other\"\n  source: ^elsewhere\n";

fn fresh(files: &[(&str, &str)]) -> Workspace {
    let mut ws = Workspace::new();
    for (name, source) in files {
        ws.add_document(source, name).unwrap();
    }
    ws
}

fn assert_same_state(a: &Workspace, b: &Workspace) {
    assert_eq!(a.schema_registry(), b.schema_registry());
    assert_eq!(a.link_index(), b.link_index());
    assert_eq!(a.files().collect::<Vec<_>>(), b.files().collect::<Vec<_>>());
    for file in a.files() {
        assert_eq!(a.semantic_model(file), b.semantic_model(file), "model of {}", file);
    }
}

// ==================== REACTIVITY TESTS ====================

mod reactivity_tests {
    use super::*;

    /// Test 1: Entity resolution follows the schema file
    #[test]
    fn test_schema_removal_flips_entity_resolution() {
        let mut ws = fresh(&[("a.thalo", SCHEMA), ("b.thalo", USES_SCHEMA)]);
        let entity = |ws: &Workspace| ws.semantic_model("b.thalo").unwrap().entries[0].entity.clone();
        assert_eq!(entity(&ws), EntityResolution::Known("reference".into()));

        ws.add_document("// nothing here\n", "a.thalo").unwrap();
        assert_eq!(entity(&ws), EntityResolution::Unknown("reference".into()));
        assert!(ws.last_invalidated().contains("b.thalo"));
        let model = ws.semantic_model("b.thalo").unwrap();
        let unknown: Vec<_> = model.unknown_entities().map(|m| m.index).collect();
        assert_eq!(unknown, vec![0]);

        ws.add_document(SCHEMA, "a.thalo").unwrap();
        assert_eq!(entity(&ws), EntityResolution::Known("reference".into()));
        assert_eq!(ws.semantic_model("b.thalo").unwrap().unknown_entities().count(), 0);
    }

    /// Test 2: A dangling link resolves once its definition arrives
    #[test]
    fn test_link_definition_resolves_dangling_reference() {
        let mut ws = fresh(&[("c.thalo", LINKS_PAPER)]);
        assert_eq!(ws.semantic_model("c.thalo").unwrap().unresolved_links().count(), 1);

        ws.add_document(USES_SCHEMA, "b.thalo").unwrap();
        let model = ws.semantic_model("c.thalo").unwrap();
        assert_eq!(model.unresolved_links().count(), 0);
        assert_eq!(model.entries[0].links[0].target.as_ref().unwrap().file, "b.thalo");

        assert!(ws.remove_document("b.thalo"));
        assert_eq!(ws.semantic_model("c.thalo").unwrap().unresolved_links().count(), 1);
        assert!(ws.semantic_model("b.thalo").is_none());
    }

    /// Test 3: Removing an unknown file is a no-op
    #[test]
    fn test_remove_missing_document() {
        let mut ws = fresh(&[("a.thalo", SCHEMA)]);
        assert!(!ws.remove_document("missing.thalo"));
        assert_eq!(ws.document_count(), 1);
    }
}

// ==================== INVALIDATION TESTS ====================

mod invalidation_tests {
    use super::*;

    /// Test 1: Schema changes invalidate every document
    #[test]
    fn test_schema_change_invalidates_all() {
        let mut ws = fresh(&[("a.thalo", SCHEMA), ("b.thalo", USES_SCHEMA), ("d.thalo", UNRELATED)]);
        ws.add_document(&SCHEMA.replace("url?", "doi?"), "a.thalo").unwrap();
        assert_eq!(ws.last_invalidated().len(), 3);
    }

    /// Test 2: Link changes invalidate referencing documents only
    #[test]
    fn test_link_change_invalidates_referencing_documents() {
        let mut ws = fresh(&[
            ("a.thalo", SCHEMA),
            ("b.thalo", USES_SCHEMA),
            ("c.thalo", LINKS_PAPER),
            ("d.thalo", UNRELATED),
        ]);
        ws.add_document(&USES_SCHEMA.replace("^paper", "^article"), "b.thalo").unwrap();

        let invalidated: Vec<_> = ws.last_invalidated().iter().map(String::as_str).collect();
        assert_eq!(invalidated, vec!["b.thalo", "c.thalo"]);
    }

    /// Test 3: The mutated document is always recomputed
    #[test]
    fn test_mutated_document_is_invalidated() {
        let mut ws = fresh(&[("d.thalo", UNRELATED)]);
        ws.add_document(UNRELATED, "d.thalo").unwrap();
        assert!(ws.last_invalidated().contains("d.thalo"));
    }
}

// ==================== REBUILD EQUIVALENCE TESTS ====================

mod rebuild_tests {
    use super::*;

    /// Test 1: Order of insertion does not matter
    #[test]
    fn test_insertion_order_independent() {
        let forward = fresh(&[
            ("a.thalo", SCHEMA),
            ("b.thalo", USES_SCHEMA),
            ("c.thalo", LINKS_PAPER),
        ]);
        let backward = fresh(&[
            ("c.thalo", LINKS_PAPER),
            ("b.thalo", USES_SCHEMA),
            ("a.thalo", SCHEMA),
        ]);
        assert_same_state(&forward, &backward);
    }

    /// Test 2: Add, update and remove end in the same state as a fresh build
    #[test]
    fn test_mutation_sequence_equals_fresh_build() {
        let mut ws = Workspace::new();
        ws.add_document(LINKS_PAPER, "c.thalo").unwrap();
        ws.add_document(SCHEMA, "b.thalo").unwrap();
        ws.add_document(USES_SCHEMA, "b.thalo").unwrap();
        ws.add_document(UNRELATED, "d.thalo").unwrap();
        ws.add_document(SCHEMA, "a.thalo").unwrap();
        ws.add_document(&UNRELATED.replace("Other", "Changed"), "d.thalo").unwrap();
        assert!(ws.remove_document("d.thalo"));

        let expected = fresh(&[
            ("a.thalo", SCHEMA),
            ("b.thalo", USES_SCHEMA),
            ("c.thalo", LINKS_PAPER),
        ]);
        assert_same_state(&ws, &expected);
    }

    /// Test 3: Incremental document update equals a fresh parse
    #[test]
    fn test_update_equals_fresh_document() {
        let combined = format!("{}\n{}", USES_SCHEMA, LINKS_PAPER);
        let mut ws = fresh(&[("x.thalo", USES_SCHEMA)]);
        ws.add_document(&combined, "x.thalo").unwrap();

        let fresh_doc = Document::parse(&combined, "x.thalo").unwrap();
        assert_eq!(ws.get_model("x.thalo").unwrap().entries(), fresh_doc.entries());
    }
}

// ==================== LOOKUP TESTS ====================

mod lookup_tests {
    use super::*;

    /// Test 1: Find entries by explicit id and by timestamp
    #[test]
    fn test_find_entry() {
        let ws = fresh(&[("b.thalo", USES_SCHEMA), ("c.thalo", LINKS_PAPER)]);

        let (doc, entry) = ws.find_entry("paper").unwrap();
        assert_eq!(doc.filename(), "b.thalo");
        assert_eq!(entry.title(), Some("Paper"));

        let (doc, _) = ws.find_entry("2026-01-06T10:00Z").unwrap();
        assert_eq!(doc.filename(), "c.thalo");

        assert!(ws.find_entry("nope").is_none());
    }

    /// Test 2: References with and without the definition
    #[test]
    fn test_link_references() {
        let ws = fresh(&[("b.thalo", USES_SCHEMA), ("c.thalo", LINKS_PAPER)]);
        assert_eq!(ws.get_link_references("paper", false).len(), 1);

        let all = ws.get_link_references("paper", true);
        assert_eq!(all.len(), 2);
        assert!(matches!(all[0], LinkOccurrence::Definition(_)));
        assert_eq!(all[1].file(), "c.thalo");
    }

    /// Test 3: Markdown documents index their embedded entries
    #[test]
    fn test_markdown_document() {
        let markdown = format!("# Reading list\n\n```thalo\n{}```\n", USES_SCHEMA);
        let ws = fresh(&[("notes.md", markdown.as_str())]);
        let definition = ws.get_link_definition("paper").unwrap();
        assert_eq!(definition.entry.file, "notes.md");
        assert_eq!(definition.span.start_point.row, 3);
    }

    /// Test 4: An explicit kind overrides the file name
    #[test]
    fn test_add_document_as_overrides_kind() {
        let markdown = format!("# Reading list\n\n```thalo\n{}```\n", USES_SCHEMA);
        let mut ws = Workspace::new();
        ws.add_document_as(&markdown, "list.thalo", FileKind::Markdown).unwrap();
        ws.add_document_as(USES_SCHEMA, "plain.md", FileKind::Thalo).unwrap();

        let list = ws.get_model("list.thalo").unwrap();
        assert_eq!(list.kind(), FileKind::Markdown);
        assert_eq!(list.blocks().len(), 1);
        assert_eq!(list.blocks()[0].source_map().line_offset, 3);
        assert!(list.syntax_errors().is_empty());
        assert_eq!(ws.get_link_definition("paper").unwrap().entry.file, "list.thalo");

        let plain = ws.get_model("plain.md").unwrap();
        assert_eq!(plain.kind(), FileKind::Thalo);
        assert!(plain.blocks()[0].source_map().is_identity());
        assert_eq!(plain.entries().len(), 1);

        // The override survives an update that no longer contains a fence
        ws.add_document(LINKS_PAPER, "list.thalo").unwrap();
        let list = ws.get_model("list.thalo").unwrap();
        assert_eq!(list.kind(), FileKind::Markdown);
        assert!(list.entries().is_empty());
    }
}
