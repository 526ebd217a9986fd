//! Checker behaviour over whole workspaces

use thalo_core::{Diagnostic, Severity, Workspace};
use thalo_validate::{check, CheckConfig, Checker, RuleSeverity};

const LORE_SCHEMA: &str = "2026-01-01T00:00Z define-entity lore \"Knowledge\"\n  # Metadata\n  subject: link\n  # Sections\n  Description?\n";

fn workspace(files: &[(&str, &str)]) -> Workspace {
    let mut ws = Workspace::new();
    for (name, source) in files {
        ws.add_document(source, name).unwrap();
    }
    ws
}

fn with_code<'a>(diagnostics: &'a [Diagnostic], code: &str) -> Vec<&'a Diagnostic> {
    diagnostics.iter().filter(|d| d.code == code).collect()
}

#[test]
fn test_scenario_unknown_entity() {
    let ws = workspace(&[(
        "journal.thalo",
        "2026-01-05T18:00 create journal \"Test\" #test\n  field: value\n",
    )]);
    let diagnostics = check(&ws, &CheckConfig::default());

    // The timestamp has no timezone, so that error comes first
    let found: Vec<_> = diagnostics
        .iter()
        .map(|d| (d.code.as_str(), d.severity, d.line(), d.column()))
        .collect();
    assert_eq!(
        found,
        vec![
            ("missing-timezone", Severity::Error, 1, 17),
            ("unknown-entity", Severity::Error, 1, 25),
        ]
    );
    assert!(diagnostics[1].message.contains("journal"));
}

#[test]
fn test_scenario_missing_required_field() {
    let ws = workspace(&[
        ("schema.thalo", LORE_SCHEMA),
        ("lore.thalo", "2026-01-05T18:00Z create lore \"X\"\n"),
    ]);
    let diagnostics = check(&ws, &CheckConfig::default());

    let missing = with_code(&diagnostics, "missing-required-field");
    assert_eq!(missing.len(), 1);
    assert!(missing[0].message.contains("subject"));
    assert_eq!(missing[0].file, "lore.thalo");
}

#[test]
fn test_scenario_duplicate_timestamp() {
    let ws = workspace(&[(
        "notes.thalo",
        "2026-01-07T10:00Z create lore \"A\"\n  subject: ^self\n\n2026-01-07T10:00Z create lore \"B\"\n  subject: ^self\n",
    )]);
    let diagnostics = check(&ws, &CheckConfig::default());

    let duplicates = with_code(&diagnostics, "duplicate-timestamp");
    assert_eq!(duplicates.len(), 2);
    assert_eq!(duplicates[0].line(), 1);
    assert_eq!(duplicates[1].line(), 4);
}

#[test]
fn test_clean_workspace() {
    let ws = workspace(&[
        ("schema.thalo", LORE_SCHEMA),
        (
            "lore.thalo",
            "2026-01-05T18:00Z create lore \"X\" ^x\n  subject: ^x\n\n  # Description\n  A fact.\n",
        ),
    ]);
    assert_eq!(check(&ws, &CheckConfig::default()), Vec::<Diagnostic>::new());
}

#[test]
fn test_check_is_idempotent() {
    let ws = workspace(&[
        ("schema.thalo", LORE_SCHEMA),
        ("a.thalo", "2026-01-05T18:00 create lore \"X\"\n  mood: ok\n  other: ^nowhere\n"),
        ("b.md", "# Notes\n\n```thalo\n2026-01-06T00:00Z create journal \"J\"\n```\n"),
    ]);
    let first = check(&ws, &CheckConfig::default());
    let second = check(&ws, &CheckConfig::default());
    assert!(!first.is_empty());
    assert_eq!(first, second);

    let keys: Vec<_> = first.iter().map(Diagnostic::sort_key).collect();
    let mut sorted = keys.clone();
    sorted.sort();
    assert_eq!(keys, sorted);
}

#[test]
fn test_cross_file_reactivity() {
    let mut ws = workspace(&[
        ("a.thalo", LORE_SCHEMA),
        ("b.thalo", "2026-01-05T18:00Z create lore \"X\"\n  subject: ^self\n"),
    ]);
    let config = CheckConfig::default();
    assert!(with_code(&check(&ws, &config), "unknown-entity").is_empty());

    ws.add_document("// schema moved elsewhere\n", "a.thalo").unwrap();
    let unknown = check(&ws, &config);
    let unknown = with_code(&unknown, "unknown-entity");
    assert_eq!(unknown.len(), 1);
    assert_eq!(unknown[0].file, "b.thalo");

    ws.add_document(LORE_SCHEMA, "a.thalo").unwrap();
    assert!(with_code(&check(&ws, &config), "unknown-entity").is_empty());
}

#[test]
fn test_link_round_trip() {
    let mut ws = workspace(&[(
        "refs.thalo",
        "2026-01-05T00:00Z create note \"Refs\"\n  first: ^paper\n  second: ^paper, ^paper\n",
    )]);
    let config = CheckConfig::new().with_rule("unknown-entity", RuleSeverity::Off);
    assert_eq!(with_code(&check(&ws, &config), "unresolved-link").len(), 3);

    ws.add_document("2026-01-01T00:00Z create note \"Paper\" ^paper\n", "paper.thalo")
        .unwrap();
    assert!(with_code(&check(&ws, &config), "unresolved-link").is_empty());
    assert_eq!(ws.get_link_references("paper", false).len(), 3);
}

#[test]
fn test_type_checks_through_schema() {
    let schema = "2026-01-01T00:00Z define-entity task \"Task\"\n  # Metadata\n  priority: \"high\" | \"low\"\n  blocks?: link[]\n  # Sections\n  Notes?\n";
    let ws = workspace(&[
        ("schema.thalo", schema),
        (
            "tasks.thalo",
            "2026-01-05T00:00Z create task \"A\" ^a\n  priority: high\n  blocks: ^b, ^a\n\n2026-01-06T00:00Z create task \"B\" ^b\n  priority: medium\n  blocks: ^a, later\n",
        ),
    ]);
    let diagnostics = check(&ws, &CheckConfig::default());
    let invalid = with_code(&diagnostics, "invalid-field-type");
    assert_eq!(invalid.len(), 2, "{:#?}", diagnostics);
    assert!(invalid.iter().all(|d| d.line() >= 5));
}

#[test]
fn test_configured_severities() {
    let ws = workspace(&[
        ("schema.thalo", LORE_SCHEMA),
        ("lore.thalo", "2026-01-05T18:00Z create lore \"X\"\n  subject: ^self\n  mood: ok\n"),
    ]);
    let default = check(&ws, &CheckConfig::default());
    assert!(with_code(&default, "unknown-field")[0].is_warning());

    let mut config = CheckConfig::new();
    config.apply_override("unknown-field=error").unwrap();
    let raised = check(&ws, &config);
    assert!(with_code(&raised, "unknown-field")[0].is_error());

    config.apply_override("unknown-field=off").unwrap();
    assert!(with_code(&check(&ws, &config), "unknown-field").is_empty());
}

#[test]
fn test_check_document_matches_workspace_check() {
    let ws = workspace(&[
        ("a.thalo", "2026-01-05T18:00 create journal \"A\"\n"),
        ("b.thalo", "2026-01-06T18:00Z create journal \"B\"\n  x: ^missing\n"),
    ]);
    let checker = Checker::new();
    let config = CheckConfig::default();
    let all = checker.check(&ws, &config);
    let only_b: Vec<_> = all.iter().filter(|d| d.file == "b.thalo").cloned().collect();
    assert_eq!(checker.check_document(&ws, "b.thalo", &config), only_b);
}

#[test]
fn test_markdown_positions() {
    let ws = workspace(&[(
        "notes.md",
        "# Journal\n\nSome prose.\n\n```thalo\n2026-01-05T18:00Z create journal \"Test\"\n```\n",
    )]);
    let diagnostics = check(&ws, &CheckConfig::default());
    let unknown = with_code(&diagnostics, "unknown-entity");
    assert_eq!(unknown.len(), 1);
    assert_eq!(unknown[0].line(), 6);
    assert_eq!(unknown[0].column(), 26);
}

#[test]
fn test_json_records() {
    let ws = workspace(&[("a.thalo", "2026-01-05T18:00Z create journal \"Test\"\n")]);
    let records: Vec<_> = check(&ws, &CheckConfig::default())
        .iter()
        .map(Diagnostic::to_record)
        .collect();
    let json = serde_json::to_value(&records).unwrap();
    assert_eq!(json[0]["code"], "unknown-entity");
    assert_eq!(json[0]["line"], 1);
    assert_eq!(json[0]["severity"], "error");
}

#[test]
fn test_crlf_source_end_to_end() {
    let notes = "2026-01-05T18:00Z create lore \"X\"\r\n  subject: ^missing\r\n  mood: ok\r\n\r\n  # Description\r\n  A fact.\r\n";
    let ws = workspace(&[
        ("schema.thalo", LORE_SCHEMA.replace('\n', "\r\n").as_str()),
        ("notes.thalo", notes),
    ]);
    assert!(ws.get_model("schema.thalo").unwrap().syntax_errors().is_empty());

    let diagnostics = check(&ws, &CheckConfig::default());
    let found: Vec<_> = diagnostics
        .iter()
        .map(|d| (d.code.as_str(), d.line(), d.column()))
        .collect();
    assert_eq!(found, vec![("unresolved-link", 2, 12), ("unknown-field", 3, 3)]);

    let link = &diagnostics[0];
    assert_eq!(&notes[link.span.start..link.span.end], "^missing");
    assert_eq!(link.end_column(), 20);
}

#[test]
fn test_indented_fence_positions() {
    let ws = workspace(&[(
        "list.md",
        "- Journal\n\n  ```thalo\n  2026-01-05T18:00Z create journal \"Test\"\n  ```\n",
    )]);
    let diagnostics = check(&ws, &CheckConfig::default());
    let found: Vec<_> = diagnostics
        .iter()
        .map(|d| (d.code.as_str(), d.line(), d.column()))
        .collect();
    assert_eq!(found, vec![("unknown-entity", 4, 28)]);
}
