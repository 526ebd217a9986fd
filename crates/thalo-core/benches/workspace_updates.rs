//! Workspace Update Benchmarks
//!
//! Measures the cost of the mutations an editor drives: typing inside one
//! entry of a large file, replacing a schema that every file depends on,
//! and building a workspace from scratch.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::time::Duration;
use thalo_core::{parse_queries, Workspace};

const SCHEMA: &str = r#"2026-01-01T00:00Z define-entity lore "Knowledge about a subject"
  # Metadata
  subject: link ; "Who or what it is about"
  type: "fact" | "insight"
  related?: link[]
  # Sections
  Description
"#;

/// Generate a journal file with `entries` linked lore entries
fn generate_document(file: usize, entries: usize) -> String {
    let mut content = String::new();
    for i in 0..entries {
        let kind = if i % 3 == 0 { "insight" } else { "fact" };
        let related = if i > 0 {
            format!("  related: ^lore-{}-{}\n", file, i - 1)
        } else {
            String::new()
        };
        content.push_str(&format!(
            "2026-{:02}-{:02}T{:02}:{:02}Z create lore \"Entry {i}\" ^lore-{file}-{i} #bench\n  subject: ^self\n  type: {kind}\n{related}\n  # Description\n  Generated entry {i} of file {file}.\n\n",
            1 + file % 12,
            1 + i % 28,
            i % 24,
            file % 60,
        ));
    }
    content
}

fn create_workspace(files: usize, entries: usize) -> Workspace {
    let mut workspace = Workspace::new();
    workspace
        .add_document(SCHEMA, "schema.thalo")
        .expect("schema parses");
    for file in 0..files {
        workspace
            .add_document(&generate_document(file, entries), &format!("notes/{:03}.thalo", file))
            .expect("document parses");
    }
    workspace
}

/// Benchmark building a workspace from scratch
fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("workspace_build");
    group.warm_up_time(Duration::from_millis(500));
    group.measurement_time(Duration::from_secs(3));

    for files in [10, 50] {
        group.bench_with_input(BenchmarkId::new("files", files), &files, |b, &files| {
            b.iter(|| black_box(create_workspace(files, 20)));
        });
    }

    group.finish();
}

/// Benchmark single-document edits against a populated workspace
fn bench_updates(c: &mut Criterion) {
    let mut group = c.benchmark_group("workspace_updates");
    group.warm_up_time(Duration::from_millis(500));
    group.measurement_time(Duration::from_secs(3));

    // One character typed in the middle of a 200-entry file
    group.bench_function("edit_one_entry", |b| {
        let mut workspace = create_workspace(10, 200);
        let original = generate_document(0, 200);
        let edited = original.replacen("Entry 100\"", "Entry 100!\"", 1);
        let mut toggle = false;
        b.iter(|| {
            toggle = !toggle;
            let text = if toggle { &edited } else { &original };
            workspace
                .add_document(black_box(text), "notes/000.thalo")
                .expect("document parses");
        });
    });

    // Schema change invalidates every document
    group.bench_function("alter_schema", |b| {
        let mut workspace = create_workspace(50, 20);
        let altered = SCHEMA.replace("related?: link[]", "related?: link[]\n  mood?: string");
        let mut toggle = false;
        b.iter(|| {
            toggle = !toggle;
            let text = if toggle { altered.as_str() } else { SCHEMA };
            workspace
                .add_document(black_box(text), "schema.thalo")
                .expect("schema parses");
        });
    });

    group.finish();
}

/// Benchmark queries across the workspace
fn bench_query(c: &mut Criterion) {
    let mut group = c.benchmark_group("workspace_query");
    group.measurement_time(Duration::from_secs(2));

    let workspace = create_workspace(50, 20);
    let queries = parse_queries("lore where #bench and type = insight").expect("query parses");
    group.bench_function("tag_and_field_1000_entries", |b| {
        b.iter(|| black_box(workspace.query(black_box(&queries))));
    });

    group.finish();
}

criterion_group!(benches, bench_build, bench_updates, bench_query);
criterion_main!(benches);
