//! End-to-end tests driving the `lex` binary.
//!
//! Each test builds a throwaway workspace (config plus judgment PDFs
//! generated with lopdf), then runs real subcommands and asserts on stdout,
//! stderr, and exit codes. Embedding-dependent behavior stays in unit tests;
//! these configs keep the provider disabled so nothing downloads models or
//! touches the network.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use tempfile::TempDir;

fn run_lex(root: &Path, config: &Path, args: &[&str]) -> (String, String, bool) {
    let output = Command::new(env!("CARGO_BIN_EXE_lex"))
        .current_dir(root)
        .arg("--config")
        .arg(config)
        .arg("--progress")
        .arg("off")
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("failed to run lex: {}", e));
    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

/// One-page PDF whose text layer contains `text`.
fn pdf_with_text(text: &str) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });
    let content = Content {
        operations: vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 12.into()]),
            Operation::new("Td", vec![72.into(), 720.into()]),
            Operation::new("Tj", vec![Object::string_literal(text)]),
            Operation::new("ET", vec![]),
        ],
    };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
        "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        "Resources" => resources_id,
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    let mut buf = Vec::new();
    doc.save_to(&mut buf).unwrap();
    buf
}

/// Judgment-shaped text long enough to clear the minimum word count.
fn judgment_text() -> String {
    let mut text =
        String::from("Ramesh Kumar vs State of Kerala on 4 July 2020. Decided on 04-07-2020. ");
    for _ in 0..60 {
        text.push_str(
            "The appeal raises questions about the scope of anticipatory bail protection. ",
        );
    }
    text
}

/// Workspace with a judgments directory and a config whose embedding
/// provider is disabled.
fn setup_corpus_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();
    fs::create_dir_all(root.join("judgments")).unwrap();

    let config_content = format!(
        r#"[store]
db_path = "{0}/lexcorpus.db"

[extraction]
source_dir = "{0}/judgments"
min_words = 200
concurrency = 2
error_log_dir = "{0}"

[embedding]
provider = "disabled"

[retrieval]
top_k = 5
"#,
        root.display()
    );
    fs::write(root.join("lexcorpus.toml"), config_content).unwrap();

    (tmp, root.join("lexcorpus.toml"))
}

#[test]
fn init_writes_config_and_database() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    let config_path = root.join("lexcorpus.toml");

    let (stdout, stderr, success) = run_lex(root, &config_path, &["init"]);
    assert!(success, "init failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("created"), "{}", stdout);
    assert!(stdout.contains("ok"), "{}", stdout);
    assert!(config_path.exists(), "starter config should be written");
    assert!(
        root.join("lexcorpus.db").exists(),
        "database should be created next to the config"
    );

    // Second run leaves the existing config alone.
    let (stdout, _, success) = run_lex(root, &config_path, &["init"]);
    assert!(success);
    assert!(stdout.contains("exists"), "{}", stdout);
}

#[test]
fn extract_reports_counts_and_failures() {
    let (tmp, config_path) = setup_corpus_env();
    let root = tmp.path();
    let judgments = root.join("judgments");
    fs::write(
        judgments.join("kumar_v_kerala_2020.pdf"),
        pdf_with_text(&judgment_text()),
    )
    .unwrap();
    fs::write(
        judgments.join("singh_v_union_2019.pdf"),
        pdf_with_text(&judgment_text()),
    )
    .unwrap();
    fs::write(judgments.join("broken.pdf"), b"not a pdf at all").unwrap();

    let (stdout, stderr, success) = run_lex(root, &config_path, &["extract"]);
    assert!(
        success,
        "extract failed: stdout={}, stderr={}",
        stdout, stderr
    );
    assert!(stdout.contains("documents found: 3"), "{}", stdout);
    assert!(stdout.contains("extracted: 2"), "{}", stdout);
    assert!(stdout.contains("failed: 1"), "{}", stdout);
    assert!(stdout.contains("ok"), "{}", stdout);
    assert!(
        stderr.contains("broken.pdf"),
        "warning should name the failing file: {}",
        stderr
    );

    let log = fs::read_to_string(root.join("extraction_errors.json")).unwrap();
    let entries: serde_json::Value = serde_json::from_str(&log).unwrap();
    assert_eq!(entries.as_array().unwrap().len(), 1);
    assert_eq!(entries[0]["file"], "broken.pdf");
}

#[test]
fn repeated_extract_keeps_one_record_per_case() {
    let (tmp, config_path) = setup_corpus_env();
    let root = tmp.path();
    fs::write(
        root.join("judgments/solo.pdf"),
        pdf_with_text(&judgment_text()),
    )
    .unwrap();

    let (_, _, success) = run_lex(root, &config_path, &["extract"]);
    assert!(success);
    let (_, _, success) = run_lex(root, &config_path, &["extract"]);
    assert!(success);

    let (stats_out, _, success) = run_lex(root, &config_path, &["stats"]);
    assert!(success);
    assert!(stats_out.contains("total cases: 1"), "{}", stats_out);
}

#[test]
fn extract_respects_limit() {
    let (tmp, config_path) = setup_corpus_env();
    let root = tmp.path();
    fs::write(root.join("judgments/a.pdf"), pdf_with_text(&judgment_text())).unwrap();
    fs::write(root.join("judgments/b.pdf"), pdf_with_text(&judgment_text())).unwrap();

    let (stdout, _, success) = run_lex(root, &config_path, &["extract", "--limit", "1"]);
    assert!(success, "{}", stdout);
    assert!(stdout.contains("documents found: 1"), "{}", stdout);
    assert!(stdout.contains("extracted: 1"), "{}", stdout);

    // Deterministic ordering keeps the lexicographically first file.
    let (_, _, success) = run_lex(root, &config_path, &["get", "a"]);
    assert!(success);
    let (_, _, success) = run_lex(root, &config_path, &["get", "b"]);
    assert!(!success);
}

#[test]
fn short_documents_are_rejected() {
    let (tmp, config_path) = setup_corpus_env();
    let root = tmp.path();
    fs::write(
        root.join("judgments/thin.pdf"),
        pdf_with_text("Too short to qualify as a judgment."),
    )
    .unwrap();

    let (stdout, _, success) = run_lex(root, &config_path, &["extract"]);
    assert!(success, "{}", stdout);
    assert!(stdout.contains("extracted: 0"), "{}", stdout);
    assert!(stdout.contains("failed: 1"), "{}", stdout);

    let log = fs::read_to_string(root.join("extraction_errors.json")).unwrap();
    assert!(log.contains("thin.pdf"), "{}", log);
}

#[test]
fn get_prints_case_details() {
    let (tmp, config_path) = setup_corpus_env();
    let root = tmp.path();
    fs::write(
        root.join("judgments/kumar_v_kerala_2020.pdf"),
        pdf_with_text(&judgment_text()),
    )
    .unwrap();
    run_lex(root, &config_path, &["extract"]);

    let (stdout, _, success) = run_lex(root, &config_path, &["get", "kumar_v_kerala_2020"]);
    assert!(success, "{}", stdout);
    assert!(stdout.contains("--- Case ---"), "{}", stdout);
    assert!(
        stdout.contains("Ramesh Kumar vs State of Kerala"),
        "{}",
        stdout
    );
    assert!(stdout.contains("Supreme Court of India"), "{}", stdout);
    assert!(stdout.contains("embedding:    none"), "{}", stdout);

    let (json_out, _, success) = run_lex(
        root,
        &config_path,
        &["get", "kumar_v_kerala_2020", "--json"],
    );
    assert!(success);
    let v: serde_json::Value = serde_json::from_str(&json_out).unwrap();
    assert_eq!(v["case_id"], "kumar_v_kerala_2020");
    assert_eq!(v["source_file"], "kumar_v_kerala_2020.pdf");
    assert_eq!(v["embedded"], false);
}

#[test]
fn get_unknown_case_exits_nonzero() {
    let (tmp, config_path) = setup_corpus_env();
    let root = tmp.path();

    let (_, stderr, success) = run_lex(root, &config_path, &["get", "ghost"]);
    assert!(!success, "get should fail for an unknown id");
    assert!(stderr.contains("case not found: ghost"), "{}", stderr);
}

#[test]
fn stats_reports_corpus_counters() {
    let (tmp, config_path) = setup_corpus_env();
    let root = tmp.path();
    fs::write(root.join("judgments/a.pdf"), pdf_with_text(&judgment_text())).unwrap();
    fs::write(root.join("judgments/b.pdf"), pdf_with_text(&judgment_text())).unwrap();
    run_lex(root, &config_path, &["extract"]);

    let (stdout, _, success) = run_lex(root, &config_path, &["stats"]);
    assert!(success, "{}", stdout);
    assert!(stdout.contains("total cases: 2"), "{}", stdout);
    assert!(stdout.contains("searchable: 0 / 2 (0.00%)"), "{}", stdout);

    let (json_out, _, success) = run_lex(root, &config_path, &["stats", "--json"]);
    assert!(success);
    let v: serde_json::Value = serde_json::from_str(&json_out).unwrap();
    assert_eq!(v["total_cases"], 2);
    assert_eq!(v["searchable_cases"], 0);
    assert_eq!(v["coverage_percentage"], "0.00%");
    assert_eq!(v["embedding_model"], "all-MiniLM-L6-v2");
}

#[test]
fn embed_verify_works_without_a_provider() {
    let (tmp, config_path) = setup_corpus_env();
    let root = tmp.path();
    fs::write(root.join("judgments/a.pdf"), pdf_with_text(&judgment_text())).unwrap();
    run_lex(root, &config_path, &["extract"]);

    let (stdout, stderr, success) = run_lex(root, &config_path, &["embed", "verify"]);
    assert!(success, "stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("embed verify"), "{}", stdout);
    assert!(stdout.contains("total cases: 1"), "{}", stdout);
}

#[test]
fn search_fails_fast_when_provider_disabled() {
    let (tmp, config_path) = setup_corpus_env();
    let root = tmp.path();

    let (_, stderr, success) = run_lex(root, &config_path, &["search", "anticipatory bail"]);
    assert!(!success, "search should refuse without a provider");
    assert!(stderr.contains("disabled"), "{}", stderr);
}

#[test]
fn embed_fails_fast_when_provider_disabled() {
    let (tmp, config_path) = setup_corpus_env();
    let root = tmp.path();

    let (_, stderr, success) = run_lex(root, &config_path, &["embed", "pending"]);
    assert!(!success, "embed should refuse without a provider");
    assert!(stderr.contains("disabled"), "{}", stderr);
}

#[test]
fn similar_uses_stored_vectors_not_the_provider() {
    let (tmp, config_path) = setup_corpus_env();
    let root = tmp.path();
    fs::write(root.join("judgments/a.pdf"), pdf_with_text(&judgment_text())).unwrap();
    run_lex(root, &config_path, &["extract"]);

    // The provider is disabled; the failure must be about the missing
    // vector, proving similar never constructs an embedding client.
    let (_, stderr, success) = run_lex(root, &config_path, &["similar", "a"]);
    assert!(!success);
    assert!(stderr.contains("case has no embedding: a"), "{}", stderr);
    assert!(!stderr.contains("disabled"), "{}", stderr);
}

#[test]
fn config_rejects_unknown_provider() {
    let (tmp, config_path) = setup_corpus_env();
    let root = tmp.path();
    let bad = fs::read_to_string(&config_path)
        .unwrap()
        .replace("provider = \"disabled\"", "provider = \"quantum\"");
    fs::write(&config_path, bad).unwrap();

    let (_, stderr, success) = run_lex(root, &config_path, &["stats"]);
    assert!(!success, "config validation should fail the run");
    assert!(stderr.contains("Unknown embedding provider"), "{}", stderr);
}
