//! Extraction pipeline orchestration.
//!
//! Coordinates the corpus flow: scan → extract → clean → metadata → store.
//! One document's failure never aborts the batch; failures are collected,
//! reported in the run summary, and written to an `extraction_errors.json`
//! artifact for later inspection.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use tokio::sync::Semaphore;
use walkdir::WalkDir;

use crate::config::Config;
use crate::extract;
use crate::metadata;
use crate::models::{CaseRecord, ExtractionFailure, ExtractionStats};
use crate::progress::{ProgressEvent, ProgressReporter};
use crate::store::CaseStore;

/// Name of the error artifact written after a run with failures.
pub const ERROR_LOG_NAME: &str = "extraction_errors.json";

/// Run the extraction pipeline over the configured source directory.
///
/// Scans for documents matching the include patterns, extracts and upserts
/// each one under a bounded worker pool, and returns the aggregate stats.
/// Upserts are keyed on `case_id`, so re-running over the same corpus
/// refreshes records in place without stripping existing embeddings.
pub async fn run_extract(
    config: &Config,
    store: Arc<dyn CaseStore>,
    source: Option<PathBuf>,
    limit: Option<usize>,
    progress: &dyn ProgressReporter,
) -> Result<ExtractionStats> {
    let source_dir = source.unwrap_or_else(|| config.extraction.source_dir.clone());

    progress.report(ProgressEvent::Scanning {
        dir: source_dir.display().to_string(),
    });

    let mut files = scan_source_dir(&source_dir, &config.extraction.include)?;
    if let Some(lim) = limit {
        files.truncate(lim);
    }

    let mut stats = ExtractionStats {
        total: files.len() as u64,
        ..Default::default()
    };

    // Bound the number of in-flight documents; each worker holds a permit
    // for the duration of its read + decode + upsert.
    let semaphore = Arc::new(Semaphore::new(config.extraction.concurrency.max(1)));
    let mut handles = Vec::with_capacity(files.len());

    for path in files {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        let sem = Arc::clone(&semaphore);
        let store = Arc::clone(&store);
        let min_words = config.extraction.min_words;

        let handle = tokio::spawn(async move {
            let _permit = sem
                .acquire()
                .await
                .map_err(|_| "worker pool closed".to_string())?;
            process_document(&path, min_words, store)
                .await
                .map_err(|e| format!("{:#}", e))
        });
        handles.push((file_name, handle));
    }

    let total = stats.total;
    let mut done = 0u64;

    for (file, handle) in handles {
        let outcome = match handle.await {
            Ok(result) => result,
            Err(e) => Err(format!("extraction task panicked: {}", e)),
        };

        done += 1;
        progress.report(ProgressEvent::Extracting { n: done, total });

        match outcome {
            Ok(()) => stats.succeeded += 1,
            Err(error) => {
                eprintln!("Warning: failed to extract {}: {}", file, error);
                stats.failed += 1;
                stats.errors.push(ExtractionFailure { file, error });
            }
        }
    }

    let mut error_log: Option<PathBuf> = None;
    if !stats.errors.is_empty() {
        let path = write_error_log(&config.extraction.error_log_dir, &stats.errors)?;
        error_log = Some(path);
    }

    println!("extract {}", source_dir.display());
    println!("  documents found: {}", stats.total);
    println!("  extracted: {}", stats.succeeded);
    println!("  failed: {}", stats.failed);
    if let Some(path) = &error_log {
        println!("  error log: {}", path.display());
    }
    println!("ok");

    Ok(stats)
}

/// Walk the source directory and collect files matching the include globs.
///
/// Paths are matched relative to the source directory and returned sorted,
/// so a run processes the corpus in a deterministic order.
fn scan_source_dir(source_dir: &Path, include: &[String]) -> Result<Vec<PathBuf>> {
    if !source_dir.exists() {
        bail!("Source directory does not exist: {}", source_dir.display());
    }

    let include_set = build_globset(include)?;
    let mut files = Vec::new();

    for entry in WalkDir::new(source_dir) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let relative = path.strip_prefix(source_dir).unwrap_or(path);
        let rel_str = relative.to_string_lossy().to_string();

        if !include_set.is_match(&rel_str) {
            continue;
        }

        files.push(path.to_path_buf());
    }

    // Sort for deterministic ordering
    files.sort();

    Ok(files)
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}

/// Extract one document and upsert the resulting record.
async fn process_document(
    path: &Path,
    min_words: usize,
    store: Arc<dyn CaseStore>,
) -> Result<()> {
    let path = path.to_path_buf();

    // PDF decoding is CPU-bound; keep it off the async runtime threads.
    let record = tokio::task::spawn_blocking(move || build_record(&path, min_words)).await??;

    store.upsert_case(&record).await
}

/// Read, extract, clean, and annotate a single document into a record.
///
/// Metadata heuristics run over the raw extracted text; word and character
/// counts are computed over the cleaned text.
fn build_record(path: &Path, min_words: usize) -> Result<CaseRecord> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("failed to read {}", path.display()))?;

    let (raw_text, method) = extract::extract_text(&bytes, min_words)?;
    let cleaned_text = extract::clean_text(&raw_text);
    let meta = metadata::derive_metadata(&raw_text);
    let pages = extract::page_count(&bytes);

    let case_id = path
        .file_stem()
        .unwrap_or(path.as_os_str())
        .to_string_lossy()
        .to_string();
    let source_file = path
        .file_name()
        .unwrap_or(path.as_os_str())
        .to_string_lossy()
        .to_string();

    let word_count = cleaned_text.split_whitespace().count() as i64;
    let char_count = cleaned_text.chars().count() as i64;

    Ok(CaseRecord {
        case_id,
        source_file,
        raw_text,
        cleaned_text,
        extraction_method: method,
        word_count,
        char_count,
        page_count: pages as i64,
        title: meta.title,
        court: meta.court,
        date: meta.date,
        bench: meta.bench,
        petitioner: meta.petitioner,
        respondent: meta.respondent,
        case_number: meta.case_number,
        summary: None,
        citations: meta.citations,
        extracted_at: chrono::Utc::now().timestamp(),
        embedding: None,
        embedding_model: None,
        embedding_dim: None,
        embedding_generated_at: None,
    })
}

/// Write the per-file failures as a pretty-printed JSON array artifact.
fn write_error_log(dir: &Path, errors: &[ExtractionFailure]) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create error log directory {}", dir.display()))?;

    let path = dir.join(ERROR_LOG_NAME);
    let json = serde_json::to_string_pretty(errors)?;
    std::fs::write(&path, json)
        .with_context(|| format!("failed to write error log {}", path.display()))?;

    Ok(path)
}
