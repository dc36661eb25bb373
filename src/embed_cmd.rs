//! Batch embedding of extracted cases.
//!
//! Composes a weighted text for each case, embeds it in batches through the
//! configured client, and attaches the resulting vectors to the records.
//! A failed batch is reported and counted but never aborts the run, so a
//! long corpus pass can be resumed with `embed pending`.

use std::sync::Arc;

use anyhow::Result;

use crate::config::Config;
use crate::embedding::EmbeddingClient;
use crate::models::{CaseRecord, EmbedStats};
use crate::progress::{ProgressEvent, ProgressReporter};
use crate::store::CaseStore;

/// Records whose composed text trims below this are skipped, not embedded.
const MIN_EMBED_CHARS: usize = 50;

/// Maximum characters of composed text sent to the embedding model.
const MAX_EMBED_CHARS: usize = 5000;

/// Words of body text included in the composed embedding input.
const BODY_WORD_CAP: usize = 2000;

/// Embed cases in batches and store the vectors.
///
/// `resume == true` selects only cases with no stored vector (the normal
/// incremental mode); `resume == false` re-embeds every record, overwriting
/// vectors in place. Skipped records (composed text too short to be worth
/// a vector) are counted separately from failures.
pub async fn run_embed(
    config: &Config,
    store: Arc<dyn CaseStore>,
    client: &dyn EmbeddingClient,
    resume: bool,
    limit: Option<usize>,
    batch_size_override: Option<usize>,
    progress: &dyn ProgressReporter,
) -> Result<EmbedStats> {
    let mode = if resume { "pending" } else { "rebuild" };
    let batch_size = batch_size_override
        .unwrap_or(config.embedding.batch_size)
        .max(1);
    let model_name = client.model_name().to_string();

    let candidates = store.cases_for_embedding(resume, limit).await?;

    let mut stats = EmbedStats {
        total: candidates.len() as u64,
        ..Default::default()
    };

    if candidates.is_empty() {
        println!("embed {}", mode);
        if resume {
            println!("  all cases up to date");
        } else {
            println!("  no cases to embed");
        }
        return Ok(stats);
    }

    let mut prepared: Vec<(String, String)> = Vec::new();
    for record in &candidates {
        let text = prepare_embedding_text(record);
        if text.trim().chars().count() < MIN_EMBED_CHARS {
            stats.skipped += 1;
            continue;
        }
        prepared.push((record.case_id.clone(), text));
    }

    let prepared_total = prepared.len() as u64;

    for batch in prepared.chunks(batch_size) {
        let texts: Vec<String> = batch.iter().map(|(_, text)| text.clone()).collect();

        match client.embed(&texts).await {
            Ok(vectors) => {
                let now = chrono::Utc::now().timestamp();
                for ((case_id, _), vector) in batch.iter().zip(vectors.iter()) {
                    store
                        .set_embedding(case_id, vector, &model_name, client.dims(), now)
                        .await?;
                    stats.embedded += 1;
                }
            }
            Err(e) => {
                eprintln!("Warning: embedding batch failed: {}", e);
                stats.failed += batch.len() as u64;
            }
        }

        progress.report(ProgressEvent::Embedding {
            n: stats.embedded + stats.failed,
            total: prepared_total,
        });
    }

    // Index upkeep is best-effort; vectors are already stored.
    if let Err(e) = store.ensure_indexes().await {
        eprintln!("Warning: failed to ensure store indexes: {}", e);
    }

    println!("embed {}", mode);
    println!("  candidates: {}", stats.total);
    println!("  embedded: {}", stats.embedded);
    println!("  skipped: {}", stats.skipped);
    println!("  failed: {}", stats.failed);

    Ok(stats)
}

/// Print corpus embedding coverage and a sample vector.
pub async fn run_embed_verify(store: Arc<dyn CaseStore>) -> Result<()> {
    let total = store.count_cases().await?;
    let embedded = store.count_embedded().await?;
    let coverage = if total == 0 {
        0.0
    } else {
        embedded as f64 / total as f64 * 100.0
    };

    println!("embed verify");
    println!("  total cases: {}", total);
    println!("  embedded cases: {}", embedded);
    println!("  coverage: {:.2}%", coverage);

    if let Some(sample) = store.sample_embedded(1).await?.into_iter().next() {
        let title: String = sample.title.chars().take(50).collect();
        println!("  sample: {} ({})", sample.case_id, title);
        if let Some(vector) = &sample.embedding {
            println!("    dimension: {}", vector.len());
            if vector.len() >= 2 {
                println!("    first components: [{:.6}, {:.6}]", vector[0], vector[1]);
            }
        }
        if let Some(ts) = sample.embedding_generated_at {
            let when = chrono::DateTime::from_timestamp(ts, 0)
                .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
                .unwrap_or_else(|| ts.to_string());
            println!("    generated at: {}", when);
        }
    }

    Ok(())
}

/// Compose the text a case is embedded under.
///
/// The title is repeated three times so party names dominate the vector,
/// followed by the summary when present, the first 2000 words of body text,
/// and a court marker. The result is capped at 5000 characters.
pub fn prepare_embedding_text(record: &CaseRecord) -> String {
    let mut parts: Vec<String> = Vec::new();

    if !record.title.is_empty() && record.title != "Unknown" {
        parts.push(format!("{0}. {0}. {0}.", record.title));
    }

    if let Some(summary) = &record.summary {
        if !summary.is_empty() {
            parts.push(summary.clone());
        }
    }

    let body: Vec<&str> = record
        .body_text()
        .split_whitespace()
        .take(BODY_WORD_CAP)
        .collect();
    parts.push(body.join(" "));

    if !record.court.is_empty() {
        parts.push(format!("Court: {}", record.court));
    }

    truncate_to_chars(parts.join(" "), MAX_EMBED_CHARS)
}

/// Cut a string down to at most `max_chars` characters.
fn truncate_to_chars(mut text: String, max_chars: usize) -> String {
    if let Some((idx, _)) = text.char_indices().nth(max_chars) {
        text.truncate(idx);
    }
    text
}
