//! Exact cosine-similarity retrieval over embedded cases.
//!
//! Every embedded record is scored against the query vector in memory, so
//! results are exact rather than approximate. Records embedded under a
//! different model than the active one still participate (a dimension
//! mismatch scores 0.0) but trigger a one-time warning.

use anyhow::{bail, Result};

use crate::embedding::{self, EmbeddingClient};
use crate::models::{CaseRecord, SearchResult};
use crate::store::CaseStore;

/// Words of body text carried into a result's summary excerpt.
const SUMMARY_WORD_CAP: usize = 200;

/// Citations carried per result.
const MAX_RESULT_CITATIONS: usize = 5;

/// Embed a free-text query and rank the corpus against it.
///
/// `court` restricts candidates to records whose court contains the given
/// substring (case-insensitive). Returns at most `top_k` results, best first.
pub async fn search_by_text(
    store: &dyn CaseStore,
    client: &dyn EmbeddingClient,
    query: &str,
    top_k: usize,
    court: Option<&str>,
) -> Result<Vec<SearchResult>> {
    let query_vec = embedding::embed_query(client, query).await?;
    let candidates = store.embedded_cases(court).await?;

    Ok(rank_candidates(
        &query_vec,
        &candidates,
        Some(client.model_name()),
        None,
        top_k,
    ))
}

/// Rank the corpus against a stored case's own vector.
///
/// The source case is excluded from its results. Errors distinguish an
/// unknown id from a known case that was never embedded.
pub async fn search_by_case(
    store: &dyn CaseStore,
    case_id: &str,
    top_k: usize,
    court: Option<&str>,
) -> Result<Vec<SearchResult>> {
    let source = store
        .get_case(case_id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("case not found: {}", case_id))?;

    let Some(query_vec) = source.embedding.clone() else {
        bail!("case has no embedding: {}", case_id);
    };

    let candidates = store.embedded_cases(court).await?;

    Ok(rank_candidates(
        &query_vec,
        &candidates,
        source.embedding_model.as_deref(),
        Some(case_id),
        top_k,
    ))
}

/// Score, sort, and truncate candidates against a query vector.
///
/// The sort is stable and candidates arrive in `case_id` order, so equal
/// scores tie-break deterministically.
fn rank_candidates(
    query_vec: &[f32],
    candidates: &[CaseRecord],
    expect_model: Option<&str>,
    exclude: Option<&str>,
    top_k: usize,
) -> Vec<SearchResult> {
    let mut warned = false;
    let mut scored: Vec<(f32, &CaseRecord)> = Vec::new();

    for record in candidates {
        if exclude == Some(record.case_id.as_str()) {
            continue;
        }
        let Some(vector) = &record.embedding else {
            continue;
        };

        if let (Some(expected), Some(stored)) = (expect_model, record.embedding_model.as_deref()) {
            if stored != expected && !warned {
                eprintln!(
                    "Warning: stored embeddings use model '{}' but this query uses '{}'; run `lex embed rebuild`",
                    stored, expected
                );
                warned = true;
            }
        }

        let score = embedding::cosine_similarity(query_vec, vector);
        scored.push((score, record));
    }

    scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
    scored.truncate(top_k);

    scored
        .into_iter()
        .map(|(score, record)| to_search_result(record, score))
        .collect()
}

fn to_search_result(record: &CaseRecord, score: f32) -> SearchResult {
    let mut citations = record.citations.clone();
    citations.truncate(MAX_RESULT_CITATIONS);

    SearchResult {
        case_id: record.case_id.clone(),
        title: record.title.clone(),
        court: record.court.clone(),
        date: record.date.clone(),
        petitioner: record.petitioner.clone(),
        respondent: record.respondent.clone(),
        similarity_score: score,
        similarity_percentage: format!("{:.2}%", score * 100.0),
        summary: excerpt_summary(record),
        citations,
    }
}

/// First 200 words of body text, with a trailing ellipsis when truncated.
fn excerpt_summary(record: &CaseRecord) -> String {
    let text = record.body_text();
    if text.is_empty() {
        return "No summary available".to_string();
    }

    let words: Vec<&str> = text.split_whitespace().collect();
    let mut summary = words[..words.len().min(SUMMARY_WORD_CAP)].join(" ");
    if words.len() > SUMMARY_WORD_CAP {
        summary.push_str("...");
    }
    summary
}

/// CLI entry: search by free text and print results.
pub async fn run_search(
    store: &dyn CaseStore,
    client: &dyn EmbeddingClient,
    query: &str,
    top_k: usize,
    court: Option<&str>,
    json: bool,
) -> Result<()> {
    if query.trim().is_empty() {
        println!("No results.");
        return Ok(());
    }

    let results = search_by_text(store, client, query, top_k, court).await?;
    print_results(&results, json)
}

/// CLI entry: find cases similar to a stored case and print results.
pub async fn run_similar(
    store: &dyn CaseStore,
    case_id: &str,
    top_k: usize,
    court: Option<&str>,
    json: bool,
) -> Result<()> {
    let results = search_by_case(store, case_id, top_k, court).await?;
    print_results(&results, json)
}

fn print_results(results: &[SearchResult], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(results)?);
        return Ok(());
    }

    if results.is_empty() {
        println!("No results.");
        return Ok(());
    }

    for (i, result) in results.iter().enumerate() {
        println!(
            "{}. [{}] {}",
            i + 1,
            result.similarity_percentage,
            result.title
        );
        println!("    court: {}", result.court);
        if let Some(date) = &result.date {
            println!("    date: {}", date);
        }
        if !result.citations.is_empty() {
            println!("    citations: {}", result.citations.join("; "));
        }
        let excerpt: String = result.summary.chars().take(240).collect();
        println!("    excerpt: \"{}\"", excerpt.trim());
        println!("    id: {}", result.case_id);
        println!();
    }

    Ok(())
}
