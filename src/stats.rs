//! Corpus statistics and coverage overview.
//!
//! Provides a quick summary of what's indexed: case counts, embedding
//! coverage, and the active model. Used by `lex stats` and the `/stats`
//! endpoint to give confidence that extraction and embedding runs worked.

use anyhow::Result;

use crate::config::Config;
use crate::models::CorpusStats;
use crate::store::CaseStore;

/// Collect corpus-level counters (used by CLI and server).
pub async fn corpus_stats(store: &dyn CaseStore, config: &Config) -> Result<CorpusStats> {
    let total_cases = store.count_cases().await?;
    let searchable_cases = store.count_embedded().await?;

    let coverage = if total_cases > 0 {
        searchable_cases as f64 / total_cases as f64 * 100.0
    } else {
        0.0
    };

    Ok(CorpusStats {
        total_cases,
        searchable_cases,
        coverage_percentage: format!("{:.2}%", coverage),
        embedding_model: config.embedding.model.clone(),
        embedding_dimension: config.embedding.dims as i64,
    })
}

/// Run the stats command: query the store and print a summary.
pub async fn run_stats(store: &dyn CaseStore, config: &Config, json: bool) -> Result<()> {
    let stats = corpus_stats(store, config).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    let db_size = std::fs::metadata(&config.store.db_path)
        .map(|m| m.len())
        .unwrap_or(0);

    println!("stats");
    println!(
        "  database: {} ({})",
        config.store.db_path.display(),
        format_bytes(db_size)
    );
    println!("  total cases: {}", stats.total_cases);
    println!(
        "  searchable: {} / {} ({})",
        stats.searchable_cases, stats.total_cases, stats.coverage_percentage
    );
    println!("  model: {}", stats.embedding_model);
    println!("  dimension: {}", stats.embedding_dimension);

    Ok(())
}

/// Format a byte count as a human-readable string.
fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.2} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CaseRecord, ExtractionMethod};
    use crate::store::memory::MemoryCaseStore;

    fn record(case_id: &str) -> CaseRecord {
        CaseRecord {
            case_id: case_id.to_string(),
            source_file: format!("{}.pdf", case_id),
            raw_text: "text".to_string(),
            cleaned_text: "text".to_string(),
            extraction_method: ExtractionMethod::TextLayer,
            word_count: 1,
            char_count: 4,
            page_count: 1,
            title: "Unknown".to_string(),
            court: "Supreme Court of India".to_string(),
            date: None,
            bench: None,
            petitioner: None,
            respondent: None,
            case_number: None,
            summary: None,
            citations: Vec::new(),
            extracted_at: 0,
            embedding: None,
            embedding_model: None,
            embedding_dim: None,
            embedding_generated_at: None,
        }
    }

    #[tokio::test]
    async fn coverage_formats_two_decimals() {
        let store = MemoryCaseStore::new();
        for i in 0..10 {
            store.upsert_case(&record(&format!("c{}", i))).await.unwrap();
        }
        for i in 0..7 {
            store
                .set_embedding(&format!("c{}", i), &[1.0], "m", 1, 100)
                .await
                .unwrap();
        }

        let stats = corpus_stats(&store, &Config::default()).await.unwrap();
        assert_eq!(stats.total_cases, 10);
        assert_eq!(stats.searchable_cases, 7);
        assert_eq!(stats.coverage_percentage, "70.00%");
    }

    #[tokio::test]
    async fn empty_corpus_reports_zero_coverage() {
        let store = MemoryCaseStore::new();
        let stats = corpus_stats(&store, &Config::default()).await.unwrap();
        assert_eq!(stats.total_cases, 0);
        assert_eq!(stats.coverage_percentage, "0.00%");
    }

    #[tokio::test]
    async fn model_and_dimension_come_from_config() {
        let store = MemoryCaseStore::new();
        let mut config = Config::default();
        config.embedding.model = "bge-small-en-v1.5".to_string();
        config.embedding.dims = 384;

        let stats = corpus_stats(&store, &config).await.unwrap();
        assert_eq!(stats.embedding_model, "bge-small-en-v1.5");
        assert_eq!(stats.embedding_dimension, 384);
    }

    #[test]
    fn bytes_format_scales() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.0 KB");
        assert_eq!(format_bytes(5 * 1024 * 1024), "5.0 MB");
    }
}
