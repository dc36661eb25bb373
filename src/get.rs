//! Case retrieval by id.
//!
//! Fetches a stored case without its embedding vector. Used by both the
//! `lex get` CLI command and the `GET /case/{case_id}` HTTP endpoint.

use anyhow::{bail, Result};
use serde::Serialize;

use crate::store::CaseStore;

/// Full case payload minus the raw vector.
#[derive(Debug, Clone, Serialize)]
pub struct CaseDetails {
    pub case_id: String,
    pub source_file: String,
    pub title: String,
    pub court: String,
    pub date: Option<String>,
    pub bench: Option<String>,
    pub petitioner: Option<String>,
    pub respondent: Option<String>,
    pub case_number: Option<String>,
    pub citations: Vec<String>,
    pub summary: Option<String>,
    pub extraction_method: String,
    pub word_count: i64,
    pub char_count: i64,
    pub page_count: i64,
    pub extracted_at: String, // ISO8601
    pub embedded: bool,
    pub embedding_model: Option<String>,
    pub embedding_dim: Option<i64>,
    pub embedding_generated_at: Option<String>, // ISO8601
    pub text: String,
}

/// Core lookup returning structured data (used by CLI and server).
pub async fn get_case_details(store: &dyn CaseStore, case_id: &str) -> Result<CaseDetails> {
    let record = match store.get_case(case_id).await? {
        Some(record) => record,
        None => bail!("case not found: {}", case_id),
    };

    Ok(CaseDetails {
        case_id: record.case_id.clone(),
        source_file: record.source_file.clone(),
        title: record.title.clone(),
        court: record.court.clone(),
        date: record.date.clone(),
        bench: record.bench.clone(),
        petitioner: record.petitioner.clone(),
        respondent: record.respondent.clone(),
        case_number: record.case_number.clone(),
        citations: record.citations.clone(),
        summary: record.summary.clone(),
        extraction_method: record.extraction_method.as_str().to_string(),
        word_count: record.word_count,
        char_count: record.char_count,
        page_count: record.page_count,
        extracted_at: format_ts_iso(record.extracted_at),
        embedded: record.embedding.is_some(),
        embedding_model: record.embedding_model.clone(),
        embedding_dim: record.embedding_dim,
        embedding_generated_at: record.embedding_generated_at.map(format_ts_iso),
        text: record.body_text().to_string(),
    })
}

/// CLI entry point: looks up the case and prints to stdout.
pub async fn run_get(store: &dyn CaseStore, case_id: &str, json: bool) -> Result<()> {
    let details = match get_case_details(store, case_id).await {
        Ok(d) => d,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&details)?);
        return Ok(());
    }

    println!("--- Case ---");
    println!("id:           {}", details.case_id);
    println!("title:        {}", details.title);
    println!("court:        {}", details.court);
    if let Some(ref date) = details.date {
        println!("date:         {}", date);
    }
    if let Some(ref bench) = details.bench {
        println!("bench:        {}", bench);
    }
    if let Some(ref petitioner) = details.petitioner {
        println!("petitioner:   {}", petitioner);
    }
    if let Some(ref respondent) = details.respondent {
        println!("respondent:   {}", respondent);
    }
    if let Some(ref number) = details.case_number {
        println!("case number:  {}", number);
    }
    if !details.citations.is_empty() {
        println!("citations:    {}", details.citations.join("; "));
    }
    println!("source file:  {}", details.source_file);
    println!("method:       {}", details.extraction_method);
    println!("pages:        {}", details.page_count);
    println!("words:        {}", details.word_count);
    println!("extracted at: {}", details.extracted_at);
    match (&details.embedding_model, details.embedding_dim) {
        (Some(model), Some(dim)) => println!("embedding:    {} ({} dims)", model, dim),
        _ => println!("embedding:    none"),
    }
    println!();

    println!("--- Text ---");
    println!("{}", details.text);

    Ok(())
}

fn format_ts_iso(ts: i64) -> String {
    chrono::DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.format("%Y-%m-%dT%H:%M:%SZ").to_string())
        .unwrap_or_else(|| ts.to_string())
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
            raw_text: "raw judgment text".to_string(),
            cleaned_text: "cleaned judgment text".to_string(),
            extraction_method: ExtractionMethod::Layout,
            word_count: 3,
            char_count: 21,
            page_count: 2,
            title: "Kumar vs State".to_string(),
            court: "Supreme Court of India".to_string(),
            date: Some("04-07-2020".to_string()),
            bench: None,
            petitioner: Some("Kumar".to_string()),
            respondent: Some("State".to_string()),
            case_number: None,
            summary: None,
            citations: vec!["AIR 2020 SC 1".to_string()],
            extracted_at: 100,
            embedding: None,
            embedding_model: None,
            embedding_dim: None,
            embedding_generated_at: None,
        }
    }

    #[tokio::test]
    async fn details_map_record_fields() {
        let store = MemoryCaseStore::new();
        store.upsert_case(&record("k1")).await.unwrap();

        let details = get_case_details(&store, "k1").await.unwrap();
        assert_eq!(details.case_id, "k1");
        assert_eq!(details.source_file, "k1.pdf");
        assert_eq!(details.extraction_method, "layout");
        assert_eq!(details.text, "cleaned judgment text");
        assert_eq!(details.extracted_at, "1970-01-01T00:01:40Z");
        assert!(!details.embedded);
        assert_eq!(details.embedding_model, None);
    }

    #[tokio::test]
    async fn missing_case_fails() {
        let store = MemoryCaseStore::new();
        let err = get_case_details(&store, "ghost").await.unwrap_err();
        assert_eq!(err.to_string(), "case not found: ghost");
    }

    #[tokio::test]
    async fn embedded_case_reports_vector_metadata() {
        let store = MemoryCaseStore::new();
        store.upsert_case(&record("k2")).await.unwrap();
        store
            .set_embedding("k2", &[0.1, 0.2], "stub-model", 2, 170)
            .await
            .unwrap();

        let details = get_case_details(&store, "k2").await.unwrap();
        assert!(details.embedded);
        assert_eq!(details.embedding_model.as_deref(), Some("stub-model"));
        assert_eq!(details.embedding_dim, Some(2));
        assert_eq!(
            details.embedding_generated_at.as_deref(),
            Some("1970-01-01T00:02:50Z")
        );
    }

    #[tokio::test]
    async fn falls_back_to_raw_text() {
        let store = MemoryCaseStore::new();
        let mut rec = record("k3");
        rec.cleaned_text = String::new();
        store.upsert_case(&rec).await.unwrap();

        let details = get_case_details(&store, "k3").await.unwrap();
        assert_eq!(details.text, "raw judgment text");
    }
}
