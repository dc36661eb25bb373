//! Core data models used throughout lexcorpus.
//!
//! These types represent the case records, batch statistics, and search
//! results that flow through the extraction and retrieval pipeline.

use serde::{Deserialize, Serialize};

/// Extraction strategy that produced a record's text.
///
/// Strategies are tried in this order; the first one whose output clears
/// the minimum word count wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionMethod {
    /// Structured text-layer read over the whole document.
    TextLayer,
    /// Layout-aware extraction (glyph positioning before line assembly).
    Layout,
    /// Permissive page-by-page scan that skips unreadable pages.
    PageScan,
}

impl ExtractionMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractionMethod::TextLayer => "text_layer",
            ExtractionMethod::Layout => "layout",
            ExtractionMethod::PageScan => "page_scan",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "text_layer" => Some(ExtractionMethod::TextLayer),
            "layout" => Some(ExtractionMethod::Layout),
            "page_scan" => Some(ExtractionMethod::PageScan),
            _ => None,
        }
    }
}

/// Heuristic metadata derived from a judgment's raw text.
///
/// Every field is best-effort: unmatched patterns leave the documented
/// defaults in place rather than failing the record.
#[derive(Debug, Clone, PartialEq)]
pub struct CaseMetadata {
    pub title: String,
    pub court: String,
    pub date: Option<String>,
    pub bench: Option<String>,
    pub petitioner: Option<String>,
    pub respondent: Option<String>,
    pub case_number: Option<String>,
    pub citations: Vec<String>,
}

/// Persisted unit of work: one judgment document.
///
/// Created by the extraction pipeline (upsert keyed on `case_id`), later
/// mutated once by the embedding batcher to fill the embedding fields.
/// Timestamps are unix seconds.
#[derive(Debug, Clone)]
pub struct CaseRecord {
    pub case_id: String,
    pub source_file: String,
    pub raw_text: String,
    pub cleaned_text: String,
    pub extraction_method: ExtractionMethod,
    pub word_count: i64,
    pub char_count: i64,
    pub page_count: i64,
    pub title: String,
    pub court: String,
    pub date: Option<String>,
    pub bench: Option<String>,
    pub petitioner: Option<String>,
    pub respondent: Option<String>,
    pub case_number: Option<String>,
    pub summary: Option<String>,
    pub citations: Vec<String>,
    pub extracted_at: i64,
    pub embedding: Option<Vec<f32>>,
    pub embedding_model: Option<String>,
    pub embedding_dim: Option<i64>,
    pub embedding_generated_at: Option<i64>,
}

impl CaseRecord {
    /// Body text preferred for downstream composition: cleaned when
    /// available, raw otherwise.
    pub fn body_text(&self) -> &str {
        if self.cleaned_text.is_empty() {
            &self.raw_text
        } else {
            &self.cleaned_text
        }
    }
}

/// One failed document from an extraction run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionFailure {
    pub file: String,
    pub error: String,
}

/// Aggregate outcome of one extraction run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExtractionStats {
    pub total: u64,
    pub succeeded: u64,
    pub failed: u64,
    pub errors: Vec<ExtractionFailure>,
}

/// Aggregate outcome of one embedding run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct EmbedStats {
    pub total: u64,
    pub embedded: u64,
    pub skipped: u64,
    pub failed: u64,
}

/// A ranked search hit returned from the retrieval engine. Never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    pub case_id: String,
    pub title: String,
    pub court: String,
    pub date: Option<String>,
    pub petitioner: Option<String>,
    pub respondent: Option<String>,
    pub similarity_score: f32,
    pub similarity_percentage: String,
    pub summary: String,
    pub citations: Vec<String>,
}

/// Corpus-level counters reported by `stats` and the `/stats` endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct CorpusStats {
    pub total_cases: u64,
    pub searchable_cases: u64,
    pub coverage_percentage: String,
    pub embedding_model: String,
    pub embedding_dimension: i64,
}
