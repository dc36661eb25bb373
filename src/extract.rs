//! Multi-strategy text extraction for judgment PDFs.
//!
//! Scanned court archives are wildly inconsistent: one decoder yields clean
//! text for a file where another silently produces a near-empty page. Each
//! strategy here decodes the same bytes a different way; the chain accepts
//! the first result clearing the minimum word count and otherwise falls
//! through to the next, most-permissive last.

use crate::models::ExtractionMethod;

/// Extraction error: every strategy either failed or produced too little
/// text. Carries the best word count seen so the caller can log it.
#[derive(Debug)]
pub enum ExtractError {
    InsufficientContent { words: usize },
}

impl std::fmt::Display for ExtractError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExtractError::InsufficientContent { words } => {
                write!(f, "insufficient extracted text (best strategy yielded {} words)", words)
            }
        }
    }
}

impl std::error::Error for ExtractError {}

/// Extracts plain text from PDF bytes via the fallback chain.
///
/// Returns the accepted text and the strategy that produced it. Strategy
/// errors are swallowed; only the quality gate decides acceptance. Pure
/// over bytes, no side effects.
pub fn extract_text(bytes: &[u8], min_words: usize) -> Result<(String, ExtractionMethod), ExtractError> {
    let strategies: [(ExtractionMethod, fn(&[u8]) -> Result<String, String>); 3] = [
        (ExtractionMethod::TextLayer, extract_text_layer),
        (ExtractionMethod::Layout, extract_layout),
        (ExtractionMethod::PageScan, extract_page_scan),
    ];

    let mut best_words = 0usize;
    for (method, strategy) in strategies {
        if let Ok(text) = strategy(bytes) {
            let words = text.split_whitespace().count();
            if words >= min_words {
                return Ok((text, method));
            }
            best_words = best_words.max(words);
        }
    }
    Err(ExtractError::InsufficientContent { words: best_words })
}

/// Page count for a PDF, as an independent operation: any parse failure
/// yields 0 rather than an error.
pub fn page_count(bytes: &[u8]) -> usize {
    match lopdf::Document::load_mem(bytes) {
        Ok(doc) => doc.get_pages().len(),
        Err(_) => 0,
    }
}

/// Strategy 1: structured text-layer read over the whole document.
fn extract_text_layer(bytes: &[u8]) -> Result<String, String> {
    let doc = lopdf::Document::load_mem(bytes).map_err(|e| e.to_string())?;
    let pages: Vec<u32> = doc.get_pages().keys().copied().collect();
    doc.extract_text(&pages).map_err(|e| e.to_string())
}

/// Strategy 2: layout-aware extraction (glyph positioning).
fn extract_layout(bytes: &[u8]) -> Result<String, String> {
    pdf_extract::extract_text_from_mem(bytes).map_err(|e| e.to_string())
}

/// Strategy 3: page-by-page scan. Pages that fail to decode are skipped
/// instead of failing the document, so partially corrupt files still
/// surrender whatever text they have.
fn extract_page_scan(bytes: &[u8]) -> Result<String, String> {
    let doc = lopdf::Document::load_mem(bytes).map_err(|e| e.to_string())?;
    let mut out = String::new();
    for page in doc.get_pages().keys() {
        if let Ok(text) = doc.extract_text(&[*page]) {
            if !text.is_empty() {
                out.push_str(&text);
                out.push('\n');
            }
        }
    }
    Ok(out)
}

/// Normalizes extracted text: whitespace runs collapse to single spaces,
/// characters outside the punctuation allow-list are dropped, literal
/// `Page <n>` artifacts are removed, and the result is trimmed.
pub fn clean_text(text: &str) -> String {
    use regex::Regex;
    use std::sync::LazyLock;

    static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
    static DISALLOWED: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r#"[^\w\s.,;:\-()\[\]/'"]"#).unwrap());
    static PAGE_MARK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"Page \d+").unwrap());

    let text = WHITESPACE.replace_all(text, " ");
    let text = DISALLOWED.replace_all(&text, "");
    let text = PAGE_MARK.replace_all(&text, "");
    text.trim().to_string()
}
