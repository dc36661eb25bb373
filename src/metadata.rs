//! Heuristic metadata extraction from judgment text.
//!
//! Case captions, decision dates, bench compositions, and reporter
//! citations follow loose conventions in the archive, so every field here
//! is best-effort pattern matching. A miss leaves the default in place;
//! this function never fails a record.

use std::sync::LazyLock;

use regex::Regex;

use crate::models::CaseMetadata;

pub const DEFAULT_TITLE: &str = "Unknown";
pub const DEFAULT_COURT: &str = "Supreme Court of India";

/// Citation lists are capped; beyond this the tail is noise from OCR
/// artifacts repeating the same few reporters.
const MAX_CITATIONS: usize = 30;

/// Caption with a date tail, e.g. `Ramesh vs Suresh on 4 July 2020`.
/// Lazy matching keeps the respondent from swallowing the `on <date>` part.
static CAPTION_DATED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([A-Z][A-Za-z\s]+?)\s+(?:vs?\.?|versus)\s+(.+?)\s+on\s+\d").unwrap()
});

/// Plain caption without a date tail.
static CAPTION_PLAIN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([A-Z][A-Za-z\s]+)\s+(?:vs?\.?|versus)\s+([A-Z][A-Za-z\s]+)").unwrap()
});

static DATE_EXPLICIT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:Decided on|Judgment dated)[\s:]+(\d{1,2}[-/]\d{1,2}[-/]\d{4})").unwrap()
});

static DATE_LONG_FORM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(\d{1,2}\s+(?:January|February|March|April|May|June|July|August|September|October|November|December)\s+\d{4})",
    )
    .unwrap()
});

static BENCH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(?:BENCH|CORAM)[\s:]+(.+?)(?:\n|JUDGMENT)").unwrap());

static CITATION_SCC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(\d{4}\)\s+\d+\s+SCC\s+\d+").unwrap());

static CITATION_AIR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"AIR\s+\d{4}\s+SC\s+\d+").unwrap());

/// Derives structured fields from raw judgment text. Total function:
/// unmatched patterns yield the defaults, never an error.
pub fn derive_metadata(text: &str) -> CaseMetadata {
    let mut meta = CaseMetadata {
        title: DEFAULT_TITLE.to_string(),
        court: DEFAULT_COURT.to_string(),
        date: None,
        bench: None,
        petitioner: None,
        respondent: None,
        case_number: None,
        citations: Vec::new(),
    };

    let caption_window = char_prefix(text, 1000);
    let caption = CAPTION_DATED
        .captures(caption_window)
        .or_else(|| CAPTION_PLAIN.captures(caption_window));
    if let Some(caps) = caption {
        let petitioner = caps[1].trim().to_string();
        let respondent = caps[2].trim().to_string();
        meta.title = format!("{} vs {}", petitioner, respondent);
        meta.petitioner = Some(petitioner);
        meta.respondent = Some(respondent);
    }

    let date_window = char_prefix(text, 2000);
    for pattern in [&*DATE_EXPLICIT, &*DATE_LONG_FORM] {
        if let Some(caps) = pattern.captures(date_window) {
            meta.date = Some(caps[1].to_string());
            break;
        }
    }

    if let Some(caps) = BENCH.captures(date_window) {
        meta.bench = Some(caps[1].trim().to_string());
    }

    meta.citations = collect_citations(text);
    meta
}

/// Union of both reporter formats over the whole text, deduplicated in
/// first-occurrence order, capped at [`MAX_CITATIONS`].
fn collect_citations(text: &str) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut citations = Vec::new();
    for pattern in [&*CITATION_SCC, &*CITATION_AIR] {
        for m in pattern.find_iter(text) {
            if seen.insert(m.as_str().to_string()) {
                citations.push(m.as_str().to_string());
            }
        }
    }
    citations.truncate(MAX_CITATIONS);
    citations
}

/// First `n` chars of `text` as a subslice (never splits a code point).
fn char_prefix(text: &str, n: usize) -> &str {
    match text.char_indices().nth(n) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caption_with_date_tail_trims_parties() {
        let meta = derive_metadata("Ramesh vs Suresh on 4 July 2020\nCivil Appeal No. 100");
        assert_eq!(meta.title, "Ramesh vs Suresh");
        assert_eq!(meta.petitioner.as_deref(), Some("Ramesh"));
        assert_eq!(meta.respondent.as_deref(), Some("Suresh"));
        assert_eq!(meta.date.as_deref(), Some("4 July 2020"));
    }

    #[test]
    fn plain_caption_matches_multi_word_parties() {
        let meta = derive_metadata("Karnataka Bank vs Union Of India, Civil Appeal 42 of 2002");
        assert_eq!(meta.title, "Karnataka Bank vs Union Of India");
        assert_eq!(meta.petitioner.as_deref(), Some("Karnataka Bank"));
        assert_eq!(meta.respondent.as_deref(), Some("Union Of India"));
    }

    #[test]
    fn versus_spelled_out_is_recognized() {
        let meta = derive_metadata("Ramesh versus Suresh on 4 July 2020");
        assert_eq!(meta.title, "Ramesh vs Suresh");
    }

    #[test]
    fn missing_caption_keeps_defaults() {
        let meta = derive_metadata("no caption anywhere in this text");
        assert_eq!(meta.title, DEFAULT_TITLE);
        assert_eq!(meta.court, DEFAULT_COURT);
        assert!(meta.petitioner.is_none());
        assert!(meta.respondent.is_none());
        assert!(meta.case_number.is_none());
    }

    #[test]
    fn explicit_date_wins_over_long_form() {
        let meta = derive_metadata("Decided on: 12-03-1997, reported 15 April 1997");
        assert_eq!(meta.date.as_deref(), Some("12-03-1997"));
    }

    #[test]
    fn date_matching_is_case_insensitive() {
        let meta = derive_metadata("judgment dated 5/11/2001");
        assert_eq!(meta.date.as_deref(), Some("5/11/2001"));
    }

    #[test]
    fn date_outside_window_is_ignored() {
        let mut text = "x".repeat(2100);
        text.push_str(" Decided on 01-01-1990");
        let meta = derive_metadata(&text);
        assert!(meta.date.is_none());
    }

    #[test]
    fn bench_terminates_at_newline() {
        let meta = derive_metadata("CORAM: S. H. Kapadia, K. S. Radhakrishnan\nJUDGMENT follows");
        assert_eq!(meta.bench.as_deref(), Some("S. H. Kapadia, K. S. Radhakrishnan"));
    }

    #[test]
    fn bench_terminates_at_judgment_token() {
        let meta = derive_metadata("BENCH: Dalveer Bhandari JUDGMENT");
        assert_eq!(meta.bench.as_deref(), Some("Dalveer Bhandari"));
    }

    #[test]
    fn citations_union_both_formats_dedup() {
        let text = "see (2005) 4 SCC 370 and AIR 1973 SC 1461, again (2005) 4 SCC 370";
        let meta = derive_metadata(text);
        assert_eq!(
            meta.citations,
            vec!["(2005) 4 SCC 370".to_string(), "AIR 1973 SC 1461".to_string()]
        );
    }

    #[test]
    fn citations_capped_at_thirty() {
        let mut text = String::new();
        for year in 1960..2000 {
            text.push_str(&format!("({}) 1 SCC {} ", year, year));
        }
        let meta = derive_metadata(&text);
        assert_eq!(meta.citations.len(), 30);
    }

    #[test]
    fn citations_found_beyond_metadata_windows() {
        let mut text = "Ramesh vs Suresh on 4 July 2020 ".to_string();
        text.push_str(&"word ".repeat(1000));
        text.push_str("AIR 1992 SC 1858");
        let meta = derive_metadata(&text);
        assert_eq!(meta.citations, vec!["AIR 1992 SC 1858".to_string()]);
    }
}
