//! Storage abstraction for the case corpus.
//!
//! The [`CaseStore`] trait defines every storage operation the extraction,
//! embedding, and retrieval stages need, so components take an injected
//! store handle instead of reaching for process globals. Implementations
//! must be `Send + Sync`.

pub mod memory;
pub mod sqlite;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::CaseRecord;

/// Abstract keyed collection of case records.
///
/// # Operations
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`upsert_case`](CaseStore::upsert_case) | Insert or update a record by `case_id` |
/// | [`set_embedding`](CaseStore::set_embedding) | Attach a vector to an existing record |
/// | [`get_case`](CaseStore::get_case) | Fetch one record by `case_id` |
/// | [`embedded_cases`](CaseStore::embedded_cases) | All records with vectors, optional court filter |
/// | [`cases_for_embedding`](CaseStore::cases_for_embedding) | Records to (re)embed |
/// | [`count_cases`](CaseStore::count_cases) / [`count_embedded`](CaseStore::count_embedded) | Corpus counters |
/// | [`sample_embedded`](CaseStore::sample_embedded) | Small sample for verification |
/// | [`ensure_indexes`](CaseStore::ensure_indexes) | Idempotent lookup indexes |
#[async_trait]
pub trait CaseStore: Send + Sync {
    /// Insert or update a record keyed by `case_id`. Only extraction-owned
    /// fields are written; an embedding already attached to the stored
    /// record survives re-extraction.
    async fn upsert_case(&self, record: &CaseRecord) -> Result<()>;

    /// Attach an embedding to an existing record, setting the vector, model
    /// tag, dimensionality, and generation timestamp together.
    async fn set_embedding(
        &self,
        case_id: &str,
        vector: &[f32],
        model: &str,
        dims: usize,
        generated_at: i64,
    ) -> Result<()>;

    /// Fetch a single record, `None` when the id is unknown.
    async fn get_case(&self, case_id: &str) -> Result<Option<CaseRecord>>;

    /// All records carrying a vector, optionally filtered by a
    /// case-insensitive court substring. Deterministic `case_id` order.
    async fn embedded_cases(&self, court: Option<&str>) -> Result<Vec<CaseRecord>>;

    /// Records selected for an embedding run: only those lacking a vector
    /// when `pending_only`, otherwise every record. Deterministic order.
    async fn cases_for_embedding(
        &self,
        pending_only: bool,
        limit: Option<usize>,
    ) -> Result<Vec<CaseRecord>>;

    async fn count_cases(&self) -> Result<u64>;

    async fn count_embedded(&self) -> Result<u64>;

    /// First `limit` embedded records, for read-only verification.
    async fn sample_embedded(&self, limit: usize) -> Result<Vec<CaseRecord>>;

    /// Creates the lookup indexes on `case_id` and `embedding_generated_at`.
    /// Safe to call repeatedly.
    async fn ensure_indexes(&self) -> Result<()>;

    /// Releases backing resources. Default is a no-op.
    async fn close(&self) {}
}
