//! In-memory [`CaseStore`] implementation for tests and doubles.
//!
//! A `HashMap` behind `std::sync::RwLock`. Ordering guarantees match the
//! SQLite adapter: listings come back sorted by `case_id`.

use std::collections::HashMap;
use std::sync::RwLock;

use anyhow::{bail, Result};
use async_trait::async_trait;

use crate::models::CaseRecord;

use super::CaseStore;

#[derive(Default)]
pub struct MemoryCaseStore {
    cases: RwLock<HashMap<String, CaseRecord>>,
}

impl MemoryCaseStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn sorted(&self, mut records: Vec<CaseRecord>) -> Vec<CaseRecord> {
        records.sort_by(|a, b| a.case_id.cmp(&b.case_id));
        records
    }
}

#[async_trait]
impl CaseStore for MemoryCaseStore {
    async fn upsert_case(&self, record: &CaseRecord) -> Result<()> {
        let mut cases = self.cases.write().unwrap();
        let mut stored = record.clone();
        // Extraction owns its fields only; a previously attached embedding
        // survives re-extraction, same as the SQL upsert.
        if let Some(existing) = cases.get(&record.case_id) {
            stored.embedding = existing.embedding.clone();
            stored.embedding_model = existing.embedding_model.clone();
            stored.embedding_dim = existing.embedding_dim;
            stored.embedding_generated_at = existing.embedding_generated_at;
        }
        cases.insert(record.case_id.clone(), stored);
        Ok(())
    }

    async fn set_embedding(
        &self,
        case_id: &str,
        vector: &[f32],
        model: &str,
        dims: usize,
        generated_at: i64,
    ) -> Result<()> {
        let mut cases = self.cases.write().unwrap();
        match cases.get_mut(case_id) {
            Some(record) => {
                record.embedding = Some(vector.to_vec());
                record.embedding_model = Some(model.to_string());
                record.embedding_dim = Some(dims as i64);
                record.embedding_generated_at = Some(generated_at);
                Ok(())
            }
            None => bail!("case not found: {}", case_id),
        }
    }

    async fn get_case(&self, case_id: &str) -> Result<Option<CaseRecord>> {
        let cases = self.cases.read().unwrap();
        Ok(cases.get(case_id).cloned())
    }

    async fn embedded_cases(&self, court: Option<&str>) -> Result<Vec<CaseRecord>> {
        let cases = self.cases.read().unwrap();
        let filter_lower = court.map(|c| c.to_lowercase());
        let records: Vec<CaseRecord> = cases
            .values()
            .filter(|r| r.embedding.is_some())
            .filter(|r| match &filter_lower {
                Some(f) => r.court.to_lowercase().contains(f),
                None => true,
            })
            .cloned()
            .collect();
        Ok(self.sorted(records))
    }

    async fn cases_for_embedding(
        &self,
        pending_only: bool,
        limit: Option<usize>,
    ) -> Result<Vec<CaseRecord>> {
        let cases = self.cases.read().unwrap();
        let records: Vec<CaseRecord> = cases
            .values()
            .filter(|r| !pending_only || r.embedding.is_none())
            .cloned()
            .collect();
        let mut records = self.sorted(records);
        if let Some(limit) = limit {
            records.truncate(limit);
        }
        Ok(records)
    }

    async fn count_cases(&self) -> Result<u64> {
        Ok(self.cases.read().unwrap().len() as u64)
    }

    async fn count_embedded(&self) -> Result<u64> {
        let cases = self.cases.read().unwrap();
        Ok(cases.values().filter(|r| r.embedding.is_some()).count() as u64)
    }

    async fn sample_embedded(&self, limit: usize) -> Result<Vec<CaseRecord>> {
        let mut records = self.embedded_cases(None).await?;
        records.truncate(limit);
        Ok(records)
    }

    async fn ensure_indexes(&self) -> Result<()> {
        Ok(())
    }
}
