//! SQLite-backed [`CaseStore`].
//!
//! One `cases` table keyed by `case_id`, vectors as little-endian f32
//! BLOBs, citations as a JSON array string. The schema bootstrap runs on
//! open and is idempotent.

use std::path::Path;
use std::str::FromStr;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;

use crate::embedding::{blob_to_vec, vec_to_blob};
use crate::models::{CaseRecord, ExtractionMethod};

use super::CaseStore;

pub struct SqliteCaseStore {
    pool: SqlitePool,
}

impl SqliteCaseStore {
    /// Opens (creating if missing) the database at `path` and bootstraps
    /// the schema.
    pub async fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("creating {}", parent.display()))?;
            }
        }

        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", path.display()))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .with_context(|| format!("opening case store at {}", path.display()))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS cases (
                case_id TEXT PRIMARY KEY,
                source_file TEXT NOT NULL,
                raw_text TEXT NOT NULL,
                cleaned_text TEXT NOT NULL,
                extraction_method TEXT NOT NULL,
                word_count INTEGER NOT NULL,
                char_count INTEGER NOT NULL,
                page_count INTEGER NOT NULL,
                title TEXT NOT NULL,
                court TEXT NOT NULL,
                date TEXT,
                bench TEXT,
                petitioner TEXT,
                respondent TEXT,
                case_number TEXT,
                summary TEXT,
                citations TEXT NOT NULL DEFAULT '[]',
                extracted_at INTEGER NOT NULL,
                embedding BLOB,
                embedding_model TEXT,
                embedding_dim INTEGER,
                embedding_generated_at INTEGER
            )
            "#,
        )
        .execute(&pool)
        .await?;

        Ok(Self { pool })
    }
}

fn row_to_record(row: &SqliteRow) -> CaseRecord {
    let method: String = row.get("extraction_method");
    let citations_json: String = row.get("citations");
    let blob: Option<Vec<u8>> = row.get("embedding");
    CaseRecord {
        case_id: row.get("case_id"),
        source_file: row.get("source_file"),
        raw_text: row.get("raw_text"),
        cleaned_text: row.get("cleaned_text"),
        extraction_method: ExtractionMethod::parse(&method)
            .unwrap_or(ExtractionMethod::TextLayer),
        word_count: row.get("word_count"),
        char_count: row.get("char_count"),
        page_count: row.get("page_count"),
        title: row.get("title"),
        court: row.get("court"),
        date: row.get("date"),
        bench: row.get("bench"),
        petitioner: row.get("petitioner"),
        respondent: row.get("respondent"),
        case_number: row.get("case_number"),
        summary: row.get("summary"),
        citations: serde_json::from_str(&citations_json).unwrap_or_default(),
        extracted_at: row.get("extracted_at"),
        embedding: blob.map(|b| blob_to_vec(&b)),
        embedding_model: row.get("embedding_model"),
        embedding_dim: row.get("embedding_dim"),
        embedding_generated_at: row.get("embedding_generated_at"),
    }
}

#[async_trait]
impl CaseStore for SqliteCaseStore {
    async fn upsert_case(&self, record: &CaseRecord) -> Result<()> {
        let citations_json = serde_json::to_string(&record.citations)?;

        sqlx::query(
            r#"
            INSERT INTO cases (
                case_id, source_file, raw_text, cleaned_text, extraction_method,
                word_count, char_count, page_count, title, court, date, bench,
                petitioner, respondent, case_number, summary, citations, extracted_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(case_id) DO UPDATE SET
                source_file = excluded.source_file,
                raw_text = excluded.raw_text,
                cleaned_text = excluded.cleaned_text,
                extraction_method = excluded.extraction_method,
                word_count = excluded.word_count,
                char_count = excluded.char_count,
                page_count = excluded.page_count,
                title = excluded.title,
                court = excluded.court,
                date = excluded.date,
                bench = excluded.bench,
                petitioner = excluded.petitioner,
                respondent = excluded.respondent,
                case_number = excluded.case_number,
                summary = excluded.summary,
                citations = excluded.citations,
                extracted_at = excluded.extracted_at
            "#,
        )
        .bind(&record.case_id)
        .bind(&record.source_file)
        .bind(&record.raw_text)
        .bind(&record.cleaned_text)
        .bind(record.extraction_method.as_str())
        .bind(record.word_count)
        .bind(record.char_count)
        .bind(record.page_count)
        .bind(&record.title)
        .bind(&record.court)
        .bind(&record.date)
        .bind(&record.bench)
        .bind(&record.petitioner)
        .bind(&record.respondent)
        .bind(&record.case_number)
        .bind(&record.summary)
        .bind(&citations_json)
        .bind(record.extracted_at)
        .execute(&self.pool)
        .await?;

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
        let blob = vec_to_blob(vector);
        let result = sqlx::query(
            r#"
            UPDATE cases SET
                embedding = ?,
                embedding_model = ?,
                embedding_dim = ?,
                embedding_generated_at = ?
            WHERE case_id = ?
            "#,
        )
        .bind(&blob)
        .bind(model)
        .bind(dims as i64)
        .bind(generated_at)
        .bind(case_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            bail!("case not found: {}", case_id);
        }
        Ok(())
    }

    async fn get_case(&self, case_id: &str) -> Result<Option<CaseRecord>> {
        let row = sqlx::query("SELECT * FROM cases WHERE case_id = ?")
            .bind(case_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(row_to_record))
    }

    async fn embedded_cases(&self, court: Option<&str>) -> Result<Vec<CaseRecord>> {
        let rows = match court {
            Some(filter) => {
                sqlx::query(
                    r#"
                    SELECT * FROM cases
                    WHERE embedding IS NOT NULL AND court LIKE '%' || ? || '%'
                    ORDER BY case_id
                    "#,
                )
                .bind(filter)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query("SELECT * FROM cases WHERE embedding IS NOT NULL ORDER BY case_id")
                    .fetch_all(&self.pool)
                    .await?
            }
        };
        Ok(rows.iter().map(row_to_record).collect())
    }

    async fn cases_for_embedding(
        &self,
        pending_only: bool,
        limit: Option<usize>,
    ) -> Result<Vec<CaseRecord>> {
        // SQLite treats a negative LIMIT as unlimited.
        let limit_val = limit.map(|l| l as i64).unwrap_or(-1);
        let sql = if pending_only {
            "SELECT * FROM cases WHERE embedding IS NULL ORDER BY case_id LIMIT ?"
        } else {
            "SELECT * FROM cases ORDER BY case_id LIMIT ?"
        };
        let rows = sqlx::query(sql).bind(limit_val).fetch_all(&self.pool).await?;
        Ok(rows.iter().map(row_to_record).collect())
    }

    async fn count_cases(&self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM cases")
            .fetch_one(&self.pool)
            .await?;
        Ok(count as u64)
    }

    async fn count_embedded(&self) -> Result<u64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM cases WHERE embedding IS NOT NULL")
                .fetch_one(&self.pool)
                .await?;
        Ok(count as u64)
    }

    async fn sample_embedded(&self, limit: usize) -> Result<Vec<CaseRecord>> {
        let rows = sqlx::query(
            "SELECT * FROM cases WHERE embedding IS NOT NULL ORDER BY case_id LIMIT ?",
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(row_to_record).collect())
    }

    async fn ensure_indexes(&self) -> Result<()> {
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_cases_case_id ON cases(case_id)")
            .execute(&self.pool)
            .await?;
        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_cases_embedding_generated_at ON cases(embedding_generated_at)",
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}
