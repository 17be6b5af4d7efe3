//! Persistence for the global high-score history.
//!
//! Rows in `high_scores` are only ever inserted. The current record is
//! selected by ordering: highest number, then lowest non-null time, then
//! earliest row.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tilestats_core::{ScoreStore, StoreError};
use tilestats_types::{HighScoreRecord, NewHighScore, SEED_SUBMITTER};

use crate::error::DbError;

/// `SQLite`-backed [`ScoreStore`].
#[derive(Debug, Clone)]
pub struct SqlScoreStore {
    pool: SqlitePool,
}

impl SqlScoreStore {
    /// Create a store bound to a connection pool.
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert the zero-value seed if the table is empty.
    ///
    /// Returns whether a row was inserted.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Sqlite`] if the insert fails.
    pub async fn ensure_seed(&self) -> Result<bool, DbError> {
        let result = sqlx::query(
            r"INSERT INTO high_scores (highest_number, best_time, achieved_by, achieved_at)
              SELECT 0, NULL, ?1, ?2
              WHERE NOT EXISTS (SELECT 1 FROM high_scores)",
        )
        .bind(SEED_SUBMITTER)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        let seeded = result.rows_affected() > 0;
        if seeded {
            tracing::info!("Seeded empty high-score history");
        }
        Ok(seeded)
    }

    /// Select the current record without seeding.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Sqlite`] if the query fails.
    pub async fn select_current(&self) -> Result<Option<HighScoreRecord>, DbError> {
        let row = sqlx::query_as::<_, HighScoreRow>(
            r"SELECT id, highest_number, best_time, achieved_by, achieved_at
              FROM high_scores
              ORDER BY highest_number DESC, best_time IS NULL, best_time ASC, id ASC
              LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(HighScoreRow::into_record))
    }

    /// Insert a record and return it with its assigned id.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Sqlite`] if the insert fails.
    pub async fn insert(&self, record: &NewHighScore) -> Result<HighScoreRecord, DbError> {
        let row = sqlx::query_as::<_, HighScoreRow>(
            r"INSERT INTO high_scores (highest_number, best_time, achieved_by, achieved_at)
              VALUES (?1, ?2, ?3, ?4)
              RETURNING id, highest_number, best_time, achieved_by, achieved_at",
        )
        .bind(record.highest_number)
        .bind(record.best_time)
        .bind(&record.achieved_by)
        .bind(record.achieved_at)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!(id = row.id, number = row.highest_number, "Inserted high score");
        Ok(row.into_record())
    }

    /// Most recent rows, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Sqlite`] if the query fails.
    pub async fn select_history(&self, limit: u32) -> Result<Vec<HighScoreRecord>, DbError> {
        let rows = sqlx::query_as::<_, HighScoreRow>(
            r"SELECT id, highest_number, best_time, achieved_by, achieved_at
              FROM high_scores
              ORDER BY id DESC
              LIMIT ?1",
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(HighScoreRow::into_record).collect())
    }
}

#[async_trait]
impl ScoreStore for SqlScoreStore {
    async fn current(&self) -> Result<HighScoreRecord, StoreError> {
        self.ensure_seed().await?;
        self.select_current()
            .await?
            .ok_or_else(|| DbError::Corrupt(String::from("high_scores empty after seeding")).into())
    }

    async fn append(&self, record: &NewHighScore) -> Result<HighScoreRecord, StoreError> {
        Ok(self.insert(record).await?)
    }

    async fn history(&self, limit: u32) -> Result<Vec<HighScoreRecord>, StoreError> {
        Ok(self.select_history(limit).await?)
    }
}

/// A row from the `high_scores` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct HighScoreRow {
    /// Auto-increment id.
    pub id: i64,
    /// Tile value reached.
    pub highest_number: i64,
    /// Seconds taken, if recorded.
    pub best_time: Option<i64>,
    /// Submitter identity.
    pub achieved_by: String,
    /// Insert timestamp.
    pub achieved_at: DateTime<Utc>,
}

impl HighScoreRow {
    /// Convert into the shared record type.
    pub fn into_record(self) -> HighScoreRecord {
        HighScoreRecord {
            id: self.id,
            highest_number: self.highest_number,
            best_time: self.best_time,
            achieved_by: self.achieved_by,
            achieved_at: self.achieved_at,
        }
    }
}
