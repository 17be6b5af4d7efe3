//! Persistence for gameplay telemetry.
//!
//! One row per client command in `game_analytics`. The dashboard counters
//! are computed with aggregate queries on demand.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tilestats_core::{AnalyticsStore, StoreError};
use tilestats_types::{
    AnalyticsEvent, DashboardStats, EventKind, MoveDirection, MovesByDirection, NewAnalyticsEvent,
    Platform,
};

use crate::error::DbError;

/// `SQLite`-backed [`AnalyticsStore`].
#[derive(Debug, Clone)]
pub struct SqlAnalyticsStore {
    pool: SqlitePool,
}

impl SqlAnalyticsStore {
    /// Create a store bound to a connection pool.
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert one event and return it with its assigned id.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Sqlite`] if the insert fails.
    pub async fn insert(&self, event: &NewAnalyticsEvent) -> Result<AnalyticsEvent, DbError> {
        let row = sqlx::query_as::<_, AnalyticsRow>(
            r"INSERT INTO game_analytics (timestamp, ip_address, event_type, event_data, platform)
              VALUES (?1, ?2, ?3, ?4, ?5)
              RETURNING id, timestamp, ip_address, event_type, event_data, platform",
        )
        .bind(event.timestamp)
        .bind(&event.ip_address)
        .bind(event.event_type.as_str())
        .bind(event.event_data.as_deref())
        .bind(event.platform.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into_event())
    }

    /// Compute the dashboard counters.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Sqlite`] if any query fails.
    pub async fn aggregate(&self) -> Result<DashboardStats, DbError> {
        let (total_unique_ips, total_commands, new_games): (i64, i64, i64) = sqlx::query_as(
            r"SELECT
                  COUNT(DISTINCT ip_address),
                  COUNT(*),
                  COALESCE(SUM(CASE WHEN event_type = ?1 THEN 1 ELSE 0 END), 0)
              FROM game_analytics",
        )
        .bind(EventKind::NewGame.as_str())
        .fetch_one(&self.pool)
        .await?;

        let direction_counts: Vec<(Option<String>, i64)> = sqlx::query_as(
            r"SELECT event_data, COUNT(*)
              FROM game_analytics
              WHERE event_type = ?1
              GROUP BY event_data",
        )
        .bind(EventKind::Move.as_str())
        .fetch_all(&self.pool)
        .await?;

        let mut moves_by_direction = MovesByDirection::default();
        for (payload, count) in direction_counts {
            if let Some(direction) = payload.as_deref().and_then(MoveDirection::from_payload) {
                *moves_by_direction.slot_mut(direction) = count;
            }
        }

        Ok(DashboardStats {
            total_unique_ips,
            total_commands,
            new_games,
            moves_by_direction,
        })
    }

    /// Most recent events, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Sqlite`] if the query fails.
    pub async fn select_recent(&self, limit: u32) -> Result<Vec<AnalyticsEvent>, DbError> {
        let rows = sqlx::query_as::<_, AnalyticsRow>(
            r"SELECT id, timestamp, ip_address, event_type, event_data, platform
              FROM game_analytics
              ORDER BY id DESC
              LIMIT ?1",
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(AnalyticsRow::into_event).collect())
    }
}

#[async_trait]
impl AnalyticsStore for SqlAnalyticsStore {
    async fn record(&self, event: &NewAnalyticsEvent) -> Result<AnalyticsEvent, StoreError> {
        Ok(self.insert(event).await?)
    }

    async fn stats(&self) -> Result<DashboardStats, StoreError> {
        Ok(self.aggregate().await?)
    }

    async fn recent(&self, limit: u32) -> Result<Vec<AnalyticsEvent>, StoreError> {
        Ok(self.select_recent(limit).await?)
    }
}

/// A row from the `game_analytics` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AnalyticsRow {
    /// Auto-increment id.
    pub id: i64,
    /// Receive timestamp.
    pub timestamp: DateTime<Utc>,
    /// Client address.
    pub ip_address: String,
    /// Event type tag.
    pub event_type: String,
    /// Optional payload.
    pub event_data: Option<String>,
    /// Platform tag.
    pub platform: String,
}

impl AnalyticsRow {
    /// Convert into the shared event type.
    pub fn into_event(self) -> AnalyticsEvent {
        AnalyticsEvent {
            id: self.id,
            ip_address: self.ip_address,
            event_type: EventKind::from(self.event_type),
            event_data: self.event_data,
            platform: Platform::from_tag(&self.platform),
            timestamp: self.timestamp,
        }
    }
}
