//! Storage traits consumed by the core, plus in-memory implementations.
//!
//! The arbiter and the HTTP layer never see a database handle. They talk to
//! a [`ScoreStore`] (the append-only high-score history) and an
//! [`AnalyticsStore`] (the telemetry event sink and its dashboard
//! aggregates). `tilestats-db` provides the `SQLite` implementations; the
//! in-memory ones here back tests and ephemeral runs.

use std::collections::BTreeSet;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use tilestats_types::{
    AnalyticsEvent, DashboardStats, EventKind, HighScoreRecord, NewAnalyticsEvent, NewHighScore,
};

/// Errors surfaced by storage implementations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The backing store rejected or failed the operation.
    #[error("store backend error: {source}")]
    Backend {
        /// The underlying backend error.
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The store cannot currently serve requests.
    #[error("store unavailable: {message}")]
    Unavailable {
        /// Description of the failure.
        message: String,
    },
}

impl StoreError {
    /// Wrap a backend error.
    pub fn backend(source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Backend {
            source: source.into(),
        }
    }
}

/// Durable holder of the global high-score history.
///
/// Implementations must keep the history append-only and derive the
/// current record with [`HighScoreRecord::rank_cmp`], breaking exact ties
/// by earliest insertion.
#[async_trait]
pub trait ScoreStore: Send + Sync {
    /// Return the current record, appending the zero-value seed first if the
    /// history is empty.
    async fn current(&self) -> Result<HighScoreRecord, StoreError>;

    /// Append a record and return it with its assigned identifier.
    async fn append(&self, record: &NewHighScore) -> Result<HighScoreRecord, StoreError>;

    /// Return up to `limit` most recently appended records, newest first.
    async fn history(&self, limit: u32) -> Result<Vec<HighScoreRecord>, StoreError>;
}

/// Sink for telemetry events and source of dashboard aggregates.
#[async_trait]
pub trait AnalyticsStore: Send + Sync {
    /// Record one event and return it with its assigned identifier.
    async fn record(&self, event: &NewAnalyticsEvent) -> Result<AnalyticsEvent, StoreError>;

    /// Aggregate counters over every recorded event.
    async fn stats(&self) -> Result<DashboardStats, StoreError>;

    /// Return up to `limit` most recent events, newest first.
    async fn recent(&self, limit: u32) -> Result<Vec<AnalyticsEvent>, StoreError>;
}

// ---------------------------------------------------------------------------
// In-memory score store
// ---------------------------------------------------------------------------

/// Process-local [`ScoreStore`].
#[derive(Debug, Default)]
pub struct MemoryScoreStore {
    records: Mutex<Vec<HighScoreRecord>>,
}

impl MemoryScoreStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of appended records, including the seed.
    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    /// Whether nothing has been appended yet.
    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }
}

fn next_id(len: usize) -> i64 {
    i64::try_from(len).map_or(i64::MAX, |n| n.saturating_add(1))
}

#[async_trait]
impl ScoreStore for MemoryScoreStore {
    async fn current(&self) -> Result<HighScoreRecord, StoreError> {
        let mut records = self.records.lock();
        if records.is_empty() {
            let seed = NewHighScore::seed(Utc::now()).with_id(1);
            records.push(seed);
        }

        // Keep the earliest record among exact ties.
        let mut best: Option<&HighScoreRecord> = None;
        for record in records.iter() {
            best = match best {
                Some(b) if record.rank_cmp(b).is_le() => Some(b),
                _ => Some(record),
            };
        }

        best.cloned().ok_or_else(|| StoreError::Unavailable {
            message: String::from("empty high-score history after seeding"),
        })
    }

    async fn append(&self, record: &NewHighScore) -> Result<HighScoreRecord, StoreError> {
        let mut records = self.records.lock();
        let stored = record.clone().with_id(next_id(records.len()));
        records.push(stored.clone());
        Ok(stored)
    }

    async fn history(&self, limit: u32) -> Result<Vec<HighScoreRecord>, StoreError> {
        let limit = usize::try_from(limit).unwrap_or(usize::MAX);
        Ok(self
            .records
            .lock()
            .iter()
            .rev()
            .take(limit)
            .cloned()
            .collect())
    }
}

// ---------------------------------------------------------------------------
// In-memory analytics store
// ---------------------------------------------------------------------------

/// Process-local [`AnalyticsStore`].
#[derive(Debug, Default)]
pub struct MemoryAnalyticsStore {
    events: Mutex<Vec<AnalyticsEvent>>,
}

impl MemoryAnalyticsStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

fn count_i64(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

#[async_trait]
impl AnalyticsStore for MemoryAnalyticsStore {
    async fn record(&self, event: &NewAnalyticsEvent) -> Result<AnalyticsEvent, StoreError> {
        let mut events = self.events.lock();
        let stored = event.clone().with_id(next_id(events.len()));
        events.push(stored.clone());
        Ok(stored)
    }

    async fn stats(&self) -> Result<DashboardStats, StoreError> {
        let events = self.events.lock();
        let mut stats = DashboardStats {
            total_unique_ips: count_i64(
                events
                    .iter()
                    .map(|e| e.ip_address.as_str())
                    .collect::<BTreeSet<_>>()
                    .len(),
            ),
            total_commands: count_i64(events.len()),
            new_games: count_i64(
                events
                    .iter()
                    .filter(|e| e.event_type == EventKind::NewGame)
                    .count(),
            ),
            ..DashboardStats::default()
        };

        for direction in events.iter().filter_map(AnalyticsEvent::direction) {
            let slot = stats.moves_by_direction.slot_mut(direction);
            *slot = slot.saturating_add(1);
        }

        Ok(stats)
    }

    async fn recent(&self, limit: u32) -> Result<Vec<AnalyticsEvent>, StoreError> {
        let limit = usize::try_from(limit).unwrap_or(usize::MAX);
        let mut events: Vec<AnalyticsEvent> = self.events.lock().clone();
        events.sort_by(|a, b| b.id.cmp(&a.id));
        events.truncate(limit);
        Ok(events)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use tilestats_types::Platform;

    use super::*;

    fn new_record(highest_number: i64, best_time: Option<i64>) -> NewHighScore {
        NewHighScore {
            highest_number,
            best_time,
            achieved_by: String::from("10.0.0.2"),
            achieved_at: Utc::now(),
        }
    }

    fn event(ip: &str, kind: &str, data: Option<&str>) -> NewAnalyticsEvent {
        NewAnalyticsEvent {
            ip_address: ip.to_owned(),
            event_type: EventKind::from(kind),
            event_data: data.map(str::to_owned),
            platform: Platform::Web,
            timestamp: Utc::now(),
        }
    }

    #[tokio::test]
    async fn current_seeds_empty_history_once() {
        let store = MemoryScoreStore::new();
        assert!(store.is_empty());

        let first = store.current().await.unwrap();
        let second = store.current().await.unwrap();

        assert_eq!(first.highest_number, 0);
        assert_eq!(first.best_time, None);
        assert_eq!(first, second);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn current_is_derived_from_history() {
        let store = MemoryScoreStore::new();
        store.current().await.unwrap();
        store.append(&new_record(8, Some(40))).await.unwrap();
        store.append(&new_record(8, Some(30))).await.unwrap();
        // A worse row appended later must not become current.
        store.append(&new_record(4, Some(1))).await.unwrap();

        let current = store.current().await.unwrap();
        assert_eq!(current.highest_number, 8);
        assert_eq!(current.best_time, Some(30));
    }

    #[tokio::test]
    async fn exact_ties_keep_earliest_record() {
        let store = MemoryScoreStore::new();
        let first = store.append(&new_record(16, Some(20))).await.unwrap();
        store.append(&new_record(16, Some(20))).await.unwrap();

        assert_eq!(store.current().await.unwrap().id, first.id);
    }

    #[tokio::test]
    async fn history_is_newest_first_and_limited() {
        let store = MemoryScoreStore::new();
        store.current().await.unwrap();
        store.append(&new_record(2, Some(5))).await.unwrap();
        store.append(&new_record(4, Some(9))).await.unwrap();

        let history = store.history(2).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].highest_number, 4);
        assert_eq!(history[1].highest_number, 2);
    }

    #[tokio::test]
    async fn stats_count_events_ips_and_directions() {
        let store = MemoryAnalyticsStore::new();
        store.record(&event("1.1.1.1", "new_game", None)).await.unwrap();
        store.record(&event("1.1.1.1", "move", Some("up"))).await.unwrap();
        store.record(&event("2.2.2.2", "move", Some("up"))).await.unwrap();
        store.record(&event("2.2.2.2", "move", Some("left"))).await.unwrap();
        store.record(&event("3.3.3.3", "move", Some("sideways"))).await.unwrap();
        // Only move events count toward directions.
        store.record(&event("3.3.3.3", "new_game", Some("right"))).await.unwrap();

        let stats = store.stats().await.unwrap();
        assert_eq!(stats.total_unique_ips, 3);
        assert_eq!(stats.total_commands, 6);
        assert_eq!(stats.new_games, 2);
        assert_eq!(stats.moves_by_direction.up, 2);
        assert_eq!(stats.moves_by_direction.left, 1);
        assert_eq!(stats.moves_by_direction.right, 0);
    }

    #[tokio::test]
    async fn recent_returns_newest_first() {
        let store = MemoryAnalyticsStore::new();
        for n in 0..5 {
            let data = format!("{n}");
            store
                .record(&event("1.1.1.1", "move", Some(&data)))
                .await
                .unwrap();
        }

        let recent = store.recent(3).await.unwrap();
        assert_eq!(recent.len(), 3);
        assert_eq!(recent[0].event_data.as_deref(), Some("4"));
        assert_eq!(recent[2].event_data.as_deref(), Some("2"));
    }

    #[tokio::test]
    async fn recent_follows_insertion_order_not_timestamps() {
        let store = MemoryAnalyticsStore::new();
        store.record(&event("1.1.1.1", "move", Some("up"))).await.unwrap();
        let mut backdated = event("1.1.1.1", "move", Some("down"));
        backdated.timestamp = Utc::now()
            .checked_sub_signed(chrono::TimeDelta::hours(1))
            .unwrap();
        let last = store.record(&backdated).await.unwrap();

        let recent = store.recent(2).await.unwrap();
        assert_eq!(recent[0].id, last.id);
        assert_eq!(recent[1].event_data.as_deref(), Some("up"));
    }
}
