//! Integration tests for the `tilestats-db` data layer.
//!
//! Every test opens its own private in-memory `SQLite` database, so no
//! external service is needed and tests run in parallel.

// Integration tests use expect/unwrap extensively for clarity -- panicking
// on failure is the correct behavior in test code.
#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::missing_panics_doc,
    clippy::indexing_slicing
)]

use std::sync::Arc;

use chrono::Utc;
use tilestats_core::{
    AnalyticsStore, Broadcaster, ScoreArbiter, ScoreStore, SubscriberRegistry,
};
use tilestats_db::{Database, SqlScoreStore};
use tilestats_types::{
    EventKind, NewAnalyticsEvent, NewHighScore, Platform, ScoreNotice, ScoreSubmission,
    SEED_SUBMITTER,
};

async fn setup() -> Database {
    Database::connect_in_memory()
        .await
        .expect("Failed to open in-memory SQLite")
}

fn score(highest_number: i64, best_time: Option<i64>) -> NewHighScore {
    NewHighScore {
        highest_number,
        best_time,
        achieved_by: String::from("192.0.2.10"),
        achieved_at: Utc::now(),
    }
}

fn event(ip: &str, kind: &str, data: Option<&str>, platform: Platform) -> NewAnalyticsEvent {
    NewAnalyticsEvent {
        ip_address: ip.to_owned(),
        event_type: EventKind::from(kind),
        event_data: data.map(str::to_owned),
        platform,
        timestamp: Utc::now(),
    }
}

// =============================================================================
// High scores
// =============================================================================

#[tokio::test]
async fn current_seeds_exactly_once() {
    let db = setup().await;
    let store = db.score_store();

    let first = store.current().await.unwrap();
    let second = store.current().await.unwrap();

    assert_eq!(first.highest_number, 0);
    assert_eq!(first.best_time, None);
    assert_eq!(first.achieved_by, SEED_SUBMITTER);
    assert_eq!(first.id, second.id);
    assert_eq!(store.history(10).await.unwrap().len(), 1);
}

#[tokio::test]
async fn ensure_seed_is_noop_on_populated_table() {
    let db = setup().await;
    let store = SqlScoreStore::new(db.pool().clone());

    store.append(&score(4, Some(9))).await.unwrap();
    assert!(!store.ensure_seed().await.unwrap());
    assert_eq!(store.current().await.unwrap().highest_number, 4);
}

#[tokio::test]
async fn current_prefers_number_then_time_then_earliest() {
    let db = setup().await;
    let store = db.score_store();
    store.current().await.unwrap();

    store.append(&score(8, Some(40))).await.unwrap();
    let best = store.append(&score(8, Some(30))).await.unwrap();
    store.append(&score(8, Some(30))).await.unwrap();
    store.append(&score(8, None)).await.unwrap();
    store.append(&score(2, Some(1))).await.unwrap();

    let current = store.current().await.unwrap();
    assert_eq!(current.id, best.id);
    assert_eq!(current.best_time, Some(30));
}

#[tokio::test]
async fn history_is_newest_first_and_round_trips_fields() {
    let db = setup().await;
    let store = db.score_store();
    let appended = store.append(&score(16, Some(77))).await.unwrap();
    store.append(&score(32, Some(120))).await.unwrap();

    let history = store.history(5).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].highest_number, 32);
    assert_eq!(history[1], appended);

    assert_eq!(store.history(1).await.unwrap().len(), 1);
}

#[tokio::test]
async fn arbiter_runs_against_sqlite() {
    let db = setup().await;
    let registry = Arc::new(SubscriberRegistry::<ScoreNotice>::new(4));
    let arbiter = ScoreArbiter::new(db.score_store(), Broadcaster::new(Arc::clone(&registry)));
    let mut viewer = registry.register();

    let submissions = [(5, 10, true), (5, 12, false), (5, 8, true), (3, 1, false)];
    for (number, time, expected) in submissions {
        let outcome = arbiter
            .submit(ScoreSubmission { number, time }, "192.0.2.44")
            .await
            .unwrap();
        assert_eq!(outcome.updated(), expected, "submission ({number}, {time})");
    }

    let current = arbiter.current().await.unwrap();
    assert_eq!(current.highest_number, 5);
    assert_eq!(current.best_time, Some(8));
    assert_eq!(current.achieved_by, "192.0.2.44");

    assert_eq!(viewer.try_recv().unwrap(), ScoreNotice::RecordChanged);
    assert_eq!(viewer.try_recv().unwrap(), ScoreNotice::RecordChanged);
    assert!(viewer.try_recv().is_err());
}

// =============================================================================
// Analytics
// =============================================================================

#[tokio::test]
async fn record_round_trips_event() {
    let db = setup().await;
    let store = db.analytics_store();

    let stored = store
        .record(&event("198.51.100.7", "move", Some("down"), Platform::Ios))
        .await
        .unwrap();
    assert!(stored.id > 0);

    let recent = store.recent(1).await.unwrap();
    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0].id, stored.id);
    assert_eq!(recent[0].event_type, EventKind::Move);
    assert_eq!(recent[0].event_data.as_deref(), Some("down"));
    assert_eq!(recent[0].platform, Platform::Ios);
}

#[tokio::test]
async fn stats_on_empty_table_are_zero() {
    let db = setup().await;
    let stats = db.analytics_store().stats().await.unwrap();
    assert_eq!(stats, tilestats_types::DashboardStats::default());
}

#[tokio::test]
async fn stats_aggregate_events() {
    let db = setup().await;
    let store = db.analytics_store();

    let events = [
        event("10.0.0.1", "new_game", None, Platform::Web),
        event("10.0.0.1", "move", Some("up"), Platform::Web),
        event("10.0.0.1", "move", Some("up"), Platform::Web),
        event("10.0.0.2", "move", Some("right"), Platform::Android),
        event("10.0.0.2", "new_game", None, Platform::Android),
        event("10.0.0.3", "move", Some("nowhere"), Platform::Other),
        event("10.0.0.3", "undo", None, Platform::Web),
    ];
    for e in &events {
        store.record(e).await.unwrap();
    }

    let stats = store.stats().await.unwrap();
    assert_eq!(stats.total_unique_ips, 3);
    assert_eq!(stats.total_commands, 7);
    assert_eq!(stats.new_games, 2);
    assert_eq!(stats.moves_by_direction.up, 2);
    assert_eq!(stats.moves_by_direction.right, 1);
    assert_eq!(stats.moves_by_direction.down, 0);
    assert_eq!(stats.moves_by_direction.left, 0);
}

#[tokio::test]
async fn recent_is_newest_first_and_limited() {
    let db = setup().await;
    let store = db.analytics_store();
    for n in 0..12 {
        let data = format!("{n}");
        store
            .record(&event("10.0.0.9", "move", Some(&data), Platform::Web))
            .await
            .unwrap();
    }

    let recent = store.recent(10).await.unwrap();
    assert_eq!(recent.len(), 10);
    assert_eq!(recent[0].event_data.as_deref(), Some("11"));
    assert_eq!(recent[9].event_data.as_deref(), Some("2"));
}

#[tokio::test]
async fn recent_follows_insertion_order_not_timestamps() {
    let db = setup().await;
    let store = db.analytics_store();
    store
        .record(&event("10.0.0.9", "move", Some("up"), Platform::Web))
        .await
        .unwrap();
    let mut backdated = event("10.0.0.9", "move", Some("down"), Platform::Web);
    backdated.timestamp = Utc::now()
        .checked_sub_signed(chrono::TimeDelta::hours(1))
        .unwrap();
    let last = store.record(&backdated).await.unwrap();

    let recent = store.recent(2).await.unwrap();
    assert_eq!(recent[0].id, last.id);
    assert_eq!(recent[1].event_data.as_deref(), Some("up"));
}

#[tokio::test]
async fn oversized_fields_are_rejected_by_schema() {
    let db = setup().await;
    let too_long = "x".repeat(51);
    let result = db
        .analytics_store()
        .record(&event("10.0.0.1", &too_long, None, Platform::Web))
        .await;
    assert!(result.is_err());
}
