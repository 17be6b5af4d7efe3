//! `SQLite` data layer for Tilestats.
//!
//! Implements the storage traits of `tilestats-core` on top of a
//! [`sqlx::SqlitePool`]. Both tables are append-only:
//!
//! ```text
//! Database (SqlitePool)
//!     |-- SqlScoreStore      (high_scores: global record history)
//!     +-- SqlAnalyticsStore  (game_analytics: telemetry events)
//! ```
//!
//! # Modules
//!
//! - [`sqlite`] -- Connection pool, configuration, and migrations
//! - [`score_store`] -- [`ScoreStore`](tilestats_core::ScoreStore) implementation
//! - [`analytics_store`] -- [`AnalyticsStore`](tilestats_core::AnalyticsStore) implementation
//! - [`error`] -- Shared error types

pub mod analytics_store;
pub mod error;
pub mod score_store;
pub mod sqlite;

// Re-export primary types for convenience.
pub use analytics_store::{AnalyticsRow, SqlAnalyticsStore};
pub use error::DbError;
pub use score_store::{HighScoreRow, SqlScoreStore};
pub use sqlite::{Database, SqliteConfig};
