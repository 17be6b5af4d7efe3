//! Shared type definitions for the Tilestats backend.
//!
//! This crate is the single source of truth for the data model shared by
//! the arbitration core, the `SQLite` data layer, and the HTTP server.
//! Payload types flow downstream to `TypeScript` via `ts-rs` for the
//! dashboard and game clients.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers for identifiers
//! - [`score`] -- Global high-score records, submissions, and notices
//! - [`analytics`] -- Gameplay telemetry events and dashboard aggregates

pub mod analytics;
pub mod ids;
pub mod score;

// Re-export all public types at crate root for convenience.
pub use analytics::{
    AnalyticsEvent, DashboardStats, EventKind, MoveDirection, MovesByDirection,
    NewAnalyticsEvent, Platform,
};
pub use ids::SubscriberId;
pub use score::{
    CurrentHighScore, HighScoreRecord, NewHighScore, ScoreNotice, ScoreSubmission, SubmitOutcome,
    SEED_SUBMITTER,
};
