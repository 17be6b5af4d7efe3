//! High-score arbitration and real-time notification fan-out.
//!
//! This crate holds the concurrency-sensitive core of Tilestats:
//!
//! ```text
//! submit(number, time)
//!     |
//!     +-- ScoreArbiter ---- read current / append ----> ScoreStore
//!           |
//!           +-- on improvement --> Broadcaster
//!                                    |
//!                                    +-- snapshot --> SubscriberRegistry
//!                                    +-- try_send --> bounded channel per viewer
//!                                                        |
//!                                                        +--> StreamSession --> transport
//! ```
//!
//! Storage is reached only through the [`store::ScoreStore`] and
//! [`store::AnalyticsStore`] traits; the `SQLite` implementations live in
//! `tilestats-db`, in-memory ones in [`store`].
//!
//! # Modules
//!
//! - [`arbiter`] -- Decides whether a submission beats the current record
//! - [`fanout`] -- Subscriber registry, broadcaster, and stream sessions
//! - [`store`] -- Storage traits and in-memory implementations
//! - [`config`] -- Typed YAML configuration

pub mod arbiter;
pub mod config;
pub mod fanout;
pub mod store;

// Re-export primary types for convenience.
pub use arbiter::{ArbiterError, ScoreArbiter};
pub use config::{ConfigError, ServiceConfig};
pub use fanout::{
    Broadcaster, CloseReason, NotificationSink, SessionState, SinkError, StreamSession,
    SubscriberRegistry, Subscription,
};
pub use store::{AnalyticsStore, MemoryAnalyticsStore, MemoryScoreStore, ScoreStore, StoreError};
