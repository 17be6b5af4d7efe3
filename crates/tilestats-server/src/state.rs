//! Shared application state for the API server.
//!
//! [`AppState`] bundles the score arbiter, the analytics store, and the
//! subscriber registry that every notification stream registers with.
//! Handlers receive it as `State<Arc<AppState>>`.

use std::sync::Arc;
use std::time::Duration;

use tilestats_core::config::ServiceConfig;
use tilestats_core::{
    AnalyticsStore, Broadcaster, MemoryAnalyticsStore, MemoryScoreStore, ScoreArbiter, ScoreStore,
    SubscriberRegistry,
};
use tilestats_types::ScoreNotice;

/// Tunables the handlers read at request time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateOptions {
    /// Interval between SSE keep-alive comments, if any.
    pub keep_alive: Option<Duration>,
    /// Number of recent events returned with the dashboard data.
    pub recent_events: u32,
}

impl Default for StateOptions {
    fn default() -> Self {
        Self::from_config(&ServiceConfig::default())
    }
}

impl StateOptions {
    /// Derive options from the service configuration.
    pub const fn from_config(config: &ServiceConfig) -> Self {
        Self {
            keep_alive: config.stream.keep_alive(),
            recent_events: config.dashboard.recent_events,
        }
    }
}

/// Shared state for all API handlers.
pub struct AppState {
    /// Decides and records new global records.
    pub arbiter: ScoreArbiter,
    /// Telemetry sink and dashboard source.
    pub analytics: Arc<dyn AnalyticsStore>,
    /// Live notification channels.
    pub registry: Arc<SubscriberRegistry<ScoreNotice>>,
    /// Request-time tunables.
    pub options: StateOptions,
}

impl AppState {
    /// Wire the state around the given stores.
    ///
    /// The arbiter broadcasts into the same registry the stream handlers
    /// register with.
    pub fn new(
        scores: Arc<dyn ScoreStore>,
        analytics: Arc<dyn AnalyticsStore>,
        channel_capacity: usize,
        options: StateOptions,
    ) -> Self {
        let registry = Arc::new(SubscriberRegistry::new(channel_capacity));
        let arbiter = ScoreArbiter::new(scores, Broadcaster::new(Arc::clone(&registry)));
        Self {
            arbiter,
            analytics,
            registry,
            options,
        }
    }

    /// Wire the state from the service configuration.
    pub fn from_config(
        scores: Arc<dyn ScoreStore>,
        analytics: Arc<dyn AnalyticsStore>,
        config: &ServiceConfig,
    ) -> Self {
        Self::new(
            scores,
            analytics,
            config.stream.channel_capacity,
            StateOptions::from_config(config),
        )
    }

    /// Number of connected notification viewers.
    pub fn subscribers(&self) -> usize {
        self.registry.len()
    }

    /// State backed by in-memory stores.
    pub fn in_memory() -> Self {
        Self::from_config(
            Arc::new(MemoryScoreStore::new()),
            Arc::new(MemoryAnalyticsStore::new()),
            &ServiceConfig::default(),
        )
    }
}

impl core::fmt::Debug for AppState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AppState")
            .field("arbiter", &self.arbiter)
            .field("registry", &self.registry)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}
