//! Axum router construction.
//!
//! Assembles every route (REST, SSE, and `WebSocket`) into a single
//! [`Router`] with CORS enabled so browser game clients on other origins
//! can submit scores and subscribe to updates.

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::scores;
use crate::state::AppState;
use crate::stream;

/// Build the complete Axum router.
///
/// The router includes:
/// - `GET /` -- minimal HTML dashboard
/// - `GET /api/health` -- liveness and viewer count
/// - `POST /track` -- record a telemetry event
/// - `GET /dashboard-data` -- aggregates and recent events
/// - `GET /global-high` -- current global record
/// - `POST /update-global-high` -- submit a candidate score
/// - `GET /api/high-score/history` -- appended records, newest first
/// - `GET /high-score-updates` -- SSE notification stream
/// - `GET /ws/high-score` -- `WebSocket` notification stream
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Dashboard
        .route("/", get(handlers::index))
        .route("/dashboard", get(handlers::index))
        .route("/dashboard-data", get(handlers::dashboard_data))
        .route("/api/health", get(handlers::health))
        // Telemetry
        .route("/track", post(handlers::track))
        // High score
        .route("/global-high", get(scores::global_high))
        .route("/update-global-high", post(scores::update_global_high))
        .route("/api/high-score/history", get(scores::history))
        // Notification streams
        .route("/high-score-updates", get(stream::sse_updates))
        .route("/ws/high-score", get(stream::ws_updates))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
