//! Dashboard, telemetry, and health endpoints.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/` | Minimal HTML dashboard |
//! | `GET` | `/api/health` | Liveness and connected viewer count |
//! | `POST` | `/track` | Record one telemetry event |
//! | `GET` | `/dashboard-data` | Aggregates plus recent events |

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::response::{Html, IntoResponse};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tilestats_types::analytics::{MAX_EVENT_DATA_LEN, MAX_EVENT_TYPE_LEN};
use tilestats_types::{AnalyticsEvent, DashboardStats, EventKind, NewAnalyticsEvent, Platform};
use tracing::debug;

use crate::error::ApiError;
use crate::peer::Submitter;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response bodies
// ---------------------------------------------------------------------------

/// Body of `POST /track`.
#[derive(Debug, Clone, Deserialize)]
pub struct TrackRequest {
    /// Event type tag (`move`, `new_game`, ...).
    pub event_type: String,
    /// Optional payload, such as the move direction.
    #[serde(default)]
    pub event_data: Option<String>,
    /// Client platform; defaults to `web`.
    #[serde(default)]
    pub platform: Option<Platform>,
}

impl TrackRequest {
    fn validate(&self) -> Result<(), ApiError> {
        if self.event_type.trim().is_empty() {
            return Err(ApiError::InvalidInput(String::from(
                "event_type must not be empty",
            )));
        }
        if self.event_type.chars().count() > MAX_EVENT_TYPE_LEN {
            return Err(ApiError::InvalidInput(format!(
                "event_type exceeds {MAX_EVENT_TYPE_LEN} characters"
            )));
        }
        if self
            .event_data
            .as_ref()
            .is_some_and(|d| d.chars().count() > MAX_EVENT_DATA_LEN)
        {
            return Err(ApiError::InvalidInput(format!(
                "event_data exceeds {MAX_EVENT_DATA_LEN} characters"
            )));
        }
        Ok(())
    }
}

/// Body of a plain success response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    /// Always `"success"`.
    pub status: String,
}

/// Body of `GET /dashboard-data`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardResponse {
    /// Aggregate counters.
    pub stats: DashboardStats,
    /// Most recent events, newest first.
    pub recent_events: Vec<AnalyticsEvent>,
}

/// Body of `GET /api/health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always `"ok"`.
    pub status: String,
    /// Connected notification viewers.
    pub subscribers: usize,
}

// ---------------------------------------------------------------------------
// GET /
// ---------------------------------------------------------------------------

/// Serve a minimal HTML dashboard.
///
/// The page polls nothing: it loads `/dashboard-data` and `/global-high`
/// once, then re-fetches the record whenever `/high-score-updates` says
/// it changed.
pub async fn index(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let viewers = state.subscribers();

    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <title>Tilestats</title>
    <style>
        body {{
            background: #faf8ef;
            color: #776e65;
            font-family: 'Clear Sans', 'Helvetica Neue', Arial, sans-serif;
            padding: 2rem;
            max-width: 800px;
            margin: 0 auto;
        }}
        h1 {{ color: #776e65; margin-bottom: 0.25rem; }}
        .metric {{
            display: inline-block;
            background: #bbada0;
            color: #f9f6f2;
            border-radius: 6px;
            padding: 1rem 1.5rem;
            margin: 0.5rem 0.5rem 0.5rem 0;
            min-width: 120px;
        }}
        .metric .label {{ font-size: 0.85rem; }}
        .metric .value {{ font-size: 1.5rem; font-weight: bold; }}
        table {{ width: 100%; border-collapse: collapse; }}
        td, th {{ text-align: left; padding: 0.25rem 0.5rem; border-bottom: 1px solid #eee4da; }}
    </style>
</head>
<body>
    <h1>Tilestats</h1>
    <p>Live viewers: <span id="viewers">{viewers}</span></p>

    <div>
        <div class="metric"><div class="label">Global high</div><div class="value" id="high">-</div></div>
        <div class="metric"><div class="label">Best time</div><div class="value" id="time">-</div></div>
        <div class="metric"><div class="label">Players</div><div class="value" id="ips">-</div></div>
        <div class="metric"><div class="label">Commands</div><div class="value" id="commands">-</div></div>
        <div class="metric"><div class="label">New games</div><div class="value" id="games">-</div></div>
    </div>

    <h2>Moves</h2>
    <p id="moves">-</p>

    <h2>Recent events</h2>
    <table>
        <thead><tr><th>Time</th><th>IP</th><th>Type</th><th>Data</th><th>Platform</th></tr></thead>
        <tbody id="events"></tbody>
    </table>

    <script>
        async function loadHigh() {{
            const r = await fetch('/global-high');
            const d = await r.json();
            document.getElementById('high').textContent = d.highest_number;
            document.getElementById('time').textContent = d.best_time === null ? '-' : d.best_time + 's';
        }}
        async function loadDashboard() {{
            const r = await fetch('/dashboard-data');
            const d = await r.json();
            const s = d.stats;
            document.getElementById('ips').textContent = s.total_unique_ips;
            document.getElementById('commands').textContent = s.total_commands;
            document.getElementById('games').textContent = s.new_games;
            const m = s.moves_by_direction;
            document.getElementById('moves').textContent =
                `up ${{m.up}} / down ${{m.down}} / left ${{m.left}} / right ${{m.right}}`;
            const body = document.getElementById('events');
            body.replaceChildren();
            for (const e of d.recent_events) {{
                const row = body.insertRow();
                for (const v of [e.timestamp, e.ip_address, e.event_type, e.event_data ?? '', e.platform]) {{
                    row.insertCell().textContent = v;
                }}
            }}
        }}
        loadHigh();
        loadDashboard();
        new EventSource('/high-score-updates').onmessage = (ev) => {{
            if (ev.data === 'update') {{ loadHigh(); }}
        }};
    </script>
</body>
</html>"#
    ))
}

// ---------------------------------------------------------------------------
// GET /api/health
// ---------------------------------------------------------------------------

/// Report liveness and the number of connected viewers.
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: String::from("ok"),
        subscribers: state.subscribers(),
    })
}

// ---------------------------------------------------------------------------
// POST /track
// ---------------------------------------------------------------------------

/// Record one telemetry event from the requesting peer.
pub async fn track(
    State(state): State<Arc<AppState>>,
    submitter: Submitter,
    body: Result<Json<TrackRequest>, JsonRejection>,
) -> Result<Json<StatusResponse>, ApiError> {
    let Json(request) = body.map_err(|e| ApiError::InvalidInput(e.body_text()))?;
    request.validate()?;

    let event = NewAnalyticsEvent {
        ip_address: submitter.0,
        event_type: EventKind::from(request.event_type),
        event_data: request.event_data,
        platform: request.platform.unwrap_or_default(),
        timestamp: Utc::now(),
    };
    let stored = state.analytics.record(&event).await?;
    debug!(
        id = stored.id,
        event_type = stored.event_type.as_str(),
        platform = stored.platform.as_str(),
        "recorded telemetry event"
    );

    Ok(Json(StatusResponse {
        status: String::from("success"),
    }))
}

// ---------------------------------------------------------------------------
// GET /dashboard-data
// ---------------------------------------------------------------------------

/// Aggregate counters plus the most recent events.
pub async fn dashboard_data(
    State(state): State<Arc<AppState>>,
) -> Result<Json<DashboardResponse>, ApiError> {
    let stats = state.analytics.stats().await?;
    let recent_events = state.analytics.recent(state.options.recent_events).await?;
    Ok(Json(DashboardResponse {
        stats,
        recent_events,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(event_type: &str, event_data: Option<&str>) -> TrackRequest {
        TrackRequest {
            event_type: event_type.to_owned(),
            event_data: event_data.map(str::to_owned),
            platform: None,
        }
    }

    #[test]
    fn track_validation() {
        assert!(request("move", Some("up")).validate().is_ok());
        assert!(request("new_game", None).validate().is_ok());
        assert!(request("  ", None).validate().is_err());
        assert!(request(&"x".repeat(51), None).validate().is_err());
        assert!(request("move", Some(&"y".repeat(51))).validate().is_err());
        assert!(request(&"x".repeat(50), Some(&"y".repeat(50))).validate().is_ok());
    }
}
