//! Global high-score endpoints.
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/global-high` | Current record |
//! | `POST` | `/update-global-high` | Submit a candidate score |
//! | `GET` | `/api/high-score/history` | Appended records, newest first |

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use serde::{Deserialize, Serialize};
use tilestats_types::{HighScoreRecord, ScoreSubmission};

use crate::error::ApiError;
use crate::peer::Submitter;
use crate::state::AppState;

/// Default number of records returned by the history endpoint.
const DEFAULT_HISTORY_LIMIT: u32 = 20;

/// Upper bound on the history endpoint's `limit`.
const MAX_HISTORY_LIMIT: u32 = 100;

/// Body of `GET /global-high`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalHighResponse {
    /// Always `"success"`.
    pub status: String,
    /// Best tile value ever reached.
    pub highest_number: i64,
    /// Best time for that value, if any.
    pub best_time: Option<i64>,
}

/// Body of `POST /update-global-high`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitResponse {
    /// Always `"success"`.
    pub status: String,
    /// `"New record!"` or `"No new record"`.
    pub message: String,
    /// Whether the current record changed.
    pub updated: bool,
}

/// Query parameters for `GET /api/high-score/history`.
#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    /// Maximum records to return (default 20, capped at 100).
    pub limit: Option<u32>,
}

/// Body of `GET /api/high-score/history`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryResponse {
    /// Number of records returned.
    pub count: usize,
    /// Records, newest first.
    pub records: Vec<HighScoreRecord>,
}

/// Return the current global record, seeding it on first use.
pub async fn global_high(
    State(state): State<Arc<AppState>>,
) -> Result<Json<GlobalHighResponse>, ApiError> {
    let current = state.arbiter.current().await?.current_view();
    Ok(Json(GlobalHighResponse {
        status: String::from("success"),
        highest_number: current.highest_number,
        best_time: current.best_time,
    }))
}

/// Arbitrate a submitted score.
///
/// Negative values are rejected with 400. A store failure yields 500 and
/// no notification.
pub async fn update_global_high(
    State(state): State<Arc<AppState>>,
    submitter: Submitter,
    body: Result<Json<ScoreSubmission>, JsonRejection>,
) -> Result<Json<SubmitResponse>, ApiError> {
    let Json(submission) = body.map_err(|e| ApiError::InvalidInput(e.body_text()))?;
    if submission.number < 0 || submission.time < 0 {
        return Err(ApiError::InvalidInput(String::from(
            "number and time must be non-negative",
        )));
    }

    let outcome = state.arbiter.submit(submission, submitter.as_str()).await?;
    Ok(Json(SubmitResponse {
        status: String::from("success"),
        message: outcome.message().to_owned(),
        updated: outcome.updated(),
    }))
}

/// List the most recently appended records.
pub async fn history(
    State(state): State<Arc<AppState>>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_HISTORY_LIMIT)
        .clamp(1, MAX_HISTORY_LIMIT);
    let records = state.arbiter.history(limit).await?;
    Ok(Json(HistoryResponse {
        count: records.len(),
        records,
    }))
}
