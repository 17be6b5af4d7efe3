//! Global high-score arbitration.
//!
//! The arbiter decides whether a submitted `(number, time)` pair beats the
//! current record. An improvement is appended to the [`ScoreStore`] and
//! announced through the [`Broadcaster`]; anything else leaves state
//! untouched and stays silent.
//!
//! Submissions are serialized by a single-writer gate held across the
//! read of the current record and the append, so two concurrent
//! improvements cannot both be judged against the same stale record.
//! The broadcast happens after the gate is released.

use std::sync::Arc;

use chrono::Utc;
use tilestats_types::{
    CurrentHighScore, HighScoreRecord, NewHighScore, ScoreNotice, ScoreSubmission, SubmitOutcome,
};
use tokio::sync::Mutex;
use tracing::{debug, error, info};

use crate::fanout::Broadcaster;
use crate::store::{ScoreStore, StoreError};

/// Errors from arbitration.
#[derive(Debug, thiserror::Error)]
pub enum ArbiterError {
    /// Reading the current record failed.
    #[error("failed to read current high score: {source}")]
    Read {
        /// The store failure.
        source: StoreError,
    },

    /// Appending an improved record failed. Nothing was broadcast.
    #[error("failed to persist new high score: {source}")]
    Persistence {
        /// The store failure.
        source: StoreError,
    },
}

/// Whether `(number, time)` improves on `current`.
///
/// A higher number always wins. An equal number wins only with a strictly
/// lower time, and only when the current record has a time at all.
pub const fn improves(current: &CurrentHighScore, number: i64, time: i64) -> bool {
    if number > current.highest_number {
        return true;
    }
    if number == current.highest_number
        && let Some(best) = current.best_time
    {
        return time < best;
    }
    false
}

/// Judges score submissions against the stored global record.
pub struct ScoreArbiter {
    store: Arc<dyn ScoreStore>,
    broadcaster: Broadcaster<ScoreNotice>,
    writer: Mutex<()>,
}

impl ScoreArbiter {
    /// Create an arbiter over a store and a broadcaster.
    pub fn new(store: Arc<dyn ScoreStore>, broadcaster: Broadcaster<ScoreNotice>) -> Self {
        Self {
            store,
            broadcaster,
            writer: Mutex::new(()),
        }
    }

    /// The current record, seeding the history if it is empty.
    pub async fn current(&self) -> Result<HighScoreRecord, ArbiterError> {
        self.store
            .current()
            .await
            .map_err(|source| ArbiterError::Read { source })
    }

    /// Most recently appended records, newest first.
    pub async fn history(&self, limit: u32) -> Result<Vec<HighScoreRecord>, ArbiterError> {
        self.store
            .history(limit)
            .await
            .map_err(|source| ArbiterError::Read { source })
    }

    /// Arbitrate one submission on behalf of `submitter`.
    pub async fn submit(
        &self,
        submission: ScoreSubmission,
        submitter: &str,
    ) -> Result<SubmitOutcome, ArbiterError> {
        let record = {
            let _gate = self.writer.lock().await;

            let current = self.current().await?.current_view();
            if !improves(&current, submission.number, submission.time) {
                debug!(
                    number = submission.number,
                    time = submission.time,
                    current = current.highest_number,
                    "submission is not a new record"
                );
                return Ok(SubmitOutcome::NoNewRecord);
            }

            let candidate = NewHighScore {
                highest_number: submission.number,
                best_time: Some(submission.time),
                achieved_by: submitter.to_owned(),
                achieved_at: Utc::now(),
            };
            self.store.append(&candidate).await.map_err(|source| {
                error!(error = %source, "failed to persist new high score");
                ArbiterError::Persistence { source }
            })?
        };

        let notified = self.broadcaster.broadcast(&ScoreNotice::RecordChanged);
        info!(
            number = record.highest_number,
            time = ?record.best_time,
            submitter = %record.achieved_by,
            notified,
            "new global high score"
        );

        Ok(SubmitOutcome::NewRecord(record))
    }
}

impl core::fmt::Debug for ScoreArbiter {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ScoreArbiter")
            .field("broadcaster", &self.broadcaster)
            .finish_non_exhaustive()
    }
}
