//! Global high-score records and the values exchanged around them.
//!
//! The high-score history is append-only. The "current" record is never
//! stored as a pointer; it is derived from the history with
//! [`HighScoreRecord::rank_cmp`]: highest number first, then lowest time,
//! where a missing time ranks below any recorded time.

use core::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Submitter identity recorded on the zero-value seed record.
pub const SEED_SUBMITTER: &str = "system";

/// Wire text of a "record changed" notification.
const NOTICE_RECORD_CHANGED: &str = "update";

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// One appended row of the global high-score history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct HighScoreRecord {
    /// Insertion-order identifier assigned by the store.
    pub id: i64,
    /// Best tile value ever reached. Monotonic across the current view.
    pub highest_number: i64,
    /// Seconds taken to reach `highest_number`. Lower is better; `None`
    /// means no time has been recorded yet (the seed record).
    pub best_time: Option<i64>,
    /// Opaque submitter identity (the peer address for HTTP submissions).
    pub achieved_by: String,
    /// When the record was appended.
    pub achieved_at: DateTime<Utc>,
}

impl HighScoreRecord {
    /// Compare two records under the current-record ordering.
    ///
    /// Returns [`Ordering::Greater`] when `self` ranks above `other`:
    /// a higher number wins, then a lower recorded time. Records with a
    /// time rank above records without one. Insertion order is not
    /// considered; stores break exact ties by earliest insertion.
    pub fn rank_cmp(&self, other: &Self) -> Ordering {
        self.highest_number
            .cmp(&other.highest_number)
            .then_with(|| match (self.best_time, other.best_time) {
                (Some(mine), Some(theirs)) => theirs.cmp(&mine),
                (Some(_), None) => Ordering::Greater,
                (None, Some(_)) => Ordering::Less,
                (None, None) => Ordering::Equal,
            })
    }

    /// Project the record onto the public current-record view.
    pub const fn current_view(&self) -> CurrentHighScore {
        CurrentHighScore {
            highest_number: self.highest_number,
            best_time: self.best_time,
        }
    }
}

/// A record about to be appended; the store assigns the `id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewHighScore {
    /// Tile value reached.
    pub highest_number: i64,
    /// Seconds taken, if known.
    pub best_time: Option<i64>,
    /// Opaque submitter identity.
    pub achieved_by: String,
    /// Append timestamp.
    pub achieved_at: DateTime<Utc>,
}

impl NewHighScore {
    /// The zero-value record created when the history is empty.
    pub fn seed(now: DateTime<Utc>) -> Self {
        Self {
            highest_number: 0,
            best_time: None,
            achieved_by: SEED_SUBMITTER.to_owned(),
            achieved_at: now,
        }
    }

    /// Attach a store-assigned identifier.
    pub fn with_id(self, id: i64) -> HighScoreRecord {
        HighScoreRecord {
            id,
            highest_number: self.highest_number,
            best_time: self.best_time,
            achieved_by: self.achieved_by,
            achieved_at: self.achieved_at,
        }
    }
}

/// Public view of the current record served to game clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct CurrentHighScore {
    /// Best tile value ever reached.
    pub highest_number: i64,
    /// Best time for that value, if any.
    pub best_time: Option<i64>,
}

// ---------------------------------------------------------------------------
// Submissions
// ---------------------------------------------------------------------------

/// A candidate score submitted by a game client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ScoreSubmission {
    /// Tile value reached.
    pub number: i64,
    /// Seconds elapsed when it was reached.
    pub time: i64,
}

/// Result of arbitrating one submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The submission beat the current record and was appended.
    NewRecord(HighScoreRecord),
    /// The submission did not improve on the current record.
    NoNewRecord,
}

impl SubmitOutcome {
    /// Whether the submission changed the current record.
    pub const fn updated(&self) -> bool {
        matches!(self, Self::NewRecord(_))
    }

    /// Client-facing status message.
    pub const fn message(&self) -> &'static str {
        match self {
            Self::NewRecord(_) => "New record!",
            Self::NoNewRecord => "No new record",
        }
    }
}

// ---------------------------------------------------------------------------
// Notifications
// ---------------------------------------------------------------------------

/// Broadcast token pushed to every connected viewer.
///
/// Carries no data about the record itself: it only means "the current
/// record changed, re-query it".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScoreNotice {
    /// The current high-score record changed.
    RecordChanged,
}

impl ScoreNotice {
    /// Text sent on the wire for this notice.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::RecordChanged => NOTICE_RECORD_CHANGED,
        }
    }
}

impl core::fmt::Display for ScoreNotice {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(highest_number: i64, best_time: Option<i64>) -> HighScoreRecord {
        NewHighScore {
            highest_number,
            best_time,
            achieved_by: String::from("127.0.0.1"),
            achieved_at: Utc::now(),
        }
        .with_id(1)
    }

    #[test]
    fn higher_number_ranks_above_regardless_of_time() {
        assert_eq!(
            record(8, Some(500)).rank_cmp(&record(4, Some(1))),
            Ordering::Greater
        );
    }

    #[test]
    fn equal_number_lower_time_ranks_above() {
        assert_eq!(
            record(8, Some(10)).rank_cmp(&record(8, Some(12))),
            Ordering::Greater
        );
        assert_eq!(
            record(8, Some(12)).rank_cmp(&record(8, Some(10))),
            Ordering::Less
        );
    }

    #[test]
    fn missing_time_ranks_below_recorded_time() {
        assert_eq!(record(0, None).rank_cmp(&record(0, Some(99))), Ordering::Less);
        assert_eq!(record(0, None).rank_cmp(&record(0, None)), Ordering::Equal);
    }

    #[test]
    fn seed_is_zero_with_no_time() {
        let seed = NewHighScore::seed(Utc::now()).with_id(1);
        assert_eq!(seed.highest_number, 0);
        assert_eq!(seed.best_time, None);
        assert_eq!(seed.achieved_by, SEED_SUBMITTER);
    }

    #[test]
    fn outcome_messages() {
        let outcome = SubmitOutcome::NewRecord(record(2, Some(3)));
        assert!(outcome.updated());
        assert_eq!(outcome.message(), "New record!");
        assert!(!SubmitOutcome::NoNewRecord.updated());
        assert_eq!(SubmitOutcome::NoNewRecord.message(), "No new record");
    }

    #[test]
    fn current_view_serializes_snake_case() {
        let json = serde_json::to_value(record(16, Some(42)).current_view()).unwrap_or_default();
        assert_eq!(json["highest_number"], 16);
        assert_eq!(json["best_time"], 42);
    }

    #[test]
    fn notice_wire_text() {
        assert_eq!(ScoreNotice::RecordChanged.as_str(), "update");
        assert_eq!(ScoreNotice::RecordChanged.to_string(), "update");
    }
}
