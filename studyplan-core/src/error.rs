//! Error and issue types for scheduling and aggregation.
//!
//! Structural input problems abort a call and surface as `ScheduleError`.
//! Per-item problems are plain data (`ScheduleIssue`, `SessionIssue`) returned
//! next to the best-effort result; callers decide how to present them.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that reject a scheduling call before any placement happens.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("Invalid availability: exception range #{index} starts {from} after it ends {to}")]
    InvalidAvailability {
        index: usize,
        from: NaiveDate,
        to: NaiveDate,
    },

    #[error("Invalid work window: {start}:00-{end}:00 (need start < end <= 24)")]
    InvalidWindow { start: u32, end: u32 },
}

/// Result type alias for scheduling operations
pub type Result<T> = std::result::Result<T, ScheduleError>;

/// A per-task condition reported alongside a schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ScheduleIssue {
    /// The task is longer than the whole work window and can never fit.
    #[serde(rename_all = "camelCase")]
    UnplaceableTask {
        task_id: String,
        duration_minutes: u32,
        window_minutes: u32,
    },
    /// No open day was found within the look-ahead bound.
    #[serde(rename_all = "camelCase")]
    SchedulingExhausted {
        task_ids: Vec<String>,
        lookahead_days: u32,
    },
}

/// Why a session record was left out of aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MalformedReason {
    UnparseableStart,
    UnparseableStop,
    /// `stoppedAt` precedes `startedAt`.
    Inverted,
}

/// A per-record condition reported alongside aggregated metrics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum SessionIssue {
    #[serde(rename_all = "camelCase")]
    MalformedTimestamp {
        /// Position of the record in the input slice.
        index: usize,
        task_id: Option<String>,
        reason: MalformedReason,
    },
}

/// Timestamp text that could not be parsed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unparseable timestamp: {0:?}")]
pub struct TimestampError(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_availability_message_names_the_range() {
        let err = ScheduleError::InvalidAvailability {
            index: 1,
            from: NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
            to: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
        };
        let msg = err.to_string();
        assert!(msg.contains("#1"));
        assert!(msg.contains("2024-01-05"));
        assert!(msg.contains("2024-01-02"));
    }

    #[test]
    fn issues_serialize_with_kind_tag() {
        let issue = ScheduleIssue::UnplaceableTask {
            task_id: "t1".into(),
            duration_minutes: 300,
            window_minutes: 240,
        };
        let json = serde_json::to_string(&issue).unwrap();
        assert!(json.contains("\"kind\":\"unplaceableTask\""));
        assert!(json.contains("\"taskId\":\"t1\""));
        assert!(json.contains("\"windowMinutes\":240"));

        let issue = SessionIssue::MalformedTimestamp {
            index: 3,
            task_id: None,
            reason: MalformedReason::Inverted,
        };
        let json = serde_json::to_string(&issue).unwrap();
        assert!(json.contains("\"kind\":\"malformedTimestamp\""));
        assert!(json.contains("\"reason\":\"inverted\""));
    }
}
