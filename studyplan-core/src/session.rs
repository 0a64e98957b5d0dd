//! Study session records as logged by the session timer.
//!
//! Timestamps stay as stored text here; the progress aggregator parses them so
//! that one corrupt record never poisons a whole batch.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{MalformedReason, TimestampError};
use crate::task::normalize_subject;
use crate::time::parse_timestamp;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    #[serde(default, alias = "subjectName", skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(default)]
    pub started_at: String,
    /// `None` while the session is still running.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stopped_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mood: Option<String>,
}

/// A session with parsed, ordered timestamps.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedSession {
    pub subject: String,
    pub started_at: DateTime<Utc>,
    /// Open sessions are closed at the caller-supplied `now`.
    pub stopped_at: DateTime<Utc>,
}

impl ResolvedSession {
    /// Elapsed seconds, never negative.
    pub fn elapsed_seconds(&self) -> f64 {
        let ms = (self.stopped_at - self.started_at).num_milliseconds();
        (ms.max(0) as f64) / 1000.0
    }

    pub fn elapsed_hours(&self) -> f64 {
        self.elapsed_seconds() / 3600.0
    }
}

impl SessionRecord {
    pub fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            started_at: started_at.to_rfc3339(),
            ..Self::default()
        }
    }

    pub fn stopped(mut self, stopped_at: DateTime<Utc>) -> Self {
        self.stopped_at = Some(stopped_at.to_rfc3339());
        self
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    pub fn subject(&self) -> String {
        normalize_subject(self.subject.clone())
    }

    pub fn parsed_start(&self) -> Result<DateTime<Utc>, TimestampError> {
        parse_timestamp(&self.started_at)
    }

    /// Parse both timestamps, closing an open session at `now`.
    pub fn resolve(&self, now: DateTime<Utc>) -> Result<ResolvedSession, MalformedReason> {
        let started_at = self
            .parsed_start()
            .map_err(|_| MalformedReason::UnparseableStart)?;
        let stopped_at = match self.stopped_at.as_deref() {
            Some(raw) => parse_timestamp(raw).map_err(|_| MalformedReason::UnparseableStop)?,
            None => now,
        };
        if stopped_at < started_at {
            return Err(MalformedReason::Inverted);
        }
        Ok(ResolvedSession {
            subject: self.subject(),
            started_at,
            stopped_at,
        })
    }
}
