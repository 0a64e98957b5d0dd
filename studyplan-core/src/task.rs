//! Task model: the unit the auto-scheduler places into work windows.
//!
//! Tasks come from the storage layer, so deserialization is lenient: missing
//! or junk durations fall back to 30 minutes, priority is clamped into 1-5,
//! and the field names the planner UI historically used are accepted as aliases.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Deserializer, Serialize};

pub const DEFAULT_SUBJECT: &str = "General";
pub const DEFAULT_DURATION_MINUTES: u32 = 30;
pub const DEFAULT_PRIORITY: u8 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    #[default]
    Todo,
    InProgress,
    Done,
}

/// Core task type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default = "default_subject", deserialize_with = "lenient_subject")]
    pub subject: String,

    /// Minutes; always positive.
    #[serde(
        default = "default_duration",
        alias = "durationMin",
        deserialize_with = "lenient_duration"
    )]
    pub duration_minutes: u32,

    /// 1-5. Advisory only: placement never looks at it.
    #[serde(default = "default_priority", deserialize_with = "lenient_priority")]
    pub priority: u8,

    #[serde(default)]
    pub status: TaskStatus,

    #[serde(default, alias = "start")]
    pub scheduled_start: Option<DateTime<Utc>>,
    #[serde(default, alias = "end")]
    pub scheduled_end: Option<DateTime<Utc>>,
}

impl Task {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: None,
            subject: default_subject(),
            duration_minutes: DEFAULT_DURATION_MINUTES,
            priority: DEFAULT_PRIORITY,
            status: TaskStatus::Todo,
            scheduled_start: None,
            scheduled_end: None,
        }
    }

    pub fn with_duration(mut self, minutes: u32) -> Self {
        self.duration_minutes = if minutes == 0 {
            DEFAULT_DURATION_MINUTES
        } else {
            minutes
        };
        self
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = normalize_subject(Some(subject.into()));
        self
    }

    pub fn with_priority(mut self, priority: u8) -> Self {
        self.priority = priority.clamp(1, 5);
        self
    }

    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = status;
        self
    }

    pub fn duration(&self) -> Duration {
        Duration::minutes(i64::from(self.duration_minutes))
    }

    pub fn is_scheduled(&self) -> bool {
        self.scheduled_start.is_some() && self.scheduled_end.is_some()
    }

    pub fn is_done(&self) -> bool {
        self.status == TaskStatus::Done
    }

    pub(crate) fn place(&mut self, start: DateTime<Utc>) {
        self.scheduled_start = Some(start);
        self.scheduled_end = Some(start + self.duration());
    }

    pub(crate) fn unschedule(&mut self) {
        self.scheduled_start = None;
        self.scheduled_end = None;
    }
}

/// Blank or missing subjects collapse to `"General"`.
pub fn normalize_subject(subject: Option<String>) -> String {
    match subject {
        Some(s) if !s.trim().is_empty() => s.trim().to_string(),
        _ => default_subject(),
    }
}

fn default_subject() -> String {
    DEFAULT_SUBJECT.to_string()
}

pub(crate) fn default_duration() -> u32 {
    DEFAULT_DURATION_MINUTES
}

pub(crate) fn default_priority() -> u8 {
    DEFAULT_PRIORITY
}

/// Numbers the storage layer may hand us: real numbers, numeric strings, junk.
#[derive(Deserialize)]
#[serde(untagged)]
enum LooseNumber {
    Number(f64),
    Text(String),
    Other(serde::de::IgnoredAny),
}

impl LooseNumber {
    fn as_f64(&self) -> Option<f64> {
        let v = match self {
            LooseNumber::Number(n) => *n,
            LooseNumber::Text(s) => s.trim().parse::<f64>().ok()?,
            LooseNumber::Other(_) => return None,
        };
        v.is_finite().then_some(v)
    }
}

pub(crate) fn lenient_duration<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<LooseNumber>::deserialize(deserializer)?;
    Ok(raw
        .as_ref()
        .and_then(LooseNumber::as_f64)
        .filter(|m| *m > 0.0)
        .map(|m| m.ceil().min(f64::from(u32::MAX)) as u32)
        .unwrap_or(DEFAULT_DURATION_MINUTES))
}

pub(crate) fn lenient_priority<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<LooseNumber>::deserialize(deserializer)?;
    Ok(raw
        .as_ref()
        .and_then(LooseNumber::as_f64)
        .map(|p| p.round().clamp(1.0, 5.0) as u8)
        .unwrap_or(DEFAULT_PRIORITY))
}

fn lenient_subject<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(normalize_subject(Option::<String>::deserialize(deserializer)?))
}
