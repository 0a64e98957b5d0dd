//! Progress aggregation: session log -> weekly hours and the 7-day mastery heatmap.
//!
//! Both metrics are pure functions of (sessions, window start, now). Records
//! with unparseable or inverted timestamps are skipped and reported in
//! `issues`; they never abort the aggregation.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Days, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{MalformedReason, SessionIssue};
use crate::session::{ResolvedSession, SessionRecord};
use crate::time::{local_midnight, to_local};

/// Number of day buckets in the heatmap.
pub const HEATMAP_DAYS: usize = 7;
/// Hours of study in one day that count as full intensity.
pub const FULL_INTENSITY_HOURS: f64 = 2.0;
pub const DEFAULT_WEEKLY_TARGET_HOURS: f64 = 8.0;

const MS_PER_DAY: i64 = 86_400_000;

/// Per-subject, per-day normalized intensity in `[0, 1]`.
pub type Mastery = BTreeMap<String, [f64; HEATMAP_DAYS]>;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HoursSummary {
    pub hours: f64,
    pub issues: Vec<SessionIssue>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Heatmap {
    pub mastery: Mastery,
    pub issues: Vec<SessionIssue>,
}

/// Dashboard figure combining the weekly total and the heatmap.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressReport {
    pub hours_this_week: f64,
    pub target_hours: f64,
    pub mastery: Mastery,
    pub issues: Vec<SessionIssue>,
}

/// Which weekday a week begins on. Callers pick; nothing here assumes one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeekStart {
    Sunday,
    Monday,
}

impl FromStr for WeekStart {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sunday" | "sun" => Ok(WeekStart::Sunday),
            "monday" | "mon" => Ok(WeekStart::Monday),
            other => Err(format!("unknown week start: {other} (expected sunday or monday)")),
        }
    }
}

impl fmt::Display for WeekStart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WeekStart::Sunday => write!(f, "sunday"),
            WeekStart::Monday => write!(f, "monday"),
        }
    }
}

/// Local midnight at the start of the week containing `now`.
pub fn week_start(now: DateTime<Utc>, start: WeekStart, tz: Tz) -> DateTime<Utc> {
    let today = to_local(tz, now).date();
    let back = match start {
        WeekStart::Sunday => today.weekday().num_days_from_sunday(),
        WeekStart::Monday => today.weekday().num_days_from_monday(),
    };
    let first = today.checked_sub_days(Days::new(u64::from(back))).unwrap_or(today);
    local_midnight(tz, first)
}

/// Local midnight `days - 1` days before today, so the window covers `days` calendar days.
pub fn trailing_window_start(now: DateTime<Utc>, days: u32, tz: Tz) -> DateTime<Utc> {
    let today = to_local(tz, now).date();
    let back = u64::from(days.saturating_sub(1));
    let first = today.checked_sub_days(Days::new(back)).unwrap_or(today);
    local_midnight(tz, first)
}

/// Sessions starting at or after `window_start`, plus issues for the bad ones.
fn sessions_in_window(
    sessions: &[SessionRecord],
    window_start: DateTime<Utc>,
    now: DateTime<Utc>,
) -> (Vec<ResolvedSession>, Vec<SessionIssue>) {
    let mut kept = Vec::new();
    let mut issues = Vec::new();

    for (index, record) in sessions.iter().enumerate() {
        let outcome = match record.parsed_start() {
            Err(_) => Err(MalformedReason::UnparseableStart),
            Ok(start) if start < window_start => continue,
            Ok(_) => record.resolve(now),
        };

        match outcome {
            Ok(resolved) => kept.push(resolved),
            Err(reason) => {
                warn!(index, ?reason, task_id = ?record.task_id, "skipping malformed session");
                issues.push(SessionIssue::MalformedTimestamp {
                    index,
                    task_id: record.task_id.clone(),
                    reason,
                });
            }
        }
    }

    (kept, issues)
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Total elapsed hours of sessions started at or after `window_start`, to 2 decimals.
pub fn summarize(
    sessions: &[SessionRecord],
    window_start: DateTime<Utc>,
    now: DateTime<Utc>,
) -> HoursSummary {
    let (kept, issues) = sessions_in_window(sessions, window_start, now);
    let seconds: f64 = kept.iter().map(ResolvedSession::elapsed_seconds).sum();
    HoursSummary {
        hours: round2(seconds / 3600.0),
        issues,
    }
}

/// Per-subject daily intensity over the 7 days starting at `window_start`.
///
/// Sessions past the last bucket land in it. A 2-hour day is full intensity.
pub fn heatmap(
    sessions: &[SessionRecord],
    window_start: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Heatmap {
    let (kept, issues) = sessions_in_window(sessions, window_start, now);

    let mut hours: BTreeMap<String, [f64; HEATMAP_DAYS]> = BTreeMap::new();
    for s in &kept {
        let offset_ms = (s.started_at - window_start).num_milliseconds().max(0);
        let day_index = ((offset_ms / MS_PER_DAY) as usize).min(HEATMAP_DAYS - 1);
        hours.entry(s.subject.clone()).or_insert([0.0; HEATMAP_DAYS])[day_index] +=
            s.elapsed_hours();
    }

    let mastery = hours
        .into_iter()
        .map(|(subject, row)| (subject, row.map(|h| (h / FULL_INTENSITY_HOURS).min(1.0))))
        .collect();

    Heatmap { mastery, issues }
}

/// Weekly total against a target, plus the trailing heatmap.
pub fn progress_report(
    sessions: &[SessionRecord],
    week_start: DateTime<Utc>,
    heatmap_start: DateTime<Utc>,
    target_hours: f64,
    now: DateTime<Utc>,
) -> ProgressReport {
    let summary = summarize(sessions, week_start, now);
    let map = heatmap(sessions, heatmap_start, now);

    let mut issues = summary.issues;
    for issue in map.issues {
        if !issues.contains(&issue) {
            issues.push(issue);
        }
    }

    ProgressReport {
        hours_this_week: summary.hours,
        target_hours,
        mastery: map.mastery,
        issues,
    }
}
