//! Auto-scheduler: greedy, order-preserving placement into a daily work window.
//!
//! Tasks are placed one after another starting at the window start of the
//! first open day. A task that would run past the window end is retried at the
//! window start of the next open day; it is never split or shortened. Blocked
//! days are skipped with a bounded look-ahead so pathological availability
//! (every day a vacation) terminates.

use std::collections::VecDeque;

use chrono::{DateTime, Days, Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use tracing::{debug, warn};

use crate::availability::AvailabilityRule;
use crate::error::{Result, ScheduleError, ScheduleIssue};
use crate::task::Task;
use crate::time::{ceil_to_minute, localize, to_local};

pub const DEFAULT_WINDOW_START_HOUR: u32 = 18;
pub const DEFAULT_WINDOW_END_HOUR: u32 = 22;
pub const DEFAULT_BREAK_MINUTES: u32 = 10;
pub const DEFAULT_MAX_LOOKAHEAD_DAYS: u32 = 365;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScheduleOptions {
    /// Local hour the daily window opens (inclusive).
    pub window_start_hour: u32,
    /// Local hour the daily window closes (exclusive); 24 means midnight.
    pub window_end_hour: u32,
    /// Gap left after each placed task.
    pub break_minutes: u32,
    /// How many days past the current one a single day-advance may look.
    pub max_lookahead_days: u32,
    /// Zone the window hours and blocked dates are read in.
    pub timezone: Tz,
}

impl Default for ScheduleOptions {
    fn default() -> Self {
        Self {
            window_start_hour: DEFAULT_WINDOW_START_HOUR,
            window_end_hour: DEFAULT_WINDOW_END_HOUR,
            break_minutes: DEFAULT_BREAK_MINUTES,
            max_lookahead_days: DEFAULT_MAX_LOOKAHEAD_DAYS,
            timezone: Tz::UTC,
        }
    }
}

impl ScheduleOptions {
    pub fn with_window(mut self, start_hour: u32, end_hour: u32) -> Self {
        self.window_start_hour = start_hour;
        self.window_end_hour = end_hour;
        self
    }

    pub fn with_timezone(mut self, tz: Tz) -> Self {
        self.timezone = tz;
        self
    }

    pub fn with_lookahead(mut self, days: u32) -> Self {
        self.max_lookahead_days = days;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.window_start_hour >= self.window_end_hour || self.window_end_hour > 24 {
            return Err(ScheduleError::InvalidWindow {
                start: self.window_start_hour,
                end: self.window_end_hour,
            });
        }
        Ok(())
    }

    /// Length of the daily window.
    pub fn window_minutes(&self) -> u32 {
        self.window_end_hour.saturating_sub(self.window_start_hour) * 60
    }

    fn window_start(&self, day: NaiveDate) -> NaiveDateTime {
        day.and_time(NaiveTime::MIN) + Duration::hours(i64::from(self.window_start_hour))
    }

    fn window_end(&self, day: NaiveDate) -> NaiveDateTime {
        day.and_time(NaiveTime::MIN) + Duration::hours(i64::from(self.window_end_hour))
    }
}

/// Result of a scheduling pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleOutcome {
    /// Every input task, in input order, with placements filled in.
    pub tasks: Vec<Task>,
    pub unscheduled_ids: Vec<String>,
    /// True when the look-ahead bound ran out before all tasks were placed.
    pub exhausted: bool,
    pub issues: Vec<ScheduleIssue>,
}

impl ScheduleOutcome {
    pub fn placed(&self) -> impl Iterator<Item = &Task> {
        self.tasks.iter().filter(|t| t.is_scheduled())
    }
}

/// Next candidate start: the local day whose window is being filled and the
/// instant a task placed now would begin.
#[derive(Debug, Clone, Copy)]
struct Cursor {
    day: NaiveDate,
    at: DateTime<Utc>,
}

impl Cursor {
    /// Start on the local day of `now`, no earlier than the window start.
    fn open(now: DateTime<Utc>, availability: &AvailabilityRule, opts: &ScheduleOptions) -> Option<Self> {
        let tz = opts.timezone;
        let day = to_local(tz, now).date();
        let cursor = Self {
            day,
            at: ceil_to_minute(now.naive_utc())
                .and_utc()
                .max(localize(tz, opts.window_start(day))),
        };
        if availability.is_blocked(day) {
            cursor.next_open_day(availability, opts)
        } else {
            Some(cursor)
        }
    }

    /// End of a task of `duration` started here, if it stays inside today's
    /// window. Compared as instants so a DST change inside the window shrinks
    /// or grows it by the real amount.
    fn fit(&self, duration: Duration, opts: &ScheduleOptions) -> Option<DateTime<Utc>> {
        let end = self.at + duration;
        (end <= localize(opts.timezone, opts.window_end(self.day))).then_some(end)
    }

    /// Window start of the first open day after the current one.
    fn next_open_day(&self, availability: &AvailabilityRule, opts: &ScheduleOptions) -> Option<Self> {
        let first = self.day.checked_add_days(Days::new(1))?;
        let span = opts.max_lookahead_days.checked_sub(1)?;
        let day = availability.next_open_day(first, span)?;
        let skipped = (day - first).num_days();
        if skipped > 0 {
            debug!(from = %first, to = %day, skipped, "skipped blocked days");
        }
        Some(Self {
            day,
            at: localize(opts.timezone, opts.window_start(day)),
        })
    }
}

/// Assign start/end times to `tasks` in order.
///
/// Structural problems (reversed exception range, bad window) reject the call
/// outright. Tasks longer than the window and tasks left over when the
/// look-ahead runs out are returned unscheduled and listed in `issues`.
pub fn schedule(
    tasks: &[Task],
    availability: &AvailabilityRule,
    options: &ScheduleOptions,
    now: DateTime<Utc>,
) -> Result<ScheduleOutcome> {
    availability.validate()?;
    options.validate()?;

    let window_minutes = options.window_minutes();
    let break_len = Duration::minutes(i64::from(options.break_minutes));

    let mut pending: VecDeque<Task> = tasks.iter().cloned().collect();
    let mut finished: Vec<Task> = Vec::with_capacity(tasks.len());
    let mut issues: Vec<ScheduleIssue> = Vec::new();
    let mut exhausted = false;

    let mut cursor = if pending.is_empty() {
        None
    } else {
        Cursor::open(now, availability, options)
    };

    while let Some(mut task) = pending.pop_front() {
        let Some(current) = cursor else {
            pending.push_front(task);
            exhausted = true;
            break;
        };

        if task.duration_minutes > window_minutes {
            warn!(
                task_id = %task.id,
                duration = task.duration_minutes,
                window = window_minutes,
                "task longer than work window"
            );
            issues.push(ScheduleIssue::UnplaceableTask {
                task_id: task.id.clone(),
                duration_minutes: task.duration_minutes,
                window_minutes,
            });
            task.unschedule();
            finished.push(task);
            continue;
        }

        match current.fit(task.duration(), options) {
            Some(end) => {
                task.place(current.at);
                debug!(task_id = %task.id, start = %current.at, end = %end, "placed task");
                cursor = Some(Cursor {
                    day: current.day,
                    at: end + break_len,
                });
                finished.push(task);
            }
            None => {
                // Retry the same task on the next open day.
                cursor = current.next_open_day(availability, options);
                pending.push_front(task);
            }
        }
    }

    if exhausted {
        let task_ids: Vec<String> = pending.iter().map(|t| t.id.clone()).collect();
        warn!(
            remaining = task_ids.len(),
            lookahead_days = options.max_lookahead_days,
            "no open day within look-ahead"
        );
        issues.push(ScheduleIssue::SchedulingExhausted {
            task_ids,
            lookahead_days: options.max_lookahead_days,
        });
        finished.extend(pending.into_iter().map(|mut t| {
            t.unschedule();
            t
        }));
    }

    let unscheduled_ids = finished
        .iter()
        .filter(|t| !t.is_scheduled())
        .map(|t| t.id.clone())
        .collect();

    Ok(ScheduleOutcome {
        tasks: finished,
        unscheduled_ids,
        exhausted,
        issues,
    })
}
