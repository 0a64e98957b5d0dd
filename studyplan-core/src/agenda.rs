//! Day agenda views over a scheduled plan.

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;

use crate::task::Task;
use crate::time::to_local;

/// Open tasks for `day`: those starting on that local date, plus unscheduled ones.
///
/// Unscheduled tasks are listed because they are still candidates for the day.
pub fn tasks_for_day(tasks: &[Task], day: NaiveDate, tz: Tz) -> Vec<Task> {
    tasks
        .iter()
        .filter(|t| !t.is_done())
        .filter(|t| match t.scheduled_start {
            Some(start) => to_local(tz, start).date() == day,
            None => t.scheduled_end.is_none(),
        })
        .cloned()
        .collect()
}

/// The earliest scheduled, unfinished task that has not ended yet.
pub fn next_task(tasks: &[Task], now: DateTime<Utc>) -> Option<&Task> {
    tasks
        .iter()
        .filter(|t| !t.is_done())
        .filter(|t| t.scheduled_end.is_some_and(|end| end > now))
        .min_by_key(|t| t.scheduled_start)
}
