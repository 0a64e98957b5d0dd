//! Availability model: which calendar days are blocked for study.
//!
//! Days are plain calendar dates. Nothing here knows about instants or
//! timezones; callers convert to local dates first.

use std::collections::BTreeSet;

use chrono::{Days, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::error::{Result, ScheduleError};

/// Inclusive range of blocked dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateRange {
    pub fn new(from: NaiveDate, to: NaiveDate) -> Self {
        Self { from, to }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from <= date && date <= self.to
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityRule {
    #[serde(default, alias = "vacations")]
    pub vacation_days: BTreeSet<NaiveDate>,
    #[serde(default, alias = "exceptions")]
    pub exception_ranges: Vec<DateRange>,
}

/// True iff `date` is a vacation day or falls inside an exception range.
pub fn is_blocked(
    date: NaiveDate,
    vacation_days: &BTreeSet<NaiveDate>,
    exception_ranges: &[DateRange],
) -> bool {
    vacation_days.contains(&date) || exception_ranges.iter().any(|r| r.contains(date))
}

impl AvailabilityRule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_vacation(mut self, day: NaiveDate) -> Self {
        self.vacation_days.insert(day);
        self
    }

    pub fn with_exception(mut self, from: NaiveDate, to: NaiveDate) -> Self {
        self.exception_ranges.push(DateRange::new(from, to));
        self
    }

    /// Reject ranges whose start is after their end.
    pub fn validate(&self) -> Result<()> {
        match self
            .exception_ranges
            .iter()
            .enumerate()
            .find(|(_, r)| r.from > r.to)
        {
            Some((index, r)) => Err(ScheduleError::InvalidAvailability {
                index,
                from: r.from,
                to: r.to,
            }),
            None => Ok(()),
        }
    }

    pub fn is_blocked(&self, date: NaiveDate) -> bool {
        is_blocked(date, &self.vacation_days, &self.exception_ranges)
    }

    /// Same as [`is_blocked`](Self::is_blocked), ignoring time-of-day.
    pub fn is_blocked_at(&self, local: NaiveDateTime) -> bool {
        self.is_blocked(local.date())
    }

    /// First open date on or after `from`, looking at most `max_days` days past it.
    pub fn next_open_day(&self, from: NaiveDate, max_days: u32) -> Option<NaiveDate> {
        (0..=u64::from(max_days))
            .map_while(|offset| from.checked_add_days(Days::new(offset)))
            .find(|day| !self.is_blocked(*day))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn vacation_day_is_blocked_all_day() {
        let rule = AvailabilityRule::new().with_vacation(d(2024, 1, 2));
        assert!(rule.is_blocked(d(2024, 1, 2)));
        assert!(rule.is_blocked_at(d(2024, 1, 2).and_hms_opt(23, 59, 0).unwrap()));
        assert!(!rule.is_blocked(d(2024, 1, 3)));
    }

    #[test]
    fn exception_range_is_inclusive() {
        let rule = AvailabilityRule::new().with_exception(d(2024, 3, 10), d(2024, 3, 12));
        assert!(!rule.is_blocked(d(2024, 3, 9)));
        assert!(rule.is_blocked(d(2024, 3, 10)));
        assert!(rule.is_blocked(d(2024, 3, 11)));
        assert!(rule.is_blocked(d(2024, 3, 12)));
        assert!(!rule.is_blocked(d(2024, 3, 13)));
    }

    #[test]
    fn single_day_range_is_valid() {
        let rule = AvailabilityRule::new().with_exception(d(2024, 1, 1), d(2024, 1, 1));
        assert!(rule.validate().is_ok());
        assert!(rule.is_blocked(d(2024, 1, 1)));
    }

    #[test]
    fn reversed_range_is_rejected() {
        let rule = AvailabilityRule::new()
            .with_exception(d(2024, 1, 1), d(2024, 1, 3))
            .with_exception(d(2024, 2, 5), d(2024, 2, 1));
        assert_eq!(
            rule.validate(),
            Err(ScheduleError::InvalidAvailability {
                index: 1,
                from: d(2024, 2, 5),
                to: d(2024, 2, 1),
            })
        );
    }

    #[test]
    fn next_open_day_skips_blocked_run() {
        let rule = AvailabilityRule::new()
            .with_vacation(d(2024, 1, 1))
            .with_exception(d(2024, 1, 2), d(2024, 1, 4));
        assert_eq!(rule.next_open_day(d(2024, 1, 1), 365), Some(d(2024, 1, 5)));
        assert_eq!(rule.next_open_day(d(2024, 1, 5), 0), Some(d(2024, 1, 5)));
        assert_eq!(rule.next_open_day(d(2024, 1, 1), 3), None);
    }

    #[test]
    fn deserializes_planner_meta() {
        let rule: AvailabilityRule = serde_json::from_str(
            r#"{"vacations":["2024-01-02"],"exceptions":[{"from":"2024-01-05","to":"2024-01-06"}]}"#,
        )
        .unwrap();
        assert!(rule.is_blocked(d(2024, 1, 2)));
        assert!(rule.is_blocked(d(2024, 1, 6)));
        assert!(rule.validate().is_ok());
    }
}
