use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;
use studyplan_core::{
    heatmap, schedule, summarize, AvailabilityRule, ScheduleError, ScheduleIssue, ScheduleOptions,
    SessionRecord, Task,
};

// 2024-01-01 is a Monday.
fn mon(h: u32, m: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, h, m, 0).unwrap()
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn scenario_a_two_tasks_same_evening() {
    let tasks = vec![
        Task::new("t1", "Algebra drills").with_duration(45),
        Task::new("t2", "Essay outline").with_duration(60),
    ];
    let out = schedule(&tasks, &AvailabilityRule::new(), &ScheduleOptions::default(), mon(10, 0))
        .unwrap();

    assert_eq!(out.tasks[0].scheduled_start, Some(mon(18, 0)));
    assert_eq!(out.tasks[0].scheduled_end, Some(mon(18, 45)));
    assert_eq!(out.tasks[1].scheduled_start, Some(mon(18, 55)));
    assert_eq!(out.tasks[1].scheduled_end, Some(mon(19, 55)));
    assert!(out.unscheduled_ids.is_empty());
    assert!(!out.exhausted);
    assert!(out.issues.is_empty());
}

#[test]
fn scenario_b_task_longer_than_window() {
    let tasks = vec![Task::new("long", "Mock exam").with_duration(300)];
    let out = schedule(&tasks, &AvailabilityRule::new(), &ScheduleOptions::default(), mon(10, 0))
        .unwrap();

    assert!(out.tasks[0].scheduled_start.is_none());
    assert!(out.tasks[0].scheduled_end.is_none());
    assert_eq!(out.unscheduled_ids, vec!["long".to_string()]);
    assert!(!out.exhausted);
    assert_eq!(
        out.issues,
        vec![ScheduleIssue::UnplaceableTask {
            task_id: "long".into(),
            duration_minutes: 300,
            window_minutes: 240,
        }]
    );
}

#[test]
fn scenario_c_late_start_skips_blocked_tomorrow() {
    let rule = AvailabilityRule::new().with_vacation(date(2024, 1, 2));
    let tasks = vec![Task::new("t", "Flashcards").with_duration(30)];
    let out = schedule(&tasks, &rule, &ScheduleOptions::default(), mon(21, 50)).unwrap();

    let expected = Utc.with_ymd_and_hms(2024, 1, 3, 18, 0, 0).unwrap();
    assert_eq!(out.tasks[0].scheduled_start, Some(expected));
    assert_eq!(out.tasks[0].scheduled_end, Some(expected + Duration::minutes(30)));
}

#[test]
fn scenario_d_two_hour_math_session() {
    let sessions = vec![SessionRecord::new(mon(9, 0)).stopped(mon(11, 0)).with_subject("Math")];
    let window_start = mon(0, 0);
    let now = mon(12, 0);

    assert_eq!(summarize(&sessions, window_start, now).hours, 2.0);

    let map = heatmap(&sessions, window_start, now);
    assert_eq!(map.mastery.len(), 1);
    assert_eq!(map.mastery["Math"], [1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
}

#[test]
fn scenario_e_exception_range_bounds() {
    let single = AvailabilityRule::new().with_exception(date(2024, 1, 1), date(2024, 1, 1));
    assert!(single.validate().is_ok());
    let out = schedule(&[Task::new("t", "t")], &single, &ScheduleOptions::default(), mon(10, 0))
        .unwrap();
    assert_eq!(
        out.tasks[0].scheduled_start,
        Some(Utc.with_ymd_and_hms(2024, 1, 2, 18, 0, 0).unwrap())
    );

    let reversed = AvailabilityRule::new().with_exception(date(2024, 1, 2), date(2024, 1, 1));
    let err = schedule(&[Task::new("t", "t")], &reversed, &ScheduleOptions::default(), mon(10, 0))
        .unwrap_err();
    assert!(matches!(err, ScheduleError::InvalidAvailability { .. }));
}

#[test]
fn placements_never_start_on_blocked_days() {
    let rule = AvailabilityRule::new()
        .with_vacation(date(2024, 1, 3))
        .with_vacation(date(2024, 1, 6))
        .with_exception(date(2024, 1, 8), date(2024, 1, 12));
    let tasks: Vec<Task> = (0..25)
        .map(|i| Task::new(format!("t{i}"), "work").with_duration(30 + (i % 5) * 25))
        .collect();
    let tz: Tz = "Europe/Berlin".parse().unwrap();
    let opts = ScheduleOptions::default().with_timezone(tz);

    let out = schedule(&tasks, &rule, &opts, mon(10, 0)).unwrap();
    assert!(out.unscheduled_ids.is_empty());

    for t in out.placed() {
        let start = t.scheduled_start.unwrap();
        let end = t.scheduled_end.unwrap();
        assert!(start < end, "{} has start >= end", t.id);
        assert_eq!(end - start, t.duration());
        assert!(
            !rule.is_blocked(start.with_timezone(&tz).date_naive()),
            "{} starts on a blocked day",
            t.id
        );
    }

    // Input order is kept and placements never overlap.
    let ids: Vec<&str> = out.tasks.iter().map(|t| t.id.as_str()).collect();
    let expected: Vec<String> = (0..25).map(|i| format!("t{i}")).collect();
    assert_eq!(ids, expected.iter().map(String::as_str).collect::<Vec<_>>());
    for pair in out.tasks.windows(2) {
        assert!(pair[0].scheduled_end.unwrap() <= pair[1].scheduled_start.unwrap());
    }
}

#[test]
fn scheduling_is_idempotent() {
    let rule = AvailabilityRule::new().with_vacation(date(2024, 1, 2));
    let tasks: Vec<Task> = (0..8)
        .map(|i| Task::new(format!("t{i}"), "x").with_duration(40 + i * 10))
        .collect();
    let opts = ScheduleOptions::default();

    let first = schedule(&tasks, &rule, &opts, mon(20, 13)).unwrap();
    let second = schedule(&tasks, &rule, &opts, mon(20, 13)).unwrap();
    assert_eq!(first, second);

    // Feeding the output back in yields the same placements.
    let third = schedule(&first.tasks, &rule, &opts, mon(20, 13)).unwrap();
    assert_eq!(first.tasks, third.tasks);
}

#[test]
fn aggregation_is_idempotent_and_bounded() {
    let mut sessions = Vec::new();
    for day in 0..9 {
        let start = mon(8, 0) + Duration::days(day) + Duration::minutes(day * 7);
        sessions.push(
            SessionRecord::new(start)
                .stopped(start + Duration::minutes(35 * (day + 1)))
                .with_subject(if day % 2 == 0 { "Math" } else { "Physics" }),
        );
    }
    sessions.push(SessionRecord::new(mon(8, 0) + Duration::days(9)));
    sessions.push(SessionRecord {
        started_at: "31/12/2023".into(),
        ..SessionRecord::default()
    });

    let now = mon(12, 0) + Duration::days(9);
    let a = heatmap(&sessions, mon(0, 0), now);
    let b = heatmap(&sessions, mon(0, 0), now);
    assert_eq!(a, b);
    assert_eq!(summarize(&sessions, mon(0, 0), now), summarize(&sessions, mon(0, 0), now));

    assert_eq!(a.issues.len(), 1);
    for row in a.mastery.values() {
        assert!(row.iter().all(|v| (0.0..=1.0).contains(v)));
    }
}
