use chrono::{DateTime, Utc};
use studyplan_core::Task;

pub struct CalendarEvent {
    pub uid: String,
    pub start_utc: DateTime<Utc>,
    pub end_utc: DateTime<Utc>,
    pub summary: String,
    pub description: String,
}

/// One event per placed task; unscheduled tasks are left out.
pub fn tasks_to_events(tasks: &[Task], prefix: &str) -> Vec<CalendarEvent> {
    tasks
        .iter()
        .filter_map(|t| {
            let (start, end) = (t.scheduled_start?, t.scheduled_end?);
            Some(CalendarEvent {
                uid: format!("{}@studyplan", t.id),
                start_utc: start,
                end_utc: end,
                summary: format!("{}{}", prefix, t.title),
                description: format!(
                    "TaskId: {}\nSubject: {}\nDuration: {}m\nPriority: {}\n",
                    t.id, t.subject, t.duration_minutes, t.priority
                ),
            })
        })
        .collect()
}

/// Minimal ICS calendar with UTC DTSTART/DTEND.
///
/// UIDs derive from task ids, so re-importing a rescheduled plan updates the
/// existing events instead of duplicating them.
pub fn events_to_ics(events: &[CalendarEvent]) -> String {
    let mut s = String::new();
    s.push_str("BEGIN:VCALENDAR\r\nVERSION:2.0\r\nPRODID:-//studyplan//EN\r\n");

    for e in events {
        s.push_str("BEGIN:VEVENT\r\n");
        s.push_str(&format!("UID:{}\r\n", escape_ics(&e.uid)));
        s.push_str(&format!("DTSTART:{}\r\n", e.start_utc.format("%Y%m%dT%H%M%SZ")));
        s.push_str(&format!("DTEND:{}\r\n", e.end_utc.format("%Y%m%dT%H%M%SZ")));
        s.push_str(&format!("SUMMARY:{}\r\n", escape_ics(&e.summary)));
        s.push_str(&format!("DESCRIPTION:{}\r\n", escape_ics(&e.description)));
        s.push_str("END:VEVENT\r\n");
    }

    s.push_str("END:VCALENDAR\r\n");
    s
}

fn escape_ics(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('\n', "\\n")
        .replace(',', "\\,")
        .replace(';', "\\;")
}
