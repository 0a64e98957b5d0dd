//! studyplan-core: scheduling and progress logic for the study planner.
//!
//! Everything here is a pure function of its inputs. Wall-clock "now" is
//! always passed in by the caller; nothing reads the system clock.

pub mod agenda;
pub mod availability;
pub mod error;
pub mod plan;
pub mod progress;
pub mod scheduler;
pub mod session;
pub mod task;
pub mod time;

pub use agenda::{next_task, tasks_for_day};
pub use availability::{is_blocked, AvailabilityRule, DateRange};
pub use error::{MalformedReason, ScheduleError, ScheduleIssue, SessionIssue, TimestampError};
pub use plan::{tasks_from_goals, Goal, GENERATED_PLAN_TITLE};
pub use progress::{
    heatmap, progress_report, summarize, trailing_window_start, week_start, Heatmap, HoursSummary,
    Mastery, ProgressReport, WeekStart, DEFAULT_WEEKLY_TARGET_HOURS, HEATMAP_DAYS,
};
pub use scheduler::{schedule, ScheduleOptions, ScheduleOutcome};
pub use session::{ResolvedSession, SessionRecord};
pub use task::{Task, TaskStatus};
