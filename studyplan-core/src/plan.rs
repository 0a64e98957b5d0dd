//! Plan generation: turn a list of study goals into unscheduled tasks.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::task::{
    default_duration, default_priority, lenient_duration, lenient_priority, normalize_subject, Task,
};

pub const GENERATED_PLAN_TITLE: &str = "Generated Plan";

/// A study goal as entered by the user. Every field is optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Goal {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(
        default = "default_duration",
        alias = "durationMin",
        deserialize_with = "lenient_duration"
    )]
    pub duration_minutes: u32,
    #[serde(default = "default_priority", deserialize_with = "lenient_priority")]
    pub priority: u8,
}

impl Default for Goal {
    fn default() -> Self {
        Self {
            title: None,
            description: None,
            subject: None,
            duration_minutes: default_duration(),
            priority: default_priority(),
        }
    }
}

fn non_blank(s: &Option<String>) -> Option<String> {
    s.as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// One task per goal, in goal order, all unscheduled.
///
/// Missing titles become `Task N` (1-based). A goal without a subject takes
/// the first of `subjects`, else `"General"`. Ids are `task-N`.
pub fn tasks_from_goals(goals: &[Goal], subjects: &[String]) -> Vec<Task> {
    let fallback_subject = subjects.first().cloned();

    goals
        .iter()
        .enumerate()
        .map(|(i, goal)| {
            let n = i + 1;
            let title = non_blank(&goal.title).unwrap_or_else(|| format!("Task {n}"));
            let subject = normalize_subject(non_blank(&goal.subject).or_else(|| fallback_subject.clone()));

            let mut task = Task::new(format!("task-{n}"), title)
                .with_subject(subject)
                .with_duration(goal.duration_minutes)
                .with_priority(goal.priority);
            task.description = non_blank(&goal.description);
            task
        })
        .inspect(|t| debug!(task_id = %t.id, subject = %t.subject, "generated task"))
        .collect()
}
