use anyhow::{Context, Result};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};
use studyplan_core::{AvailabilityRule, Goal, SessionRecord, Task};

/// `$STUDYPLAN_HOME`, else `~/.studyplan`.
pub fn studyplan_home() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("STUDYPLAN_HOME") {
        if !dir.trim().is_empty() {
            return Ok(PathBuf::from(dir));
        }
    }
    let home = std::env::var("HOME").context("HOME is not set")?;
    Ok(PathBuf::from(home).join(".studyplan"))
}

pub fn ensure_studyplan_home() -> Result<PathBuf> {
    let dir = studyplan_home()?;
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(dir)
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let s = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    serde_json::from_str(&s).with_context(|| format!("parse {}", path.display()))
}

#[derive(Debug, Clone, Default, Deserialize)]
struct PlanMeta {
    #[serde(flatten)]
    availability: AvailabilityRule,
}

#[derive(Debug, Clone, Deserialize)]
struct PlanDoc {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    tasks: Vec<Task>,
    #[serde(default)]
    meta: Option<PlanMeta>,
}

/// A plan file is either a stored plan document or a bare task array.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum PlanFile {
    Doc(PlanDoc),
    Tasks(Vec<Task>),
}

/// Tasks plus any availability stored in the plan's `meta`.
#[derive(Debug, Clone, Default)]
pub struct Plan {
    pub title: Option<String>,
    pub tasks: Vec<Task>,
    pub availability: AvailabilityRule,
}

pub fn read_plan(path: &Path) -> Result<Plan> {
    let plan = match read_json::<PlanFile>(path)? {
        PlanFile::Doc(doc) => Plan {
            title: doc.title,
            tasks: doc.tasks,
            availability: doc.meta.map(|m| m.availability).unwrap_or_default(),
        },
        PlanFile::Tasks(tasks) => Plan {
            title: None,
            tasks,
            availability: AvailabilityRule::default(),
        },
    };
    Ok(plan)
}

pub fn read_availability(path: &Path) -> Result<AvailabilityRule> {
    read_json(path)
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum SessionsFile {
    Wrapped { sessions: Vec<SessionRecord> },
    Bare(Vec<SessionRecord>),
}

pub fn read_sessions(path: &Path) -> Result<Vec<SessionRecord>> {
    Ok(match read_json::<SessionsFile>(path)? {
        SessionsFile::Wrapped { sessions } => sessions,
        SessionsFile::Bare(sessions) => sessions,
    })
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum GoalsFile {
    Wrapped {
        goals: Vec<Goal>,
        #[serde(default)]
        subjects: Vec<String>,
    },
    Bare(Vec<Goal>),
}

/// Goals plus the plan-level subject list (empty for a bare array).
pub fn read_goals(path: &Path) -> Result<(Vec<Goal>, Vec<String>)> {
    Ok(match read_json::<GoalsFile>(path)? {
        GoalsFile::Wrapped { goals, subjects } => (goals, subjects),
        GoalsFile::Bare(goals) => (goals, Vec::new()),
    })
}
