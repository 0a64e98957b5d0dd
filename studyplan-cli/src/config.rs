use anyhow::{Context, Result};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use studyplan_core::{ScheduleOptions, WeekStart, DEFAULT_WEEKLY_TARGET_HOURS};
use studyplan_core::scheduler::{
    DEFAULT_BREAK_MINUTES, DEFAULT_MAX_LOOKAHEAD_DAYS, DEFAULT_WINDOW_END_HOUR,
    DEFAULT_WINDOW_START_HOUR,
};

use crate::state::ensure_studyplan_home;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub schedule: ScheduleSection,
    #[serde(default)]
    pub progress: ProgressSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleSection {
    pub window_start_hour: u32,
    pub window_end_hour: u32,
    pub break_minutes: u32,
    pub max_lookahead_days: u32,
    /// IANA zone the work window is read in.
    pub timezone: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressSection {
    /// Both conventions are in use; pick per install.
    pub week_start: WeekStart,
    pub weekly_target_hours: f64,
}

impl Default for ScheduleSection {
    fn default() -> Self {
        Self {
            window_start_hour: DEFAULT_WINDOW_START_HOUR,
            window_end_hour: DEFAULT_WINDOW_END_HOUR,
            break_minutes: DEFAULT_BREAK_MINUTES,
            max_lookahead_days: DEFAULT_MAX_LOOKAHEAD_DAYS,
            timezone: "UTC".to_string(),
        }
    }
}

impl Default for ProgressSection {
    fn default() -> Self {
        Self {
            week_start: WeekStart::Monday,
            weekly_target_hours: DEFAULT_WEEKLY_TARGET_HOURS,
        }
    }
}

impl ScheduleSection {
    pub fn options(&self) -> Result<ScheduleOptions> {
        Ok(ScheduleOptions {
            window_start_hour: self.window_start_hour,
            window_end_hour: self.window_end_hour,
            break_minutes: self.break_minutes,
            max_lookahead_days: self.max_lookahead_days,
            timezone: parse_timezone(&self.timezone)?,
        })
    }
}

pub fn parse_timezone(tz: &str) -> Result<Tz> {
    tz.trim()
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid timezone: {tz}"))
}

pub fn config_path() -> Result<PathBuf> {
    Ok(ensure_studyplan_home()?.join("config.toml"))
}

/// Load `path` (or the default location). A missing file means defaults.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let p = match path {
        Some(p) => p.to_path_buf(),
        None => config_path()?,
    };
    if !p.exists() {
        tracing::debug!(path = %p.display(), "no config file, using defaults");
        return Ok(Config::default());
    }
    let s = fs::read_to_string(&p).with_context(|| format!("read {}", p.display()))?;
    toml::from_str(&s).with_context(|| format!("parse {}", p.display()))
}

pub fn save_config(cfg: &Config, path: &Path) -> Result<()> {
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(path, s).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

pub fn init_config(path: Option<&Path>) -> Result<()> {
    let p = match path {
        Some(p) => p.to_path_buf(),
        None => config_path()?,
    };
    if p.exists() {
        println!("Config already exists: {}", p.display());
        return Ok(());
    }
    save_config(&Config::default(), &p)?;
    println!("Wrote {}", p.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_keeps_defaults() {
        let cfg: Config = toml::from_str(
            r#"
[schedule]
window_start_hour = 7
timezone = "Asia/Kolkata"

[progress]
week_start = "sunday"
"#,
        )
        .unwrap();
        assert_eq!(cfg.schedule.window_start_hour, 7);
        assert_eq!(cfg.schedule.window_end_hour, 22);
        assert_eq!(cfg.schedule.break_minutes, 10);
        assert_eq!(cfg.progress.week_start, WeekStart::Sunday);
        assert_eq!(cfg.progress.weekly_target_hours, 8.0);

        let opts = cfg.schedule.options().unwrap();
        assert_eq!(opts.timezone, chrono_tz::Asia::Kolkata);
    }

    #[test]
    fn bad_timezone_is_an_error() {
        let section = ScheduleSection {
            timezone: "Mars/Olympus".into(),
            ..ScheduleSection::default()
        };
        let err = section.options().unwrap_err();
        assert!(err.to_string().contains("Mars/Olympus"));
    }

    #[test]
    fn default_config_round_trips_through_toml() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("config.toml");
        save_config(&Config::default(), &p).unwrap();
        let back = load_config(Some(&p)).unwrap();
        assert_eq!(back.schedule.window_end_hour, 22);
        assert_eq!(back.progress.week_start, WeekStart::Monday);
    }
}
