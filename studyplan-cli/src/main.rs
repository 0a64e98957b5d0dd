use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use studyplan_core::{
    next_task, progress_report, schedule, tasks_for_day, tasks_from_goals, time::parse_timestamp,
    time::to_local, trailing_window_start, week_start, WeekStart, GENERATED_PLAN_TITLE, HEATMAP_DAYS,
};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod calendar;
mod config;
mod state;

use config::{init_config, load_config, parse_timezone, Config};

#[derive(Parser, Debug)]
#[command(name = "studyplan", version, about = "Auto-schedule study tasks and track progress")]
struct Cli {
    /// Config file (default: ~/.studyplan/config.toml)
    #[arg(long, global = true, env = "STUDYPLAN_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Turn study goals into an unscheduled plan
    Generate {
        /// Goals JSON: an array, or {"goals": [...], "subjects": [...]}
        #[arg(long)]
        goals: PathBuf,

        /// Fallback subject for goals without one; overrides the file's list
        #[arg(long)]
        subject: Option<String>,

        /// Plan title
        #[arg(long)]
        title: Option<String>,

        /// Write the plan here instead of stdout
        #[arg(long, short)]
        out: Option<PathBuf>,
    },

    /// Place plan tasks into the daily work window, skipping blocked days
    Schedule {
        /// Plan JSON: a task array, or {"tasks": [...], "meta": {"vacations", "exceptions"}}
        #[arg(long)]
        plan: PathBuf,

        /// Availability JSON; overrides the plan's meta
        #[arg(long)]
        availability: Option<PathBuf>,

        /// Window start hour (local)
        #[arg(long)]
        window_start: Option<u32>,

        /// Window end hour (local, exclusive)
        #[arg(long)]
        window_end: Option<u32>,

        /// Break after each task, in minutes
        #[arg(long)]
        break_minutes: Option<u32>,

        /// Max days to look ahead for an open day
        #[arg(long)]
        lookahead_days: Option<u32>,

        #[command(flatten)]
        clock: ClockArgs,

        #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
    },

    /// Weekly hours and the 7-day mastery heatmap from a session log
    Progress {
        /// Sessions JSON: an array, or {"sessions": [...]}
        #[arg(long)]
        sessions: PathBuf,

        /// sunday or monday (default from config)
        #[arg(long)]
        week_start: Option<WeekStart>,

        /// Explicit boundary for the hours total (RFC 3339); overrides --week-start
        #[arg(long)]
        since: Option<String>,

        /// Weekly target hours (default from config)
        #[arg(long)]
        target_hours: Option<f64>,

        #[command(flatten)]
        clock: ClockArgs,
    },

    /// Show today's open tasks and the next one up
    Today {
        #[arg(long)]
        plan: PathBuf,

        #[command(flatten)]
        clock: ClockArgs,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Manage ~/.studyplan/config.toml
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(clap::Args, Debug)]
struct ClockArgs {
    /// Timezone (IANA name, default from config)
    #[arg(long)]
    tz: Option<String>,

    /// Pretend the current time is this RFC 3339 instant
    #[arg(long)]
    now: Option<String>,
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write a default config if none exists
    Init,
    /// Print the effective config
    Show,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Ics,
}

impl ClockArgs {
    fn now(&self) -> Result<DateTime<Utc>> {
        match self.now.as_deref() {
            Some(raw) => parse_timestamp(raw).with_context(|| format!("--now {raw}")),
            None => Ok(Utc::now()),
        }
    }

    fn tz(&self, cfg: &Config) -> Result<Tz> {
        parse_timezone(self.tz.as_deref().unwrap_or(&cfg.schedule.timezone))
    }
}

fn init_tracing() {
    // Opt-in via RUST_LOG; stdout is reserved for command output.
    let filter = std::env::var("RUST_LOG")
        .ok()
        .and_then(|raw| {
            let raw = raw.trim();
            if raw.is_empty() {
                return None;
            }
            EnvFilter::try_new(raw).ok()
        })
        .unwrap_or_else(|| EnvFilter::new("off"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let cfg_path = cli.config.as_deref();

    match cli.command {
        Command::Generate {
            goals,
            subject,
            title,
            out,
        } => run_generate(&goals, subject, title, out.as_deref())?,

        Command::Schedule {
            plan,
            availability,
            window_start,
            window_end,
            break_minutes,
            lookahead_days,
            clock,
            format,
        } => {
            let cfg = load_config(cfg_path)?;
            let mut section = cfg.schedule.clone();
            if let Some(h) = window_start {
                section.window_start_hour = h;
            }
            if let Some(h) = window_end {
                section.window_end_hour = h;
            }
            if let Some(m) = break_minutes {
                section.break_minutes = m;
            }
            if let Some(d) = lookahead_days {
                section.max_lookahead_days = d;
            }
            if let Some(tz) = &clock.tz {
                section.timezone = tz.clone();
            }
            run_schedule(&plan, availability.as_deref(), &section, clock.now()?, format)?;
        }

        Command::Progress {
            sessions,
            week_start: ws,
            since,
            target_hours,
            clock,
        } => {
            let cfg = load_config(cfg_path)?;
            let tz = clock.tz(&cfg)?;
            let now = clock.now()?;
            let records = state::read_sessions(&sessions)?;

            let hours_from = match since.as_deref() {
                Some(raw) => parse_timestamp(raw).with_context(|| format!("--since {raw}"))?,
                None => week_start(now, ws.unwrap_or(cfg.progress.week_start), tz),
            };
            let heatmap_from = trailing_window_start(now, HEATMAP_DAYS as u32, tz);
            let target = target_hours.unwrap_or(cfg.progress.weekly_target_hours);

            let report = progress_report(&records, hours_from, heatmap_from, target, now);
            if !report.issues.is_empty() {
                eprintln!("Skipped {} malformed session(s)", report.issues.len());
            }
            println!("{}", serde_json::to_string_pretty(&report)?);
        }

        Command::Today { plan, clock, json } => {
            let cfg = load_config(cfg_path)?;
            let tz = clock.tz(&cfg)?;
            let now = clock.now()?;
            run_today(&plan, tz, now, json)?;
        }

        Command::Config { command } => match command {
            ConfigCommand::Init => init_config(cfg_path)?,
            ConfigCommand::Show => {
                let cfg = load_config(cfg_path)?;
                print!("{}", toml::to_string_pretty(&cfg).context("serialize config")?);
            }
        },
    }

    Ok(())
}

fn run_generate(
    goals_path: &Path,
    subject: Option<String>,
    title: Option<String>,
    out: Option<&Path>,
) -> Result<()> {
    let (goals, mut subjects) = state::read_goals(goals_path)?;
    if let Some(s) = subject {
        subjects.insert(0, s);
    }
    let tasks = tasks_from_goals(&goals, &subjects);

    let plan = serde_json::json!({
        "title": title.as_deref().unwrap_or(GENERATED_PLAN_TITLE),
        "tasks": tasks,
    });
    let body = serde_json::to_string_pretty(&plan)?;

    match out {
        Some(path) => {
            std::fs::write(path, format!("{body}\n"))
                .with_context(|| format!("write {}", path.display()))?;
            eprintln!("Wrote {} task(s) to {}", tasks.len(), path.display());
        }
        None => println!("{body}"),
    }
    Ok(())
}

fn run_schedule(
    plan_path: &Path,
    availability_path: Option<&Path>,
    section: &config::ScheduleSection,
    now: DateTime<Utc>,
    format: OutputFormat,
) -> Result<()> {
    let plan = state::read_plan(plan_path)?;
    let availability = match availability_path {
        Some(p) => state::read_availability(p)?,
        None => plan.availability.clone(),
    };
    let options = section.options()?;

    let outcome = schedule(&plan.tasks, &availability, &options, now)
        .with_context(|| format!("scheduling {}", plan_path.display()))?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&outcome)?),
        OutputFormat::Ics => {
            let prefix = plan
                .title
                .as_deref()
                .map(|t| format!("{t}: "))
                .unwrap_or_default();
            let events = calendar::tasks_to_events(&outcome.tasks, &prefix);
            print!("{}", calendar::events_to_ics(&events));
            if !outcome.unscheduled_ids.is_empty() {
                eprintln!(
                    "Left unscheduled: {}{}",
                    outcome.unscheduled_ids.join(", "),
                    if outcome.exhausted { " (no open day within look-ahead)" } else { "" }
                );
            }
        }
    }

    Ok(())
}

fn run_today(plan_path: &Path, tz: Tz, now: DateTime<Utc>, json: bool) -> Result<()> {
    let plan = state::read_plan(plan_path)?;
    let day = to_local(tz, now).date();
    let today = tasks_for_day(&plan.tasks, day, tz);
    let next = next_task(&plan.tasks, now);

    if json {
        let out = serde_json::json!({
            "day": day,
            "tasks": today,
            "next": next.map(|t| t.id.clone()),
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!("# {} ({})\n", day, tz);
    if today.is_empty() {
        println!("Nothing open today.");
    }
    for t in &today {
        match (t.scheduled_start, t.scheduled_end) {
            (Some(start), Some(end)) => println!(
                "- {}-{} [{}] {}",
                start.with_timezone(&tz).format("%H:%M"),
                end.with_timezone(&tz).format("%H:%M"),
                t.subject,
                t.title
            ),
            _ => println!("- (unscheduled, {}m) [{}] {}", t.duration_minutes, t.subject, t.title),
        }
    }
    if let Some(t) = next {
        if let Some(start) = t.scheduled_start {
            println!("\nNext: {} at {}", t.title, start.with_timezone(&tz).format("%a %H:%M"));
        }
    }

    Ok(())
}
