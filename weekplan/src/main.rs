//! weekplan - turn a goal into a weekly plan and push it to your calendar
//!
//! Keeps the goal, preferences, fixed commitments and the current plan in a local store,
//! asks the configured model for a plan, lets you edit it task by task, and exports it to
//! Google Calendar.
//!
//! Uses XDG Base Directory specification for file locations:
//! - Store: $XDG_DATA_HOME/weekplan/store.db (~/.local/share/weekplan/store.db)
//! - Logs: $XDG_STATE_HOME/weekplan/weekplan.log (~/.local/state/weekplan/weekplan.log)
//! - Config: $XDG_CONFIG_HOME/weekplan/config.toml (~/.config/weekplan/config.toml)

mod process_lock;
mod progress;
mod render;

use anyhow::{Context, Result};
use chrono::{Datelike, Timelike, Utc};
use chrono_tz::Tz;
use clap::{ArgAction, Parser, Subcommand};
use process_lock::acquire_store_guard;
use weekplan_core::calendar::exporter::today_in;
use weekplan_core::commitments::{import_window, CommitmentDraft};
use weekplan_core::dashboard::greeting;
use weekplan_core::generator::create_generator;
use weekplan_core::store::GenerationOutcome;
use weekplan_core::time::{parse_clock_time, parse_range};
use weekplan_core::{
    CalendarApi, CalendarExporter, Config, EventType, GoogleCalendarClient, Planner, Recurrence,
    ScheduleTask, SqliteStore, Weekday,
};

#[derive(Parser)]
#[command(name = "weekplan")]
#[command(about = "Turn a goal into a weekly plan and push it to your calendar")]
#[command(version)]
struct Args {
    /// Verbose output (-v shows task details and event ids)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Set the goal the plan works toward
    Goal {
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },
    /// Show or change planning preferences
    #[command(subcommand)]
    Prefs(PrefsCommand),
    /// Manage fixed commitments the plan has to work around
    #[command(subcommand)]
    Commit(CommitCommand),
    /// Ask the model for a new weekly plan
    Generate {
        /// Regenerate even if nothing changed since the last plan
        #[arg(long)]
        force: bool,
    },
    /// Print the weekly plan
    Show {
        /// Only this day
        #[arg(long)]
        day: Option<Weekday>,
        /// Print the stored JSON instead of a listing
        #[arg(long)]
        json: bool,
    },
    /// Edit tasks in the weekly plan
    #[command(subcommand)]
    Task(TaskCommand),
    /// Daily overview
    Today {
        /// Show this day instead of today
        #[arg(long)]
        day: Option<Weekday>,
    },
    /// Insert the weekly plan into the calendar, one event per task
    Export,
    /// Manage calendar events
    #[command(subcommand)]
    Event(EventCommand),
}

#[derive(Subcommand)]
enum PrefsCommand {
    /// Set one or more preferences, e.g. `chronotype=early_bird`
    Set {
        #[arg(required = true, num_args = 1..)]
        pairs: Vec<String>,
    },
    /// Remove a preference
    Unset { key: String },
    /// List preferences
    Show,
}

#[derive(Subcommand)]
enum CommitCommand {
    /// Add a commitment
    Add {
        title: String,
        /// Day of a one-off commitment; defaults to the first of --on
        #[arg(long)]
        day: Option<Weekday>,
        /// Start time, e.g. "9:00 AM"
        #[arg(long)]
        start: String,
        /// End time, e.g. "5:00 PM"
        #[arg(long)]
        end: String,
        #[arg(long = "type", default_value = "work")]
        kind: EventType,
        #[arg(long, default_value = "weekly")]
        recurrence: Recurrence,
        /// Days it repeats on, comma separated
        #[arg(long, value_delimiter = ',')]
        on: Vec<Weekday>,
    },
    /// Remove a commitment from one day
    Rm { day: Weekday, id: String },
    /// Remove every commitment
    Clear,
    /// List commitments
    List,
    /// Import this month's calendar events as commitments
    Import,
}

#[derive(Subcommand)]
enum TaskCommand {
    /// Add a task; the day is re-sorted by start time
    Add {
        day: Weekday,
        task: String,
        /// e.g. "09:00 AM - 10:00 AM"
        #[arg(long)]
        time: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long, default_value = "")]
        reason: String,
    },
    /// Change fields of the task at INDEX
    Edit {
        day: Weekday,
        index: usize,
        #[arg(long)]
        task: Option<String>,
        #[arg(long)]
        time: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        reason: Option<String>,
    },
    /// Remove the task at INDEX
    Rm { day: Weekday, index: usize },
}

#[derive(Subcommand)]
enum EventCommand {
    /// Delete a calendar event by id
    Rm { id: String },
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Command::Goal { .. } => "goal",
            Command::Prefs(_) => "prefs",
            Command::Commit(_) => "commit",
            Command::Generate { .. } => "generate",
            Command::Show { .. } => "show",
            Command::Task(_) => "task",
            Command::Today { .. } => "today",
            Command::Export => "export",
            Command::Event(_) => "event",
        }
    }

    /// Whether the command writes to the store.
    fn mutates_store(&self) -> bool {
        !matches!(
            self,
            Command::Show { .. }
                | Command::Today { .. }
                | Command::Export
                | Command::Event(_)
                | Command::Prefs(PrefsCommand::Show)
                | Command::Commit(CommitCommand::List)
        )
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Ensure XDG environment variables are set before using core library
    Config::ensure_xdg_env();

    let config = Config::load().context("failed to load configuration")?;

    let _log_guard =
        weekplan_core::logging::init(&config.logging).context("failed to initialize logging")?;

    tracing::info!(command = args.command.name(), "weekplan starting");

    let store_path = Config::store_path();
    let _store_guard = if args.command.mutates_store() {
        Some(acquire_store_guard(&store_path).context("failed to acquire store lock")?)
    } else {
        None
    };

    tracing::debug!(path = %store_path.display(), "Opening store");
    let store = SqliteStore::open(&store_path).context("failed to open store")?;
    let mut planner = Planner::load(store).context("failed to load saved plan")?;

    let verbose = args.verbose;
    match args.command {
        Command::Goal { text } => {
            let goal = text.join(" ");
            planner.set_goal(goal.as_str()).context("failed to save goal")?;
            println!("Goal set: {}", goal);
        }
        Command::Prefs(command) => run_prefs(&mut planner, command)?,
        Command::Commit(command) => run_commit(&config, &mut planner, command)?,
        Command::Generate { force } => run_generate(&config, &mut planner, force, verbose)?,
        Command::Show { day, json: true } => {
            let json = match day {
                Some(day) => serde_json::to_string_pretty(planner.schedule().day(day)),
                None => serde_json::to_string_pretty(planner.schedule()),
            }
            .context("failed to serialize plan")?;
            println!("{}", json);
        }
        Command::Show { day, json: false } => match day {
            Some(day) => render::print_day(day, planner.schedule().day(day), verbose),
            None => render::print_week(planner.schedule(), verbose),
        },
        Command::Task(command) => run_task(&mut planner, command, verbose)?,
        Command::Today { day } => {
            let tz = time_zone(&config)?;
            let today = day.unwrap_or_else(|| today_in(tz).weekday().into());
            let hour = Utc::now().with_timezone(&tz).hour();
            render::print_dashboard(&planner.dashboard(today), greeting(hour));
        }
        Command::Export => run_export(&config, &planner, verbose)?,
        Command::Event(EventCommand::Rm { id }) => {
            let client = calendar_client(&config)?;
            let deleted = calendar_runtime()?
                .block_on(client.delete(&id))
                .context("failed to delete calendar event")?;
            if deleted {
                println!("Deleted event {}", id);
            } else {
                println!("No event with id {}", id);
            }
        }
    }

    tracing::info!("weekplan finished");
    Ok(())
}

type SqlitePlanner = Planner<SqliteStore>;

fn run_prefs(planner: &mut SqlitePlanner, command: PrefsCommand) -> Result<()> {
    match command {
        PrefsCommand::Set { pairs } => {
            for pair in pairs {
                let (key, value) = pair
                    .split_once('=')
                    .with_context(|| format!("expected key=value, got {:?}", pair))?;
                let (key, value) = (key.trim(), value.trim());
                if key.is_empty() {
                    anyhow::bail!("preference key is empty in {:?}", pair);
                }
                planner
                    .set_preference(key, value)
                    .context("failed to save preference")?;
                println!("{} = {}", key, value);
            }
        }
        PrefsCommand::Unset { key } => {
            if planner
                .remove_preference(&key)
                .context("failed to save preferences")?
            {
                println!("Removed {}", key);
            } else {
                println!("{} was not set", key);
            }
        }
        PrefsCommand::Show => {
            if !planner.goal().is_empty() {
                println!("goal = {}", planner.goal());
            }
            for (key, value) in planner.preferences() {
                println!("{} = {}", key, value);
            }
        }
    }
    Ok(())
}

fn run_commit(config: &Config, planner: &mut SqlitePlanner, command: CommitCommand) -> Result<()> {
    match command {
        CommitCommand::Add {
            title,
            day,
            start,
            end,
            kind,
            recurrence,
            on,
        } => {
            for token in [&start, &end] {
                parse_clock_time(token)
                    .with_context(|| format!("invalid time {:?}, expected e.g. 9:00 AM", token))?;
            }
            let day = day
                .or_else(|| on.first().copied())
                .context("give --day or --on")?;

            let event = planner
                .add_commitment(CommitmentDraft {
                    title,
                    day,
                    start_time: start,
                    end_time: end,
                    kind,
                    recurrence,
                    days: on,
                })
                .context("failed to save commitment")?;
            println!("Added commitment {} ({})", event.id, event.title);
        }
        CommitCommand::Rm { day, id } => {
            if planner
                .remove_commitment(day, &id)
                .context("failed to save commitments")?
            {
                println!("Removed {} from {}", id, day);
            } else {
                anyhow::bail!("no commitment {} on {}", id, day);
            }
        }
        CommitCommand::Clear => {
            planner
                .clear_commitments()
                .context("failed to save commitments")?;
            println!("Cleared all commitments");
        }
        CommitCommand::List => render::print_commitments(planner.commitments()),
        CommitCommand::Import => {
            let tz = time_zone(config)?;
            let client = calendar_client(config)?;
            let (time_min, time_max) = import_window(today_in(tz));

            let events = calendar_runtime()?
                .block_on(client.list(&time_min, &time_max))
                .context("failed to list calendar events")?;
            let imported = planner
                .import_calendar_events(&events, tz)
                .context("failed to save imported commitments")?;
            println!(
                "Imported {} of {} calendar event(s) as commitments",
                imported,
                events.len()
            );
        }
    }
    Ok(())
}

fn run_generate(
    config: &Config,
    planner: &mut SqlitePlanner,
    force: bool,
    verbose: u8,
) -> Result<()> {
    if planner.goal().is_empty() {
        anyhow::bail!("no goal set; run `weekplan goal <text>` first");
    }
    let llm = config
        .llm
        .as_ref()
        .context("no [llm] section in config; plan generation is not configured")?;
    let generator = create_generator(llm).context("failed to create plan generator")?;

    let spinner = progress::spinner("Generating your plan...");
    let outcome = planner.generate(generator.as_ref(), force);
    spinner.finish_and_clear();

    match outcome.context("failed to save generated plan")? {
        GenerationOutcome::Unchanged => {
            println!("Nothing changed since the last plan (use --force to regenerate)");
        }
        GenerationOutcome::Applied(plan) => {
            if let Some(summary) = &plan.summary {
                println!("{}", summary);
                println!();
            }
            render::print_week(planner.schedule(), verbose);
        }
        GenerationOutcome::Failed(message) => anyhow::bail!(message),
    }
    Ok(())
}

fn run_task(planner: &mut SqlitePlanner, command: TaskCommand, verbose: u8) -> Result<()> {
    let day = match command {
        TaskCommand::Add {
            day,
            task,
            time,
            description,
            reason,
        } => {
            warn_if_unparseable(&time);
            planner
                .add_task(
                    day,
                    ScheduleTask {
                        time,
                        task,
                        description,
                        reason,
                    },
                )
                .context("failed to add task")?;
            day
        }
        TaskCommand::Edit {
            day,
            index,
            task,
            time,
            description,
            reason,
        } => {
            let current = planner.schedule().day(day).get(index).cloned().unwrap_or_default();
            let patch = ScheduleTask {
                time: time.unwrap_or(current.time),
                task: task.unwrap_or(current.task),
                description: description.unwrap_or(current.description),
                reason: reason.unwrap_or(current.reason),
            };
            warn_if_unparseable(&patch.time);
            planner
                .edit_task(day, index, patch)
                .context("failed to edit task")?;
            day
        }
        TaskCommand::Rm { day, index } => {
            planner
                .delete_task(day, index)
                .context("failed to delete task")?;
            day
        }
    };

    render::print_day(day, planner.schedule().day(day), verbose);
    Ok(())
}

fn warn_if_unparseable(time: &str) {
    if let Err(e) = parse_range(time) {
        eprintln!(
            "warning: {}; this task will be left out of the daily overview and export",
            e
        );
    }
}

fn run_export(config: &Config, planner: &SqlitePlanner, verbose: u8) -> Result<()> {
    let tz = time_zone(config)?;
    let client = calendar_client(config)?;

    let mut bar = progress::ExportProgressBar::new();
    let exporter =
        CalendarExporter::new(&client, tz).with_settle_delay(config.calendar.settle_delay());
    let report = calendar_runtime()?.block_on(exporter.export(planner.schedule(), &mut bar));

    println!("{}", report.message);
    if report.skipped > 0 {
        println!("Skipped {} task(s) with unreadable times", report.skipped);
    }
    if verbose > 0 {
        for id in &report.event_ids {
            println!("  {}", id);
        }
    }

    tracing::info!(
        inserted = report.inserted,
        failed = report.failed,
        skipped = report.skipped,
        "Export finished"
    );

    if report.total > 0 && report.inserted == 0 {
        anyhow::bail!("no events could be added to the calendar");
    }
    Ok(())
}

fn time_zone(config: &Config) -> Result<Tz> {
    config
        .calendar
        .time_zone()
        .context("invalid calendar time zone")
}

fn calendar_client(config: &Config) -> Result<GoogleCalendarClient> {
    GoogleCalendarClient::new(&config.calendar).context("failed to create calendar client")
}

/// Calendar calls are async; the CLI drives them on a single-threaded runtime.
fn calendar_runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")
}
