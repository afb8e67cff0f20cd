use anyhow::Result;
use chrono::{NaiveDate, NaiveTime};
use clap::{Parser, Subcommand};
use fieldday_core::{Clock, Service, Zone, format_time, parse_time_of_day};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod config;
mod emergency_cmd;
mod import_cmd;
mod lunch_cmd;
mod review_cmd;
mod schedule_cmd;
mod state;

use config::ConfigCommand;
use lunch_cmd::LunchCommand;

#[derive(Parser, Debug)]
#[command(
    name = "fieldday",
    version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("FIELDDAY_BUILD_SHA"), ")"),
    about = "Schedule planner for a dishwasher maintenance technician"
)]
struct Cli {
    /// Debug logging on stderr (FIELDDAY_LOG / RUST_LOG still win)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Manage ~/.fieldday/config.toml
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },

    /// Book a new service (blocked on overlap unless it is an emergency)
    Add {
        #[arg(long)]
        client: String,
        #[arg(long)]
        date: NaiveDate,
        #[arg(long, value_parser = parse_time)]
        time: NaiveTime,
        /// Minutes (default: 120)
        #[arg(long, default_value_t = 120)]
        duration: i32,
        #[arg(long, default_value = "other")]
        zone: Zone,
        #[arg(long, default_value = "")]
        address: String,
        #[arg(long)]
        model: Option<String>,
        #[arg(long, default_value = "")]
        notes: String,
        /// Book as a lunch block instead of a visit
        #[arg(long, default_value_t = false)]
        lunch: bool,
    },

    /// List services, optionally for one day and with buckets hidden
    List {
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Hide a bucket: completed, pending, emergency, rescheduled, recurring, canceled, lunch
        #[arg(long, value_parser = schedule_cmd::parse_bucket)]
        hide: Vec<fieldday_core::StatusBucket>,
    },

    /// Show one service and what can be done with it
    Show { id: String },

    /// List services overlapping a candidate interval
    Conflicts {
        #[arg(long)]
        date: NaiveDate,
        #[arg(long, value_parser = parse_time)]
        time: NaiveTime,
        #[arg(long)]
        duration: i32,
        /// Ignore this service id (e.g. the one being moved)
        #[arg(long)]
        exclude: Option<String>,
    },

    /// Suggest alternative slots for an existing service or an ad-hoc request
    Suggest {
        /// Existing service to relocate
        #[arg(long, conflicts_with_all = ["date", "duration"])]
        id: Option<String>,
        #[arg(long, requires = "duration")]
        date: Option<NaiveDate>,
        #[arg(long)]
        duration: Option<i32>,
        #[arg(long)]
        zone: Option<Zone>,
        #[arg(long, value_parser = parse_time)]
        time: Option<NaiveTime>,
    },

    /// Day, week and month load around a date (default: today)
    Load {
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Move a service to a new date and time
    Reschedule {
        id: String,
        #[arg(long)]
        date: NaiveDate,
        #[arg(long, value_parser = parse_time)]
        time: NaiveTime,
        #[arg(long)]
        reason: Option<String>,
        /// Clerical correction: also works on completed services, skips date checks
        #[arg(long = "override", default_value_t = false)]
        correction: bool,
    },

    /// Mark a service as started
    Start { id: String },

    /// Mark a service as completed
    Complete { id: String },

    /// Cancel a service
    Cancel { id: String },

    /// Delete a service record (not while it is in progress)
    Delete { id: String },

    /// Delete every service in a month
    ClearMonth {
        /// Target month, YYYY-MM
        #[arg(long, value_parser = parse_month)]
        month: NaiveDate,
        /// Write the month's records to this JSON file first
        #[arg(long)]
        export: Option<PathBuf>,
        /// Delete for real (default: preview only)
        #[arg(long, default_value_t = false)]
        apply: bool,
    },

    /// Insert an emergency visit and move what it displaces
    Emergency {
        #[arg(long)]
        client: String,
        #[arg(long)]
        date: NaiveDate,
        #[arg(long, value_parser = parse_time)]
        time: NaiveTime,
        #[arg(long, default_value_t = 120)]
        duration: i32,
        #[arg(long, default_value = "other")]
        zone: Zone,
        #[arg(long, default_value = "")]
        address: String,
        /// Override a slot: <id>=<YYYY-MM-DD>@<HH:MM>
        #[arg(long = "move", value_parser = emergency_cmd::parse_move)]
        moves: Vec<emergency_cmd::MoveArg>,
        /// Leave this displaced service where it is
        #[arg(long)]
        keep: Vec<String>,
        /// Write the emergency and the moves (default: preview only)
        #[arg(long, default_value_t = false)]
        apply: bool,
    },

    /// Import a client roster CSV and distribute visits over a month
    Import {
        #[arg(long)]
        csv: PathBuf,
        /// Target month, YYYY-MM
        #[arg(long, value_parser = parse_month)]
        month: NaiveDate,
        /// Leave an account out (exact account name)
        #[arg(long)]
        skip: Vec<String>,
        /// Write the distributed services (default: preview only)
        #[arg(long, default_value_t = false)]
        apply: bool,
    },

    /// Lunch break helpers
    Lunch {
        #[command(subcommand)]
        command: LunchCommand,
    },

    /// Open visits left today once the alert hour has passed
    EndOfDay {
        /// Silence the alert for the rest of today
        #[arg(long, default_value_t = false)]
        dismiss: bool,
        /// Forget today's dismissal
        #[arg(long, default_value_t = false, conflicts_with = "dismiss")]
        reset: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Config { command } => config::run(command),
        Command::Add {
            client,
            date,
            time,
            duration,
            zone,
            address,
            model,
            notes,
            lunch,
        } => schedule_cmd::add(schedule_cmd::AddArgs {
            client,
            date,
            time,
            duration,
            zone,
            address,
            model,
            notes,
            lunch,
        }),
        Command::List { date, hide } => schedule_cmd::list(date, &hide),
        Command::Show { id } => schedule_cmd::show(&id),
        Command::Conflicts {
            date,
            time,
            duration,
            exclude,
        } => schedule_cmd::conflicts(date, time, duration, exclude.as_deref()),
        Command::Suggest {
            id,
            date,
            duration,
            zone,
            time,
        } => schedule_cmd::suggest(id.as_deref(), date, duration, zone, time),
        Command::Load { date } => schedule_cmd::load(date),
        Command::Reschedule {
            id,
            date,
            time,
            reason,
            correction,
        } => schedule_cmd::reschedule(&id, date, time, reason, correction),
        Command::Start { id } => schedule_cmd::transition(&id, schedule_cmd::Transition::Start),
        Command::Complete { id } => {
            schedule_cmd::transition(&id, schedule_cmd::Transition::Complete)
        }
        Command::Cancel { id } => schedule_cmd::transition(&id, schedule_cmd::Transition::Cancel),
        Command::Delete { id } => schedule_cmd::delete(&id),
        Command::ClearMonth {
            month,
            export,
            apply,
        } => schedule_cmd::clear_month(month, export.as_deref(), apply),
        Command::Emergency {
            client,
            date,
            time,
            duration,
            zone,
            address,
            moves,
            keep,
            apply,
        } => emergency_cmd::run(emergency_cmd::EmergencyArgs {
            client,
            date,
            time,
            duration,
            zone,
            address,
            moves,
            keep,
            apply,
        }),
        Command::Import {
            csv,
            month,
            skip,
            apply,
        } => import_cmd::run(&csv, month, &skip, apply),
        Command::Lunch { command } => lunch_cmd::run(command),
        Command::EndOfDay { dismiss, reset } => review_cmd::end_of_day(dismiss, reset),
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = std::env::var("FIELDDAY_LOG")
        .or_else(|_| std::env::var("RUST_LOG"))
        .ok()
        .and_then(|spec| EnvFilter::try_new(spec).ok())
        .unwrap_or_else(|| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

pub(crate) fn parse_time(s: &str) -> std::result::Result<NaiveTime, String> {
    parse_time_of_day(s).map_err(|e| e.to_string())
}

/// `YYYY-MM` -> first day of that month.
pub(crate) fn parse_month(s: &str) -> std::result::Result<NaiveDate, String> {
    NaiveDate::parse_from_str(&format!("{}-01", s.trim()), "%Y-%m-%d")
        .map_err(|_| format!("invalid month '{s}': expected YYYY-MM"))
}

/// Today in the profile timezone.
pub(crate) fn today(cfg: &config::Config) -> Result<NaiveDate> {
    let clock = state::SystemClock { tz: cfg.tz()? };
    Ok(clock.now().date())
}

pub(crate) fn describe(s: &Service) -> String {
    let mut line = format!(
        "{:<8} {} {}-{} {:<28} {:<11} {}",
        s.id,
        s.service_date,
        format_time(s.start_time),
        fieldday_core::minutes_to_time(s.end_minutes()),
        s.client_name,
        s.status,
        s.zone,
    );
    if s.is_lunch_block {
        line.push_str(" [lunch]");
    }
    if s.is_emergency() {
        line.push_str(" [emergency]");
    }
    line
}

/// Turn a core error into an anyhow error carrying the user-facing hint.
pub(crate) fn with_hint(err: fieldday_core::CoreError) -> anyhow::Error {
    match err.hint() {
        Some(hint) => anyhow::Error::new(err).context(hint),
        None => anyhow::Error::new(err),
    }
}
