use anyhow::Result;
use chrono::{NaiveDate, NaiveTime};
use clap::Subcommand;
use fieldday_core::{best_lunch_time, format_time, lunch_conflicts, move_lunch, suggest_lunch_times};

use crate::config::load_config;
use crate::state::ServiceStore;
use crate::{describe, parse_time, with_hint};

#[derive(Subcommand, Debug)]
pub enum LunchCommand {
    /// Candidate lunch starts for a day, marked when they clash with work
    Suggest {
        #[arg(long)]
        date: NaiveDate,
        /// Ignore this service id when checking clashes
        #[arg(long)]
        exclude: Option<String>,
    },
    /// Move a lunch block to another time on the same day
    Move {
        id: String,
        #[arg(long, value_parser = parse_time)]
        time: NaiveTime,
    },
}

pub fn run(cmd: LunchCommand) -> Result<()> {
    match cmd {
        LunchCommand::Suggest { date, exclude } => suggest(date, exclude.as_deref()),
        LunchCommand::Move { id, time } => move_to(&id, time),
    }
}

fn suggest(date: NaiveDate, exclude: Option<&str>) -> Result<()> {
    let cfg = load_config()?;
    let store = ServiceStore::open()?;
    let services = store.snapshot();

    for s in suggest_lunch_times(services, date, exclude) {
        if s.conflicts {
            let with: Vec<String> = lunch_conflicts(services, date, s.time, exclude)
                .into_iter()
                .map(|c| c.message)
                .collect();
            println!("  {}  busy: {}", format_time(s.time), with.join("; "));
        } else {
            println!("  {}  free", format_time(s.time));
        }
    }
    println!(
        "\nBest: {}",
        format_time(best_lunch_time(services, date, cfg.settings.lunch_time))
    );
    Ok(())
}

fn move_to(id: &str, time: NaiveTime) -> Result<()> {
    let mut store = ServiceStore::open()?;
    let mut lunch = store.get(id)?.clone();
    move_lunch(&mut lunch, time).map_err(with_hint)?;

    let clashes: Vec<String> = lunch_conflicts(store.snapshot(), lunch.service_date, time, Some(id))
        .into_iter()
        .map(|c| c.message)
        .collect();
    for c in &clashes {
        println!("warning: {c}");
    }

    store.replace(lunch)?;
    store.save()?;
    println!("Moved {}", describe(store.get(id)?));
    Ok(())
}
