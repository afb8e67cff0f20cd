use anyhow::{Result, bail};
use chrono::{NaiveDate, NaiveTime};
use fieldday_core::{NewService, Zone, format_time, plan_emergency_with};
use tracing::info;

use crate::config::load_config;
use crate::schedule_cmd::check_duration;
use crate::state::ServiceStore;
use crate::{describe, parse_time, with_hint};

/// `--move svc-4=2026-10-21@09:00`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveArg {
    pub id: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
}

pub(crate) fn parse_move(s: &str) -> std::result::Result<MoveArg, String> {
    let (id, slot) = s
        .split_once('=')
        .ok_or_else(|| format!("invalid move '{s}': expected <id>=<YYYY-MM-DD>@<HH:MM>"))?;
    let (date, time) = slot
        .split_once('@')
        .ok_or_else(|| format!("invalid move '{s}': expected <id>=<YYYY-MM-DD>@<HH:MM>"))?;
    let id = id.trim();
    if id.is_empty() {
        return Err(format!("invalid move '{s}': missing service id"));
    }
    let date = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
        .map_err(|_| format!("invalid move '{s}': bad date '{date}'"))?;
    Ok(MoveArg {
        id: id.to_string(),
        date,
        time: parse_time(time)?,
    })
}

pub struct EmergencyArgs {
    pub client: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub duration: i32,
    pub zone: Zone,
    pub address: String,
    pub moves: Vec<MoveArg>,
    pub keep: Vec<String>,
    pub apply: bool,
}

pub fn run(args: EmergencyArgs) -> Result<()> {
    let cfg = load_config()?;
    let mut store = ServiceStore::open()?;

    let new = NewService::new(args.client, args.date, args.time, args.duration)
        .emergency()
        .with_zone(args.zone)
        .with_address(args.address);
    new.validate().map_err(with_hint)?;
    check_duration(&cfg.settings, new.duration_minutes)?;

    let mut plan = plan_emergency_with(store.snapshot(), &new, &cfg.slot_rules());
    for m in &args.moves {
        plan.select(&m.id, m.date, m.time).map_err(with_hint)?;
    }
    for id in &args.keep {
        plan.deselect(id).map_err(with_hint)?;
    }

    println!(
        "Emergency: {} {} {}-{} ({} min)",
        new.client_name,
        new.service_date,
        format_time(new.start_time),
        fieldday_core::minutes_to_time(new.start_minutes().saturating_add(new.duration_minutes)),
        new.duration_minutes
    );
    if !plan.has_conflicts() {
        println!("No services displaced.");
    }
    for d in &plan.displacements {
        let current = store.get(&d.service_id)?;
        println!("\n  {}", describe(current));
        if !d.movable {
            println!("    cannot be moved ({})", current.status);
        } else if !d.selected {
            println!("    kept in place");
        }
        match d.choice {
            Some(c) if d.selected && d.movable => {
                println!("    -> {} {}", c.date, format_time(c.time));
            }
            None if d.selected => println!("    -> no open slot found"),
            _ => {}
        }
        for (i, s) in d.suggestions.iter().enumerate() {
            println!(
                "       {}. {} {} [{:?}] score={}",
                i + 1,
                s.date,
                format_time(s.time),
                s.category,
                s.score
            );
        }
    }

    let unresolved = plan.unresolved();
    if !unresolved.is_empty() {
        let ids: Vec<&str> = unresolved.iter().map(|d| d.service_id.as_str()).collect();
        println!(
            "\nUnresolved: {} (pass --move <id>=<date>@<time> or --keep <id>)",
            ids.join(", ")
        );
    }

    if !args.apply {
        println!("\nPreview only. Re-run with --apply to write.");
        return Ok(());
    }
    if !unresolved.is_empty() {
        bail!("{} displaced service(s) have no usable slot", unresolved.len());
    }

    let moved = plan.apply(store.snapshot());
    let moved_count = moved.len();
    for service in moved {
        store.replace(service)?;
    }
    let id = store.insert(plan.emergency.clone())?;
    store.save()?;

    info!(%id, moved = moved_count, "emergency applied");
    println!("\nAdded {}", describe(store.get(&id)?));
    println!("Moved {moved_count} service(s): {}", plan.reason());
    Ok(())
}
