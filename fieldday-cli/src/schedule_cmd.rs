//! Day-to-day booking commands: add, list, show, conflicts, suggest, load,
//! reschedule, the status transitions and deletion.

use anyhow::{Context, Result, bail};
use chrono::{NaiveDate, NaiveTime};
use fieldday_core::{
    Admission, NewService, ServiceFilter, Settings, SlotRequest, StatusBucket, Zone, actions_for, admit,
    best_lunch_time, daily_completion_rate, day_load, default_lunch_break, filter_services,
    find_conflicts, format_time, monthly_completion, should_auto_create_lunch, status_count,
    month_range, suggest_slots_with, validate_reschedule_target, week_load,
};
use std::fs;
use std::path::Path;
use tracing::info;

use crate::config::load_config;
use crate::state::ServiceStore;
use crate::{describe, today, with_hint};

pub struct AddArgs {
    pub client: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub duration: i32,
    pub zone: Zone,
    pub address: String,
    pub model: Option<String>,
    pub notes: String,
    pub lunch: bool,
}

pub fn add(args: AddArgs) -> Result<()> {
    let cfg = load_config()?;
    let settings = &cfg.settings;
    let mut store = ServiceStore::open()?;

    let new = if args.lunch {
        default_lunch_break(args.date, args.time)
    } else {
        check_duration(settings, args.duration)?;
        NewService::new(args.client, args.date, args.time, args.duration)
            .with_zone(args.zone)
            .with_address(args.address)
            .with_model(
                args.model
                    .unwrap_or_else(|| cfg.import.dishwasher_model.clone()),
            )
            .with_notes(args.notes)
    };

    let clashes: Vec<String> = match admit(store.snapshot(), &new) {
        Admission::Clear => Vec::new(),
        other => other.conflicts().iter().map(|s| describe(s)).collect(),
    };
    if !clashes.is_empty() {
        bail!(
            "{} {} overlaps:\n  {}\n(use `fieldday emergency` to displace them, or pick another slot with `fieldday suggest`)",
            new.service_date,
            format_time(new.start_time),
            clashes.join("\n  ")
        );
    }

    if !new.is_lunch_block {
        let day = day_load(store.snapshot(), new.service_date, settings.max_daily_services);
        if day.at_capacity {
            println!(
                "warning: {} already has {} services (limit {})",
                day.date, day.services, settings.max_daily_services
            );
        }
    }

    let date = new.service_date;
    let is_lunch = new.is_lunch_block;
    let id = store.insert(new)?;
    println!("Added {}", describe(store.get(&id)?));

    if !is_lunch && should_auto_create_lunch(store.snapshot(), date) {
        let at = best_lunch_time(store.snapshot(), date, settings.lunch_time);
        let lunch_id = store.insert(default_lunch_break(date, at))?;
        info!(id = %lunch_id, %date, "auto-created lunch break");
        println!("Added {}", describe(store.get(&lunch_id)?));
    }

    store.save()
}

/// Reject durations outside the configured service bounds.
pub(crate) fn check_duration(settings: &Settings, minutes: i32) -> Result<()> {
    if !settings.duration_in_bounds(minutes) {
        bail!(
            "duration {minutes} min is outside {}-{} min",
            settings.min_service_duration_minutes,
            settings.max_service_duration_minutes
        );
    }
    Ok(())
}

pub(crate) fn parse_bucket(s: &str) -> std::result::Result<StatusBucket, String> {
    let lower = s.trim().to_ascii_lowercase();
    StatusBucket::ALL
        .into_iter()
        .find(|b| b.as_str() == lower)
        .ok_or_else(|| {
            let names: Vec<&str> = StatusBucket::ALL.iter().map(|b| b.as_str()).collect();
            format!("unknown bucket '{s}' ({})", names.join(", "))
        })
}

pub fn list(date: Option<NaiveDate>, hide: &[StatusBucket]) -> Result<()> {
    let store = ServiceStore::open()?;
    let mut filter = ServiceFilter::all();
    for bucket in hide {
        filter.set(*bucket, false);
    }

    let mut shown: Vec<_> = filter_services(store.snapshot(), &filter)
        .into_iter()
        .filter(|s| date.is_none_or(|d| s.service_date == d))
        .collect();
    shown.sort_by_key(|s| (s.service_date, s.start_time));

    for s in &shown {
        println!("{}", describe(s));
    }
    if shown.is_empty() {
        println!("(no services)");
    }

    let counts: Vec<String> = StatusBucket::ALL
        .iter()
        .map(|b| format!("{}={}", b.as_str(), status_count(store.snapshot(), *b)))
        .collect();
    println!("\n{}", counts.join(" "));
    if filter.hidden_count() > 0 {
        println!("({} filter(s) active)", filter.hidden_count());
    }
    Ok(())
}

pub fn show(id: &str) -> Result<()> {
    let store = ServiceStore::open()?;
    let service = store.get(id)?;
    println!("{}", serde_json::to_string_pretty(service)?);

    let a = actions_for(service);
    println!(
        "\nreschedule={} complete={} edit={} delete={} notes={}",
        a.can_reschedule, a.can_mark_completed, a.can_edit, a.can_delete, a.can_add_notes
    );
    Ok(())
}

pub fn conflicts(date: NaiveDate, time: NaiveTime, duration: i32, exclude: Option<&str>) -> Result<()> {
    let cfg = load_config()?;
    check_duration(&cfg.settings, duration)?;
    let store = ServiceStore::open()?;
    let hits = find_conflicts(store.snapshot(), date, time, duration, exclude);
    if hits.is_empty() {
        println!("No conflicts.");
        return Ok(());
    }
    println!("{} conflict(s):", hits.len());
    for s in hits {
        println!("  {}", describe(s));
    }
    Ok(())
}

pub fn suggest(
    id: Option<&str>,
    date: Option<NaiveDate>,
    duration: Option<i32>,
    zone: Option<Zone>,
    time: Option<NaiveTime>,
) -> Result<()> {
    let cfg = load_config()?;
    let store = ServiceStore::open()?;

    let request = match (id, date, duration) {
        (Some(id), _, _) => {
            let service = store.get(id)?;
            SlotRequest::for_service(service, service.service_date)
        }
        (None, Some(date), Some(duration)) => {
            check_duration(&cfg.settings, duration)?;
            let mut req = SlotRequest::new(date, duration);
            req.preferred_zone = zone;
            req.original_time = time;
            req
        }
        _ => bail!("pass --id <service> or --date <YYYY-MM-DD> --duration <minutes>"),
    };

    let suggestions = suggest_slots_with(store.snapshot(), &request, &cfg.slot_rules());
    if suggestions.is_empty() {
        println!(
            "No open slot in the next {} days.",
            cfg.slot_rules().search_days
        );
        return Ok(());
    }
    for (i, s) in suggestions.iter().enumerate() {
        println!(
            "{}. {} {} [{:?}] score={} day_services={} week_hours={:.1} +{}d{}",
            i + 1,
            s.date,
            format_time(s.time),
            s.category,
            s.score,
            s.service_count,
            s.week_hours,
            s.days_from_original,
            if s.same_zone { " same-zone" } else { "" }
        );
    }
    Ok(())
}

pub fn load(date: Option<NaiveDate>) -> Result<()> {
    let cfg = load_config()?;
    let store = ServiceStore::open()?;
    let date = match date {
        Some(d) => d,
        None => today(&cfg)?,
    };
    let services = store.snapshot();

    let day = day_load(services, date, cfg.settings.max_daily_services);
    let week = week_load(services, date, cfg.settings.max_weekly_hours);
    let month = monthly_completion(services, date);

    println!(
        "Day   {}: {}/{} services, {:.1} h, {:.0}% completed{}",
        day.date,
        day.services,
        cfg.settings.max_daily_services,
        day.hours,
        daily_completion_rate(services, date),
        if day.at_capacity { "  [at capacity]" } else { "" }
    );
    println!(
        "Week  {}..{}: {} services, {:.1}/{:.0} h{}",
        week.week_start,
        week.week_end,
        week.services,
        week.hours,
        cfg.settings.max_weekly_hours,
        if week.over_ceiling { "  [over ceiling]" } else { "" }
    );
    println!(
        "Month {}: {}/{} completed",
        date.format("%Y-%m"),
        month.completed,
        month.total
    );
    Ok(())
}

pub fn reschedule(
    id: &str,
    date: NaiveDate,
    time: NaiveTime,
    reason: Option<String>,
    correction: bool,
) -> Result<()> {
    let cfg = load_config()?;
    let mut store = ServiceStore::open()?;
    let mut service = store.get(id)?.clone();

    let clashes: Vec<String> = find_conflicts(store.snapshot(), date, time, service.duration_minutes, Some(id))
        .into_iter()
        .map(describe)
        .collect();

    if correction {
        service
            .correct_schedule(date, time, reason)
            .map_err(with_hint)?;
        for c in &clashes {
            println!("warning: overlaps {c}");
        }
    } else {
        validate_reschedule_target(&service, date, today(&cfg)?).map_err(with_hint)?;
        if !clashes.is_empty() {
            bail!("{date} {} overlaps:\n  {}", format_time(time), clashes.join("\n  "));
        }
        service.reschedule(date, time, reason).map_err(with_hint)?;
    }

    store.replace(service)?;
    store.save()?;
    println!("Rescheduled {}", describe(store.get(id)?));
    Ok(())
}

#[derive(Debug, Clone, Copy)]
pub enum Transition {
    Start,
    Complete,
    Cancel,
}

pub fn transition(id: &str, t: Transition) -> Result<()> {
    let mut store = ServiceStore::open()?;
    let mut service = store.get(id)?.clone();
    match t {
        Transition::Start => service.start(),
        Transition::Complete => service.complete(),
        Transition::Cancel => service.cancel(),
    }
    .map_err(with_hint)?;

    store.replace(service)?;
    store.save()?;
    println!("{}", describe(store.get(id)?));
    Ok(())
}

pub fn delete(id: &str) -> Result<()> {
    let mut store = ServiceStore::open()?;
    let service = store.get(id)?;
    if !actions_for(service).can_delete {
        bail!(
            "cannot delete {id} while it is {}: complete or cancel it first",
            service.status
        );
    }
    let gone = store.remove(id)?;
    store.save()?;
    println!("Deleted {}", describe(&gone));
    Ok(())
}

/// Remove every record in the month of `month`, optionally writing them to
/// `export` as JSON first.
pub fn clear_month(month: NaiveDate, export: Option<&Path>, apply: bool) -> Result<()> {
    let mut store = ServiceStore::open()?;
    let (first, last) = month_range(month);
    let in_month: Vec<_> = store
        .snapshot()
        .iter()
        .filter(|s| s.service_date >= first && s.service_date <= last)
        .cloned()
        .collect();

    let label = month.format("%B %Y");
    if in_month.is_empty() {
        println!("No services in {label}.");
        return Ok(());
    }
    println!("{} service(s) in {label}:", in_month.len());
    for b in StatusBucket::ALL {
        let n = status_count(&in_month, b);
        if n > 0 {
            println!("  {:<12} {n}", b.as_str());
        }
    }

    if let Some(path) = export {
        let json = serde_json::to_string_pretty(&in_month)?;
        fs::write(path, json).with_context(|| format!("write {}", path.display()))?;
        println!("Exported to {}", path.display());
    }

    if !apply {
        println!("\nPreview only. Re-run with --apply to delete.");
        return Ok(());
    }
    let gone = store.remove_between(first, last);
    store.save()?;
    info!(removed = gone.len(), month = %month.format("%Y-%m"), "month cleared");
    println!("Deleted {} service(s) from {label}.", gone.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bucket() {
        assert_eq!(parse_bucket("Lunch").unwrap(), StatusBucket::Lunch);
        assert_eq!(parse_bucket("canceled").unwrap(), StatusBucket::Canceled);
        let err = parse_bucket("done").unwrap_err();
        assert!(err.contains("completed"));
    }

    #[test]
    fn test_check_duration_uses_settings_bounds() {
        let settings = Settings::default();
        assert!(check_duration(&settings, 30).is_ok());
        assert!(check_duration(&settings, 240).is_ok());
        assert!(check_duration(&settings, 29).is_err());
        assert!(check_duration(&settings, 0).is_err());
        let err = check_duration(&settings, i32::MAX).unwrap_err();
        assert!(err.to_string().contains("30-240"));
    }
}
