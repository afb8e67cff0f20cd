use anyhow::{Result, bail};
use chrono::NaiveDate;
use fieldday_core::{Cadence, ImportCandidate, distribute_onto, format_time};
use fieldday_ingest::{parse_clients_csv, rows_to_candidates};
use std::path::Path;
use tracing::info;

use crate::config::load_config;
use crate::state::ServiceStore;

pub fn run(csv: &Path, month: NaiveDate, skip: &[String], apply: bool) -> Result<()> {
    let cfg = load_config()?;
    let mut store = ServiceStore::open()?;

    let rows = parse_clients_csv(csv)?;
    let mut candidates = rows_to_candidates(&rows, &cfg.import)?;
    let skipped = deselect(&mut candidates, skip);
    for name in skip.iter().filter(|n| !skipped.contains(n)) {
        println!("warning: --skip '{name}' matched no account");
    }

    println!("{} account(s) read from {}", candidates.len(), csv.display());
    for c in &candidates {
        println!("  {}", describe_candidate(c));
    }

    let plan = distribute_onto(store.snapshot(), &candidates, month, &cfg.settings);
    let summary = &plan.summary;

    println!("\nMonth {}:", month.format("%Y-%m"));
    println!("  visits           {}", summary.total_visits);
    println!("  clients          {}", summary.clients_imported);
    println!("  recurring        {}", summary.recurring_clients);
    println!("  avg per workday  {:.1}", summary.average_services_per_day);
    if summary.max_day_exceeded {
        println!("  ! some days exceed {} services", cfg.settings.max_daily_services);
    }
    if summary.max_week_exceeded {
        println!("  ! total hours exceed the weekly ceiling");
    }
    for w in &summary.warnings {
        println!("  warning: {w}");
    }

    if !apply {
        println!("\nPreview only. Re-run with --apply to write.");
        return Ok(());
    }
    if plan.services.is_empty() {
        bail!("nothing to import");
    }

    let total = plan.services.len();
    for new in plan.services {
        store.insert(new)?;
    }
    store.save()?;
    info!(total, month = %month.format("%Y-%m"), "roster imported");
    println!("\nImported {total} service(s).");
    Ok(())
}

/// Deselect accounts named in `skip`; returns the names that matched.
fn deselect(candidates: &mut [ImportCandidate], skip: &[String]) -> Vec<String> {
    let mut matched = Vec::new();
    for c in candidates.iter_mut() {
        if let Some(name) = skip.iter().find(|n| n.trim() == c.client_name) {
            c.selected = false;
            if !matched.contains(name) {
                matched.push(name.clone());
            }
        }
    }
    matched
}

fn describe_candidate(c: &ImportCandidate) -> String {
    let cadence = match &c.cadence {
        Cadence::Monthly { visits_per_month } => format!("{visits_per_month}x/month"),
        Cadence::Weekly { weekday, time } => match time {
            Some(t) => format!("every {weekday} {}", format_time(*t)),
            None => format!("every {weekday}"),
        },
    };
    format!(
        "{:<30} {:<9} {:>4} min  {}{}",
        c.client_name,
        c.zone,
        c.duration_minutes,
        cadence,
        if c.selected { "" } else { "  (skipped)" }
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveTime, Weekday};

    #[test]
    fn test_deselect_by_exact_name() {
        let mut candidates = vec![
            ImportCandidate::monthly("Blue Door Diner", 1),
            ImportCandidate::monthly("Harbor Grill", 1),
        ];
        let matched = deselect(&mut candidates, &["Harbor Grill".to_string(), "Nobody".to_string()]);
        assert_eq!(matched, vec!["Harbor Grill".to_string()]);
        assert!(candidates[0].selected);
        assert!(!candidates[1].selected);
    }

    #[test]
    fn test_describe_candidate_cadence() {
        let weekly = ImportCandidate::weekly(
            "The Cheesecake Factory",
            Weekday::Wed,
            NaiveTime::from_hms_opt(10, 0, 0),
        );
        assert!(describe_candidate(&weekly).contains("every Wed 10:00"));
        let skipped = ImportCandidate::monthly("Harbor Grill", 2).deselected();
        let line = describe_candidate(&skipped);
        assert!(line.contains("2x/month"));
        assert!(line.ends_with("(skipped)"));
    }
}
