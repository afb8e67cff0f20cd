//! Month distributor: spread a batch of imported clients over a month's workdays.
//!
//! Two passes over a running per-day count:
//! 1) weekly clients land on their fixed weekday once per week, even on a full day
//!    (the overflow becomes a warning)
//! 2) monthly clients take the least-loaded day still under the daily ceiling,
//!    earliest date on ties; when every day is full the visit is skipped with a warning
//!
//! Never fails: shortfalls are reported in the summary.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{Datelike, NaiveDate, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::service::{ImportSource, NewService, Priority, Service, ServiceKind, ServiceStatus, Zone};
use crate::settings::Settings;
use crate::time::{hhmm_opt, month_range, weeks_of_month, work_days_of_month};

/// How often an imported client is visited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "cadence", rename_all = "snake_case")]
pub enum Cadence {
    /// N visits anywhere in the month.
    Monthly { visits_per_month: u32 },
    /// Every week on a fixed weekday, at a fixed time when one is given.
    Weekly {
        weekday: Weekday,
        #[serde(default, with = "hhmm_opt")]
        time: Option<NaiveTime>,
    },
}

/// One client row ready for distribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportCandidate {
    pub client_name: String,
    pub account_number: Option<String>,
    pub address: String,
    pub site_name: Option<String>,
    pub dishwasher_model: String,
    pub duration_minutes: i32,
    pub zone: Zone,
    pub selected: bool,
    #[serde(flatten)]
    pub cadence: Cadence,
}

impl ImportCandidate {
    pub fn monthly(client_name: impl Into<String>, visits_per_month: u32) -> Self {
        Self::with_cadence(client_name, Cadence::Monthly { visits_per_month })
    }

    pub fn weekly(client_name: impl Into<String>, weekday: Weekday, time: Option<NaiveTime>) -> Self {
        Self::with_cadence(client_name, Cadence::Weekly { weekday, time })
    }

    fn with_cadence(client_name: impl Into<String>, cadence: Cadence) -> Self {
        Self {
            client_name: client_name.into(),
            account_number: None,
            address: String::new(),
            site_name: None,
            dishwasher_model: String::new(),
            duration_minutes: 120,
            zone: Zone::Other,
            selected: true,
            cadence,
        }
    }

    pub fn with_duration(mut self, minutes: i32) -> Self {
        self.duration_minutes = minutes;
        self
    }

    pub fn with_zone(mut self, zone: Zone) -> Self {
        self.zone = zone;
        self
    }

    pub fn deselected(mut self) -> Self {
        self.selected = false;
        self
    }

    pub fn is_recurring(&self) -> bool {
        matches!(self.cadence, Cadence::Weekly { .. })
    }

    fn to_service(&self, kind: ServiceKind, date: NaiveDate, start: NaiveTime) -> NewService {
        NewService {
            kind,
            client_name: self.client_name.clone(),
            dishwasher_model: self.dishwasher_model.clone(),
            service_date: date,
            start_time: start,
            duration_minutes: self.duration_minutes,
            zone: self.zone,
            address: self.address.clone(),
            notes: String::new(),
            status: ServiceStatus::Scheduled,
            priority: Priority::Normal,
            is_lunch_block: false,
            account_number: self.account_number.clone(),
            site_name: self.site_name.clone(),
            imported_from: Some(ImportSource::Csv),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributionSummary {
    pub total_visits: usize,
    pub clients_imported: usize,
    pub recurring_clients: usize,
    /// Rounded to one decimal.
    pub average_services_per_day: f64,
    pub max_day_exceeded: bool,
    /// Month total above four weeks of the weekly ceiling; a coarse proxy only.
    pub max_week_exceeded: bool,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Distribution {
    pub services: Vec<NewService>,
    pub summary: DistributionSummary,
}

/// Start-time rotation by how many visits the day already holds.
const SLOT_ROTATION: [(u32, u32); 4] = [(8, 0), (10, 0), (13, 0), (15, 0)];
const OVERFLOW_SLOT: (u32, u32) = (9, 0);

pub fn rotation_slot(count: usize) -> NaiveTime {
    let (h, m) = SLOT_ROTATION.get(count).copied().unwrap_or(OVERFLOW_SLOT);
    NaiveTime::from_hms_opt(h, m, 0).unwrap_or(NaiveTime::MIN)
}

/// Distribute onto an empty month.
pub fn distribute(candidates: &[ImportCandidate], month: NaiveDate, settings: &Settings) -> Distribution {
    distribute_onto(&[], candidates, month, settings)
}

/// Distribute, seeding per-day counts with active non-lunch services already in the month.
pub fn distribute_onto(
    existing: &[Service],
    candidates: &[ImportCandidate],
    month: NaiveDate,
    settings: &Settings,
) -> Distribution {
    let (first, last) = month_range(month);
    let mut counts: BTreeMap<NaiveDate, usize> = BTreeMap::new();
    for s in existing
        .iter()
        .filter(|s| s.counts_toward_capacity() && s.service_date >= first && s.service_date <= last)
    {
        *counts.entry(s.service_date).or_default() += 1;
    }

    distribute_across(
        &work_days_of_month(month),
        &weeks_of_month(month),
        counts,
        candidates,
        settings,
    )
}

pub(crate) fn distribute_across(
    work_days: &[NaiveDate],
    weeks: &[Vec<NaiveDate>],
    mut counts: BTreeMap<NaiveDate, usize>,
    candidates: &[ImportCandidate],
    settings: &Settings,
) -> Distribution {
    let max_daily = settings.max_daily_services;
    let mut services = Vec::new();
    let mut warnings = Vec::new();
    let mut total_minutes: i64 = 0;

    // Weekly clients are placed whether or not they were ticked.
    let recurring: Vec<&ImportCandidate> = candidates.iter().filter(|c| c.is_recurring()).collect();
    let regular: Vec<&ImportCandidate> = candidates
        .iter()
        .filter(|c| c.selected && !c.is_recurring())
        .collect();

    for client in &recurring {
        let Cadence::Weekly { weekday, time } = client.cadence else {
            continue;
        };
        for week in weeks {
            let Some(day) = week.iter().copied().find(|d| d.weekday() == weekday) else {
                continue;
            };
            let count = counts.get(&day).copied().unwrap_or(0);
            if count >= max_daily {
                let msg = format!("{}: Day {day} already has {count} services", client.client_name);
                warn!(client = %client.client_name, date = %day, count, "distribution: day over capacity");
                warnings.push(msg);
            }
            let start = time.unwrap_or_else(|| rotation_slot(count));
            services.push(client.to_service(ServiceKind::Recurring, day, start));
            counts.insert(day, count + 1);
            total_minutes += i64::from(client.duration_minutes);
        }
    }

    for client in &regular {
        let Cadence::Monthly { visits_per_month } = client.cadence else {
            continue;
        };
        for visit in 0..visits_per_month {
            let Some(day) = least_loaded_day(work_days, &counts, max_daily) else {
                let msg = format!(
                    "{}: Cannot schedule visit {}, all days at capacity",
                    client.client_name,
                    visit + 1
                );
                warn!(client = %client.client_name, visit = visit + 1, "distribution: no capacity left");
                warnings.push(msg);
                continue;
            };
            let count = counts.get(&day).copied().unwrap_or(0);
            services.push(client.to_service(
                ServiceKind::ScheduledMaintenance,
                day,
                rotation_slot(count),
            ));
            counts.insert(day, count + 1);
            total_minutes += i64::from(client.duration_minutes);
        }
    }

    let average = if work_days.is_empty() {
        0.0
    } else {
        services.len() as f64 / work_days.len() as f64
    };
    let clients_imported = candidates
        .iter()
        .filter(|c| c.selected)
        .map(|c| c.client_name.as_str())
        .collect::<BTreeSet<_>>()
        .len();
    let total_hours = total_minutes as f64 / 60.0;

    let summary = DistributionSummary {
        total_visits: services.len(),
        clients_imported,
        recurring_clients: recurring.len(),
        average_services_per_day: (average * 10.0).round() / 10.0,
        max_day_exceeded: counts.values().any(|&c| c > max_daily),
        max_week_exceeded: total_hours > settings.max_weekly_hours * 4.0,
        warnings,
    };
    debug!(
        visits = summary.total_visits,
        warnings = summary.warnings.len(),
        "distribution complete"
    );

    Distribution { services, summary }
}

/// Lowest running count under `max_daily`; earliest date wins ties.
fn least_loaded_day(
    work_days: &[NaiveDate],
    counts: &BTreeMap<NaiveDate, usize>,
    max_daily: usize,
) -> Option<NaiveDate> {
    let mut best: Option<(NaiveDate, usize)> = None;
    for &day in work_days {
        let count = counts.get(&day).copied().unwrap_or(0);
        if count >= max_daily {
            continue;
        }
        if best.is_none_or(|(_, c)| count < c) {
            best = Some((day, count));
        }
    }
    best.map(|(day, _)| day)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Days;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn at(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_weekly_client_lands_every_wednesday() {
        // Feb 2027: four full work weeks
        let candidates = vec![ImportCandidate::weekly(
            "Cheesecake Factory",
            Weekday::Wed,
            Some(at(10, 0)),
        )];
        let out = distribute(&candidates, date(2027, 2, 1), &Settings::default());
        assert_eq!(out.services.len(), 4);
        let dates: Vec<_> = out.services.iter().map(|s| s.service_date).collect();
        assert_eq!(
            dates,
            vec![date(2027, 2, 3), date(2027, 2, 10), date(2027, 2, 17), date(2027, 2, 24)]
        );
        assert!(out.services.iter().all(|s| s.start_time == at(10, 0)));
        assert!(out.services.iter().all(|s| s.kind == ServiceKind::Recurring));
        assert_eq!(out.summary.recurring_clients, 1);
        assert!(out.summary.warnings.is_empty());
    }

    #[test]
    fn test_weekly_client_without_time_uses_rotation() {
        let candidates = vec![
            ImportCandidate::weekly("A", Weekday::Mon, None),
            ImportCandidate::weekly("B", Weekday::Mon, None),
        ];
        let out = distribute(&candidates, date(2027, 2, 1), &Settings::default());
        let first_monday: Vec<_> = out
            .services
            .iter()
            .filter(|s| s.service_date == date(2027, 2, 1))
            .map(|s| s.start_time)
            .collect();
        assert_eq!(first_monday, vec![at(8, 0), at(10, 0)]);
    }

    #[test]
    fn test_weekly_skips_weeks_missing_the_weekday() {
        // Oct 2026 opens on Thursday: the first partial week has no Monday.
        let candidates = vec![ImportCandidate::weekly("A", Weekday::Mon, Some(at(8, 0)))];
        let out = distribute(&candidates, date(2026, 10, 1), &Settings::default());
        assert_eq!(out.services.len(), 4);
        assert_eq!(out.services[0].service_date, date(2026, 10, 5));
    }

    #[test]
    fn test_weekly_overflow_still_scheduled_with_warning() {
        let settings = Settings {
            max_daily_services: 1,
            ..Settings::default()
        };
        let candidates = vec![
            ImportCandidate::weekly("First", Weekday::Wed, Some(at(8, 0))),
            ImportCandidate::weekly("Second", Weekday::Wed, Some(at(13, 0))),
        ];
        let out = distribute(&candidates, date(2027, 2, 1), &settings);
        assert_eq!(out.services.len(), 8);
        assert_eq!(out.summary.warnings.len(), 4);
        assert_eq!(
            out.summary.warnings[0],
            "Second: Day 2027-02-03 already has 1 services"
        );
        assert!(out.summary.max_day_exceeded);
    }

    #[test]
    fn test_recurring_placed_even_when_unselected() {
        let candidates = vec![ImportCandidate::weekly("A", Weekday::Fri, Some(at(9, 0))).deselected()];
        let out = distribute(&candidates, date(2027, 2, 1), &Settings::default());
        assert_eq!(out.services.len(), 4);
        assert_eq!(out.summary.clients_imported, 0);
        assert_eq!(out.summary.recurring_clients, 1);
    }

    #[test]
    fn test_unselected_monthly_ignored() {
        let candidates = vec![ImportCandidate::monthly("A", 2).deselected()];
        let out = distribute(&candidates, date(2027, 2, 1), &Settings::default());
        assert!(out.services.is_empty());
        assert_eq!(out.summary.total_visits, 0);
    }

    #[test]
    fn test_three_visits_over_three_empty_days() {
        let days = vec![date(2027, 2, 1), date(2027, 2, 2), date(2027, 2, 3)];
        let weeks = vec![days.clone()];
        let candidates = vec![ImportCandidate::monthly("Diner", 3)];
        let out = distribute_across(&days, &weeks, BTreeMap::new(), &candidates, &Settings::default());
        let placed: Vec<_> = out.services.iter().map(|s| (s.service_date, s.start_time)).collect();
        assert_eq!(
            placed,
            vec![
                (date(2027, 2, 1), at(8, 0)),
                (date(2027, 2, 2), at(8, 0)),
                (date(2027, 2, 3), at(8, 0)),
            ]
        );
        assert_eq!(out.summary.average_services_per_day, 1.0);
    }

    #[test]
    fn test_monthly_spreads_before_stacking() {
        let days = vec![date(2027, 2, 1), date(2027, 2, 2)];
        let weeks = vec![days.clone()];
        let candidates = vec![ImportCandidate::monthly("A", 3), ImportCandidate::monthly("B", 2)];
        let out = distribute_across(&days, &weeks, BTreeMap::new(), &candidates, &Settings::default());
        let placed: Vec<_> = out
            .services
            .iter()
            .map(|s| (s.client_name.as_str(), s.service_date, s.start_time))
            .collect();
        assert_eq!(
            placed,
            vec![
                ("A", date(2027, 2, 1), at(8, 0)),
                ("A", date(2027, 2, 2), at(8, 0)),
                ("A", date(2027, 2, 1), at(10, 0)),
                ("B", date(2027, 2, 2), at(10, 0)),
                ("B", date(2027, 2, 1), at(13, 0)),
            ]
        );
    }

    #[test]
    fn test_monthly_skips_when_all_days_full() {
        let settings = Settings {
            max_daily_services: 2,
            ..Settings::default()
        };
        let days = vec![date(2027, 2, 1), date(2027, 2, 2)];
        let weeks = vec![days.clone()];
        let candidates = vec![ImportCandidate::monthly("Bistro", 5)];
        let out = distribute_across(&days, &weeks, BTreeMap::new(), &candidates, &settings);
        assert_eq!(out.services.len(), 4);
        assert_eq!(
            out.summary.warnings,
            vec!["Bistro: Cannot schedule visit 5, all days at capacity".to_string()]
        );
        // the regular pass never overfills a day
        assert!(!out.summary.max_day_exceeded);
    }

    #[test]
    fn test_rotation_slots() {
        assert_eq!(rotation_slot(0), at(8, 0));
        assert_eq!(rotation_slot(3), at(15, 0));
        assert_eq!(rotation_slot(4), at(9, 0));
        assert_eq!(rotation_slot(9), at(9, 0));
    }

    #[test]
    fn test_existing_services_seed_counts() {
        let settings = Settings::default();
        let month = date(2027, 2, 1);
        let mut existing = Vec::new();
        // every workday but Feb 26 is already full
        for day in work_days_of_month(month) {
            if day == date(2027, 2, 26) {
                continue;
            }
            for i in 0..4u32 {
                existing.push(Service::new(format!("{day}-{i}"), "Booked", day, at(8 + 2 * i, 0), 60));
            }
        }
        // noise: lunch and canceled work do not count
        existing.push(Service::new("l", "Lunch Break", date(2027, 2, 26), at(12, 0), 60).lunch());
        existing.push(
            Service::new("c", "Gone", date(2027, 2, 26), at(8, 0), 60)
                .with_status(ServiceStatus::Canceled),
        );

        let out = distribute_onto(&existing, &[ImportCandidate::monthly("Late", 5)], month, &settings);
        assert_eq!(out.services.len(), 4);
        assert!(out.services.iter().all(|s| s.service_date == date(2027, 2, 26)));
        assert_eq!(out.summary.warnings.len(), 1);
    }

    #[test]
    fn test_summary_fields() {
        let settings = Settings {
            max_weekly_hours: 10.0,
            ..Settings::default()
        };
        let candidates = vec![
            ImportCandidate::weekly("Weekly", Weekday::Tue, Some(at(10, 0))).with_duration(240),
            ImportCandidate::monthly("Once", 1),
            ImportCandidate::monthly("Once", 1),
            ImportCandidate::monthly("Skipped", 1).deselected(),
        ];
        let out = distribute(&candidates, date(2027, 2, 1), &settings);
        let s = &out.summary;
        assert_eq!(s.total_visits, 6);
        // "Once" counted once; "Weekly" selected by default
        assert_eq!(s.clients_imported, 2);
        assert_eq!(s.recurring_clients, 1);
        // 6 visits / 20 workdays
        assert_eq!(s.average_services_per_day, 0.3);
        // 16 h + 4 h = 20 h, under 40 h
        assert!(!s.max_week_exceeded);

        let tight = Settings {
            max_weekly_hours: 4.0,
            ..Settings::default()
        };
        assert!(distribute(&candidates, date(2027, 2, 1), &tight).summary.max_week_exceeded);
    }

    #[test]
    fn test_idempotent() {
        let candidates = vec![
            ImportCandidate::weekly("W", Weekday::Thu, None),
            ImportCandidate::monthly("M", 6).with_zone(Zone::East),
        ];
        let month = date(2026, 11, 1);
        let a = distribute(&candidates, month, &Settings::default());
        let b = distribute(&candidates, month, &Settings::default());
        assert_eq!(a, b);
        // at most one weekly visit per week
        let weekly: Vec<_> = a.services.iter().filter(|s| s.client_name == "W").collect();
        for w in weekly.windows(2) {
            assert!(w[1].service_date >= w[0].service_date.checked_add_days(Days::new(7)).unwrap());
        }
    }

    #[test]
    fn test_candidate_json_shape() {
        let c = ImportCandidate::weekly("W", Weekday::Wed, Some(at(10, 0)));
        let json = serde_json::to_string(&c).unwrap();
        assert!(json.contains("\"cadence\":\"weekly\""));
        assert!(json.contains("\"time\":\"10:00\""));
        let back: ImportCandidate = serde_json::from_str(&json).unwrap();
        assert_eq!(back, c);
    }
}
