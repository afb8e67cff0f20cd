//! Slot suggestion engine.
//!
//! Given a visit that has to move, walk forward one calendar day at a time and
//! propose at most one start time per workday, then rank the proposals.
//!
//! Per-day algorithm (deterministic):
//! 1) skip weekends, days already over the skip threshold, and days whose week
//!    would exceed the weekly-hour ceiling
//! 2) try the preferred start (original time, else 09:00), then each whole hour
//!    from work start while the slot still ends by work end
//! 3) take the first start that ends by work end, misses the lunch window, and
//!    overlaps nothing already on the day
//! 4) score it; stop after `max_results` accepted days or the search horizon
//!
//! Results are ordered optimal -> good -> acceptable, then by score descending.

use chrono::{Days, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::conflict::day_has_overlap;
use crate::load::weekly_hours;
use crate::service::{Service, Zone};
use crate::settings::Settings;
use crate::time::{hhmm, intervals_overlap, is_weekday, minutes_of, time_from_minutes};

/// Search constants. `Default` is the fixed policy: 07:00-18:00 workday, lunch
/// 12:00-13:00, skip days with 5+ services, 50 h/week ceiling, 30-day horizon,
/// 3 results.
#[derive(Debug, Clone, PartialEq)]
pub struct SlotRules {
    pub work_start: i32,
    pub work_end: i32,
    pub lunch_start: i32,
    pub lunch_end: i32,
    /// Days with at least this many services are not considered at all.
    pub day_skip_threshold: usize,
    pub max_weekly_hours: f64,
    pub search_days: u64,
    pub max_results: usize,
    /// Start used when the request carries no original time.
    pub fallback_start: i32,
}

impl Default for SlotRules {
    fn default() -> Self {
        Self {
            work_start: 7 * 60,
            work_end: 18 * 60,
            lunch_start: 12 * 60,
            lunch_end: 13 * 60,
            day_skip_threshold: 5,
            max_weekly_hours: 50.0,
            search_days: 30,
            max_results: 3,
            fallback_start: 9 * 60,
        }
    }
}

impl SlotRules {
    /// Derive the working window and ceilings from configured settings.
    pub fn from_settings(settings: &Settings) -> Self {
        let lunch_start = minutes_of(settings.lunch_time);
        Self {
            work_start: settings.work_start_minutes(),
            work_end: settings.work_end_minutes(),
            lunch_start,
            lunch_end: lunch_start + settings.lunch_duration_minutes,
            day_skip_threshold: settings.max_daily_services + 1,
            max_weekly_hours: settings.max_weekly_hours,
            ..Self::default()
        }
    }
}

/// A visit that needs a new home.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotRequest {
    pub original_date: NaiveDate,
    pub duration_minutes: i32,
    pub preferred_zone: Option<Zone>,
    #[serde(default, with = "crate::time::hhmm_opt")]
    pub original_time: Option<NaiveTime>,
}

impl SlotRequest {
    pub fn new(original_date: NaiveDate, duration_minutes: i32) -> Self {
        Self {
            original_date,
            duration_minutes,
            preferred_zone: None,
            original_time: None,
        }
    }

    pub fn with_zone(mut self, zone: Zone) -> Self {
        self.preferred_zone = Some(zone);
        self
    }

    pub fn with_time(mut self, time: NaiveTime) -> Self {
        self.original_time = Some(time);
        self
    }

    /// Request to relocate an existing service, anchored on `from_date`.
    pub fn for_service(service: &Service, from_date: NaiveDate) -> Self {
        Self {
            original_date: from_date,
            duration_minutes: service.duration_minutes,
            preferred_zone: Some(service.zone),
            original_time: Some(service.start_time),
        }
    }
}

/// Ordered best-first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotCategory {
    Optimal,
    Good,
    Acceptable,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotSuggestion {
    pub date: NaiveDate,
    #[serde(with = "hhmm")]
    pub time: NaiveTime,
    pub score: i32,
    pub category: SlotCategory,
    /// Services already on that day (lunch excluded).
    pub service_count: usize,
    /// Week hours including the moved visit.
    pub week_hours: f64,
    pub days_from_original: i64,
    pub same_zone: bool,
}

/// Suggest up to three alternative slots under the default rules.
pub fn suggest_slots(services: &[Service], request: &SlotRequest) -> Vec<SlotSuggestion> {
    suggest_slots_with(services, request, &SlotRules::default())
}

pub fn suggest_slots_with(
    services: &[Service],
    request: &SlotRequest,
    rules: &SlotRules,
) -> Vec<SlotSuggestion> {
    let mut suggestions = Vec::new();
    let duration = request.duration_minutes;
    let preferred_start = request
        .original_time
        .map(minutes_of)
        .unwrap_or(rules.fallback_start);
    let starts = candidate_starts(preferred_start, duration, rules);

    for offset in 1..=rules.search_days {
        if suggestions.len() >= rules.max_results {
            break;
        }
        let Some(day) = request.original_date.checked_add_days(Days::new(offset)) else {
            break;
        };
        if !is_weekday(day) {
            continue;
        }

        let day_services: Vec<&Service> = services
            .iter()
            .filter(|s| s.service_date == day && s.is_active())
            .collect();
        let service_count = day_services.iter().filter(|s| !s.is_lunch_block).count();
        if service_count >= rules.day_skip_threshold {
            debug!(date = %day, count = service_count, "slot search: day over capacity");
            continue;
        }

        let current_week_hours = weekly_hours(services, day);
        let projected_week_hours = current_week_hours + f64::from(duration) / 60.0;
        if projected_week_hours > rules.max_weekly_hours {
            debug!(date = %day, hours = projected_week_hours, "slot search: weekly ceiling");
            continue;
        }

        let Some(start) = starts
            .iter()
            .copied()
            .find(|&start| slot_is_open(start, duration, &day_services, rules))
        else {
            continue;
        };
        let Some(time) = time_from_minutes(start) else {
            continue;
        };

        let days_from_original = (day - request.original_date).num_days();
        let same_zone = request.preferred_zone.is_some_and(|zone| {
            day_services
                .iter()
                .any(|s| !s.is_lunch_block && s.zone == zone)
        });
        let (score, category) = score_slot(SlotFacts {
            service_count,
            days_from_original,
            current_week_hours,
            same_zone,
            start,
            original_start: request.original_time.map(minutes_of),
        });

        debug!(date = %day, time = %time, score, ?category, "slot search: accepted");
        suggestions.push(SlotSuggestion {
            date: day,
            time,
            score,
            category,
            service_count,
            week_hours: projected_week_hours,
            days_from_original,
            same_zone,
        });
    }

    // stable: equal (category, score) keep chronological order
    suggestions.sort_by(|a, b| a.category.cmp(&b.category).then(b.score.cmp(&a.score)));
    suggestions.truncate(rules.max_results);
    suggestions
}

/// Preferred start first, then whole hours from work start that fit before work end.
fn candidate_starts(preferred: i32, duration: i32, rules: &SlotRules) -> Vec<i32> {
    let mut starts = vec![preferred];
    let mut t = rules.work_start;
    while t.saturating_add(duration) <= rules.work_end {
        if !starts.contains(&t) {
            starts.push(t);
        }
        t += 60;
    }
    starts
}

fn slot_is_open(start: i32, duration: i32, day_services: &[&Service], rules: &SlotRules) -> bool {
    let end = start.saturating_add(duration);
    if end > rules.work_end {
        return false;
    }
    if intervals_overlap(start, end, rules.lunch_start, rules.lunch_end) {
        return false;
    }
    !day_has_overlap(day_services, start, end)
}

struct SlotFacts {
    service_count: usize,
    days_from_original: i64,
    current_week_hours: f64,
    same_zone: bool,
    start: i32,
    original_start: Option<i32>,
}

fn score_slot(f: SlotFacts) -> (i32, SlotCategory) {
    let mut score = 100;

    let category = match f.service_count {
        0..=2 => {
            score += 30;
            SlotCategory::Optimal
        }
        3 => {
            score += 15;
            SlotCategory::Good
        }
        _ => SlotCategory::Acceptable,
    };

    score += match f.days_from_original {
        1 => 25,
        2..=3 => 15,
        4..=7 => 5,
        d => -2 * (d - 7) as i32,
    };

    if f.current_week_hours < 40.0 {
        score += 10;
    } else if f.current_week_hours > 45.0 {
        score -= 15;
    }

    if f.same_zone {
        score += 20;
    }

    if let Some(original) = f.original_start {
        if (f.start - original).abs() < 120 {
            score += 15;
        }
    }

    (score, category)
}
