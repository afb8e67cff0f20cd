//! Lunch blocks: a daily placeholder that occupies time but never capacity.
//!
//! Lunch blocks skip the normal reschedule/complete flow; the only way to move one
//! is [`move_lunch`], which keeps it on the same day inside work hours.

use chrono::{NaiveDate, NaiveTime, Timelike};
use serde::Serialize;

use crate::error::{CoreError, Result};
use crate::service::{NewService, Service};
use crate::time::{format_time, hhmm, intervals_overlap, minutes_of};

pub const LUNCH_CLIENT_NAME: &str = "Lunch Break";
pub const LUNCH_DURATION_MINUTES: i32 = 60;

/// Candidate lunch starts offered when the default slot is taken.
const LUNCH_CANDIDATES: [(u32, u32); 7] = [
    (11, 0),
    (11, 30),
    (12, 0),
    (12, 30),
    (13, 0),
    (13, 30),
    (14, 0),
];

const LUNCH_EARLIEST_HOUR: u32 = 7;
const LUNCH_LATEST_HOUR: u32 = 18;

pub fn default_lunch_break(date: NaiveDate, start: NaiveTime) -> NewService {
    let mut lunch = NewService::new(LUNCH_CLIENT_NAME, date, start, LUNCH_DURATION_MINUTES)
        .with_model("N/A")
        .with_address("N/A")
        .with_notes("Daily lunch break");
    lunch.is_lunch_block = true;
    lunch
}

/// Same day only; the new start hour must fall in [07, 18).
pub fn validate_lunch_move(lunch: &Service, new_date: NaiveDate, new_time: NaiveTime) -> Result<()> {
    if new_date != lunch.service_date {
        return Err(CoreError::LunchMove(
            "Lunch break must stay on the same day".to_string(),
        ));
    }
    if !(LUNCH_EARLIEST_HOUR..LUNCH_LATEST_HOUR).contains(&new_time.hour()) {
        return Err(CoreError::LunchMove(
            "Lunch break must be within work hours (07:00 - 18:00)".to_string(),
        ));
    }
    Ok(())
}

/// Move a lunch block to `new_time` on its own day.
pub fn move_lunch(lunch: &mut Service, new_time: NaiveTime) -> Result<()> {
    if !lunch.is_lunch_block {
        return Err(CoreError::LunchMove(format!(
            "{} is not a lunch break",
            lunch.client_name
        )));
    }
    validate_lunch_move(lunch, lunch.service_date, new_time)?;
    lunch.start_time = new_time;
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LunchConflict<'a> {
    pub service: &'a Service,
    pub message: String,
}

/// Regular services overlapping a lunch hour starting at `start`.
pub fn lunch_conflicts<'a>(
    services: &'a [Service],
    date: NaiveDate,
    start: NaiveTime,
    exclude_id: Option<&str>,
) -> Vec<LunchConflict<'a>> {
    let lunch_start = minutes_of(start);
    let lunch_end = lunch_start + LUNCH_DURATION_MINUTES;

    services
        .iter()
        .filter(|s| s.service_date == date && s.is_active() && !s.is_lunch_block)
        .filter(|s| exclude_id != Some(s.id.as_str()))
        .filter(|s| intervals_overlap(lunch_start, lunch_end, s.start_minutes(), s.end_minutes()))
        .map(|s| LunchConflict {
            service: s,
            message: format!(
                "Overlaps with {} ({})",
                s.client_name,
                format_time(s.start_time)
            ),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LunchSuggestion {
    #[serde(with = "hhmm")]
    pub time: NaiveTime,
    pub conflicts: bool,
}

pub fn suggest_lunch_times(
    services: &[Service],
    date: NaiveDate,
    exclude_id: Option<&str>,
) -> Vec<LunchSuggestion> {
    LUNCH_CANDIDATES
        .iter()
        .filter_map(|&(h, m)| NaiveTime::from_hms_opt(h, m, 0))
        .map(|time| LunchSuggestion {
            time,
            conflicts: !lunch_conflicts(services, date, time, exclude_id).is_empty(),
        })
        .collect()
}

/// `preferred` if free, else the first free candidate, else `preferred` anyway.
pub fn best_lunch_time(services: &[Service], date: NaiveDate, preferred: NaiveTime) -> NaiveTime {
    if lunch_conflicts(services, date, preferred, None).is_empty() {
        return preferred;
    }
    suggest_lunch_times(services, date, None)
        .into_iter()
        .find(|s| !s.conflicts)
        .map_or(preferred, |s| s.time)
}

/// The day has regular work but no lunch block yet.
pub fn should_auto_create_lunch(services: &[Service], date: NaiveDate) -> bool {
    let mut has_work = false;
    for s in services.iter().filter(|s| s.service_date == date) {
        if s.is_lunch_block {
            return false;
        }
        has_work = true;
    }
    has_work
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::{ServiceKind, ServiceStatus};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn at(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn day() -> NaiveDate {
        date(2026, 10, 21)
    }

    #[test]
    fn test_default_lunch_break_shape() {
        let lunch = default_lunch_break(day(), at(12, 0));
        assert!(lunch.is_lunch_block);
        assert_eq!(lunch.client_name, "Lunch Break");
        assert_eq!(lunch.dishwasher_model, "N/A");
        assert_eq!(lunch.duration_minutes, 60);
        assert_eq!(lunch.kind, ServiceKind::ScheduledMaintenance);
        assert!(lunch.validate().is_ok());
    }

    #[test]
    fn test_validate_lunch_move() {
        let lunch = default_lunch_break(day(), at(12, 0)).into_service("l1");
        assert!(validate_lunch_move(&lunch, day(), at(7, 0)).is_ok());
        assert!(validate_lunch_move(&lunch, day(), at(17, 30)).is_ok());
        assert!(validate_lunch_move(&lunch, day(), at(6, 30)).is_err());
        assert!(validate_lunch_move(&lunch, day(), at(18, 0)).is_err());
        assert!(matches!(
            validate_lunch_move(&lunch, date(2026, 10, 22), at(12, 0)),
            Err(CoreError::LunchMove(_))
        ));
    }

    #[test]
    fn test_move_lunch_only_moves_lunch() {
        let mut lunch = default_lunch_break(day(), at(12, 0)).into_service("l1");
        move_lunch(&mut lunch, at(13, 30)).unwrap();
        assert_eq!(lunch.start_time, at(13, 30));
        assert_eq!(lunch.service_date, day());

        let mut visit = Service::new("s1", "Harbor Grill", day(), at(9, 0), 60);
        assert!(move_lunch(&mut visit, at(13, 0)).is_err());
        assert_eq!(visit.start_time, at(9, 0));
    }

    #[test]
    fn test_conflicts_ignore_other_lunches_and_canceled() {
        let services = vec![
            Service::new("a", "Harbor Grill", day(), at(11, 0), 90),
            Service::new("b", "Maple Cafe", day(), at(13, 0), 60),
            Service::new("x", "Dropped", day(), at(12, 0), 60).with_status(ServiceStatus::Canceled),
            default_lunch_break(day(), at(12, 0)).into_service("l1"),
        ];
        let hits = lunch_conflicts(&services, day(), at(12, 0), None);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].service.id, "a");
        assert_eq!(hits[0].message, "Overlaps with Harbor Grill (11:00)");

        assert!(lunch_conflicts(&services, day(), at(12, 0), Some("a")).is_empty());
    }

    #[test]
    fn test_suggest_and_best_lunch_time() {
        let services = vec![
            Service::new("a", "Harbor Grill", day(), at(10, 30), 120),
            Service::new("b", "Maple Cafe", day(), at(13, 30), 60),
        ];
        let suggestions = suggest_lunch_times(&services, day(), None);
        let free: Vec<_> = suggestions
            .iter()
            .filter(|s| !s.conflicts)
            .map(|s| s.time)
            .collect();
        // 12:30 is the only hour between the two visits
        assert_eq!(free, vec![at(12, 30)]);
        assert_eq!(suggestions.len(), 7);

        assert_eq!(best_lunch_time(&services, day(), at(12, 0)), at(12, 30));
        assert_eq!(best_lunch_time(&[], day(), at(12, 0)), at(12, 0));

        let packed = vec![Service::new("c", "All Day", day(), at(7, 0), 600)];
        assert_eq!(best_lunch_time(&packed, day(), at(12, 0)), at(12, 0));
    }

    #[test]
    fn test_should_auto_create_lunch() {
        let work = Service::new("a", "Harbor Grill", day(), at(9, 0), 60);
        let lunch = default_lunch_break(day(), at(12, 0)).into_service("l1");
        assert!(should_auto_create_lunch(std::slice::from_ref(&work), day()));
        assert!(!should_auto_create_lunch(&[work, lunch.clone()], day()));
        assert!(!should_auto_create_lunch(&[], day()));
        assert!(!should_auto_create_lunch(&[lunch], day()));
    }
}
