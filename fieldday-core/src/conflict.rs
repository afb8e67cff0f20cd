//! Conflict detection: which existing services a candidate interval runs into.

use chrono::{NaiveDate, NaiveTime};

use crate::service::{NewService, Service};
use crate::time::{intervals_overlap, minutes_of};

/// Services on `date` whose interval overlaps `[start, start + duration)`.
///
/// Canceled records and `exclude_id` are skipped. Results keep snapshot order.
pub fn find_conflicts<'a>(
    services: &'a [Service],
    date: NaiveDate,
    start: NaiveTime,
    duration_minutes: i32,
    exclude_id: Option<&str>,
) -> Vec<&'a Service> {
    let start_min = minutes_of(start);
    let end_min = start_min.saturating_add(duration_minutes);

    services
        .iter()
        .filter(|s| s.service_date == date)
        .filter(|s| s.is_active())
        .filter(|s| exclude_id != Some(s.id.as_str()))
        .filter(|s| intervals_overlap(start_min, end_min, s.start_minutes(), s.end_minutes()))
        .collect()
}

/// Whether any active service on `date` overlaps the given minute range.
pub(crate) fn day_has_overlap(day_services: &[&Service], start_min: i32, end_min: i32) -> bool {
    day_services
        .iter()
        .any(|s| intervals_overlap(start_min, end_min, s.start_minutes(), s.end_minutes()))
}

/// Outcome of checking a new service against the current snapshot.
#[derive(Debug, Clone, PartialEq)]
pub enum Admission<'a> {
    /// No overlap; create as-is.
    Clear,
    /// Normal work overlapping existing services; creation is blocked.
    Blocked(Vec<&'a Service>),
    /// Emergency work; these services must be moved out of the way.
    Displaces(Vec<&'a Service>),
}

impl Admission<'_> {
    pub fn conflicts(&self) -> &[&Service] {
        match self {
            Admission::Clear => &[],
            Admission::Blocked(c) | Admission::Displaces(c) => c,
        }
    }
}

pub fn admit<'a>(services: &'a [Service], candidate: &NewService) -> Admission<'a> {
    let conflicts = find_conflicts(
        services,
        candidate.service_date,
        candidate.start_time,
        candidate.duration_minutes,
        None,
    );
    if conflicts.is_empty() {
        Admission::Clear
    } else if candidate.is_emergency() {
        Admission::Displaces(conflicts)
    } else {
        Admission::Blocked(conflicts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::ServiceStatus;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn at(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn day() -> NaiveDate {
        date(2026, 10, 20)
    }

    fn snapshot() -> Vec<Service> {
        vec![
            Service::new("a", "Harbor Grill", day(), at(9, 0), 90),
            Service::new("b", "Maple Cafe", day(), at(11, 0), 60),
            Service::new("c", "Lunch Break", day(), at(12, 0), 60).lunch(),
            Service::new("d", "Other Day", date(2026, 10, 21), at(10, 0), 60),
            Service::new("e", "Dropped", day(), at(10, 0), 60).with_status(ServiceStatus::Canceled),
        ]
    }

    #[test]
    fn test_candidate_hits_first_not_second() {
        let services = snapshot();
        let hits = find_conflicts(&services, day(), at(10, 0), 60, None);
        let ids: Vec<_> = hits.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["a"]);
    }

    #[test]
    fn test_excluded_canceled_and_other_days_never_returned() {
        let services = snapshot();
        let hits = find_conflicts(&services, day(), at(7, 0), 11 * 60, Some("b"));
        let ids: Vec<_> = hits.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
    }

    #[test]
    fn test_lunch_block_occupies_time() {
        let services = snapshot();
        let hits = find_conflicts(&services, day(), at(12, 30), 30, None);
        assert_eq!(hits.len(), 1);
        assert!(hits[0].is_lunch_block);
    }

    #[test]
    fn test_huge_duration_runs_to_end_of_day() {
        let services = snapshot();
        let hits = find_conflicts(&services, day(), at(10, 0), i32::MAX, None);
        let ids: Vec<_> = hits.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);

        let long = Service::new("z", "Overnight", day(), at(8, 0), i32::MAX);
        assert_eq!(long.end_minutes(), i32::MAX);
        assert_eq!(find_conflicts(&[long], day(), at(17, 0), 30, None).len(), 1);
    }

    #[test]
    fn test_back_to_back_is_clear() {
        let services = snapshot();
        assert!(find_conflicts(&services, day(), at(10, 30), 30, None).is_empty());
        assert!(find_conflicts(&services, day(), at(13, 0), 60, None).is_empty());
    }

    #[test]
    fn test_admit_blocks_normal_and_displaces_for_emergency() {
        let services = snapshot();
        let normal = NewService::new("Pier 9", day(), at(9, 30), 60);
        match admit(&services, &normal) {
            Admission::Blocked(c) => assert_eq!(c.len(), 1),
            other => panic!("expected Blocked, got {other:?}"),
        }

        let urgent = NewService::new("Pier 9", day(), at(9, 30), 120).emergency();
        let admission = admit(&services, &urgent);
        assert!(matches!(admission, Admission::Displaces(_)));
        assert_eq!(admission.conflicts().len(), 2);

        let free = NewService::new("Pier 9", day(), at(14, 0), 60);
        assert_eq!(admit(&services, &free), Admission::Clear);
    }
}
