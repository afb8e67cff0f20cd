//! Load accounting: per-day counts, per-week hours, month completion, and the
//! per-service capability table.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::service::{Service, ServiceStatus};
use crate::time::{month_range, week_range};

/// Active non-lunch services on `date`.
pub fn daily_service_count(services: &[Service], date: NaiveDate) -> usize {
    services
        .iter()
        .filter(|s| s.service_date == date && s.counts_toward_capacity())
        .count()
}

/// Hours booked on `date`, lunch blocks included.
pub fn daily_hours(services: &[Service], date: NaiveDate) -> f64 {
    services
        .iter()
        .filter(|s| s.service_date == date && s.is_active())
        .map(|s| f64::from(s.duration_minutes) / 60.0)
        .sum()
}

/// Hours booked in the Monday..=Sunday week containing `week_of`, lunch blocks included.
pub fn weekly_hours(services: &[Service], week_of: NaiveDate) -> f64 {
    let (start, end) = week_range(week_of);
    services
        .iter()
        .filter(|s| s.is_active() && s.service_date >= start && s.service_date <= end)
        .map(|s| f64::from(s.duration_minutes) / 60.0)
        .sum()
}

/// Active non-lunch services in the week containing `week_of`.
pub fn weekly_service_count(services: &[Service], week_of: NaiveDate) -> usize {
    let (start, end) = week_range(week_of);
    services
        .iter()
        .filter(|s| s.counts_toward_capacity() && s.service_date >= start && s.service_date <= end)
        .count()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyCompletion {
    pub completed: usize,
    pub total: usize,
}

/// Completed vs. total active non-lunch services in the month containing `month_of`.
pub fn monthly_completion(services: &[Service], month_of: NaiveDate) -> MonthlyCompletion {
    let (start, end) = month_range(month_of);
    let in_month: Vec<&Service> = services
        .iter()
        .filter(|s| s.counts_toward_capacity() && s.service_date >= start && s.service_date <= end)
        .collect();
    MonthlyCompletion {
        completed: in_month
            .iter()
            .filter(|s| s.status == ServiceStatus::Completed)
            .count(),
        total: in_month.len(),
    }
}

/// One-day load snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayLoad {
    pub date: NaiveDate,
    pub services: usize,
    pub hours: f64,
    pub at_capacity: bool,
}

/// One-week load snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeekLoad {
    pub week_start: NaiveDate,
    pub week_end: NaiveDate,
    pub services: usize,
    pub hours: f64,
    pub over_ceiling: bool,
}

pub fn day_load(services: &[Service], date: NaiveDate, max_daily_services: usize) -> DayLoad {
    let count = daily_service_count(services, date);
    DayLoad {
        date,
        services: count,
        hours: daily_hours(services, date),
        at_capacity: count >= max_daily_services,
    }
}

pub fn week_load(services: &[Service], week_of: NaiveDate, max_weekly_hours: f64) -> WeekLoad {
    let (week_start, week_end) = week_range(week_of);
    let hours = weekly_hours(services, week_of);
    WeekLoad {
        week_start,
        week_end,
        services: weekly_service_count(services, week_of),
        hours,
        over_ceiling: hours > max_weekly_hours,
    }
}

/// What a person may do with a service in its current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceActions {
    pub can_reschedule: bool,
    pub can_mark_completed: bool,
    pub can_edit: bool,
    pub can_delete: bool,
    pub can_add_notes: bool,
}

/// Capability table, derived from status and the lunch flag only.
pub fn actions_for(service: &Service) -> ServiceActions {
    if service.is_lunch_block {
        return ServiceActions {
            can_reschedule: false,
            can_mark_completed: false,
            can_edit: true,
            can_delete: true,
            can_add_notes: false,
        };
    }

    match service.status {
        ServiceStatus::Completed | ServiceStatus::Canceled => ServiceActions {
            can_reschedule: false,
            can_mark_completed: false,
            can_edit: true,
            can_delete: true,
            can_add_notes: true,
        },
        ServiceStatus::InProgress => ServiceActions {
            can_reschedule: false,
            can_mark_completed: true,
            can_edit: true,
            can_delete: false,
            can_add_notes: true,
        },
        ServiceStatus::Scheduled | ServiceStatus::Rescheduled => ServiceActions {
            can_reschedule: true,
            can_mark_completed: true,
            can_edit: true,
            can_delete: true,
            can_add_notes: true,
        },
    }
}

/// Normal-flow reschedule guard.
pub fn validate_reschedule(service: &Service) -> Result<()> {
    if service.is_lunch_block {
        return Err(CoreError::LunchBlock {
            action: "rescheduled",
        });
    }
    if !service.status.is_pending() {
        return Err(CoreError::InvalidTransition {
            action: "reschedule",
            status: service.status,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn at(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_daily_count_skips_lunch_and_canceled() {
        let d = date(2026, 10, 20);
        let services = vec![
            Service::new("a", "A", d, at(8, 0), 60),
            Service::new("b", "B", d, at(10, 0), 60),
            Service::new("l", "Lunch Break", d, at(12, 0), 60).lunch(),
            Service::new("c", "C", d, at(14, 0), 60).with_status(ServiceStatus::Canceled),
            Service::new("x", "X", date(2026, 10, 21), at(8, 0), 60),
        ];
        assert_eq!(daily_service_count(&services, d), 2);
        assert_eq!(daily_hours(&services, d), 3.0);
    }

    #[test]
    fn test_weekly_hours_counts_lunch() {
        let services = vec![
            Service::new("a", "Big job", date(2026, 10, 20), at(8, 0), 480),
            Service::new("l", "Lunch Break", date(2026, 10, 22), at(12, 0), 60).lunch(),
        ];
        assert_eq!(weekly_hours(&services, date(2026, 10, 25)), 9.0);
        assert_eq!(weekly_service_count(&services, date(2026, 10, 19)), 1);
    }

    #[test]
    fn test_weekly_hours_window_and_order_independence() {
        let mut services = vec![
            // Sunday before: previous week
            Service::new("p", "P", date(2026, 10, 18), at(8, 0), 120),
            Service::new("m", "M", date(2026, 10, 19), at(8, 0), 90),
            Service::new("s", "S", date(2026, 10, 25), at(8, 0), 30),
            Service::new("c", "C", date(2026, 10, 21), at(8, 0), 600)
                .with_status(ServiceStatus::Canceled),
            // Monday after: next week
            Service::new("n", "N", date(2026, 10, 26), at(8, 0), 60),
        ];
        let forward = weekly_hours(&services, date(2026, 10, 22));
        services.reverse();
        let backward = weekly_hours(&services, date(2026, 10, 22));
        assert_eq!(forward, 2.0);
        assert_eq!(forward, backward);
    }

    #[test]
    fn test_monthly_completion() {
        let services = vec![
            Service::new("a", "A", date(2026, 11, 2), at(8, 0), 60)
                .with_status(ServiceStatus::Completed),
            Service::new("b", "B", date(2026, 11, 30), at(8, 0), 60),
            Service::new("c", "C", date(2026, 11, 5), at(8, 0), 60)
                .with_status(ServiceStatus::Canceled),
            Service::new("l", "Lunch Break", date(2026, 11, 2), at(12, 0), 60)
                .lunch()
                .with_status(ServiceStatus::Completed),
            Service::new("o", "O", date(2026, 10, 30), at(8, 0), 60)
                .with_status(ServiceStatus::Completed),
        ];
        assert_eq!(
            monthly_completion(&services, date(2026, 11, 15)),
            MonthlyCompletion {
                completed: 1,
                total: 2
            }
        );
    }

    #[test]
    fn test_day_and_week_load() {
        let d = date(2026, 10, 20);
        let services: Vec<Service> = (0..4)
            .map(|i| Service::new(format!("s{i}"), "Client", d, at(8 + 2 * i, 0), 120))
            .collect();
        let day = day_load(&services, d, 4);
        assert!(day.at_capacity);
        assert_eq!(day.hours, 8.0);

        let week = week_load(&services, d, 6.0);
        assert_eq!(week.week_start, date(2026, 10, 19));
        assert!(week.over_ceiling);
    }

    #[test]
    fn test_capability_table() {
        let d = date(2026, 10, 20);
        let base = Service::new("a", "A", d, at(9, 0), 60);

        let completed = actions_for(&base.clone().with_status(ServiceStatus::Completed));
        assert!(!completed.can_reschedule && !completed.can_mark_completed && completed.can_delete);

        let running = actions_for(&base.clone().with_status(ServiceStatus::InProgress));
        assert!(!running.can_reschedule && running.can_mark_completed && !running.can_delete);

        let canceled = actions_for(&base.clone().with_status(ServiceStatus::Canceled));
        assert!(!canceled.can_reschedule && !canceled.can_mark_completed && canceled.can_delete);

        for status in [ServiceStatus::Scheduled, ServiceStatus::Rescheduled] {
            let open = actions_for(&base.clone().with_status(status));
            assert!(open.can_reschedule && open.can_mark_completed && open.can_delete);
            assert!(open.can_add_notes);
        }

        for status in [ServiceStatus::Scheduled, ServiceStatus::InProgress, ServiceStatus::Completed] {
            let lunch = actions_for(&base.clone().lunch().with_status(status));
            assert!(!lunch.can_reschedule && !lunch.can_mark_completed);
            assert!(lunch.can_edit && lunch.can_delete);
        }
    }

    #[test]
    fn test_validate_reschedule_hints() {
        let d = date(2026, 10, 20);
        let done = Service::new("a", "A", d, at(9, 0), 60).with_status(ServiceStatus::Completed);
        let err = validate_reschedule(&done).unwrap_err();
        assert_eq!(err.hint(), Some("Create a new service instead"));

        let lunch = Service::new("l", "Lunch Break", d, at(12, 0), 60).lunch();
        assert!(matches!(
            validate_reschedule(&lunch),
            Err(CoreError::LunchBlock { .. })
        ));

        assert!(validate_reschedule(&Service::new("b", "B", d, at(9, 0), 60)).is_ok());
    }
}
