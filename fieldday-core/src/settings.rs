//! Capacity and working-day settings, read-only to the engine.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::time::{hhmm, minutes_of};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub max_daily_services: usize,
    pub max_weekly_hours: f64,

    #[serde(with = "hhmm")]
    pub work_start: NaiveTime,
    #[serde(with = "hhmm")]
    pub work_end: NaiveTime,
    #[serde(with = "hhmm")]
    pub lunch_time: NaiveTime,
    pub lunch_duration_minutes: i32,

    pub min_service_duration_minutes: i32,
    pub max_service_duration_minutes: i32,

    pub end_of_day_alert_enabled: bool,
    /// Local hour (0-23) after which unfinished work is flagged.
    pub end_of_day_alert_hour: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_daily_services: 4,
            max_weekly_hours: 50.0,
            work_start: NaiveTime::from_hms_opt(7, 0, 0).unwrap_or(NaiveTime::MIN),
            work_end: NaiveTime::from_hms_opt(18, 0, 0).unwrap_or(NaiveTime::MIN),
            lunch_time: NaiveTime::from_hms_opt(12, 0, 0).unwrap_or(NaiveTime::MIN),
            lunch_duration_minutes: 60,
            min_service_duration_minutes: 30,
            max_service_duration_minutes: 240,
            end_of_day_alert_enabled: true,
            end_of_day_alert_hour: 17,
        }
    }
}

impl Settings {
    pub fn work_start_minutes(&self) -> i32 {
        minutes_of(self.work_start)
    }

    pub fn work_end_minutes(&self) -> i32 {
        minutes_of(self.work_end)
    }

    /// Whether a duration falls inside the configured min/max bounds.
    pub fn duration_in_bounds(&self, minutes: i32) -> bool {
        (self.min_service_duration_minutes..=self.max_service_duration_minutes).contains(&minutes)
    }
}
