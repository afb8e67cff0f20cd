//! End-of-day review: which of today's visits are still open once the workday
//! is winding down, and whether the person has already waved the alert off.
//!
//! Wall-clock time and the dismissal record are both injected (`Clock`,
//! `AlertLedger`) so the check stays deterministic under test.

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime, Timelike};

use crate::service::{Service, ServiceStatus};
use crate::settings::Settings;

/// Ledger key holding the date (`YYYY-MM-DD`) the alert was last dismissed.
pub const DISMISSED_KEY: &str = "end_of_day_alert_dismissed";

pub trait Clock {
    /// Local wall-clock time.
    fn now(&self) -> NaiveDateTime;
}

/// Small string key-value store for alert state.
pub trait AlertLedger {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: String);
    fn remove(&mut self, key: &str);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryLedger {
    entries: BTreeMap<String, String>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AlertLedger for MemoryLedger {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) {
        self.entries.insert(key.to_string(), value);
    }

    fn remove(&mut self, key: &str) {
        self.entries.remove(key);
    }
}

/// Regular visits on `date` that are neither completed nor canceled.
pub fn pending_services(services: &[Service], date: NaiveDate) -> Vec<&Service> {
    services
        .iter()
        .filter(|s| s.service_date == date && !s.is_lunch_block)
        .filter(|s| !matches!(s.status, ServiceStatus::Completed | ServiceStatus::Canceled))
        .collect()
}

/// Percent of regular visits on `date` that are completed; 100 for an empty day.
pub fn daily_completion_rate(services: &[Service], date: NaiveDate) -> f64 {
    let day: Vec<&Service> = services
        .iter()
        .filter(|s| s.service_date == date && !s.is_lunch_block)
        .collect();
    if day.is_empty() {
        return 100.0;
    }
    let completed = day
        .iter()
        .filter(|s| s.status == ServiceStatus::Completed)
        .count();
    completed as f64 / day.len() as f64 * 100.0
}

#[derive(Debug, Clone)]
pub struct EndOfDayAlert<C: Clock> {
    clock: C,
    enabled: bool,
    alert_hour: u32,
}

impl<C: Clock> EndOfDayAlert<C> {
    pub fn new(clock: C, settings: &Settings) -> Self {
        Self {
            clock,
            enabled: settings.end_of_day_alert_enabled,
            alert_hour: settings.end_of_day_alert_hour,
        }
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.now().date()
    }

    /// Today's open visits, or nothing when the alert is off, it is still
    /// before the alert hour, or today's alert was already dismissed.
    pub fn check<'a>(&self, services: &'a [Service], ledger: &impl AlertLedger) -> Vec<&'a Service> {
        let now = self.clock.now();
        if !self.enabled || now.hour() < self.alert_hour || self.seen_today(ledger) {
            return Vec::new();
        }
        pending_services(services, now.date())
    }

    pub fn seen_today(&self, ledger: &impl AlertLedger) -> bool {
        ledger.get(DISMISSED_KEY).as_deref() == Some(date_key(self.today()).as_str())
    }

    pub fn dismiss(&self, ledger: &mut impl AlertLedger) {
        ledger.set(DISMISSED_KEY, date_key(self.today()));
    }

    pub fn reset(&self, ledger: &mut impl AlertLedger) {
        ledger.remove(DISMISSED_KEY);
    }
}

fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}
