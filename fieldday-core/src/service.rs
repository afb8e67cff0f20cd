//! Service model: the unit of scheduled technician work (or a lunch block).
//!
//! Storage is an external concern. The core only ever sees snapshots of these
//! records and hands back fresh copies; ids are assigned by whoever persists them.

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::time::{hhmm, is_weekday, minutes_of};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceKind {
    ScheduledMaintenance,
    Emergency,
    Recurring,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Normal,
    Urgent,
    Emergency,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Zone {
    North,
    South,
    East,
    West,
    Downtown,
    #[default]
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceStatus {
    Scheduled,
    InProgress,
    Completed,
    Rescheduled,
    Canceled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportSource {
    Csv,
    Manual,
}

impl ServiceStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ServiceStatus::Scheduled => "scheduled",
            ServiceStatus::InProgress => "in_progress",
            ServiceStatus::Completed => "completed",
            ServiceStatus::Rescheduled => "rescheduled",
            ServiceStatus::Canceled => "canceled",
        }
    }

    /// Still pending work: scheduled or already moved once.
    pub fn is_pending(self) -> bool {
        matches!(self, ServiceStatus::Scheduled | ServiceStatus::Rescheduled)
    }
}

impl fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl Zone {
    pub const ALL: [Zone; 6] = [
        Zone::North,
        Zone::South,
        Zone::East,
        Zone::West,
        Zone::Downtown,
        Zone::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Zone::North => "north",
            Zone::South => "south",
            Zone::East => "east",
            Zone::West => "west",
            Zone::Downtown => "downtown",
            Zone::Other => "other",
        }
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Zone {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        Zone::ALL
            .into_iter()
            .find(|z| z.as_str() == lower)
            .ok_or_else(|| format!("unknown zone '{s}' (north, south, east, west, downtown, other)"))
    }
}

/// A persisted service record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ServiceKind,
    pub client_name: String,
    #[serde(default)]
    pub dishwasher_model: String,

    pub service_date: NaiveDate,
    #[serde(with = "hhmm")]
    pub start_time: NaiveTime,
    pub duration_minutes: i32,

    pub zone: Zone,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub notes: String,

    pub status: ServiceStatus,
    pub priority: Priority,
    #[serde(default)]
    pub is_lunch_block: bool,

    #[serde(default)]
    pub rescheduled_from: Option<NaiveDate>,
    #[serde(default)]
    pub rescheduled_reason: Option<String>,
    #[serde(default)]
    pub account_number: Option<String>,
    #[serde(default)]
    pub site_name: Option<String>,
    #[serde(default)]
    pub imported_from: Option<ImportSource>,
}

/// A service record that has not been persisted yet (no id).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewService {
    #[serde(rename = "type")]
    pub kind: ServiceKind,
    pub client_name: String,
    pub dishwasher_model: String,
    pub service_date: NaiveDate,
    #[serde(with = "hhmm")]
    pub start_time: NaiveTime,
    pub duration_minutes: i32,
    pub zone: Zone,
    pub address: String,
    pub notes: String,
    pub status: ServiceStatus,
    pub priority: Priority,
    pub is_lunch_block: bool,
    pub account_number: Option<String>,
    pub site_name: Option<String>,
    pub imported_from: Option<ImportSource>,
}

impl NewService {
    pub fn new(
        client_name: impl Into<String>,
        service_date: NaiveDate,
        start_time: NaiveTime,
        duration_minutes: i32,
    ) -> Self {
        Self {
            kind: ServiceKind::ScheduledMaintenance,
            client_name: client_name.into(),
            dishwasher_model: String::new(),
            service_date,
            start_time,
            duration_minutes,
            zone: Zone::Other,
            address: String::new(),
            notes: String::new(),
            status: ServiceStatus::Scheduled,
            priority: Priority::Normal,
            is_lunch_block: false,
            account_number: None,
            site_name: None,
            imported_from: None,
        }
    }

    pub fn with_kind(mut self, kind: ServiceKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_zone(mut self, zone: Zone) -> Self {
        self.zone = zone;
        self
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = address.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.dishwasher_model = model.into();
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    /// Emergency work: kind and priority both set.
    pub fn emergency(self) -> Self {
        self.with_kind(ServiceKind::Emergency)
            .with_priority(Priority::Emergency)
    }

    pub fn is_emergency(&self) -> bool {
        self.kind == ServiceKind::Emergency || self.priority == Priority::Emergency
    }

    pub fn start_minutes(&self) -> i32 {
        minutes_of(self.start_time)
    }

    pub fn validate(&self) -> Result<()> {
        check_record(
            &self.client_name,
            self.duration_minutes,
            self.is_lunch_block,
            self.kind,
        )
    }

    pub fn into_service(self, id: impl Into<String>) -> Service {
        Service {
            id: id.into(),
            kind: self.kind,
            client_name: self.client_name,
            dishwasher_model: self.dishwasher_model,
            service_date: self.service_date,
            start_time: self.start_time,
            duration_minutes: self.duration_minutes,
            zone: self.zone,
            address: self.address,
            notes: self.notes,
            status: self.status,
            priority: self.priority,
            is_lunch_block: self.is_lunch_block,
            rescheduled_from: None,
            rescheduled_reason: None,
            account_number: self.account_number,
            site_name: self.site_name,
            imported_from: self.imported_from,
        }
    }
}

fn check_record(
    client_name: &str,
    duration_minutes: i32,
    is_lunch_block: bool,
    kind: ServiceKind,
) -> Result<()> {
    if client_name.trim().is_empty() {
        return Err(CoreError::InvalidService(
            "client_name must be non-empty".to_string(),
        ));
    }
    if duration_minutes <= 0 {
        return Err(CoreError::InvalidService(format!(
            "duration_minutes must be positive (got {duration_minutes})"
        )));
    }
    if is_lunch_block && kind != ServiceKind::ScheduledMaintenance {
        return Err(CoreError::InvalidService(
            "a lunch block cannot be emergency or recurring work".to_string(),
        ));
    }
    Ok(())
}

impl Service {
    pub fn new(
        id: impl Into<String>,
        client_name: impl Into<String>,
        service_date: NaiveDate,
        start_time: NaiveTime,
        duration_minutes: i32,
    ) -> Self {
        NewService::new(client_name, service_date, start_time, duration_minutes).into_service(id)
    }

    pub fn with_status(mut self, status: ServiceStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_zone(mut self, zone: Zone) -> Self {
        self.zone = zone;
        self
    }

    pub fn with_kind(mut self, kind: ServiceKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn lunch(mut self) -> Self {
        self.is_lunch_block = true;
        self
    }

    pub fn start_minutes(&self) -> i32 {
        minutes_of(self.start_time)
    }

    pub fn end_minutes(&self) -> i32 {
        self.start_minutes().saturating_add(self.duration_minutes)
    }

    /// Not canceled. Canceled records never occupy time or capacity.
    pub fn is_active(&self) -> bool {
        self.status != ServiceStatus::Canceled
    }

    /// Counts toward the services-per-day ceiling.
    pub fn counts_toward_capacity(&self) -> bool {
        self.is_active() && !self.is_lunch_block
    }

    pub fn is_emergency(&self) -> bool {
        self.kind == ServiceKind::Emergency || self.priority == Priority::Emergency
    }

    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(CoreError::InvalidService("id must be non-empty".to_string()));
        }
        check_record(
            &self.client_name,
            self.duration_minutes,
            self.is_lunch_block,
            self.kind,
        )
    }

    /// scheduled|rescheduled -> in_progress
    pub fn start(&mut self) -> Result<()> {
        if !self.status.is_pending() {
            return Err(CoreError::InvalidTransition {
                action: "start",
                status: self.status,
            });
        }
        self.status = ServiceStatus::InProgress;
        Ok(())
    }

    /// scheduled|rescheduled|in_progress -> completed
    pub fn complete(&mut self) -> Result<()> {
        if self.is_lunch_block {
            return Err(CoreError::LunchBlock {
                action: "marked completed",
            });
        }
        match self.status {
            ServiceStatus::Scheduled | ServiceStatus::Rescheduled | ServiceStatus::InProgress => {
                self.status = ServiceStatus::Completed;
                Ok(())
            }
            status => Err(CoreError::InvalidTransition {
                action: "complete",
                status,
            }),
        }
    }

    /// scheduled|rescheduled|in_progress -> canceled
    pub fn cancel(&mut self) -> Result<()> {
        match self.status {
            ServiceStatus::Scheduled | ServiceStatus::Rescheduled | ServiceStatus::InProgress => {
                self.status = ServiceStatus::Canceled;
                Ok(())
            }
            status => Err(CoreError::InvalidTransition {
                action: "cancel",
                status,
            }),
        }
    }

    /// Normal reschedule: moves the visit and records where it came from.
    pub fn reschedule(
        &mut self,
        new_date: NaiveDate,
        new_time: NaiveTime,
        reason: Option<String>,
    ) -> Result<()> {
        crate::load::validate_reschedule(self)?;
        self.move_to(new_date, new_time, reason);
        self.status = ServiceStatus::Rescheduled;
        Ok(())
    }

    /// Clerical correction of date/time. Reachable on completed records, which
    /// keep their `completed` status; anything else becomes `rescheduled`.
    pub fn correct_schedule(
        &mut self,
        new_date: NaiveDate,
        new_time: NaiveTime,
        reason: Option<String>,
    ) -> Result<()> {
        if self.is_lunch_block {
            return Err(CoreError::LunchBlock {
                action: "rescheduled",
            });
        }
        if self.status == ServiceStatus::Canceled {
            return Err(CoreError::InvalidTransition {
                action: "correct",
                status: self.status,
            });
        }
        self.move_to(new_date, new_time, reason);
        if self.status != ServiceStatus::Completed {
            self.status = ServiceStatus::Rescheduled;
        }
        Ok(())
    }

    fn move_to(&mut self, new_date: NaiveDate, new_time: NaiveTime, reason: Option<String>) {
        self.rescheduled_from = Some(self.service_date);
        self.rescheduled_reason = reason;
        self.service_date = new_date;
        self.start_time = new_time;
    }
}

/// Guard for a reschedule target picked by a person: a weekday, not in the past,
/// not before the visit's current date.
pub fn validate_reschedule_target(
    service: &Service,
    new_date: NaiveDate,
    today: NaiveDate,
) -> Result<()> {
    if !is_weekday(new_date) {
        return Err(CoreError::InvalidReschedule(format!(
            "{new_date} is a weekend; pick a weekday (Monday-Friday)"
        )));
    }
    if new_date < today {
        return Err(CoreError::InvalidReschedule(format!(
            "{new_date} is in the past"
        )));
    }
    if new_date < service.service_date {
        return Err(CoreError::InvalidReschedule(format!(
            "{new_date} is before the original date {}",
            service.service_date
        )));
    }
    Ok(())
}
