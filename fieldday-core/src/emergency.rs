//! Emergency insertion.
//!
//! An emergency visit is booked even when it overlaps existing work. Every
//! displaced service gets its own slot search seeded at the emergency's date;
//! the best suggestion is pre-selected and a person may override or drop it
//! before the plan is applied.
//!
//! Flow (deterministic):
//! 1) collect the emergency's conflicts from the snapshot
//! 2) per conflict, run the slot search with the conflict's duration, zone and
//!    start time, anchored on the emergency date
//! 3) `apply` returns moved copies; the snapshot is never touched
//!
//! Suggestions are computed independently per displaced service, so two of them
//! can be offered the same slot; `select` exists to resolve that by hand.

use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;
use tracing::{info, warn};

use crate::conflict::find_conflicts;
use crate::error::{CoreError, Result};
use crate::load::validate_reschedule;
use crate::service::{NewService, Service};
use crate::suggest::{SlotRequest, SlotRules, SlotSuggestion, suggest_slots_with};
use crate::time::hhmm;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SlotChoice {
    pub date: NaiveDate,
    #[serde(with = "hhmm")]
    pub time: NaiveTime,
}

/// One service the emergency pushes out of the way.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Displacement {
    pub service_id: String,
    pub client_name: String,
    pub suggestions: Vec<SlotSuggestion>,
    pub choice: Option<SlotChoice>,
    /// Whether the person wants this service moved.
    pub selected: bool,
    /// Passes the normal reschedule guard (not a lunch block, still pending).
    pub movable: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmergencyPlan {
    pub emergency: NewService,
    pub displacements: Vec<Displacement>,
}

pub fn plan_emergency(services: &[Service], emergency: &NewService) -> EmergencyPlan {
    plan_emergency_with(services, emergency, &SlotRules::default())
}

pub fn plan_emergency_with(
    services: &[Service],
    emergency: &NewService,
    rules: &SlotRules,
) -> EmergencyPlan {
    let conflicts = find_conflicts(
        services,
        emergency.service_date,
        emergency.start_time,
        emergency.duration_minutes,
        None,
    );

    let displacements: Vec<Displacement> = conflicts
        .into_iter()
        .map(|service| {
            let request = SlotRequest::for_service(service, emergency.service_date);
            let suggestions = suggest_slots_with(services, &request, rules);
            let choice = suggestions.first().map(|s| SlotChoice {
                date: s.date,
                time: s.time,
            });
            Displacement {
                service_id: service.id.clone(),
                client_name: service.client_name.clone(),
                suggestions,
                choice,
                selected: true,
                movable: validate_reschedule(service).is_ok(),
            }
        })
        .collect();

    info!(
        client = %emergency.client_name,
        date = %emergency.service_date,
        displaced = displacements.len(),
        "emergency plan built"
    );

    EmergencyPlan {
        emergency: emergency.clone(),
        displacements,
    }
}

impl EmergencyPlan {
    pub fn has_conflicts(&self) -> bool {
        !self.displacements.is_empty()
    }

    pub fn reason(&self) -> String {
        format!("Rescheduled due to emergency - {}", self.emergency.client_name)
    }

    /// Override the slot for a displaced service (and mark it selected).
    pub fn select(&mut self, service_id: &str, date: NaiveDate, time: NaiveTime) -> Result<()> {
        let d = self.displacement_mut(service_id)?;
        d.choice = Some(SlotChoice { date, time });
        d.selected = true;
        Ok(())
    }

    /// Leave a displaced service where it is.
    pub fn deselect(&mut self, service_id: &str) -> Result<()> {
        self.displacement_mut(service_id)?.selected = false;
        Ok(())
    }

    pub fn select_all(&mut self) {
        for d in &mut self.displacements {
            d.selected = true;
        }
    }

    pub fn deselect_all(&mut self) {
        for d in &mut self.displacements {
            d.selected = false;
        }
    }

    /// Selected services that cannot be moved: no slot chosen, or the service
    /// fails the reschedule guard.
    pub fn unresolved(&self) -> Vec<&Displacement> {
        self.displacements
            .iter()
            .filter(|d| d.selected && (d.choice.is_none() || !d.movable))
            .collect()
    }

    /// Moved copies of every selected, resolvable displaced service.
    pub fn apply(&self, services: &[Service]) -> Vec<Service> {
        let reason = self.reason();
        let mut moved = Vec::new();

        for d in self.displacements.iter().filter(|d| d.selected && d.movable) {
            let Some(choice) = d.choice else {
                continue;
            };
            let Some(original) = services.iter().find(|s| s.id == d.service_id) else {
                warn!(id = %d.service_id, "emergency apply: service missing from snapshot");
                continue;
            };
            let mut service = original.clone();
            match service.reschedule(choice.date, choice.time, Some(reason.clone())) {
                Ok(()) => moved.push(service),
                Err(err) => warn!(id = %d.service_id, %err, "emergency apply: move rejected"),
            }
        }
        moved
    }

    fn displacement_mut(&mut self, service_id: &str) -> Result<&mut Displacement> {
        self.displacements
            .iter_mut()
            .find(|d| d.service_id == service_id)
            .ok_or_else(|| {
                CoreError::InvalidReschedule(format!(
                    "{service_id} is not displaced by this emergency"
                ))
            })
    }
}
