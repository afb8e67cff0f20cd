//! Error taxonomy for the scheduling core.
//!
//! Capacity shortfalls are not errors: they surface as warnings or
//! shortened suggestion lists.

use crate::service::ServiceStatus;

pub type Result<T> = std::result::Result<T, CoreError>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoreError {
    /// Malformed time-of-day string.
    #[error("invalid time of day '{input}': expected HH:MM or HH:MM:SS")]
    Format { input: String },

    /// A status transition the service lifecycle does not allow.
    #[error("cannot {action} a service that is {status}")]
    InvalidTransition {
        action: &'static str,
        status: ServiceStatus,
    },

    /// Lunch blocks never go through this flow.
    #[error("lunch breaks cannot be {action} through this flow")]
    LunchBlock { action: &'static str },

    #[error("invalid lunch move: {0}")]
    LunchMove(String),

    #[error("invalid service: {0}")]
    InvalidService(String),

    #[error("invalid reschedule target: {0}")]
    InvalidReschedule(String),
}

impl CoreError {
    /// Short actionable hint for the person at the keyboard.
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            CoreError::InvalidTransition { status, .. } => match status {
                ServiceStatus::Completed => Some("Create a new service instead"),
                ServiceStatus::InProgress => Some("Complete or cancel the service first"),
                ServiceStatus::Canceled => Some("Create a new service instead"),
                _ => None,
            },
            CoreError::LunchBlock { .. } => {
                Some("Move the lunch break within the same day instead")
            }
            CoreError::Format { .. } => Some("Use 24-hour HH:MM, e.g. 09:30"),
            _ => None,
        }
    }
}
