//! Visibility filters over a service snapshot.
//!
//! A regular service is shown when any enabled flag matches it. Lunch blocks
//! answer only to `show_lunch_blocks`.

use serde::{Deserialize, Serialize};

use crate::service::{Service, ServiceKind, ServiceStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceFilter {
    pub show_completed: bool,
    /// Scheduled and in-progress visits.
    pub show_pending: bool,
    pub show_emergencies: bool,
    pub show_rescheduled: bool,
    pub show_recurring: bool,
    pub show_canceled: bool,
    pub show_lunch_blocks: bool,
}

impl Default for ServiceFilter {
    fn default() -> Self {
        Self::all()
    }
}

impl ServiceFilter {
    pub fn all() -> Self {
        Self {
            show_completed: true,
            show_pending: true,
            show_emergencies: true,
            show_rescheduled: true,
            show_recurring: true,
            show_canceled: true,
            show_lunch_blocks: true,
        }
    }

    pub fn none() -> Self {
        Self {
            show_completed: false,
            show_pending: false,
            show_emergencies: false,
            show_rescheduled: false,
            show_recurring: false,
            show_canceled: false,
            show_lunch_blocks: false,
        }
    }

    /// Number of flags switched off.
    pub fn hidden_count(&self) -> usize {
        [
            self.show_completed,
            self.show_pending,
            self.show_emergencies,
            self.show_rescheduled,
            self.show_recurring,
            self.show_canceled,
            self.show_lunch_blocks,
        ]
        .iter()
        .filter(|on| !**on)
        .count()
    }

    /// Switch the flag behind `bucket`.
    pub fn set(&mut self, bucket: StatusBucket, on: bool) {
        let flag = match bucket {
            StatusBucket::Completed => &mut self.show_completed,
            StatusBucket::Pending => &mut self.show_pending,
            StatusBucket::Emergency => &mut self.show_emergencies,
            StatusBucket::Rescheduled => &mut self.show_rescheduled,
            StatusBucket::Recurring => &mut self.show_recurring,
            StatusBucket::Canceled => &mut self.show_canceled,
            StatusBucket::Lunch => &mut self.show_lunch_blocks,
        };
        *flag = on;
    }

    pub fn matches(&self, service: &Service) -> bool {
        if service.is_lunch_block {
            return self.show_lunch_blocks;
        }
        let buckets = [
            (self.show_completed, StatusBucket::Completed),
            (self.show_pending, StatusBucket::Pending),
            (self.show_emergencies, StatusBucket::Emergency),
            (self.show_rescheduled, StatusBucket::Rescheduled),
            (self.show_recurring, StatusBucket::Recurring),
            (self.show_canceled, StatusBucket::Canceled),
        ];
        buckets
            .iter()
            .any(|&(on, bucket)| on && bucket.contains(service))
    }
}

pub fn filter_services<'a>(services: &'a [Service], filter: &ServiceFilter) -> Vec<&'a Service> {
    services.iter().filter(|s| filter.matches(s)).collect()
}

/// Counting buckets. They overlap: an emergency visit that is completed lands
/// in both `Emergency` and `Completed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusBucket {
    Completed,
    Pending,
    Emergency,
    Rescheduled,
    Recurring,
    Canceled,
    Lunch,
}

impl StatusBucket {
    pub const ALL: [StatusBucket; 7] = [
        StatusBucket::Completed,
        StatusBucket::Pending,
        StatusBucket::Emergency,
        StatusBucket::Rescheduled,
        StatusBucket::Recurring,
        StatusBucket::Canceled,
        StatusBucket::Lunch,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            StatusBucket::Completed => "completed",
            StatusBucket::Pending => "pending",
            StatusBucket::Emergency => "emergency",
            StatusBucket::Rescheduled => "rescheduled",
            StatusBucket::Recurring => "recurring",
            StatusBucket::Canceled => "canceled",
            StatusBucket::Lunch => "lunch",
        }
    }

    pub fn contains(self, service: &Service) -> bool {
        match self {
            StatusBucket::Completed => service.status == ServiceStatus::Completed,
            StatusBucket::Pending => matches!(
                service.status,
                ServiceStatus::Scheduled | ServiceStatus::InProgress
            ),
            StatusBucket::Emergency => service.is_emergency(),
            StatusBucket::Rescheduled => service.status == ServiceStatus::Rescheduled,
            StatusBucket::Recurring => service.kind == ServiceKind::Recurring,
            StatusBucket::Canceled => service.status == ServiceStatus::Canceled,
            StatusBucket::Lunch => service.is_lunch_block,
        }
    }
}

pub fn status_count(services: &[Service], bucket: StatusBucket) -> usize {
    services.iter().filter(|s| bucket.contains(s)).count()
}
