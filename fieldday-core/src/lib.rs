//! fieldday-core: scheduling engine for a single field-service technician.
//!
//! Pure functions over an immutable snapshot of `Service` records. Nothing in
//! here performs I/O or reads the wall clock.

pub mod conflict;
pub mod distribute;
pub mod emergency;
pub mod end_of_day;
pub mod error;
pub mod filter;
pub mod load;
pub mod lunch;
pub mod service;
pub mod settings;
pub mod suggest;
pub mod time;

pub use conflict::{Admission, admit, find_conflicts};
pub use distribute::{
    Cadence, Distribution, DistributionSummary, ImportCandidate, distribute, distribute_onto,
};
pub use emergency::{Displacement, EmergencyPlan, SlotChoice, plan_emergency, plan_emergency_with};
pub use end_of_day::{
    AlertLedger, Clock, EndOfDayAlert, FixedClock, MemoryLedger, daily_completion_rate,
    pending_services,
};
pub use error::{CoreError, Result};
pub use filter::{ServiceFilter, StatusBucket, filter_services, status_count};
pub use load::{
    DayLoad, MonthlyCompletion, ServiceActions, WeekLoad, actions_for, daily_hours,
    daily_service_count, day_load, monthly_completion, validate_reschedule, week_load,
    weekly_hours, weekly_service_count,
};
pub use lunch::{
    LunchConflict, LunchSuggestion, best_lunch_time, default_lunch_break, lunch_conflicts,
    move_lunch, should_auto_create_lunch, suggest_lunch_times, validate_lunch_move,
};
pub use service::{
    ImportSource, NewService, Priority, Service, ServiceKind, ServiceStatus, Zone,
    validate_reschedule_target,
};
pub use settings::Settings;
pub use suggest::{
    SlotCategory, SlotRequest, SlotRules, SlotSuggestion, suggest_slots, suggest_slots_with,
};
pub use time::{
    format_time, intervals_overlap, is_weekday, minutes_to_time, month_range, parse_time_of_day,
    time_to_minutes, week_range, weeks_of_month, work_days_of_month,
};
