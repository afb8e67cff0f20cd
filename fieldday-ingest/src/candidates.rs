//! Roster rows -> import candidates.
//!
//! Accounts matching a recurring rule become weekly visits on the rule's day and
//! time; everything else gets the default monthly visit count. Zones are
//! guessed from the street address.

use anyhow::{Context, Result};
use chrono::{NaiveTime, Weekday};
use fieldday_core::time::hhmm;
use fieldday_core::{Cadence, ImportCandidate, Zone};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::types::ClientRow;

/// Guess a service zone from an address (case-insensitive substring match).
pub fn detect_zone(address: &str) -> Zone {
    let addr = address.to_lowercase();
    if ["downtown", "main st", "center"].iter().any(|k| addr.contains(k)) {
        return Zone::Downtown;
    }
    [
        ("north", Zone::North),
        ("south", Zone::South),
        ("east", Zone::East),
        ("west", Zone::West),
    ]
    .into_iter()
    .find(|(k, _)| addr.contains(k))
    .map_or(Zone::Other, |(_, zone)| zone)
}

/// Accounts whose name matches `pattern` are visited every week.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecurringRule {
    pub pattern: String,
    pub weekday: Weekday,
    #[serde(with = "hhmm")]
    pub time: NaiveTime,
}

impl RecurringRule {
    pub fn new(pattern: impl Into<String>, weekday: Weekday, time: NaiveTime) -> Self {
        Self {
            pattern: pattern.into(),
            weekday,
            time,
        }
    }

    fn compile(&self) -> Result<Regex> {
        Regex::new(&self.pattern).with_context(|| format!("invalid recurring pattern '{}'", self.pattern))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CandidateDefaults {
    pub duration_minutes: i32,
    pub visits_per_month: u32,
    pub dishwasher_model: String,
    pub recurring: Vec<RecurringRule>,
}

impl Default for CandidateDefaults {
    fn default() -> Self {
        Self {
            duration_minutes: 120,
            visits_per_month: 1,
            dishwasher_model: "Hobart CXL".to_string(),
            recurring: vec![RecurringRule::new(
                "(?i)cheesecake factory",
                Weekday::Wed,
                NaiveTime::from_hms_opt(10, 0, 0).unwrap_or(NaiveTime::MIN),
            )],
        }
    }
}

/// Build one selected candidate per row. The first matching recurring rule wins.
pub fn rows_to_candidates(rows: &[ClientRow], defaults: &CandidateDefaults) -> Result<Vec<ImportCandidate>> {
    let rules: Vec<(Regex, &RecurringRule)> = defaults
        .recurring
        .iter()
        .map(|r| r.compile().map(|re| (re, r)))
        .collect::<Result<_>>()?;

    Ok(rows
        .iter()
        .map(|row| {
            let cadence = rules
                .iter()
                .find(|(re, _)| re.is_match(&row.account_name))
                .map_or(
                    Cadence::Monthly {
                        visits_per_month: defaults.visits_per_month,
                    },
                    |(_, rule)| Cadence::Weekly {
                        weekday: rule.weekday,
                        time: Some(rule.time),
                    },
                );
            ImportCandidate {
                client_name: row.account_name.clone(),
                account_number: row.account_number.clone(),
                address: row.address.clone(),
                site_name: row.customer_site.clone(),
                dishwasher_model: defaults.dishwasher_model.clone(),
                duration_minutes: defaults.duration_minutes,
                zone: detect_zone(&row.address),
                selected: true,
                cadence,
            }
        })
        .collect())
}
