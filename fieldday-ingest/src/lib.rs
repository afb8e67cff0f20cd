//! fieldday-ingest: client-roster ingestion (CSV) and conversion into import candidates.

pub mod candidates;
pub mod parsers;
pub mod types;

pub use candidates::{CandidateDefaults, RecurringRule, detect_zone, rows_to_candidates};
pub use parsers::client_csv::{parse_clients_csv, parse_clients_reader};
pub use types::ClientRow;
