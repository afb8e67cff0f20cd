//! Client-roster CSV parser.
//!
//! Expected header (extra columns ignored, order free):
//!   Account Name,Account Number,Address,Customer Site
//!
//! Rows without an account name are dropped.

use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;

use crate::types::ClientRow;

/// Parse a roster file from disk.
pub fn parse_clients_csv(path: impl AsRef<Path>) -> Result<Vec<ClientRow>> {
    let path = path.as_ref();
    let file = std::fs::File::open(path).with_context(|| format!("opening {}", path.display()))?;
    parse_clients_reader(file).with_context(|| format!("parsing {}", path.display()))
}

pub fn parse_clients_reader<R: Read>(reader: R) -> Result<Vec<ClientRow>> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr.headers().context("reading header row")?.clone();
    if !headers.iter().any(|h| h == "Account Name") {
        let found: Vec<&str> = headers.iter().collect();
        anyhow::bail!("missing 'Account Name' column (found: {})", found.join(", "));
    }

    let mut rows = Vec::new();
    for (i, result) in rdr.deserialize::<ClientRow>().enumerate() {
        // header is line 1
        let row = result.with_context(|| format!("row {}", i + 2))?;
        if row.account_name.is_empty() {
            debug!(line = i + 2, "skipping row without account name");
            continue;
        }
        rows.push(row);
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_basic_roster() {
        let text = "\
Account Name,Account Number,Address,Customer Site
Blue Door Diner,10042,12 North Ave,
  Cheesecake Factory #12 , 20017 ,400 Main St, Galleria
,30001,somewhere,
";
        let rows = parse_clients_reader(text.as_bytes()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].account_name, "Blue Door Diner");
        assert_eq!(rows[0].account_number.as_deref(), Some("10042"));
        assert_eq!(rows[0].customer_site, None);
        assert_eq!(rows[1].account_name, "Cheesecake Factory #12");
        assert_eq!(rows[1].customer_site.as_deref(), Some("Galleria"));
    }

    #[test]
    fn test_column_order_and_missing_optional_columns() {
        let text = "Address,Account Name\n9 East Rd,Pier 9\n";
        let rows = parse_clients_reader(text.as_bytes()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].address, "9 East Rd");
        assert_eq!(rows[0].account_number, None);
    }

    #[test]
    fn test_quoted_commas_in_address() {
        let text = "Account Name,Address\n\"Maple Cafe\",\"1 West Loop, Suite 4\"\n";
        let rows = parse_clients_reader(text.as_bytes()).unwrap();
        assert_eq!(rows[0].address, "1 West Loop, Suite 4");
    }

    #[test]
    fn test_missing_account_name_header_is_error() {
        let text = "Name,Address\nPier 9,9 East Rd\n";
        assert!(parse_clients_reader(text.as_bytes()).is_err());
    }

    #[test]
    fn test_header_only_is_empty() {
        let rows = parse_clients_reader("Account Name,Address\n".as_bytes()).unwrap();
        assert!(rows.is_empty());
    }
}
