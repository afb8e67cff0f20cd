use serde::{Deserialize, Serialize};

/// One row of a client-roster export, cells trimmed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientRow {
    #[serde(rename = "Account Name", default)]
    pub account_name: String,
    #[serde(rename = "Account Number", default)]
    pub account_number: Option<String>,
    #[serde(rename = "Address", default)]
    pub address: String,
    /// Site label within a multi-location account.
    #[serde(rename = "Customer Site", default)]
    pub customer_site: Option<String>,
}
