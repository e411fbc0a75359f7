//! Search tool input and result models.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::DateRange;

/// Arguments accepted by the `search-oura-data` tool
#[derive(Debug, Clone, Deserialize)]
pub struct SearchInput {
    /// Case-insensitive substring matched against endpoint display names
    pub query: String,

    #[serde(default)]
    pub start_date: Option<String>,

    #[serde(default)]
    pub end_date: Option<String>,

    /// Bearer token (required in token-in-path mode, ignored otherwise)
    #[serde(default)]
    pub token: Option<String>,
}

impl SearchInput {
    pub fn dates(&self) -> DateRange {
        DateRange::new(self.start_date.clone(), self.end_date.clone())
    }
}

/// One matched endpoint whose upstream call succeeded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResultEntry {
    pub name: String,
    pub data: Value,
}
