use chrono::NaiveDate;
use serde::Deserialize;

/// Model input; the seed travels separately in the run environment.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RunInput {
    pub location: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub log_level: Option<String>,
    #[serde(default = "default_preview_rows")]
    pub preview_rows: usize,
}

fn default_preview_rows() -> usize {
    5
}
