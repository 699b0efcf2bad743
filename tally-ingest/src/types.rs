use serde::{Deserialize, Serialize};

/// Failure of the row source itself, as opposed to a single bad row
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("could not read upload: {0}")]
    Io(#[from] std::io::Error),

    #[error("could not decode CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("upload exceeds the {limit} byte limit")]
    TooLarge { limit: u64 },

    /// For row sources that are not backed by a file or CSV reader
    #[error("row source failed: {0}")]
    Other(String),
}

/// One uploaded row before validation.
///
/// Fields are matched by header name; every other column is ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRow {
    #[serde(rename = "Description", default)]
    pub description: Option<String>,
    #[serde(rename = "Amount", default)]
    pub amount: Option<String>,
}

impl RawRow {
    pub fn new(description: impl Into<String>, amount: impl Into<String>) -> Self {
        Self {
            description: Some(description.into()),
            amount: Some(amount.into()),
        }
    }

    /// Description, treating an empty field as absent
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref().filter(|s| !s.is_empty())
    }

    /// Raw amount text, treating an empty field as absent
    pub fn amount(&self) -> Option<&str> {
        self.amount.as_deref().filter(|s| !s.is_empty())
    }
}
