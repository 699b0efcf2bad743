use tally_ingest::SourceError;

/// A manual entry that cannot be stored
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ValidationError {
    /// Every absent required field, in form order
    #[error("missing required field(s): {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    #[error("amount {0:?} is not a number")]
    InvalidAmount(String),

    #[error("date {0:?} is not a valid YYYY-MM-DD date")]
    InvalidDate(String),
}

/// A bulk ingestion that failed as a whole.
///
/// Only raised when the row source breaks; bad individual rows are skipped.
#[derive(Debug, thiserror::Error)]
pub enum IngestionError {
    #[error("failed to process upload: {0}")]
    Source(#[from] SourceError),
}
