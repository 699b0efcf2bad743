//! tally-ingest: raw upload rows, the streaming CSV row source and upload staging.

pub mod csv_source;
pub mod types;
pub mod upload;

pub use csv_source::CsvRowSource;
pub use types::{RawRow, SourceError};
pub use upload::{DEFAULT_MAX_UPLOAD_BYTES, UploadArtifact};
