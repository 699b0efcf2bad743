//! Streaming CSV row source.
//!
//! Rows are decoded one record at a time as the caller pulls them, so memory
//! stays flat regardless of file size. Expected header (any column order,
//! extra columns ignored):
//! Date,Description,Amount

use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::types::{RawRow, SourceError};

pub struct CsvRowSource<R: Read> {
    records: csv::DeserializeRecordsIntoIter<R, RawRow>,
}

impl<R: Read> CsvRowSource<R> {
    /// Wrap any reader. Short rows are tolerated; their missing fields read
    /// as absent.
    pub fn from_reader(rdr: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::Headers)
            .from_reader(rdr);

        Self {
            records: reader.into_deserialize(),
        }
    }
}

impl CsvRowSource<File> {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, SourceError> {
        let file = File::open(path.as_ref())?;
        Ok(Self::from_reader(file))
    }
}

impl<R: Read> Iterator for CsvRowSource<R> {
    type Item = Result<RawRow, SourceError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.records
            .next()
            .map(|record| record.map_err(SourceError::from))
    }
}
