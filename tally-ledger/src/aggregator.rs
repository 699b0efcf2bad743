//! Aggregator: classifies manual entries into the store and folds uploaded
//! rows into per-category totals.

use std::io;

use serde::Serialize;
use tally_core::{CategoryTotals, Classifier, Transaction};
use tally_ingest::{RawRow, SourceError, UploadArtifact};

use crate::error::{IngestionError, ValidationError};
use crate::input::{NewTransaction, parse_amount_prefix};
use crate::store::TransactionStore;

/// Outcome of one bulk ingestion
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IngestReport {
    pub totals: CategoryTotals,
    /// Rows pulled from the source, skipped ones included
    pub rows_read: usize,
    /// Rows without a Description or Amount
    pub rows_skipped: usize,
    /// Rows whose amount had no leading number and was counted as zero
    pub amounts_defaulted: usize,
}

impl IngestReport {
    pub fn rows_counted(&self) -> usize {
        self.rows_read - self.rows_skipped
    }
}

#[derive(Debug, Clone, Default)]
pub struct Aggregator {
    classifier: Classifier,
    store: TransactionStore,
}

impl Aggregator {
    pub fn new(classifier: Classifier) -> Self {
        Self {
            classifier,
            store: TransactionStore::new(),
        }
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    /// Validate, classify and store one manual entry
    pub fn add_transaction(&mut self, record: NewTransaction) -> Result<Transaction, ValidationError> {
        let entry = record.validate()?;
        let category = self.classifier.classify(entry.description.as_str());
        tracing::debug!("Classified {:?} as {category}", entry.description);

        let txn = Transaction::new(entry.title, entry.description, entry.amount, entry.date, category);
        self.store.push(txn.clone());
        Ok(txn)
    }

    /// Stored transactions in insertion order
    pub fn list_transactions(&self) -> Vec<Transaction> {
        self.store.list()
    }

    /// Empty the store. Safe to repeat.
    pub fn clear_all(&mut self) {
        let dropped = self.store.len();
        self.store.clear();
        tracing::info!("Cleared {dropped} transactions");
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Fold a row stream into per-category totals.
    ///
    /// Rows are pulled one at a time. A row missing Description or Amount is
    /// skipped. Only the leading number of an amount is read, and an amount
    /// with no leading number counts as zero. If the source itself fails, the
    /// totals gathered so far are dropped and the error is returned. Nothing
    /// is added to the store.
    pub fn ingest<I>(&self, rows: I) -> Result<IngestReport, IngestionError>
    where
        I: IntoIterator<Item = Result<RawRow, SourceError>>,
    {
        let mut report = IngestReport::default();

        for row in rows {
            let row = row?;
            report.rows_read += 1;
            let line = report.rows_read;

            let (Some(description), Some(raw_amount)) = (row.description(), row.amount()) else {
                report.rows_skipped += 1;
                tracing::warn!("Skipping row {line}: missing Description or Amount ({row:?})");
                continue;
            };

            let category = self.classifier.classify(description);
            let amount = match parse_amount_prefix(raw_amount) {
                Some(amount) => amount,
                None => {
                    report.amounts_defaulted += 1;
                    tracing::warn!("Row {line}: amount {raw_amount:?} is not a number, counting as 0");
                    0.0
                }
            };

            report.totals.add(category, amount);
        }

        tracing::info!(
            "Processed {} rows into {} categories totalling {:.2} ({} skipped, {} amounts defaulted)",
            report.rows_read,
            report.totals.len(),
            report.totals.grand_total(),
            report.rows_skipped,
            report.amounts_defaulted
        );

        Ok(report)
    }

    /// Ingest a staged upload, then release it whether or not ingestion
    /// succeeded.
    ///
    /// A failed release is logged but does not discard the totals.
    pub fn ingest_upload(&self, artifact: UploadArtifact) -> Result<IngestReport, IngestionError> {
        let name = artifact.original_name().to_string();
        let rows = artifact.rows();
        self.ingest_then_release(&name, rows, || artifact.release())
    }

    fn ingest_then_release<I>(
        &self,
        name: &str,
        rows: Result<I, SourceError>,
        release: impl FnOnce() -> io::Result<()>,
    ) -> Result<IngestReport, IngestionError>
    where
        I: IntoIterator<Item = Result<RawRow, SourceError>>,
    {
        let result = rows
            .map_err(IngestionError::from)
            .and_then(|rows| self.ingest(rows));

        if let Err(e) = &result {
            tracing::error!("CSV file processing error for {name:?}: {e}");
        }

        if let Err(e) = release() {
            tracing::error!("Could not remove staged upload {name:?}: {e}");
        }

        result
    }
}
