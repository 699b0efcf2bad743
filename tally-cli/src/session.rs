//! A process-lifetime session over one aggregator.
//!
//! The one-shot subcommands and the `shell` loop both go through here, so
//! responses have the same JSON shape either way.

use anyhow::{Context, Result, bail};
use serde_json::{Value, json};
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use tally_core::Classifier;
use tally_ingest::UploadArtifact;
use tally_ledger::{Aggregator, NewTransaction};

const HELP: &[&str] = &[
    "add <json>        store one transaction, e.g. add {\"description\":\"coffee\",\"amount\":\"4.5\",\"date\":\"2026-01-31\"}",
    "list              show stored transactions",
    "clear             remove every stored transaction",
    "upload <path>     summarize a CSV with Description and Amount columns",
    "classify <text>   show the category for a description",
    "quit              leave the shell",
];

pub struct Session {
    aggregator: Aggregator,
    uploads_dir: PathBuf,
    max_upload_bytes: u64,
}

impl Session {
    pub fn new(classifier: Classifier, uploads_dir: PathBuf, max_upload_bytes: u64) -> Self {
        Self {
            aggregator: Aggregator::new(classifier),
            uploads_dir,
            max_upload_bytes,
        }
    }

    pub fn classify(&self, description: &str) -> Value {
        json!({ "category": self.aggregator.classifier().classify(description) })
    }

    pub fn add(&mut self, record: NewTransaction) -> Result<Value> {
        let expense = self.aggregator.add_transaction(record)?;
        Ok(json!({ "message": "Expense added successfully", "expense": expense }))
    }

    pub fn list(&self) -> Result<Value> {
        Ok(serde_json::to_value(self.aggregator.list_transactions())?)
    }

    pub fn clear(&mut self) -> Value {
        self.aggregator.clear_all();
        json!({ "message": "Expenses cleared" })
    }

    /// Stage a copy of `path`, summarize it, and drop the copy
    pub fn upload(&self, path: &Path) -> Result<Value> {
        tracing::info!("File upload request received: {}", path.display());
        let artifact = UploadArtifact::stage_path(path, &self.uploads_dir, self.max_upload_bytes)
            .with_context(|| format!("staging {}", path.display()))?;

        let report = self
            .aggregator
            .ingest_upload(artifact)
            .context("Failed to process CSV file")?;

        Ok(json!({
            "message": "CSV processed and summarized",
            "results": report.totals,
            "rows_read": report.rows_read,
            "rows_skipped": report.rows_skipped,
            "amounts_defaulted": report.amounts_defaulted,
        }))
    }

    /// Handle one shell line. `Ok(None)` means quit.
    pub fn dispatch(&mut self, line: &str) -> Result<Option<Value>> {
        let line = line.trim();
        let (cmd, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let rest = rest.trim();

        let response = match cmd {
            "add" => {
                let record: NewTransaction = serde_json::from_str(rest)
                    .context("add expects a JSON object with string fields")?;
                self.add(record)?
            }
            "list" => self.list()?,
            "clear" => self.clear(),
            "upload" => {
                if rest.is_empty() {
                    bail!("No file uploaded");
                }
                self.upload(Path::new(rest))?
            }
            "classify" => self.classify(rest),
            "help" => json!({ "commands": HELP }),
            "quit" | "exit" => return Ok(None),
            other => bail!("unknown command {other:?} (try help)"),
        };

        Ok(Some(response))
    }

    /// Read commands until EOF or `quit`, writing one JSON line per command.
    ///
    /// Command failures are reported inline and do not end the loop.
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, mut output: W) -> Result<()> {
        for line in input.lines() {
            let line = line.context("read command")?;
            if line.trim().is_empty() {
                continue;
            }

            let response = match self.dispatch(&line) {
                Ok(Some(value)) => value,
                Ok(None) => break,
                Err(e) => {
                    tracing::warn!("Command failed: {e:#}");
                    json!({ "error": format!("{e:#}") })
                }
            };

            writeln!(output, "{response}")?;
            output.flush()?;
        }

        Ok(())
    }
}
