//! Transaction and category-total types shared by every tally crate

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A classified transaction, as held by the ledger's store
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Transaction {
    /// Optional short label entered alongside the description
    pub title: Option<String>,
    /// Free-text description the category was derived from
    pub description: String,
    /// Spend amount; sign is not validated
    pub amount: f64,
    /// Date of the transaction (YYYY-MM-DD)
    pub date: NaiveDate,
    /// Label assigned by the classifier, never user supplied
    pub category: String,
}

impl Transaction {
    /// Create a new Transaction
    pub fn new(
        title: Option<String>,
        description: impl Into<String>,
        amount: f64,
        date: NaiveDate,
        category: impl Into<String>,
    ) -> Self {
        Self {
            title,
            description: description.into(),
            amount,
            date,
            category: category.into(),
        }
    }
}

/// Per-category sums produced by one bulk ingestion.
///
/// Keyed by label so the serialized form is stable regardless of the order
/// rows arrived in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryTotals(BTreeMap<String, f64>);

impl CategoryTotals {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `amount` to `label`, starting the label at zero on first sight
    pub fn add(&mut self, label: &str, amount: f64) {
        *self.0.entry(label.to_string()).or_insert(0.0) += amount;
    }

    pub fn get(&self, label: &str) -> Option<f64> {
        self.0.get(label).copied()
    }

    pub fn contains(&self, label: &str) -> bool {
        self.0.contains_key(label)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(label, total)| (label.as_str(), *total))
    }

    /// Sum across every category
    pub fn grand_total(&self) -> f64 {
        self.0.values().sum()
    }
}
