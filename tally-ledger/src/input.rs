//! Raw manual-entry input and amount parsing.
//!
//! Manual entries parse amounts strictly. Bulk rows read the leading number
//! and ignore trailing text, so `"12.50 USD"` still counts as 12.5.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Amount as submitted: forms send text, JSON clients may send a number
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AmountInput {
    Number(f64),
    Text(String),
    /// Any other JSON value; always rejected by validation
    Other(serde_json::Value),
}

impl From<f64> for AmountInput {
    fn from(n: f64) -> Self {
        AmountInput::Number(n)
    }
}

impl From<&str> for AmountInput {
    fn from(s: &str) -> Self {
        AmountInput::Text(s.to_string())
    }
}

/// A manual entry before validation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewTransaction {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub amount: Option<AmountInput>,
    #[serde(default)]
    pub date: Option<String>,
}

/// The validated fields of a manual entry, still unclassified
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ValidEntry {
    pub title: Option<String>,
    pub description: String,
    pub amount: f64,
    pub date: NaiveDate,
}

impl NewTransaction {
    pub fn new(
        description: impl Into<String>,
        amount: impl Into<AmountInput>,
        date: impl Into<String>,
    ) -> Self {
        Self {
            title: None,
            description: Some(description.into()),
            amount: Some(amount.into()),
            date: Some(date.into()),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Check required fields, then parse amount and date.
    ///
    /// An empty description is allowed (it classifies as the fallback); an
    /// empty amount or date counts as missing.
    pub(crate) fn validate(self) -> Result<ValidEntry, ValidationError> {
        let amount = self.amount.filter(|a| !matches!(a, AmountInput::Text(s) if s.trim().is_empty()));
        let date = self.date.filter(|d| !d.trim().is_empty());

        let mut missing = Vec::new();
        if self.description.is_none() {
            missing.push("description");
        }
        if amount.is_none() {
            missing.push("amount");
        }
        if date.is_none() {
            missing.push("date");
        }

        let (Some(description), Some(amount), Some(date)) = (self.description, amount, date) else {
            return Err(ValidationError::MissingFields(missing));
        };

        let amount = match amount {
            AmountInput::Number(n) if n.is_finite() => n,
            AmountInput::Number(n) => return Err(ValidationError::InvalidAmount(n.to_string())),
            AmountInput::Text(s) => {
                parse_amount(&s).ok_or_else(|| ValidationError::InvalidAmount(s.clone()))?
            }
            AmountInput::Other(v) => return Err(ValidationError::InvalidAmount(v.to_string())),
        };

        let date = NaiveDate::parse_from_str(date.trim(), DATE_FORMAT)
            .map_err(|_| ValidationError::InvalidDate(date.clone()))?;

        let title = self.title.filter(|t| !t.trim().is_empty());

        Ok(ValidEntry {
            title,
            description,
            amount,
            date,
        })
    }
}

/// Parse a decimal amount, rejecting non-finite values like "NaN" and "inf"
pub fn parse_amount(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Read the longest decimal number at the start of `raw`.
///
/// Leading whitespace is skipped and anything after the number is ignored:
/// `"12.50 USD"` is 12.5 and `"1,200.00"` is 1. Text that does not open with
/// a sign, digit or decimal point (like `"$30"`) gives `None`, as does an
/// overflow to infinity.
pub fn parse_amount_prefix(raw: &str) -> Option<f64> {
    let s = raw.trim_start();
    let bytes = s.as_bytes();
    let digits_from = |start: usize| {
        bytes[start..]
            .iter()
            .take_while(|b| b.is_ascii_digit())
            .count()
    };

    let mut end = usize::from(matches!(bytes.first(), Some(b'+' | b'-')));
    let int_digits = digits_from(end);
    end += int_digits;

    let mut frac_digits = 0;
    if bytes.get(end) == Some(&b'.') {
        frac_digits = digits_from(end + 1);
        if int_digits + frac_digits > 0 {
            end += 1 + frac_digits;
        }
    }
    if int_digits + frac_digits == 0 {
        return None;
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let sign = usize::from(matches!(bytes.get(end + 1), Some(b'+' | b'-')));
        let exp_digits = digits_from(end + 1 + sign);
        if exp_digits > 0 {
            end += 1 + sign + exp_digits;
        }
    }

    s[..end].parse::<f64>().ok().filter(|n| n.is_finite())
}
