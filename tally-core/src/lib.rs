//! tally-core: transaction types, the category rule table and the keyword classifier

pub mod classifier;
pub mod rules;
pub mod transaction;

pub use classifier::{classify, Classifier};
pub use rules::{CategoryRule, MatchMode, RuleTable, RuleTableError, FALLBACK_CATEGORY};
pub use transaction::{CategoryTotals, Transaction};
