//! tally-ledger: the aggregator. Owns the in-memory transaction store, validates
//! manual entries and turns uploaded rows into per-category totals.

pub mod aggregator;
pub mod error;
pub mod input;
pub mod store;

pub use aggregator::{Aggregator, IngestReport};
pub use error::{IngestionError, ValidationError};
pub use input::{AmountInput, NewTransaction};
pub use store::TransactionStore;
