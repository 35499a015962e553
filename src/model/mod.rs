//! Types that represent the core data model, such as `MonthKey`, `Transaction` and `Split`.
mod amount;
mod month;
mod transaction;

pub use amount::{Amount, AmountError};
pub use month::{MonthKey, MonthKeyError};
pub use transaction::{Split, Tag, Transaction, TransactionDraft, TransactionId, INCOME};

use std::collections::BTreeMap;

/// Every persisted month bucket for one user, keyed by month.
pub type Buckets = BTreeMap<MonthKey, Vec<Transaction>>;
