//! The storage collaborator. The month cursor and the ledger only ever talk to a `Store`; which
//! backend sits behind it is chosen once, when the `Config` composes the application.

mod json;
mod memory;
mod migrations;
mod sqlite;

use crate::error::Res;
use crate::model::{Buckets, MonthKey, Transaction};
use serde::{Deserialize, Serialize};

pub use json::JsonStore;
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Persists month buckets and the saved cursor for one signed-in user.
///
/// Implementations are scoped to a user when they are constructed, so none of these calls take a
/// user argument.
#[async_trait::async_trait]
pub trait Store: Send + Sync {
    /// Returns the transactions stored for `month`. A month that has never been written is an
    /// empty `Vec`, not an error.
    async fn get_month_bucket(&self, month: MonthKey) -> Res<Vec<Transaction>>;

    /// Replaces the whole bucket for `month` with `transactions`.
    async fn put_month_bucket(&self, month: MonthKey, transactions: &[Transaction]) -> Res<()>;

    /// Returns the saved cursor exactly as stored. It is up to the caller to decide what to do
    /// with a value that does not parse.
    async fn get_saved_cursor(&self) -> Res<Option<String>>;

    async fn put_saved_cursor(&self, month: MonthKey) -> Res<()>;

    /// Returns every stored bucket.
    async fn all_buckets(&self) -> Res<Buckets>;
}

/// The persistent backends that can be selected in `config.json`.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// One JSON document per user in the data directory.
    #[default]
    Json,
    /// A SQLite database shared by every user of the budget home.
    Sqlite,
}

serde_plain::derive_display_from_serialize!(Backend);
serde_plain::derive_fromstr_from_deserialize!(Backend);
