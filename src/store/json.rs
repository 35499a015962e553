//! Implements the `Store` trait with one JSON document per user.
//!
//! This is the "local storage" flavour of persistence: the whole document is read for every call
//! and rewritten for every write, which is fine for a household's worth of transactions.

use crate::error::Res;
use crate::model::{Buckets, MonthKey, Transaction};
use crate::store::Store;
use crate::utils;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::trace;

/// The serialization format of `<data dir>/<user>.json`.
///
/// ```json
/// {
///   "cursor": "2024-03",
///   "buckets": {
///     "2024-03": [
///       { "id": 1709251200000, "merchant": "Rent", "amount": "1200", "account": "Checking",
///         "day": 1, "tag": "housing", "recurring": true }
///     ]
///   }
/// }
/// ```
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
struct Document {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    cursor: Option<String>,
    #[serde(default)]
    buckets: Buckets,
}

/// A `Store` backed by a JSON file.
#[derive(Debug)]
pub struct JsonStore {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process.
    lock: Mutex<()>,
}

impl JsonStore {
    /// Creates a store that reads and writes `path`. The file is created on the first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read(&self) -> Res<Document> {
        trace!("Reading {}", self.path.display());
        Ok(utils::deserialize_opt(&self.path).await?.unwrap_or_default())
    }

    async fn write(&self, doc: &Document) -> Res<()> {
        trace!("Writing {}", self.path.display());
        utils::save_json(&self.path, doc).await
    }
}

#[async_trait::async_trait]
impl Store for JsonStore {
    async fn get_month_bucket(&self, month: MonthKey) -> Res<Vec<Transaction>> {
        let _guard = self.lock.lock().await;
        let mut doc = self.read().await?;
        Ok(doc.buckets.remove(&month).unwrap_or_default())
    }

    async fn put_month_bucket(&self, month: MonthKey, transactions: &[Transaction]) -> Res<()> {
        let _guard = self.lock.lock().await;
        let mut doc = self.read().await?;
        doc.buckets.insert(month, transactions.to_vec());
        self.write(&doc).await
    }

    async fn get_saved_cursor(&self) -> Res<Option<String>> {
        let _guard = self.lock.lock().await;
        Ok(self.read().await?.cursor)
    }

    async fn put_saved_cursor(&self, month: MonthKey) -> Res<()> {
        let _guard = self.lock.lock().await;
        let mut doc = self.read().await?;
        doc.cursor = Some(month.to_string());
        self.write(&doc).await
    }

    async fn all_buckets(&self) -> Res<Buckets> {
        let _guard = self.lock.lock().await;
        Ok(self.read().await?.buckets)
    }
}
