//! Implements the `Store` trait using in-memory data.
//!
//! Note: this is compiled in the production build too, so that the ledger can be driven end to end
//! without touching the file system.

use crate::error::Res;
use crate::model::{Buckets, MonthKey, Transaction};
use crate::store::Store;
use anyhow::bail;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;

#[derive(Debug, Default)]
struct State {
    cursor: Option<String>,
    buckets: Buckets,
}

/// A `Store` that holds everything in memory. It can be told to fail reads or writes, which is how
/// the persistence-failure behaviour of the ledger is exercised.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store seeded with `buckets` and a raw saved cursor.
    pub fn with_data(buckets: Buckets, cursor: Option<&str>) -> Self {
        Self {
            state: Mutex::new(State {
                cursor: cursor.map(str::to_string),
                buckets,
            }),
            ..Self::default()
        }
    }

    /// While `fail` is true every read returns an error.
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// While `fail` is true every write returns an error and leaves the stored data untouched.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check_readable(&self) -> Res<()> {
        if self.fail_reads.load(Ordering::SeqCst) {
            bail!("The in-memory store is refusing reads");
        }
        Ok(())
    }

    fn check_writable(&self) -> Res<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            bail!("The in-memory store is refusing writes");
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl Store for MemoryStore {
    async fn get_month_bucket(&self, month: MonthKey) -> Res<Vec<Transaction>> {
        self.check_readable()?;
        let state = self.state.lock().await;
        Ok(state.buckets.get(&month).cloned().unwrap_or_default())
    }

    async fn put_month_bucket(&self, month: MonthKey, transactions: &[Transaction]) -> Res<()> {
        self.check_writable()?;
        let mut state = self.state.lock().await;
        state.buckets.insert(month, transactions.to_vec());
        Ok(())
    }

    async fn get_saved_cursor(&self) -> Res<Option<String>> {
        self.check_readable()?;
        Ok(self.state.lock().await.cursor.clone())
    }

    async fn put_saved_cursor(&self, month: MonthKey) -> Res<()> {
        self.check_writable()?;
        self.state.lock().await.cursor = Some(month.to_string());
        Ok(())
    }

    async fn all_buckets(&self) -> Res<Buckets> {
        self.check_readable()?;
        Ok(self.state.lock().await.buckets.clone())
    }
}
