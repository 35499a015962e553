//! Composes one `MonthCursor` and one `Ledger` over one `Store`.
//!
//! This is what a user interface drives. Navigation loads the new month into the ledger first and
//! moves the cursor only once that has worked, so the two never disagree about which month is on
//! screen. A failed load leaves both where they were.

use crate::cursor::{Clock, MonthCursor};
use crate::error::{ErrorType, IntoResult};
use crate::ledger::{
    account_totals, breakdown_by_tag, list_people, person_totals, AccountTotals, Ledger, TagShare,
    Totals,
};
use crate::model::{Amount, MonthKey, TransactionId};
use crate::store::Store;
use crate::Result;
use anyhow::Context;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

pub struct Budget {
    store: Arc<dyn Store>,
    cursor: MonthCursor,
    ledger: Ledger,
}

impl Budget {
    /// Restores the saved month and loads its transactions.
    pub async fn open(store: Arc<dyn Store>, clock: Arc<dyn Clock>) -> Result<Self> {
        let mut cursor = MonthCursor::new(store.clone(), clock);
        let month = cursor.init().await;
        let mut ledger = Ledger::new(store.clone(), month);
        ledger.load(month).await?;
        debug!("Opened the budget at {month}");
        Ok(Self {
            store,
            cursor,
            ledger,
        })
    }

    pub fn cursor(&self) -> &MonthCursor {
        &self.cursor
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn ledger_mut(&mut self) -> &mut Ledger {
        &mut self.ledger
    }

    /// The month whose transactions are loaded.
    pub fn month(&self) -> MonthKey {
        self.ledger.month()
    }

    pub async fn previous_month(&mut self) -> Result<MonthKey> {
        self.show(self.cursor.current().previous()).await
    }

    pub async fn next_month(&mut self) -> Result<MonthKey> {
        self.show(self.cursor.current().next()).await
    }

    pub async fn go_to_current(&mut self) -> Result<MonthKey> {
        self.show(self.cursor.real_month()).await
    }

    pub async fn go_to(&mut self, month: MonthKey) -> Result<MonthKey> {
        self.show(month).await
    }

    /// Every person named in any month, for autocomplete.
    pub async fn people(&self) -> Result<Vec<String>> {
        let buckets = self
            .store
            .all_buckets()
            .await
            .context("Unable to read the stored months")
            .pub_result(ErrorType::Persistence)?;
        Ok(list_people(&buckets))
    }

    /// Copies last month's recurring transactions into the month being viewed.
    pub async fn carry_recurring(&mut self) -> Result<Vec<TransactionId>> {
        let previous = self.ledger.month().previous();
        let transactions = self
            .store
            .get_month_bucket(previous)
            .await
            .with_context(|| format!("Unable to load the transactions for {previous}"))
            .pub_result(ErrorType::Persistence)?;
        self.ledger.carry_recurring(&transactions).await
    }

    /// Totals and breakdowns for the month being viewed. Filters are ignored.
    pub fn summary(&self) -> Summary {
        let transactions = self.ledger.transactions();
        let month = self.ledger.month();
        Summary {
            month,
            display_name: month.display_name(),
            transactions: transactions.len(),
            totals: self.ledger.totals(),
            by_tag: breakdown_by_tag(transactions),
            by_account: account_totals(transactions),
            by_person: person_totals(transactions),
        }
    }

    async fn show(&mut self, month: MonthKey) -> Result<MonthKey> {
        self.ledger.load(month).await?;
        Ok(self.cursor.go_to(month).await)
    }
}

impl std::fmt::Debug for Budget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Budget")
            .field("cursor", &self.cursor)
            .field("ledger", &self.ledger)
            .finish()
    }
}

/// What the dashboard shows for one month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct Summary {
    pub month: MonthKey,
    pub display_name: String,
    pub transactions: usize,
    pub totals: Totals,
    pub by_tag: Vec<TagShare>,
    pub by_account: Vec<AccountTotals>,
    pub by_person: BTreeMap<String, Amount>,
}
