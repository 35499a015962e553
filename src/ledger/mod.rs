//! The transaction ledger view.
//!
//! A `Ledger` holds the working copy of one month's transactions together with everything derived
//! from it: the filtered view and the month's totals. Every mutation updates the working copy and
//! recomputes the derived state first, then saves the whole month through the `Store`.
//!
//! A failed save does not roll anything back. The ledger stays in its updated state, reports a
//! `Persistence` error, and remembers that it is unsaved (`is_dirty`) until `save` succeeds.

mod filter;
mod splits;
mod totals;

pub use filter::Filter;
pub use splits::{validate_splits, SplitBalance, SplitBuffer, SplitId, SPLIT_TOLERANCE};
pub use totals::{
    account_totals, breakdown_by_tag, compute_totals, list_people, person_totals, AccountTotals,
    TagShare, Totals,
};

use crate::error::{Error, ErrorType, IntoResult, Res};
use crate::model::{Amount, MonthKey, Split, Transaction, TransactionDraft, TransactionId};
use crate::store::Store;
use crate::Result;
use anyhow::{bail, ensure, Context};
use chrono::Utc;
use std::fmt::Debug;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct Ledger {
    store: Arc<dyn Store>,
    month: MonthKey,
    transactions: Vec<Transaction>,
    filter: Filter,
    /// Indexes into `transactions` of the entries that pass `filter`, in order.
    visible: Vec<usize>,
    totals: Totals,
    splits: SplitBuffer,
    dirty: bool,
}

impl Ledger {
    /// Creates an empty ledger for `month`. Nothing is read from the store until `load`.
    pub fn new(store: Arc<dyn Store>, month: MonthKey) -> Self {
        Self {
            store,
            month,
            transactions: Vec::new(),
            filter: Filter::default(),
            visible: Vec::new(),
            totals: Totals::default(),
            splits: SplitBuffer::new(),
            dirty: false,
        }
    }

    /// Replaces the working copy with the stored bucket for `month`. A month with nothing stored
    /// loads as empty. The current filter is kept and re-applied.
    pub async fn load(&mut self, month: MonthKey) -> Result<()> {
        if self.dirty {
            warn!(
                "Discarding unsaved changes to {} while loading {month}",
                self.month
            );
        }
        let transactions = self
            .store
            .get_month_bucket(month)
            .await
            .with_context(|| format!("Unable to load the transactions for {month}"))
            .pub_result(ErrorType::Persistence)?;
        debug!("Loaded {} transactions for {month}", transactions.len());

        self.month = month;
        self.transactions = transactions;
        self.dirty = false;
        self.recompute();
        Ok(())
    }

    /// The month this working copy belongs to.
    pub fn month(&self) -> MonthKey {
        self.month
    }

    /// Every transaction of the month in insertion order.
    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    /// The transactions that pass the current filter, in insertion order.
    pub fn filtered(&self) -> impl Iterator<Item = &Transaction> {
        self.visible.iter().map(move |&ix| &self.transactions[ix])
    }

    /// The filtered transactions in display order: by day, keeping insertion order within a day.
    pub fn sorted(&self) -> Vec<&Transaction> {
        let mut sorted: Vec<&Transaction> = self.filtered().collect();
        sorted.sort_by_key(|t| t.day());
        sorted
    }

    pub fn get(&self, id: TransactionId) -> Option<&Transaction> {
        self.transactions.iter().find(|t| t.id() == id)
    }

    pub fn filter(&self) -> &Filter {
        &self.filter
    }

    /// Totals for the whole month, regardless of the filter.
    pub fn totals(&self) -> Totals {
        self.totals
    }

    /// True when the working copy has changes the store has not accepted.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// The splits being assembled for the next transaction.
    pub fn split_buffer(&self) -> &SplitBuffer {
        &self.splits
    }

    pub fn add_split(&mut self, split: Split) -> SplitId {
        self.splits.add(split)
    }

    pub fn remove_split(&mut self, id: SplitId) -> bool {
        self.splits.remove(id)
    }

    pub fn clear_splits(&mut self) {
        self.splits.clear();
    }

    /// Checks the split buffer against `total`.
    pub fn validate_splits(&self, total: Amount) -> SplitBalance {
        self.splits.validate(total)
    }

    /// Commits `draft` as a new transaction in this month.
    ///
    /// When `draft.split` is set, the split buffer must be non-empty and balance against the
    /// draft's amount; the buffered splits are attached and the buffer is cleared. A rejected draft
    /// changes nothing.
    ///
    /// # Errors
    ///
    /// - `Validation` if the draft or its splits are rejected.
    /// - `Persistence` if the save fails. The transaction has still been added.
    pub async fn add_transaction(&mut self, draft: TransactionDraft) -> Result<TransactionId> {
        let txn = self.build(draft).pub_result(ErrorType::Validation)?;
        let id = txn.id();
        info!(
            "Adding {} {} at {} to {}",
            txn.tag(),
            txn.amount(),
            txn.merchant(),
            self.month
        );
        self.transactions.push(txn);
        self.splits.clear();
        self.recompute();
        self.persist().await?;
        Ok(id)
    }

    /// Removes the transaction with `id`. Identity is always the id, never a position in the
    /// filtered view.
    ///
    /// # Errors
    ///
    /// - `NotFound` if no transaction has `id`. Nothing is changed.
    /// - `Persistence` if the save fails. The transaction has still been removed.
    pub async fn delete_transaction(&mut self, id: TransactionId) -> Result<Transaction> {
        let ix = self
            .transactions
            .iter()
            .position(|t| t.id() == id)
            .with_context(|| format!("Transaction not found: {id} in {}", self.month))
            .pub_result(ErrorType::NotFound)?;
        let removed = self.transactions.remove(ix);
        info!("Deleted transaction {id} ({}) from {}", removed.merchant(), self.month);
        self.recompute();
        self.persist().await?;
        Ok(removed)
    }

    /// Sets the filter and recomputes the filtered view. The transactions themselves are not
    /// touched.
    pub fn apply_filters(&mut self, filter: Filter) {
        self.filter = filter;
        self.recompute();
    }

    /// Copies the recurring transactions of `previous` (normally last month's bucket) into this
    /// month. Each copy gets a new id, and its day is clamped to the length of this month. Entries
    /// that are already here, judged by merchant, amount, tag and account, are skipped, so running
    /// this twice adds nothing the second time.
    pub async fn carry_recurring(&mut self, previous: &[Transaction]) -> Result<Vec<TransactionId>> {
        let last_day = self.month.days_in_month() as u8;
        let mut added = Vec::new();
        for source in previous.iter().filter(|t| t.is_recurring()) {
            if self.transactions.iter().any(|t| same_entry(t, source)) {
                continue;
            }
            let mut copy = source.clone();
            copy.id = self.fresh_id();
            copy.day = source.day().min(last_day);
            added.push(copy.id);
            self.transactions.push(copy);
        }

        if added.is_empty() {
            debug!("No recurring transactions to carry into {}", self.month);
            return Ok(added);
        }
        info!(
            "Carried {} recurring transactions into {}",
            added.len(),
            self.month
        );
        self.recompute();
        self.persist().await?;
        Ok(added)
    }

    /// Writes the working copy to the store. This is how a user retries after a failed save.
    pub async fn save(&mut self) -> Result<()> {
        self.persist().await
    }

    fn build(&self, draft: TransactionDraft) -> Res<Transaction> {
        let merchant = draft.merchant.trim();
        ensure!(!merchant.is_empty(), "A merchant is required");
        ensure!(
            !draft.amount.is_negative(),
            "The amount {} is negative; use the income tag for money coming in",
            draft.amount
        );
        ensure!(
            draft.amount.is_within_limit(),
            "The amount {} is larger than {}",
            draft.amount,
            Amount::LIMIT
        );
        ensure!(!draft.tag.as_str().is_empty(), "A tag is required");
        let last_day = self.month.days_in_month();
        ensure!(
            (1..=last_day).contains(&u32::from(draft.day)),
            "Day {} does not exist in {}",
            draft.day,
            self.month.display_name()
        );

        let splits = if draft.split {
            ensure!(
                !self.splits.is_empty(),
                "Splitting is enabled but no splits have been added"
            );
            if let Some(split) = self.splits.splits().find(|s| s.amount().is_negative()) {
                bail!(
                    "The split for '{}' has a negative amount {}",
                    split.category(),
                    split.amount()
                );
            }
            if let Some(split) = self.splits.splits().find(|s| !s.amount().is_within_limit()) {
                bail!(
                    "The split for '{}' is larger than {}",
                    split.category(),
                    Amount::LIMIT
                );
            }
            match self.splits.validate(draft.amount) {
                SplitBalance::Balanced { .. } => Some(self.splits.splits().cloned().collect()),
                unbalanced => bail!(
                    "The splits do not add up to {}: {unbalanced}",
                    draft.amount
                ),
            }
        } else {
            None
        };

        Ok(Transaction {
            id: self.fresh_id(),
            merchant: merchant.to_string(),
            amount: draft.amount,
            account: draft.account.trim().to_string(),
            day: draft.day,
            tag: draft.tag,
            person: draft.person,
            recurring: draft.recurring,
            splits,
        })
    }

    /// The current time in milliseconds, bumped past any id already in this month.
    fn fresh_id(&self) -> TransactionId {
        let now = Utc::now().timestamp_millis();
        match self.transactions.iter().map(|t| t.id().value()).max() {
            Some(max) if max >= now => TransactionId::new(max.saturating_add(1)),
            _ => TransactionId::new(now),
        }
    }

    fn recompute(&mut self) {
        self.totals = compute_totals(&self.transactions);
        self.visible = self
            .transactions
            .iter()
            .enumerate()
            .filter(|(_, t)| self.filter.matches(t))
            .map(|(ix, _)| ix)
            .collect();
    }

    async fn persist(&mut self) -> Result<()> {
        self.dirty = true;
        match self
            .store
            .put_month_bucket(self.month, &self.transactions)
            .await
        {
            Ok(()) => {
                self.dirty = false;
                debug!(
                    "Saved {} transactions for {}",
                    self.transactions.len(),
                    self.month
                );
                Ok(())
            }
            Err(e) => {
                warn!(
                    "Unable to save {}, the changes are kept in memory until the next save: {e:#}",
                    self.month
                );
                Err(Error::new(
                    ErrorType::Persistence,
                    e.context(format!("Unable to save the transactions for {}", self.month)),
                ))
            }
        }
    }
}

fn same_entry(a: &Transaction, b: &Transaction) -> bool {
    a.merchant() == b.merchant()
        && a.amount() == b.amount()
        && a.tag() == b.tag()
        && a.account() == b.account()
}

impl Debug for Ledger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ledger")
            .field("month", &self.month)
            .field("transactions", &self.transactions.len())
            .field("filter", &self.filter)
            .field("dirty", &self.dirty)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Buckets, Tag};
    use crate::store::MemoryStore;
    use std::collections::HashSet;
    use std::str::FromStr;

    fn month(s: &str) -> MonthKey {
        MonthKey::from_str(s).unwrap()
    }

    fn amt(s: &str) -> Amount {
        Amount::from_str(s).unwrap()
    }

    async fn ledger_for(store: &Arc<MemoryStore>, m: &str) -> Ledger {
        let mut ledger = Ledger::new(store.clone(), month(m));
        ledger.load(month(m)).await.unwrap();
        ledger
    }

    fn rent() -> TransactionDraft {
        TransactionDraft::new("Rent", 1200, "Checking", 1, "expense")
    }

    fn paycheck() -> TransactionDraft {
        TransactionDraft::new("Paycheck", 3000, "Checking", 15, "income")
    }

    #[tokio::test]
    async fn test_rent_and_paycheck_totals() {
        let store = Arc::new(MemoryStore::new());
        let mut ledger = ledger_for(&store, "2024-03").await;

        ledger.add_transaction(rent()).await.unwrap();
        ledger.add_transaction(paycheck()).await.unwrap();

        let totals = ledger.totals();
        assert_eq!(totals.total_income, amt("3000"));
        assert_eq!(totals.total_expenses, amt("1200"));
        assert_eq!(totals.net, amt("1800"));
        assert_eq!(totals, compute_totals(ledger.transactions()));

        let stored = store.get_month_bucket(month("2024-03")).await.unwrap();
        assert_eq!(stored.len(), 2);
        assert!(!ledger.is_dirty());
    }

    #[tokio::test]
    async fn test_balanced_splits_are_attached_and_buffer_cleared() {
        let store = Arc::new(MemoryStore::new());
        let mut ledger = ledger_for(&store, "2024-03").await;
        for person in ["Ana", "Ben", "Cy"] {
            ledger.add_split(Split::new("dining", 30).with_person(person));
        }
        assert!(ledger.validate_splits(amt("90")).is_balanced());

        let draft = TransactionDraft::new("Dinner", 90, "Card", 9, "dining").split(true);
        let id = ledger.add_transaction(draft).await.unwrap();

        let txn = ledger.get(id).unwrap();
        assert_eq!(txn.splits().len(), 3);
        assert_eq!(txn.splits()[1].person(), Some("Ben"));
        assert!(ledger.split_buffer().is_empty());
    }

    #[tokio::test]
    async fn test_unbalanced_splits_reject_without_mutation() {
        let store = Arc::new(MemoryStore::new());
        let mut ledger = ledger_for(&store, "2024-03").await;
        ledger.add_split(Split::new("dining", 30));
        ledger.add_split(Split::new("dining", 30));
        ledger.add_split(Split::new("dining", 29));
        assert_eq!(
            ledger.validate_splits(amt("90")),
            SplitBalance::Unbalanced {
                remaining: amt("1.00")
            }
        );

        let draft = TransactionDraft::new("Dinner", 90, "Card", 9, "dining").split(true);
        let err = ledger.add_transaction(draft).await.unwrap_err();
        assert!(err.is(ErrorType::Validation));
        assert!(err.to_string().contains("$1.00 remains"));

        assert!(ledger.transactions().is_empty());
        assert_eq!(ledger.split_buffer().len(), 3);
        assert!(store.all_buckets().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_split_enabled_with_empty_buffer_is_rejected() {
        let store = Arc::new(MemoryStore::new());
        let mut ledger = ledger_for(&store, "2024-03").await;
        let draft = TransactionDraft::new("Dinner", 90, "Card", 9, "dining").split(true);
        let err = ledger.add_transaction(draft).await.unwrap_err();
        assert!(err.is(ErrorType::Validation));
    }

    #[tokio::test]
    async fn test_splits_ignored_when_splitting_disabled() {
        let store = Arc::new(MemoryStore::new());
        let mut ledger = ledger_for(&store, "2024-03").await;
        ledger.add_split(Split::new("dining", 5));
        let id = ledger
            .add_transaction(TransactionDraft::new("Dinner", 90, "Card", 9, "dining"))
            .await
            .unwrap();
        assert!(ledger.get(id).unwrap().splits().is_empty());
    }

    #[tokio::test]
    async fn test_draft_validation() {
        let store = Arc::new(MemoryStore::new());
        let mut ledger = ledger_for(&store, "2023-02").await;
        let bad = [
            TransactionDraft::new("Rent", 10, "Checking", 29, "rent"),
            TransactionDraft::new("Rent", 10, "Checking", 0, "rent"),
            TransactionDraft::new("  ", 10, "Checking", 1, "rent"),
            TransactionDraft::new("Rent", -10, "Checking", 1, "rent"),
            TransactionDraft::new("Rent", 10, "Checking", 1, ""),
        ];
        for draft in bad {
            let err = ledger.add_transaction(draft.clone()).await.unwrap_err();
            assert!(err.is(ErrorType::Validation), "accepted {draft:?}");
        }
        assert!(ledger.transactions().is_empty());
        ledger
            .add_transaction(TransactionDraft::new("Rent", 10, "Checking", 28, "rent"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_amount_beyond_limit_is_rejected() {
        use rust_decimal::Decimal;

        let store = Arc::new(MemoryStore::new());
        let mut ledger = ledger_for(&store, "2024-03").await;
        let huge = Amount::new(Decimal::MAX);
        for _ in 0..2 {
            let draft = TransactionDraft::new("Yacht", huge, "Card", 1, "fun");
            let err = ledger.add_transaction(draft).await.unwrap_err();
            assert!(err.is(ErrorType::Validation));
        }
        assert!(ledger.transactions().is_empty());

        ledger.add_split(Split::new("fun", huge));
        let draft = TransactionDraft::new("Yacht", 10, "Card", 1, "fun").split(true);
        let err = ledger.add_transaction(draft).await.unwrap_err();
        assert!(err.is(ErrorType::Validation));
        assert_eq!(ledger.totals(), Totals::default());

        ledger.clear_splits();
        ledger
            .add_transaction(TransactionDraft::new("House", Amount::LIMIT, "Card", 1, "home"))
            .await
            .unwrap();
        assert_eq!(ledger.totals().total_expenses, Amount::LIMIT);
    }

    #[tokio::test]
    async fn test_delete_from_filtered_view_removes_only_that_id() {
        let store = Arc::new(MemoryStore::new());
        let mut ledger = ledger_for(&store, "2024-03").await;
        let a = ledger
            .add_transaction(TransactionDraft::new("Cafe", 4, "Card", 2, "dining"))
            .await
            .unwrap();
        let b = ledger.add_transaction(rent()).await.unwrap();
        let c = ledger
            .add_transaction(TransactionDraft::new("Cafe Two", 6, "Card", 3, "dining"))
            .await
            .unwrap();
        let d = ledger.add_transaction(paycheck()).await.unwrap();

        ledger.apply_filters(Filter {
            tag: Some("dining".to_string()),
            ..Default::default()
        });
        let visible: Vec<TransactionId> = ledger.filtered().map(|t| t.id()).collect();
        assert_eq!(visible, vec![a, c]);

        // position 1 of the filtered view is the second row of the whole month
        let target = visible[1];
        let removed = ledger.delete_transaction(target).await.unwrap();
        assert_eq!(removed.id(), c);

        let remaining: Vec<TransactionId> = ledger.transactions().iter().map(|t| t.id()).collect();
        assert_eq!(remaining, vec![a, b, d]);
        let visible: Vec<TransactionId> = ledger.filtered().map(|t| t.id()).collect();
        assert_eq!(visible, vec![a]);
        assert_eq!(store.get_month_bucket(month("2024-03")).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_delete_missing_id_is_not_found() {
        let store = Arc::new(MemoryStore::new());
        let mut ledger = ledger_for(&store, "2024-03").await;
        ledger.add_transaction(rent()).await.unwrap();
        let err = ledger
            .delete_transaction(TransactionId::new(42))
            .await
            .unwrap_err();
        assert!(err.is(ErrorType::NotFound));
        assert!(err.to_string().contains("Transaction not found"));
        assert_eq!(ledger.transactions().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_filter_keeps_everything_in_order() {
        let store = Arc::new(MemoryStore::new());
        let mut ledger = ledger_for(&store, "2024-03").await;
        ledger.add_transaction(paycheck()).await.unwrap();
        ledger.add_transaction(rent()).await.unwrap();
        let before = ledger.transactions().to_vec();

        ledger.apply_filters(Filter {
            search: Some("zzz".to_string()),
            ..Default::default()
        });
        assert_eq!(ledger.filtered().count(), 0);
        assert_eq!(ledger.transactions(), before.as_slice());

        ledger.apply_filters(Filter::default());
        let filtered: Vec<Transaction> = ledger.filtered().cloned().collect();
        assert_eq!(filtered, before);
    }

    #[tokio::test]
    async fn test_sorted_by_day_is_stable() {
        let store = Arc::new(MemoryStore::new());
        let mut ledger = ledger_for(&store, "2024-03").await;
        let late = ledger.add_transaction(paycheck()).await.unwrap();
        let first = ledger
            .add_transaction(TransactionDraft::new("Bakery", 3, "Cash", 5, "food"))
            .await
            .unwrap();
        let early = ledger.add_transaction(rent()).await.unwrap();
        let second = ledger
            .add_transaction(TransactionDraft::new("Butcher", 9, "Cash", 5, "food"))
            .await
            .unwrap();

        let order: Vec<TransactionId> = ledger.sorted().iter().map(|t| t.id()).collect();
        assert_eq!(order, vec![early, first, second, late]);
    }

    #[tokio::test]
    async fn test_ids_are_unique() {
        let store = Arc::new(MemoryStore::new());
        let mut ledger = ledger_for(&store, "2024-03").await;
        let mut ids = HashSet::new();
        for _ in 0..20 {
            ids.insert(ledger.add_transaction(rent()).await.unwrap());
        }
        assert_eq!(ids.len(), 20);
    }

    #[tokio::test]
    async fn test_failed_save_keeps_state_until_retry() {
        let store = Arc::new(MemoryStore::new());
        let mut ledger = ledger_for(&store, "2024-03").await;
        store.set_fail_writes(true);

        let err = ledger.add_transaction(rent()).await.unwrap_err();
        assert!(err.is(ErrorType::Persistence));
        assert_eq!(ledger.transactions().len(), 1);
        assert_eq!(ledger.totals().total_expenses, amt("1200"));
        assert!(ledger.is_dirty());
        assert!(store.all_buckets().await.unwrap().is_empty());

        assert!(ledger.save().await.is_err());
        store.set_fail_writes(false);
        ledger.save().await.unwrap();
        assert!(!ledger.is_dirty());
        assert_eq!(store.get_month_bucket(month("2024-03")).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_load_replaces_working_copy() {
        let mut buckets = Buckets::new();
        buckets.insert(
            month("2024-02"),
            vec![Transaction {
                id: TransactionId::new(1),
                merchant: "Gym".to_string(),
                amount: amt("40"),
                day: 3,
                tag: Tag::new("health"),
                ..Default::default()
            }],
        );
        let store = Arc::new(MemoryStore::with_data(buckets, None));
        let mut ledger = ledger_for(&store, "2024-03").await;
        ledger.add_transaction(rent()).await.unwrap();

        ledger.load(month("2024-02")).await.unwrap();
        assert_eq!(ledger.month(), month("2024-02"));
        assert_eq!(ledger.transactions().len(), 1);
        assert_eq!(ledger.transactions()[0].merchant(), "Gym");
        assert_eq!(ledger.totals().total_expenses, amt("40"));

        ledger.load(month("2019-07")).await.unwrap();
        assert!(ledger.transactions().is_empty());
        assert_eq!(ledger.totals(), Totals::default());
    }

    #[tokio::test]
    async fn test_carry_recurring() {
        let store = Arc::new(MemoryStore::new());
        let mut january = ledger_for(&store, "2024-01").await;
        january
            .add_transaction(
                TransactionDraft::new("Storage Unit", 80, "Card", 31, "storage").recurring(true),
            )
            .await
            .unwrap();
        january.add_transaction(rent().recurring(true)).await.unwrap();
        january
            .add_transaction(TransactionDraft::new("Concert", 60, "Card", 12, "fun"))
            .await
            .unwrap();
        let previous = january.transactions().to_vec();

        let mut february = ledger_for(&store, "2024-02").await;
        let added = february.carry_recurring(&previous).await.unwrap();
        assert_eq!(added.len(), 2);
        let storage = february
            .transactions()
            .iter()
            .find(|t| t.merchant() == "Storage Unit")
            .unwrap();
        assert_eq!(storage.day(), 29);
        assert!(storage.is_recurring());
        assert!(previous.iter().all(|t| t.id() != storage.id()));

        let again = february.carry_recurring(&previous).await.unwrap();
        assert!(again.is_empty());
        assert_eq!(
            store.get_month_bucket(month("2024-02")).await.unwrap().len(),
            2
        );
    }
}
