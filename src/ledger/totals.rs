//! Aggregations over transactions: income/expense totals and the breakdowns shown on the
//! dashboard. Everything here is a pure function of its input.

use crate::model::{Amount, Buckets, Transaction};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Income, expenses and their difference.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct Totals {
    pub total_income: Amount,
    pub total_expenses: Amount,
    pub net: Amount,
}

impl Totals {
    fn add(&mut self, txn: &Transaction) {
        if txn.is_income() {
            self.total_income = self.total_income.saturating_add(txn.amount());
        } else {
            self.total_expenses = self.total_expenses.saturating_add(txn.amount());
        }
        self.net = self.total_income.saturating_sub(self.total_expenses);
    }
}

/// Sums income (tag `income`) and expenses (every other tag). The order of `transactions` does not
/// matter.
pub fn compute_totals<'a>(transactions: impl IntoIterator<Item = &'a Transaction>) -> Totals {
    let mut totals = Totals::default();
    for txn in transactions {
        totals.add(txn);
    }
    totals
}

/// Expense spending for one tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct TagShare {
    pub tag: String,
    pub amount: Amount,
    /// Share of total expenses, in percent, rounded to one decimal place.
    pub percent: Decimal,
}

/// Expense totals per tag with each tag's share of all expenses, largest first. Ties are broken by
/// tag name so the output is stable.
pub fn breakdown_by_tag<'a>(
    transactions: impl IntoIterator<Item = &'a Transaction>,
) -> Vec<TagShare> {
    let mut by_tag: BTreeMap<&str, Amount> = BTreeMap::new();
    for txn in transactions.into_iter().filter(|t| !t.is_income()) {
        let spent = by_tag.entry(txn.tag().as_str()).or_default();
        *spent = spent.saturating_add(txn.amount());
    }
    let total: Amount = by_tag.values().sum();

    let mut shares: Vec<TagShare> = by_tag
        .into_iter()
        .map(|(tag, amount)| TagShare {
            tag: tag.to_string(),
            amount,
            percent: percent_of(amount, total),
        })
        .collect();
    shares.sort_by(|a, b| b.amount.cmp(&a.amount));
    shares
}

/// Zero when `whole` is zero. Dividing first keeps the multiplication in range.
fn percent_of(part: Amount, whole: Amount) -> Decimal {
    part.value()
        .checked_div(whole.value())
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        .map(|percent| percent.round_dp(1))
        .unwrap_or(Decimal::ZERO)
}

/// Money flowing through one account.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct AccountTotals {
    pub account: String,
    #[serde(flatten)]
    pub totals: Totals,
}

/// Totals per account, ordered by account name.
pub fn account_totals<'a>(
    transactions: impl IntoIterator<Item = &'a Transaction>,
) -> Vec<AccountTotals> {
    let mut by_account: BTreeMap<&str, Totals> = BTreeMap::new();
    for txn in transactions {
        by_account.entry(txn.account()).or_default().add(txn);
    }
    by_account
        .into_iter()
        .map(|(account, totals)| AccountTotals {
            account: account.to_string(),
            totals,
        })
        .collect()
}

/// The amount attributed to each person, ordered by name.
///
/// A split transaction attributes each split's amount to that split's person. An unsplit
/// transaction attributes its whole amount to its own person. Amounts with nobody attached are
/// left out.
pub fn person_totals<'a>(
    transactions: impl IntoIterator<Item = &'a Transaction>,
) -> BTreeMap<String, Amount> {
    let mut by_person: BTreeMap<String, Amount> = BTreeMap::new();
    let mut credit = |person: Option<&str>, amount: Amount| {
        if let Some(person) = person.map(str::trim).filter(|p| !p.is_empty()) {
            let total = by_person.entry(person.to_string()).or_default();
            *total = total.saturating_add(amount);
        }
    };
    for txn in transactions {
        if txn.splits().is_empty() {
            credit(txn.person(), txn.amount());
        } else {
            for split in txn.splits() {
                credit(split.person(), split.amount());
            }
        }
    }
    by_person
}

/// Every distinct person named anywhere in `buckets`, on a transaction or on a split, sorted. Used
/// to offer autocomplete suggestions.
pub fn list_people(buckets: &Buckets) -> Vec<String> {
    let people: BTreeSet<&str> = buckets
        .values()
        .flatten()
        .flat_map(Transaction::people)
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();
    people.into_iter().map(str::to_string).collect()
}
