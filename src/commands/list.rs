use crate::args::ListArgs;
use crate::commands::{plural, Out};
use crate::ledger::{Filter, Totals};
use crate::model::{MonthKey, Transaction};
use crate::{Budget, Result};
use serde::Serialize;
use std::fmt::Write;

/// The filtered, day-sorted transactions of one month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct Listing {
    pub month: MonthKey,
    pub filter: Filter,
    pub transactions: Vec<Transaction>,
    /// Totals for the whole month, not only the listed rows.
    pub totals: Totals,
}

/// Lists the month's transactions that match the filter, sorted by day.
pub async fn list(budget: &mut Budget, args: &ListArgs) -> Result<Out<Listing>> {
    let ledger = budget.ledger_mut();
    ledger.apply_filters(args.filter());
    let listing = Listing {
        month: ledger.month(),
        filter: ledger.filter().clone(),
        transactions: ledger.sorted().into_iter().cloned().collect(),
        totals: ledger.totals(),
    };
    Ok(Out::new(render(&listing), listing))
}

fn render(listing: &Listing) -> String {
    let mut s = format!(
        "{}: {}",
        listing.month.display_name(),
        plural(
            listing.transactions.len(),
            "transaction",
            "transactions"
        )
    );
    if !listing.filter.is_empty() {
        s.push_str(" (filtered)");
    }
    for t in &listing.transactions {
        let _ = write!(
            s,
            "\n{:>2}  {:<24} {:>12}  {:<14} {:<12} {}",
            t.day(),
            t.merchant(),
            t.amount().to_string(),
            t.tag().as_str(),
            t.account(),
            t.id()
        );
        for split in t.splits() {
            let _ = write!(
                s,
                "\n      {:<22} {:>12}  {}",
                split.category(),
                split.amount().to_string(),
                split.person().unwrap_or_default()
            );
        }
    }
    let totals = &listing.totals;
    let _ = write!(
        s,
        "\nIncome {}  Expenses {}  Net {}",
        totals.total_income, totals.total_expenses, totals.net
    );
    s
}

/// Lists every person named in any month, for autocomplete.
pub async fn people(budget: &Budget) -> Result<Out<Vec<String>>> {
    let people = budget.people().await?;
    let message = if people.is_empty() {
        "Nobody has been named on a transaction yet".to_string()
    } else {
        format!(
            "{}: {}",
            plural(people.len(), "person", "people"),
            people.join(", ")
        )
    };
    Ok(Out::new(message, people))
}
