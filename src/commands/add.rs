//! Commands that add transactions to the month being viewed.

use crate::args::AddArgs;
use crate::commands::{plural, Out};
use crate::model::{Transaction, TransactionId};
use crate::{Budget, Result};

/// Adds one transaction. Any `--split` values are loaded into the split buffer first, which turns
/// splitting on for this transaction; they must balance against the amount.
pub async fn add(budget: &mut Budget, args: &AddArgs) -> Result<Out<Transaction>> {
    let ledger = budget.ledger_mut();
    ledger.clear_splits();
    for split in args.splits() {
        ledger.add_split(split.clone());
    }

    let id = ledger.add_transaction(args.draft()).await?;
    let month = ledger.month();
    let message = format!("Added transaction {id} to {}", month.display_name());
    match ledger.get(id) {
        Some(txn) => Ok(Out::new(message, txn.clone())),
        None => Ok(message.into()),
    }
}

/// Copies last month's recurring transactions into the month being viewed.
pub async fn carry(budget: &mut Budget) -> Result<Out<Vec<TransactionId>>> {
    let added = budget.carry_recurring().await?;
    let message = format!(
        "Carried {} into {}",
        plural(added.len(), "recurring transaction", "recurring transactions"),
        budget.month().display_name()
    );
    Ok(Out::new(message, added))
}
