use crate::args::DeleteArgs;
use crate::commands::Out;
use crate::model::Transaction;
use crate::{Budget, Result};

/// Deletes one transaction, by id, from the month being viewed.
pub async fn delete(budget: &mut Budget, args: &DeleteArgs) -> Result<Out<Transaction>> {
    let removed = budget.ledger_mut().delete_transaction(args.id()).await?;
    let message = format!(
        "Deleted {} {} from {}",
        removed.merchant(),
        removed.amount(),
        budget.month().display_name()
    );
    Ok(Out::new(message, removed))
}
