use crate::args::{MonthAction, MonthArgs};
use crate::commands::Out;
use crate::cursor::MonthCursor;
use crate::model::MonthKey;
use crate::{Budget, Result};
use serde::Serialize;

/// The month being viewed after a `budget month` command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct MonthView {
    pub month: MonthKey,
    pub display_name: String,
    pub is_current: bool,
    pub transactions: usize,
}

/// Moves the cursor as requested and reloads the ledger for the new month.
pub async fn month(budget: &mut Budget, args: &MonthArgs) -> Result<Out<MonthView>> {
    let month = match (args.to(), args.action()) {
        (Some(to), _) => budget.go_to(to).await?,
        (None, MonthAction::Show) => budget.month(),
        (None, MonthAction::Previous) => budget.previous_month().await?,
        (None, MonthAction::Next) => budget.next_month().await?,
        (None, MonthAction::Current) => budget.go_to_current().await?,
    };

    let view = MonthView {
        month,
        display_name: MonthCursor::display_name(month),
        is_current: budget.cursor().is_viewing_current_month(),
        transactions: budget.ledger().transactions().len(),
    };
    let message = if view.is_current {
        format!("{} (current month)", view.display_name)
    } else {
        view.display_name.clone()
    };
    Ok(Out::new(message, view))
}
