use crate::budget::Summary;
use crate::commands::Out;
use crate::{Budget, Result};
use std::fmt::Write;

/// Totals and breakdowns for the month being viewed.
pub async fn summary(budget: &Budget) -> Result<Out<Summary>> {
    let summary = budget.summary();
    Ok(Out::new(render(&summary), summary))
}

fn render(summary: &Summary) -> String {
    let totals = &summary.totals;
    let mut s = format!(
        "{}\nIncome   {:>14}\nExpenses {:>14}\nNet      {:>14}",
        summary.display_name,
        totals.total_income.to_string(),
        totals.total_expenses.to_string(),
        totals.net.to_string()
    );
    if !summary.by_tag.is_empty() {
        s.push_str("\n\nSpending by tag");
        for share in &summary.by_tag {
            let _ = write!(
                s,
                "\n  {:<16} {:>12} {:>6}%",
                share.tag,
                share.amount.to_string(),
                share.percent.to_string()
            );
        }
    }
    if !summary.by_account.is_empty() {
        s.push_str("\n\nBy account");
        for account in &summary.by_account {
            let name = if account.account.is_empty() {
                "(none)"
            } else {
                account.account.as_str()
            };
            let _ = write!(
                s,
                "\n  {:<16} in {:>12}  out {:>12}  net {:>12}",
                name,
                account.totals.total_income.to_string(),
                account.totals.total_expenses.to_string(),
                account.totals.net.to_string()
            );
        }
    }
    if !summary.by_person.is_empty() {
        s.push_str("\n\nBy person");
        for (person, amount) in &summary.by_person {
            let _ = write!(s, "\n  {:<16} {:>12}", person, amount.to_string());
        }
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TransactionDraft;
    use crate::test::TestEnv;
    use rust_decimal::Decimal;

    #[tokio::test]
    async fn test_summary() {
        let env = TestEnv::new().await;
        let mut budget = env.budget().await;
        let ledger = budget.ledger_mut();
        for draft in [
            TransactionDraft::new("Rent", 1200, "Checking", 1, "expense"),
            TransactionDraft::new("Paycheck", 3000, "Checking", 15, "income"),
            TransactionDraft::new("Groceries", 300, "Card", 6, "food").person("Ana"),
        ] {
            ledger.add_transaction(draft).await.unwrap();
        }

        let out = summary(&budget).await.unwrap();
        let data = out.structure().unwrap();
        assert_eq!(data.transactions, 3);
        assert_eq!(data.totals.net.to_string(), "$1,500.00");
        assert_eq!(data.by_tag[0].tag, "expense");
        assert_eq!(data.by_tag[0].percent, Decimal::from(80));
        assert_eq!(data.by_tag[1].percent, Decimal::from(20));

        let message = out.message();
        assert!(message.starts_with("March 2024"));
        assert!(message.contains("Spending by tag"));
        assert!(message.contains("Ana"));
    }
}
