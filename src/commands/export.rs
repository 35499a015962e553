//! CSV export of the month being viewed.

use crate::args::ExportArgs;
use crate::commands::{plural, Out};
use crate::error::{ErrorType, IntoResult, Res};
use crate::model::Transaction;
use crate::utils;
use crate::{Budget, Result};
use anyhow::{anyhow, Context};
use tokio::io::AsyncWriteExt;

const HEADERS: [&str; 9] = [
    "id", "day", "merchant", "amount", "account", "tag", "person", "recurring", "splits",
];

/// Writes the month's transactions, sorted by day, as CSV to `--out` or stdout. The filter is not
/// applied. Splits are flattened into one column as `CATEGORY:AMOUNT[:PERSON]` joined by `;`.
pub async fn export(budget: &Budget, args: &ExportArgs) -> Result<Out<usize>> {
    let mut rows: Vec<&Transaction> = budget.ledger().transactions().iter().collect();
    rows.sort_by_key(|t| t.day());

    let csv = to_csv(&rows).pub_result(ErrorType::Request)?;
    match args.out() {
        Some(path) => utils::write(path, csv).await.pub_result(ErrorType::Request)?,
        None => write_stdout(&csv).await.pub_result(ErrorType::Request)?,
    }

    let message = format!(
        "Exported {} from {}",
        plural(rows.len(), "transaction", "transactions"),
        budget.month().display_name()
    );
    Ok(Out::new(message, rows.len()))
}

async fn write_stdout(csv: &[u8]) -> Res<()> {
    let mut stdout = tokio::io::stdout();
    stdout
        .write_all(csv)
        .await
        .context("Unable to write the CSV to stdout")?;
    stdout.flush().await.context("Unable to flush stdout")
}

fn to_csv(rows: &[&Transaction]) -> Res<Vec<u8>> {
    let mut csv = csv::Writer::from_writer(Vec::new());
    csv.write_record(HEADERS)
        .context("Unable to write the CSV header")?;
    for t in rows {
        csv.write_record([
            t.id().to_string(),
            t.day().to_string(),
            t.merchant().to_string(),
            t.amount().value().to_string(),
            t.account().to_string(),
            t.tag().to_string(),
            t.person().unwrap_or_default().to_string(),
            t.is_recurring().to_string(),
            flatten_splits(t),
        ])
        .with_context(|| format!("Unable to write transaction {}", t.id()))?;
    }
    csv.into_inner()
        .map_err(|e| anyhow!("Unable to finish the CSV output: {}", e.error()))
}

fn flatten_splits(t: &Transaction) -> String {
    t.splits()
        .iter()
        .map(|s| match s.person() {
            Some(person) => format!("{}:{}:{person}", s.category(), s.amount().value()),
            None => format!("{}:{}", s.category(), s.amount().value()),
        })
        .collect::<Vec<_>>()
        .join(";")
}
