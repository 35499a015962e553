//! Command handlers for the budget CLI.
//!
//! This module contains implementations for all CLI subcommands. The handlers that work on data
//! take a `Budget` that the caller has opened for the signed-in user with `open_budget`.

mod add;
mod delete;
mod export;
mod init;
mod list;
mod month;
mod session;
mod summary;

use crate::cursor::Clock;
use crate::error::{ErrorType, IntoResult};
use crate::{Budget, Config, Result};
use serde::Serialize;
use std::fmt::Debug;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

pub use add::{add, carry};
pub use delete::delete;
pub use export::export;
pub use init::init;
pub use list::{list, people, Listing};
pub use month::{month, MonthView};
pub use session::{login, logout};
pub use summary::summary;

/// The output type for a command. This allows the command to return a consistent message and,
/// optionally, structured data.
#[derive(Debug, Clone, Serialize)]
pub struct Out<T>
where
    T: Serialize + Clone + Debug,
{
    /// A message that can be printed to the user regarding the outcome of the command execution.
    message: String,

    /// Any structured data that needs to be output from the call.
    structure: Option<T>,
}

impl<T, S> From<S> for Out<T>
where
    T: Debug + Clone + Serialize,
    S: Into<String>,
{
    fn from(value: S) -> Self {
        Out::new_message(value)
    }
}

impl<T> Out<T>
where
    T: Serialize + Clone + Debug,
{
    /// Create a new `Out` object that has `Some(structure)`.
    pub fn new<S>(message: S, structure: T) -> Self
    where
        S: Into<String>,
    {
        Self {
            message: message.into(),
            structure: Some(structure),
        }
    }

    /// Create a new `Out` object that has `None` for `structure`.
    pub fn new_message<S>(message: S) -> Self
    where
        S: Into<String>,
    {
        Self {
            message: message.into(),
            structure: None,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn structure(&self) -> Option<&T> {
        self.structure.as_ref()
    }

    /// Print the message to `info!` and the structured data (if it exists) as JSON to `debug!`.
    pub fn print(&self) {
        info!("{}", self.message);
        if let Some(structure) = self.structure() {
            if let Ok(json) = serde_json::to_string_pretty(structure) {
                debug!("Command output:\n\n{json}\n\n");
            }
        }
    }
}

/// Loads `$BUDGET_HOME/config.json`.
pub async fn load_config(budget_home: &Path) -> Result<Config> {
    Config::load(budget_home)
        .await
        .pub_result(ErrorType::Config)
}

/// Opens the signed-in user's budget with the configured backend.
///
/// # Errors
/// - `Session` if nobody is signed in.
/// - `Persistence` if the backend cannot be opened or the saved month cannot be loaded.
pub async fn open_budget(config: &Config, clock: Arc<dyn Clock>) -> Result<Budget> {
    config.require_user().pub_result(ErrorType::Session)?;
    let store = config.store().await.pub_result(ErrorType::Persistence)?;
    Budget::open(store, clock).await
}

fn plural(count: usize, one: &str, many: &str) -> String {
    format!("{count} {}", if count == 1 { one } else { many })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursor::SystemClock;
    use crate::store::Backend;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_open_budget_requires_session() {
        let dir = TempDir::new().unwrap();
        let config = Config::create(dir.path(), Backend::Json).await.unwrap();
        let err = open_budget(&config, Arc::new(SystemClock))
            .await
            .unwrap_err();
        assert!(err.is(ErrorType::Session));
    }

    #[tokio::test]
    async fn test_open_budget_with_sqlite() {
        use crate::model::TransactionDraft;
        use crate::test::TestEnv;

        let env = TestEnv::with_backend(Backend::Sqlite).await;
        let mut budget = env.budget().await;
        budget.previous_month().await.unwrap();
        budget
            .ledger_mut()
            .add_transaction(TransactionDraft::new("Rent", 1200, "Checking", 1, "rent"))
            .await
            .unwrap();

        let budget = env.budget().await;
        assert_eq!(budget.month().to_string(), "2024-02");
        assert_eq!(budget.ledger().transactions().len(), 1);
    }

    #[tokio::test]
    async fn test_load_config_missing() {
        let dir = TempDir::new().unwrap();
        let err = load_config(dir.path()).await.unwrap_err();
        assert!(err.is(ErrorType::Config));
    }

    #[test]
    fn test_out_from_message() {
        let out: Out<()> = "done".into();
        assert_eq!(out.message(), "done");
        assert!(out.structure().is_none());
    }

    #[test]
    fn test_plural() {
        assert_eq!(plural(1, "transaction", "transactions"), "1 transaction");
        assert_eq!(plural(0, "transaction", "transactions"), "0 transactions");
    }
}
