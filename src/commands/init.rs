use crate::commands::Out;
use crate::error::{ErrorType, IntoResult};
use crate::store::Backend;
use crate::{Config, Result};
use anyhow::Context;
use std::path::Path;

/// Creates the budget home directory, its data directory and an initial `config.json`.
///
/// # Arguments
/// - `budget_home` - The directory that will be the root of the budget home, e.g. `$HOME/budget`
/// - `backend` - Where transactions will be stored
///
/// # Errors
/// - Returns an error if the home is already initialized or any file operation fails.
pub async fn init(budget_home: &Path, backend: Backend) -> Result<Out<()>> {
    let config = Config::create(budget_home, backend)
        .await
        .context("Unable to create the budget home and config")
        .pub_result(ErrorType::Config)?;
    Ok(format!(
        "Created a budget at {} using the {backend} backend. Run 'budget login --user NAME' next",
        config.root().display()
    )
    .into())
}
