//! Implements the `Store` trait with a SQLite database.

use crate::error::Res;
use crate::model::{Buckets, MonthKey, Transaction};
use crate::store::{migrations, Store};
use anyhow::Context;
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, warn};

/// A `Store` backed by a SQLite database. Several users can share one database file; each
/// `SqliteStore` only ever sees the rows of the user it was opened for.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
    user: String,
}

impl SqliteStore {
    /// Creates the SQLite file at `path` if needed and brings its schema up to date.
    pub async fn init(path: impl AsRef<Path>) -> Res<()> {
        let pool = connect(path.as_ref()).await?;
        pool.close().await;
        Ok(())
    }

    /// Opens the database at `path`, migrating it if needed, and returns a store scoped to `user`.
    pub async fn open(path: impl AsRef<Path>, user: impl Into<String>) -> Res<Self> {
        let pool = connect(path.as_ref()).await?;
        Ok(Self {
            pool,
            user: user.into(),
        })
    }

    pub fn user(&self) -> &str {
        &self.user
    }
}

async fn connect(path: &Path) -> Res<SqlitePool> {
    let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", path.display()))
        .context("Failed to parse SQLite connection string")?
        .create_if_missing(true)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .with_context(|| format!("Unable to open SQLite database at {}", path.display()))?;

    let version = migrations::bootstrap(&pool).await?;
    migrations::run(&pool, version, migrations::CURRENT_VERSION).await?;
    debug!("Opened SQLite database at {}", path.display());
    Ok(pool)
}

fn parse_bucket(month: &str, json: &str) -> Res<Vec<Transaction>> {
    serde_json::from_str(json)
        .with_context(|| format!("The stored transactions for {month} are not valid JSON"))
}

#[async_trait::async_trait]
impl Store for SqliteStore {
    async fn get_month_bucket(&self, month: MonthKey) -> Res<Vec<Transaction>> {
        let month = month.to_string();
        let row: Option<String> =
            sqlx::query_scalar("SELECT transactions FROM buckets WHERE user = ? AND month = ?")
                .bind(&self.user)
                .bind(&month)
                .fetch_optional(&self.pool)
                .await
                .with_context(|| format!("Failed to query the bucket for {month}"))?;
        match row {
            Some(json) => parse_bucket(&month, &json),
            None => Ok(Vec::new()),
        }
    }

    async fn put_month_bucket(&self, month: MonthKey, transactions: &[Transaction]) -> Res<()> {
        let json = serde_json::to_string(transactions).context("Failed to serialize bucket")?;
        sqlx::query(
            "INSERT INTO buckets (user, month, transactions, updated_at) VALUES (?, ?, ?, ?) \
             ON CONFLICT(user, month) DO UPDATE SET \
             transactions = excluded.transactions, updated_at = excluded.updated_at",
        )
        .bind(&self.user)
        .bind(month.to_string())
        .bind(json)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .with_context(|| format!("Failed to save the bucket for {month}"))?;
        Ok(())
    }

    async fn get_saved_cursor(&self) -> Res<Option<String>> {
        sqlx::query_scalar("SELECT month FROM cursors WHERE user = ?")
            .bind(&self.user)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to query the saved cursor")
    }

    async fn put_saved_cursor(&self, month: MonthKey) -> Res<()> {
        sqlx::query(
            "INSERT INTO cursors (user, month) VALUES (?, ?) \
             ON CONFLICT(user) DO UPDATE SET month = excluded.month",
        )
        .bind(&self.user)
        .bind(month.to_string())
        .execute(&self.pool)
        .await
        .context("Failed to save the cursor")?;
        Ok(())
    }

    async fn all_buckets(&self) -> Res<Buckets> {
        let rows: Vec<(String, String)> = sqlx::query_as(
            "SELECT month, transactions FROM buckets WHERE user = ? ORDER BY month",
        )
        .bind(&self.user)
        .fetch_all(&self.pool)
        .await
        .context("Failed to query buckets")?;

        let mut buckets = Buckets::new();
        for (month, json) in rows {
            match MonthKey::from_str(&month) {
                Ok(key) => {
                    buckets.insert(key, parse_bucket(&month, &json)?);
                }
                Err(e) => warn!("Skipping stored bucket with a bad month key: {e}"),
            }
        }
        Ok(buckets)
    }
}
