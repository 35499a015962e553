//! SQLite schema migrations.
//!
//! Migration files are stored in this directory with the naming convention:
//! - `migration_NN_up.sql` - Upgrades schema from version `NN-1` to version `NN`
//! - `migration_NN_down.sql` - Downgrades schema from version `NN` to version `NN-1`

use anyhow::{bail, Context};
use sqlx::{Executor, SqlitePool};
use tracing::debug;

use crate::error::Res;

/// The schema version this build of the program expects.
pub(super) const CURRENT_VERSION: i32 = 1;

/// A database migration with up and down SQL.
struct Migration {
    /// The version this migration brings the database to (when going up).
    version: i32,
    up_sql: &'static str,
    down_sql: &'static str,
}

/// All available migrations in order.
const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    up_sql: include_str!("migration_01_up.sql"),
    down_sql: include_str!("migration_01_down.sql"),
}];

/// Creates the `schema_version` table if it does not exist and returns the recorded version, which
/// is `0` for a brand new database.
pub(super) async fn bootstrap(pool: &SqlitePool) -> Res<i32> {
    sqlx::query("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL)")
        .execute(pool)
        .await
        .context("Failed to create schema_version table")?;

    let row: (Option<i32>,) = sqlx::query_as("SELECT MAX(version) FROM schema_version")
        .fetch_one(pool)
        .await
        .context("Failed to query schema version")?;

    match row.0 {
        Some(version) => Ok(version),
        None => {
            sqlx::query("INSERT INTO schema_version (version) VALUES (0)")
                .execute(pool)
                .await
                .context("Failed to insert initial schema version")?;
            Ok(0)
        }
    }
}

/// Runs migrations to bring the database from `current_ver` to `target_ver`.
///
/// - If `current_ver < target_ver`, runs "up" migrations sequentially.
/// - If `current_ver > target_ver`, runs "down" migrations sequentially.
/// - Each migration is executed within a transaction that includes the schema_version update.
///
/// Validates all required migrations exist before running any of them.
pub(super) async fn run(pool: &SqlitePool, current_ver: i32, target_ver: i32) -> Res<()> {
    if current_ver == target_ver {
        debug!("Database already at target version {target_ver}, no migrations needed");
        return Ok(());
    }

    validate_migrations(current_ver, target_ver)?;

    if current_ver < target_ver {
        for version in (current_ver + 1)..=target_ver {
            let migration = find(version)?;
            debug!("Running migration {version:02} (up)");
            run_single_migration(pool, migration.up_sql, version).await?;
        }
    } else {
        for version in (target_ver + 1..=current_ver).rev() {
            let migration = find(version)?;
            debug!("Running migration {version:02} (down)");
            run_single_migration(pool, migration.down_sql, version - 1).await?;
        }
    }

    debug!("Migration complete, schema now at version {target_ver}");
    Ok(())
}

fn find(version: i32) -> Res<&'static Migration> {
    MIGRATIONS
        .iter()
        .find(|m| m.version == version)
        .with_context(|| format!("Migration {version} not found"))
}

/// Executes a single migration's SQL and updates schema_version, all within a transaction.
async fn run_single_migration(pool: &SqlitePool, sql: &str, new_version: i32) -> Res<()> {
    let mut tx = pool
        .begin()
        .await
        .context("Failed to begin migration transaction")?;

    // Migration files may hold several statements
    tx.execute(sql)
        .await
        .context("Failed to execute migration SQL")?;

    sqlx::query("DELETE FROM schema_version")
        .execute(&mut *tx)
        .await
        .context("Failed to clear schema_version")?;

    sqlx::query("INSERT INTO schema_version (version) VALUES (?)")
        .bind(new_version)
        .execute(&mut *tx)
        .await
        .context("Failed to update schema_version")?;

    tx.commit()
        .await
        .context("Failed to commit migration transaction")?;

    Ok(())
}

/// Validates that migrations are available for all versions needed to go from
/// `current_version` to `target_version`.
fn validate_migrations(current_version: i32, target_version: i32) -> Res<()> {
    let (start, end) = if current_version < target_version {
        (current_version + 1, target_version)
    } else {
        (target_version + 1, current_version)
    };

    for version in start..=end {
        if !MIGRATIONS.iter().any(|m| m.version == version) {
            bail!(
                "Migration {version} is missing but required to migrate from version {current_version} to {target_version}"
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
    use std::str::FromStr;
    use tempfile::TempDir;

    async fn create_test_db() -> Res<(TempDir, SqlitePool)> {
        let temp_dir = TempDir::new().context("Failed to create temp dir")?;
        let db_path = temp_dir.path().join("test.sqlite");

        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", db_path.display()))
            .context("Failed to parse SQLite connection string")?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .context("Failed to create SQLite database")?;

        Ok((temp_dir, pool))
    }

    async fn get_schema_version(pool: &SqlitePool) -> Res<i32> {
        let row: (i32,) = sqlx::query_as("SELECT MAX(version) FROM schema_version")
            .fetch_one(pool)
            .await
            .context("Failed to query schema version")?;
        Ok(row.0)
    }

    async fn table_exists(pool: &SqlitePool, table_name: &str) -> Res<bool> {
        let row: (i32,) =
            sqlx::query_as("SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?")
                .bind(table_name)
                .fetch_one(pool)
                .await
                .context("Failed to check table existence")?;
        Ok(row.0 > 0)
    }

    #[tokio::test]
    async fn test_bootstrap_is_idempotent() {
        let (_temp_dir, pool) = create_test_db().await.unwrap();
        assert_eq!(bootstrap(&pool).await.unwrap(), 0);
        assert_eq!(bootstrap(&pool).await.unwrap(), 0);
        run(&pool, 0, 1).await.unwrap();
        assert_eq!(bootstrap(&pool).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_migration_up_then_down() {
        let (_temp_dir, pool) = create_test_db().await.unwrap();
        bootstrap(&pool).await.unwrap();

        run(&pool, 0, 1).await.unwrap();
        assert_eq!(get_schema_version(&pool).await.unwrap(), 1);
        assert!(table_exists(&pool, "buckets").await.unwrap());
        assert!(table_exists(&pool, "cursors").await.unwrap());

        run(&pool, 1, 0).await.unwrap();
        assert_eq!(get_schema_version(&pool).await.unwrap(), 0);
        assert!(!table_exists(&pool, "buckets").await.unwrap());
        assert!(!table_exists(&pool, "cursors").await.unwrap());
    }

    #[test]
    fn test_validate_migrations() {
        assert!(validate_migrations(0, CURRENT_VERSION).is_ok());
        assert!(validate_migrations(CURRENT_VERSION, 0).is_ok());
        assert!(validate_migrations(0, CURRENT_VERSION + 1).is_err());
    }
}
