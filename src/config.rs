//! Configuration file handling.
//!
//! The configuration file is stored at `$BUDGET_HOME/config.json`. It records which storage
//! backend the budget uses and who is signed in.

use crate::error::Res;
use crate::store::{Backend, JsonStore, SqliteStore, Store};
use crate::utils;
use anyhow::{bail, ensure, Context};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

const APP_NAME: &str = "budget";
const CONFIG_VERSION: u8 = 1;
const CONFIG_JSON: &str = "config.json";
const DATA: &str = "data";
const BUDGET_SQLITE: &str = "budget.sqlite";

/// The `Config` object represents the configuration of the app. You instantiate it by providing
/// the path to `$BUDGET_HOME` and from there it loads `$BUDGET_HOME/config.json`. It knows where
/// each backend keeps its data and composes the `Store` for the signed-in user.
#[derive(Debug, Clone)]
pub struct Config {
    root: PathBuf,
    config_path: PathBuf,
    data_dir: PathBuf,
    sqlite_path: PathBuf,
    config_file: ConfigFile,
}

impl Config {
    /// Creates the home directory, its data directory, an initial `config.json` and, for the
    /// SQLite backend, the database.
    ///
    /// # Errors
    /// - Returns an error if `dir` already holds a `config.json` or any file operation fails.
    pub async fn create(dir: impl Into<PathBuf>, backend: Backend) -> Res<Self> {
        let maybe_relative = dir.into();
        utils::make_dir(&maybe_relative)
            .await
            .context("Unable to create the budget home directory")?;
        let root = utils::canonicalize(&maybe_relative).await?;

        let config_path = root.join(CONFIG_JSON);
        if config_path.exists() {
            bail!(
                "A budget already exists at '{}', remove config.json to start over",
                root.display()
            );
        }

        let data_dir = root.join(DATA);
        utils::make_dir(&data_dir).await?;

        let sqlite_path = root.join(BUDGET_SQLITE);
        if backend == Backend::Sqlite {
            SqliteStore::init(&sqlite_path)
                .await
                .context("Unable to create SQLite DB")?;
        }

        let config_file = ConfigFile {
            backend,
            ..Default::default()
        };
        config_file.save(&config_path).await?;
        debug!("Created {} with the {backend} backend", config_path.display());

        Ok(Self {
            root,
            config_path,
            data_dir,
            sqlite_path,
            config_file,
        })
    }

    /// This will
    /// - validate that `budget_home` exists and that the config file exists
    /// - load the config file
    /// - validate that the data directory exists
    pub async fn load(budget_home: impl Into<PathBuf>) -> Res<Self> {
        let maybe_relative = budget_home.into();
        let root = utils::canonicalize(&maybe_relative)
            .await
            .context("The budget home is missing, run 'budget init' first")?;

        let config_path = root.join(CONFIG_JSON);
        if !config_path.is_file() {
            bail!("The config file is missing '{}'", config_path.display())
        }
        let config_file = ConfigFile::load(&config_path).await?;

        let data_dir = root.join(DATA);
        if !data_dir.is_dir() {
            bail!("The data directory is missing '{}'", data_dir.display())
        }

        Ok(Self {
            sqlite_path: root.join(BUDGET_SQLITE),
            root,
            config_path,
            data_dir,
            config_file,
        })
    }

    /// Writes the current settings back to `config.json`.
    pub async fn save(&self) -> Res<()> {
        self.config_file.save(&self.config_path).await
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn sqlite_path(&self) -> &Path {
        &self.sqlite_path
    }

    pub fn backend(&self) -> Backend {
        self.config_file.backend
    }

    /// The signed-in user, if any.
    pub fn user(&self) -> Option<&str> {
        self.config_file.user.as_deref()
    }

    /// Signs `user` in, or signs out with `None`. Call `save` to persist the change.
    pub fn set_user(&mut self, user: Option<&str>) -> Res<()> {
        if let Some(user) = user {
            validate_user(user)?;
        }
        self.config_file.user = user.map(str::to_string);
        Ok(())
    }

    /// The signed-in user, or an error telling the caller to log in.
    pub fn require_user(&self) -> Res<&str> {
        match self.user() {
            Some(user) => Ok(user),
            None => bail!("Nobody is signed in, run 'budget login --user NAME' first"),
        }
    }

    /// The JSON document that holds `user`'s data when the JSON backend is selected.
    pub fn user_json_path(&self, user: &str) -> PathBuf {
        self.data_dir.join(format!("{user}.json"))
    }

    /// Composes the configured backend, scoped to the signed-in user.
    pub async fn store(&self) -> Res<Arc<dyn Store>> {
        let user = self.require_user()?;
        let store: Arc<dyn Store> = match self.backend() {
            Backend::Json => Arc::new(JsonStore::new(self.user_json_path(user))),
            Backend::Sqlite => Arc::new(
                SqliteStore::open(&self.sqlite_path, user)
                    .await
                    .context("Unable to load SQLite DB")?,
            ),
        };
        debug!("Using the {} backend for {user}", self.backend());
        Ok(store)
    }
}

/// User names become file names, so only a conservative set of characters is accepted.
fn validate_user(user: &str) -> Res<()> {
    ensure!(!user.is_empty(), "The user name cannot be empty");
    ensure!(
        !user.starts_with('.'),
        "The user name '{user}' cannot start with '.'"
    );
    ensure!(
        user.chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')),
        "The user name '{user}' may only contain letters, digits, '.', '_' and '-'"
    );
    Ok(())
}

/// Represents the serialization and deserialization format of the configuration file.
///
/// Example configuration:
/// ```json
/// {
///   "app_name": "budget",
///   "config_version": 1,
///   "backend": "sqlite",
///   "user": "ana"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
struct ConfigFile {
    /// Application name, should always be "budget"
    app_name: String,

    /// Configuration file version
    config_version: u8,

    /// Where transactions are stored
    #[serde(default)]
    backend: Backend,

    /// The signed-in user
    #[serde(default, skip_serializing_if = "Option::is_none")]
    user: Option<String>,
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            app_name: APP_NAME.to_string(),
            config_version: CONFIG_VERSION,
            backend: Backend::default(),
            user: None,
        }
    }
}

impl ConfigFile {
    /// Loads a ConfigFile from `path`.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed, or was written by another app.
    async fn load(path: impl AsRef<Path>) -> Res<Self> {
        let path = path.as_ref();
        let content = utils::read(path).await?;
        let config: ConfigFile = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file at {}", path.display()))?;

        ensure!(
            config.app_name == APP_NAME,
            "Invalid app_name in config file: expected '{}', got '{}'",
            APP_NAME,
            config.app_name
        );
        ensure!(
            config.config_version <= CONFIG_VERSION,
            "The config file version {} is newer than this program supports ({})",
            config.config_version,
            CONFIG_VERSION
        );
        Ok(config)
    }

    async fn save(&self, path: impl AsRef<Path>) -> Res<()> {
        let data = serde_json::to_string_pretty(self).context("Unable to serialize config")?;
        utils::write(path, data)
            .await
            .context("Unable to write config file")
    }
}
