use crate::error::Res;
use anyhow::Context;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Write a file.
pub(crate) async fn write(path: impl AsRef<Path>, contents: impl AsRef<[u8]>) -> Res<()> {
    let path = path.as_ref();
    tokio::fs::write(path, contents)
        .await
        .with_context(|| format!("Unable to write to {}", path.display()))
}

/// Read a file to a `String`.
pub(crate) async fn read(path: &Path) -> Res<String> {
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read file at {}", path.display()))
}

/// Deserialize a JSON file into type `T`. Returns `None` if the file does not exist.
pub(crate) async fn deserialize_opt<T>(path: &Path) -> Res<Option<T>>
where
    T: DeserializeOwned,
{
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to read file at {}", path.display()))
        }
    };
    let value = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse JSON file at {}", path.display()))?;
    Ok(Some(value))
}

/// Serialize `value` as pretty JSON and replace the file at `path` with it. The data is written to
/// a sibling temp file first and then renamed into place so that a crash never leaves half a file.
pub(crate) async fn save_json<T>(path: &Path, value: &T) -> Res<()>
where
    T: Serialize,
{
    let json = serde_json::to_string_pretty(value).context("Failed to serialize data to JSON")?;
    let tmp = path.with_extension("json.tmp");
    write(&tmp, json).await?;
    rename(&tmp, path).await
}

/// Basically move a file. Renames `from` -> `to`.
pub(crate) async fn rename(from: impl AsRef<Path>, to: impl AsRef<Path>) -> Res<()> {
    tokio::fs::rename(from.as_ref(), to.as_ref())
        .await
        .with_context(|| {
            format!(
                "Unable to move file from '{}' to '{}'",
                from.as_ref().display(),
                to.as_ref().display()
            )
        })
}

/// Create a directory and any missing parents.
pub(crate) async fn make_dir(path: &Path) -> Res<()> {
    tokio::fs::create_dir_all(path)
        .await
        .with_context(|| format!("Unable to create directory at {}", path.display()))
}

pub(crate) async fn canonicalize(path: &Path) -> Res<PathBuf> {
    tokio::fs::canonicalize(path)
        .await
        .with_context(|| format!("Unable to canonicalize the path {}", path.display()))
}
