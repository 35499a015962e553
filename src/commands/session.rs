//! Sign in and out. There is no password: the user name only decides whose transactions the
//! store reads and writes.

use crate::commands::Out;
use crate::error::{ErrorType, IntoResult};
use crate::{Config, Result};
use anyhow::Context;

pub async fn login(mut config: Config, user: &str) -> Result<Out<String>> {
    config.set_user(Some(user)).pub_result(ErrorType::Request)?;
    config
        .save()
        .await
        .context("Unable to save the session")
        .pub_result(ErrorType::Config)?;
    Ok(Out::new(format!("Signed in as {user}"), user.to_string()))
}

pub async fn logout(mut config: Config) -> Result<Out<()>> {
    let Some(user) = config.user().map(str::to_string) else {
        return Ok("Nobody is signed in".into());
    };
    config.set_user(None).pub_result(ErrorType::Request)?;
    config
        .save()
        .await
        .context("Unable to save the session")
        .pub_result(ErrorType::Config)?;
    Ok(format!("Signed out {user}").into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Backend;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_login_logout() {
        let dir = TempDir::new().unwrap();
        let config = Config::create(dir.path(), Backend::Json).await.unwrap();

        let err = login(config.clone(), "../x").await.unwrap_err();
        assert!(err.is(ErrorType::Request));

        let out = login(config, "ana").await.unwrap();
        assert_eq!(out.structure().map(String::as_str), Some("ana"));
        let config = Config::load(dir.path()).await.unwrap();
        assert_eq!(config.user(), Some("ana"));

        let out = logout(config).await.unwrap();
        assert_eq!(out.message(), "Signed out ana");
        let config = Config::load(dir.path()).await.unwrap();
        assert_eq!(config.user(), None);
        assert_eq!(logout(config).await.unwrap().message(), "Nobody is signed in");
    }
}
