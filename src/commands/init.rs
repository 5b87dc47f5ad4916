use crate::commands::Out;
use crate::{Config, Result};
use anyhow::{bail, Context};
use std::path::Path;

/// Creates the home directory, its reports subdirectory and an initial `config.json` that points at
/// `base_url` with default settings.
///
/// # Arguments
/// - `home` - The directory that will be the root of the home directory, e.g. `$HOME/portal-dash`
/// - `base_url` - The root URL of the portal, e.g. `http://portal.local`
///
/// # Errors
/// - Returns an error if `home` already holds a `config.json`.
/// - Returns an error if `base_url` is invalid or any file operations fail.
pub async fn init(home: &Path, base_url: &str) -> Result<Out<()>> {
    if Config::exists(home) {
        bail!(
            "'{}' is already initialized, edit its config.json instead",
            home.display()
        );
    }
    let config = Config::create(home, base_url)
        .await
        .context("Unable to create the home directory and config")?;
    Ok(format!(
        "Created {} for the portal at {}",
        config.config_path().display(),
        config.base_url()
    )
    .into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_init_then_reinit() {
        let dir = TempDir::new().unwrap();
        let home = dir.path().join("pd");
        let out = init(&home, "http://portal.local").await.unwrap();
        assert!(out.message().contains("http://portal.local/"));
        assert!(home.join("config.json").is_file());
        let again = init(&home, "http://other.local").await;
        assert!(again.unwrap_err().to_string().contains("already initialized"));
    }

    #[tokio::test]
    async fn test_init_keeps_invalid_config() {
        let dir = TempDir::new().unwrap();
        let home = dir.path().join("pd");
        let json = r#"{
            "app_name": "portal-dash",
            "config_version": 1,
            "base_url": "http://portal.local",
            "page_size": 0,
            "reports_dir": "/srv/keep"
        }"#;
        utils::write_creating_parent(home.join("config.json"), json).await.unwrap();
        assert!(Config::load(&home).await.is_err());

        let result = init(&home, "http://other.local").await;
        assert!(result.unwrap_err().to_string().contains("already initialized"));
        let kept = utils::read(&home.join("config.json")).await.unwrap();
        assert_eq!(kept, json);
    }
}
