//! Configuration file handling for portal-dash.
//!
//! The configuration file is stored at `$PORTAL_DASH_HOME/config.json` and contains the portal's
//! base URL along with pagination, refresh and output settings.

use crate::{utils, Result};
use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

const APP_NAME: &str = "portal-dash";
const CONFIG_VERSION: u8 = 1;
const CONFIG_JSON: &str = "config.json";
const REPORTS: &str = "reports";
const PAGE_SIZE: usize = 50;
/// The portal pages refreshed themselves every five minutes.
const REFRESH_SECS: u64 = 300;
pub(crate) const TIMEOUT_SECS: u64 = 30;

/// The `Config` object represents the configuration of the app. You instantiate it by providing
/// the path to `$PORTAL_DASH_HOME` and from there it loads `$PORTAL_DASH_HOME/config.json`. It
/// provides paths to other items that are either configurable or are expected in a certain location
/// within the home directory.
#[derive(Debug, Clone)]
pub struct Config {
    root: PathBuf,
    config_path: PathBuf,
    config_file: ConfigFile,
    base_url: Url,
}

impl Config {
    /// Creates the home directory, its reports subdirectory and an initial `config.json` that
    /// points at `base_url` with default settings.
    ///
    /// # Arguments
    /// - `dir` - The directory that will be the root of the home directory, e.g. `$HOME/portal-dash`
    /// - `base_url` - The root URL of the portal, e.g. `http://portal.local`
    ///
    /// # Errors
    /// - Returns an error if `base_url` is not a valid URL.
    /// - Returns an error if any file operations fail.
    pub async fn create(dir: impl Into<PathBuf>, base_url: &str) -> Result<Self> {
        let base_url = parse_base_url(base_url)?;

        let maybe_relative = dir.into();
        utils::make_dir(&maybe_relative)
            .await
            .context("Unable to create the portal-dash home directory")?;
        let root = utils::canonicalize(&maybe_relative).await?;

        let config_file = ConfigFile {
            base_url: base_url.to_string(),
            ..ConfigFile::default()
        };
        let config_path = root.join(CONFIG_JSON);
        config_file.save(&config_path).await?;

        let config = Self {
            root,
            config_path,
            config_file,
            base_url,
        };
        utils::make_dir(config.reports_dir()).await?;
        Ok(config)
    }

    /// Whether `home` already holds a config file, valid or not.
    pub fn exists(home: impl AsRef<Path>) -> bool {
        home.as_ref().join(CONFIG_JSON).exists()
    }

    /// This will
    /// - validate that the home directory exists and that the config file exists
    /// - load and validate the config file
    /// - return the loaded configuration object
    pub async fn load(home: impl Into<PathBuf>) -> Result<Self> {
        let maybe_relative = home.into();
        let root = utils::canonicalize(&maybe_relative)
            .await
            .context("The portal-dash home directory is missing, run 'portal-dash init'")?;

        let config_path = root.join(CONFIG_JSON);
        if !config_path.is_file() {
            bail!("The config file is missing '{}'", config_path.display())
        }
        let config_file = ConfigFile::load(&config_path).await?;
        let base_url = parse_base_url(&config_file.base_url)?;

        Ok(Self {
            root,
            config_path,
            config_file,
            base_url,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn page_size(&self) -> usize {
        self.config_file.page_size
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.config_file.refresh_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.config_file.timeout_secs)
    }

    /// Returns the stored `reports_dir` if it is absolute, otherwise resolves it against the home
    /// directory.
    pub fn reports_dir(&self) -> PathBuf {
        let p = self.config_file.reports_dir();
        if p.is_absolute() {
            return p;
        }
        self.root.join(p)
    }
}

/// Represents the serialization and deserialization format of the configuration file.
///
/// Example configuration:
/// ```json
/// {
///   "app_name": "portal-dash",
///   "config_version": 1,
///   "base_url": "http://portal.local/",
///   "page_size": 50,
///   "refresh_secs": 300,
///   "timeout_secs": 30,
///   "reports_dir": "reports"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
struct ConfigFile {
    /// Application name, should always be "portal-dash"
    app_name: String,

    /// Configuration file version
    config_version: u8,

    /// Root URL of the portal backend
    base_url: String,

    /// Number of rows per table page
    #[serde(default = "default_page_size")]
    page_size: usize,

    /// Seconds between refreshes in `watch`
    #[serde(default = "default_refresh_secs")]
    refresh_secs: u64,

    /// Seconds before an in-flight request is abandoned
    #[serde(default = "default_timeout_secs")]
    timeout_secs: u64,

    /// Directory for rendered reports (optional, relative to the home directory or absolute)
    /// Defaults to $PORTAL_DASH_HOME/reports if not specified
    #[serde(skip_serializing_if = "Option::is_none")]
    reports_dir: Option<PathBuf>,
}

fn default_page_size() -> usize {
    PAGE_SIZE
}

fn default_refresh_secs() -> u64 {
    REFRESH_SECS
}

fn default_timeout_secs() -> u64 {
    TIMEOUT_SECS
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            app_name: APP_NAME.to_string(),
            config_version: CONFIG_VERSION,
            base_url: String::new(),
            page_size: PAGE_SIZE,
            refresh_secs: REFRESH_SECS,
            timeout_secs: TIMEOUT_SECS,
            reports_dir: None,
        }
    }
}

impl ConfigFile {
    /// Loads a ConfigFile asynchronously from the specified path.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed, or holds invalid settings
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config: ConfigFile = utils::deserialize(path).await?;

        anyhow::ensure!(
            config.app_name == APP_NAME,
            "Invalid app_name in config file: expected '{}', got '{}'",
            APP_NAME,
            config.app_name
        );
        anyhow::ensure!(config.page_size > 0, "page_size must be greater than zero");
        anyhow::ensure!(
            config.refresh_secs > 0,
            "refresh_secs must be greater than zero"
        );
        anyhow::ensure!(
            config.timeout_secs > 0,
            "timeout_secs must be greater than zero"
        );

        Ok(config)
    }

    /// Saves the ConfigFile to the specified path.
    pub async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let p = path.as_ref();
        let data = serde_json::to_string_pretty(self).context("Unable to serialize config")?;
        utils::write(p, data)
            .await
            .context("Unable to write config file")
    }

    /// Gets the reports directory. If None, defaults to $PORTAL_DASH_HOME/reports
    pub fn reports_dir(&self) -> PathBuf {
        self.reports_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(REPORTS))
    }
}

/// Parses the portal base URL. Only http and https are accepted. The path always ends in `/` so
/// that endpoint paths join beneath it rather than replacing its last segment.
fn parse_base_url(url: &str) -> Result<Url> {
    let mut parsed = Url::parse(url).with_context(|| format!("Invalid base URL '{url}'"))?;
    match parsed.scheme() {
        "http" | "https" => {}
        other => bail!("Unsupported URL scheme '{other}' in base URL '{url}'"),
    }
    if !parsed.path().ends_with('/') {
        let path = format!("{}/", parsed.path());
        parsed.set_path(&path);
    }
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_config_create() {
        let dir = TempDir::new().unwrap();
        let home_dir = dir.path().join("portal_home");

        let config = Config::create(&home_dir, "http://portal.local")
            .await
            .unwrap();

        assert_eq!(config.base_url().as_str(), "http://portal.local/");
        assert_eq!(config.page_size(), 50);
        assert_eq!(config.refresh_interval(), Duration::from_secs(300));
        assert!(config.config_path().is_file());
        assert!(config.reports_dir().is_dir());
        assert!(config.reports_dir().starts_with(config.root()));
    }

    #[tokio::test]
    async fn test_config_create_then_load() {
        let dir = TempDir::new().unwrap();
        let created = Config::create(dir.path(), "https://portal.example.com/app/")
            .await
            .unwrap();
        let loaded = Config::load(dir.path()).await.unwrap();
        assert_eq!(created.base_url(), loaded.base_url());
        assert_eq!(created.root(), loaded.root());
    }

    #[test]
    fn test_parse_base_url_appends_slash() {
        let url = parse_base_url("https://portal.example.com/app").unwrap();
        assert_eq!(url.as_str(), "https://portal.example.com/app/");
        let url = parse_base_url("http://portal.local").unwrap();
        assert_eq!(url.as_str(), "http://portal.local/");
    }

    #[tokio::test]
    async fn test_config_create_rejects_bad_url() {
        let dir = TempDir::new().unwrap();
        assert!(Config::create(dir.path(), "not a url").await.is_err());
        assert!(Config::create(dir.path(), "ftp://portal.local").await.is_err());
    }

    #[tokio::test]
    async fn test_config_load_missing_home() {
        let dir = TempDir::new().unwrap();
        let result = Config::load(dir.path().join("nope")).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_config_file_load_with_minimal_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");

        let json = r#"{
            "app_name": "portal-dash",
            "config_version": 1,
            "base_url": "http://portal.local"
        }"#;
        utils::write(&config_path, json).await.unwrap();

        let config = ConfigFile::load(&config_path).await.unwrap();
        assert_eq!(config.page_size, 50);
        assert_eq!(config.refresh_secs, 300);
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.reports_dir(), PathBuf::from(REPORTS));
    }

    #[tokio::test]
    async fn test_config_file_load_invalid_app_name() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");

        let json = r#"{
            "app_name": "tiller",
            "config_version": 1,
            "base_url": "http://portal.local"
        }"#;
        utils::write(&config_path, json).await.unwrap();

        let result = ConfigFile::load(&config_path).await;
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Invalid app_name"));
    }

    #[tokio::test]
    async fn test_config_file_load_zero_page_size() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");

        let json = r#"{
            "app_name": "portal-dash",
            "config_version": 1,
            "base_url": "http://portal.local",
            "page_size": 0
        }"#;
        utils::write(&config_path, json).await.unwrap();

        let result = ConfigFile::load(&config_path).await;
        assert!(result.unwrap_err().to_string().contains("page_size"));
    }

    #[tokio::test]
    async fn test_config_file_load_zero_timeout() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");

        let json = r#"{
            "app_name": "portal-dash",
            "config_version": 1,
            "base_url": "http://portal.local",
            "timeout_secs": 0
        }"#;
        utils::write(&config_path, json).await.unwrap();

        let result = ConfigFile::load(&config_path).await;
        assert!(result.unwrap_err().to_string().contains("timeout_secs"));
    }

    #[tokio::test]
    async fn test_config_file_save_and_load() {
        let t = TempDir::new().unwrap();
        let path = t.path().join("file.json");
        let original = ConfigFile {
            base_url: "http://portal.local/".into(),
            page_size: 25,
            reports_dir: Some(PathBuf::from("/var/reports")),
            ..ConfigFile::default()
        };
        original.save(&path).await.unwrap();
        let read = ConfigFile::load(&path).await.unwrap();
        assert_eq!(original, read);
    }

    #[test]
    fn test_config_file_serialization_omits_none_fields() {
        let config = ConfigFile::default();
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("reports_dir"));
    }
}
