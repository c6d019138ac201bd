//! Configuration file handling for the expense tracker.
//!
//! The configuration file is stored at `$EXPENSES_HOME/config.json` and contains settings for
//! locating the Google spreadsheet, the path to the service account key, and the cosmetic console
//! effects.

use crate::console::Pacing;
use crate::error::{ErrorType, IntoResult};
use crate::{utils, Result};
use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

const APP_NAME: &str = "expenses";
const CONFIG_VERSION: u8 = 1;
const SECRETS: &str = ".secrets";
const SERVICE_ACCOUNT_JSON: &str = "service_account.json";
const CONFIG_JSON: &str = "config.json";

/// The title of the spreadsheet that is looked up when no `sheet_url` is configured.
pub const DEFAULT_SPREADSHEET_NAME: &str = "expense_tracker";

/// The worksheet (tab) holding the expense rows.
pub const DEFAULT_WORKSHEET: &str = "expenses";

/// The `Config` object represents the configuration of the app. You instantiate it by providing
/// the path to `$EXPENSES_HOME` and from there it loads `$EXPENSES_HOME/config.json`. It provides
/// paths to other items that are either configurable or are expected in a certain location within
/// the home directory.
#[derive(Debug, Clone)]
pub struct Config {
    root: PathBuf,
    secrets: PathBuf,
    config_path: PathBuf,
    config_file: ConfigFile,
    spreadsheet_id: Option<String>,
}

impl Config {
    /// Creates the data directory, its subdirectories and:
    /// - Creates an initial `config.json` file along with default settings
    /// - Copies `service_account` into its default location in the data dir.
    ///
    /// # Arguments
    /// - `dir` - The directory that will be the root of data directory, e.g. `$HOME/expenses`
    /// - `service_account` - The Google service account key JSON.
    /// - `sheet` - Where the expense rows live. When `sheet.url` is `None`, the spreadsheet is
    ///   looked up by title when the program runs.
    ///
    /// # Errors
    /// - Returns an error if the sheet URL is malformed or any file operations fail.
    pub async fn create(
        dir: impl Into<PathBuf>,
        service_account: &Path,
        sheet: SheetLocation,
    ) -> Result<Self> {
        // Fail before touching the filesystem if the URL is unusable.
        let spreadsheet_id = match sheet.url.as_deref() {
            Some(url) => Some(
                extract_spreadsheet_id(url)
                    .context("Failed to extract spreadsheet ID from sheet URL")?,
            ),
            None => None,
        };

        let maybe_relative = dir.into();
        utils::make_dir(&maybe_relative)
            .await
            .context("Unable to create the expenses home directory")?;
        let root = utils::canonicalize(&maybe_relative).await?;

        let secrets = root.join(SECRETS);
        utils::make_dir(&secrets).await?;

        let key_destination = secrets.join(SERVICE_ACCOUNT_JSON);
        utils::copy(service_account, &key_destination).await?;
        utils::restrict_permissions(&key_destination)?;

        let config_path = root.join(CONFIG_JSON);
        let config_file = ConfigFile {
            sheet_url: sheet.url,
            spreadsheet_name: sheet
                .name
                .unwrap_or_else(|| DEFAULT_SPREADSHEET_NAME.to_string()),
            worksheet: sheet
                .worksheet
                .unwrap_or_else(|| DEFAULT_WORKSHEET.to_string()),
            ..ConfigFile::default()
        };
        config_file.save(&config_path).await?;

        Ok(Self {
            root,
            secrets,
            config_path,
            config_file,
            spreadsheet_id,
        })
    }

    /// This will
    /// - validate that `expenses_home` exists and that the config file exists
    /// - load the config file
    /// - validate that the secrets directory exists
    /// - return the loaded configuration object
    pub async fn load(expenses_home: impl Into<PathBuf>) -> Result<Self> {
        Self::load_inner(expenses_home.into())
            .await
            .pub_result(ErrorType::Config)
    }

    async fn load_inner(maybe_relative: PathBuf) -> Result<Self> {
        let root = utils::canonicalize(&maybe_relative)
            .await
            .context("The expenses home directory is missing, run 'expenses init' first")?;

        let config_path = root.join(CONFIG_JSON);
        if !config_path.is_file() {
            bail!(
                "The config file is missing '{}', run 'expenses init' first",
                config_path.display()
            )
        }
        let config_file = ConfigFile::load(&config_path).await?;

        let spreadsheet_id = match config_file.sheet_url.as_deref() {
            Some(url) => Some(
                extract_spreadsheet_id(url)
                    .context("Failed to extract spreadsheet ID from sheet URL")?,
            ),
            None => None,
        };

        let config = Self {
            root: root.clone(),
            secrets: root.join(SECRETS),
            config_path,
            config_file,
            spreadsheet_id,
        };
        if !config.secrets.is_dir() {
            bail!(
                "The secrets directory is missing '{}'",
                config.secrets.display()
            )
        }
        Ok(config)
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn sheet_url(&self) -> Option<&str> {
        self.config_file.sheet_url.as_deref()
    }

    /// The spreadsheet ID taken from `sheet_url`, if one is configured.
    pub fn spreadsheet_id(&self) -> Option<&str> {
        self.spreadsheet_id.as_deref()
    }

    pub fn spreadsheet_name(&self) -> &str {
        &self.config_file.spreadsheet_name
    }

    pub fn worksheet(&self) -> &str {
        &self.config_file.worksheet
    }

    pub fn pacing(&self) -> Pacing {
        self.config_file.pacing
    }

    /// Returns the stored `service_account_path` if it is absolute, otherwise resolves the
    /// relative path against the home directory.
    pub fn service_account_path(&self) -> PathBuf {
        let p = self.config_file.service_account_path();
        if p.is_absolute() {
            return p;
        }
        self.root.join(p)
    }
}

/// Identifies the spreadsheet and worksheet given to `Config::create`.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct SheetLocation {
    pub url: Option<String>,
    pub name: Option<String>,
    pub worksheet: Option<String>,
}

/// Represents the serialization and deserialization format of the configuration file.
///
/// Example configuration:
/// ```json
/// {
///   "app_name": "expenses",
///   "config_version": 1,
///   "sheet_url": "https://docs.google.com/spreadsheets/d/7KpXm2RfZwNJgs84QhVYno5DU6iM9Wlr3bCzAv1txRpL",
///   "spreadsheet_name": "expense_tracker",
///   "worksheet": "expenses",
///   "service_account_path": ".secrets/service_account.json",
///   "pacing": {
///     "typing_delay_ms": 50,
///     "loading_pause_ms": 1500,
///     "clear_screen": true
///   }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
struct ConfigFile {
    /// Application name, should always be "expenses"
    app_name: String,

    /// Configuration file version
    config_version: u8,

    /// URL to the Google Sheet. When absent the sheet is found by `spreadsheet_name`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sheet_url: Option<String>,

    /// Title of the spreadsheet, used only when `sheet_url` is absent
    #[serde(default = "default_spreadsheet_name")]
    spreadsheet_name: String,

    /// Name of the worksheet tab holding the expenses
    #[serde(default = "default_worksheet")]
    worksheet: String,

    /// Path to the service account key (optional, relative to `$EXPENSES_HOME` or absolute)
    /// Defaults to $EXPENSES_HOME/.secrets/service_account.json if not specified
    #[serde(default, skip_serializing_if = "Option::is_none")]
    service_account_path: Option<PathBuf>,

    /// Typing effect, loading pauses and screen clearing
    #[serde(default)]
    pacing: Pacing,
}

fn default_spreadsheet_name() -> String {
    DEFAULT_SPREADSHEET_NAME.to_string()
}

fn default_worksheet() -> String {
    DEFAULT_WORKSHEET.to_string()
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            app_name: APP_NAME.to_string(),
            config_version: CONFIG_VERSION,
            sheet_url: None,
            spreadsheet_name: default_spreadsheet_name(),
            worksheet: default_worksheet(),
            service_account_path: None,
            pacing: Pacing::default(),
        }
    }
}

impl ConfigFile {
    /// Loads a ConfigFile asynchronously from the specified path.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed, or if it belongs to another app
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config: ConfigFile = utils::deserialize(path)
            .await
            .with_context(|| format!("Failed to load config file at {}", path.display()))?;

        anyhow::ensure!(
            config.app_name == APP_NAME,
            "Invalid app_name in config file: expected '{}', got '{}'",
            APP_NAME,
            config.app_name
        );
        anyhow::ensure!(
            !config.worksheet.trim().is_empty(),
            "The worksheet name in the config file cannot be empty"
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

    /// Gets the service account key path.
    ///
    /// If None, defaults to .secrets/service_account.json
    pub fn service_account_path(&self) -> PathBuf {
        self.service_account_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(SECRETS).join(SERVICE_ACCOUNT_JSON))
    }
}

/// Extracts the spreadsheet ID from a Google Sheets URL, e.g.
/// `https://docs.google.com/spreadsheets/d/SPREADSHEET_ID/edit#gid=0`
fn extract_spreadsheet_id(url: &str) -> Result<String> {
    let parsed = Url::parse(url).with_context(|| format!("'{url}' is not a valid URL"))?;
    let mut segments = parsed
        .path_segments()
        .with_context(|| format!("'{url}' has no path"))?;
    while let Some(segment) = segments.next() {
        if segment == "d" {
            if let Some(id) = segments.next().filter(|id| !id.is_empty()) {
                return Ok(id.to_string());
            }
        }
    }
    bail!(
        "Invalid Google Sheets URL format. Expected: \
        https://docs.google.com/spreadsheets/d/SPREADSHEET_ID"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::error_type;
    use tempfile::TempDir;

    async fn key_file(dir: &TempDir) -> PathBuf {
        let path = dir.path().join("key.json");
        utils::write(&path, r#"{"type": "service_account"}"#)
            .await
            .unwrap();
        path
    }

    #[tokio::test]
    async fn test_config_create() {
        let dir = TempDir::new().unwrap();
        let home_dir = dir.path().join("expenses_home");
        let key = key_file(&dir).await;
        let sheet_url = "https://docs.google.com/spreadsheets/d/7KpXm2RfZwNJgs84QhVYno5DU6iM9Wlr3bCzAv1txRpL/edit";
        let sheet = SheetLocation {
            url: Some(sheet_url.to_string()),
            ..SheetLocation::default()
        };

        let config = Config::create(&home_dir, &key, sheet).await.unwrap();

        assert_eq!(Some(sheet_url), config.sheet_url());
        assert_eq!(
            Some("7KpXm2RfZwNJgs84QhVYno5DU6iM9Wlr3bCzAv1txRpL"),
            config.spreadsheet_id()
        );
        assert_eq!(DEFAULT_SPREADSHEET_NAME, config.spreadsheet_name());
        assert_eq!(DEFAULT_WORKSHEET, config.worksheet());
        assert!(home_dir.join(".secrets").is_dir());

        // The key is copied, not moved.
        assert!(key.is_file());
        let copied = utils::read(&config.service_account_path()).await.unwrap();
        assert!(copied.contains("service_account"));
    }

    #[tokio::test]
    async fn test_config_create_then_load() {
        let dir = TempDir::new().unwrap();
        let home_dir = dir.path().join("h");
        let key = key_file(&dir).await;
        let sheet = SheetLocation {
            url: None,
            name: Some("My Money".to_string()),
            worksheet: Some("2025".to_string()),
        };
        let created = Config::create(&home_dir, &key, sheet).await.unwrap();
        let loaded = Config::load(&home_dir).await.unwrap();

        assert_eq!(created.config_path(), loaded.config_path());
        assert_eq!(None, loaded.spreadsheet_id());
        assert_eq!("My Money", loaded.spreadsheet_name());
        assert_eq!("2025", loaded.worksheet());
        assert_eq!(Pacing::default(), loaded.pacing());
    }

    #[tokio::test]
    async fn test_config_create_bad_url_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let home_dir = dir.path().join("never");
        let key = key_file(&dir).await;
        let sheet = SheetLocation {
            url: Some("https://example.com/invalid".to_string()),
            ..SheetLocation::default()
        };
        assert!(Config::create(&home_dir, &key, sheet).await.is_err());
        assert!(!home_dir.exists());
    }

    #[tokio::test]
    async fn test_config_load_missing_home_is_config_error() {
        let dir = TempDir::new().unwrap();
        let e = Config::load(dir.path().join("nope")).await.unwrap_err();
        assert_eq!(error_type(&e), Some(ErrorType::Config));
    }

    #[test]
    fn test_config_file_default() {
        let config = ConfigFile::default();
        assert_eq!(config.sheet_url, None);
        assert_eq!(config.spreadsheet_name, DEFAULT_SPREADSHEET_NAME);
        assert_eq!(config.worksheet, DEFAULT_WORKSHEET);
        assert_eq!(
            config.service_account_path(),
            PathBuf::from(SECRETS).join(SERVICE_ACCOUNT_JSON)
        );
    }

    #[tokio::test]
    async fn test_config_file_load_with_minimal_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");

        let json = r#"{
            "app_name": "expenses",
            "config_version": 1
        }"#;
        utils::write(&config_path, json).await.unwrap();

        let config = ConfigFile::load(&config_path).await.unwrap();
        assert_eq!(config, ConfigFile::default());
    }

    #[tokio::test]
    async fn test_config_file_load_invalid_app_name() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");

        let json = r#"{
            "app_name": "budget",
            "config_version": 1
        }"#;
        utils::write(&config_path, json).await.unwrap();

        let result = ConfigFile::load(&config_path).await;
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Invalid app_name"));
    }

    #[tokio::test]
    async fn test_config_file_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");
        let original = ConfigFile {
            sheet_url: Some("https://docs.google.com/spreadsheets/d/test123".to_string()),
            service_account_path: Some(PathBuf::from("/etc/expenses/key.json")),
            pacing: Pacing::none(),
            ..ConfigFile::default()
        };
        original.save(&config_path).await.unwrap();
        let loaded = ConfigFile::load(&config_path).await.unwrap();
        assert_eq!(original, loaded);
    }

    #[test]
    fn test_config_file_serialization_omits_none_fields() {
        let json = serde_json::to_string(&ConfigFile::default()).unwrap();
        assert!(!json.contains("sheet_url"));
        assert!(!json.contains("service_account_path"));
    }

    #[test]
    fn test_extract_spreadsheet_id() {
        let url = "https://docs.google.com/spreadsheets/d/7KpXm2RfZwNJgs84QhVYno5DU6iM9Wlr3bCzAv1txRpL/edit";
        let id = extract_spreadsheet_id(url).unwrap();
        assert_eq!(id, "7KpXm2RfZwNJgs84QhVYno5DU6iM9Wlr3bCzAv1txRpL");

        let with_query = "https://docs.google.com/spreadsheets/d/ABC123?foo=bar#gid=0";
        assert_eq!(extract_spreadsheet_id(with_query).unwrap(), "ABC123");

        assert!(extract_spreadsheet_id("https://example.com/invalid").is_err());
        assert!(extract_spreadsheet_id("https://example.com/d/").is_err());
        assert!(extract_spreadsheet_id("not a url").is_err());
    }
}
