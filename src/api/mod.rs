//! Access to the Google spreadsheet that stores the expenses.
//!
//! The rest of the program only sees the `Sheet` trait. `Mode::Google` talks to the real Google
//! Sheets API, `Mode::Testing` uses an in-memory `TestSheet` so the whole program can run without
//! credentials.

mod auth;
mod google_sheet;
mod test_sheet;

use crate::{Config, Result};
use google_sheet::GoogleSheet;
use tracing::debug;

pub(crate) use auth::TokenProvider;
pub use test_sheet::TestSheet;
#[cfg(test)]
pub use test_sheet::TestSheetState;

/// The scopes requested for the service account: read/write access to spreadsheets, and Drive
/// access so that a spreadsheet can be found by its title.
const OAUTH_SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/spreadsheets",
    "https://www.googleapis.com/auth/drive.file",
    "https://www.googleapis.com/auth/drive",
];

/// When this environment variable is set and non-empty, `Mode::from_env` returns `Mode::Testing`.
pub const TEST_MODE_ENV: &str = "EXPENSES_IN_TEST_MODE";

/// Which `Sheet` implementation to use.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq)]
pub enum Mode {
    #[default]
    Google,
    Testing,
}

impl Mode {
    pub fn from_env() -> Self {
        match std::env::var(TEST_MODE_ENV) {
            Ok(value) if !value.is_empty() => Mode::Testing,
            _ => Mode::Google,
        }
    }
}

/// The operations the program needs from a spreadsheet. Worksheets (tabs) are addressed by name.
#[async_trait::async_trait]
pub trait Sheet {
    /// Returns every non-empty row of the worksheet, including its header row, in storage order.
    async fn get(&mut self, worksheet: &str) -> Result<Vec<Vec<String>>>;

    /// Appends `rows` after the last row of the worksheet.
    async fn append(&mut self, worksheet: &str, rows: &[Vec<String>]) -> Result<()>;
}

/// Creates the `Sheet` client for `mode`.
pub async fn sheet(config: &Config, mode: Mode) -> Result<Box<dyn Sheet + Send>> {
    debug!("Creating a {mode:?} sheet client");
    Ok(match mode {
        Mode::Google => {
            let token_provider = TokenProvider::load(config.service_account_path()).await?;
            Box::new(GoogleSheet::new(config, token_provider).await?)
        }
        Mode::Testing => Box::new(TestSheet::seeded(
            test_sheet_key(config),
            config.worksheet(),
        )?),
    })
}

/// The key under which the in-memory data for `config` is stored.
pub fn test_sheet_key(config: &Config) -> String {
    config
        .spreadsheet_id()
        .unwrap_or_else(|| config.spreadsheet_name())
        .to_string()
}

