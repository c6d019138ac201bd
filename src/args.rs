//! These structs provide the CLI interface for the expenses CLI.

use clap::{Parser, Subcommand};
use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::error;
use tracing_subscriber::filter::LevelFilter;

/// expenses: A command-line tool for tracking personal expenses in a Google sheet.
///
/// Expenses are entered one at a time through an interactive menu, validated, and appended as rows
/// to a worksheet in a Google spreadsheet. They can be listed in the order they were entered or
/// summed by category.
///
/// The program authenticates as a Google service account. Create one in the Google Cloud console,
/// enable the Sheets and Drive APIs for its project, download its JSON key, and share your
/// spreadsheet with the service account's email address.
#[derive(Debug, Parser, Clone)]
pub struct Args {
    #[clap(flatten)]
    common: Common,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    pub fn new(common: Common, command: Command) -> Self {
        Self { common, command }
    }

    pub fn common(&self) -> &Common {
        &self.common
    }

    pub fn command(&self) -> &Command {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create the data directory and initialize the configuration file.
    ///
    /// This is the first command you should run. You need a few things ready beforehand.
    ///
    /// - Decide what directory you want to store the configuration in and pass it as
    ///   --expenses-home. By default, it will be $HOME/expenses.
    ///
    /// - Download the JSON key of a Google service account and pass it as --service-account.
    ///
    /// - Either pass the URL of your spreadsheet as --sheet-url, or make sure the spreadsheet is
    ///   titled "expense_tracker" (or whatever you pass as --spreadsheet-name) and is shared with
    ///   the service account.
    Init(InitArgs),
    /// Check that the credentials work and that the worksheet can be read.
    Verify,
    /// Start the interactive expense tracker.
    Run(RunArgs),
}

/// Arguments common to all subcommands.
#[derive(Debug, Parser, Clone)]
pub struct Common {
    /// The logging verbosity. One of, from least to most verbose:
    /// off, error, warn, info, debug, trace
    ///
    /// Logs are written to stderr. This can be overridden by RUST_LOG.
    #[arg(long, default_value_t = LevelFilter::WARN)]
    log_level: LevelFilter,

    /// The directory where the configuration and credentials are held. Defaults to ~/expenses
    #[arg(long, env = "EXPENSES_HOME", default_value_t = default_expenses_home())]
    expenses_home: DisplayPath,
}

impl Common {
    pub fn new(log_level: LevelFilter, expenses_home: PathBuf) -> Self {
        Self {
            log_level,
            expenses_home: expenses_home.into(),
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn expenses_home(&self) -> &DisplayPath {
        &self.expenses_home
    }
}

/// (Not shown): Args for the `expenses init` command.
#[derive(Debug, Parser, Clone)]
pub struct InitArgs {
    /// The path to the downloaded service account key. This file will be copied to the default
    /// secrets location in the main data directory.
    #[arg(long)]
    service_account: PathBuf,

    /// The URL to your Google sheet. It looks like this:
    /// https://docs.google.com/spreadsheets/d/1a7Km9FxQwRbPt82JvN4LzYpH5OcGnWsT6iDuE3VhMjX
    #[arg(long)]
    sheet_url: Option<String>,

    /// The title of the spreadsheet, used to find it when --sheet-url is not given.
    #[arg(long)]
    spreadsheet_name: Option<String>,

    /// The name of the worksheet (tab) that holds the expenses.
    #[arg(long)]
    worksheet: Option<String>,
}

impl InitArgs {
    pub fn new(service_account: impl Into<PathBuf>) -> Self {
        Self {
            service_account: service_account.into(),
            sheet_url: None,
            spreadsheet_name: None,
            worksheet: None,
        }
    }

    pub fn with_sheet_url(mut self, sheet_url: impl Into<String>) -> Self {
        self.sheet_url = Some(sheet_url.into());
        self
    }

    pub fn service_account(&self) -> &Path {
        &self.service_account
    }

    pub fn sheet_url(&self) -> Option<&str> {
        self.sheet_url.as_deref()
    }

    pub fn spreadsheet_name(&self) -> Option<&str> {
        self.spreadsheet_name.as_deref()
    }

    pub fn worksheet(&self) -> Option<&str> {
        self.worksheet.as_deref()
    }
}

/// (Not shown): Args for the `expenses run` command.
#[derive(Debug, Parser, Clone, Default)]
pub struct RunArgs {
    /// Turn off the typing effect, loading pauses and screen clearing.
    #[arg(long)]
    no_effects: bool,
}

impl RunArgs {
    pub fn new(no_effects: bool) -> Self {
        Self { no_effects }
    }

    pub fn no_effects(&self) -> bool {
        self.no_effects
    }
}

fn default_expenses_home() -> DisplayPath {
    DisplayPath(match dirs::home_dir() {
        Some(home) => home.join("expenses"),
        None => {
            error!(
                "There was an error when trying to get your home directory. You can get around \
                this by providing --expenses-home or EXPENSES_HOME instead of relying on the \
                default directory. If you continue using the program right now, you may have \
                problems!",
            );
            PathBuf::from("expenses")
        }
    })
}

#[derive(Debug, Default, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct DisplayPath(PathBuf);

impl From<PathBuf> for DisplayPath {
    fn from(value: PathBuf) -> Self {
        DisplayPath(value)
    }
}

impl Deref for DisplayPath {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<Path> for DisplayPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl Display for DisplayPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_string_lossy())
    }
}

impl FromStr for DisplayPath {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(PathBuf::from(s)))
    }
}

impl DisplayPath {
    pub fn path(&self) -> &Path {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run() {
        let args = Args::parse_from([
            "expenses",
            "--expenses-home",
            "/tmp/x",
            "--log-level",
            "debug",
            "run",
            "--no-effects",
        ]);
        assert_eq!(args.common().expenses_home().path(), Path::new("/tmp/x"));
        assert_eq!(args.common().log_level(), LevelFilter::DEBUG);
        match args.command() {
            Command::Run(run) => assert!(run.no_effects()),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_parse_init() {
        let args = Args::parse_from([
            "expenses",
            "init",
            "--service-account",
            "key.json",
            "--spreadsheet-name",
            "Budget",
        ]);
        assert_eq!(args.common().log_level(), LevelFilter::WARN);
        match args.command() {
            Command::Init(init) => {
                assert_eq!(init.service_account(), Path::new("key.json"));
                assert_eq!(init.sheet_url(), None);
                assert_eq!(init.spreadsheet_name(), Some("Budget"));
                assert_eq!(init.worksheet(), None);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_init_requires_service_account() {
        assert!(Args::try_parse_from(["expenses", "init"]).is_err());
    }
}
