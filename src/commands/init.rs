use crate::args::InitArgs;
use crate::commands::Out;
use crate::config::SheetLocation;
use crate::error::{ErrorType, IntoResult};
use crate::{Config, Result};
use anyhow::Context;
use std::path::Path;

/// Creates the data directory, its subdirectories and:
/// - Creates an initial `config.json` file describing where the expenses are stored
/// - Copies the service account key into its default location in the data dir.
///
/// # Arguments
/// - `expenses_home` - The directory that will be the root of data directory, e.g.
///   `$HOME/expenses`
/// - `args` - The service account key path and, optionally, the sheet URL, spreadsheet title and
///   worksheet name.
///
/// # Errors
/// - Returns an error if the sheet URL is malformed or any file operations fail.
pub async fn init(expenses_home: &Path, args: &InitArgs) -> Result<Out<()>> {
    let sheet = SheetLocation {
        url: args.sheet_url().map(str::to_string),
        name: args.spreadsheet_name().map(str::to_string),
        worksheet: args.worksheet().map(str::to_string),
    };
    let config = Config::create(expenses_home, args.service_account(), sheet)
        .await
        .context("Unable to create the data directory and configs")
        .pub_result(ErrorType::Config)?;
    Ok(format!(
        "Successfully created the expenses directory and config at {}",
        config.config_path().display()
    )
    .into())
}
