use crate::api::{self, Mode};
use crate::commands::Out;
use crate::gateway::Gateway;
use crate::model::Expenses;
use crate::view::unreadable_rows;
use crate::{Config, Result};
use anyhow::Context;
use serde::Serialize;
use tracing::debug;

/// What `verify` found in the worksheet.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct Verification {
    pub worksheet: String,
    pub has_header: bool,
    pub expenses: usize,
    pub unreadable: usize,
}

/// Connects to the spreadsheet and reads the worksheet without changing anything.
///
/// In `Mode::Google` this proves that the service account key is accepted, that the spreadsheet
/// can be found and has been shared with the service account, and that the worksheet exists.
///
/// # Errors
/// Returns the failure of whichever of those steps did not work.
pub async fn verify(config: &Config, mode: Mode) -> Result<Out<Verification>> {
    let sheet = api::sheet(config, mode).await?;
    let mut gateway = Gateway::new(sheet, config.worksheet());
    let rows = gateway
        .read_all()
        .await
        .context("Unable to read the expenses worksheet")?;
    let expenses = Expenses::parse(rows);
    let verification = Verification {
        worksheet: config.worksheet().to_string(),
        has_header: expenses.header().is_some(),
        expenses: expenses.len(),
        unreadable: unreadable_rows(&expenses),
    };
    debug!("{verification:?}");

    let mut message = format!(
        "Worksheet '{}' is readable and has {} expense rows",
        verification.worksheet, verification.expenses
    );
    if verification.unreadable > 0 {
        message.push_str(&format!(
            ", {} of which cannot be read as expenses",
            verification.unreadable
        ));
    }
    Ok(Out::new(message, verification))
}
