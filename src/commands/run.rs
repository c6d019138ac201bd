use crate::api::{self, Mode};
use crate::args::RunArgs;
use crate::console::{Console, Pacing};
use crate::gateway::Gateway;
use crate::menu::App;
use crate::{Config, Result};
use tracing::info;

/// Runs the interactive expense tracker on the terminal until the user exits or stdin is closed.
///
/// # Errors
/// Returns an error when the spreadsheet cannot be opened, or when a failure that retrying cannot
/// fix (rejected credentials, missing worksheet) happens during the session.
pub async fn run(config: Config, mode: Mode, args: &RunArgs) -> Result<()> {
    let pacing = if args.no_effects() {
        Pacing::none()
    } else {
        config.pacing()
    };
    let sheet = api::sheet(&config, mode).await?;
    let gateway = Gateway::new(sheet, config.worksheet());
    info!(
        "Starting the expense tracker on worksheet '{}'",
        gateway.worksheet()
    );
    App::new(Console::stdio(pacing), gateway).run().await?;
    info!("The expense tracker has exited");
    Ok(())
}
