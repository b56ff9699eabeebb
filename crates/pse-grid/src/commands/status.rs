//! `status`: fetch once and print every sensor.

use tracing::debug;

use pse_grid_core::{ConfigEntry, Host, RefreshOutcome, setup_entry};

use crate::cli::GlobalOpts;
use crate::config::Settings;
use crate::error::CliError;
use crate::output;

use super::{CLI_ENTRY_ID, render_sensors};

pub async fn handle(settings: &Settings, global: &GlobalOpts) -> Result<(), CliError> {
    // The host never reaches `Running`, so the scheduler stays idle and
    // the only fetch is the one requested below.
    let host = Host::new();
    let entry = ConfigEntry::new(CLI_ENTRY_ID, settings.entry_options(None));
    let instance = setup_entry(&host, entry, settings.client()?).await?;

    let outcome = instance.coordinator().request_refresh().await;
    debug!(?outcome, "status refresh finished");

    let result = match outcome {
        RefreshOutcome::Updated { .. } => match render_sensors(&instance, settings) {
            Ok(out) => {
                output::print_output(&out, global.quiet);
                Ok(())
            }
            Err(e) => Err(e),
        },
        RefreshOutcome::Failed { reason } => Err(CliError::RefreshFailed {
            url: settings.endpoint.to_string(),
            reason,
        }),
    };

    instance.unload().await;
    result
}
