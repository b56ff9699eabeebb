//! Command handlers and the shared sensor rendering.

pub mod config_cmd;
pub mod status;
pub mod watch;

use chrono::{DateTime, Utc};
use tabled::Tabled;

use pse_grid_core::{EntityReport, IntegrationInstance};

use crate::config::Settings;
use crate::error::CliError;
use crate::output;

/// Entry id of the single instance the CLI runs.
pub const CLI_ENTRY_ID: &str = "pse-grid-cli";

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct SensorRow {
    #[tabled(rename = "Sensor")]
    name: String,
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "State")]
    state: String,
    #[tabled(rename = "Unit")]
    unit: String,
    #[tabled(rename = "Available")]
    available: String,
}

impl SensorRow {
    fn from_report(report: &EntityReport, color: bool) -> Self {
        let state = match (&report.state, &report.error) {
            (Some(state), _) => state.to_string(),
            (None, Some(error)) => output::dim(error, color),
            (None, None) => "-".into(),
        };
        Self {
            name: report.name.into(),
            id: report.unique_id.into(),
            state,
            unit: report.unit.unwrap_or("").into(),
            available: output::status_marker(
                report.available,
                if report.available { "yes" } else { "no" },
                color,
            ),
        }
    }
}

fn plain_line(report: &EntityReport) -> String {
    match &report.state {
        Some(state) => format!("{}={state}", report.unique_id),
        None => format!("{}=", report.unique_id),
    }
}

/// Capture every entity of `instance` and render it in the chosen format.
pub fn render_sensors(
    instance: &IntegrationInstance,
    settings: &Settings,
) -> Result<String, CliError> {
    let reports: Vec<EntityReport> = instance
        .entities()
        .iter()
        .map(|entity| EntityReport::capture(entity.as_ref()))
        .collect();

    let color = output::should_color(settings.color);
    let body = output::render_list(
        settings.output,
        &reports,
        |r| SensorRow::from_report(r, color),
        plain_line,
    )?;

    match (settings.output, instance.store().last_refresh()) {
        (crate::cli::OutputFormat::Table, Some(at)) => {
            let footer = fetched_footer(at, settings);
            Ok(format!("{body}\n{}", output::dim(&footer, color)))
        }
        _ => Ok(body),
    }
}

fn fetched_footer(at: DateTime<Utc>, settings: &Settings) -> String {
    format!(
        "Fetched {} from {}",
        at.format("%Y-%m-%d %H:%M:%S UTC"),
        settings.endpoint
    )
}
