//! Resolve effective settings: config file + environment, then CLI flags.

use std::time::Duration;

use clap::ValueEnum;
use url::Url;

use pse_grid_config::{Config, parse_endpoint};
use pse_grid_core::{EntryOptions, PseClient, TransportConfig};

use crate::cli::{ColorMode, GlobalOpts, OutputFormat};
use crate::error::CliError;

/// Everything a command needs after all layers are merged.
#[derive(Debug)]
pub struct Settings {
    pub config: Config,
    pub endpoint: Url,
    pub timeout: Duration,
    pub output: OutputFormat,
    pub color: ColorMode,
}

impl Settings {
    pub fn client(&self) -> Result<PseClient, CliError> {
        PseClient::new(
            self.endpoint.clone(),
            &TransportConfig::with_timeout(self.timeout),
        )
        .map_err(|e| CliError::from(pse_grid_core::CoreError::from(e)))
    }

    /// Entry options, with an optional interval override in minutes.
    pub fn entry_options(&self, interval_minutes: Option<u64>) -> EntryOptions {
        interval_minutes.map_or_else(|| self.config.entry_options(), EntryOptions::from_minutes)
    }
}

/// Load the config and apply `global` overrides on top.
pub fn resolve(global: &GlobalOpts) -> Result<Settings, CliError> {
    let config = pse_grid_config::load_config()?;
    resolve_with(config, global)
}

pub fn resolve_with(config: Config, global: &GlobalOpts) -> Result<Settings, CliError> {
    let endpoint = match global.endpoint.as_deref() {
        Some(raw) => parse_endpoint(raw)?,
        None => config.endpoint_url()?,
    };

    let timeout = match global.timeout {
        Some(0) => {
            return Err(CliError::Validation {
                field: "timeout".into(),
                reason: "must be at least 1 second".into(),
            });
        }
        Some(secs) => Duration::from_secs(secs),
        None => config.timeout(),
    };

    let output = match global.output {
        Some(format) => format,
        None => parse_named("defaults.output", &config.defaults.output)?,
    };
    let color = match global.color {
        Some(mode) => mode,
        None => parse_named("defaults.color", &config.defaults.color)?,
    };

    Ok(Settings {
        config,
        endpoint,
        timeout,
        output,
        color,
    })
}

/// Output format for commands that run before settings can be resolved.
pub fn output_format(global: &GlobalOpts) -> OutputFormat {
    global.output.unwrap_or(OutputFormat::Table)
}

fn parse_named<T: ValueEnum>(field: &str, raw: &str) -> Result<T, CliError> {
    T::from_str(raw, true).map_err(|reason| CliError::Validation {
        field: field.into(),
        reason,
    })
}
