//! Configuration for the PSE grid tools.
//!
//! A TOML file in the platform config directory layered under
//! `PSEGRID_`-prefixed environment variables, and translation into the
//! runtime types of `pse_grid_core`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use pse_grid_core::{BASE_API_URL, EntryOptions};

/// Environment variable that overrides the config file location.
pub const CONFIG_PATH_ENV: &str = "PSEGRID_CONFIG";

const ENV_PREFIX: &str = "PSEGRID_";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub http: HttpSettings,

    #[serde(default)]
    pub poll: PollSettings,

    #[serde(default)]
    pub defaults: Defaults,
}

/// Upstream endpoint and transport limits.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct HttpSettings {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            timeout: default_timeout(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct PollSettings {
    /// Minutes between scheduled refreshes.
    #[serde(default = "default_interval")]
    pub interval: u64,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: default_interval(),
        }
    }
}

/// CLI presentation defaults.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
        }
    }
}

fn default_endpoint() -> String {
    BASE_API_URL.into()
}
fn default_timeout() -> u64 {
    30
}
fn default_interval() -> u64 {
    60
}
fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}

// ── Validation & translation ────────────────────────────────────────

impl Config {
    /// Reject values the runtime cannot use.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll.interval == 0 {
            return Err(ConfigError::Validation {
                field: "poll.interval".into(),
                reason: "must be at least 1 minute".into(),
            });
        }
        if self.http.timeout == 0 {
            return Err(ConfigError::Validation {
                field: "http.timeout".into(),
                reason: "must be at least 1 second".into(),
            });
        }
        self.endpoint_url()?;
        Ok(())
    }

    /// The configured endpoint as an http(s) URL.
    pub fn endpoint_url(&self) -> Result<Url, ConfigError> {
        parse_endpoint(&self.http.endpoint)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.http.timeout)
    }

    pub fn scan_interval(&self) -> Duration {
        Duration::from_secs(self.poll.interval.saturating_mul(60))
    }

    pub fn entry_options(&self) -> EntryOptions {
        EntryOptions {
            scan_interval: self.scan_interval(),
        }
    }

    /// Pretty TOML, as it would appear in the config file.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

/// Parse and check an endpoint URL.
pub fn parse_endpoint(raw: &str) -> Result<Url, ConfigError> {
    let url: Url = raw.parse().map_err(|e| ConfigError::Validation {
        field: "http.endpoint".into(),
        reason: format!("invalid URL '{raw}': {e}"),
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ConfigError::Validation {
            field: "http.endpoint".into(),
            reason: format!("unsupported scheme '{other}', expected http or https"),
        }),
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path: `PSEGRID_CONFIG`, then platform conventions.
pub fn config_path() -> PathBuf {
    if let Some(path) = std::env::var_os(CONFIG_PATH_ENV) {
        return PathBuf::from(path);
    }
    ProjectDirs::from("pl", "pse-grid", "pse-grid").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("pse-grid");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Defaults, then the TOML file at `path`, then `PSEGRID_*` variables.
///
/// Nested keys use `_` as separator: `PSEGRID_POLL_INTERVAL=15`.
pub fn figment(path: &Path) -> Figment {
    Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("_"))
}

/// Load and validate the Config from file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load and validate the Config, reading the file at `path`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let config: Config = figment(path).extract()?;
    config.validate()?;
    Ok(config)
}
