//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with help text.

use miette::Diagnostic;
use thiserror::Error;

use pse_grid_config::ConfigError;
use pse_grid_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const CONFIG: i32 = 3;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Upstream ─────────────────────────────────────────────────────
    #[error("Could not refresh grid data from {url}")]
    #[diagnostic(
        code(pse_grid::refresh_failed),
        help(
            "{reason}\n\
             Check network access to the endpoint, or point --endpoint at a reachable mirror."
        )
    )]
    RefreshFailed { url: String, reason: String },

    #[error("PSE endpoint timed out")]
    #[diagnostic(
        code(pse_grid::timeout),
        help("{reason}\nIncrease the limit with --timeout or http.timeout in the config file.")
    )]
    Timeout { reason: String },

    #[error("PSE endpoint returned an unreadable response: {message}")]
    #[diagnostic(
        code(pse_grid::invalid_response),
        help("The endpoint must serve the transmission-map JSON document.")
    )]
    InvalidResponse { message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(pse_grid::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Could not load configuration: {message}")]
    #[diagnostic(
        code(pse_grid::config),
        help("Fix or remove the config file at: {path}")
    )]
    Config { message: String, path: String },

    // ── Output ────────────────────────────────────────────────────────
    #[error("Failed to render output: {0}")]
    #[diagnostic(code(pse_grid::render))]
    Render(String),

    #[error("Internal error: {0}")]
    #[diagnostic(code(pse_grid::internal))]
    Internal(String),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::RefreshFailed { .. } => exit_code::CONNECTION,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::Validation { .. } => exit_code::USAGE,
            Self::Config { .. } => exit_code::CONFIG,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Transport { url, reason } => CliError::RefreshFailed { url, reason },
            CoreError::Timeout { reason } => CliError::Timeout { reason },
            CoreError::Decode { message } => CliError::InvalidResponse { message },
            CoreError::Config { message } => CliError::Validation {
                field: "options".into(),
                reason: message,
            },
            other @ (CoreError::Schema { .. }
            | CoreError::NoData
            | CoreError::ServiceNotFound { .. }
            | CoreError::ServiceConflict { .. }
            | CoreError::Internal(_)) => CliError::Internal(other.to_string()),
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            other => CliError::Config {
                message: other.to_string(),
                path: pse_grid_config::config_path().display().to_string(),
            },
        }
    }
}
