// ── Core error types ──
//
// User-facing errors from pse-grid-core. Consumers never see reqwest or
// serde_json failures directly: the `From<pse_grid_api::Error>` impl
// translates transport-layer errors into domain-appropriate variants.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Fetch errors ─────────────────────────────────────────────────
    #[error("Cannot reach PSE endpoint {url}: {reason}")]
    Transport { url: String, reason: String },

    #[error("PSE endpoint timed out: {reason}")]
    Timeout { reason: String },

    #[error("PSE response could not be decoded: {message}")]
    Decode { message: String },

    // ── Read errors ──────────────────────────────────────────────────
    #[error("Unexpected payload at '{path}': {reason}")]
    Schema { path: String, reason: String },

    #[error("No grid data has been fetched yet")]
    NoData,

    // ── Host errors ──────────────────────────────────────────────────
    #[error("Service {domain}.{service} is not registered")]
    ServiceNotFound { domain: String, service: String },

    #[error("Service {domain}.{service} is already registered")]
    ServiceConflict { domain: String, service: String },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Build a schema error for a missing key path.
    pub(crate) fn missing(path: impl Into<String>) -> Self {
        Self::Schema {
            path: path.into(),
            reason: "key not present".into(),
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<pse_grid_api::Error> for CoreError {
    fn from(err: pse_grid_api::Error) -> Self {
        match err {
            pse_grid_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout {
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Transport {
                        url: e
                            .url()
                            .map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                }
            }
            pse_grid_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            pse_grid_api::Error::Client(reason) => CoreError::Internal(reason),
            pse_grid_api::Error::Decode { message, body: _ } => CoreError::Decode { message },
        }
    }
}
