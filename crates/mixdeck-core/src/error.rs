// ── Core error types ──
//
// Errors from mixdeck-core. These are NOT API-specific: consumers never see
// reqwest errors or JSON parse failures directly. The
// `From<mixdeck_api::Error>` impl translates transport-layer errors into
// domain-appropriate variants.
//
// Neither a failed load nor a failed update ever reaches the panel as an
// error value; they surface as `ConnectivityState::Simulated` and through
// the update failure hook respectively.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot reach mixer backend at {url}: {reason}")]
    BackendUnreachable { url: String, reason: String },

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("API error: {message}")]
    Api {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// HTTP status attached to this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => *status,
            _ => None,
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<mixdeck_api::Error> for CoreError {
    fn from(err: mixdeck_api::Error) -> Self {
        match err {
            mixdeck_api::Error::Transport(ref e) => {
                if e.is_timeout() || e.is_connect() || e.is_request() {
                    CoreError::BackendUnreachable {
                        url: e
                            .url()
                            .map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            mixdeck_api::Error::Status { status, url } => CoreError::Api {
                message: format!("backend returned HTTP {status} for {url}"),
                status: Some(status),
            },
            mixdeck_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            mixdeck_api::Error::InvalidBaseUrl(url) => CoreError::Config {
                message: format!("Invalid base URL: {url}"),
            },
            mixdeck_api::Error::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Deserialization error: {message}"))
            }
        }
    }
}
