// ── Core error types ──
//
// User-facing errors from checkpoint-core. Transport-level failures from
// `checkpoint-api` are folded into the coarser Network / UnexpectedStatus /
// Decode categories by the `From` impl below.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Caller errors ────────────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Endpoint errors ──────────────────────────────────────────────
    /// Connection, DNS, TLS or timeout failure. `timed_out` is set when the
    /// request hit its deadline.
    #[error("Network error: {message}")]
    Network { message: String, timed_out: bool },

    #[error("Unexpected HTTP status from check endpoint: {status}")]
    UnexpectedStatus { status: u16 },

    #[error("Failed to decode check response: {message}")]
    Decode { message: String },

    // ── Local state errors ───────────────────────────────────────────
    /// Cache or signature file could not be read or written for a reason
    /// other than "does not exist".
    #[error("Storage error at {}: {source}", path.display())]
    Storage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub(crate) fn storage(path: &Path, source: std::io::Error) -> Self {
        Self::Storage {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Returns `true` if the check endpoint did not answer in time.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Network { timed_out: true, .. })
    }

    /// Returns `true` if a later attempt could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network { .. } => true,
            Self::UnexpectedStatus { status } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<checkpoint_api::Error> for CoreError {
    fn from(err: checkpoint_api::Error) -> Self {
        match err {
            checkpoint_api::Error::Transport(ref e) => {
                let timed_out = e.is_timeout();
                let message = if timed_out {
                    format!("request timed out: {e}")
                } else {
                    e.to_string()
                };
                CoreError::Network { message, timed_out }
            }
            checkpoint_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid endpoint URL: {e}"),
            },
            checkpoint_api::Error::ClientBuild(message) => CoreError::Network {
                message,
                timed_out: false,
            },
            checkpoint_api::Error::UnexpectedStatus { status } => {
                CoreError::UnexpectedStatus { status }
            }
            checkpoint_api::Error::Deserialization { message, body: _ } => {
                CoreError::Decode { message }
            }
        }
    }
}
