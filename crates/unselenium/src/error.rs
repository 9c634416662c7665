//! Error types for the launcher
//!
//! Flat taxonomy, one variant per failure domain. Construction-phase
//! errors propagate to the caller after partial teardown; `quit` never
//! returns one.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, DriverError>;

#[derive(Debug, Error)]
pub enum DriverError {
    /// A required setting is missing or cannot be resolved.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Could not bind a listener while negotiating an ephemeral port.
    #[error("failed to bind {addr}: {source}")]
    Network {
        addr: String,
        #[source]
        source: io::Error,
    },

    /// An external process could not be started.
    #[error("failed to start {}: {source}", binary.display())]
    Launch {
        binary: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The session handshake with the control process failed.
    #[error("session handshake failed: {0}")]
    Connect(String),

    /// HTTP transport error talking to the control process.
    #[error("transport error: {0}")]
    Http(#[from] reqwest::Error),

    /// A script-level failure. Non-fatal during stealth patching: the
    /// caller logs it and proceeds as if no artifacts were found.
    #[error("script execution failed: {0}")]
    Script(String),
}
