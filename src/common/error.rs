//! Error types for the harness
//!
//! Only failures of the harness itself are errors. What the server and
//! client processes do after they are launched is never reported here.

use std::io;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the harness
#[derive(Error, Debug)]
pub enum Error {
    // === Process Errors ===
    #[error("No command configured for {var}. Set the {var} environment variable or the [commands] table in the config file")]
    MissingCommand { var: String },

    #[error("Failed to launch {what}: {source}")]
    SpawnFailed {
        what: String,
        #[source]
        source: io::Error,
    },

    #[error("Server did not become ready within {0} seconds")]
    ServerNotReady(u64),

    // === Selection Errors ===
    #[error("Invalid selection: {0}")]
    InvalidSelection(String),

    // === Configuration Errors ===
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    ConfigParse(String),

    // === IO Errors ===
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to read file '{path}': {error}")]
    FileRead { path: String, error: String },

    // === Serialization Errors ===
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a missing command error for an environment variable
    pub fn missing_command(var: &str) -> Self {
        Self::MissingCommand {
            var: var.to_string(),
        }
    }

    /// Create a spawn failure error
    pub fn spawn_failed(what: &str, source: io::Error) -> Self {
        Self::SpawnFailed {
            what: what.to_string(),
            source,
        }
    }
}
