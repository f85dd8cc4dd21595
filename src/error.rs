//! Error types for the VM control agent

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("failed to launch command '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("command '{command}' still failing after {attempts} attempts")]
    RetriesExhausted { command: String, attempts: u32 },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
