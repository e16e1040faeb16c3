//! Error types for keystone crates

use thiserror::Error;

pub type Result<T> = std::result::Result<T, KeystoneError>;

#[derive(Error, Debug)]
pub enum KeystoneError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Telemetry error: {0}")]
    Telemetry(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<std::io::Error> for KeystoneError {
    fn from(err: std::io::Error) -> Self {
        KeystoneError::Internal(err.to_string())
    }
}
