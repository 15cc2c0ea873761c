//! Error handling for the feed pipeline

use thiserror::Error;

/// Inbound frame errors
#[derive(Error, Debug)]
pub enum FrameError {
    #[error("Malformed feed payload: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Websocket connection errors
#[derive(Error, Debug)]
pub enum ConnectionError {
    #[error("Failed to connect to {endpoint}: {reason}")]
    Connect { endpoint: String, reason: String },

    #[error("Connection attempt timed out after {0}ms")]
    Timeout(u64),

    #[error("Subscription handshake failed: {0}")]
    Handshake(String),

    #[error("Socket error: {0}")]
    Socket(String),

    #[error("Not connected")]
    NotConnected,
}

/// List store write failures
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("List store unavailable: {0}")]
    Unavailable(String),

    #[error("Update for {mint} rejected: {reason}")]
    Rejected { mint: String, reason: String },
}

/// General application error
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Connection error: {0}")]
    Connection(#[from] ConnectionError),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl From<FrameError> for AppError {
    fn from(err: FrameError) -> Self {
        AppError::Unknown(err.to_string())
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        AppError::Unknown(err.to_string())
    }
}
