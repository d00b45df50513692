use alloy_primitives::hex::FromHexError;
use sc_evm::InitializationError;

/// Errors of the `sc-evme` commands.
#[derive(Debug, thiserror::Error)]
pub enum EvmeError {
    /// A file could not be read or written.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A hex argument could not be decoded.
    #[error("Invalid hex string: {0}")]
    InvalidHex(#[from] FromHexError),

    /// A JSON document could not be read or written.
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The message processors could not be set up in the genesis state.
    #[error("Genesis initialization failed: {0}")]
    Initialization(#[from] InitializationError),

    /// An argument is out of range or inconsistent with another.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type of the `sc-evme` commands.
pub type Result<T> = std::result::Result<T, EvmeError>;
