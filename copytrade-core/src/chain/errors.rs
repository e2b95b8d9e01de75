// chain/errors.rs

use thiserror::Error;

/// Error types for chain reads
#[derive(Error, Debug)]
pub enum ChainError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Data parsing error: {0}")]
    ParseError(String),

    #[error("Value does not fit: {0}")]
    Overflow(String),
}

impl From<reqwest::Error> for ChainError {
    fn from(err: reqwest::Error) -> Self {
        ChainError::NetworkError(err.to_string())
    }
}

impl From<serde_json::Error> for ChainError {
    fn from(err: serde_json::Error) -> Self {
        ChainError::ParseError(err.to_string())
    }
}

impl From<hex::FromHexError> for ChainError {
    fn from(err: hex::FromHexError) -> Self {
        ChainError::ParseError(err.to_string())
    }
}
