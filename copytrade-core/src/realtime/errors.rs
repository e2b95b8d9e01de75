// realtime/errors.rs

use thiserror::Error;

/// Error types for the push-event client and its transports
#[derive(Error, Debug)]
pub enum RealtimeError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("WebSocket error: {0}")]
    WebSocketError(String),

    #[error("Data parsing error: {0}")]
    ParseError(String),

    #[error("Connection is not open")]
    NotConnected,

    #[error("No async runtime available: {0}")]
    Runtime(String),

    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),
}

impl From<serde_json::Error> for RealtimeError {
    fn from(err: serde_json::Error) -> Self {
        RealtimeError::ParseError(err.to_string())
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for RealtimeError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        RealtimeError::WebSocketError(err.to_string())
    }
}

impl From<reqwest::Error> for RealtimeError {
    fn from(err: reqwest::Error) -> Self {
        RealtimeError::NetworkError(err.to_string())
    }
}

impl From<url::ParseError> for RealtimeError {
    fn from(err: url::ParseError) -> Self {
        RealtimeError::InvalidEndpoint(err.to_string())
    }
}
