//! Error types for the clock client

use thiserror::Error;

/// Main error type for the clock client
#[derive(Error, Debug)]
pub enum ClockError {
    #[error("Request timed out after {0} ms")]
    Timeout(u64),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Unknown event: {0}")]
    UnknownEvent(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Shutdown error: {0}")]
    ShutdownError(String),
}

impl From<serde_json::Error> for ClockError {
    fn from(err: serde_json::Error) -> Self {
        ClockError::ParseError(err.to_string())
    }
}

impl From<reqwest::Error> for ClockError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ClockError::ParseError(err.to_string())
        } else {
            ClockError::NetworkError(err.to_string())
        }
    }
}

impl From<url::ParseError> for ClockError {
    fn from(err: url::ParseError) -> Self {
        ClockError::ConfigError(format!("invalid device URL: {}", err))
    }
}

impl ClockError {
    /// Whether this error came from talking to the device
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            ClockError::Timeout(_) | ClockError::NetworkError(_) | ClockError::ParseError(_)
        )
    }
}
