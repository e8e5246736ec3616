//! Errors raised by transport implementations.

use agentic_types::ErrorKind;
use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum TransportError {
    #[error("transport unavailable: {0}")]
    Unavailable(String),

    #[error("protocol violation: {0}")]
    ProtocolViolation(String),

    #[error("timeout: {0}")]
    Timeout(String),

    #[error("remote error: {0}")]
    RemoteError(String),

    #[error("json error: {0}")]
    Json(String),

    #[error("io error: {0}")]
    Io(String),
}

impl TransportError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TransportError::Unavailable(_) => ErrorKind::TransportUnavailable,
            TransportError::ProtocolViolation(_) => ErrorKind::ProtocolViolation,
            TransportError::Timeout(_) => ErrorKind::Timeout,
            TransportError::RemoteError(_) => ErrorKind::RemoteError,
            TransportError::Json(_) | TransportError::Io(_) => ErrorKind::ProtocolViolation,
        }
    }
}

impl From<serde_json::Error> for TransportError {
    fn from(e: serde_json::Error) -> Self {
        TransportError::Json(e.to_string())
    }
}

impl From<std::io::Error> for TransportError {
    fn from(e: std::io::Error) -> Self {
        TransportError::Io(e.to_string())
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            TransportError::Timeout(e.to_string())
        } else {
            TransportError::Unavailable(e.to_string())
        }
    }
}
