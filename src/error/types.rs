//! Error types
//!
//! Defines per-connection, handshake and process-level error types.

use std::io;

use thiserror::Error;
use tokio_tungstenite::tungstenite;
use tokio_tungstenite::tungstenite::http::StatusCode;

/// Failure while receiving from or sending to one open connection
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("transport error: {0}")]
    Transport(#[from] tungstenite::Error),

    #[error("unsupported {0} frame")]
    UnsupportedFrame(&'static str),
}

/// Failure while upgrading a TCP stream to a relay connection
#[derive(Debug, Error)]
pub enum HandshakeError {
    #[error("no route for path {0}")]
    UnknownPath(String),

    #[error("invalid user id in path {0}")]
    InvalidUserId(String),

    #[error("origin {0} is not allowed")]
    OriginNotAllowed(String),

    #[error("websocket handshake failed: {0}")]
    Protocol(#[from] tungstenite::Error),
}

impl HandshakeError {
    /// HTTP status sent back when the upgrade is refused
    pub fn status(&self) -> StatusCode {
        match self {
            HandshakeError::UnknownPath(_) | HandshakeError::InvalidUserId(_) => {
                StatusCode::NOT_FOUND
            }
            HandshakeError::OriginNotAllowed(_) => StatusCode::FORBIDDEN,
            HandshakeError::Protocol(_) => StatusCode::BAD_REQUEST,
        }
    }
}

/// Process-level relay error
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("handshake error: {0}")]
    Handshake(#[from] HandshakeError),

    #[error("connection error: {0}")]
    Connection(#[from] ConnectionError),
}
