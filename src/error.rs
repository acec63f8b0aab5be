//! Error types for the client
//!
//! Defines connection-level errors, login handshake errors and
//! queue send errors. Uses thiserror for ergonomic error definitions.

use thiserror::Error;

/// Client-level errors
///
/// Everything that can end a run: connection failures, broken
/// internal channels, panicked loop tasks.
#[derive(Debug, Error)]
pub enum ClientError {
    /// WebSocket protocol error (fatal)
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// The connection is closed or was closed by the server
    #[error("Connection closed")]
    ConnectionClosed,

    /// Login handshake failed
    #[error("Login failed: {0}")]
    Auth(#[from] AuthError),

    /// Channel send error (fatal - internal channel broken)
    #[error("Channel send error")]
    ChannelSend,

    /// A pump task panicked or was aborted
    #[error("Task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Login handshake errors
///
/// Never fatal to the connection; the session just stays unauthenticated.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Transport-level HTTP failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Login endpoint answered with a non-success status
    #[error("Login request failed with status {0}")]
    Status(u16),

    /// Response body is not the expected JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Response body parsed but carries no assertion
    #[error("Invalid login response: {0}")]
    InvalidResponse(String),

    /// Server refused the credentials
    #[error("Login rejected: {0}")]
    Rejected(String),
}

/// Queue send errors
///
/// Occurs when enqueueing onto a queue whose consumer has gone away.
#[derive(Debug, Error)]
pub enum SendError {
    /// The receiving end of the channel has been closed
    #[error("Channel closed")]
    ChannelClosed,
}

impl From<SendError> for ClientError {
    fn from(_: SendError) -> Self {
        ClientError::ChannelSend
    }
}
