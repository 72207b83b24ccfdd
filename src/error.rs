//! Error types for the relay
//!
//! Defines application-level errors and per-recipient send errors.
//! Uses thiserror for ergonomic error definitions.

use thiserror::Error;

/// Application-level errors
///
/// Covers fatal errors (startup, connection termination) and
/// protocol errors that are answered on the offending connection.
#[derive(Debug, Error)]
pub enum AppError {
    /// WebSocket protocol error (fatal for the connection)
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// Envelope serialization error, or a payload not shaped like an envelope
    #[error("Malformed envelope: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error (fatal)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Listen address could not be bound (fatal to startup)
    #[error("Cannot listen on {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// Channel send error (fatal - registry actor is gone)
    #[error("Channel send error")]
    ChannelSend,

    /// Display name is held by another connection
    #[error("Name already in use: {0}")]
    NameTaken(String),

    /// Connection already claimed a name
    #[error("Connection already registered")]
    AlreadyRegistered,
}

/// Message send errors
///
/// Occurs when a recipient's outbound queue has been closed.
#[derive(Debug, Error)]
pub enum SendError {
    /// The receiving end of the channel has been closed
    #[error("Channel closed")]
    ChannelClosed,
}
