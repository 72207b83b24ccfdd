//! Chat envelope and its wire codec
//!
//! Every frame the relay sends is a JSON object with exactly three string
//! fields: `ts`, `uid` and `msg`. Inbound frames are plain text (a name
//! claim or a chat line) and are never decoded.

use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::timestamp;

/// Server → Client envelope
///
/// Built fresh for each broadcast or rejection notice and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChatEnvelope {
    /// Server time at send, `yyyy-mm-dd hh:mm:ss`
    pub ts: String,
    /// Display name of the author
    pub uid: String,
    /// Message text
    pub msg: String,
}

impl ChatEnvelope {
    /// Create an envelope stamped with the current server time
    pub fn new(uid: impl Into<String>, msg: impl Into<String>) -> Self {
        Self {
            ts: timestamp::now(),
            uid: uid.into(),
            msg: msg.into(),
        }
    }

    /// Notice sent to a connection whose name claim collided
    pub fn name_taken(name: &str) -> Self {
        Self::new(
            name,
            format!("Error: the user name {} is already in use!", name),
        )
    }
}

/// Serialize an envelope to its wire text
pub fn encode(envelope: &ChatEnvelope) -> Result<String, AppError> {
    Ok(serde_json::to_string(envelope)?)
}

/// Parse wire text into an envelope
///
/// Fails on missing fields, non-string values and unknown fields.
pub fn decode(text: &str) -> Result<ChatEnvelope, AppError> {
    Ok(serde_json::from_str(text)?)
}
