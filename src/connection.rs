//! Connection handle definition
//!
//! The core never touches sockets. It talks to a connection through its
//! outbound queue, which the transport drains into the real link.

use tokio::sync::mpsc;

use crate::error::SendError;
use crate::types::ConnectionId;

/// Instruction for the transport writing to one connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    /// Write a text frame
    Text(String),
    /// Close the link; nothing queued after this is written
    Close,
}

/// Handle to one live connection
///
/// Cheap to clone. Equality is identity-based: two handles are equal
/// iff they refer to the same connection.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    /// Unique identifier for this connection
    pub id: ConnectionId,
    /// Core → transport queue
    sender: mpsc::Sender<Outbound>,
}

impl ConnectionHandle {
    /// Create a handle with the given ID and outbound queue
    pub fn new(id: ConnectionId, sender: mpsc::Sender<Outbound>) -> Self {
        Self { id, sender }
    }

    /// Queue a text frame for this connection
    ///
    /// Waits while the queue is full. Returns an error if the transport
    /// has dropped the receiving end (connection dead).
    pub async fn send(&self, text: String) -> Result<(), SendError> {
        self.sender
            .send(Outbound::Text(text))
            .await
            .map_err(|_| SendError::ChannelClosed)
    }

    /// Ask the transport to close this connection
    ///
    /// Frames queued before the close are still written.
    pub async fn close(&self) -> Result<(), SendError> {
        self.sender
            .send(Outbound::Close)
            .await
            .map_err(|_| SendError::ChannelClosed)
    }

    /// Whether the transport side has gone away
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

impl PartialEq for ConnectionHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ConnectionHandle {}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_send_and_close_order() {
        let (tx, mut rx) = mpsc::channel(32);
        let conn = ConnectionHandle::new(ConnectionId::new(), tx);

        conn.send("hello".to_string()).await.unwrap();
        conn.close().await.unwrap();

        assert_eq!(rx.recv().await, Some(Outbound::Text("hello".to_string())));
        assert_eq!(rx.recv().await, Some(Outbound::Close));
    }

    #[tokio::test]
    async fn test_send_to_dead_connection() {
        let (tx, rx) = mpsc::channel(32);
        let conn = ConnectionHandle::new(ConnectionId::new(), tx);
        drop(rx);

        assert!(conn.is_closed());
        assert!(conn.send("hello".to_string()).await.is_err());
    }

    #[tokio::test]
    async fn test_identity_equality() {
        let (tx, _rx) = mpsc::channel(32);
        let id = ConnectionId::new();
        let a = ConnectionHandle::new(id, tx.clone());
        let b = ConnectionHandle::new(id, tx.clone());
        let c = ConnectionHandle::new(ConnectionId::new(), tx);

        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
