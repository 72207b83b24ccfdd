//! Per-connection session controller
//!
//! Turns raw transport events into registry mutations and broadcasts:
//!
//! ```text
//! Unnamed --(free name)--> Named --(close)--> Closed
//!    |                                          ^
//!    +--(name taken: notice + close)------------+
//!    +--(close)---------------------------------+
//! ```
//!
//! The first payload of an unnamed connection is always a name claim.
//! Once named, every payload is a chat line relayed to all participants,
//! the sender included.

use std::fmt::Display;

use tracing::{debug, error, info, warn};

use crate::connection::ConnectionHandle;
use crate::dispatch;
use crate::error::AppError;
use crate::message::ChatEnvelope;
use crate::server::ServerHandle;

/// Session lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Connected, no name claimed yet
    Unnamed,
    /// Holds a registry entry
    Named,
    /// Terminal
    Closed,
}

/// State machine for one connection
#[derive(Debug)]
pub struct Session {
    conn: ConnectionHandle,
    server: ServerHandle,
    state: SessionState,
}

impl Session {
    /// Start a session for a freshly connected link
    ///
    /// No registry mutation and no broadcast happen on connect.
    pub fn new(conn: ConnectionHandle, server: ServerHandle) -> Self {
        debug!("Session {} started", conn.id);
        Self {
            conn,
            server,
            state: SessionState::Unnamed,
        }
    }

    /// Current state
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// The connection this session drives
    pub fn connection(&self) -> &ConnectionHandle {
        &self.conn
    }

    /// Handle one inbound text payload
    ///
    /// Only fails when the registry actor is gone.
    pub async fn on_payload(&mut self, text: String) -> Result<(), AppError> {
        match self.state {
            SessionState::Unnamed => self.claim_name(text).await,
            SessionState::Named => self.relay(text).await,
            SessionState::Closed => {
                warn!("Payload for closed session {} dropped", self.conn.id);
                Ok(())
            }
        }
    }

    /// Report a transport error
    ///
    /// Logged only; the transport delivers the close separately.
    pub fn on_error(&self, err: &dyn Display) {
        error!("Transport error for {}: {}", self.conn.id, err);
    }

    /// Handle the end of the connection
    ///
    /// Releases the name if one was held. Safe to call more than once.
    ///
    /// An unnamed session still asks for removal: a claim cancelled
    /// mid-flight may have landed in the registry without the session
    /// seeing the reply. Removal of an absent entry is a no-op.
    pub async fn on_close(&mut self) -> Result<(), AppError> {
        if self.state == SessionState::Closed {
            return Ok(());
        }
        self.state = SessionState::Closed;

        self.server.unregister(self.conn.id).await?;
        debug!("Session {} closed", self.conn.id);
        Ok(())
    }

    async fn claim_name(&mut self, name: String) -> Result<(), AppError> {
        match self.server.register(self.conn.clone(), name.clone()).await {
            Ok(()) => {
                info!("Client {} is now '{}'", self.conn.id, name);
                self.state = SessionState::Named;
                Ok(())
            }
            Err(AppError::NameTaken(name)) => {
                info!("Client {} rejected: name '{}' in use", self.conn.id, name);
                self.reject(&name).await
            }
            Err(e) => Err(e),
        }
    }

    /// Tell the client why, then force the connection closed
    async fn reject(&mut self, name: &str) -> Result<(), AppError> {
        dispatch::dispatch_to_one(&ChatEnvelope::name_taken(name), &self.conn).await?;
        if let Err(e) = self.conn.close().await {
            debug!("Close for {} not delivered: {}", self.conn.id, e);
        }
        self.on_close().await
    }

    async fn relay(&mut self, text: String) -> Result<(), AppError> {
        let Some(uid) = self.server.name_of(self.conn.id).await? else {
            warn!("Named session {} has no registry entry", self.conn.id);
            return Ok(());
        };

        let envelope = ChatEnvelope::new(uid, text);
        info!("Msg rcv: {} @ {} => {}", envelope.uid, envelope.ts, envelope.msg);

        let recipients = self.server.all_connections().await?;
        if let Err(e) = dispatch::dispatch_to_all(&envelope, &recipients).await {
            error!("Failed to encode envelope from {}: {}", self.conn.id, e);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::Outbound;
    use crate::message;
    use crate::server::ChatServer;
    use crate::types::ConnectionId;
    use chrono::NaiveDateTime;
    use tokio::sync::mpsc;

    fn spawn_server() -> ServerHandle {
        let (server, handle) = ChatServer::channel(64);
        tokio::spawn(server.run());
        handle
    }

    fn connect(server: &ServerHandle) -> (Session, mpsc::Receiver<Outbound>) {
        let (tx, rx) = mpsc::channel(32);
        let conn = ConnectionHandle::new(ConnectionId::new(), tx);
        (Session::new(conn, server.clone()), rx)
    }

    async fn named(server: &ServerHandle, name: &str) -> (Session, mpsc::Receiver<Outbound>) {
        let (mut session, rx) = connect(server);
        session.on_payload(name.to_string()).await.unwrap();
        assert_eq!(session.state(), SessionState::Named);
        (session, rx)
    }

    async fn recv_envelope(rx: &mut mpsc::Receiver<Outbound>) -> ChatEnvelope {
        match rx.recv().await {
            Some(Outbound::Text(text)) => message::decode(&text).unwrap(),
            other => panic!("Expected text frame, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_connect_is_silent() {
        let server = spawn_server();
        let (session, mut rx) = connect(&server);

        assert_eq!(session.state(), SessionState::Unnamed);
        assert!(!server.is_registered(session.connection().id).await.unwrap());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_first_payload_claims_name() {
        let server = spawn_server();
        let (session, mut rx) = named(&server, "alice").await;
        let id = session.connection().id;

        assert!(server.is_registered(id).await.unwrap());
        assert_eq!(server.name_of(id).await.unwrap().as_deref(), Some("alice"));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_name_collision_rejects_and_closes() {
        let server = spawn_server();
        let (_alice, _rx_a) = named(&server, "alice").await;
        let (mut bob, mut rx_b) = connect(&server);

        bob.on_payload("alice".to_string()).await.unwrap();

        let notice = recv_envelope(&mut rx_b).await;
        assert_eq!(notice.uid, "alice");
        assert!(notice.msg.contains("already in use"));
        assert_eq!(rx_b.recv().await, Some(Outbound::Close));

        assert_eq!(bob.state(), SessionState::Closed);
        let all = server.all_connections().await.unwrap();
        assert_eq!(all.len(), 1);
        assert!(!all.contains(bob.connection()));
    }

    #[tokio::test]
    async fn test_chat_broadcast_includes_sender() {
        let server = spawn_server();
        let (mut alice, mut rx_a) = named(&server, "alice").await;
        let (_bob, mut rx_b) = named(&server, "bob").await;

        alice.on_payload("hello".to_string()).await.unwrap();

        for rx in [&mut rx_a, &mut rx_b] {
            let envelope = recv_envelope(rx).await;
            assert_eq!(envelope.uid, "alice");
            assert_eq!(envelope.msg, "hello");
            assert!(NaiveDateTime::parse_from_str(&envelope.ts, "%Y-%m-%d %H:%M:%S").is_ok());
        }
    }

    #[tokio::test]
    async fn test_unnamed_connections_get_no_broadcast() {
        let server = spawn_server();
        let (mut alice, _rx_a) = named(&server, "alice").await;
        let (_lurker, mut rx_l) = connect(&server);

        alice.on_payload("hello".to_string()).await.unwrap();

        assert!(rx_l.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_sender_order_preserved() {
        let server = spawn_server();
        let (mut alice, _rx_a) = named(&server, "alice").await;
        let (_bob, mut rx_b) = named(&server, "bob").await;

        for line in ["one", "two", "three"] {
            alice.on_payload(line.to_string()).await.unwrap();
        }

        for line in ["one", "two", "three"] {
            assert_eq!(recv_envelope(&mut rx_b).await.msg, line);
        }
    }

    #[tokio::test]
    async fn test_close_releases_name() {
        let server = spawn_server();
        let (mut alice, _rx_a) = named(&server, "alice").await;
        let alice_conn = alice.connection().clone();

        alice.on_close().await.unwrap();
        assert_eq!(alice.state(), SessionState::Closed);
        assert!(!server
            .all_connections()
            .await
            .unwrap()
            .contains(&alice_conn));

        let (again, _rx) = named(&server, "alice").await;
        assert!(server.is_registered(again.connection().id).await.unwrap());
    }

    #[tokio::test]
    async fn test_close_unnamed_has_no_registry_effect() {
        let server = spawn_server();
        let (_alice, _rx_a) = named(&server, "alice").await;
        let (mut lurker, _rx_l) = connect(&server);

        lurker.on_close().await.unwrap();
        lurker.on_close().await.unwrap();

        assert_eq!(lurker.state(), SessionState::Closed);
        assert_eq!(server.all_connections().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_payload_after_close_ignored() {
        let server = spawn_server();
        let (mut alice, mut rx_a) = connect(&server);

        alice.on_close().await.unwrap();
        alice.on_payload("alice".to_string()).await.unwrap();

        assert_eq!(alice.state(), SessionState::Closed);
        assert!(!server.is_registered(alice.connection().id).await.unwrap());
        assert!(rx_a.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_broadcast_survives_dead_recipient() {
        let server = spawn_server();
        let (mut alice, mut rx_a) = named(&server, "alice").await;
        let (_bob, rx_b) = named(&server, "bob").await;
        let (_carol, mut rx_c) = named(&server, "carol").await;
        drop(rx_b);

        alice.on_payload("still here?".to_string()).await.unwrap();

        assert_eq!(recv_envelope(&mut rx_a).await.msg, "still here?");
        assert_eq!(recv_envelope(&mut rx_c).await.msg, "still here?");
    }
}
