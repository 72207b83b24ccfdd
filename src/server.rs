//! ChatServer Actor implementation
//!
//! The central actor owning the participant registry. Sessions never touch
//! the registry directly: every operation is a `ServerCommand` processed one
//! at a time, so registration, removal and snapshots are serialized without
//! locks. Replies travel back on oneshot channels.

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

use crate::connection::ConnectionHandle;
use crate::error::AppError;
use crate::registry::ParticipantRegistry;
use crate::types::ConnectionId;

/// Commands sent from sessions to the ChatServer actor
#[derive(Debug)]
pub enum ServerCommand {
    /// Claim a display name for a connection
    Register {
        connection: ConnectionHandle,
        name: String,
        reply: oneshot::Sender<Result<(), AppError>>,
    },
    /// Drop a connection's entry (no-op if absent)
    Unregister {
        id: ConnectionId,
    },
    /// Ask whether a connection holds a name
    IsRegistered {
        id: ConnectionId,
        reply: oneshot::Sender<bool>,
    },
    /// Look up a connection's name
    NameOf {
        id: ConnectionId,
        reply: oneshot::Sender<Option<String>>,
    },
    /// Snapshot every named connection
    AllConnections {
        reply: oneshot::Sender<Vec<ConnectionHandle>>,
    },
}

/// The main ChatServer actor
///
/// Processes commands until every `ServerHandle` has been dropped.
pub struct ChatServer {
    /// All named connections
    registry: ParticipantRegistry,
    /// Command receiver channel
    receiver: mpsc::Receiver<ServerCommand>,
}

impl ChatServer {
    /// Create a new ChatServer with the given command receiver
    pub fn new(receiver: mpsc::Receiver<ServerCommand>) -> Self {
        Self {
            registry: ParticipantRegistry::new(),
            receiver,
        }
    }

    /// Create the actor together with a handle to it
    pub fn channel(buffer: usize) -> (Self, ServerHandle) {
        let (tx, rx) = mpsc::channel(buffer);
        (Self::new(rx), ServerHandle::new(tx))
    }

    /// Run the ChatServer event loop
    pub async fn run(mut self) {
        info!("ChatServer started");

        while let Some(cmd) = self.receiver.recv().await {
            self.handle_command(cmd);
        }

        info!("ChatServer shutting down");
    }

    /// Process a single command
    ///
    /// A dropped reply receiver means the asking session went away. A
    /// registration still stands and that session's close removes it.
    fn handle_command(&mut self, cmd: ServerCommand) {
        match cmd {
            ServerCommand::Register {
                connection,
                name,
                reply,
            } => {
                let result = self.registry.register(connection, name);
                if result.is_ok() {
                    debug!("Participants: {}", self.registry.len());
                }
                let _ = reply.send(result);
            }
            ServerCommand::Unregister { id } => {
                if self.registry.unregister(id).is_some() {
                    debug!("Participants: {}", self.registry.len());
                }
            }
            ServerCommand::IsRegistered { id, reply } => {
                let _ = reply.send(self.registry.is_registered(id));
            }
            ServerCommand::NameOf { id, reply } => {
                let _ = reply.send(self.registry.name_of(id).map(str::to_owned));
            }
            ServerCommand::AllConnections { reply } => {
                let _ = reply.send(self.registry.all_connections());
            }
        }
    }
}

/// Cloneable front for the ChatServer actor
///
/// Exposes the registry contract as async calls. Every method fails with
/// `AppError::ChannelSend` only when the actor has stopped.
#[derive(Debug, Clone)]
pub struct ServerHandle {
    sender: mpsc::Sender<ServerCommand>,
}

impl ServerHandle {
    /// Wrap a command sender
    pub fn new(sender: mpsc::Sender<ServerCommand>) -> Self {
        Self { sender }
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> ServerCommand,
    ) -> Result<T, AppError> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(build(tx))
            .await
            .map_err(|_| AppError::ChannelSend)?;
        rx.await.map_err(|_| AppError::ChannelSend)
    }

    /// Claim `name` for `connection`; `NameTaken` if someone holds it
    pub async fn register(&self, connection: ConnectionHandle, name: String) -> Result<(), AppError> {
        self.request(|reply| ServerCommand::Register {
            connection,
            name,
            reply,
        })
        .await?
    }

    /// Remove a connection's entry
    pub async fn unregister(&self, id: ConnectionId) -> Result<(), AppError> {
        self.sender
            .send(ServerCommand::Unregister { id })
            .await
            .map_err(|_| AppError::ChannelSend)
    }

    /// Check if a connection holds a name
    pub async fn is_registered(&self, id: ConnectionId) -> Result<bool, AppError> {
        self.request(|reply| ServerCommand::IsRegistered { id, reply })
            .await
    }

    /// Get the name held by a connection
    pub async fn name_of(&self, id: ConnectionId) -> Result<Option<String>, AppError> {
        self.request(|reply| ServerCommand::NameOf { id, reply }).await
    }

    /// Snapshot of all named connections, in registration order
    pub async fn all_connections(&self) -> Result<Vec<ConnectionHandle>, AppError> {
        self.request(|reply| ServerCommand::AllConnections { reply })
            .await
    }
}
