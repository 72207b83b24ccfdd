//! Participant registry
//!
//! Maps each named connection to its display name and owns the
//! name-uniqueness invariant. Plain synchronous state: the `ChatServer`
//! actor is its only owner, which serializes every operation.

use tracing::debug;

use crate::connection::ConnectionHandle;
use crate::error::AppError;
use crate::types::ConnectionId;

/// A connection that completed the naming handshake
#[derive(Debug, Clone)]
pub struct Participant {
    pub connection: ConnectionHandle,
    pub name: String,
}

/// Connection → display name mapping, kept in insertion order
///
/// Invariants: at most one entry per connection, at most one entry per
/// name (byte-exact, case-sensitive).
#[derive(Debug, Default)]
pub struct ParticipantRegistry {
    entries: Vec<Participant>,
}

impl ParticipantRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `name` for `connection`
    ///
    /// No mutation happens on failure.
    pub fn register(&mut self, connection: ConnectionHandle, name: String) -> Result<(), AppError> {
        if self.is_registered(connection.id) {
            return Err(AppError::AlreadyRegistered);
        }
        if self.entries.iter().any(|p| p.name == name) {
            return Err(AppError::NameTaken(name));
        }

        debug!("Registered {} as '{}'", connection.id, name);
        self.entries.push(Participant { connection, name });
        Ok(())
    }

    /// Check if a connection currently holds a name
    pub fn is_registered(&self, id: ConnectionId) -> bool {
        self.entries.iter().any(|p| p.connection.id == id)
    }

    /// Get the name held by a connection
    pub fn name_of(&self, id: ConnectionId) -> Option<&str> {
        self.entries
            .iter()
            .find(|p| p.connection.id == id)
            .map(|p| p.name.as_str())
    }

    /// Remove a connection's entry
    ///
    /// Returns the released name. Calling it for an unknown connection is a no-op.
    pub fn unregister(&mut self, id: ConnectionId) -> Option<String> {
        let index = self.entries.iter().position(|p| p.connection.id == id)?;
        let participant = self.entries.remove(index);
        debug!("Unregistered {} ('{}')", id, participant.name);
        Some(participant.name)
    }

    /// Snapshot of all named connections, in registration order
    pub fn all_connections(&self) -> Vec<ConnectionHandle> {
        self.entries.iter().map(|p| p.connection.clone()).collect()
    }

    /// Number of named connections
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if nobody is named
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
