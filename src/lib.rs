//! WebSocket Broadcast Chat Relay Library
//!
//! A WebSocket chat relay built with tokio-tungstenite. Clients claim a
//! unique display name with their first frame; every later frame is stamped
//! with the server time and relayed to all named clients.
//!
//! # Protocol
//! - Client → Server: plain text frames. The first one is the name claim.
//! - Server → Client: `{"ts": "yyyy-mm-dd hh:mm:ss", "uid": "...", "msg": "..."}`
//! - A taken name is answered with an error envelope and the connection is closed.
//!
//! # Architecture
//! Uses the Actor pattern with `mpsc` channels:
//! - `ChatServer` is the single owner of the participant registry
//! - Each connection runs a `Session` in its handler task
//! - Broadcasts fan out from the sender's task over a registry snapshot
//!
//! # Example
//! ```ignore
//! use tokio::net::TcpListener;
//! use chat_relay::{serve, ChatServer};
//!
//! #[tokio::main]
//! async fn main() {
//!     let listener = TcpListener::bind("127.0.0.1:1904").await.unwrap();
//!     let (server, handle) = ChatServer::channel(256);
//!
//!     tokio::spawn(server.run());
//!     serve(listener, handle, 32).await;
//! }
//! ```

pub mod config;
pub mod connection;
pub mod dispatch;
pub mod error;
pub mod handler;
pub mod message;
pub mod registry;
pub mod server;
pub mod session;
pub mod timestamp;
pub mod types;

// Re-export main types for convenience
pub use config::Config;
pub use connection::{ConnectionHandle, Outbound};
pub use dispatch::{dispatch_to_all, dispatch_to_one};
pub use error::{AppError, SendError};
pub use handler::{handle_connection, serve};
pub use message::{decode, encode, ChatEnvelope};
pub use registry::{Participant, ParticipantRegistry};
pub use server::{ChatServer, ServerCommand, ServerHandle};
pub use session::{Session, SessionState};
pub use types::ConnectionId;
