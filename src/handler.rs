//! WebSocket connection handler
//!
//! Handles individual client connections: WebSocket handshake, mapping
//! frames to session events, and draining the outbound queue into the socket.

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::WebSocketStream;
use tracing::{debug, error, info};

use crate::connection::{ConnectionHandle, Outbound};
use crate::error::AppError;
use crate::server::ServerHandle;
use crate::session::{Session, SessionState};
use crate::types::ConnectionId;

type WsSink = SplitSink<WebSocketStream<TcpStream>, Message>;
type WsSource = SplitStream<WebSocketStream<TcpStream>>;

/// Accept connections forever, one handler task per socket
pub async fn serve(listener: TcpListener, server: ServerHandle, outbound_buffer: usize) {
    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                debug!("New TCP connection from {}", addr);
                let server = server.clone();

                tokio::spawn(async move {
                    if let Err(e) = handle_connection(stream, server, outbound_buffer).await {
                        error!("Connection handler error: {}", e);
                    }
                });
            }
            Err(e) => {
                error!("Failed to accept connection: {}", e);
            }
        }
    }
}

/// Handle a new TCP connection
///
/// Performs the WebSocket handshake, runs the session until either side
/// ends the link, then releases the session's registry entry.
pub async fn handle_connection(
    stream: TcpStream,
    server: ServerHandle,
    outbound_buffer: usize,
) -> Result<(), AppError> {
    let peer_addr = stream
        .peer_addr()
        .map(|a| a.to_string())
        .unwrap_or_else(|_| "unknown".to_string());

    let ws_stream = tokio_tungstenite::accept_async(stream).await?;
    let (ws_sender, mut ws_receiver) = ws_stream.split();

    let id = ConnectionId::new();
    info!("Client <{}> connected as {}", peer_addr, id);

    let (out_tx, out_rx) = mpsc::channel::<Outbound>(outbound_buffer);
    let mut write_task = tokio::spawn(write_frames(ws_sender, out_rx));

    let mut session = Session::new(ConnectionHandle::new(id, out_tx), server);

    let (read_result, writer_done) = tokio::select! {
        result = read_frames(&mut ws_receiver, &mut session) => (result, false),
        _ = &mut write_task => {
            debug!("Write task completed for {}", id);
            (Ok(()), true)
        }
    };

    let close_result = session.on_close().await;
    // Dropping the last queue sender lets the writer flush and finish.
    drop(session);
    if !writer_done {
        let _ = write_task.await;
    }

    info!("Client <{}> disconnected", peer_addr);

    read_result.and(close_result)
}

/// Feed inbound frames to the session until the link ends
async fn read_frames(receiver: &mut WsSource, session: &mut Session) -> Result<(), AppError> {
    let id = session.connection().id;

    while let Some(msg_result) = receiver.next().await {
        match msg_result {
            Ok(Message::Text(text)) => {
                session.on_payload(text.to_string()).await?;
                if session.state() == SessionState::Closed {
                    break;
                }
            }
            Ok(Message::Close(_)) => {
                debug!("Client {} sent close frame", id);
                break;
            }
            Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {
                // Pong is handled automatically by tungstenite
            }
            Ok(_) => {
                debug!("Ignoring non-text frame from {}", id);
            }
            Err(e) => {
                session.on_error(&e);
                break;
            }
        }
    }

    debug!("Read loop ended for {}", id);
    Ok(())
}

/// Drain the outbound queue into the socket
async fn write_frames(mut sender: WsSink, mut queue: mpsc::Receiver<Outbound>) {
    while let Some(outbound) = queue.recv().await {
        match outbound {
            Outbound::Text(text) => {
                if sender.send(Message::Text(text.into())).await.is_err() {
                    debug!("WebSocket send failed, ending write task");
                    return;
                }
            }
            Outbound::Close => break,
        }
    }

    // Send close frame when done
    let _ = sender.close().await;
}
