//! WebSocket Chat Relay - Entry Point
//!
//! Parses `<hostname> <port>`, binds the listener, starts the ChatServer
//! actor and accepts connections until Ctrl-C.

use clap::Parser;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use chat_relay::{serve, AppError, ChatServer, Config};

fn init_logging(json: bool) {
    // Use RUST_LOG env var to control log level
    // e.g., RUST_LOG=debug or RUST_LOG=chat_relay=trace
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("chat_relay=info"));

    if json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let config = Config::parse();
    init_logging(config.json_logs);

    let addr = config.bind_addr();
    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(source) => {
            let err = AppError::Bind { addr, source };
            error!("{}. WebSocket maybe in use?", err);
            return Err(err);
        }
    };
    info!("WebSocket Chat Relay listening on ws://{}", addr);

    let (server, handle) = ChatServer::channel(config.command_buffer);
    tokio::spawn(server.run());

    tokio::select! {
        _ = serve(listener, handle, config.outbound_buffer) => {}
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                error!("Failed to listen for shutdown signal: {}", e);
            }
        }
    }

    info!("Shutting down");
    Ok(())
}
