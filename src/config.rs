//! Command-line configuration

use clap::Parser;

/// WebSocket broadcast chat relay
#[derive(Parser, Debug, Clone)]
#[command(name = "chat_relay", version, about = "WebSocket broadcast chat relay")]
pub struct Config {
    /// Hostname or IP address to bind to
    pub hostname: String,

    /// Port to listen on
    pub port: u16,

    /// Capacity of the registry command queue
    #[arg(long, default_value_t = 256)]
    pub command_buffer: usize,

    /// Capacity of each connection's outbound queue
    #[arg(long, default_value_t = 32)]
    pub outbound_buffer: usize,

    /// Emit logs as JSON lines
    #[arg(long, env = "CHAT_RELAY_JSON_LOGS")]
    pub json_logs: bool,
}

impl Config {
    /// `hostname:port`, as handed to the listener
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.hostname, self.port)
    }
}
