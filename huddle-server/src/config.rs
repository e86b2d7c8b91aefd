use clap::Parser;
use std::net::SocketAddr;

/// Command line / environment configuration of the relay binary.
#[derive(Debug, Clone, Parser)]
#[command(name = "huddle-relay", about = "Signaling relay for huddle rooms")]
pub struct RelayConfig {
    /// Address the HTTP/WebSocket listener binds to.
    #[arg(long, env = "HUDDLE_BIND", default_value = "0.0.0.0:3000")]
    pub bind: SocketAddr,

    /// Default log filter when RUST_LOG is unset.
    #[arg(long, env = "HUDDLE_LOG", default_value = "huddle_server=info")]
    pub log: String,
}
