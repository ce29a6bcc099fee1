use std::net::SocketAddr;

use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use lan_relay::{RelayServer, ServerConfig};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

/// WebSocket relay for LAN chat and WebRTC signaling
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Address to listen on
    #[arg(long, env = "RELAY_BIND", default_value = "0.0.0.0:4000")]
    bind: SocketAddr,

    /// Maximum concurrent connections (0 = unlimited)
    #[arg(long, env = "RELAY_MAX_CONNECTIONS", default_value_t = 0)]
    max_connections: usize,

    /// Chat messages kept for replay to new clients
    #[arg(long, env = "RELAY_HISTORY_CAPACITY", default_value_t = lan_relay::history::DEFAULT_HISTORY_CAPACITY)]
    history_capacity: usize,

    /// Frames queued per client before sends to it are dropped
    #[arg(long, env = "RELAY_SEND_QUEUE", default_value_t = lan_relay::registry::config::DEFAULT_SEND_QUEUE_CAPACITY)]
    send_queue: usize,

    /// Log output format
    #[arg(long, env = "RELAY_LOG_FORMAT", value_enum, default_value = "text")]
    log_format: LogFormat,
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("lan_relay=info,tower_http=info"));

    match format {
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
        LogFormat::Json => tracing_subscriber::fmt().json().with_env_filter(filter).init(),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    init_tracing(args.log_format);

    let config = ServerConfig::with_addr(args.bind)
        .max_connections(args.max_connections)
        .history_capacity(args.history_capacity)
        .send_queue_capacity(args.send_queue);

    let server = RelayServer::new(config);
    let relay = std::sync::Arc::clone(server.relay());

    server
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for Ctrl+C");
                std::future::pending::<()>().await;
            }
        })
        .await?;

    let stats = relay.stats().snapshot();
    tracing::info!(
        uptime_secs = stats.uptime.as_secs(),
        connections = stats.total_connections,
        chat = stats.chat_messages,
        signaling = stats.signaling_messages,
        "Relay stopped"
    );

    Ok(())
}
