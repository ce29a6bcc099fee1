//! Simple relay example with periodic stats
//!
//! Run with: cargo run --example simple_server [BIND_ADDR]
//!
//! Examples:
//!   cargo run --example simple_server                    # binds to 0.0.0.0:4000
//!   cargo run --example simple_server localhost          # binds to 127.0.0.1:4000
//!   cargo run --example simple_server 127.0.0.1:4001     # binds to 127.0.0.1:4001
//!
//! ## Connecting
//!
//! Browsers connect with `new WebSocket("ws://<host>:4000")`.
//!
//! With websocat:
//!   websocat ws://localhost:4000
//!   {"type":"chat","message":{"id":"1","text":"hi","sender":"cli","timestamp":0}}
//!
//! Health:
//!   curl http://localhost:4000/health

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use lan_relay::server::config::DEFAULT_PORT;
use lan_relay::{RelayServer, ServerConfig};

/// Parse bind address from command line argument.
///
/// Accepts "localhost", "localhost:PORT", "IP" and "IP:PORT".
fn parse_bind_addr(arg: &str) -> Result<SocketAddr, String> {
    let normalized = arg.replace("localhost", "127.0.0.1");

    if let Ok(addr) = normalized.parse::<SocketAddr>() {
        return Ok(addr);
    }

    if let Ok(ip) = normalized.parse::<std::net::IpAddr>() {
        return Ok(SocketAddr::new(ip, DEFAULT_PORT));
    }

    Err(format!(
        "Invalid bind address: '{}'. Expected format: IP:PORT or IP or 'localhost'",
        arg
    ))
}

fn print_usage() {
    eprintln!("Usage: simple_server [BIND_ADDR]");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  BIND_ADDR    Address to bind to (default: 0.0.0.0:{})", DEFAULT_PORT);
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_usage();
        return Ok(());
    }

    let config = match args.get(1) {
        Some(addr_str) => match parse_bind_addr(addr_str) {
            Ok(addr) => ServerConfig::with_addr(addr),
            Err(e) => {
                eprintln!("Error: {}", e);
                eprintln!();
                print_usage();
                std::process::exit(1);
            }
        },
        None => ServerConfig::default(),
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("lan_relay=debug".parse()?)
                .add_directive("simple_server=debug".parse()?),
        )
        .init();

    println!("Starting relay on ws://{}", config.bind_addr);
    println!("Health check: http://{}/health", config.bind_addr);
    println!();

    let server = Arc::new(RelayServer::new(config));

    // Print stats every 30s
    let relay = Arc::clone(server.relay());
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(30));
        loop {
            ticker.tick().await;
            let health = relay.health().await;
            let stats = relay.stats().snapshot();
            println!(
                "Stats: clients={} history={} chat={} signaling={} dropped={} send_failures={}",
                health.client_count,
                health.message_count,
                stats.chat_messages,
                stats.signaling_messages,
                stats.decode_errors + stats.unroutable_messages,
                stats.send_failures,
            );
        }
    });

    tokio::select! {
        result = server.run() => {
            if let Err(e) = result {
                eprintln!("Server error: {}", e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            println!("\nShutting down...");
        }
    }

    Ok(())
}
