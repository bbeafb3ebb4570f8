//! StudentLedger Server Binary
//!
//! Starts the TCP server for StudentLedger.

use std::sync::Arc;

use clap::Parser;
use studentledger::config::CorruptHistoryPolicy;
use studentledger::network::Server;
use studentledger::{Config, Engine};
use tracing_subscriber::{fmt, EnvFilter};

/// StudentLedger Server
#[derive(Parser, Debug)]
#[command(name = "studentledger-server")]
#[command(about = "Student records on an append-only versioned ledger")]
#[command(version)]
struct Args {
    /// Data directory
    #[arg(short, long, default_value = "./studentledger_data")]
    data_dir: String,

    /// Listen address (host:port)
    #[arg(short, long, default_value = "127.0.0.1:7051")]
    listen: String,

    /// Maximum pending connections
    #[arg(short, long, default_value = "1024")]
    max_connections: usize,

    /// Worker threads serving connections
    #[arg(short, long, default_value = "8")]
    workers: usize,

    /// Leave undecodable versions out of history instead of failing
    #[arg(long)]
    skip_corrupt_history: bool,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,studentledger=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    tracing::info!("StudentLedger Server v{}", studentledger::VERSION);
    tracing::info!("Data directory: {}", args.data_dir);
    tracing::info!("Listen address: {}", args.listen);

    let corrupt_history = if args.skip_corrupt_history {
        CorruptHistoryPolicy::Skip
    } else {
        CorruptHistoryPolicy::Abort
    };

    // Build config from args
    let config = Config::builder()
        .data_dir(&args.data_dir)
        .listen_addr(&args.listen)
        .max_connections(args.max_connections)
        .worker_threads(args.workers)
        .corrupt_history(corrupt_history)
        .build();

    // Open engine
    let engine = match Engine::open(config.clone()) {
        Ok(e) => Arc::new(e),
        Err(e) => {
            tracing::error!("Failed to open engine: {}", e);
            std::process::exit(2);
        }
    };

    tracing::info!("Engine initialized successfully");

    let mut server = match Server::bind(config, engine) {
        Ok(server) => server,
        Err(e) => {
            tracing::error!("Failed to start server: {}", e);
            std::process::exit(2);
        }
    };

    if let Err(e) = server.run() {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }

    tracing::info!("Server stopped");
}
