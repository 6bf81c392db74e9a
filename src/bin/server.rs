//! SegKV Server Binary
//!
//! Opens the engine, starts the flush scheduler and serves TCP clients.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use segkv::config::WalSyncStrategy;
use segkv::network::Server;
use segkv::{Config, Engine, FlushScheduler};
use tracing_subscriber::{fmt, EnvFilter};

/// SegKV Server
#[derive(Parser, Debug)]
#[command(name = "segkv-server")]
#[command(about = "Log-structured key-value store server")]
#[command(version)]
struct Args {
    /// Data directory
    #[arg(short, long, default_value = "./segkv_data")]
    data_dir: String,

    /// Listen address (host:port)
    #[arg(short, long, default_value = "127.0.0.1:7070")]
    listen: String,

    /// Maximum concurrent connections
    #[arg(short, long, default_value = "1024")]
    max_connections: usize,

    /// Live keys (or tombstones) that trigger a flush
    #[arg(short = 't', long, default_value = "20000")]
    flush_threshold: usize,

    /// Seconds between background flushes
    #[arg(short = 'i', long, default_value = "10")]
    flush_interval_secs: u64,

    /// fsync the WAL after every record instead of every 100
    #[arg(long)]
    sync_every_write: bool,
}

fn main() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,segkv=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    tracing::info!("SegKV Server v{}", segkv::VERSION);
    tracing::info!("Data directory: {}", args.data_dir);
    tracing::info!("Listen address: {}", args.listen);

    let sync_strategy = if args.sync_every_write {
        WalSyncStrategy::EveryWrite
    } else {
        WalSyncStrategy::EveryNEntries { count: 100 }
    };

    let config = Config::builder()
        .data_dir(&args.data_dir)
        .listen_addr(&args.listen)
        .max_connections(args.max_connections)
        .flush_threshold(args.flush_threshold)
        .flush_interval(Duration::from_secs(args.flush_interval_secs))
        .wal_sync_strategy(sync_strategy)
        .try_build();

    let config = match config {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    let engine = match Engine::open(config.clone()) {
        Ok(e) => Arc::new(e),
        Err(e) => {
            tracing::error!("Failed to open engine: {}", e);
            std::process::exit(1);
        }
    };

    tracing::info!(segments = engine.segment_count(), "Engine initialized successfully");

    let scheduler = match FlushScheduler::start(Arc::clone(&engine), config.flush_interval) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("Failed to start flush scheduler: {}", e);
            std::process::exit(1);
        }
    };

    let result = Server::bind(config, Arc::clone(&engine)).and_then(|server| server.run());

    scheduler.shutdown();
    if let Err(e) = engine.close() {
        tracing::error!("Failed to close engine cleanly: {}", e);
    }

    if let Err(e) = result {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }

    tracing::info!("Server stopped");
}
