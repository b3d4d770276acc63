//! respkv Server Binary
//!
//! Replays the AOF, then serves clients over TCP.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use respkv::aof;
use respkv::config::AofSyncStrategy;
use respkv::network::Server;
use respkv::{Config, Engine};
use tracing_subscriber::{fmt, EnvFilter};

/// respkv Server
#[derive(Parser, Debug)]
#[command(name = "respkv-server")]
#[command(about = "In-memory key-value store with an append-only log")]
#[command(version)]
struct Args {
    /// Append-only log path
    #[arg(short, long, default_value = "database.aof")]
    aof: PathBuf,

    /// Listen address (host:port)
    #[arg(short, long, default_value = "0.0.0.0:6371")]
    listen: String,

    /// Maximum concurrent connections
    #[arg(short, long, default_value = "1024")]
    max_connections: usize,

    /// AOF fsync policy: always, everysec, or every-<n> (every n writes)
    #[arg(long, default_value = "everysec")]
    fsync: AofSyncStrategy,

    /// Socket read timeout in milliseconds (0 = none)
    #[arg(long, default_value = "0")]
    read_timeout_ms: u64,

    /// Socket write timeout in milliseconds (0 = none)
    #[arg(long, default_value = "0")]
    write_timeout_ms: u64,

    /// Check the AOF for damage and exit without serving
    #[arg(long)]
    check_aof: bool,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,respkv=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    if args.check_aof {
        check_aof(&args.aof);
        return;
    }

    tracing::info!("respkv Server v{}", respkv::VERSION);
    tracing::info!("AOF: {}", args.aof.display());
    tracing::info!("Listen address: {}", args.listen);

    let config = Config::builder()
        .aof_path(&args.aof)
        .aof_sync_strategy(args.fsync)
        .listen_addr(&args.listen)
        .max_connections(args.max_connections)
        .read_timeout_ms(args.read_timeout_ms)
        .write_timeout_ms(args.write_timeout_ms)
        .build();

    // Replays the AOF; refuse to serve on a log we cannot read
    let engine = match Engine::open(config.clone()) {
        Ok(e) => Arc::new(e),
        Err(e) => {
            tracing::error!("Failed to open engine: {}", e);
            std::process::exit(1);
        }
    };

    let server = match Server::bind(config, engine) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("Failed to start server: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = server.run() {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }

    tracing::info!("Server stopped");
}

fn check_aof(path: &std::path::Path) {
    match aof::verify(path) {
        Ok(result) if result.was_truncated => {
            println!(
                "{}: {} records, partial record after byte {}",
                path.display(),
                result.records_applied,
                result.valid_bytes
            );
            std::process::exit(2);
        }
        Ok(result) => {
            println!(
                "{}: OK, {} records, {} bytes",
                path.display(),
                result.records_applied,
                result.valid_bytes
            );
        }
        Err(e) => {
            println!("{}: {}", path.display(), e);
            std::process::exit(1);
        }
    }
}
