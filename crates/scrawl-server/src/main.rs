//! Scrawl server binary.
//!
//! # Usage
//!
//! ```bash
//! # Development defaults
//! scrawl-server --bind 0.0.0.0:8080
//!
//! # Shorter turns
//! scrawl-server --bind 0.0.0.0:8080 --turn-secs 30
//! ```

use std::{sync::Arc, time::Duration};

use clap::Parser;
use scrawl_core::CatalogWordBank;
use scrawl_server::{
    Coordinator, MemoryRoomStore, ServerConfig, SystemEnv,
    gateway::{self, AppState},
};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Scrawl drawing-and-guessing game server
#[derive(Parser, Debug)]
#[command(name = "scrawl-server")]
#[command(about = "Room-based drawing-and-guessing game server")]
#[command(version)]
struct Args {
    /// Address to bind to
    #[arg(short, long, default_value = "0.0.0.0:8080")]
    bind: String,

    /// Drawing turn length in seconds
    #[arg(long, default_value = "60")]
    turn_secs: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry().with(fmt::layer()).with(filter).init();

    tracing::info!("Scrawl server starting");
    tracing::info!("Binding to {}", args.bind);

    let env = SystemEnv::new();
    let config = ServerConfig { turn_duration: Duration::from_secs(args.turn_secs) };
    let coordinator: Arc<_> =
        Coordinator::spawn(env.clone(), CatalogWordBank::new(), MemoryRoomStore::new(), config);

    let app = gateway::router(AppState { coordinator, env });

    let listener = tokio::net::TcpListener::bind(&args.bind).await?;
    tracing::info!("Server listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}
