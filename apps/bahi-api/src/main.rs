//! # Bahi API Entry Point
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                           Bahi API                                      │
//! │                                                                         │
//! │  main.rs ────► logging, configuration                                  │
//! │  lib.rs ─────► database, state, router, serve                          │
//! │  routes/ ────► /stocks, /drafts, /bills, /next-bill-number, ...        │
//! │  state/ ─────► Database, DraftStore, AppConfig                         │
//! │                                                                         │
//! │                         ▼                                               │
//! │  SQLite: bahi.db (local file, WAL mode)                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use bahi_api::AppConfig;

#[tokio::main]
async fn main() {
    init_tracing();

    info!(version = env!("CARGO_PKG_VERSION"), "Starting Bahi API");

    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            std::process::exit(2);
        }
    };

    if let Err(e) = bahi_api::run(config).await {
        error!(error = %e, "Bahi API stopped with an error");
        std::process::exit(1);
    }
}

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=bahi=trace` - Show trace for bahi crates only
/// - Default: `info,bahi=debug,sqlx=warn`
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,bahi=debug,sqlx=warn"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}
