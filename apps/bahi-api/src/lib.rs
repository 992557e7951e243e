//! # Bahi API Library
//!
//! HTTP application for Bahi: stock lookup, server-held invoice drafts and
//! bill commits.
//!
//! ## Module Organization
//! ```text
//! bahi_api/
//! ├── lib.rs          ◄─── You are here (startup & serve)
//! ├── config.rs       ◄─── AppConfig: defaults, TOML file, BAHI_* env
//! ├── state/
//! │   ├── mod.rs      ◄─── AppState + FromRef sub-states
//! │   └── drafts.rs   ◄─── DraftStore
//! ├── routes/
//! │   ├── mod.rs      ◄─── Router, DraftView
//! │   ├── system.rs   ◄─── health, next bill number, GST status
//! │   ├── stock.rs    ◄─── stock catalog
//! │   ├── bill.rs     ◄─── one-shot bills, read-back
//! │   └── draft.rs    ◄─── draft editing and commit
//! └── error.rs        ◄─── ApiError → HTTP response
//! ```
//!
//! ## Startup Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Application Startup                               │
//! │                                                                         │
//! │  1. Initialize Logging (main.rs) ─────────────────────────────────────► │
//! │     • tracing-subscriber with env filter                                │
//! │     • Default: info,bahi=debug,sqlx=warn; override with RUST_LOG        │
//! │                                                                         │
//! │  2. Load Configuration ───────────────────────────────────────────────► │
//! │     • defaults → config.toml → BAHI_* environment                       │
//! │                                                                         │
//! │  3. Connect to Database ──────────────────────────────────────────────► │
//! │     • SQLite with WAL mode, pending migrations applied                  │
//! │     • Tenant settings row seeded if missing                             │
//! │                                                                         │
//! │  4. Build Router & Serve ─────────────────────────────────────────────► │
//! │     • Graceful shutdown on Ctrl-C                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod routes;
pub mod state;

use tokio::net::TcpListener;
use tracing::info;

use bahi_db::{Database, DbConfig};

pub use config::{AppConfig, ConfigError};
pub use error::{ApiError, ApiResult, ErrorCode};
pub use routes::router;
pub use state::{AppState, DraftStore};

/// Opens the database for `config` and prepares the tenant.
pub async fn build_state(config: AppConfig) -> Result<AppState, Box<dyn std::error::Error>> {
    let db_path = config.resolve_database_path()?;
    info!(db_path = %db_path.display(), "Database path determined");

    let db = Database::new(DbConfig::new(db_path)).await?;
    info!("Database connected and migrations applied");

    prepare_tenant(&db, &config).await?;
    Ok(AppState::new(db, config))
}

/// Seeds the tenant's settings row with the configured GST default.
pub async fn prepare_tenant(db: &Database, config: &AppConfig) -> bahi_db::DbResult<()> {
    db.system_config()
        .ensure_tenant(&config.tenant_id, config.default_gst_enabled)
        .await
}

/// Serves the API until Ctrl-C.
pub async fn run(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let bind_addr = config.bind_addr.clone();
    let state = build_state(config).await?;
    let app = router(state);

    let listener = TcpListener::bind(&bind_addr).await?;
    info!(addr = %bind_addr, "Bahi API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            info!("Shutting down");
        })
        .await?;

    Ok(())
}
