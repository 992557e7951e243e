//! # Database Migrations
//!
//! Embedded SQL migrations for Bahi.
//!
//! ## Schema
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  stocks           id, tenant_id, item, hsn, uom, grate, rate, qty,     │
//! │                   batches (JSON TEXT)                                  │
//! │                                                                         │
//! │  bill_sequences   tenant_id → last_number                              │
//! │                                                                         │
//! │  bills            header, party, rounded totals                        │
//! │    ├── bill_items      one row per cart line                           │
//! │    └── bill_charges    one row per other charge                        │
//! │                   UNIQUE (tenant_id, bill_no)                          │
//! │                                                                         │
//! │  system_config    tenant_id → gst_enabled                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Adding New Migrations
//!
//! 1. Create `migrations/sqlite/NNN_description.sql` with the next number
//! 2. **NEVER** modify an applied migration; add a new one

use sqlx::SqlitePool;
use tracing::info;

use crate::error::DbResult;

/// Migrations embedded from `migrations/sqlite` at compile time.
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/sqlite");

/// Runs all pending migrations in filename order, each in a transaction.
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    info!("Checking for pending migrations");

    MIGRATOR.run(pool).await?;

    info!("All migrations applied successfully");
    Ok(())
}

/// Returns `(embedded, applied)` migration counts.
pub async fn migration_status(pool: &SqlitePool) -> DbResult<(usize, usize)> {
    let total = MIGRATOR.migrations.len();

    let applied: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations")
        .fetch_one(pool)
        .await
        .unwrap_or(0);

    Ok((total, applied as usize))
}
