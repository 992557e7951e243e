//! # bahi-db: Persistence Layer for Bahi
//!
//! SQLite storage for the stock catalog, bill sequence, committed bills and
//! tenant settings. Async access through sqlx.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Bahi Data Flow                                 │
//! │                                                                         │
//! │  HTTP handler (POST /drafts/{id}/commit)                               │
//! │       │  draft.commit_payload()     (bahi-core, pure)                  │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     bahi-db (THIS CRATE)                        │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories  │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │                │    │  (embedded)  │  │   │
//! │  │   │               │    │ StockRepo      │    │ 001_initial  │  │   │
//! │  │   │ SqlitePool    │◄───│ SequenceRepo   │    │   _schema    │  │   │
//! │  │   │ WAL, FKs on   │    │ BillRepo       │    │              │  │   │
//! │  │   │               │    │ SystemConfig   │    │              │  │   │
//! │  │   └───────────────┘    └────────────────┘    └──────────────┘  │   │
//! │  │            ▲                                                    │   │
//! │  │            └── codec.rs: TEXT columns <-> Decimal / Money       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite file (or :memory: in tests)                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use bahi_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("bahi.db")).await?;
//!
//! let next = db.sequences().preview_bill_no(tenant, &format).await?;
//! let bill = db.bills().commit(tenant, &payload, &format).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod codec;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use repository::bill::{BillRepository, CommittedBill, StoredBill};
pub use repository::config::SystemConfigRepository;
pub use repository::sequence::SequenceRepository;
pub use repository::stock::StockRepository;
