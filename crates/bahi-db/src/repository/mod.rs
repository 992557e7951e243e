//! # Repository Module
//!
//! Database repository implementations for Bahi.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  HTTP handler                                                          │
//! │       │  db.stocks().get_by_id(tenant, id)                             │
//! │       │  db.bills().commit(tenant, &payload, &format)                  │
//! │       ▼                                                                 │
//! │  StockRepository         list / get_by_id / insert / count             │
//! │  SequenceRepository      preview_next / allocate_next                  │
//! │  BillRepository          commit / get / count                          │
//! │  SystemConfigRepository  ensure_tenant / gst_enabled / set_gst_enabled │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite                                                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every method takes the tenant explicitly; no repository holds a default.

pub mod bill;
pub mod config;
pub mod sequence;
pub mod stock;
