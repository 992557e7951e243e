//! # State Module
//!
//! Application state shared by all handlers.
//!
//! `AppState` is the router state; handlers extract only the part they need
//! (`State<Database>`, `State<DraftStore>`, `State<Arc<AppConfig>>`) through
//! `FromRef`.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    State Architecture                                   │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                      axum Router                                │   │
//! │  │  Router::new()...with_state(AppState { .. })                    │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                              │                                          │
//! │          ┌──────────────────┼──────────────────┐                       │
//! │          ▼                  ▼                  ▼                        │
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────────┐              │
//! │  │   Database   │  │  DraftStore  │  │ Arc<AppConfig>   │              │
//! │  │              │  │              │  │                  │              │
//! │  │  SQLite pool │  │  Arc<Mutex<  │  │  tenant_id       │              │
//! │  │              │  │   HashMap<   │  │  bill format     │              │
//! │  │              │  │   Uuid,Draft>│  │  currency        │              │
//! │  └──────────────┘  └──────────────┘  └──────────────────┘              │
//! │                                                                         │
//! │  THREAD SAFETY:                                                        │
//! │  • Database: internal connection pool                                  │
//! │  • DraftStore: Mutex, never held across .await; idle drafts evicted    │
//! │  • AppConfig: read-only after startup                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod drafts;

use std::sync::Arc;

use axum::extract::FromRef;

use bahi_db::Database;

use crate::config::AppConfig;

pub use drafts::{CheckedOutDraft, DraftStore};

#[derive(Debug, Clone)]
pub struct AppState {
    pub db: Database,
    pub drafts: DraftStore,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(db: Database, config: AppConfig) -> Self {
        AppState {
            db,
            drafts: DraftStore::new(config.draft_idle_timeout()),
            config: Arc::new(config),
        }
    }
}

impl FromRef<AppState> for Database {
    fn from_ref(state: &AppState) -> Self {
        state.db.clone()
    }
}

impl FromRef<AppState> for DraftStore {
    fn from_ref(state: &AppState) -> Self {
        state.drafts.clone()
    }
}

impl FromRef<AppState> for Arc<AppConfig> {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}
