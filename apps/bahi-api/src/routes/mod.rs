//! # Routes
//!
//! HTTP endpoints, grouped by resource.
//!
//! ## Endpoint Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  system.rs   GET  /health                                               │
//! │              GET  /next-bill-number          preview only               │
//! │              GET  /system-config/gst-status                             │
//! │                                                                         │
//! │  stock.rs    GET  /stocks                                               │
//! │              POST /stocks                                               │
//! │                                                                         │
//! │  bill.rs     POST /bills                     one-shot commit            │
//! │              GET  /bills/{id}                                           │
//! │              POST /bills/{id}/draft          reopen as a draft          │
//! │                                                                         │
//! │  draft.rs    POST   /drafts                                             │
//! │              GET    /drafts/{id}                                        │
//! │              DELETE /drafts/{id}                                        │
//! │              POST   /drafts/{id}/lines                                  │
//! │              PATCH  /drafts/{id}/lines/{index}                          │
//! │              DELETE /drafts/{id}/lines/{index}                          │
//! │              POST   /drafts/{id}/charges                                │
//! │              PUT    /drafts/{id}/charges/{index}                        │
//! │              DELETE /drafts/{id}/charges/{index}                        │
//! │              PUT    /drafts/{id}/meta                                   │
//! │              PUT    /drafts/{id}/party                                  │
//! │              POST   /drafts/{id}/clear                                  │
//! │              POST   /drafts/{id}/commit                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod bill;
pub mod draft;
pub mod stock;
pub mod system;

use axum::routing::{get, patch, post, put};
use axum::Router;
use serde::Serialize;
use uuid::Uuid;

use bahi_core::tax::RateBreakup;
use bahi_core::types::{suggest_bill_type, BillType, Party};
use bahi_core::validation::validate_gstin;
use bahi_core::{InvoiceDraft, InvoiceTotals};

use crate::config::AppConfig;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(system::health))
        .route("/next-bill-number", get(system::next_bill_number))
        .route("/system-config/gst-status", get(system::gst_status))
        .route("/stocks", get(stock::list_stocks).post(stock::create_stock))
        .route("/bills", post(bill::create_bill))
        .route("/bills/{id}", get(bill::get_bill))
        .route("/bills/{id}/draft", post(bill::open_bill_draft))
        .route("/drafts", post(draft::create_draft))
        .route(
            "/drafts/{id}",
            get(draft::get_draft).delete(draft::discard_draft),
        )
        .route("/drafts/{id}/lines", post(draft::add_line))
        .route(
            "/drafts/{id}/lines/{index}",
            patch(draft::update_line).delete(draft::remove_line),
        )
        .route("/drafts/{id}/charges", post(draft::add_charge))
        .route(
            "/drafts/{id}/charges/{index}",
            put(draft::update_charge).delete(draft::remove_charge),
        )
        .route("/drafts/{id}/meta", put(draft::set_meta))
        .route("/drafts/{id}/party", put(draft::set_party))
        .route("/drafts/{id}/clear", post(draft::clear_draft))
        .route("/drafts/{id}/commit", post(draft::commit_draft))
        .with_state(state)
}

// =============================================================================
// Shared Views
// =============================================================================

/// A draft as returned to clients: the editable state plus derived figures.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftView {
    pub id: Uuid,
    #[serde(flatten)]
    pub draft: InvoiceDraft,
    /// Paise-rounded totals.
    pub totals: InvoiceTotals,
    pub rate_breakup: Vec<RateBreakup>,
    /// Grand total formatted for display, e.g. `₹1,23,456.70`.
    pub grand_total_display: String,
    /// Intra/inter-state as implied by the firm's and buyer's state codes.
    pub suggested_bill_type: Option<BillType>,
}

impl DraftView {
    pub fn build(id: Uuid, draft: &InvoiceDraft, config: &AppConfig) -> Self {
        let totals = draft.totals().rounded();
        let suggested_bill_type = match (&config.firm_state_code, &draft.party) {
            (Some(code), Some(party)) => suggest_bill_type(code, party),
            _ => None,
        };

        DraftView {
            id,
            draft: draft.clone(),
            rate_breakup: draft.rate_breakup(),
            grand_total_display: config.currency().format(totals.grand_total),
            totals,
            suggested_bill_type,
        }
    }
}

pub(crate) fn draft_not_found(id: Uuid) -> ApiError {
    ApiError::not_found("Draft", &id.to_string())
}

/// Rejects a malformed buyer GSTIN. A blank GSTIN means unregistered.
pub(crate) fn validate_party(party: &Party) -> ApiResult<()> {
    if let Some(gstin) = party.gstin.as_deref() {
        if !gstin.trim().is_empty() {
            validate_gstin(gstin)?;
        }
    }
    Ok(())
}
