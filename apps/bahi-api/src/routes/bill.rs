//! # Bill Routes
//!
//! One-shot bill submission and read-back of committed bills.
//!
//! ## Submission
//! ```text
//! POST /bills { meta, party, cart, otherCharges, consignee }
//!      │
//!      ├── validate charges and party GSTIN
//!      ├── gst_enabled  ◄── system_config (client cannot set it)
//!      ├── BillRequest::into_draft      lines normalized, charge GST recomputed
//!      ├── InvoiceDraft::commit_payload  totals recomputed and rounded
//!      └── BillRepository::commit        number allocated in the same transaction
//!      │
//!      ▼
//! 201 { id, billNo }
//! ```

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

use bahi_core::validation::validate_charge;
use bahi_core::{BillRequest, InvoiceDraft, InvoiceTotals};
use bahi_db::{CommittedBill, Database};

use crate::config::AppConfig;
use crate::error::{ApiError, ApiResult};
use crate::routes::{validate_party, DraftView};
use crate::state::DraftStore;

/// A committed bill, reopened in draft shape.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BillView {
    pub id: String,
    pub bill_no: String,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub draft: InvoiceDraft,
    /// Totals as stored at commit.
    pub totals: InvoiceTotals,
}

pub async fn create_bill(
    State(db): State<Database>,
    State(config): State<Arc<AppConfig>>,
    Json(request): Json<BillRequest>,
) -> ApiResult<(StatusCode, Json<CommittedBill>)> {
    debug!(
        lines = request.cart.len(),
        charges = request.other_charges.len(),
        "create_bill"
    );

    for charge in &request.other_charges {
        validate_charge(&charge.name, charge.amount)?;
    }
    if let Some(party) = &request.party {
        validate_party(party)?;
    }

    let gst_enabled = db.system_config().gst_enabled(&config.tenant_id).await?;
    let payload = request.into_draft(gst_enabled).commit_payload()?;

    let committed = db
        .bills()
        .commit(&config.tenant_id, &payload, &config.bill_format())
        .await?;

    info!(id = %committed.id, bill_no = %committed.bill_no, "Bill created");
    Ok((StatusCode::CREATED, Json(committed)))
}

pub async fn get_bill(
    State(db): State<Database>,
    State(config): State<Arc<AppConfig>>,
    Path(id): Path<String>,
) -> ApiResult<Json<BillView>> {
    let stored = db
        .bills()
        .get(&config.tenant_id, &id)
        .await?
        .ok_or_else(|| ApiError::not_found("Bill", &id))?;

    let id = stored.id.clone();
    let bill_no = stored.bill_no.clone();
    let created_at = stored.created_at;
    let totals = stored.totals;

    Ok(Json(BillView {
        id,
        bill_no,
        created_at,
        draft: stored.into_draft(),
        totals,
    }))
}

/// Opens a committed bill as a new editable draft.
pub async fn open_bill_draft(
    State(db): State<Database>,
    State(drafts): State<DraftStore>,
    State(config): State<Arc<AppConfig>>,
    Path(id): Path<String>,
) -> ApiResult<(StatusCode, Json<DraftView>)> {
    let stored = db
        .bills()
        .get(&config.tenant_id, &id)
        .await?
        .ok_or_else(|| ApiError::not_found("Bill", &id))?;

    let draft = stored.into_draft();
    let view_source = draft.clone();
    let draft_id = drafts.insert(draft);

    info!(bill_id = %id, %draft_id, "Reopened bill as draft");
    Ok((
        StatusCode::CREATED,
        Json(DraftView::build(draft_id, &view_source, &config)),
    ))
}
