//! # Draft Routes
//!
//! Server-held invoice drafts, edited one operation at a time.
//!
//! ## Draft Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Draft Lifecycle                                      │
//! │                                                                         │
//! │  ┌──────────┐     ┌──────────┐     ┌──────────┐     ┌──────────┐       │
//! │  │  Empty   │────►│ Editing  │────►│ Payload  │────►│ Committed│       │
//! │  │  Draft   │     │          │     │ snapshot │     │   Bill   │       │
//! │  └──────────┘     └──────────┘     └──────────┘     └──────────┘       │
//! │       ▲                │                 │                              │
//! │       │           add_line          commit_draft                        │
//! │       │           update_line       (failure: draft kept as is)         │
//! │       │           add_charge                                            │
//! │       │           set_meta / set_party                                  │
//! │       │                │                                                │
//! │       └─── clear_draft ┘                                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Adding a stock item with several batches and no batch chosen returns
//! `409 BATCH_SELECTION_REQUIRED` with the batches in `details`; the client
//! retries with `batchIndex` or `batchLabel`.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;

use bahi_core::types::{BillType, Consignee, InvoiceMeta, LineOverrides, Party};
use bahi_core::validation::validate_charge;
use bahi_core::{AddOutcome, InvoiceDraft, LineField, Money, OtherCharge};
use bahi_db::{CommittedBill, Database};

use crate::config::AppConfig;
use crate::error::{ApiError, ApiResult, ErrorCode};
use crate::routes::{draft_not_found, validate_party, DraftView};
use crate::state::DraftStore;

// =============================================================================
// Request Bodies
// =============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewDraftRequest {
    pub bill_type: Option<BillType>,
    pub reverse_charge: bool,
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddLineRequest {
    pub stock_id: String,
    #[serde(default)]
    pub batch_index: Option<usize>,
    #[serde(default)]
    pub batch_label: Option<String>,
    #[serde(default)]
    pub rate: Option<Money>,
    #[serde(default)]
    pub disc: Option<Decimal>,
}

/// `value` may be a JSON string or number; anything unparseable becomes 0.
#[derive(Debug, Deserialize)]
pub struct UpdateLineRequest {
    pub field: LineField,
    #[serde(default)]
    pub value: Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetPartyRequest {
    pub party: Option<Party>,
    #[serde(default)]
    pub consignee: Option<Consignee>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexedDraft {
    pub index: usize,
    pub draft: DraftView,
}

// =============================================================================
// Lifecycle
// =============================================================================

/// Opens an empty draft carrying the previewed bill number.
pub async fn create_draft(
    State(db): State<Database>,
    State(drafts): State<DraftStore>,
    State(config): State<Arc<AppConfig>>,
    Json(request): Json<NewDraftRequest>,
) -> ApiResult<(StatusCode, Json<DraftView>)> {
    let bill_no = db
        .sequences()
        .preview_bill_no(&config.tenant_id, &config.bill_format())
        .await?;
    let gst_enabled = db.system_config().gst_enabled(&config.tenant_id).await?;

    let mut meta = InvoiceMeta::new(bill_no, request.bill_type.unwrap_or_default())
        .with_reverse_charge(request.reverse_charge);
    if let Some(date) = request.date {
        meta.date = date;
    }

    let draft = InvoiceDraft::new(meta, gst_enabled);
    let view_source = draft.clone();
    let id = drafts.insert(draft);

    info!(%id, bill_no = %view_source.meta.bill_no, gst_enabled, "Opened draft");
    Ok((
        StatusCode::CREATED,
        Json(DraftView::build(id, &view_source, &config)),
    ))
}

pub async fn get_draft(
    State(drafts): State<DraftStore>,
    State(config): State<Arc<AppConfig>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<DraftView>> {
    drafts
        .with_draft(id, |draft| DraftView::build(id, draft, &config))
        .map(Json)
        .ok_or_else(|| draft_not_found(id))
}

/// Drops the draft. Nothing was persisted, so nothing is undone.
pub async fn discard_draft(
    State(drafts): State<DraftStore>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    drafts.remove(id).ok_or_else(|| draft_not_found(id))?;
    debug!(%id, "Discarded draft");
    Ok(StatusCode::NO_CONTENT)
}

/// Empties lines, charges and parties. Number, date and tax settings stay.
pub async fn clear_draft(
    State(drafts): State<DraftStore>,
    State(config): State<Arc<AppConfig>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<DraftView>> {
    mutate(&drafts, &config, id, |draft| {
        draft.clear();
        Ok(())
    })
    .map(|(_, view)| Json(view))
}

/// Persists the draft as a bill and closes it.
///
/// ## Flow
/// 1. Check the draft out of the store (a concurrent commit now sees 404)
/// 2. Build the payload; validation happens here
/// 3. Commit in one transaction
/// 4. On success discard the draft; on any failure the guard puts it back
pub async fn commit_draft(
    State(db): State<Database>,
    State(drafts): State<DraftStore>,
    State(config): State<Arc<AppConfig>>,
    Path(id): Path<Uuid>,
) -> ApiResult<(StatusCode, Json<CommittedBill>)> {
    let checked_out = drafts.checkout(id).ok_or_else(|| draft_not_found(id))?;
    let payload = checked_out.draft().commit_payload()?;

    let committed = match db
        .bills()
        .commit(&config.tenant_id, &payload, &config.bill_format())
        .await
    {
        Ok(committed) => committed,
        Err(e) => {
            warn!(%id, error = %e, "Commit failed, draft kept");
            return Err(e.into());
        }
    };

    checked_out.complete();
    info!(%id, bill_id = %committed.id, bill_no = %committed.bill_no, "Committed draft");
    Ok((StatusCode::CREATED, Json(committed)))
}

// =============================================================================
// Lines
// =============================================================================

pub async fn add_line(
    State(db): State<Database>,
    State(drafts): State<DraftStore>,
    State(config): State<Arc<AppConfig>>,
    Path(id): Path<Uuid>,
    Json(request): Json<AddLineRequest>,
) -> ApiResult<Json<IndexedDraft>> {
    // Fail fast before the catalog lookup.
    if drafts.with_draft(id, |_| ()).is_none() {
        return Err(draft_not_found(id));
    }

    let stock = db
        .stocks()
        .get_by_id(&config.tenant_id, &request.stock_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Stock", &request.stock_id))?;

    let overrides = LineOverrides {
        rate: request.rate,
        disc: request.disc,
    };
    debug!(%id, stock_id = %stock.id, batch_index = ?request.batch_index, "add_line");

    let (index, draft) = mutate(&drafts, &config, id, |draft| {
        match (request.batch_index, request.batch_label.as_deref()) {
            (Some(index), _) => Ok(draft.add_stock_batch(&stock, index, overrides)?),
            (None, Some(label)) => Ok(draft.add_stock_batch_label(&stock, label, overrides)?),
            (None, None) => match draft.add_stock(&stock, overrides) {
                AddOutcome::Added { index } => Ok(index),
                AddOutcome::SelectBatch { batches } => Err(ApiError::new(
                    ErrorCode::BatchSelectionRequired,
                    format!(
                        "{} has {} batches; choose one with batchIndex",
                        stock.item,
                        batches.len()
                    ),
                )
                .with_details(json!({ "stockId": stock.id, "batches": batches }))),
            },
        }
    })?;

    Ok(Json(IndexedDraft { index, draft }))
}

pub async fn update_line(
    State(drafts): State<DraftStore>,
    State(config): State<Arc<AppConfig>>,
    Path((id, index)): Path<(Uuid, usize)>,
    Json(request): Json<UpdateLineRequest>,
) -> ApiResult<Json<DraftView>> {
    let raw = raw_value(&request.value);
    debug!(%id, index, field = ?request.field, %raw, "update_line");

    mutate(&drafts, &config, id, |draft| {
        Ok(draft.update_line(index, request.field, &raw)?)
    })
    .map(|(_, view)| Json(view))
}

pub async fn remove_line(
    State(drafts): State<DraftStore>,
    State(config): State<Arc<AppConfig>>,
    Path((id, index)): Path<(Uuid, usize)>,
) -> ApiResult<Json<DraftView>> {
    mutate(&drafts, &config, id, |draft| {
        draft.remove_line(index)?;
        Ok(())
    })
    .map(|(_, view)| Json(view))
}

// =============================================================================
// Other Charges
// =============================================================================

pub async fn add_charge(
    State(drafts): State<DraftStore>,
    State(config): State<Arc<AppConfig>>,
    Path(id): Path<Uuid>,
    Json(charge): Json<OtherCharge>,
) -> ApiResult<Json<IndexedDraft>> {
    validate_charge(&charge.name, charge.amount)?;

    let (index, draft) = mutate(&drafts, &config, id, |draft| Ok(draft.add_charge(charge)))?;
    Ok(Json(IndexedDraft { index, draft }))
}

pub async fn update_charge(
    State(drafts): State<DraftStore>,
    State(config): State<Arc<AppConfig>>,
    Path((id, index)): Path<(Uuid, usize)>,
    Json(charge): Json<OtherCharge>,
) -> ApiResult<Json<DraftView>> {
    validate_charge(&charge.name, charge.amount)?;

    mutate(&drafts, &config, id, |draft| {
        Ok(draft.update_charge(index, charge)?)
    })
    .map(|(_, view)| Json(view))
}

pub async fn remove_charge(
    State(drafts): State<DraftStore>,
    State(config): State<Arc<AppConfig>>,
    Path((id, index)): Path<(Uuid, usize)>,
) -> ApiResult<Json<DraftView>> {
    mutate(&drafts, &config, id, |draft| {
        draft.remove_charge(index)?;
        Ok(())
    })
    .map(|(_, view)| Json(view))
}

// =============================================================================
// Header
// =============================================================================

/// Replaces the header. The previewed bill number is kept.
pub async fn set_meta(
    State(drafts): State<DraftStore>,
    State(config): State<Arc<AppConfig>>,
    Path(id): Path<Uuid>,
    Json(mut meta): Json<InvoiceMeta>,
) -> ApiResult<Json<DraftView>> {
    mutate(&drafts, &config, id, |draft| {
        meta.bill_no = draft.meta.bill_no.clone();
        draft.set_meta(meta);
        Ok(())
    })
    .map(|(_, view)| Json(view))
}

pub async fn set_party(
    State(drafts): State<DraftStore>,
    State(config): State<Arc<AppConfig>>,
    Path(id): Path<Uuid>,
    Json(request): Json<SetPartyRequest>,
) -> ApiResult<Json<DraftView>> {
    if let Some(party) = &request.party {
        validate_party(party)?;
    }

    mutate(&drafts, &config, id, |draft| {
        draft.set_party(request.party);
        draft.set_consignee(request.consignee);
        Ok(())
    })
    .map(|(_, view)| Json(view))
}

// =============================================================================
// Helpers
// =============================================================================

/// Applies `f` to the draft under the lock and renders the result.
fn mutate<F, R>(
    drafts: &DraftStore,
    config: &AppConfig,
    id: Uuid,
    f: F,
) -> ApiResult<(R, DraftView)>
where
    F: FnOnce(&mut InvoiceDraft) -> ApiResult<R>,
{
    drafts
        .with_draft_mut(id, |draft| {
            let out = f(draft)?;
            Ok((out, DraftView::build(id, draft, config)))
        })
        .ok_or_else(|| draft_not_found(id))?
}

/// Text handed to the line coercion: strings as-is, numbers in JSON form.
fn raw_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_value() {
        assert_eq!(raw_value(&json!("12.5")), "12.5");
        assert_eq!(raw_value(&json!(3)), "3");
        assert_eq!(raw_value(&json!(2.25)), "2.25");
        assert_eq!(raw_value(&Value::Null), "");
        assert_eq!(raw_value(&json!(true)), "true");
    }

    #[test]
    fn test_new_draft_request_defaults() {
        let request: NewDraftRequest = serde_json::from_str("{}").unwrap();
        assert!(request.bill_type.is_none());
        assert!(!request.reverse_charge);

        let request: NewDraftRequest =
            serde_json::from_str(r#"{"billType":"inter-state","reverseCharge":true}"#).unwrap();
        assert_eq!(request.bill_type, Some(BillType::InterState));
        assert!(request.reverse_charge);
    }
}
