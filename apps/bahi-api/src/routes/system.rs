//! # System Routes
//!
//! Health, bill number preview and tenant settings.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::debug;

use bahi_db::Database;

use crate::config::AppConfig;
use crate::error::ApiResult;

pub async fn health(State(db): State<Database>) -> (StatusCode, Json<Value>) {
    let database = db.health_check().await;
    let (status, label) = if database {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };

    (
        status,
        Json(json!({
            "status": label,
            "database": database,
            "version": env!("CARGO_PKG_VERSION"),
        })),
    )
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NextBillNumber {
    pub next_bill_number: String,
}

/// The number the next commit would receive. Never consumes it.
pub async fn next_bill_number(
    State(db): State<Database>,
    State(config): State<Arc<AppConfig>>,
) -> ApiResult<Json<NextBillNumber>> {
    let next_bill_number = db
        .sequences()
        .preview_bill_no(&config.tenant_id, &config.bill_format())
        .await?;

    debug!(%next_bill_number, "next_bill_number");
    Ok(Json(NextBillNumber { next_bill_number }))
}

#[derive(Debug, Serialize)]
pub struct GstStatus {
    pub gst_enabled: bool,
}

pub async fn gst_status(
    State(db): State<Database>,
    State(config): State<Arc<AppConfig>>,
) -> ApiResult<Json<GstStatus>> {
    let gst_enabled = db.system_config().gst_enabled(&config.tenant_id).await?;
    Ok(Json(GstStatus { gst_enabled }))
}
