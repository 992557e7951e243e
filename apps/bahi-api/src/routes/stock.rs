//! # Stock Routes
//!
//! The stock catalog as seen by the draft editor.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use rust_decimal::Decimal;
use tracing::{debug, info};

use bahi_core::types::StockItem;
use bahi_core::ValidationError;
use bahi_db::Database;

use crate::config::AppConfig;
use crate::error::ApiResult;

pub async fn list_stocks(
    State(db): State<Database>,
    State(config): State<Arc<AppConfig>>,
) -> ApiResult<Json<Vec<StockItem>>> {
    let items = db.stocks().list(&config.tenant_id).await?;
    debug!(count = items.len(), "list_stocks");
    Ok(Json(items))
}

/// Registers a stock item with its batches.
pub async fn create_stock(
    State(db): State<Database>,
    State(config): State<Arc<AppConfig>>,
    Json(stock): Json<StockItem>,
) -> ApiResult<(StatusCode, Json<StockItem>)> {
    validate_stock(&stock)?;

    db.stocks().insert(&config.tenant_id, &stock).await?;
    info!(id = %stock.id, batches = stock.batches.len(), "Registered stock");
    Ok((StatusCode::CREATED, Json(stock)))
}

fn validate_stock(stock: &StockItem) -> Result<(), ValidationError> {
    if stock.id.trim().is_empty() {
        return Err(ValidationError::Required { field: "id".into() });
    }
    if stock.item.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "item".into(),
        });
    }
    if stock.rate.is_negative() || stock.batches.iter().any(|b| b.rate.is_negative()) {
        return Err(ValidationError::InvalidFormat {
            field: "rate".into(),
            reason: "must not be negative".into(),
        });
    }
    if stock.grate.is_sign_negative() || stock.grate > Decimal::ONE_HUNDRED {
        return Err(ValidationError::InvalidFormat {
            field: "grate".into(),
            reason: "must be between 0 and 100".into(),
        });
    }
    Ok(())
}
