//! # Batch Selection
//!
//! Resolves which batch of a stock item a cart addition refers to.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  batches.len()      resolve(stock)                                      │
//! │  ─────────────      ──────────────────────────────────────────────      │
//! │  0                  Resolved(item's own rate / qty, batch = None)       │
//! │  1                  Resolved(the single batch merged onto the item)     │
//! │  2+                 NeedsSelection(batches)  ──► select(stock, index)   │
//! │                                                  select_by_label(...)   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A bad index is an error. It never falls back to the first batch.

use crate::error::{CoreError, CoreResult};
use crate::types::{Batch, StockItem, StockSnapshot};

/// Outcome of looking at a stock item before adding it to a cart.
#[derive(Debug, Clone, PartialEq)]
pub enum BatchResolution {
    /// The item can be added as-is.
    Resolved(StockSnapshot),
    /// The caller must pick one of these batches.
    NeedsSelection(Vec<Batch>),
}

/// Resolves a stock item with zero or one batch; asks for a choice otherwise.
pub fn resolve(stock: &StockItem) -> BatchResolution {
    match stock.batches.as_slice() {
        [] => BatchResolution::Resolved(StockSnapshot::from_item(stock)),
        [only] => BatchResolution::Resolved(StockSnapshot::from_batch(stock, only)),
        many => BatchResolution::NeedsSelection(many.to_vec()),
    }
}

/// Picks `stock.batches[index]`.
///
/// ## Example
/// ```rust
/// use bahi_core::batch::select;
/// use bahi_core::types::StockItem;
/// use bahi_core::CoreError;
///
/// let stock: StockItem = serde_json::from_value(serde_json::json!({
///     "id": "s1", "item": "Syrup", "grate": 12, "rate": 50, "qty": 0,
///     "batches": [
///         { "batch": "A", "qty": 5, "rate": 48 },
///         { "batch": "B", "qty": 9, "rate": 52 }
///     ]
/// })).unwrap();
///
/// assert_eq!(select(&stock, 1).unwrap().batch.as_deref(), Some("B"));
/// assert!(matches!(
///     select(&stock, 2),
///     Err(CoreError::InvalidSelection { index: 2, available: 2 })
/// ));
/// ```
pub fn select(stock: &StockItem, index: usize) -> CoreResult<StockSnapshot> {
    stock
        .batches
        .get(index)
        .map(|batch| StockSnapshot::from_batch(stock, batch))
        .ok_or(CoreError::InvalidSelection {
            index,
            available: stock.batches.len(),
        })
}

/// Picks the batch whose label equals `label`.
pub fn select_by_label(stock: &StockItem, label: &str) -> CoreResult<StockSnapshot> {
    stock
        .batches
        .iter()
        .find(|b| b.batch.as_deref() == Some(label))
        .map(|batch| StockSnapshot::from_batch(stock, batch))
        .ok_or_else(|| CoreError::BatchNotFound {
            stock_id: stock.id.clone(),
            label: label.to_string(),
        })
}
