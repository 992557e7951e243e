//! # Cart Ledger
//!
//! The ordered list of invoice lines.
//!
//! ## Operations
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Ledger Operations                               │
//! │                                                                         │
//! │  add(snapshot, overrides)                                               │
//! │    ├── same (stock_id, batch) present ──► qty += 1, overrides replace  │
//! │    └── otherwise ─────────────────────► push { qty: 1, ... }           │
//! │                                                                         │
//! │  update(index, field, raw)                                              │
//! │    ├── Qty / Rate ──► coerce_non_negative(raw)                          │
//! │    ├── Disc ────────► coerce_percent(raw)                               │
//! │    └── Narration ───► stored verbatim                                   │
//! │                                                                         │
//! │  remove(index) ──► later lines shift down by one                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Lines are addressed by position. The `(stock_id, batch)` pair is only used
//! to decide whether `add` merges.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{LineOverrides, StockSnapshot};
use crate::validation::{clamp_non_negative, clamp_percent, coerce_non_negative, coerce_percent};

// =============================================================================
// Cart Line
// =============================================================================

/// One invoice line.
///
/// Display fields and `grate` are frozen copies of the stock snapshot taken
/// when the line was added. `batch` never changes after that.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub stock_id: String,
    pub item: String,
    #[serde(default)]
    pub hsn: String,
    #[serde(default)]
    pub oem: Option<String>,
    #[serde(default)]
    pub uom: String,
    #[serde(default)]
    pub batch: Option<String>,
    #[serde(default)]
    pub expiry: Option<NaiveDate>,
    #[serde(default)]
    pub narration: String,
    #[serde(default)]
    pub qty: Decimal,
    #[serde(default)]
    pub rate: Money,
    /// GST rate in percent.
    #[serde(default)]
    pub grate: Decimal,
    /// Discount in percent, `0..=100`.
    #[serde(default)]
    pub disc: Decimal,
}

impl CartLine {
    fn from_snapshot(snapshot: &StockSnapshot, overrides: LineOverrides) -> Self {
        CartLine {
            stock_id: snapshot.stock_id.clone(),
            item: snapshot.item.clone(),
            hsn: snapshot.hsn.clone(),
            oem: snapshot.oem.clone(),
            uom: snapshot.uom.clone(),
            batch: snapshot.batch.clone(),
            expiry: snapshot.expiry,
            narration: String::new(),
            qty: Decimal::ONE,
            rate: overrides
                .rate
                .map(|r| Money::new(clamp_non_negative(r.amount())))
                .unwrap_or(snapshot.rate),
            grate: snapshot.grate,
            disc: overrides.disc.map(clamp_percent).unwrap_or_default(),
        }
    }

    /// Whether this line is the merge target for `snapshot`.
    pub fn matches(&self, snapshot: &StockSnapshot) -> bool {
        self.stock_id == snapshot.stock_id && self.batch == snapshot.batch
    }

    /// `qty × rate × (1 − disc / 100)`, unrounded.
    pub fn line_value(&self) -> Money {
        self.rate
            .multiply_quantity(self.qty)
            .apply_discount(self.disc)
    }

    /// GST on the line value, or zero when GST is off.
    pub fn line_tax(&self, gst_enabled: bool) -> Money {
        if gst_enabled {
            self.line_value().percent(self.grate)
        } else {
            Money::zero()
        }
    }

    /// Brings a line read from storage or a request back inside its bounds.
    pub fn normalized(mut self) -> Self {
        self.qty = clamp_non_negative(self.qty);
        self.rate = Money::new(clamp_non_negative(self.rate.amount()));
        self.grate = clamp_non_negative(self.grate);
        self.disc = clamp_percent(self.disc);
        self
    }
}

/// Editable fields of a cart line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineField {
    Qty,
    Rate,
    Disc,
    Narration,
}

// =============================================================================
// Cart Ledger
// =============================================================================

/// Ordered invoice lines.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CartLedger {
    lines: Vec<CartLine>,
}

impl CartLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a ledger from stored lines, normalizing each.
    pub fn from_lines(lines: Vec<CartLine>) -> Self {
        Self {
            lines: lines.into_iter().map(CartLine::normalized).collect(),
        }
    }

    /// Adds one unit of `snapshot`, merging with an existing line for the
    /// same `(stock_id, batch)`.
    ///
    /// On merge, `overrides.rate` / `overrides.disc` replace the line's
    /// values when present. Returns the index of the affected line.
    pub fn add(&mut self, snapshot: &StockSnapshot, overrides: LineOverrides) -> usize {
        if let Some(index) = self.lines.iter().position(|l| l.matches(snapshot)) {
            let line = &mut self.lines[index];
            line.qty += Decimal::ONE;
            if let Some(rate) = overrides.rate {
                line.rate = Money::new(clamp_non_negative(rate.amount()));
            }
            if let Some(disc) = overrides.disc {
                line.disc = clamp_percent(disc);
            }
            return index;
        }

        self.lines
            .push(CartLine::from_snapshot(snapshot, overrides));
        self.lines.len() - 1
    }

    /// Edits one field of line `index` from raw user input.
    pub fn update(&mut self, index: usize, field: LineField, raw: &str) -> CoreResult<()> {
        let len = self.lines.len();
        let line = self
            .lines
            .get_mut(index)
            .ok_or(CoreError::LineNotFound { index, len })?;

        match field {
            LineField::Qty => line.qty = coerce_non_negative(raw),
            LineField::Rate => line.rate = Money::new(coerce_non_negative(raw)),
            LineField::Disc => line.disc = coerce_percent(raw),
            LineField::Narration => line.narration = raw.to_string(),
        }
        Ok(())
    }

    /// Removes line `index` and returns it.
    pub fn remove(&mut self, index: usize) -> CoreResult<CartLine> {
        if index >= self.lines.len() {
            return Err(CoreError::LineNotFound {
                index,
                len: self.lines.len(),
            });
        }
        Ok(self.lines.remove(index))
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Sum of line quantities.
    pub fn total_quantity(&self) -> Decimal {
        self.lines.iter().map(|l| l.qty).sum()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
