//! # Domain Types
//!
//! Core domain types used throughout Bahi.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │   StockItem     │   │  StockSnapshot  │   │  InvoiceMeta    │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id             │──►│  stock_id       │   │  bill_no        │       │
//! │  │  item, hsn, uom │   │  batch (label)  │   │  date           │       │
//! │  │  grate, rate    │   │  qty, rate      │   │  bill_type      │       │
//! │  │  batches[] ─────┼─┐ │  expiry, mrp    │   │  reverse_charge │       │
//! │  └─────────────────┘ │ └─────────────────┘   └─────────────────┘       │
//! │                      │                                                  │
//! │  ┌─────────────────┐ │ ┌─────────────────┐   ┌─────────────────┐       │
//! │  │     Batch       │◄┘ │     Party       │   │    BillType     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  batch (label?) │   │  name, gstin    │   │  IntraState     │       │
//! │  │  qty, rate      │   │  state_code     │   │  InterState     │       │
//! │  │  expiry?, mrp?  │   │  address        │   └─────────────────┘       │
//! │  └─────────────────┘   └─────────────────┘                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Snapshot Pattern
//! A `StockItem` is the catalog's live record. Whatever the cart needs from it
//! is copied into a `StockSnapshot` at add time, so later catalog edits never
//! change a line that is already on an invoice.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::money::Money;

// =============================================================================
// Stock
// =============================================================================

/// One inventory batch of a stock item.
///
/// A batch has its own label, quantity, price and expiry. The label may be
/// absent for stock that was received without one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Batch {
    /// Batch label (lot number). `None` for unlabelled stock.
    #[serde(default)]
    pub batch: Option<String>,

    /// Quantity available in this batch.
    #[serde(default)]
    pub qty: Decimal,

    /// Sale rate for this batch.
    #[serde(default)]
    pub rate: Money,

    #[serde(default)]
    pub expiry: Option<NaiveDate>,

    /// Maximum retail price printed on the pack.
    #[serde(default)]
    pub mrp: Option<Money>,
}

/// A stock item as held by the stock catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockItem {
    pub id: String,

    /// Item description shown on the invoice.
    pub item: String,

    /// HSN (goods) or SAC (services) code.
    #[serde(default)]
    pub hsn: String,

    /// Manufacturer / brand.
    #[serde(default)]
    pub oem: Option<String>,

    /// Unit of measure (NOS, KG, BAG, ...).
    #[serde(default)]
    pub uom: String,

    /// GST rate in percent (0, 5, 12, 18, 28).
    #[serde(default)]
    pub grate: Decimal,

    /// Default sale rate when the item has no batches.
    #[serde(default)]
    pub rate: Money,

    /// Top-level quantity when the item has no batches.
    #[serde(default)]
    pub qty: Decimal,

    /// Batches in catalog order.
    #[serde(default)]
    pub batches: Vec<Batch>,
}

impl StockItem {
    /// Whether adding this item needs an explicit batch choice.
    pub fn requires_batch_selection(&self) -> bool {
        self.batches.len() > 1
    }
}

/// The frozen view of a stock item (and at most one batch) that a cart line
/// is built from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockSnapshot {
    pub stock_id: String,
    pub item: String,
    pub hsn: String,
    pub oem: Option<String>,
    pub uom: String,
    pub grate: Decimal,
    pub batch: Option<String>,
    pub qty: Decimal,
    pub rate: Money,
    pub expiry: Option<NaiveDate>,
    pub mrp: Option<Money>,
}

impl StockSnapshot {
    /// Snapshot of an item sold at its own rate and quantity.
    pub fn from_item(stock: &StockItem) -> Self {
        Self {
            stock_id: stock.id.clone(),
            item: stock.item.clone(),
            hsn: stock.hsn.clone(),
            oem: stock.oem.clone(),
            uom: stock.uom.clone(),
            grate: stock.grate,
            batch: None,
            qty: stock.qty,
            rate: stock.rate,
            expiry: None,
            mrp: None,
        }
    }

    /// Snapshot of an item with one batch's fields merged over the item's.
    ///
    /// Shared fields (description, HSN, OEM, UOM, GST rate) come from the
    /// parent; label, quantity, rate, expiry and MRP come from the batch.
    pub fn from_batch(stock: &StockItem, batch: &Batch) -> Self {
        Self {
            batch: batch.batch.clone(),
            qty: batch.qty,
            rate: batch.rate,
            expiry: batch.expiry,
            mrp: batch.mrp,
            ..Self::from_item(stock)
        }
    }
}

/// Optional rate / discount supplied when adding a line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineOverrides {
    #[serde(default)]
    pub rate: Option<Money>,
    #[serde(default)]
    pub disc: Option<Decimal>,
}

// =============================================================================
// Bill Type
// =============================================================================

/// Whether the supply is within one state or across states.
///
/// This is the only input that decides between CGST+SGST and IGST.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "kebab-case"))]
#[serde(rename_all = "kebab-case")]
pub enum BillType {
    /// Supply within the firm's state: CGST + SGST.
    #[default]
    IntraState,
    /// Supply to another state: IGST.
    InterState,
}

impl BillType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BillType::IntraState => "intra-state",
            BillType::InterState => "inter-state",
        }
    }

    /// Parses a stored bill type; anything unrecognised is intra-state.
    pub fn parse_lossy(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "inter-state" | "inter_state" | "interstate" | "igst" => BillType::InterState,
            _ => BillType::IntraState,
        }
    }
}

// =============================================================================
// Invoice Meta
// =============================================================================

/// Invoice header fields.
///
/// `bill_no` holds the previewed number while the invoice is a draft; the
/// number actually issued is allocated at commit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceMeta {
    #[serde(default)]
    pub bill_no: String,

    #[serde(default = "today")]
    pub date: NaiveDate,

    #[serde(default)]
    pub bill_type: BillType,

    #[serde(default)]
    pub reverse_charge: bool,

    #[serde(default)]
    pub reference: Option<String>,

    #[serde(default)]
    pub vehicle_no: Option<String>,

    #[serde(default)]
    pub dispatch_through: Option<String>,

    #[serde(default)]
    pub narration: Option<String>,
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

impl InvoiceMeta {
    /// Creates a meta block dated today with no free-text fields.
    pub fn new(bill_no: impl Into<String>, bill_type: BillType) -> Self {
        Self {
            bill_no: bill_no.into(),
            date: today(),
            bill_type,
            reverse_charge: false,
            reference: None,
            vehicle_no: None,
            dispatch_through: None,
            narration: None,
        }
    }

    /// Builder-style reverse charge flag.
    pub fn with_reverse_charge(mut self, reverse_charge: bool) -> Self {
        self.reverse_charge = reverse_charge;
        self
    }

    /// Drops the free-text fields, keeping number, date and tax settings.
    pub fn clear_free_text(&mut self) {
        self.reference = None;
        self.vehicle_no = None;
        self.dispatch_through = None;
        self.narration = None;
    }
}

impl Default for InvoiceMeta {
    fn default() -> Self {
        Self::new(String::new(), BillType::default())
    }
}

// =============================================================================
// Parties
// =============================================================================

/// The buyer (bill-to party).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Party {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub gstin: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub state_code: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

impl Party {
    /// The party's two-digit state code.
    ///
    /// An explicit `state_code` wins; otherwise the first two characters of
    /// the GSTIN are used when they are digits.
    pub fn effective_state_code(&self) -> Option<String> {
        if let Some(code) = self.state_code.as_deref().map(str::trim) {
            if !code.is_empty() {
                return Some(code.to_string());
            }
        }
        let gstin = self.gstin.as_deref()?.trim();
        let prefix = gstin.get(..2)?;
        prefix
            .chars()
            .all(|c| c.is_ascii_digit())
            .then(|| prefix.to_string())
    }
}

/// Ship-to consignee, when different from the buyer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Consignee {
    pub name: String,
    #[serde(default)]
    pub gstin: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

/// Suggests a bill type from the firm's and the party's state codes.
///
/// Returns `None` when the party's state cannot be determined. The caller
/// decides whether to apply the suggestion; the meta's `bill_type` stays the
/// only input to the tax split.
pub fn suggest_bill_type(firm_state_code: &str, party: &Party) -> Option<BillType> {
    let party_code = party.effective_state_code()?;
    if party_code == firm_state_code.trim() {
        Some(BillType::IntraState)
    } else {
        Some(BillType::InterState)
    }
}

// =============================================================================
// Bill Number Format
// =============================================================================

/// How an allocated sequence number is rendered as a bill number.
///
/// ## Example
/// ```rust
/// use bahi_core::types::BillNumberFormat;
///
/// let format = BillNumberFormat::default();
/// assert_eq!(format.format(7), "INV-0007");
/// assert_eq!(format.format(12345), "INV-12345");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillNumberFormat {
    pub prefix: String,
    pub width: usize,
}

impl BillNumberFormat {
    pub fn new(prefix: impl Into<String>, width: usize) -> Self {
        Self {
            prefix: prefix.into(),
            width,
        }
    }

    pub fn format(&self, number: i64) -> String {
        format!("{}{:0width$}", self.prefix, number, width = self.width)
    }
}

impl Default for BillNumberFormat {
    fn default() -> Self {
        Self::new("INV-", 4)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
