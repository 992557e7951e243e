//! # Invoice Draft
//!
//! The invoice being edited: cart, other charges, header, buyer and
//! consignee, plus the tenant's GST switch as read when the draft was opened.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  new(meta, gst_enabled)  or  from_stored(bill)                          │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  add_stock / add_stock_batch / update_line / add_charge / set_party    │
//! │        │                          ▲                                     │
//! │        │                          │ commit failed: draft untouched      │
//! │        ▼                          │                                     │
//! │  commit_payload() ──► owned snapshot ──► persistence (allocates number) │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A draft is a plain value. Nothing here reads global state.

use serde::{Deserialize, Serialize};

use crate::batch::{self, BatchResolution};
use crate::cart::{CartLedger, CartLine, LineField};
use crate::charges::{OtherCharge, OtherChargesLedger};
use crate::error::{CoreResult, ValidationError};
use crate::tax::RateBreakup;
use crate::totals::InvoiceTotals;
use crate::types::{Batch, Consignee, InvoiceMeta, LineOverrides, Party, StockItem};

/// Result of adding a stock item to a draft.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum AddOutcome {
    /// The line at `index` was created or incremented.
    Added { index: usize },
    /// The item has several batches; the caller must pick one.
    SelectBatch { batches: Vec<Batch> },
}

/// An invoice under construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceDraft {
    pub meta: InvoiceMeta,
    pub cart: CartLedger,
    pub other_charges: OtherChargesLedger,
    pub party: Option<Party>,
    pub consignee: Option<Consignee>,
    pub gst_enabled: bool,
}

impl InvoiceDraft {
    pub fn new(meta: InvoiceMeta, gst_enabled: bool) -> Self {
        Self {
            meta,
            cart: CartLedger::new(),
            other_charges: OtherChargesLedger::new(),
            party: None,
            consignee: None,
            gst_enabled,
        }
    }

    /// Rebuilds a draft from a persisted bill.
    ///
    /// Lines are normalized and other-charge GST is recomputed against
    /// `gst_enabled`.
    pub fn from_stored(
        meta: InvoiceMeta,
        party: Option<Party>,
        consignee: Option<Consignee>,
        lines: Vec<CartLine>,
        charges: Vec<OtherCharge>,
        gst_enabled: bool,
    ) -> Self {
        Self {
            meta,
            cart: CartLedger::from_lines(lines),
            other_charges: OtherChargesLedger::from_charges(charges, gst_enabled),
            party,
            consignee,
            gst_enabled,
        }
    }

    // =========================================================================
    // Lines
    // =========================================================================

    /// Adds one unit of `stock`, or asks for a batch when it has several.
    pub fn add_stock(&mut self, stock: &StockItem, overrides: LineOverrides) -> AddOutcome {
        match batch::resolve(stock) {
            BatchResolution::Resolved(snapshot) => AddOutcome::Added {
                index: self.cart.add(&snapshot, overrides),
            },
            BatchResolution::NeedsSelection(batches) => AddOutcome::SelectBatch { batches },
        }
    }

    /// Adds one unit of `stock.batches[index]`.
    pub fn add_stock_batch(
        &mut self,
        stock: &StockItem,
        index: usize,
        overrides: LineOverrides,
    ) -> CoreResult<usize> {
        let snapshot = batch::select(stock, index)?;
        Ok(self.cart.add(&snapshot, overrides))
    }

    /// Adds one unit of the batch labelled `label`.
    pub fn add_stock_batch_label(
        &mut self,
        stock: &StockItem,
        label: &str,
        overrides: LineOverrides,
    ) -> CoreResult<usize> {
        let snapshot = batch::select_by_label(stock, label)?;
        Ok(self.cart.add(&snapshot, overrides))
    }

    pub fn update_line(&mut self, index: usize, field: LineField, raw: &str) -> CoreResult<()> {
        self.cart.update(index, field, raw)
    }

    pub fn remove_line(&mut self, index: usize) -> CoreResult<CartLine> {
        self.cart.remove(index)
    }

    // =========================================================================
    // Other charges
    // =========================================================================

    pub fn add_charge(&mut self, charge: OtherCharge) -> usize {
        self.other_charges.add(charge, self.gst_enabled)
    }

    pub fn update_charge(&mut self, index: usize, charge: OtherCharge) -> CoreResult<()> {
        self.other_charges.update(index, charge, self.gst_enabled)
    }

    pub fn remove_charge(&mut self, index: usize) -> CoreResult<OtherCharge> {
        self.other_charges.remove(index)
    }

    // =========================================================================
    // Header
    // =========================================================================

    pub fn set_meta(&mut self, meta: InvoiceMeta) {
        self.meta = meta;
    }

    pub fn set_party(&mut self, party: Option<Party>) {
        self.party = party;
    }

    pub fn set_consignee(&mut self, consignee: Option<Consignee>) {
        self.consignee = consignee;
    }

    /// Empties the draft for a fresh invoice.
    ///
    /// Lines, charges, party, consignee and the free-text header fields go.
    /// Bill number, date, bill type and reverse charge stay.
    pub fn clear(&mut self) {
        self.cart.clear();
        self.other_charges.clear();
        self.party = None;
        self.consignee = None;
        self.meta.clear_free_text();
    }

    // =========================================================================
    // Derived
    // =========================================================================

    pub fn totals(&self) -> InvoiceTotals {
        InvoiceTotals::compute(&self.cart, &self.other_charges, &self.meta, self.gst_enabled)
    }

    pub fn rate_breakup(&self) -> Vec<RateBreakup> {
        InvoiceTotals::rate_breakup(&self.cart, &self.other_charges, &self.meta, self.gst_enabled)
    }

    /// Validates the draft and snapshots what a commit persists.
    ///
    /// ## Errors
    /// - `ValidationError::EmptyCart` when there are no lines
    /// - `ValidationError::MissingParty` when no buyer (or a blank one) is set
    pub fn commit_payload(&self) -> CoreResult<CommitPayload> {
        if self.cart.is_empty() {
            return Err(ValidationError::EmptyCart.into());
        }
        let party = self
            .party
            .clone()
            .filter(|p| !p.name.trim().is_empty())
            .ok_or(ValidationError::MissingParty)?;

        Ok(CommitPayload {
            meta: self.meta.clone(),
            party,
            consignee: self.consignee.clone(),
            lines: self.cart.lines().to_vec(),
            charges: self.other_charges.charges().to_vec(),
            totals: self.totals().rounded(),
            gst_enabled: self.gst_enabled,
        })
    }
}

// =============================================================================
// Commit Payload
// =============================================================================

/// Owned snapshot of a draft, ready to be written in one transaction.
///
/// `meta.bill_no` is the preview; the persistence layer replaces it with the
/// allocated number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitPayload {
    pub meta: InvoiceMeta,
    pub party: Party,
    pub consignee: Option<Consignee>,
    pub lines: Vec<CartLine>,
    pub charges: Vec<OtherCharge>,
    /// Paise-rounded.
    pub totals: InvoiceTotals,
    pub gst_enabled: bool,
}

// =============================================================================
// Bill Request
// =============================================================================

/// A complete bill submitted in one request.
///
/// Client-side totals are not accepted; they are recomputed from the lines.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillRequest {
    #[serde(default)]
    pub meta: InvoiceMeta,
    #[serde(default)]
    pub party: Option<Party>,
    #[serde(default)]
    pub cart: Vec<CartLine>,
    #[serde(default)]
    pub other_charges: Vec<OtherCharge>,
    #[serde(default)]
    pub consignee: Option<Consignee>,
}

impl BillRequest {
    pub fn into_draft(self, gst_enabled: bool) -> InvoiceDraft {
        InvoiceDraft::from_stored(
            self.meta,
            self.party,
            self.consignee,
            self.cart,
            self.other_charges,
            gst_enabled,
        )
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
