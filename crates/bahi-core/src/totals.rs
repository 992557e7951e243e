//! # Invoice Totals
//!
//! Folds the ledgers and the tax engine into the payable amounts, and formats
//! money for display.
//!
//! ```text
//! grand_total = total_taxable
//!             + line tax        (0 under reverse charge)
//!             + other_subtotal
//!             + other_gst       (0 under reverse charge)
//!             = total_taxable + total_tax + other_subtotal
//! ```
//!
//! `total_tax` is CGST + SGST + IGST, which already contains the other-charge
//! GST, so it is not added a second time.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::cart::CartLedger;
use crate::charges::OtherChargesLedger;
use crate::money::Money;
use crate::tax::{self, RateBreakup, TaxContext};
use crate::types::InvoiceMeta;

// =============================================================================
// Invoice Totals
// =============================================================================

/// Derived totals of an invoice. A pure function of the draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceTotals {
    pub total_taxable: Money,
    pub cgst: Money,
    pub sgst: Money,
    pub igst: Money,
    pub total_tax: Money,
    pub other_subtotal: Money,
    pub other_gst: Money,
    pub grand_total: Money,
    pub line_count: usize,
    pub total_quantity: Decimal,
}

impl InvoiceTotals {
    /// Computes exact totals.
    pub fn compute(
        cart: &CartLedger,
        charges: &OtherChargesLedger,
        meta: &InvoiceMeta,
        gst_enabled: bool,
    ) -> Self {
        let summary = tax::compute(
            cart.lines(),
            charges.charges(),
            TaxContext::from_meta(meta, gst_enabled),
        );
        let total_tax = summary.total_tax();

        InvoiceTotals {
            total_taxable: summary.total_taxable,
            cgst: summary.cgst,
            sgst: summary.sgst,
            igst: summary.igst,
            total_tax,
            other_subtotal: summary.other_subtotal,
            other_gst: summary.other_gst,
            grand_total: summary.total_taxable + total_tax + summary.other_subtotal,
            line_count: cart.len(),
            total_quantity: cart.total_quantity(),
        }
    }

    /// Per-rate table for the same invoice.
    pub fn rate_breakup(
        cart: &CartLedger,
        charges: &OtherChargesLedger,
        meta: &InvoiceMeta,
        gst_enabled: bool,
    ) -> Vec<RateBreakup> {
        tax::rate_breakup(
            cart.lines(),
            charges.charges(),
            TaxContext::from_meta(meta, gst_enabled),
        )
    }

    /// Paise-rounded totals, as persisted and printed.
    ///
    /// Each head is rounded half-up on its own; `total_tax` and `grand_total`
    /// are then re-added from the rounded heads so the stored figures
    /// reconcile. They can differ from the exact totals by a paisa.
    pub fn rounded(&self) -> Self {
        let total_taxable = self.total_taxable.round_half_up();
        let cgst = self.cgst.round_half_up();
        let sgst = self.sgst.round_half_up();
        let igst = self.igst.round_half_up();
        let other_subtotal = self.other_subtotal.round_half_up();
        let total_tax = cgst + sgst + igst;

        InvoiceTotals {
            total_taxable,
            cgst,
            sgst,
            igst,
            total_tax,
            other_subtotal,
            other_gst: self.other_gst.round_half_up(),
            grand_total: total_taxable + total_tax + other_subtotal,
            line_count: self.line_count,
            total_quantity: self.total_quantity,
        }
    }
}

// =============================================================================
// Currency Formatting
// =============================================================================

/// How integer digits are grouped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Grouping {
    /// 12,34,567.89
    #[default]
    Indian,
    /// 1,234,567.89
    Western,
}

/// Tenant currency display: symbol, digit grouping, two decimals.
///
/// ## Example
/// ```rust
/// use bahi_core::{CurrencyFormat, Money};
///
/// let inr = CurrencyFormat::inr();
/// assert_eq!(inr.format(Money::from_paise(123456789)), "₹12,34,567.89");
/// assert_eq!(inr.format(Money::from_paise(21240)), "₹212.40");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencyFormat {
    pub symbol: String,
    pub grouping: Grouping,
}

impl CurrencyFormat {
    pub fn new(symbol: impl Into<String>, grouping: Grouping) -> Self {
        Self {
            symbol: symbol.into(),
            grouping,
        }
    }

    /// Indian rupee with lakh/crore grouping.
    pub fn inr() -> Self {
        Self::new("₹", Grouping::Indian)
    }

    /// Formats `amount` rounded half-up to exactly two decimals.
    pub fn format(&self, amount: Money) -> String {
        let rounded = amount.round_half_up().amount();
        let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
            "-"
        } else {
            ""
        };
        let digits = format!("{:.2}", rounded.abs());
        let (int_part, frac_part) = digits.split_once('.').unwrap_or((digits.as_str(), "00"));

        format!(
            "{}{}{}.{}",
            sign,
            self.symbol,
            self.group(int_part),
            frac_part
        )
    }

    fn group(&self, int_part: &str) -> String {
        if int_part.len() <= 3 {
            return int_part.to_string();
        }
        let (head, last3) = int_part.split_at(int_part.len() - 3);
        let size = match self.grouping {
            Grouping::Indian => 2,
            Grouping::Western => 3,
        };

        let mut groups: Vec<&str> = Vec::new();
        let mut end = head.len();
        while end > 0 {
            let start = end.saturating_sub(size);
            groups.push(&head[start..end]);
            end = start;
        }
        groups.reverse();

        format!("{},{}", groups.join(","), last3)
    }
}

impl Default for CurrencyFormat {
    fn default() -> Self {
        Self::inr()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
