//! # Tax Engine
//!
//! Computes GST for a cart and its other charges.
//!
//! ## Computation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  for each line:                                                         │
//! │      value = qty × rate × (1 − disc/100)        ──► total_taxable       │
//! │      tax   = value × grate/100   (GST enabled)  ──► line_tax            │
//! │                                                                         │
//! │  for each other charge:                                                 │
//! │      amount                                     ──► other_subtotal      │
//! │      amount × gst_rate/100       (GST enabled)  ──► other_gst           │
//! │                                                                         │
//! │  split (line_tax + other_gst):                                          │
//! │      intra-state  ──► cgst = sgst = total / 2                           │
//! │      inter-state  ──► igst = total                                      │
//! │                                                                         │
//! │  reverse charge   ──► every tax field = 0                               │
//! │                       total_taxable and other_subtotal unchanged        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every amount here is exact. Rounding to paise happens in
//! [`crate::totals`].

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::cart::CartLine;
use crate::charges::OtherCharge;
use crate::money::Money;
use crate::types::{BillType, InvoiceMeta};

/// Invoice-level settings the tax computation depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxContext {
    pub bill_type: BillType,
    pub reverse_charge: bool,
    pub gst_enabled: bool,
}

impl TaxContext {
    pub fn from_meta(meta: &InvoiceMeta, gst_enabled: bool) -> Self {
        Self {
            bill_type: meta.bill_type,
            reverse_charge: meta.reverse_charge,
            gst_enabled,
        }
    }

    /// Whether any tax is charged on this invoice.
    pub fn tax_payable(&self) -> bool {
        self.gst_enabled && !self.reverse_charge
    }
}

/// A tax amount divided into its statutory heads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Split {
    pub cgst: Money,
    pub sgst: Money,
    pub igst: Money,
}

/// Divides `tax` according to the bill type.
pub fn split(tax: Money, bill_type: BillType) -> Split {
    match bill_type {
        BillType::IntraState => Split {
            cgst: tax.half(),
            sgst: tax.half(),
            igst: Money::zero(),
        },
        BillType::InterState => Split {
            cgst: Money::zero(),
            sgst: Money::zero(),
            igst: tax,
        },
    }
}

/// Output of [`compute`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxSummary {
    pub total_taxable: Money,
    /// GST on the cart lines alone.
    pub line_tax: Money,
    pub cgst: Money,
    pub sgst: Money,
    pub igst: Money,
    pub other_subtotal: Money,
    pub other_gst: Money,
}

impl TaxSummary {
    /// CGST + SGST + IGST.
    pub fn total_tax(&self) -> Money {
        self.cgst + self.sgst + self.igst
    }
}

/// Computes the tax summary of an invoice.
pub fn compute(lines: &[CartLine], charges: &[OtherCharge], ctx: TaxContext) -> TaxSummary {
    let total_taxable: Money = lines.iter().map(CartLine::line_value).sum();
    let other_subtotal: Money = charges.iter().map(|c| c.amount).sum();

    if !ctx.tax_payable() {
        return TaxSummary {
            total_taxable,
            other_subtotal,
            ..TaxSummary::default()
        };
    }

    let line_tax: Money = lines.iter().map(|l| l.line_tax(true)).sum();
    let other_gst: Money = charges.iter().map(|c| c.amount.percent(c.gst_rate)).sum();
    let Split { cgst, sgst, igst } = split(line_tax + other_gst, ctx.bill_type);

    TaxSummary {
        total_taxable,
        line_tax,
        cgst,
        sgst,
        igst,
        other_subtotal,
        other_gst,
    }
}

// =============================================================================
// Rate Breakup
// =============================================================================

/// Taxable value and tax at one GST rate, for the rate-wise table printed on
/// a tax invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateBreakup {
    /// GST rate in percent.
    pub rate: Decimal,
    pub taxable: Money,
    pub cgst: Money,
    pub sgst: Money,
    pub igst: Money,
}

/// Groups lines and other charges by GST rate, ascending.
///
/// The per-rate taxes sum to the summary's CGST / SGST / IGST.
pub fn rate_breakup(
    lines: &[CartLine],
    charges: &[OtherCharge],
    ctx: TaxContext,
) -> Vec<RateBreakup> {
    let mut taxable_by_rate: BTreeMap<Decimal, Money> = BTreeMap::new();

    for line in lines {
        *taxable_by_rate.entry(line.grate.normalize()).or_default() += line.line_value();
    }
    for charge in charges {
        *taxable_by_rate.entry(charge.gst_rate.normalize()).or_default() += charge.amount;
    }

    taxable_by_rate
        .into_iter()
        .map(|(rate, taxable)| {
            let split = if ctx.tax_payable() {
                split(taxable.percent(rate), ctx.bill_type)
            } else {
                Split::default()
            };
            RateBreakup {
                rate,
                taxable,
                cgst: split.cgst,
                sgst: split.sgst,
                igst: split.igst,
            }
        })
        .collect()
}

// =============================================================================
// Unit Tests
// =============================================================================
