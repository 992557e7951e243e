//! # bahi-core: Pure Business Logic for Bahi
//!
//! This crate is the **heart** of the sales module. It turns a cart of stock
//! lines plus ad-hoc charges into a GST tax invoice, with zero I/O.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Bahi Architecture                              │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    bahi-api (axum)                              │   │
//! │  │    /drafts/..  /stocks  /bills  /next-bill-number               │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ bahi-core (THIS CRATE) ★                        │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐  ┌─────────┐  ┌─────────┐  ┌─────────┐  ┌──────┐ │   │
//! │  │   │  batch  │─►│  cart   │─►│   tax   │─►│ totals  │  │draft │ │   │
//! │  │   │Selector │  │ charges │  │ Engine  │  │ format  │  │      │ │   │
//! │  │   └─────────┘  └─────────┘  └─────────┘  └─────────┘  └──────┘ │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              bahi-db (Persistence Boundary)                     │   │
//! │  │      stock catalog, bill sequencer, bill store                  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`money`] - Exact decimal `Money` with half-up display rounding
//! - [`types`] - Stock items, batches, parties, invoice meta
//! - [`batch`] - Batch selection for multi-batch stock
//! - [`cart`] - The cart ledger of invoice lines
//! - [`charges`] - Freight, packing and other non-stock charges
//! - [`tax`] - CGST/SGST/IGST computation with reverse charge
//! - [`totals`] - Invoice totals and currency formatting
//! - [`draft`] - The invoice draft that owns all of the above
//! - [`validation`] - Numeric coercion and boundary validation
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use bahi_core::{BillType, CartLedger, InvoiceMeta, InvoiceTotals, Money, OtherChargesLedger};
//! use bahi_core::types::{LineOverrides, StockSnapshot};
//! use rust_decimal::Decimal;
//!
//! let snapshot = StockSnapshot {
//!     stock_id: "stk-1".into(),
//!     item: "Cement 50kg".into(),
//!     hsn: "2523".into(),
//!     oem: None,
//!     uom: "BAG".into(),
//!     grate: Decimal::from(18),
//!     batch: None,
//!     qty: Decimal::from(40),
//!     rate: Money::from_rupees(100),
//!     expiry: None,
//!     mrp: None,
//! };
//!
//! let mut cart = CartLedger::new();
//! let index = cart.add(&snapshot, LineOverrides::default());
//! cart.add(&snapshot, LineOverrides { rate: None, disc: Some(Decimal::from(10)) });
//! assert_eq!(index, 0);
//!
//! let meta = InvoiceMeta::new("INV-0001", BillType::IntraState);
//! let totals = InvoiceTotals::compute(&cart, &OtherChargesLedger::new(), &meta, true);
//!
//! // 2 × 100 less 10% = 180 taxable, 18% GST = 32.40 split 16.20 / 16.20
//! assert_eq!(totals.total_taxable, Money::from_rupees(180));
//! assert_eq!(totals.cgst, Money::from_paise(1620));
//! assert_eq!(totals.grand_total, Money::from_paise(21240));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod batch;
pub mod cart;
pub mod charges;
pub mod draft;
pub mod error;
pub mod money;
pub mod tax;
pub mod totals;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cart::{CartLedger, CartLine, LineField};
pub use charges::{ChargeType, OtherCharge, OtherChargesLedger};
pub use draft::{AddOutcome, BillRequest, CommitPayload, InvoiceDraft};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use tax::{TaxContext, TaxSummary};
pub use totals::{CurrencyFormat, InvoiceTotals};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Default tenant ID (single-tenant runtime with multi-tenant schema).
///
/// Every table carries `tenant_id`; the application resolves the tenant from
/// configuration and falls back to this value.
pub const DEFAULT_TENANT_ID: &str = "00000000-0000-0000-0000-000000000001";
