//! # Other Charges
//!
//! Non-stock charges on an invoice (freight, packing, insurance, ...), each
//! with its own GST rate.
//!
//! `gst_amount` is stored on the charge when it is added or updated, and is
//! zero whenever GST is disabled for the tenant.

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::validation::clamp_non_negative;

/// Kind of non-stock charge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum ChargeType {
    Freight,
    Packing,
    Insurance,
    Handling,
    #[default]
    Other,
}

/// Unknown kinds deserialize as `Other`.
impl<'de> Deserialize<'de> for ChargeType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(ChargeType::parse_lossy(&raw))
    }
}

impl ChargeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChargeType::Freight => "freight",
            ChargeType::Packing => "packing",
            ChargeType::Insurance => "insurance",
            ChargeType::Handling => "handling",
            ChargeType::Other => "other",
        }
    }

    pub fn parse_lossy(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "freight" => ChargeType::Freight,
            "packing" => ChargeType::Packing,
            "insurance" => ChargeType::Insurance,
            "handling" => ChargeType::Handling,
            _ => ChargeType::Other,
        }
    }
}

/// A non-stock charge line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OtherCharge {
    pub name: String,
    #[serde(rename = "type", default)]
    pub charge_type: ChargeType,
    #[serde(default)]
    pub hsn_sac: Option<String>,
    pub amount: Money,
    /// GST rate in percent.
    #[serde(default)]
    pub gst_rate: Decimal,
    /// Derived on add/update; any client-supplied value is overwritten.
    #[serde(default)]
    pub gst_amount: Money,
}

impl OtherCharge {
    pub fn new(name: impl Into<String>, charge_type: ChargeType, amount: Money) -> Self {
        Self {
            name: name.into(),
            charge_type,
            hsn_sac: None,
            amount,
            gst_rate: Decimal::ZERO,
            gst_amount: Money::zero(),
        }
    }

    pub fn with_gst_rate(mut self, gst_rate: Decimal) -> Self {
        self.gst_rate = gst_rate;
        self
    }

    fn recompute(&mut self, gst_enabled: bool) {
        self.gst_rate = clamp_non_negative(self.gst_rate);
        self.gst_amount = if gst_enabled {
            self.amount.percent(self.gst_rate)
        } else {
            Money::zero()
        };
    }
}

/// Ordered list of other charges.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OtherChargesLedger {
    charges: Vec<OtherCharge>,
}

impl OtherChargesLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a ledger, recomputing every stored GST amount.
    pub fn from_charges(charges: Vec<OtherCharge>, gst_enabled: bool) -> Self {
        let mut ledger = Self::new();
        for charge in charges {
            ledger.add(charge, gst_enabled);
        }
        ledger
    }

    /// Appends a charge and returns its index.
    pub fn add(&mut self, mut charge: OtherCharge, gst_enabled: bool) -> usize {
        charge.recompute(gst_enabled);
        self.charges.push(charge);
        self.charges.len() - 1
    }

    /// Replaces charge `index`.
    pub fn update(
        &mut self,
        index: usize,
        mut charge: OtherCharge,
        gst_enabled: bool,
    ) -> CoreResult<()> {
        let len = self.charges.len();
        let slot = self
            .charges
            .get_mut(index)
            .ok_or(CoreError::ChargeNotFound { index, len })?;
        charge.recompute(gst_enabled);
        *slot = charge;
        Ok(())
    }

    pub fn remove(&mut self, index: usize) -> CoreResult<OtherCharge> {
        if index >= self.charges.len() {
            return Err(CoreError::ChargeNotFound {
                index,
                len: self.charges.len(),
            });
        }
        Ok(self.charges.remove(index))
    }

    pub fn clear(&mut self) {
        self.charges.clear();
    }

    pub fn charges(&self) -> &[OtherCharge] {
        &self.charges
    }

    pub fn len(&self) -> usize {
        self.charges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.charges.is_empty()
    }

    /// Sum of charge amounts before GST.
    pub fn subtotal(&self) -> Money {
        self.charges.iter().map(|c| c.amount).sum()
    }
}
