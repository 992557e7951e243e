//! # Column Codec
//!
//! Conversions between stored TEXT columns and domain values.
//!
//! Stored data may predate the current writers (hand-edited rows, older
//! imports), so decoding never fails on a bad number: it logs a warning and
//! uses zero. Structural problems, such as a batches column that is not a
//! JSON list, also decode to an empty value with a warning.

use chrono::NaiveDate;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;
use std::str::FromStr;
use tracing::warn;

use bahi_core::types::Batch;
use bahi_core::Money;

use crate::error::DbResult;

// =============================================================================
// Scalars
// =============================================================================

/// Text form used for every stored decimal.
pub fn decimal_to_text(value: Decimal) -> String {
    value.normalize().to_string()
}

pub fn money_to_text(value: Money) -> String {
    decimal_to_text(value.amount())
}

/// Parses a stored decimal, falling back to zero.
pub fn decimal_from_text(raw: &str, field: &str) -> Decimal {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Decimal::ZERO;
    }
    Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .unwrap_or_else(|_| {
            warn!(field, raw, "Unparseable stored decimal, using 0");
            Decimal::ZERO
        })
}

pub fn money_from_text(raw: &str, field: &str) -> Money {
    Money::new(decimal_from_text(raw, field))
}

/// Parses a stored `YYYY-MM-DD` date; `None` on anything else.
pub fn date_from_text(raw: Option<&str>, field: &str) -> Option<NaiveDate> {
    let raw = raw?.trim();
    if raw.is_empty() {
        return None;
    }
    // Accept a full timestamp by taking its date part.
    let date_part = raw.get(..10).unwrap_or(raw);
    match NaiveDate::parse_from_str(date_part, "%Y-%m-%d") {
        Ok(date) => Some(date),
        Err(_) => {
            warn!(field, raw, "Unparseable stored date, ignoring");
            None
        }
    }
}

fn decimal_from_value(value: &Value, field: &str) -> Decimal {
    match value {
        Value::Null => Decimal::ZERO,
        Value::Number(n) => n
            .as_i64()
            .map(Decimal::from)
            .or_else(|| n.as_f64().and_then(Decimal::from_f64))
            .unwrap_or_else(|| {
                warn!(field, raw = %n, "Unrepresentable number, using 0");
                Decimal::ZERO
            }),
        Value::String(s) => decimal_from_text(s, field),
        other => {
            warn!(field, raw = %other, "Non-numeric value, using 0");
            Decimal::ZERO
        }
    }
}

fn string_from_value(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

// =============================================================================
// Batches
// =============================================================================

#[derive(Serialize)]
struct BatchRecord<'a> {
    batch: Option<&'a str>,
    qty: String,
    rate: String,
    expiry: Option<NaiveDate>,
    mrp: Option<String>,
}

/// Encodes a batch list as the JSON stored in `stocks.batches`.
pub fn encode_batches(batches: &[Batch]) -> DbResult<String> {
    let records: Vec<BatchRecord<'_>> = batches
        .iter()
        .map(|b| BatchRecord {
            batch: b.batch.as_deref(),
            qty: decimal_to_text(b.qty),
            rate: money_to_text(b.rate),
            expiry: b.expiry,
            mrp: b.mrp.map(money_to_text),
        })
        .collect();
    Ok(serde_json::to_string(&records)?)
}

/// Decodes `stocks.batches`, tolerating numbers as JSON numbers or strings
/// and skipping entries that are not objects.
pub fn decode_batches(raw: &str, stock_id: &str) -> Vec<Batch> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }

    let entries = match serde_json::from_str::<Value>(trimmed) {
        Ok(Value::Array(entries)) => entries,
        _ => {
            warn!(stock_id, "Stored batches are not a JSON list, treating as none");
            return Vec::new();
        }
    };

    entries
        .iter()
        .filter_map(|entry| {
            let Some(obj) = entry.as_object() else {
                warn!(stock_id, "Skipping non-object batch entry");
                return None;
            };
            let null = Value::Null;
            Some(Batch {
                batch: string_from_value(obj.get("batch")),
                qty: decimal_from_value(obj.get("qty").unwrap_or(&null), "batch.qty"),
                rate: Money::new(decimal_from_value(
                    obj.get("rate").unwrap_or(&null),
                    "batch.rate",
                )),
                expiry: date_from_text(
                    obj.get("expiry").and_then(Value::as_str),
                    "batch.expiry",
                ),
                mrp: obj
                    .get("mrp")
                    .filter(|v| !v.is_null())
                    .map(|v| Money::new(decimal_from_value(v, "batch.mrp"))),
            })
        })
        .collect()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decimal_from_text_fallback() {
        assert_eq!(decimal_from_text("12.50", "x"), Decimal::new(1250, 2));
        assert_eq!(decimal_from_text("", "x"), Decimal::ZERO);
        assert_eq!(decimal_from_text("n/a", "x"), Decimal::ZERO);
    }

    #[test]
    fn test_batches_encode_decode() {
        let batches = vec![
            Batch {
                batch: Some("L-1".into()),
                qty: Decimal::new(125, 1),
                rate: Money::from_paise(4999),
                expiry: NaiveDate::from_ymd_opt(2026, 12, 31),
                mrp: Some(Money::from_rupees(60)),
            },
            Batch {
                batch: None,
                qty: Decimal::from(3),
                rate: Money::from_rupees(45),
                expiry: None,
                mrp: None,
            },
        ];

        let decoded = decode_batches(&encode_batches(&batches).unwrap(), "s1");
        assert_eq!(decoded, batches);
    }

    #[test]
    fn test_decode_tolerates_mixed_shapes() {
        let raw = r#"[
            {"batch": "A", "qty": 5, "rate": "10.5", "expiry": "2027-01-31"},
            {"batch": 42, "qty": "lots", "rate": 7.25, "mrp": null},
            "garbage"
        ]"#;
        let decoded = decode_batches(raw, "s1");

        assert_eq!(decoded.len(), 2);
        assert_eq!(decoded[0].qty, Decimal::from(5));
        assert_eq!(decoded[0].rate, Money::from_paise(1050));
        assert_eq!(decoded[0].expiry, NaiveDate::from_ymd_opt(2027, 1, 31));
        assert_eq!(decoded[1].batch.as_deref(), Some("42"));
        assert_eq!(decoded[1].qty, Decimal::ZERO);
        assert_eq!(decoded[1].rate, Money::from_paise(725));
        assert_eq!(decoded[1].mrp, None);
    }

    #[test]
    fn test_decode_not_a_list() {
        assert!(decode_batches("{}", "s1").is_empty());
        assert!(decode_batches("not json", "s1").is_empty());
        assert!(decode_batches("", "s1").is_empty());
    }
}
