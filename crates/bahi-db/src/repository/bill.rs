//! # Bill Repository
//!
//! Commits drafts as bills and loads them back.
//!
//! ## Commit
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  BEGIN                                                                  │
//! │    allocate_in(tenant)            ──► n         (Sequencing on error)  │
//! │    bill_no = format(n)                                                  │
//! │    INSERT bills                   ──► UNIQUE(tenant_id, bill_no)       │
//! │      taken? allocate_in again, up to MAX_TAKEN_NUMBERS times           │
//! │    INSERT bill_items  × lines                                           │
//! │    INSERT bill_charges × charges                                        │
//! │  COMMIT                                                                 │
//! │                                                                         │
//! │  Any error before COMMIT drops the transaction: no bill, no lines,     │
//! │  and the counter is back where it was.                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Numbers already used by imported bills are skipped, leaving a gap. The
//! commit itself is never retried; a caller that gets `DbError::Sequencing`
//! still holds its draft and may submit again.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};
use uuid::Uuid;

use bahi_core::types::{BillNumberFormat, BillType, Consignee, InvoiceMeta, Party};
use bahi_core::{CartLine, ChargeType, CommitPayload, InvoiceDraft, InvoiceTotals, OtherCharge};

use crate::codec::{
    date_from_text, decimal_from_text, decimal_to_text, money_from_text, money_to_text,
};
use crate::error::{DbError, DbResult};
use crate::repository::sequence::allocate_in;

/// Taken numbers skipped in one commit before giving up.
const MAX_TAKEN_NUMBERS: usize = 16;

/// Identity of a committed bill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommittedBill {
    pub id: String,
    pub bill_no: String,
}

/// A bill as loaded from storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredBill {
    pub id: String,
    pub bill_no: String,
    pub meta: InvoiceMeta,
    pub party: Party,
    pub consignee: Option<Consignee>,
    pub lines: Vec<CartLine>,
    pub charges: Vec<OtherCharge>,
    /// Totals as persisted at commit (paise-rounded).
    pub totals: InvoiceTotals,
    pub gst_enabled: bool,
    pub created_at: DateTime<Utc>,
}

impl StoredBill {
    /// Reopens the bill as an editable draft.
    pub fn into_draft(self) -> InvoiceDraft {
        InvoiceDraft::from_stored(
            self.meta,
            Some(self.party),
            self.consignee,
            self.lines,
            self.charges,
            self.gst_enabled,
        )
    }
}

// =============================================================================
// Rows
// =============================================================================

#[derive(Debug, FromRow)]
struct BillRow {
    id: String,
    bill_no: String,
    bill_date: String,
    bill_type: String,
    reverse_charge: bool,
    reference: Option<String>,
    vehicle_no: Option<String>,
    dispatch_through: Option<String>,
    narration: Option<String>,
    party_id: Option<String>,
    party_name: String,
    party_gstin: Option<String>,
    party_state: Option<String>,
    party_state_code: Option<String>,
    party_address: Option<String>,
    consignee: Option<String>,
    gst_enabled: bool,
    total_taxable: String,
    cgst: String,
    sgst: String,
    igst: String,
    total_tax: String,
    other_subtotal: String,
    other_gst: String,
    grand_total: String,
    created_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
struct ItemRow {
    stock_id: String,
    item: String,
    hsn: String,
    oem: Option<String>,
    uom: String,
    batch: Option<String>,
    expiry: Option<String>,
    narration: String,
    qty: String,
    rate: String,
    grate: String,
    disc: String,
}

impl ItemRow {
    fn into_line(self) -> CartLine {
        CartLine {
            expiry: date_from_text(self.expiry.as_deref(), "bill_items.expiry"),
            qty: decimal_from_text(&self.qty, "bill_items.qty"),
            rate: money_from_text(&self.rate, "bill_items.rate"),
            grate: decimal_from_text(&self.grate, "bill_items.grate"),
            disc: decimal_from_text(&self.disc, "bill_items.disc"),
            stock_id: self.stock_id,
            item: self.item,
            hsn: self.hsn,
            oem: self.oem,
            uom: self.uom,
            batch: self.batch,
            narration: self.narration,
        }
    }
}

#[derive(Debug, FromRow)]
struct ChargeRow {
    name: String,
    charge_type: String,
    hsn_sac: Option<String>,
    amount: String,
    gst_rate: String,
    gst_amount: String,
}

impl ChargeRow {
    fn into_charge(self) -> OtherCharge {
        OtherCharge {
            charge_type: ChargeType::parse_lossy(&self.charge_type),
            amount: money_from_text(&self.amount, "bill_charges.amount"),
            gst_rate: decimal_from_text(&self.gst_rate, "bill_charges.gst_rate"),
            gst_amount: money_from_text(&self.gst_amount, "bill_charges.gst_amount"),
            name: self.name,
            hsn_sac: self.hsn_sac,
        }
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for bill persistence.
#[derive(Debug, Clone)]
pub struct BillRepository {
    pool: SqlitePool,
}

impl BillRepository {
    pub fn new(pool: SqlitePool) -> Self {
        BillRepository { pool }
    }

    /// Allocates a bill number and writes the bill, atomically.
    ///
    /// ## Errors
    /// - `DbError::Sequencing` if no number can be allocated, or the next
    ///   [`MAX_TAKEN_NUMBERS`] numbers are all taken
    /// - any other `DbError` for write failures; nothing is persisted
    pub async fn commit(
        &self,
        tenant_id: &str,
        payload: &CommitPayload,
        format: &BillNumberFormat,
    ) -> DbResult<CommittedBill> {
        let mut tx = self.pool.begin().await?;
        let id = Uuid::new_v4().to_string();

        // A failed INSERT only aborts its own statement, so a taken number
        // is skipped by drawing the next one inside the same transaction.
        let mut skipped = 0;
        let bill_no = loop {
            let number = allocate_in(&mut *tx, tenant_id).await?;
            let bill_no = format.format(number);

            match insert_header(&mut *tx, tenant_id, &id, &bill_no, payload).await {
                Ok(()) => break bill_no,
                Err(DbError::UniqueViolation { field, .. }) if field.contains("bill_no") => {
                    skipped += 1;
                    warn!(tenant_id, %bill_no, "Bill number already issued, skipping");
                    if skipped >= MAX_TAKEN_NUMBERS {
                        return Err(DbError::Sequencing(format!(
                            "{} consecutive bill numbers up to {} are already issued",
                            skipped, bill_no
                        )));
                    }
                }
                Err(other) => return Err(other),
            }
        };

        debug!(tenant_id, %bill_no, lines = payload.lines.len(), "Writing bill");

        for (line_no, line) in payload.lines.iter().enumerate() {
            insert_line(&mut *tx, tenant_id, &id, line_no as i64, line).await?;
        }
        for (line_no, charge) in payload.charges.iter().enumerate() {
            insert_charge(&mut *tx, tenant_id, &id, line_no as i64, charge).await?;
        }

        tx.commit().await?;

        info!(
            tenant_id,
            %id,
            %bill_no,
            grand_total = %payload.totals.grand_total,
            "Committed bill"
        );
        Ok(CommittedBill { id, bill_no })
    }

    /// Loads a bill with its lines and charges.
    pub async fn get(&self, tenant_id: &str, id: &str) -> DbResult<Option<StoredBill>> {
        let row: Option<BillRow> = sqlx::query_as(
            r#"
            SELECT
                id, bill_no, bill_date, bill_type, reverse_charge,
                reference, vehicle_no, dispatch_through, narration,
                party_id, party_name, party_gstin, party_state, party_state_code, party_address,
                consignee, gst_enabled,
                total_taxable, cgst, sgst, igst, total_tax,
                other_subtotal, other_gst, grand_total,
                created_at
            FROM bills
            WHERE tenant_id = ?1 AND id = ?2
            "#,
        )
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let items: Vec<ItemRow> = sqlx::query_as(
            r#"
            SELECT stock_id, item, hsn, oem, uom, batch, expiry, narration,
                   qty, rate, grate, disc
            FROM bill_items
            WHERE bill_id = ?1 AND tenant_id = ?2
            ORDER BY line_no
            "#,
        )
        .bind(id)
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await?;

        let charges: Vec<ChargeRow> = sqlx::query_as(
            r#"
            SELECT name, charge_type, hsn_sac, amount, gst_rate, gst_amount
            FROM bill_charges
            WHERE bill_id = ?1 AND tenant_id = ?2
            ORDER BY line_no
            "#,
        )
        .bind(id)
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(assemble(
            row,
            items.into_iter().map(ItemRow::into_line).collect(),
            charges.into_iter().map(ChargeRow::into_charge).collect(),
        )))
    }

    pub async fn count(&self, tenant_id: &str) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM bills WHERE tenant_id = ?1")
            .bind(tenant_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

// =============================================================================
// Helpers
// =============================================================================

async fn insert_header(
    conn: &mut SqliteConnection,
    tenant_id: &str,
    id: &str,
    bill_no: &str,
    payload: &CommitPayload,
) -> DbResult<()> {
    let meta = &payload.meta;
    let party = &payload.party;
    let totals = &payload.totals;
    let consignee = payload
        .consignee
        .as_ref()
        .map(serde_json::to_string)
        .transpose()?;

    sqlx::query(
        r#"
        INSERT INTO bills (
            id, tenant_id, bill_no, bill_date, bill_type, reverse_charge,
            reference, vehicle_no, dispatch_through, narration,
            party_id, party_name, party_gstin, party_state, party_state_code, party_address,
            consignee, gst_enabled,
            total_taxable, cgst, sgst, igst, total_tax,
            other_subtotal, other_gst, grand_total,
            created_at
        ) VALUES (
            ?1, ?2, ?3, ?4, ?5, ?6,
            ?7, ?8, ?9, ?10,
            ?11, ?12, ?13, ?14, ?15, ?16,
            ?17, ?18,
            ?19, ?20, ?21, ?22, ?23,
            ?24, ?25, ?26,
            ?27
        )
        "#,
    )
    .bind(id)
    .bind(tenant_id)
    .bind(bill_no)
    .bind(meta.date)
    .bind(meta.bill_type)
    .bind(meta.reverse_charge)
    .bind(&meta.reference)
    .bind(&meta.vehicle_no)
    .bind(&meta.dispatch_through)
    .bind(&meta.narration)
    .bind(&party.id)
    .bind(&party.name)
    .bind(&party.gstin)
    .bind(&party.state)
    .bind(party.effective_state_code())
    .bind(&party.address)
    .bind(consignee)
    .bind(payload.gst_enabled)
    .bind(money_to_text(totals.total_taxable))
    .bind(money_to_text(totals.cgst))
    .bind(money_to_text(totals.sgst))
    .bind(money_to_text(totals.igst))
    .bind(money_to_text(totals.total_tax))
    .bind(money_to_text(totals.other_subtotal))
    .bind(money_to_text(totals.other_gst))
    .bind(money_to_text(totals.grand_total))
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?;

    Ok(())
}

async fn insert_line(
    conn: &mut SqliteConnection,
    tenant_id: &str,
    bill_id: &str,
    line_no: i64,
    line: &CartLine,
) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO bill_items (
            id, bill_id, tenant_id, line_no,
            stock_id, item, hsn, oem, uom, batch, expiry, narration,
            qty, rate, grate, disc
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(bill_id)
    .bind(tenant_id)
    .bind(line_no)
    .bind(&line.stock_id)
    .bind(&line.item)
    .bind(&line.hsn)
    .bind(&line.oem)
    .bind(&line.uom)
    .bind(&line.batch)
    .bind(line.expiry)
    .bind(&line.narration)
    .bind(decimal_to_text(line.qty))
    .bind(money_to_text(line.rate))
    .bind(decimal_to_text(line.grate))
    .bind(decimal_to_text(line.disc))
    .execute(&mut *conn)
    .await?;

    Ok(())
}

async fn insert_charge(
    conn: &mut SqliteConnection,
    tenant_id: &str,
    bill_id: &str,
    line_no: i64,
    charge: &OtherCharge,
) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO bill_charges (
            id, bill_id, tenant_id, line_no,
            name, charge_type, hsn_sac, amount, gst_rate, gst_amount
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(bill_id)
    .bind(tenant_id)
    .bind(line_no)
    .bind(&charge.name)
    .bind(charge.charge_type)
    .bind(&charge.hsn_sac)
    .bind(money_to_text(charge.amount))
    .bind(decimal_to_text(charge.gst_rate))
    .bind(money_to_text(charge.gst_amount))
    .execute(&mut *conn)
    .await?;

    Ok(())
}

fn assemble(row: BillRow, lines: Vec<CartLine>, charges: Vec<OtherCharge>) -> StoredBill {
    let date = date_from_text(Some(&row.bill_date), "bills.bill_date").unwrap_or_else(|| {
        warn!(id = %row.id, "Bill date missing, using creation date");
        row.created_at.date_naive()
    });

    let consignee = row.consignee.as_deref().and_then(|raw| {
        serde_json::from_str::<Consignee>(raw)
            .map_err(|e| warn!(id = %row.id, error = %e, "Unreadable consignee, dropping"))
            .ok()
    });

    let meta = InvoiceMeta {
        bill_no: row.bill_no.clone(),
        date,
        bill_type: BillType::parse_lossy(&row.bill_type),
        reverse_charge: row.reverse_charge,
        reference: row.reference,
        vehicle_no: row.vehicle_no,
        dispatch_through: row.dispatch_through,
        narration: row.narration,
    };

    let party = Party {
        id: row.party_id,
        name: row.party_name,
        gstin: row.party_gstin,
        state: row.party_state,
        state_code: row.party_state_code,
        address: row.party_address,
    };

    let totals = InvoiceTotals {
        total_taxable: money_from_text(&row.total_taxable, "bills.total_taxable"),
        cgst: money_from_text(&row.cgst, "bills.cgst"),
        sgst: money_from_text(&row.sgst, "bills.sgst"),
        igst: money_from_text(&row.igst, "bills.igst"),
        total_tax: money_from_text(&row.total_tax, "bills.total_tax"),
        other_subtotal: money_from_text(&row.other_subtotal, "bills.other_subtotal"),
        other_gst: money_from_text(&row.other_gst, "bills.other_gst"),
        grand_total: money_from_text(&row.grand_total, "bills.grand_total"),
        line_count: lines.len(),
        total_quantity: lines.iter().map(|l| l.qty).sum(),
    };

    StoredBill {
        id: row.id,
        bill_no: row.bill_no,
        meta,
        party,
        consignee,
        lines,
        charges,
        totals,
        gst_enabled: row.gst_enabled,
        created_at: row.created_at,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use bahi_core::types::{LineOverrides, StockItem};
    use bahi_core::{Money, DEFAULT_TENANT_ID};
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    fn stock() -> StockItem {
        StockItem {
            id: "stk-cement".into(),
            item: "Cement 50kg".into(),
            hsn: "2523".into(),
            oem: Some("UltraTech".into()),
            uom: "BAG".into(),
            grate: Decimal::from(18),
            rate: Money::from_rupees(100),
            qty: Decimal::from(200),
            batches: vec![],
        }
    }

    fn ready_draft() -> InvoiceDraft {
        let mut draft =
            InvoiceDraft::new(InvoiceMeta::new("INV-0001", BillType::IntraState), true);
        draft.add_stock(&stock(), LineOverrides::default());
        draft.add_stock(
            &stock(),
            LineOverrides {
                rate: None,
                disc: Some(Decimal::from(10)),
            },
        );
        draft.add_charge(
            OtherCharge::new("Freight", ChargeType::Freight, Money::from_rupees(50))
                .with_gst_rate(Decimal::from(18)),
        );
        draft.set_party(Some(Party {
            name: "Gupta Builders".into(),
            gstin: Some("27AAPFU0939F1ZV".into()),
            ..Default::default()
        }));
        draft.set_consignee(Some(Consignee {
            name: "Site 4".into(),
            ..Default::default()
        }));
        draft
    }

    #[tokio::test]
    async fn test_commit_and_get_round_trip() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let draft = ready_draft();
        let payload = draft.commit_payload().unwrap();

        let committed = db
            .bills()
            .commit(DEFAULT_TENANT_ID, &payload, &BillNumberFormat::default())
            .await
            .unwrap();
        assert_eq!(committed.bill_no, "INV-0001");

        let stored = db
            .bills()
            .get(DEFAULT_TENANT_ID, &committed.id)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(stored.bill_no, "INV-0001");
        assert_eq!(stored.lines, payload.lines);
        assert_eq!(stored.charges, payload.charges);
        assert_eq!(stored.totals, payload.totals);
        assert_eq!(stored.party.state_code.as_deref(), Some("27"));

        let reopened = stored.into_draft();
        assert_eq!(reopened.cart, draft.cart);
        assert_eq!(reopened.other_charges, draft.other_charges);
        assert_eq!(reopened.consignee, draft.consignee);
        assert_eq!(reopened.totals(), draft.totals());
    }

    #[tokio::test]
    async fn test_two_commits_get_distinct_numbers() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let payload = ready_draft().commit_payload().unwrap();
        let format = BillNumberFormat::default();

        let first = db
            .bills()
            .commit(DEFAULT_TENANT_ID, &payload, &format)
            .await
            .unwrap();
        let second = db
            .bills()
            .commit(DEFAULT_TENANT_ID, &payload, &format)
            .await
            .unwrap();

        assert_ne!(first.bill_no, second.bill_no);
        assert_eq!(second.bill_no, "INV-0002");
        assert_eq!(db.sequences().preview_next(DEFAULT_TENANT_ID).await.unwrap(), 3);
    }

    async fn insert_legacy_bill(db: &Database, id: &str, bill_no: &str) {
        sqlx::query(
            "INSERT INTO bills (id, tenant_id, bill_no, bill_date, party_name, created_at)
             VALUES (?1, ?2, ?3, '2024-04-01', 'Old import', '2024-04-01T00:00:00Z')",
        )
        .bind(id)
        .bind(DEFAULT_TENANT_ID)
        .bind(bill_no)
        .execute(db.pool())
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_taken_number_is_skipped() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        insert_legacy_bill(&db, "legacy", "INV-0001").await;

        let payload = ready_draft().commit_payload().unwrap();
        let format = BillNumberFormat::default();

        let first = db
            .bills()
            .commit(DEFAULT_TENANT_ID, &payload, &format)
            .await
            .unwrap();
        assert_eq!(first.bill_no, "INV-0002");

        let second = db
            .bills()
            .commit(DEFAULT_TENANT_ID, &payload, &format)
            .await
            .unwrap();
        assert_eq!(second.bill_no, "INV-0003");
        assert_eq!(db.bills().count(DEFAULT_TENANT_ID).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_failed_commit_writes_nothing() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        for n in 1..=MAX_TAKEN_NUMBERS {
            insert_legacy_bill(&db, &format!("legacy-{n}"), &format!("INV-{n:04}")).await;
        }

        let payload = ready_draft().commit_payload().unwrap();
        let err = db
            .bills()
            .commit(DEFAULT_TENANT_ID, &payload, &BillNumberFormat::default())
            .await
            .unwrap_err();

        assert!(matches!(err, DbError::Sequencing(_)));
        assert_eq!(
            db.bills().count(DEFAULT_TENANT_ID).await.unwrap(),
            MAX_TAKEN_NUMBERS as i64
        );
        assert_eq!(db.sequences().preview_next(DEFAULT_TENANT_ID).await.unwrap(), 1);

        let items: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM bill_items")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(items, 0);
    }

    #[tokio::test]
    async fn test_get_unknown_bill() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        assert!(db
            .bills()
            .get(DEFAULT_TENANT_ID, "missing")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_get_tolerates_bad_stored_numbers() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        sqlx::query(
            "INSERT INTO bills (id, tenant_id, bill_no, bill_date, bill_type, party_name, grand_total, created_at)
             VALUES ('b1', ?1, 'OLD-1', 'yesterday', 'weird', 'Cash', 'twelve', '2024-04-01T00:00:00Z')",
        )
        .bind(DEFAULT_TENANT_ID)
        .execute(db.pool())
        .await
        .unwrap();
        sqlx::query(
            "INSERT INTO bill_items (id, bill_id, tenant_id, line_no, stock_id, item, qty, rate)
             VALUES ('i1', 'b1', ?1, 0, 's1', 'Thing', 'two', '5')",
        )
        .bind(DEFAULT_TENANT_ID)
        .execute(db.pool())
        .await
        .unwrap();

        let stored = db
            .bills()
            .get(DEFAULT_TENANT_ID, "b1")
            .await
            .unwrap()
            .unwrap();

        assert_eq!(stored.meta.bill_type, BillType::IntraState);
        assert_eq!(stored.meta.date, NaiveDate::from_ymd_opt(2024, 4, 1).unwrap());
        assert!(stored.totals.grand_total.is_zero());
        assert_eq!(stored.lines[0].qty, Decimal::ZERO);
        assert_eq!(stored.lines[0].rate, Money::from_rupees(5));
    }
}
