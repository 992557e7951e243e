//! # Stock Repository
//!
//! The stock catalog: read by the draft editor, written only when stock is
//! registered. Batches live in a JSON column and are converted by
//! [`crate::codec`].

use chrono::Utc;
use sqlx::{FromRow, SqlitePool};
use tracing::debug;

use bahi_core::types::StockItem;

use crate::codec::{
    decimal_from_text, decimal_to_text, decode_batches, encode_batches, money_from_text,
    money_to_text,
};
use crate::error::{DbError, DbResult};

#[derive(Debug, FromRow)]
struct StockRow {
    id: String,
    item: String,
    hsn: String,
    oem: Option<String>,
    uom: String,
    grate: String,
    rate: String,
    qty: String,
    batches: String,
}

impl StockRow {
    fn into_stock(self) -> StockItem {
        let batches = decode_batches(&self.batches, &self.id);
        StockItem {
            grate: decimal_from_text(&self.grate, "stocks.grate"),
            rate: money_from_text(&self.rate, "stocks.rate"),
            qty: decimal_from_text(&self.qty, "stocks.qty"),
            id: self.id,
            item: self.item,
            hsn: self.hsn,
            oem: self.oem,
            uom: self.uom,
            batches,
        }
    }
}

const SELECT_STOCK: &str = r#"
    SELECT id, item, hsn, oem, uom, grate, rate, qty, batches
    FROM stocks
"#;

/// Repository for stock catalog operations.
#[derive(Debug, Clone)]
pub struct StockRepository {
    pool: SqlitePool,
}

impl StockRepository {
    pub fn new(pool: SqlitePool) -> Self {
        StockRepository { pool }
    }

    /// All stock items of a tenant, by description.
    pub async fn list(&self, tenant_id: &str) -> DbResult<Vec<StockItem>> {
        let rows: Vec<StockRow> =
            sqlx::query_as(&format!("{SELECT_STOCK} WHERE tenant_id = ?1 ORDER BY item, id"))
                .bind(tenant_id)
                .fetch_all(&self.pool)
                .await?;

        debug!(tenant_id, count = rows.len(), "Listed stock");
        Ok(rows.into_iter().map(StockRow::into_stock).collect())
    }

    pub async fn get_by_id(&self, tenant_id: &str, id: &str) -> DbResult<Option<StockItem>> {
        let row: Option<StockRow> =
            sqlx::query_as(&format!("{SELECT_STOCK} WHERE tenant_id = ?1 AND id = ?2"))
                .bind(tenant_id)
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(StockRow::into_stock))
    }

    /// Registers a stock item. The ID must be new.
    pub async fn insert(&self, tenant_id: &str, stock: &StockItem) -> DbResult<()> {
        debug!(tenant_id, id = %stock.id, batches = stock.batches.len(), "Inserting stock");

        let now = Utc::now();
        sqlx::query(
            r#"
            INSERT INTO stocks (
                id, tenant_id, item, hsn, oem, uom,
                grate, rate, qty, batches,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?11)
            "#,
        )
        .bind(&stock.id)
        .bind(tenant_id)
        .bind(&stock.item)
        .bind(&stock.hsn)
        .bind(&stock.oem)
        .bind(&stock.uom)
        .bind(decimal_to_text(stock.grate))
        .bind(money_to_text(stock.rate))
        .bind(decimal_to_text(stock.qty))
        .bind(encode_batches(&stock.batches)?)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { .. } => DbError::duplicate("stock id", stock.id.clone()),
            other => other,
        })?;

        Ok(())
    }

    pub async fn count(&self, tenant_id: &str) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM stocks WHERE tenant_id = ?1")
            .bind(tenant_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use bahi_core::types::Batch;
    use bahi_core::{Money, DEFAULT_TENANT_ID};
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    fn stock(id: &str, item: &str, batches: Vec<Batch>) -> StockItem {
        StockItem {
            id: id.into(),
            item: item.into(),
            hsn: "3004".into(),
            oem: Some("Cipla".into()),
            uom: "STRIP".into(),
            grate: Decimal::from(12),
            rate: Money::from_paise(2550),
            qty: Decimal::from(40),
            batches,
        }
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.stocks();
        let item = stock(
            "stk-1",
            "Azithral 500",
            vec![
                Batch {
                    batch: Some("AZ-01".into()),
                    qty: Decimal::from(10),
                    rate: Money::from_rupees(110),
                    expiry: NaiveDate::from_ymd_opt(2027, 6, 30),
                    mrp: Some(Money::from_rupees(125)),
                },
                Batch {
                    batch: Some("AZ-02".into()),
                    qty: Decimal::from(4),
                    rate: Money::from_rupees(115),
                    expiry: None,
                    mrp: None,
                },
            ],
        );

        repo.insert(DEFAULT_TENANT_ID, &item).await.unwrap();

        let loaded = repo
            .get_by_id(DEFAULT_TENANT_ID, "stk-1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(loaded, item);
        assert!(repo.get_by_id("other-tenant", "stk-1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_is_tenant_scoped_and_sorted() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.stocks();

        repo.insert(DEFAULT_TENANT_ID, &stock("b", "Zinc tablets", vec![]))
            .await
            .unwrap();
        repo.insert(DEFAULT_TENANT_ID, &stock("a", "Antacid gel", vec![]))
            .await
            .unwrap();
        repo.insert("other-tenant", &stock("c", "Bandage", vec![]))
            .await
            .unwrap();

        let items = repo.list(DEFAULT_TENANT_ID).await.unwrap();
        let names: Vec<&str> = items.iter().map(|s| s.item.as_str()).collect();
        assert_eq!(names, vec!["Antacid gel", "Zinc tablets"]);
        assert_eq!(repo.count(DEFAULT_TENANT_ID).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_duplicate_id_rejected() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.stocks();
        repo.insert(DEFAULT_TENANT_ID, &stock("dup", "One", vec![]))
            .await
            .unwrap();

        let err = repo
            .insert(DEFAULT_TENANT_ID, &stock("dup", "Two", vec![]))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_same_id_in_two_tenants() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.stocks();

        repo.insert("tenant-a", &stock("stk-1", "Paracetamol", vec![]))
            .await
            .unwrap();
        repo.insert("tenant-b", &stock("stk-1", "Cement 50kg", vec![]))
            .await
            .unwrap();

        let a = repo.get_by_id("tenant-a", "stk-1").await.unwrap().unwrap();
        let b = repo.get_by_id("tenant-b", "stk-1").await.unwrap().unwrap();
        assert_eq!(a.item, "Paracetamol");
        assert_eq!(b.item, "Cement 50kg");
    }

    #[tokio::test]
    async fn test_corrupt_batches_column_reads_as_no_batches() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        sqlx::query(
            "INSERT INTO stocks (id, tenant_id, item, rate, qty, batches, created_at, updated_at)
             VALUES ('x', ?1, 'Legacy item', 'abc', '7', 'not-json', '2024-01-01', '2024-01-01')",
        )
        .bind(DEFAULT_TENANT_ID)
        .execute(db.pool())
        .await
        .unwrap();

        let item = db
            .stocks()
            .get_by_id(DEFAULT_TENANT_ID, "x")
            .await
            .unwrap()
            .unwrap();
        assert!(item.batches.is_empty());
        assert!(item.rate.is_zero());
        assert_eq!(item.qty, Decimal::from(7));
    }
}
