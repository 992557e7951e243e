//! # Bill Sequence Repository
//!
//! The per-tenant bill number counter.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  preview_next()    SELECT last_number + 1          (never writes)      │
//! │                                                                         │
//! │  allocate_next()   UPSERT ... RETURNING last_number                    │
//! │                    one statement: the increment and the read are       │
//! │                    atomic, so two callers never see the same number    │
//! │                                                                         │
//! │  Bill commit calls allocate_in() inside the commit transaction, so a   │
//! │  failed commit also rolls the counter back.                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Gaps are possible (a number allocated outside a commit is never reused);
//! duplicates are not.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use bahi_core::types::BillNumberFormat;

use crate::error::{DbError, DbResult};

const ALLOCATE_SQL: &str = r#"
    INSERT INTO bill_sequences (tenant_id, last_number, updated_at)
    VALUES (?1, 1, ?2)
    ON CONFLICT (tenant_id) DO UPDATE SET
        last_number = bill_sequences.last_number + 1,
        updated_at = excluded.updated_at
    RETURNING last_number
"#;

/// Increments the tenant's counter on `conn` and returns the new value.
pub(crate) async fn allocate_in(conn: &mut SqliteConnection, tenant_id: &str) -> DbResult<i64> {
    let number: i64 = sqlx::query_scalar(ALLOCATE_SQL)
        .bind(tenant_id)
        .bind(Utc::now())
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| DbError::from(e).into_sequencing())?;

    if number < 1 {
        return Err(DbError::Sequencing(format!(
            "counter for tenant {} returned {}",
            tenant_id, number
        )));
    }
    Ok(number)
}

/// Repository for the bill number sequence.
#[derive(Debug, Clone)]
pub struct SequenceRepository {
    pool: SqlitePool,
}

impl SequenceRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SequenceRepository { pool }
    }

    /// The number the next commit would receive. Read-only.
    pub async fn preview_next(&self, tenant_id: &str) -> DbResult<i64> {
        let last: Option<i64> =
            sqlx::query_scalar("SELECT last_number FROM bill_sequences WHERE tenant_id = ?1")
                .bind(tenant_id)
                .fetch_optional(&self.pool)
                .await?;

        let next = last.unwrap_or(0).max(0) + 1;
        debug!(tenant_id, next, "Previewed bill number");
        Ok(next)
    }

    /// [`Self::preview_next`] rendered with `format`.
    pub async fn preview_bill_no(
        &self,
        tenant_id: &str,
        format: &BillNumberFormat,
    ) -> DbResult<String> {
        Ok(format.format(self.preview_next(tenant_id).await?))
    }

    /// Consumes and returns the next number in its own transaction.
    ///
    /// Bill commits do not call this; they allocate inside the commit
    /// transaction.
    pub async fn allocate_next(&self, tenant_id: &str) -> DbResult<i64> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::from(e).into_sequencing())?;
        let number = allocate_in(&mut *tx, tenant_id).await?;
        tx.commit()
            .await
            .map_err(|e| DbError::from(e).into_sequencing())?;

        info!(tenant_id, number, "Allocated bill number");
        Ok(number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use bahi_core::DEFAULT_TENANT_ID;

    #[tokio::test]
    async fn test_preview_is_idempotent() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let seq = db.sequences();

        for _ in 0..5 {
            assert_eq!(seq.preview_next(DEFAULT_TENANT_ID).await.unwrap(), 1);
        }
    }

    #[tokio::test]
    async fn test_allocate_advances_preview() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let seq = db.sequences();

        assert_eq!(seq.allocate_next(DEFAULT_TENANT_ID).await.unwrap(), 1);
        assert_eq!(seq.preview_next(DEFAULT_TENANT_ID).await.unwrap(), 2);
        assert_eq!(seq.preview_next(DEFAULT_TENANT_ID).await.unwrap(), 2);
        assert_eq!(seq.allocate_next(DEFAULT_TENANT_ID).await.unwrap(), 2);
        assert_eq!(
            seq.preview_bill_no(DEFAULT_TENANT_ID, &BillNumberFormat::default())
                .await
                .unwrap(),
            "INV-0003"
        );
    }

    #[tokio::test]
    async fn test_sequences_are_per_tenant() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let seq = db.sequences();

        seq.allocate_next("tenant-a").await.unwrap();
        seq.allocate_next("tenant-a").await.unwrap();

        assert_eq!(seq.preview_next("tenant-a").await.unwrap(), 3);
        assert_eq!(seq.preview_next("tenant-b").await.unwrap(), 1);
    }
}
