//! # System Config Repository
//!
//! Per-tenant settings. Today that is the GST switch, read once when a draft
//! is opened.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::DbResult;

/// GST is on for a tenant that has no settings row.
pub const DEFAULT_GST_ENABLED: bool = true;

#[derive(Debug, Clone)]
pub struct SystemConfigRepository {
    pool: SqlitePool,
}

impl SystemConfigRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SystemConfigRepository { pool }
    }

    /// Creates the tenant's settings row if missing. Existing settings win.
    pub async fn ensure_tenant(&self, tenant_id: &str, gst_enabled: bool) -> DbResult<()> {
        let result = sqlx::query(
            r#"
            INSERT INTO system_config (tenant_id, gst_enabled, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT (tenant_id) DO NOTHING
            "#,
        )
        .bind(tenant_id)
        .bind(gst_enabled)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() > 0 {
            info!(tenant_id, gst_enabled, "Seeded tenant system config");
        }
        Ok(())
    }

    pub async fn gst_enabled(&self, tenant_id: &str) -> DbResult<bool> {
        let enabled: Option<bool> =
            sqlx::query_scalar("SELECT gst_enabled FROM system_config WHERE tenant_id = ?1")
                .bind(tenant_id)
                .fetch_optional(&self.pool)
                .await?;

        debug!(tenant_id, ?enabled, "Read GST status");
        Ok(enabled.unwrap_or(DEFAULT_GST_ENABLED))
    }

    pub async fn set_gst_enabled(&self, tenant_id: &str, gst_enabled: bool) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO system_config (tenant_id, gst_enabled, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT (tenant_id) DO UPDATE SET
                gst_enabled = excluded.gst_enabled,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(tenant_id)
        .bind(gst_enabled)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        info!(tenant_id, gst_enabled, "Updated GST status");
        Ok(())
    }
}
