//! Persistence contract for the sync orchestrator, and its Postgres
//! implementation. The trait seam lets the orchestrator be exercised
//! against an in-memory repository in tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::models::Store;
use crate::db::queries;
use crate::domain::{NewLineItem, NewPayment};
use crate::error::SyncError;

#[async_trait]
pub trait SyncRepository: Send + Sync {
    /// Find or create a store by merchant id, refreshing name and token.
    async fn get_or_create_store(
        &self,
        merchant_id: &str,
        name: &str,
        access_token: &str,
    ) -> Result<Store, SyncError>;

    async fn get_last_sync_date(
        &self,
        store_id: Uuid,
    ) -> Result<Option<DateTime<Utc>>, SyncError>;

    async fn list_stores(&self) -> Result<Vec<Store>, SyncError>;

    /// Insert previously-absent payments; returns newly inserted count.
    async fn upsert_payments(&self, records: &[NewPayment]) -> Result<u64, SyncError>;

    /// Insert previously-absent order lines; returns newly inserted count.
    async fn upsert_order_items(&self, records: &[NewLineItem]) -> Result<u64, SyncError>;

    /// Append a sync log entry and advance the watermark, atomically.
    async fn record_sync_completion(
        &self,
        store_id: Uuid,
        payments_count: i64,
        orders_count: i64,
    ) -> Result<(), SyncError>;
}

/// Postgres-backed sync repository.
#[derive(Clone)]
pub struct PgSyncRepository {
    pool: PgPool,
}

impl PgSyncRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SyncRepository for PgSyncRepository {
    async fn get_or_create_store(
        &self,
        merchant_id: &str,
        name: &str,
        access_token: &str,
    ) -> Result<Store, SyncError> {
        Ok(queries::get_or_create_store(&self.pool, merchant_id, name, access_token).await?)
    }

    async fn get_last_sync_date(
        &self,
        store_id: Uuid,
    ) -> Result<Option<DateTime<Utc>>, SyncError> {
        Ok(queries::get_last_sync_date(&self.pool, store_id).await?)
    }

    async fn list_stores(&self) -> Result<Vec<Store>, SyncError> {
        Ok(queries::list_stores(&self.pool).await?)
    }

    async fn upsert_payments(&self, records: &[NewPayment]) -> Result<u64, SyncError> {
        Ok(queries::upsert_payments(&self.pool, records).await?)
    }

    async fn upsert_order_items(&self, records: &[NewLineItem]) -> Result<u64, SyncError> {
        Ok(queries::upsert_order_items(&self.pool, records).await?)
    }

    async fn record_sync_completion(
        &self,
        store_id: Uuid,
        payments_count: i64,
        orders_count: i64,
    ) -> Result<(), SyncError> {
        Ok(queries::record_sync_completion(&self.pool, store_id, payments_count, orders_count)
            .await?)
    }
}
