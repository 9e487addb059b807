use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::BigDecimal;
use sqlx::FromRow;
use uuid::Uuid;

/// One merchant identity being tracked. Created on first encounter with a
/// merchant id; `last_sync_date` is the watermark and is only advanced by
/// `record_sync_completion`.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Store {
    pub id: Uuid,
    pub merchant_id: String,
    pub name: String,
    pub access_token: String,
    pub last_sync_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// A persisted payment row. Immutable once written; `amount` is in decimal
/// major units (dollars), converted from the API's cents at insert time.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Payment {
    pub payment_id: String,
    pub store_id: Uuid,
    pub amount: Option<BigDecimal>,
    pub created_time: Option<DateTime<Utc>>,
    pub employee_id: Option<String>,
    pub order_id: Option<String>,
    pub device_id: Option<String>,
    pub tender_type: Option<String>,
    pub card_type: Option<String>,
    pub last_4: Option<String>,
    pub sync_date: DateTime<Utc>,
}

/// One persisted order line, keyed by (order_id, item_id).
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct OrderItem {
    pub order_id: String,
    pub item_id: String,
    pub store_id: Uuid,
    pub name: Option<String>,
    pub price: Option<BigDecimal>,
    pub quantity: Option<i64>,
    pub created_time: Option<DateTime<Utc>>,
    pub employee_id: Option<String>,
    pub is_refunded: bool,
    pub discount_amount: Option<BigDecimal>,
    pub sync_date: DateTime<Utc>,
}

/// Append-only audit record, written once per completed sync pass.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct SyncLogEntry {
    pub id: Uuid,
    pub store_id: Uuid,
    pub sync_date: DateTime<Utc>,
    pub payments_count: i64,
    pub orders_count: i64,
}
