//! Normalized sync records.
//! Framework-agnostic output of the normalizer; amounts are still in minor
//! currency units here — conversion to decimal dollars happens at the
//! persistence boundary.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// One flattened payment, keyed by the remote payment id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPayment {
    pub payment_id: String,
    pub store_id: Uuid,
    /// Minor currency units (cents).
    pub amount_minor: Option<i64>,
    pub created_time: Option<DateTime<Utc>>,
    pub employee_id: Option<String>,
    pub order_id: Option<String>,
    pub device_id: Option<String>,
    pub tender_type: Option<String>,
    pub card_type: Option<String>,
    pub last_4: Option<String>,
}

/// One flattened order line, keyed by (order id, item id).
#[derive(Debug, Clone, PartialEq)]
pub struct NewLineItem {
    pub order_id: String,
    pub item_id: String,
    pub store_id: Uuid,
    pub name: Option<String>,
    /// Minor currency units (cents).
    pub price_minor: Option<i64>,
    pub quantity: Option<i64>,
    pub created_time: Option<DateTime<Utc>>,
    pub employee_id: Option<String>,
    pub is_refunded: bool,
    /// Minor currency units (cents).
    pub discount_minor: Option<i64>,
}
