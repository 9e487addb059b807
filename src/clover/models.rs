//! Raw Clover API payloads.
//!
//! Decoded once at the client boundary into typed-but-optional structs, so
//! downstream code never walks untyped JSON. Every nested object the API
//! may omit is an `Option`.

use serde::Deserialize;

/// Paginated envelope used by the Clover list endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct ElementsPage<T> {
    #[serde(default = "Vec::new")]
    pub elements: Vec<T>,
}

/// Bare `{ "id": ... }` reference to another Clover entity.
#[derive(Debug, Clone, Deserialize)]
pub struct EntityRef {
    pub id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPayment {
    pub id: Option<String>,
    /// Minor currency units (cents).
    pub amount: Option<i64>,
    /// Epoch milliseconds.
    pub created_time: Option<i64>,
    pub employee: Option<EntityRef>,
    pub order: Option<EntityRef>,
    pub device: Option<EntityRef>,
    pub tender: Option<RawTender>,
    pub card_transaction: Option<RawCardTransaction>,
}

impl RawPayment {
    pub fn order_id(&self) -> Option<&str> {
        self.order.as_ref().and_then(|o| o.id.as_deref())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawTender {
    pub label: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCardTransaction {
    pub card_type: Option<String>,
    pub last4: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawOrder {
    pub id: Option<String>,
    pub line_items: Option<ElementsPage<RawLineItem>>,
    pub refunds: Option<ElementsPage<RawRefund>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawLineItem {
    pub id: Option<String>,
    pub name: Option<String>,
    /// Minor currency units (cents).
    pub price: Option<i64>,
    pub quantity: Option<i64>,
    /// Epoch milliseconds.
    pub created_time: Option<i64>,
    pub employee: Option<EntityRef>,
    pub payment: Option<EntityRef>,
    /// Minor currency units (cents).
    pub discount_amount: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawRefund {
    pub payment: Option<EntityRef>,
}
