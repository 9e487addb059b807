//! Pure transforms from raw Clover payloads to normalized records.
//!
//! No I/O and no unit conversion here: amounts stay in minor units so the
//! normalizer remains a structural mapping. Records missing their natural
//! key are dropped, since they could never be upserted.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::clover::models::{RawOrder, RawPayment};
use crate::domain::{NewLineItem, NewPayment};

/// Flatten one raw payment for a store. Returns `None` if the payment has
/// no id.
pub fn normalize_payment(raw: &RawPayment, store_id: Uuid) -> Option<NewPayment> {
    let payment_id = raw.id.clone()?;

    Some(NewPayment {
        payment_id,
        store_id,
        amount_minor: raw.amount,
        created_time: raw.created_time.and_then(ms_to_datetime),
        employee_id: raw.employee.as_ref().and_then(|e| e.id.clone()),
        order_id: raw.order.as_ref().and_then(|o| o.id.clone()),
        device_id: raw.device.as_ref().and_then(|d| d.id.clone()),
        tender_type: raw.tender.as_ref().and_then(|t| t.label.clone()),
        card_type: raw
            .card_transaction
            .as_ref()
            .and_then(|c| c.card_type.clone()),
        last_4: raw.card_transaction.as_ref().and_then(|c| c.last4.clone()),
    })
}

/// Flatten an expanded order into line items, deriving the refund flag from
/// membership of each line's payment id in the order's refund list.
///
/// An order with no line items yields an empty vec, not an error.
pub fn normalize_order_line_items(raw: &RawOrder, store_id: Uuid) -> Vec<NewLineItem> {
    let Some(order_id) = raw.id.as_deref() else {
        return Vec::new();
    };

    let refund_ids: HashSet<&str> = raw
        .refunds
        .as_ref()
        .map(|r| {
            r.elements
                .iter()
                .filter_map(|refund| refund.payment.as_ref())
                .filter_map(|p| p.id.as_deref())
                .collect()
        })
        .unwrap_or_default();

    let Some(line_items) = raw.line_items.as_ref() else {
        return Vec::new();
    };

    line_items
        .elements
        .iter()
        .filter_map(|item| {
            let item_id = item.id.clone()?;
            let payment_id = item.payment.as_ref().and_then(|p| p.id.as_deref());

            Some(NewLineItem {
                order_id: order_id.to_string(),
                item_id,
                store_id,
                name: item.name.clone(),
                price_minor: item.price,
                quantity: item.quantity,
                created_time: item.created_time.and_then(ms_to_datetime),
                employee_id: item.employee.as_ref().and_then(|e| e.id.clone()),
                is_refunded: payment_id.is_some_and(|id| refund_ids.contains(id)),
                discount_minor: item.discount_amount,
            })
        })
        .collect()
}

fn ms_to_datetime(ms: i64) -> Option<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp_millis(ms)
}
