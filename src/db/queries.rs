use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Result};
use uuid::Uuid;

use crate::db::models::Store;
use crate::domain::{NewLineItem, NewPayment};

/// Convert minor currency units (cents) to decimal major units (dollars).
/// Exact: base-10 division by 100 cannot lose precision.
pub fn minor_to_major(minor: i64) -> BigDecimal {
    BigDecimal::from(minor) / BigDecimal::from(100)
}

fn minor_to_major_opt(minor: Option<i64>) -> Option<BigDecimal> {
    minor.map(minor_to_major)
}

// --- Store Queries ---

/// Find or create a store by merchant id. Name and access token are
/// refreshed on every encounter; `last_sync_date` is left untouched.
pub async fn get_or_create_store(
    pool: &PgPool,
    merchant_id: &str,
    name: &str,
    access_token: &str,
) -> Result<Store> {
    sqlx::query_as::<_, Store>(
        r#"
        INSERT INTO stores (id, merchant_id, name, access_token, created_at)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (merchant_id)
        DO UPDATE SET name = EXCLUDED.name, access_token = EXCLUDED.access_token
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(merchant_id)
    .bind(name)
    .bind(access_token)
    .bind(Utc::now())
    .fetch_one(pool)
    .await
}

pub async fn list_stores(pool: &PgPool) -> Result<Vec<Store>> {
    sqlx::query_as::<_, Store>("SELECT * FROM stores ORDER BY name")
        .fetch_all(pool)
        .await
}

pub async fn get_last_sync_date(
    pool: &PgPool,
    store_id: Uuid,
) -> Result<Option<DateTime<Utc>>> {
    let row: Option<(Option<DateTime<Utc>>,)> =
        sqlx::query_as("SELECT last_sync_date FROM stores WHERE id = $1")
            .bind(store_id)
            .fetch_optional(pool)
            .await?;

    Ok(row.and_then(|(date,)| date))
}

// --- Payment / Order Item Upserts ---

/// Insert payments that are not already stored, skipping existing payment
/// ids. Payments are immutable once written, so conflicts are skipped, not
/// updated. Returns the number of newly inserted rows.
pub async fn upsert_payments(pool: &PgPool, records: &[NewPayment]) -> Result<u64> {
    let mut inserted = 0u64;
    let sync_date = Utc::now();

    for record in records {
        let result = sqlx::query(
            r#"
            INSERT INTO payments (
                payment_id, store_id, amount, created_time, employee_id,
                order_id, device_id, tender_type, card_type, last_4, sync_date
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (payment_id) DO NOTHING
            "#,
        )
        .bind(&record.payment_id)
        .bind(record.store_id)
        .bind(minor_to_major_opt(record.amount_minor))
        .bind(record.created_time)
        .bind(&record.employee_id)
        .bind(&record.order_id)
        .bind(&record.device_id)
        .bind(&record.tender_type)
        .bind(&record.card_type)
        .bind(&record.last_4)
        .bind(sync_date)
        .execute(pool)
        .await?;

        inserted += result.rows_affected();
    }

    Ok(inserted)
}

/// Same skip-if-exists policy as payments, keyed on (order_id, item_id).
pub async fn upsert_order_items(pool: &PgPool, records: &[NewLineItem]) -> Result<u64> {
    let mut inserted = 0u64;
    let sync_date = Utc::now();

    for record in records {
        let result = sqlx::query(
            r#"
            INSERT INTO order_items (
                order_id, item_id, store_id, name, price, quantity,
                created_time, employee_id, is_refunded, discount_amount, sync_date
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (order_id, item_id) DO NOTHING
            "#,
        )
        .bind(&record.order_id)
        .bind(&record.item_id)
        .bind(record.store_id)
        .bind(&record.name)
        .bind(minor_to_major_opt(record.price_minor))
        .bind(record.quantity)
        .bind(record.created_time)
        .bind(&record.employee_id)
        .bind(record.is_refunded)
        .bind(minor_to_major_opt(record.discount_minor))
        .bind(sync_date)
        .execute(pool)
        .await?;

        inserted += result.rows_affected();
    }

    Ok(inserted)
}

// --- Sync Log ---

/// Append a sync log entry and advance the store's watermark, atomically.
/// Callers invoke this only after every sub-window of the pass succeeded.
pub async fn record_sync_completion(
    pool: &PgPool,
    store_id: Uuid,
    payments_count: i64,
    orders_count: i64,
) -> Result<()> {
    let mut tx = pool.begin().await?;
    let sync_date = Utc::now();

    sqlx::query(
        r#"
        INSERT INTO sync_log (id, store_id, sync_date, payments_count, orders_count)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(store_id)
    .bind(sync_date)
    .bind(payments_count)
    .bind(orders_count)
    .execute(&mut *tx)
    .await?;

    sqlx::query("UPDATE stores SET last_sync_date = $1 WHERE id = $2")
        .bind(sync_date)
        .bind(store_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(())
}
