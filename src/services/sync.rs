//! Incremental sync orchestrator.
//!
//! Runs one pass per store, sequentially: determine the fetch window from
//! the store's watermark, walk it in bounded sub-windows, stream payments
//! and order lines through the normalizer into the repository, and advance
//! the watermark only after the whole pass succeeds.

use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::clover::models::RawPayment;
use crate::clover::CloverClient;
use crate::config::SyncSettings;
use crate::db::repository::SyncRepository;
use crate::error::SyncError;
use crate::normalize::{normalize_order_line_items, normalize_payment};
use crate::registry::StoreCredentials;

/// Outcome of one sync invocation, one entry per store. Every store's
/// result is reported explicitly; there are no silent partial failures.
#[derive(Debug)]
pub struct SyncReport {
    pub outcomes: Vec<StoreOutcome>,
}

impl SyncReport {
    pub fn has_failures(&self) -> bool {
        self.outcomes
            .iter()
            .any(|o| matches!(o.status, StoreStatus::Failed { .. }))
    }
}

#[derive(Debug)]
pub struct StoreOutcome {
    pub merchant_id: String,
    pub store_name: String,
    pub status: StoreStatus,
}

#[derive(Debug)]
pub enum StoreStatus {
    Completed {
        payments_inserted: u64,
        items_inserted: u64,
        window_start: DateTime<Utc>,
    },
    /// Store exists in the database but the registry supplied no
    /// credentials for it.
    Skipped { reason: String },
    Failed { error: String },
}

/// Totals accumulated across the sub-windows of one pass.
#[derive(Debug, Default)]
struct PassTotals {
    payments_inserted: u64,
    items_inserted: u64,
    orders_skipped: u64,
}

pub struct SyncOrchestrator<R> {
    client: CloverClient,
    repo: R,
    settings: SyncSettings,
}

impl<R: SyncRepository> SyncOrchestrator<R> {
    pub fn new(client: CloverClient, repo: R, settings: SyncSettings) -> Self {
        Self {
            client,
            repo,
            settings,
        }
    }

    /// Sync every registered store from its watermark (minus the overlap)
    /// to now. Failures are contained per store.
    pub async fn run_incremental_sync(
        &self,
        stores: &[StoreCredentials],
        overlap_days: i64,
    ) -> SyncReport {
        self.run(stores, WindowPolicy::Incremental { overlap_days })
            .await
    }

    /// Manual historical load from an explicit start date, ignoring each
    /// store's watermark for window computation. The watermark is still
    /// advanced on completion.
    pub async fn run_backfill(
        &self,
        stores: &[StoreCredentials],
        start: DateTime<Utc>,
    ) -> SyncReport {
        self.run(stores, WindowPolicy::Fixed { start }).await
    }

    async fn run(&self, stores: &[StoreCredentials], policy: WindowPolicy) -> SyncReport {
        let mut outcomes = Vec::with_capacity(stores.len());

        for (i, creds) in stores.iter().enumerate() {
            if i > 0 {
                // Per-merchant rate-limit buckets are independent, but a
                // short pause keeps burst traffic down.
                tokio::time::sleep(self.settings.store_pacing).await;
            }

            tracing::info!(merchant_id = %creds.merchant_id, store = creds.name(), "syncing store");

            let status = match self.sync_store(creds, &policy).await {
                Ok((totals, window_start)) => {
                    tracing::info!(
                        merchant_id = %creds.merchant_id,
                        payments = totals.payments_inserted,
                        items = totals.items_inserted,
                        orders_skipped = totals.orders_skipped,
                        "store sync completed"
                    );
                    StoreStatus::Completed {
                        payments_inserted: totals.payments_inserted,
                        items_inserted: totals.items_inserted,
                        window_start,
                    }
                }
                Err(e) => {
                    tracing::error!(merchant_id = %creds.merchant_id, error = %e, "store sync failed");
                    StoreStatus::Failed {
                        error: e.to_string(),
                    }
                }
            };

            outcomes.push(StoreOutcome {
                merchant_id: creds.merchant_id.clone(),
                store_name: creds.name().to_string(),
                status,
            });
        }

        self.append_uncovered_stores(stores, &mut outcomes).await;

        SyncReport { outcomes }
    }

    /// Report registered stores the registry no longer has credentials for,
    /// so their staleness is visible rather than silently growing.
    async fn append_uncovered_stores(
        &self,
        stores: &[StoreCredentials],
        outcomes: &mut Vec<StoreOutcome>,
    ) {
        let covered: HashSet<&str> = stores.iter().map(|c| c.merchant_id.as_str()).collect();

        match self.repo.list_stores().await {
            Ok(known) => {
                for store in known {
                    if !covered.contains(store.merchant_id.as_str()) {
                        outcomes.push(StoreOutcome {
                            merchant_id: store.merchant_id.clone(),
                            store_name: store.name.clone(),
                            status: StoreStatus::Skipped {
                                reason: SyncError::MissingCredentials(store.merchant_id)
                                    .to_string(),
                            },
                        });
                    }
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "could not list stores for coverage report");
            }
        }
    }

    /// One full pass for one store: all-or-nothing for the watermark.
    async fn sync_store(
        &self,
        creds: &StoreCredentials,
        policy: &WindowPolicy,
    ) -> Result<(PassTotals, DateTime<Utc>), SyncError> {
        let store = self
            .repo
            .get_or_create_store(&creds.merchant_id, creds.name(), &creds.access_token)
            .await?;

        let window_start = match policy {
            WindowPolicy::Incremental { overlap_days } => {
                let last_sync = self.repo.get_last_sync_date(store.id).await?;
                compute_window_start(last_sync, *overlap_days, self.settings.epoch_start)
            }
            WindowPolicy::Fixed { start } => *start,
        };
        let window_end = Utc::now();

        tracing::info!(
            merchant_id = %creds.merchant_id,
            %window_start,
            %window_end,
            "determined sync window"
        );

        let totals = self
            .run_pass(store.id, creds, window_start, window_end)
            .await?;

        // The only point that advances the watermark.
        self.repo
            .record_sync_completion(
                store.id,
                totals.payments_inserted as i64,
                totals.items_inserted as i64,
            )
            .await?;

        Ok((totals, window_start))
    }

    async fn run_pass(
        &self,
        store_id: Uuid,
        creds: &StoreCredentials,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> Result<PassTotals, SyncError> {
        let mut totals = PassTotals::default();
        // Per-pass only; refetching an order in a later pass is tolerated
        // because line-item upsert is idempotent.
        let mut seen_orders: HashSet<String> = HashSet::new();

        let window_size = Duration::days(self.settings.window_days);
        let mut current_start = window_start;

        while current_start < window_end {
            let current_end = std::cmp::min(current_start + window_size, window_end);

            let payments = self
                .fetch_window_with_retry(creds, current_start, current_end)
                .await?;

            let records: Vec<_> = payments
                .iter()
                .filter_map(|p| normalize_payment(p, store_id))
                .collect();
            totals.payments_inserted += self.repo.upsert_payments(&records).await?;

            let new_orders = collect_new_order_ids(&payments, &mut seen_orders);
            tracing::debug!(
                count = new_orders.len(),
                %current_start,
                %current_end,
                "fetching order details for sub-window"
            );

            for order_id in &new_orders {
                // Cooperative throttling between detail fetches.
                tokio::time::sleep(self.settings.order_fetch_delay).await;

                match self.client.fetch_order_detail(creds, order_id).await {
                    Some(order) => {
                        let items = normalize_order_line_items(&order, store_id);
                        totals.items_inserted += self.repo.upsert_order_items(&items).await?;
                    }
                    None => totals.orders_skipped += 1,
                }
            }

            current_start = current_end;
        }

        Ok(totals)
    }

    /// Fetch a payments sub-window, retrying once after a cooldown if the
    /// failure was a rate limit or transient. Auth failures propagate
    /// immediately.
    async fn fetch_window_with_retry(
        &self,
        creds: &StoreCredentials,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<RawPayment>, SyncError> {
        match self.client.fetch_payments_window(creds, start, end).await {
            Ok(payments) => Ok(payments),
            Err(e) if e.is_retryable() => {
                tracing::warn!(
                    merchant_id = %creds.merchant_id,
                    error = %e,
                    cooldown_secs = self.settings.retry_cooldown.as_secs(),
                    "sub-window fetch failed, retrying once after cooldown"
                );
                tokio::time::sleep(self.settings.retry_cooldown).await;
                self.client.fetch_payments_window(creds, start, end).await
            }
            Err(e) => Err(e),
        }
    }
}

enum WindowPolicy {
    Incremental { overlap_days: i64 },
    Fixed { start: DateTime<Utc> },
}

/// Window start for a store: the watermark minus the overlap margin, or
/// the configured epoch for a never-synced store (full backfill).
pub fn compute_window_start(
    last_sync: Option<DateTime<Utc>>,
    overlap_days: i64,
    epoch_start: DateTime<Utc>,
) -> DateTime<Utc> {
    match last_sync {
        Some(last) => last - Duration::days(overlap_days),
        None => epoch_start,
    }
}

/// Distinct order ids referenced by this sub-window's payments that have
/// not already been processed in this pass. Updates the seen-set.
fn collect_new_order_ids(
    payments: &[RawPayment],
    seen_orders: &mut HashSet<String>,
) -> Vec<String> {
    let mut new_orders = Vec::new();
    for payment in payments {
        if let Some(order_id) = payment.order_id() {
            if seen_orders.insert(order_id.to_string()) {
                new_orders.push(order_id.to_string());
            }
        }
    }
    new_orders
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn epoch() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn window_start_subtracts_overlap_from_watermark() {
        let last = Utc.with_ymd_and_hms(2024, 6, 10, 0, 0, 0).unwrap();
        let start = compute_window_start(Some(last), 2, epoch());
        assert_eq!(start, Utc.with_ymd_and_hms(2024, 6, 8, 0, 0, 0).unwrap());
    }

    #[test]
    fn window_start_falls_back_to_epoch_when_never_synced() {
        let start = compute_window_start(None, 2, epoch());
        assert_eq!(start, epoch());
    }

    #[test]
    fn zero_overlap_starts_at_watermark() {
        let last = Utc.with_ymd_and_hms(2024, 6, 10, 12, 30, 0).unwrap();
        assert_eq!(compute_window_start(Some(last), 0, epoch()), last);
    }

    #[test]
    fn collects_distinct_unseen_order_ids() {
        let payments: Vec<RawPayment> = serde_json::from_str(
            r#"[
                {"id": "P1", "order": {"id": "O1"}},
                {"id": "P2", "order": {"id": "O1"}},
                {"id": "P3", "order": {"id": "O2"}},
                {"id": "P4"}
            ]"#,
        )
        .unwrap();

        let mut seen = HashSet::new();
        seen.insert("O2".to_string());

        let new_orders = collect_new_order_ids(&payments, &mut seen);
        assert_eq!(new_orders, vec!["O1".to_string()]);
        assert!(seen.contains("O1"));
    }
}
