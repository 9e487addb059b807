use std::env;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use dotenvy::dotenv;

const DEFAULT_CLOVER_BASE_URL: &str = "https://api.clover.com/v3";
const DEFAULT_EPOCH_DATE: &str = "2024-01-01";

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub clover_base_url: String,
    pub sync: SyncSettings,
}

/// Tuning knobs for the sync orchestrator, decoded once from the
/// environment and passed explicitly (no ambient globals).
#[derive(Debug, Clone)]
pub struct SyncSettings {
    /// "Beginning of data" for stores that have never synced.
    pub epoch_start: DateTime<Utc>,
    /// Size of each fetch sub-window, in days.
    pub window_days: i64,
    /// Cooperative pacing between successive order-detail fetches.
    pub order_fetch_delay: Duration,
    /// Cooldown before the single retry of a rate-limited or transient
    /// sub-window failure.
    pub retry_cooldown: Duration,
    /// Pause between stores, to stay clear of per-merchant rate limits.
    pub store_pacing: Duration,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            epoch_start: parse_epoch_date(DEFAULT_EPOCH_DATE).expect("default epoch is valid"),
            window_days: 90,
            order_fetch_delay: Duration::from_millis(100),
            retry_cooldown: Duration::from_secs(60),
            store_pacing: Duration::from_secs(1),
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv().ok(); // Load .env file if present

        let defaults = SyncSettings::default();

        let epoch_start = match env::var("SYNC_EPOCH_DATE") {
            Ok(raw) => parse_epoch_date(&raw)?,
            Err(_) => defaults.epoch_start,
        };

        let window_days = env::var("SYNC_WINDOW_DAYS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.window_days);

        let order_fetch_delay = env::var("SYNC_ORDER_FETCH_DELAY_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_millis)
            .unwrap_or(defaults.order_fetch_delay);

        let retry_cooldown = env::var("SYNC_RETRY_COOLDOWN_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.retry_cooldown);

        Ok(Config {
            database_url: env::var("DATABASE_URL")?,
            clover_base_url: env::var("CLOVER_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_CLOVER_BASE_URL.to_string()),
            sync: SyncSettings {
                epoch_start,
                window_days,
                order_fetch_delay,
                retry_cooldown,
                store_pacing: defaults.store_pacing,
            },
        })
    }
}

fn parse_epoch_date(raw: &str) -> anyhow::Result<DateTime<Utc>> {
    let date = NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")?;
    let midnight = date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| anyhow::anyhow!("invalid epoch date: {raw}"))?;
    Ok(midnight.and_utc())
}
