use chrono::{DateTime, Utc};
use clap::Parser;
use tracing_subscriber::prelude::*;

use clover_sync::cli::{self, Cli, Commands, DbCommands};
use clover_sync::clover::CloverClient;
use clover_sync::config::Config;
use clover_sync::db;
use clover_sync::db::repository::PgSyncRepository;
use clover_sync::registry;
use clover_sync::services::SyncOrchestrator;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Sync { overlap_days: 1 }) {
        Commands::Sync { overlap_days } => {
            run_sync(&config, SyncMode::Incremental { overlap_days }).await
        }
        Commands::Backfill { start_date } => {
            let start = start_date
                .and_hms_opt(0, 0, 0)
                .ok_or_else(|| anyhow::anyhow!("invalid start date"))?
                .and_utc();
            run_sync(&config, SyncMode::Backfill { start }).await
        }
        Commands::Db(DbCommands::Migrate) => cli::handle_db_migrate(&config).await,
        Commands::Stores => {
            let pool = db::create_pool(&config).await?;
            cli::handle_stores_list(&pool).await
        }
        Commands::Config => cli::handle_config_validate(&config),
    }
}

enum SyncMode {
    Incremental { overlap_days: i64 },
    Backfill { start: DateTime<Utc> },
}

async fn run_sync(config: &Config, mode: SyncMode) -> anyhow::Result<()> {
    let stores = registry::load_from_env()?.ok_or_else(|| {
        anyhow::anyhow!("CLOVER_STORES is not set; register at least one store to sync")
    })?;

    let pool = db::create_pool(config).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("Database migrations completed");

    let client = CloverClient::new(config.clover_base_url.clone());
    let repo = PgSyncRepository::new(pool);
    let orchestrator = SyncOrchestrator::new(client, repo, config.sync.clone());

    let report = match mode {
        SyncMode::Incremental { overlap_days } => {
            orchestrator.run_incremental_sync(&stores, overlap_days).await
        }
        SyncMode::Backfill { start } => orchestrator.run_backfill(&stores, start).await,
    };

    cli::print_report(&report);

    if report.has_failures() {
        anyhow::bail!("one or more stores failed to sync");
    }

    Ok(())
}
