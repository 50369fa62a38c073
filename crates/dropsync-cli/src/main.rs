//! dropsync command line interface.
//!
//! Commands that mutate external systems record a `sync_runs` row; per-item
//! failures are logged and skipped so one bad product does not abort a whole
//! run, and a run only fails when every item failed.

mod audit;
mod auth;
mod import;
mod translate;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "dropsync-cli")]
#[command(about = "Storefront sync tooling: vendor imports, translations, audits")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Fetch products from the vendor and push them to Shopify
    Import(import::ImportArgs),
    /// Translate imported products into missing locales
    Translate(translate::TranslateArgs),
    /// Scan stored translations for wrong-language rows
    Audit(audit::AuditArgs),
    /// Re-translate rows flagged by a previous audit
    Fix(audit::FixArgs),
    /// Inspect or establish vendor API authorization
    Auth {
        #[command(subcommand)]
        command: auth::AuthCommands,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = dropsync_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Import(args) => {
            let pool = connect(&config).await?;
            import::run_import(&pool, &config, args).await
        }
        Commands::Translate(args) => {
            let pool = connect(&config).await?;
            translate::run_translate(&pool, &config, args).await
        }
        Commands::Audit(args) => {
            let pool = connect(&config).await?;
            audit::run_audit(&pool, &config, args).await
        }
        Commands::Fix(args) => {
            let pool = connect(&config).await?;
            audit::run_fix(&pool, &config, args).await
        }
        Commands::Auth { command } => auth::run_auth(&config, command).await,
    }
}

async fn connect(config: &dropsync_core::AppConfig) -> anyhow::Result<sqlx::PgPool> {
    let pool_config = dropsync_db::PoolConfig::from_app_config(config);
    let pool = dropsync_db::connect_pool(&config.database_url, pool_config).await?;
    dropsync_db::run_migrations(&pool).await?;
    Ok(pool)
}

/// Marks a run failed, logging rather than propagating bookkeeping errors so
/// the original failure stays the one the operator sees.
pub(crate) async fn fail_run_best_effort(
    pool: &sqlx::PgPool,
    run_id: i64,
    run_type: &str,
    message: String,
) {
    if let Err(e) = dropsync_db::fail_sync_run(pool, run_id, &message).await {
        tracing::error!(run_id, run_type, error = %e, "failed to mark sync run as failed");
    }
}
