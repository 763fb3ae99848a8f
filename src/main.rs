use chrono::Utc;
use dotenvy::dotenv;
use promo_catalog::{
    config::{database, settings},
    core::{budget, category, product},
    errors::Result,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file (non-fatal, env vars can be set externally)
    dotenv().ok();
    info!("Attempted to load .env file.");

    // 3. Load settings from config.toml, falling back to defaults
    let settings = settings::load_default_settings()
        .inspect_err(|e| error!("Failed to load settings: {}", e))?;
    info!(
        "Budgets valid for {} days, expiry sweep on startup: {}",
        settings.budget_validity_days, settings.expire_on_startup
    );

    // 4. Connect and make sure every table exists
    let db = database::create_connection()
        .await
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    database::create_tables(&db)
        .await
        .inspect(|_| info!("Database schema ready."))
        .inspect_err(|e| error!("Failed to create tables: {}", e))?;

    // 5. Expire overdue budgets if configured
    if settings.expire_on_startup {
        let report = budget::expire_overdue_budgets(&db, Utc::now())
            .await
            .inspect_err(|e| error!("Expiry sweep failed: {}", e))?;
        for (id, reason) in &report.failed {
            error!("Budget {} could not be expired: {}", id, reason);
        }
    }

    // 6. Report catalog size
    let products = product::count_products(&db).await?;
    let categories = category::list_categories(&db).await?.len();
    let unread = budget::count_unread_budgets(&db).await?;
    info!(
        "Catalog ready: {} products, {} categories, {} unread budgets",
        products, categories, unread
    );

    Ok(())
}
