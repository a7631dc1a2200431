use billing_engine::{
    config::{self, database},
    errors::Result,
    store::invoices,
};
use chrono::Utc;
use dotenvy::dotenv;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // 1. Load .env file (non-fatal, env vars can be set externally)
    let env_loaded = dotenv().is_ok();

    // 2. Load the billing configuration before logging so its level applies
    let billing_config = config::settings::load_config_or_default();
    let level = billing_config
        .as_ref()
        .map_or("info", |c| c.logging.level.as_str());

    // 3. Initialize tracing; RUST_LOG wins over the configured level
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .init();
    info!(env_loaded, "Attempted to load .env file.");

    let billing_config =
        billing_config.inspect_err(|e| error!("Failed to load configuration: {}", e))?;
    info!(
        prefix = %billing_config.invoice.number_prefix,
        payment_terms_days = billing_config.invoice.payment_terms_days,
        "Configuration loaded."
    );

    // 4. Connect and make sure the schema exists
    let db = database::create_connection()
        .await
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    database::create_tables(&db)
        .await
        .inspect(|_| info!("Database initialized successfully."))
        .inspect_err(|e| error!("Failed to initialize database: {}", e))?;

    // 5. Flag every sent invoice that is past due as of today
    let today = Utc::now().date_naive();
    let sweep = invoices::flag_overdue_invoices(&db, today)
        .await
        .inspect_err(|e| error!("Overdue sweep failed: {}", e))?;
    info!("{}", invoices::format_overdue_summary(&sweep).trim_end());

    Ok(())
}
