use investment_ledger::{
    config::{database, settings},
    errors::Result,
    notify::{LogMailer, Notifier},
    service::Ledger,
};
use dotenvy::dotenv;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; env vars can also be set externally
    dotenv().ok();
    info!("Attempted to load .env file.");

    // 3. Load ledger.toml (defaults if absent)
    let ledger_config = settings::load_default_config()
        .inspect_err(|e| error!("Failed to load ledger configuration: {}", e))?;

    // 4. Connect and ensure tables
    let database_url = database::get_database_url(ledger_config.database.url.as_deref());
    if database_url == database::DEFAULT_DATABASE_URL {
        std::fs::create_dir_all("data")?;
    }

    let notifier = Notifier::new(Arc::new(LogMailer), ledger_config.mail.clone());
    let ledger = Ledger::connect(&database_url, notifier)
        .await
        .inspect_err(|e| error!("Failed to initialize database: {}", e))?;

    let users = ledger.list_users().await;
    info!(
        users = users.data.map_or(0, |u| u.len()),
        api_url = %ledger_config.mail.api_url,
        "Investment ledger ready"
    );

    Ok(())
}
