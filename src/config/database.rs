//! Database configuration module for the investment ledger.
//!
//! This module handles `SQLite` database connection and table creation using `SeaORM`.
//! Tables are generated from the entity definitions with `Schema::create_table_from_entity`,
//! so the database schema always matches the Rust structs without hand-written SQL.

use crate::entities::{Counter, Investment, Order, TransactionHistory, Transfer, User};
use crate::errors::Result;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Schema};
use tracing::{debug, info, instrument};

/// Default location of the ledger database when nothing else is configured.
pub const DEFAULT_DATABASE_URL: &str = "sqlite://data/investment_ledger.sqlite?mode=rwc";

/// Resolves the database URL.
///
/// `DATABASE_URL` in the environment wins, then the configured value, then
/// [`DEFAULT_DATABASE_URL`].
#[must_use]
pub fn get_database_url(configured: Option<&str>) -> String {
    std::env::var("DATABASE_URL")
        .ok()
        .or_else(|| configured.map(str::to_string))
        .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string())
}

/// Establishes a connection to the ledger database.
#[instrument]
pub async fn create_connection(database_url: &str) -> Result<DatabaseConnection> {
    debug!("Connecting to ledger database");
    Database::connect(database_url).await.map_err(Into::into)
}

/// Creates all ledger tables from the entity definitions.
///
/// Users are created first so the foreign keys of the other tables resolve.
/// Existing tables are left alone.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    for mut table in [
        schema.create_table_from_entity(User),
        schema.create_table_from_entity(Counter),
        schema.create_table_from_entity(Investment),
        schema.create_table_from_entity(Order),
        schema.create_table_from_entity(Transfer),
        schema.create_table_from_entity(TransactionHistory),
    ] {
        table.if_not_exists();
        db.execute(builder.build(&table)).await?;
    }

    info!("Ledger tables ensured");
    Ok(())
}
