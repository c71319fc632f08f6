//! Shared test utilities for the investment ledger.
//!
//! This module provides common helper functions for setting up test databases
//! and creating users, funded investments and transfers with sensible defaults.

use crate::{
    config::settings::MailSettings,
    core::{
        amount::format_amount,
        counter,
        investment::{self, Balances},
        order::{self, CreateOrderRequest},
        user,
    },
    entities::{self, TransferStatus},
    errors::{Error, Result},
    notify::{MailMessage, Mailer, Notifier},
};
use async_trait::async_trait;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};
use std::sync::{Arc, Mutex};

/// Installs a test-friendly tracing subscriber. Safe to call more than once.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    init_test_tracing();
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Creates a verified user with an empty investment.
pub async fn create_test_user(
    db: &DatabaseConnection,
    email: &str,
) -> Result<entities::user::Model> {
    user::create_verified_user(db, email.to_string(), None).await
}

/// Registers a user who has not verified their email (and so has no investment).
pub async fn create_unverified_user(
    db: &DatabaseConnection,
    email: &str,
) -> Result<entities::user::Model> {
    user::register_user(db, email.to_string(), None).await
}

/// Creates a verified user whose investment row is missing.
pub async fn create_verified_user_without_investment(
    db: &DatabaseConnection,
    email: &str,
) -> Result<entities::user::Model> {
    let registered = user::register_user(db, email.to_string(), None).await?;
    let mut active_model: entities::user::ActiveModel = registered.into();
    active_model.email_verified = Set(true);
    active_model.update(db).await.map_err(Into::into)
}

/// Credits `amount` to a user through an admin PURCHASE order.
pub async fn fund_user(
    db: &DatabaseConnection,
    username: &str,
    amount: Decimal,
) -> Result<entities::order::Model> {
    order::create_order(
        db,
        "admin",
        CreateOrderRequest {
            username: username.to_string(),
            amount,
            order_type: "PURCHASE".to_string(),
            txid: None,
        },
    )
    .await
}

/// Fresh database with one verified user holding `amount` purchased and locked.
pub async fn setup_with_funded_user(
    amount: Decimal,
) -> Result<(DatabaseConnection, entities::user::Model)> {
    let db = setup_test_db().await?;
    let holder = create_test_user(&db, "holder@example.com").await?;
    fund_user(&db, &holder.username, amount).await?;
    Ok((db, holder))
}

/// Current totals of a user, zeros if they have no investment.
pub async fn balances_of(db: &DatabaseConnection, user_id: i64) -> Result<Balances> {
    investment::get_balance_summary(db, user_id).await
}

/// Inserts a DONE transfer row directly, without moving any balance.
pub async fn insert_done_transfer(
    db: &DatabaseConnection,
    sender: &entities::user::Model,
    receiver: &entities::user::Model,
    amount: Decimal,
) -> Result<entities::transfer::Model> {
    let record_number = counter::next_record_number(db, counter::TRANSFER_COLLECTION).await?;
    entities::transfer::ActiveModel {
        user_id: Set(sender.id),
        sender: Set(sender.username.clone()),
        receiver: Set(receiver.username.clone()),
        amount: Set(format_amount(amount)),
        create_date: Set(chrono::Utc::now()),
        update_date: Set(None),
        status: Set(TransferStatus::Done),
        record_number: Set(record_number),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Mailer that keeps every message it is handed.
#[derive(Debug, Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<MailMessage>>,
}

impl RecordingMailer {
    /// Messages sent so far, oldest first.
    pub fn sent(&self) -> Vec<MailMessage> {
        self.sent
            .lock()
            .map(|sent| sent.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, message: MailMessage) -> Result<()> {
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(message);
        }
        Ok(())
    }
}

/// Mailer whose every delivery fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct FailingMailer;

#[async_trait]
impl Mailer for FailingMailer {
    async fn send(&self, _message: MailMessage) -> Result<()> {
        Err(Error::Mail {
            message: "smtp unreachable".to_string(),
        })
    }
}

/// Notifier with fixed test settings sending through `mailer`.
pub fn test_notifier(mailer: Arc<dyn Mailer>) -> Notifier {
    Notifier::new(
        mailer,
        MailSettings {
            from: "ledger@example.com".to_string(),
            api_url: "https://api.example.com".to_string(),
        },
    )
}

/// Notifier whose messages are discarded.
pub fn silent_notifier() -> Notifier {
    test_notifier(Arc::new(RecordingMailer::default()))
}
