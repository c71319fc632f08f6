//! Service facade over the ledger workflows.
//!
//! [`Ledger`] owns the database connection and the notifier and exposes one
//! method per operation. Every method returns a [`LedgerResponse`]: the data on
//! success, or the error's [`ErrorKind`] and message on failure. Errors never
//! escape as raw database errors.

use crate::{
    config::database,
    core::{
        history,
        investment::{self, Balances},
        order::{self, CreateOrderRequest},
        transfer::{self, AdminTransferRequest, CreateTransferRequest},
        user::{self, UserUpdate},
    },
    entities::{
        OrderStatus, TransferStatus, order as order_entity, transaction_history,
        transfer as transfer_entity, user as user_entity,
    },
    errors::{ErrorKind, Result},
    notify::Notifier,
};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use tracing::{debug, error, info};

/// Outcome of a ledger call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResponseStatus {
    /// The operation completed
    Success,
    /// The operation was rejected or failed
    Failed,
    /// The operation was rejected, but the existing state only needs a
    /// follow-up (e.g. a pending email confirmation)
    Warning,
}

/// Uniform response of every ledger operation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerResponse<T> {
    /// Result payload, present on success
    pub data: Option<T>,
    /// Success or failure
    pub status: ResponseStatus,
    /// Failure class, present on failure
    pub error_code: Option<ErrorKind>,
    /// Human readable failure message
    pub error_message: Option<String>,
}

impl<T> LedgerResponse<T> {
    /// Successful response carrying `data`.
    #[must_use]
    pub const fn success(data: T) -> Self {
        Self {
            data: Some(data),
            status: ResponseStatus::Success,
            error_code: None,
            error_message: None,
        }
    }

    /// Failed response with the given class and message.
    #[must_use]
    pub const fn failure(kind: ErrorKind, message: String) -> Self {
        Self {
            data: None,
            status: ResponseStatus::Failed,
            error_code: Some(kind),
            error_message: Some(message),
        }
    }

    /// Whether the operation succeeded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == ResponseStatus::Success
    }
}

impl<T> From<Result<T>> for LedgerResponse<T> {
    fn from(result: Result<T>) -> Self {
        match result {
            Ok(data) => Self::success(data),
            Err(e) => {
                let kind = e.kind();
                if kind == ErrorKind::Internal {
                    error!(error = %e, "Ledger operation failed");
                } else {
                    debug!(error = %e, ?kind, "Ledger operation rejected");
                }
                let mut response = Self::failure(kind, e.to_string());
                if e.is_warning() {
                    response.status = ResponseStatus::Warning;
                }
                response
            }
        }
    }
}

/// Entry point for callers of the ledger.
#[derive(Debug)]
pub struct Ledger {
    db: DatabaseConnection,
    notifier: Notifier,
}

impl Ledger {
    /// Wraps an existing connection whose tables already exist.
    #[must_use]
    pub const fn new(db: DatabaseConnection, notifier: Notifier) -> Self {
        Self { db, notifier }
    }

    /// Connects to `database_url` and makes sure every ledger table exists.
    pub async fn connect(database_url: &str, notifier: Notifier) -> Result<Self> {
        let db = database::create_connection(database_url).await?;
        database::create_tables(&db).await?;
        info!("Ledger connected");
        Ok(Self::new(db, notifier))
    }

    /// The underlying connection.
    #[must_use]
    pub const fn database(&self) -> &DatabaseConnection {
        &self.db
    }

    // Orders

    /// Creates a PURCHASE or RELEASE order on behalf of an admin.
    pub async fn create_order(
        &self,
        requested_by: &str,
        request: CreateOrderRequest,
    ) -> LedgerResponse<order_entity::Model> {
        order::create_order(&self.db, requested_by, request).await.into()
    }

    /// Deletes an ACTIVE order and reverses its balance effect.
    pub async fn delete_order(&self, order_id: i64) -> LedgerResponse<order_entity::Model> {
        order::delete_order(&self.db, order_id).await.into()
    }

    /// Orders newest first, optionally only one status.
    pub async fn list_orders(
        &self,
        status: Option<OrderStatus>,
    ) -> LedgerResponse<Vec<order_entity::Model>> {
        order::list_orders(&self.db, status).await.into()
    }

    /// Number of orders, optionally only one status.
    pub async fn count_orders(&self, status: Option<OrderStatus>) -> LedgerResponse<u64> {
        order::count_orders(&self.db, status).await.into()
    }

    // Transfers

    /// Starts a PENDING transfer from `sender_user_id`.
    pub async fn create_transfer(
        &self,
        sender_user_id: i64,
        request: CreateTransferRequest,
    ) -> LedgerResponse<transfer_entity::Model> {
        transfer::create_transfer(&self.db, &self.notifier, sender_user_id, request)
            .await
            .into()
    }

    /// Completes a PENDING transfer.
    pub async fn activate_transfer(
        &self,
        transfer_id: i64,
    ) -> LedgerResponse<transfer_entity::Model> {
        transfer::activate_transfer(&self.db, &self.notifier, transfer_id)
            .await
            .into()
    }

    /// Cancels a PENDING transfer.
    pub async fn cancel_transfer(
        &self,
        transfer_id: i64,
    ) -> LedgerResponse<transfer_entity::Model> {
        transfer::cancel_transfer(&self.db, &self.notifier, transfer_id)
            .await
            .into()
    }

    /// Moves value between two users at once.
    pub async fn admin_transfer(
        &self,
        requested_by: &str,
        request: AdminTransferRequest,
    ) -> LedgerResponse<transfer_entity::Model> {
        transfer::admin_transfer(&self.db, requested_by, request)
            .await
            .into()
    }

    /// Reverses a DONE transfer.
    pub async fn delete_transfer(
        &self,
        transfer_id: i64,
    ) -> LedgerResponse<transfer_entity::Model> {
        transfer::delete_transfer(&self.db, transfer_id).await.into()
    }

    /// Transfers sent by one user, newest first.
    pub async fn list_transfers_for_user(
        &self,
        user_id: i64,
    ) -> LedgerResponse<Vec<transfer_entity::Model>> {
        transfer::list_transfers_for_user(&self.db, user_id)
            .await
            .into()
    }

    /// All transfers newest first, optionally only one status.
    pub async fn list_transfers(
        &self,
        status: Option<TransferStatus>,
    ) -> LedgerResponse<Vec<transfer_entity::Model>> {
        transfer::list_transfers(&self.db, status).await.into()
    }

    /// Number of transfers sent by one user.
    pub async fn count_transfers_for_user(&self, user_id: i64) -> LedgerResponse<u64> {
        transfer::count_transfers_for_user(&self.db, user_id)
            .await
            .into()
    }

    // Balances and history

    /// The user's three totals, zeros before their investment exists.
    pub async fn balance_summary(&self, user_id: i64) -> LedgerResponse<Balances> {
        investment::get_balance_summary(&self.db, user_id)
            .await
            .into()
    }

    /// ACTIVE history of one user, newest first.
    pub async fn history(&self, user_id: i64) -> LedgerResponse<Vec<transaction_history::Model>> {
        history::get_active_history_for_user(&self.db, user_id)
            .await
            .into()
    }

    /// Number of ACTIVE history rows of one user.
    pub async fn count_history(&self, user_id: i64) -> LedgerResponse<u64> {
        history::count_active_history_for_user(&self.db, user_id)
            .await
            .into()
    }

    // Users

    /// Registers an unverified user.
    pub async fn register_user(
        &self,
        email: String,
        wallet_address: Option<String>,
    ) -> LedgerResponse<user_entity::Model> {
        user::register_user(&self.db, email, wallet_address)
            .await
            .into()
    }

    /// Verifies a user's email and opens their investment.
    pub async fn verify_user_email(&self, user_id: i64) -> LedgerResponse<user_entity::Model> {
        user::verify_user_email(&self.db, user_id).await.into()
    }

    /// Creates a verified user with an investment in one step.
    pub async fn create_verified_user(
        &self,
        email: String,
        wallet_address: Option<String>,
    ) -> LedgerResponse<user_entity::Model> {
        user::create_verified_user(&self.db, email, wallet_address)
            .await
            .into()
    }

    /// All users, oldest first.
    pub async fn list_users(&self) -> LedgerResponse<Vec<user_entity::Model>> {
        user::list_users(&self.db).await.into()
    }

    /// One user by id.
    pub async fn get_user(&self, user_id: i64) -> LedgerResponse<user_entity::Model> {
        user::get_user(&self.db, user_id).await.into()
    }

    /// Number of registered users.
    pub async fn count_users(&self) -> LedgerResponse<u64> {
        user::count_users(&self.db).await.into()
    }

    /// Admin edit of email, wallet, verification and lock flags.
    pub async fn update_user(
        &self,
        user_id: i64,
        update: UserUpdate,
    ) -> LedgerResponse<user_entity::Model> {
        user::update_user(&self.db, user_id, update).await.into()
    }
}
