//! Transfer business logic - Moves locked value between two users.
//!
//! A user-initiated transfer is created PENDING and moves no balance until the
//! sender activates it. Activation debits the sender and credits the receiver
//! (purchased and locked totals both move) and records one history row per leg.
//! Admins can transfer directly (created DONE) and reverse a DONE transfer.
//!
//! All ledger writes of one call share a database transaction; mail is sent
//! after the commit and its failure is only logged.

use crate::{
    core::{
        amount::{ensure_positive, format_amount, parse_amount},
        counter,
        history::{self, Correlation},
        investment::{self, BalanceDelta},
        lifecycle::ensure_transfer_transition,
        user,
    },
    entities::{Activity, Transfer, TransferStatus, investment as investment_entity, transfer},
    errors::{Error, Result},
    notify::Notifier,
};
use rust_decimal::Decimal;
use sea_orm::{PaginatorTrait, QueryOrder, Set, TransactionTrait, prelude::*};
use serde::Deserialize;
use tracing::{info, instrument, warn};

/// Input of [`create_transfer`].
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTransferRequest {
    /// Receiver's username
    pub receiver: String,
    /// Positive amount
    pub amount: Decimal,
}

/// Input of [`admin_transfer`].
#[derive(Debug, Clone, Deserialize)]
pub struct AdminTransferRequest {
    /// Sender's username
    pub sender: String,
    /// Receiver's username
    pub receiver: String,
    /// Positive amount
    pub amount: Decimal,
}

/// Creates a PENDING transfer from `sender_user_id` and mails the sender a
/// confirmation link. No balance moves.
#[instrument(
    skip(db, notifier, request),
    fields(receiver = %request.receiver, amount = %request.amount)
)]
pub async fn create_transfer(
    db: &DatabaseConnection,
    notifier: &Notifier,
    sender_user_id: i64,
    request: CreateTransferRequest,
) -> Result<transfer::Model> {
    ensure_positive(request.amount)?;
    let amount = request.amount;

    let txn = db.begin().await?;

    let sender = user::get_user_by_id(&txn, sender_user_id)
        .await?
        .ok_or(Error::UserIdNotFound {
            user_id: sender_user_id,
        })?;
    let sender_investment = investment::get_investment_for_user(&txn, sender.id)
        .await?
        .ok_or_else(|| Error::MissingInvestment {
            username: sender.username.clone(),
        })?;
    ensure_locked_covers(&sender_investment, amount)?;

    let receiver = user::resolve_verified_user(&txn, &request.receiver).await?;

    let record_number = counter::next_record_number(&txn, counter::TRANSFER_COLLECTION).await?;
    let pending = transfer::ActiveModel {
        user_id: Set(sender.id),
        sender: Set(sender.username.clone()),
        receiver: Set(receiver.username.clone()),
        amount: Set(format_amount(amount)),
        create_date: Set(chrono::Utc::now()),
        update_date: Set(None),
        status: Set(TransferStatus::Pending),
        record_number: Set(record_number),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;

    info!(record_number = %pending.record_number, "Transfer pending confirmation");
    notifier.transfer_requested(&sender, &receiver, &pending).await;
    Ok(pending)
}

/// Completes a PENDING transfer: debits the sender, credits the receiver and
/// records both legs.
///
/// # Errors
/// `TransferNotFound` for an unknown id, `InvalidTransition` unless the
/// transfer is PENDING, and `InsufficientLocked` when the sender's locked
/// total no longer covers the amount (other transfers may have drained it
/// since creation).
#[instrument(skip(db, notifier))]
pub async fn activate_transfer(
    db: &DatabaseConnection,
    notifier: &Notifier,
    transfer_id: i64,
) -> Result<transfer::Model> {
    let txn = db.begin().await?;

    let pending = find_transfer(&txn, transfer_id).await?;
    ensure_transfer_transition(&pending, TransferStatus::Done)?;

    let sender = user::get_user_by_id(&txn, pending.user_id).await?;
    settle(&txn, &pending).await?;
    let done = set_status(&txn, pending, TransferStatus::Done).await?;

    txn.commit().await?;

    info!(record_number = %done.record_number, "Transfer activated");
    if let Some(sender) = sender {
        notifier.transfer_completed(&sender, &done).await;
    }
    Ok(done)
}

/// Cancels a PENDING transfer. Balances are untouched since none moved yet.
#[instrument(skip(db, notifier))]
pub async fn cancel_transfer(
    db: &DatabaseConnection,
    notifier: &Notifier,
    transfer_id: i64,
) -> Result<transfer::Model> {
    let txn = db.begin().await?;

    let pending = find_transfer(&txn, transfer_id).await?;
    ensure_transfer_transition(&pending, TransferStatus::Cancelled)?;

    let sender = user::get_user_by_id(&txn, pending.user_id).await?;
    let cancelled = set_status(&txn, pending, TransferStatus::Cancelled).await?;

    txn.commit().await?;

    info!(record_number = %cancelled.record_number, "Transfer cancelled");
    if let Some(sender) = sender {
        notifier.transfer_cancelled(&sender, &cancelled).await;
    }
    Ok(cancelled)
}

/// Admin transfer between two named users, created DONE and settled at once.
#[instrument(
    skip(db, request),
    fields(sender = %request.sender, receiver = %request.receiver, amount = %request.amount)
)]
pub async fn admin_transfer(
    db: &DatabaseConnection,
    requested_by: &str,
    request: AdminTransferRequest,
) -> Result<transfer::Model> {
    ensure_positive(request.amount)?;
    let amount = request.amount;

    let txn = db.begin().await?;

    let sender = user::resolve_verified_user(&txn, &request.sender).await?;
    let receiver = user::resolve_verified_user(&txn, &request.receiver).await?;
    let sender_investment = investment::get_investment_for_user(&txn, sender.id)
        .await?
        .ok_or_else(|| Error::MissingInvestment {
            username: sender.username.clone(),
        })?;
    ensure_locked_covers(&sender_investment, amount)?;

    let record_number = counter::next_record_number(&txn, counter::TRANSFER_COLLECTION).await?;
    let done = transfer::ActiveModel {
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
    .insert(&txn)
    .await?;

    settle(&txn, &done).await?;

    txn.commit().await?;

    info!(record_number = %done.record_number, "Admin transfer completed");
    Ok(done)
}

/// Reverses a DONE transfer: refunds the sender, takes the amount back from
/// the receiver, voids both history legs and marks the transfer DELETED.
///
/// PENDING and CANCELLED transfers never moved a balance and cannot be deleted.
#[instrument(skip(db))]
pub async fn delete_transfer(db: &DatabaseConnection, transfer_id: i64) -> Result<transfer::Model> {
    let txn = db.begin().await?;

    let done = find_transfer(&txn, transfer_id).await?;
    ensure_transfer_transition(&done, TransferStatus::Deleted)?;
    let amount = parse_amount(&done.amount)?;

    let sender = user::get_user_by_username(&txn, &done.sender)
        .await?
        .ok_or_else(|| Error::MissingParty {
            role: "sender",
            username: done.sender.clone(),
        })?;
    let receiver = user::get_user_by_username(&txn, &done.receiver)
        .await?
        .ok_or_else(|| Error::MissingParty {
            role: "receiver",
            username: done.receiver.clone(),
        })?;
    let sender_investment = investment::get_investment_for_user(&txn, sender.id)
        .await?
        .ok_or_else(|| Error::MissingInvestment {
            username: sender.username.clone(),
        })?;
    if investment::get_investment_for_user(&txn, receiver.id)
        .await?
        .is_none()
    {
        return Err(Error::MissingInvestment {
            username: receiver.username,
        });
    }

    investment::apply_delta_to(
        &txn,
        sender_investment,
        BalanceDelta::transfer_out(amount).inverse(),
    )
    .await?;
    // Re-read after the refund: sender and receiver may share one row
    investment::apply_delta(
        &txn,
        receiver.id,
        BalanceDelta::transfer_in(amount).inverse(),
    )
    .await?;
    history::void_for(&txn, Correlation::Transfer(transfer_id)).await?;
    let deleted = set_status(&txn, done, TransferStatus::Deleted).await?;

    txn.commit().await?;

    info!(record_number = %deleted.record_number, "Transfer reversed");
    Ok(deleted)
}

/// Finds a transfer by id.
pub async fn get_transfer_by_id(
    db: &DatabaseConnection,
    transfer_id: i64,
) -> Result<Option<transfer::Model>> {
    Transfer::find_by_id(transfer_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Transfers sent by one user, newest first.
pub async fn list_transfers_for_user(
    db: &DatabaseConnection,
    user_id: i64,
) -> Result<Vec<transfer::Model>> {
    Transfer::find()
        .filter(transfer::Column::UserId.eq(user_id))
        .order_by_desc(transfer::Column::CreateDate)
        .order_by_desc(transfer::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Number of transfers sent by one user.
pub async fn count_transfers_for_user(db: &DatabaseConnection, user_id: i64) -> Result<u64> {
    Transfer::find()
        .filter(transfer::Column::UserId.eq(user_id))
        .count(db)
        .await
        .map_err(Into::into)
}

/// All transfers newest first, optionally only those in one status.
pub async fn list_transfers(
    db: &DatabaseConnection,
    status: Option<TransferStatus>,
) -> Result<Vec<transfer::Model>> {
    let mut query = Transfer::find();
    if let Some(status) = status {
        query = query.filter(transfer::Column::Status.eq(status));
    }

    query
        .order_by_desc(transfer::Column::CreateDate)
        .order_by_desc(transfer::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

async fn find_transfer<C>(db: &C, transfer_id: i64) -> Result<transfer::Model>
where
    C: ConnectionTrait,
{
    Transfer::find_by_id(transfer_id)
        .one(db)
        .await?
        .ok_or(Error::TransferNotFound { transfer_id })
}

fn ensure_locked_covers(current: &investment_entity::Model, amount: Decimal) -> Result<()> {
    let available = parse_amount(&current.locked_total)?;
    if available < amount {
        return Err(Error::InsufficientLocked {
            available,
            required: amount,
        });
    }
    Ok(())
}

/// Moves the transfer amount from sender to receiver and records both legs.
///
/// A party without an investment is skipped with a warning; history rows are
/// keyed off the owner of the investment that actually moved.
async fn settle<C>(db: &C, transfer: &transfer::Model) -> Result<()>
where
    C: ConnectionTrait,
{
    let amount = parse_amount(&transfer.amount)?;
    let correlation = Correlation::Transfer(transfer.id);

    match investment::get_investment_for_user(db, transfer.user_id).await? {
        Some(current) => {
            ensure_locked_covers(&current, amount)?;
            let owner = current.user_id;
            investment::apply_delta_to(db, current, BalanceDelta::transfer_out(amount)).await?;
            history::record(db, owner, Activity::Transfer, -amount, correlation).await?;
        }
        None => warn!(
            transfer_id = transfer.id,
            sender = %transfer.sender,
            "Sender has no investment, debit skipped"
        ),
    }

    let receiver_investment = match user::get_user_by_username(db, &transfer.receiver).await? {
        Some(receiver) => investment::get_investment_for_user(db, receiver.id).await?,
        None => None,
    };
    match receiver_investment {
        Some(current) => {
            let owner = current.user_id;
            investment::apply_delta_to(db, current, BalanceDelta::transfer_in(amount)).await?;
            history::record(db, owner, Activity::Transfer, amount, correlation).await?;
        }
        None => warn!(
            transfer_id = transfer.id,
            receiver = %transfer.receiver,
            "Receiver has no investment, credit skipped"
        ),
    }

    Ok(())
}

async fn set_status<C>(
    db: &C,
    current: transfer::Model,
    status: TransferStatus,
) -> Result<transfer::Model>
where
    C: ConnectionTrait,
{
    let mut active_model: transfer::ActiveModel = current.into();
    active_model.status = Set(status);
    active_model.update_date = Set(Some(chrono::Utc::now()));
    active_model.update(db).await.map_err(Into::into)
}
