//! Order business logic - Admin purchases and releases against a user's investment.
//!
//! Creating an order writes the order row, adjusts the user's totals and appends a
//! PURCHASE or RELEASE history row in one database transaction. Deleting an order
//! reverses exactly that effect and voids the history row. An order can only be
//! deleted once.

use crate::{
    core::{
        amount::{ensure_positive, format_amount, parse_amount},
        counter,
        history::{self, Correlation},
        investment::{self, BalanceDelta},
        lifecycle::ensure_order_transition,
        user,
    },
    entities::{Activity, Order, OrderStatus, OrderType, order},
    errors::{Error, Result},
};
use rust_decimal::Decimal;
use sea_orm::{PaginatorTrait, QueryOrder, Set, TransactionTrait, prelude::*};
use serde::Deserialize;
use tracing::{info, instrument, warn};

/// Input of [`create_order`].
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    /// Username of the user the order applies to
    pub username: String,
    /// Positive amount
    pub amount: Decimal,
    /// `"PURCHASE"` or `"RELEASE"`
    pub order_type: String,
    /// Optional on-chain transaction reference
    #[serde(default)]
    pub txid: Option<String>,
}

/// Parses an order type as supplied by a caller.
///
/// # Errors
/// Returns `Error::UnsupportedOrderType` for anything but `PURCHASE` or `RELEASE`.
pub fn parse_order_type(raw: &str) -> Result<OrderType> {
    match raw.trim() {
        "PURCHASE" => Ok(OrderType::Purchase),
        "RELEASE" => Ok(OrderType::Release),
        other => Err(Error::UnsupportedOrderType {
            value: other.to_string(),
        }),
    }
}

/// Creates an order and applies it to the user's investment.
///
/// Fails with `UnsupportedOrderType` / `InvalidAmount` on bad input,
/// `UserNotFound` for an unknown username, `UserNotVerified`,
/// `MissingInvestment`, or `InsufficientLocked` when a release exceeds the
/// locked total. Nothing is written on failure.
#[instrument(skip(db, request), fields(username = %request.username, amount = %request.amount))]
pub async fn create_order(
    db: &DatabaseConnection,
    requested_by: &str,
    request: CreateOrderRequest,
) -> Result<order::Model> {
    let order_type = parse_order_type(&request.order_type)?;
    ensure_positive(request.amount)?;
    let amount = request.amount;

    let txn = db.begin().await?;

    let target = user::resolve_verified_user(&txn, &request.username).await?;
    let current = investment::get_investment_for_user(&txn, target.id)
        .await?
        .ok_or_else(|| Error::MissingInvestment {
            username: target.username.clone(),
        })?;

    if order_type == OrderType::Release {
        let available = parse_amount(&current.locked_total)?;
        if amount > available {
            return Err(Error::InsufficientLocked {
                available,
                required: amount,
            });
        }
    }

    let record_number = counter::next_record_number(&txn, counter::ORDER_COLLECTION).await?;
    let new_order = order::ActiveModel {
        user_id: Set(target.id),
        username: Set(target.username.clone()),
        order_type: Set(order_type),
        amount: Set(format_amount(amount)),
        create_date: Set(chrono::Utc::now()),
        update_date: Set(None),
        status: Set(OrderStatus::Active),
        txid: Set(request.txid.filter(|t| !t.trim().is_empty())),
        record_number: Set(record_number),
        ..Default::default()
    };
    let created = new_order.insert(&txn).await?;

    investment::apply_delta_to(&txn, current, BalanceDelta::for_order(order_type, amount)).await?;
    history::record(
        &txn,
        target.id,
        activity_for(order_type),
        amount,
        Correlation::Order(created.id),
    )
    .await?;

    txn.commit().await?;

    info!(
        record_number = %created.record_number,
        %order_type,
        "Order created"
    );
    Ok(created)
}

/// Soft-deletes an order and reverses its balance effect.
///
/// If the owner's investment has disappeared the order is still marked
/// DELETED, but no balance is corrected.
#[instrument(skip(db))]
pub async fn delete_order(db: &DatabaseConnection, order_id: i64) -> Result<order::Model> {
    let txn = db.begin().await?;

    let existing = Order::find_by_id(order_id)
        .one(&txn)
        .await?
        .ok_or(Error::OrderNotFound { order_id })?;
    ensure_order_transition(&existing, OrderStatus::Deleted)?;

    let amount = parse_amount(&existing.amount)?;
    let order_type = existing.order_type;
    let owner_id = existing.user_id;

    let mut active_model: order::ActiveModel = existing.into();
    active_model.status = Set(OrderStatus::Deleted);
    active_model.update_date = Set(Some(chrono::Utc::now()));
    let deleted = active_model.update(&txn).await?;

    match investment::get_investment_for_user(&txn, owner_id).await? {
        Some(current) => {
            let reversal = BalanceDelta::for_order(order_type, amount).inverse();
            investment::apply_delta_to(&txn, current, reversal).await?;
        }
        None => warn!(
            order_id,
            user_id = owner_id,
            "Investment missing, order deleted without balance correction"
        ),
    }

    history::void_for(&txn, Correlation::Order(order_id)).await?;

    txn.commit().await?;

    info!(record_number = %deleted.record_number, "Order deleted");
    Ok(deleted)
}

/// Finds an order by id.
pub async fn get_order_by_id(
    db: &DatabaseConnection,
    order_id: i64,
) -> Result<Option<order::Model>> {
    Order::find_by_id(order_id).one(db).await.map_err(Into::into)
}

/// Lists orders newest first, optionally only those in one status.
pub async fn list_orders(
    db: &DatabaseConnection,
    status: Option<OrderStatus>,
) -> Result<Vec<order::Model>> {
    let mut query = Order::find();
    if let Some(status) = status {
        query = query.filter(order::Column::Status.eq(status));
    }

    query
        .order_by_desc(order::Column::CreateDate)
        .order_by_desc(order::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Counts orders, optionally only those in one status.
pub async fn count_orders(db: &DatabaseConnection, status: Option<OrderStatus>) -> Result<u64> {
    let mut query = Order::find();
    if let Some(status) = status {
        query = query.filter(order::Column::Status.eq(status));
    }

    query.count(db).await.map_err(Into::into)
}

const fn activity_for(order_type: OrderType) -> Activity {
    match order_type {
        OrderType::Purchase => Activity::Purchase,
        OrderType::Release => Activity::Release,
    }
}
