//! Transaction history recording.
//!
//! One row per balance-affecting side effect, correlated to the order or
//! transfer that caused it. Reversals never remove rows; [`void_for`] flips the
//! correlated ones to DELETED.

use crate::{
    core::amount::format_amount,
    entities::{Activity, HistoryStatus, TransactionHistory, transaction_history},
    errors::Result,
};
use rust_decimal::Decimal;
use sea_orm::{PaginatorTrait, QueryOrder, Set, prelude::*, sea_query::SimpleExpr};
use tracing::debug;

/// The order or transfer a history row belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Correlation {
    /// Row created by an order
    Order(i64),
    /// Row created by a transfer leg
    Transfer(i64),
}

impl Correlation {
    fn condition(self) -> SimpleExpr {
        match self {
            Self::Order(id) => transaction_history::Column::OrderId.eq(id),
            Self::Transfer(id) => transaction_history::Column::TransferId.eq(id),
        }
    }
}

/// Appends an ACTIVE history row stamped with the current time.
pub async fn record<C>(
    db: &C,
    user_id: i64,
    activity: Activity,
    amount: Decimal,
    correlation: Correlation,
) -> Result<transaction_history::Model>
where
    C: ConnectionTrait,
{
    let (order_id, transfer_id) = match correlation {
        Correlation::Order(id) => (Some(id), None),
        Correlation::Transfer(id) => (None, Some(id)),
    };

    let row = transaction_history::ActiveModel {
        date: Set(chrono::Utc::now()),
        activity: Set(activity),
        amount: Set(format_amount(amount)),
        user_id: Set(user_id),
        order_id: Set(order_id),
        transfer_id: Set(transfer_id),
        status: Set(HistoryStatus::Active),
        ..Default::default()
    };

    let inserted = row.insert(db).await?;
    debug!(user_id, %activity, %amount, ?correlation, "Recorded history");
    Ok(inserted)
}

/// Flips every ACTIVE row of the correlation to DELETED and returns how many changed.
///
/// Running it again finds nothing ACTIVE and returns 0.
pub async fn void_for<C>(db: &C, correlation: Correlation) -> Result<u64>
where
    C: ConnectionTrait,
{
    let voided = TransactionHistory::update_many()
        .set(transaction_history::ActiveModel {
            status: Set(HistoryStatus::Deleted),
            ..Default::default()
        })
        .filter(correlation.condition())
        .filter(transaction_history::Column::Status.eq(HistoryStatus::Active))
        .exec(db)
        .await?;

    debug!(?correlation, rows = voided.rows_affected, "Voided history");
    Ok(voided.rows_affected)
}

/// All rows of a correlation, whatever their status, oldest first.
pub async fn get_history_for<C>(
    db: &C,
    correlation: Correlation,
) -> Result<Vec<transaction_history::Model>>
where
    C: ConnectionTrait,
{
    TransactionHistory::find()
        .filter(correlation.condition())
        .order_by_asc(transaction_history::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// ACTIVE rows of one user, newest first.
pub async fn get_active_history_for_user(
    db: &DatabaseConnection,
    user_id: i64,
) -> Result<Vec<transaction_history::Model>> {
    TransactionHistory::find()
        .filter(transaction_history::Column::UserId.eq(user_id))
        .filter(transaction_history::Column::Status.eq(HistoryStatus::Active))
        .order_by_desc(transaction_history::Column::Date)
        .order_by_desc(transaction_history::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Number of ACTIVE rows of one user.
pub async fn count_active_history_for_user(db: &DatabaseConnection, user_id: i64) -> Result<u64> {
    TransactionHistory::find()
        .filter(transaction_history::Column::UserId.eq(user_id))
        .filter(transaction_history::Column::Status.eq(HistoryStatus::Active))
        .count(db)
        .await
        .map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_record_and_void_by_correlation() -> Result<()> {
        let db = setup_test_db().await?;
        let sender = create_test_user(&db, "a@example.com").await?;
        let receiver = create_test_user(&db, "b@example.com").await?;
        let transfer = insert_done_transfer(&db, &sender, &receiver, dec!(300)).await?;

        record(
            &db,
            sender.id,
            Activity::Transfer,
            dec!(-300),
            Correlation::Transfer(transfer.id),
        )
        .await?;
        record(
            &db,
            receiver.id,
            Activity::Transfer,
            dec!(300),
            Correlation::Transfer(transfer.id),
        )
        .await?;

        let rows = get_history_for(&db, Correlation::Transfer(transfer.id)).await?;
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].amount, "-300");
        assert_eq!(rows[1].amount, "300");
        assert!(rows.iter().all(|r| r.status == HistoryStatus::Active));
        assert!(rows.iter().all(|r| r.order_id.is_none()));

        assert_eq!(void_for(&db, Correlation::Transfer(transfer.id)).await?, 2);
        let rows = get_history_for(&db, Correlation::Transfer(transfer.id)).await?;
        assert!(rows.iter().all(|r| r.status == HistoryStatus::Deleted));

        // Second void is a no-op
        assert_eq!(void_for(&db, Correlation::Transfer(transfer.id)).await?, 0);

        Ok(())
    }

    #[tokio::test]
    async fn test_void_leaves_other_correlations_alone() -> Result<()> {
        let db = setup_test_db().await?;
        let owner = create_test_user(&db, "owner@example.com").await?;
        let first = fund_user(&db, &owner.username, dec!(10)).await?;
        let second = fund_user(&db, &owner.username, dec!(20)).await?;

        assert_eq!(void_for(&db, Correlation::Order(first.id)).await?, 1);

        let untouched = get_history_for(&db, Correlation::Order(second.id)).await?;
        assert_eq!(untouched.len(), 1);
        assert_eq!(untouched[0].status, HistoryStatus::Active);

        let active = get_active_history_for_user(&db, owner.id).await?;
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].order_id, Some(second.id));
        assert_eq!(count_active_history_for_user(&db, owner.id).await?, 1);

        Ok(())
    }
}
