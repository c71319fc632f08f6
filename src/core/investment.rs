//! Investment balance tracking.
//!
//! Owns the three running totals of each user. [`apply_delta`] is the only way
//! balances change: it reads the row, adds the delta in decimal arithmetic and
//! writes the result back. Non-negativity is the caller's precondition, not
//! something this module enforces.

use crate::{
    core::amount::{format_amount, parse_amount},
    entities::{Investment, OrderType, investment},
    errors::{Error, Result},
};
use rust_decimal::Decimal;
use sea_orm::{Set, prelude::*};
use serde::Serialize;
use tracing::debug;

/// Change to apply to each of the three totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BalanceDelta {
    /// Added to `purchased_total`
    pub purchased: Decimal,
    /// Added to `released_total`
    pub released: Decimal,
    /// Added to `locked_total`
    pub locked: Decimal,
}

impl BalanceDelta {
    /// Effect of a purchase: purchased and locked both grow.
    #[must_use]
    pub const fn purchase(amount: Decimal) -> Self {
        Self {
            purchased: amount,
            released: Decimal::ZERO,
            locked: amount,
        }
    }

    /// Effect of a release: value moves from locked to released.
    #[must_use]
    pub fn release(amount: Decimal) -> Self {
        Self {
            purchased: Decimal::ZERO,
            released: amount,
            locked: -amount,
        }
    }

    /// Effect of an order of the given type.
    #[must_use]
    pub fn for_order(order_type: OrderType, amount: Decimal) -> Self {
        match order_type {
            OrderType::Purchase => Self::purchase(amount),
            OrderType::Release => Self::release(amount),
        }
    }

    /// Sender side of a completed transfer.
    #[must_use]
    pub fn transfer_out(amount: Decimal) -> Self {
        Self {
            purchased: -amount,
            released: Decimal::ZERO,
            locked: -amount,
        }
    }

    /// Receiver side of a completed transfer.
    #[must_use]
    pub const fn transfer_in(amount: Decimal) -> Self {
        Self {
            purchased: amount,
            released: Decimal::ZERO,
            locked: amount,
        }
    }

    /// The delta that undoes this one.
    #[must_use]
    pub fn inverse(self) -> Self {
        Self {
            purchased: -self.purchased,
            released: -self.released,
            locked: -self.locked,
        }
    }
}

/// Decoded totals of one investment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Balances {
    /// Total purchased, net of transfers
    pub purchased_total: Decimal,
    /// Total released
    pub released_total: Decimal,
    /// Currently locked
    pub locked_total: Decimal,
}

impl Balances {
    /// Parses the stored totals of an investment row.
    pub fn from_model(model: &investment::Model) -> Result<Self> {
        Ok(Self {
            purchased_total: parse_amount(&model.purchased_total)?,
            released_total: parse_amount(&model.released_total)?,
            locked_total: parse_amount(&model.locked_total)?,
        })
    }

    /// Totals after adding `delta`, or `None` if any total overflows.
    #[must_use]
    pub fn with_delta(self, delta: BalanceDelta) -> Option<Self> {
        Some(Self {
            purchased_total: self.purchased_total.checked_add(delta.purchased)?,
            released_total: self.released_total.checked_add(delta.released)?,
            locked_total: self.locked_total.checked_add(delta.locked)?,
        })
    }
}

/// Finds the investment owned by a user.
pub async fn get_investment_for_user<C>(db: &C, user_id: i64) -> Result<Option<investment::Model>>
where
    C: ConnectionTrait,
{
    Investment::find()
        .filter(investment::Column::UserId.eq(user_id))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Opens an investment with all totals at zero.
pub async fn create_investment<C>(db: &C, user_id: i64) -> Result<investment::Model>
where
    C: ConnectionTrait,
{
    let zero = format_amount(Decimal::ZERO);
    let model = investment::ActiveModel {
        user_id: Set(user_id),
        purchased_total: Set(zero.clone()),
        released_total: Set(zero.clone()),
        locked_total: Set(zero),
        ..Default::default()
    };

    model.insert(db).await.map_err(Into::into)
}

/// Applies `delta` to the investment of `user_id`.
///
/// # Errors
/// Returns `Error::InvestmentNotFound` if the user has no investment.
pub async fn apply_delta<C>(db: &C, user_id: i64, delta: BalanceDelta) -> Result<investment::Model>
where
    C: ConnectionTrait,
{
    let current = get_investment_for_user(db, user_id)
        .await?
        .ok_or(Error::InvestmentNotFound { user_id })?;

    apply_delta_to(db, current, delta).await
}

/// Applies `delta` to an investment row the caller already loaded.
///
/// # Errors
/// Returns `Error::AmountOverflow` if a total would leave the decimal range.
pub async fn apply_delta_to<C>(
    db: &C,
    current: investment::Model,
    delta: BalanceDelta,
) -> Result<investment::Model>
where
    C: ConnectionTrait,
{
    let updated = Balances::from_model(&current)?
        .with_delta(delta)
        .ok_or(Error::AmountOverflow {
            user_id: current.user_id,
        })?;
    debug!(
        user_id = current.user_id,
        purchased = %updated.purchased_total,
        released = %updated.released_total,
        locked = %updated.locked_total,
        "Applying balance delta"
    );

    let mut active_model: investment::ActiveModel = current.into();
    active_model.purchased_total = Set(format_amount(updated.purchased_total));
    active_model.released_total = Set(format_amount(updated.released_total));
    active_model.locked_total = Set(format_amount(updated.locked_total));

    active_model.update(db).await.map_err(Into::into)
}

/// Returns the user's totals, or zeros when they have no investment yet.
pub async fn get_balance_summary<C>(db: &C, user_id: i64) -> Result<Balances>
where
    C: ConnectionTrait,
{
    match get_investment_for_user(db, user_id).await? {
        Some(model) => Balances::from_model(&model),
        None => Ok(Balances::default()),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;
    use rust_decimal_macros::dec;
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[test]
    fn test_delta_inverse_round_trip() {
        let start = Balances {
            purchased_total: dec!(1000),
            released_total: dec!(100),
            locked_total: dec!(900),
        };

        for delta in [
            BalanceDelta::purchase(dec!(12.5)),
            BalanceDelta::release(dec!(300)),
            BalanceDelta::transfer_out(dec!(0.1)),
            BalanceDelta::transfer_in(dec!(7)),
        ] {
            let applied = start.with_delta(delta).unwrap();
            assert_eq!(applied.with_delta(delta.inverse()), Some(start));
        }
    }

    #[test]
    fn test_release_moves_locked_to_released() {
        let after = Balances {
            purchased_total: dec!(500),
            released_total: Decimal::ZERO,
            locked_total: dec!(500),
        }
        .with_delta(BalanceDelta::for_order(OrderType::Release, dec!(200)))
        .unwrap();

        assert_eq!(after.purchased_total, dec!(500));
        assert_eq!(after.released_total, dec!(200));
        assert_eq!(after.locked_total, dec!(300));
    }

    #[tokio::test]
    async fn test_apply_delta_not_found() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite)
            .append_query_results([Vec::<investment::Model>::new()])
            .into_connection();

        let result = apply_delta(&db, 99, BalanceDelta::purchase(dec!(1))).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::InvestmentNotFound { user_id: 99 }
        ));

        Ok(())
    }

    #[tokio::test]
    async fn test_apply_delta_integration() -> Result<()> {
        let db = setup_test_db().await?;
        let owner = create_test_user(&db, "owner@example.com").await?;

        let updated = apply_delta(&db, owner.id, BalanceDelta::purchase(dec!(1000.25))).await?;
        assert_eq!(updated.purchased_total, "1000.25");
        assert_eq!(updated.locked_total, "1000.25");
        assert_eq!(updated.released_total, "0");

        apply_delta(&db, owner.id, BalanceDelta::release(dec!(0.25))).await?;
        let balances = balances_of(&db, owner.id).await?;
        assert_eq!(balances.purchased_total, dec!(1000.25));
        assert_eq!(balances.released_total, dec!(0.25));
        assert_eq!(balances.locked_total, dec!(1000));

        Ok(())
    }

    #[tokio::test]
    async fn test_apply_delta_does_not_enforce_non_negative() -> Result<()> {
        let db = setup_test_db().await?;
        let owner = create_test_user(&db, "owner@example.com").await?;

        let updated = apply_delta(&db, owner.id, BalanceDelta::transfer_out(dec!(5))).await?;
        assert_eq!(updated.locked_total, "-5");

        Ok(())
    }

    #[test]
    fn test_with_delta_overflow_is_none() {
        let full = Balances {
            purchased_total: Decimal::MAX,
            released_total: Decimal::ZERO,
            locked_total: Decimal::MAX,
        };
        assert_eq!(full.with_delta(BalanceDelta::purchase(dec!(1))), None);
        assert!(full.with_delta(BalanceDelta::release(dec!(1))).is_some());
    }

    #[tokio::test]
    async fn test_apply_delta_overflow_leaves_row_untouched() -> Result<()> {
        let db = setup_test_db().await?;
        let owner = create_test_user(&db, "owner@example.com").await?;
        apply_delta(&db, owner.id, BalanceDelta::purchase(Decimal::MAX)).await?;

        let result = apply_delta(&db, owner.id, BalanceDelta::purchase(dec!(1))).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::AmountOverflow { user_id } if user_id == owner.id
        ));
        assert_eq!(balances_of(&db, owner.id).await?.locked_total, Decimal::MAX);

        Ok(())
    }

    #[tokio::test]
    async fn test_balance_summary_defaults_to_zero() -> Result<()> {
        let db = setup_test_db().await?;
        let pending = create_unverified_user(&db, "pending@example.com").await?;

        let summary = get_balance_summary(&db, pending.id).await?;
        assert_eq!(summary, Balances::default());

        Ok(())
    }
}
