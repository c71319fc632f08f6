//! Status transition rules.
//!
//! Orders: `ACTIVE -> DELETED`.
//! Transfers: `PENDING -> DONE`, `PENDING -> CANCELLED`, `DONE -> DELETED`.
//! Every mutating entry point checks its transition here and nowhere else.

use crate::{
    entities::{OrderModel, OrderStatus, TransferModel, TransferStatus},
    errors::{Error, Result},
};

impl OrderStatus {
    /// Whether an order in this status may move to `next`.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!((self, next), (Self::Active, Self::Deleted))
    }
}

impl TransferStatus {
    /// Whether a transfer in this status may move to `next`.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Done | Self::Cancelled) | (Self::Done, Self::Deleted)
        )
    }
}

/// Fails with `Error::InvalidTransition` unless the order may move to `next`.
pub fn ensure_order_transition(order: &OrderModel, next: OrderStatus) -> Result<()> {
    if order.status.can_transition_to(next) {
        Ok(())
    } else {
        Err(Error::InvalidTransition {
            entity: "Order",
            id: order.id,
            from: order.status.to_string(),
            to: next.to_string(),
        })
    }
}

/// Fails with `Error::InvalidTransition` unless the transfer may move to `next`.
pub fn ensure_transfer_transition(transfer: &TransferModel, next: TransferStatus) -> Result<()> {
    if transfer.status.can_transition_to(next) {
        Ok(())
    } else {
        Err(Error::InvalidTransition {
            entity: "Transfer",
            id: transfer.id,
            from: transfer.status.to_string(),
            to: next.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::Iterable;

    #[test]
    fn test_order_transitions() {
        assert!(OrderStatus::Active.can_transition_to(OrderStatus::Deleted));
        assert!(!OrderStatus::Deleted.can_transition_to(OrderStatus::Deleted));
        assert!(!OrderStatus::Deleted.can_transition_to(OrderStatus::Active));
        assert!(!OrderStatus::Active.can_transition_to(OrderStatus::Active));
    }

    #[test]
    fn test_transfer_transitions() {
        let allowed = [
            (TransferStatus::Pending, TransferStatus::Done),
            (TransferStatus::Pending, TransferStatus::Cancelled),
            (TransferStatus::Done, TransferStatus::Deleted),
        ];

        for from in TransferStatus::iter() {
            for to in TransferStatus::iter() {
                assert_eq!(
                    from.can_transition_to(to),
                    allowed.contains(&(from, to)),
                    "{from} -> {to}"
                );
            }
        }
    }
}
