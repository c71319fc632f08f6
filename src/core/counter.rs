//! Sequential record numbers.
//!
//! Each logical collection (`Order`, `Transfer`, `User`) owns one counter row.
//! Increments are a single `value = value + 1` update so two callers never
//! read the same value.

use crate::{
    entities::{Counter, counter},
    errors::{Error, Result},
};
use sea_orm::{Set, prelude::*, sea_query::Expr};
use tracing::debug;

/// Counter used for order record numbers
pub const ORDER_COLLECTION: &str = "Order";
/// Counter used for transfer record numbers
pub const TRANSFER_COLLECTION: &str = "Transfer";
/// Counter used for minted usernames
pub const USER_COLLECTION: &str = "User";

const RECORD_NUMBER_WIDTH: usize = 10;

/// Returns the next value of the collection's sequence, starting at 1.
pub async fn next_value<C>(db: &C, collection: &str) -> Result<i64>
where
    C: ConnectionTrait,
{
    let updated = Counter::update_many()
        .col_expr(
            counter::Column::Value,
            Expr::col(counter::Column::Value).add(1),
        )
        .filter(counter::Column::Collection.eq(collection))
        .exec(db)
        .await?;

    if updated.rows_affected == 0 {
        debug!(collection, "Starting new sequence");
        let first = counter::ActiveModel {
            collection: Set(collection.to_string()),
            value: Set(1),
            ..Default::default()
        };
        first.insert(db).await?;
        return Ok(1);
    }

    Counter::find()
        .filter(counter::Column::Collection.eq(collection))
        .one(db)
        .await?
        .map(|c| c.value)
        .ok_or_else(|| {
            Error::Database(DbErr::RecordNotFound(format!(
                "counter for collection {collection}"
            )))
        })
}

/// Formats `<prefix><zero padded value>`, e.g. `Order0000000001`.
#[must_use]
pub fn format_record_number(prefix: &str, value: i64) -> String {
    format!("{prefix}{value:0>width$}", width = RECORD_NUMBER_WIDTH)
}

/// Mints the next record number for a collection, using the collection name as prefix.
pub async fn next_record_number<C>(db: &C, collection: &str) -> Result<String>
where
    C: ConnectionTrait,
{
    let value = next_value(db, collection).await?;
    Ok(format_record_number(collection, value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;

    #[test]
    fn test_format_record_number() {
        assert_eq!(format_record_number("Order", 1), "Order0000000001");
        assert_eq!(format_record_number("User", 1234567), "User0001234567");
    }

    #[tokio::test]
    async fn test_sequences_are_independent() -> Result<()> {
        let db = setup_test_db().await?;

        assert_eq!(next_value(&db, ORDER_COLLECTION).await?, 1);
        assert_eq!(next_value(&db, ORDER_COLLECTION).await?, 2);
        assert_eq!(next_value(&db, TRANSFER_COLLECTION).await?, 1);
        assert_eq!(
            next_record_number(&db, ORDER_COLLECTION).await?,
            "Order0000000003"
        );

        Ok(())
    }
}
