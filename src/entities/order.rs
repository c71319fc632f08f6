//! Order entity - An admin PURCHASE or RELEASE against one user's investment.
//!
//! Orders are created ACTIVE and can only be soft-deleted once, which reverses
//! their balance effect.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Direction of an order
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderType {
    /// Adds to purchased and locked totals
    #[sea_orm(string_value = "PURCHASE")]
    Purchase,
    /// Moves value from locked to released
    #[sea_orm(string_value = "RELEASE")]
    Release,
}

/// Lifecycle of an order
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Applied to the balance
    #[sea_orm(string_value = "ACTIVE")]
    Active,
    /// Reversed; terminal
    #[sea_orm(string_value = "DELETED")]
    Deleted,
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_value())
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_value())
    }
}

/// Order database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    /// Unique identifier for the order
    #[sea_orm(primary_key)]
    pub id: i64,
    /// User whose investment the order applies to
    pub user_id: i64,
    /// Username at the time the order was placed
    pub username: String,
    /// PURCHASE or RELEASE
    pub order_type: OrderType,
    /// Positive decimal amount
    #[sea_orm(column_type = "Text")]
    pub amount: String,
    /// When the order was created
    pub create_date: DateTimeUtc,
    /// When the order was last modified (set on deletion)
    pub update_date: Option<DateTimeUtc>,
    /// ACTIVE or DELETED
    pub status: OrderStatus,
    /// Optional on-chain transaction reference
    pub txid: Option<String>,
    /// Human-readable sequential id (e.g. `Order0000000001`)
    #[sea_orm(unique)]
    pub record_number: String,
}

/// Defines relationships between Order and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each order belongs to one user
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
    /// One order has history rows
    #[sea_orm(has_many = "super::transaction_history::Entity")]
    TransactionHistories,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::transaction_history::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TransactionHistories.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
