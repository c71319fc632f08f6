//! Transaction history entity - One row per balance-affecting side effect.
//!
//! Rows correlate to exactly one order or transfer. They are never removed;
//! reversing the originating order or transfer flips them to DELETED.
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// What kind of event moved the balance
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Activity {
    /// Purchase order
    #[sea_orm(string_value = "PURCHASE")]
    Purchase,
    /// Release order
    #[sea_orm(string_value = "RELEASE")]
    Release,
    /// One leg of a transfer
    #[sea_orm(string_value = "TRANSFER")]
    Transfer,
}

/// Whether the row still counts
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HistoryStatus {
    /// Live entry
    #[sea_orm(string_value = "ACTIVE")]
    Active,
    /// Voided by a reversal
    #[sea_orm(string_value = "DELETED")]
    Deleted,
}

impl fmt::Display for Activity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_value())
    }
}

/// Transaction history database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "transaction_histories")]
pub struct Model {
    /// Unique identifier for the row
    #[sea_orm(primary_key)]
    pub id: i64,
    /// When the event was recorded
    pub date: DateTimeUtc,
    /// `PURCHASE`, `RELEASE` or `TRANSFER`
    pub activity: Activity,
    /// Signed decimal amount (negative for the outgoing transfer leg)
    #[sea_orm(column_type = "Text")]
    pub amount: String,
    /// User whose balance moved
    pub user_id: i64,
    /// Originating order, if any
    pub order_id: Option<i64>,
    /// Originating transfer, if any
    pub transfer_id: Option<i64>,
    /// `ACTIVE` or `DELETED`
    pub status: HistoryStatus,
}

/// Defines relationships between history rows and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each row belongs to one user
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
    /// Rows created by an order
    #[sea_orm(
        belongs_to = "super::order::Entity",
        from = "Column::OrderId",
        to = "super::order::Column::Id"
    )]
    Order,
    /// Rows created by a transfer
    #[sea_orm(
        belongs_to = "super::transfer::Entity",
        from = "Column::TransferId",
        to = "super::transfer::Column::Id"
    )]
    Transfer,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Order.def()
    }
}

impl Related<super::transfer::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transfer.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
