//! Transfer entity - A peer-to-peer move of locked value between two users.
//!
//! A transfer starts PENDING and only touches balances when it becomes DONE,
//! either through activation or the admin direct path.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle of a transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransferStatus {
    /// Awaiting confirmation by the sender
    #[sea_orm(string_value = "PENDING")]
    Pending,
    /// Balances moved
    #[sea_orm(string_value = "DONE")]
    Done,
    /// Abandoned before activation
    #[sea_orm(string_value = "CANCELLED")]
    Cancelled,
    /// Reversed by an admin after completion
    #[sea_orm(string_value = "DELETED")]
    Deleted,
}

impl fmt::Display for TransferStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_value())
    }
}

/// Transfer database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "transfers")]
pub struct Model {
    /// Unique identifier for the transfer
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Sender's user id
    pub user_id: i64,
    /// Sender's username
    pub sender: String,
    /// Receiver's username
    pub receiver: String,
    /// Positive decimal amount
    #[sea_orm(column_type = "Text")]
    pub amount: String,
    /// When the transfer was created
    pub create_date: DateTimeUtc,
    /// When the status last changed
    pub update_date: Option<DateTimeUtc>,
    /// Current lifecycle state
    pub status: TransferStatus,
    /// Human-readable sequential id (e.g. `Transfer0000000001`)
    #[sea_orm(unique)]
    pub record_number: String,
}

/// Defines relationships between Transfer and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each transfer is sent by one user
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
    /// One transfer has history rows for both legs
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
