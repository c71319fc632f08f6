//! User entity - The identity directory the ledger resolves usernames against.
//!
//! Usernames are minted from the `User` counter at registration. A user can only
//! take part in orders and transfers once `email_verified` is set, which is also
//! the moment their investment row is created.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// User database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    /// Unique identifier for the user
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Sequential public username (e.g. `User0000000001`)
    #[sea_orm(unique)]
    pub username: String,
    /// Contact address, also used for mail notifications
    #[sea_orm(unique)]
    pub email: String,
    /// Whether the email address has been confirmed
    pub email_verified: bool,
    /// Optional on-chain wallet address
    pub wallet_address: Option<String>,
    /// Set by an admin to suspend the account; stored for the sign-in layer
    pub locked: bool,
    /// When the user registered
    pub created_at: DateTimeUtc,
    /// When the user was last modified
    pub updated_at: Option<DateTimeUtc>,
}

/// Defines relationships between User and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One user has one investment
    #[sea_orm(has_one = "super::investment::Entity")]
    Investment,
    /// One user has many orders
    #[sea_orm(has_many = "super::order::Entity")]
    Orders,
    /// One user sends many transfers
    #[sea_orm(has_many = "super::transfer::Entity")]
    Transfers,
    /// One user has many history rows
    #[sea_orm(has_many = "super::transaction_history::Entity")]
    TransactionHistories,
}

impl Related<super::investment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Investment.def()
    }
}

impl Related<super::order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Orders.def()
    }
}

impl Related<super::transfer::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transfers.def()
    }
}

impl Related<super::transaction_history::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TransactionHistories.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
