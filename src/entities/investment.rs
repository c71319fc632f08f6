//! Investment entity - The per-user running balance.
//!
//! Holds the three totals as canonical decimal strings. They are parsed into
//! `Decimal` by [`crate::core::investment`] and never pass through floating point.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Investment database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "investments")]
pub struct Model {
    /// Unique identifier for the investment
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owning user
    #[sea_orm(unique)]
    pub user_id: i64,
    /// Total ever purchased, net of transfers
    #[sea_orm(column_type = "Text")]
    pub purchased_total: String,
    /// Total released back to the user
    #[sea_orm(column_type = "Text")]
    pub released_total: String,
    /// Currently restricted balance
    #[sea_orm(column_type = "Text")]
    pub locked_total: String,
}

/// Defines relationships between Investment and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each investment belongs to one user
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
