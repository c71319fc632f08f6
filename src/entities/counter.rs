//! Counter entity - Monotonic sequence per logical collection.
//! Used to mint order/transfer record numbers and usernames.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Counter database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "counters")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i32,
    /// Collection name (e.g. `"Order"`)
    #[sea_orm(unique)]
    pub collection: String,
    /// Last value handed out
    pub value: i64,
}

/// `Counter` has no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
