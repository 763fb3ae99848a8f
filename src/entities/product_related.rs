//! Product → related product edge.
//!
//! Stored as a directed pair even though the storefront treats it as symmetric.
//! Self-references are filtered out before insert.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Related product association model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "product_related")]
pub struct Model {
    /// Owning product
    #[sea_orm(primary_key, auto_increment = false)]
    pub product_id: i64,
    /// Product being linked to
    #[sea_orm(primary_key, auto_increment = false)]
    pub related_id: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Product owning the link
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::ProductId",
        to = "super::product::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Owner,
    /// Product being linked to
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::RelatedId",
        to = "super::product::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    RelatedProduct,
}

impl ActiveModelBehavior for ActiveModel {}
