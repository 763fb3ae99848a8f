//! Product ↔ image association.
//!
//! Rows for one product form a dense `order_index` sequence starting at 0, and only the
//! row at index 0 has `is_primary` set. Both are re-derived on every rewrite.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Product image association model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "product_images")]
pub struct Model {
    /// Owning product
    #[sea_orm(primary_key, auto_increment = false)]
    pub product_id: i64,
    /// Linked image
    #[sea_orm(primary_key, auto_increment = false)]
    pub image_id: i64,
    /// Position of the image within the product gallery
    pub order_index: i32,
    /// Whether this is the product's default image
    pub is_primary: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Owning product
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::ProductId",
        to = "super::product::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Product,
    /// Linked image
    #[sea_orm(
        belongs_to = "super::image::Entity",
        from = "Column::ImageId",
        to = "super::image::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Image,
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl Related<super::image::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Image.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
