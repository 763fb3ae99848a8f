//! Product entity - A sellable catalog entry.
//!
//! Products carry two price columns (retail and wholesale). Whenever either changes,
//! `price_updated_at` is stamped and `price_updated` describes the operation that did it.
//! Images, categories and related products are stored in separate association tables.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Product database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    /// Unique identifier for the product
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Display name
    pub name: String,
    /// URL-safe unique handle
    #[sea_orm(unique)]
    pub slug: String,
    /// Long description
    pub description: Option<String>,
    /// Business identifier used by spreadsheet imports
    #[sea_orm(unique, nullable)]
    pub sku: Option<String>,
    /// Units in stock
    pub stock: i32,
    /// Whether the product is visible on the storefront
    pub is_active: bool,
    /// Whether the product is highlighted on the storefront
    pub is_featured: bool,
    /// Unit price for retail customers
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub retail_price: Decimal,
    /// Unit price for wholesale customers
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub wholesale_price: Decimal,
    /// Last time either price changed
    pub price_updated_at: Option<DateTimeUtc>,
    /// Description of the last price operation (e.g. `"Incrementar 12%"`)
    pub price_updated: Option<String>,
    /// When the product was created
    pub created_at: DateTimeUtc,
    /// When the product was last modified
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between Product and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Ordered image association rows
    #[sea_orm(has_many = "super::product_image::Entity")]
    ProductImages,
    /// Category association rows
    #[sea_orm(has_many = "super::product_category::Entity")]
    ProductCategories,
}

impl Related<super::product_image::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProductImages.def()
    }
}

impl Related<super::product_category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProductCategories.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
