//! Image entity - A stored asset descriptor.
//!
//! The file itself lives in external object storage; only its durable URL is kept here.
//! Images are referenced by categories (one each) and by products (ordered, through `product_images`).

use super::enums::ImageTag;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Image database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "images")]
pub struct Model {
    /// Unique identifier for the image
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Durable URL returned by object storage
    pub url: String,
    /// Alternative text for accessibility
    pub alt: Option<String>,
    /// Folder-like classification
    pub tag: ImageTag,
    /// Free-form note
    pub observation: Option<String>,
    /// When the image was registered
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Image and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Categories using this image as artwork
    #[sea_orm(has_many = "super::category::Entity")]
    Categories,
    /// Product association rows pointing at this image
    #[sea_orm(has_many = "super::product_image::Entity")]
    ProductImages,
}

impl Related<super::category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Categories.def()
    }
}

impl Related<super::product_image::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProductImages.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
