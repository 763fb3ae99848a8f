//! Budget item entity - One quoted line.
//!
//! Prices are snapshots taken at quote time; later product changes do not touch them.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Budget item database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "budget_items")]
pub struct Model {
    /// Unique identifier for the line
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owning budget
    pub budget_id: i64,
    /// Quoted product (snapshot reference, no foreign key)
    pub product_id: i64,
    /// Quoted units
    pub quantity: i32,
    /// Unit price actually quoted
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub price: Decimal,
    /// Retail price at quote time
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub retail_price: Decimal,
    /// Wholesale price at quote time
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub wholesale_price: Decimal,
    /// `price * quantity`
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub amount: Decimal,
    /// Free-form note
    pub observation: Option<String>,
}

/// Defines relationships between `BudgetItem` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each item belongs to one budget
    #[sea_orm(
        belongs_to = "super::budget::Entity",
        from = "Column::BudgetId",
        to = "super::budget::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Budget,
}

impl Related<super::budget::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Budget.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
