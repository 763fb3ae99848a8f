//! Budget entity - A customer quotation header.
//!
//! `total_amount` is supplied by the caller and is expected to equal the sum of the item
//! amounts. `approved_at` and `rejected_at` are stamped only by the matching status transition.

use super::enums::{BudgetStatus, PriceType};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Budget database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "budgets")]
pub struct Model {
    /// Unique identifier for the budget
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Customer the budget is issued to
    pub customer_id: Option<i64>,
    /// Issuing-party profile used for document generation
    pub responsible_id: Option<i64>,
    /// Which product price column new items are quoted from
    pub price_type: PriceType,
    /// Free-form note
    pub observation: Option<String>,
    /// Sum of all item amounts
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub total_amount: Decimal,
    /// Lifecycle status
    pub status: BudgetStatus,
    /// After this instant a pending budget may be swept to `expired`
    pub expires_at: Option<DateTimeUtc>,
    /// Set once, when the budget becomes `approved`
    pub approved_at: Option<DateTimeUtc>,
    /// Set once, when the budget becomes `rejected`
    pub rejected_at: Option<DateTimeUtc>,
    /// Whether an admin has opened the budget
    pub is_read: bool,
    /// When the budget was created
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Budget and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Line items, removed together with the budget
    #[sea_orm(has_many = "super::budget_item::Entity")]
    Items,
    /// Customer the budget is issued to
    #[sea_orm(
        belongs_to = "super::customer::Entity",
        from = "Column::CustomerId",
        to = "super::customer::Column::Id",
        on_update = "Cascade",
        on_delete = "SetNull"
    )]
    Customer,
    /// Issuing-party profile
    #[sea_orm(
        belongs_to = "super::responsible::Entity",
        from = "Column::ResponsibleId",
        to = "super::responsible::Column::Id",
        on_update = "Cascade",
        on_delete = "SetNull"
    )]
    Responsible,
}

impl Related<super::budget_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Items.def()
    }
}

impl Related<super::customer::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Customer.def()
    }
}

impl Related<super::responsible::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Responsible.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
