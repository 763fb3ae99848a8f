//! Order entity - A confirmed sale.
//!
//! Structurally parallel to a budget. `budget_id` is set when the order was created by
//! promoting a budget.

use super::enums::{OrderStatus, PriceType};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Order database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    /// Unique identifier for the order
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Buying customer
    pub customer_id: Option<i64>,
    /// Issuing-party profile, if any
    pub responsible_id: Option<i64>,
    /// Source budget when the order came from a promotion
    pub budget_id: Option<i64>,
    /// Which product price column the items were priced from
    pub price_type: PriceType,
    /// Free-form note
    pub observation: Option<String>,
    /// Sum of all item amounts
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub total_amount: Decimal,
    /// Fulfillment status
    pub status: OrderStatus,
    /// Whether an admin has opened the order
    pub is_read: bool,
    /// When the order was created
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Order and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Line items, removed together with the order
    #[sea_orm(has_many = "super::order_item::Entity")]
    Items,
    /// Buying customer
    #[sea_orm(
        belongs_to = "super::customer::Entity",
        from = "Column::CustomerId",
        to = "super::customer::Column::Id",
        on_update = "Cascade",
        on_delete = "SetNull"
    )]
    Customer,
    /// Budget this order was promoted from
    #[sea_orm(
        belongs_to = "super::budget::Entity",
        from = "Column::BudgetId",
        to = "super::budget::Column::Id",
        on_update = "Cascade",
        on_delete = "SetNull"
    )]
    Budget,
}

impl Related<super::order_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Items.def()
    }
}

impl Related<super::customer::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Customer.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
