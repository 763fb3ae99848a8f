//! Customer entity - The party a budget or order is issued to.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Customer database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "customers")]
pub struct Model {
    /// Unique identifier for the customer
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Contact name
    pub name: String,
    /// Contact email, unique across customers
    #[sea_orm(unique)]
    pub email: String,
    /// Contact phone
    pub phone: Option<String>,
    /// Company the customer buys for
    pub company: Option<String>,
    /// When the customer was registered
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Customer and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Budgets issued to this customer
    #[sea_orm(has_many = "super::budget::Entity")]
    Budgets,
    /// Orders placed by this customer
    #[sea_orm(has_many = "super::order::Entity")]
    Orders,
}

impl Related<super::budget::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Budgets.def()
    }
}

impl Related<super::order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Orders.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
