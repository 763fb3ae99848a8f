//! String-backed enums shared by several tables.
//!
//! Stored as text so the database stays readable from any SQL client.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse folder-like classification of a stored image
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum ImageTag {
    /// Category artwork
    #[sea_orm(string_value = "Categorías")]
    Categories,
    /// Product photos
    #[sea_orm(string_value = "Productos")]
    Products,
    /// Site page content
    #[sea_orm(string_value = "Páginas")]
    Pages,
    /// Anything else
    #[sea_orm(string_value = "Otros")]
    Other,
}

/// Which product price column is authoritative for a quotation or order
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum PriceType {
    /// Per-unit retail price
    #[sea_orm(string_value = "retail")]
    Retail,
    /// Bulk wholesale price
    #[sea_orm(string_value = "wholesale")]
    Wholesale,
}

/// Lifecycle of a budget (quotation)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum BudgetStatus {
    /// Awaiting a decision
    #[sea_orm(string_value = "pending")]
    Pending,
    /// Accepted by the customer
    #[sea_orm(string_value = "approved")]
    Approved,
    /// Declined
    #[sea_orm(string_value = "rejected")]
    Rejected,
    /// Past its validity date
    #[sea_orm(string_value = "expired")]
    Expired,
}

/// Lifecycle of a confirmed order
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum OrderStatus {
    /// Received, not started
    #[sea_orm(string_value = "pending")]
    Pending,
    /// Being prepared
    #[sea_orm(string_value = "processing")]
    Processing,
    /// Delivered
    #[sea_orm(string_value = "completed")]
    Completed,
    /// Called off
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

impl fmt::Display for BudgetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_value())
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_value())
    }
}

impl fmt::Display for PriceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_value())
    }
}
