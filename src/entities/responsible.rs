//! Responsible entity - Issuing-party profile printed on generated documents.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Responsible database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "responsibles")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Display name
    pub name: String,
    /// Contact email
    pub email: Option<String>,
    /// Contact phone
    pub phone: Option<String>,
    /// Job title shown under the signature
    pub position: Option<String>,
}

/// `Responsible` is only referenced, it references nothing
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
