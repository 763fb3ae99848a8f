//! Customer and responsible business logic.
//!
//! Customers are who budgets and orders are issued to; responsibles are the issuing-party
//! profiles printed on generated documents. Email uniqueness is enforced by the datastore.

use crate::{
    entities::{Customer, Responsible, customer, responsible},
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{QueryOrder, Set, prelude::*};
use serde::{Deserialize, Serialize};

/// Fields of a new customer
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCustomer {
    /// Display name
    pub name: String,
    /// Contact email, stored lowercased
    pub email: String,
    /// Contact phone
    pub phone: Option<String>,
    /// Company name
    pub company: Option<String>,
}

/// Fields of a new responsible
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewResponsible {
    /// Name printed on documents
    pub name: String,
    /// Contact email
    pub email: Option<String>,
    /// Contact phone
    pub phone: Option<String>,
    /// Job title shown under the signature
    pub position: Option<String>,
}

fn ensure_named(name: &str, what: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::Validation {
            message: format!("{what} name cannot be empty"),
        });
    }
    Ok(())
}

/// Creates a customer. The email is stored lowercased.
pub async fn create_customer<C>(db: &C, data: NewCustomer) -> Result<customer::Model>
where
    C: ConnectionTrait,
{
    ensure_named(&data.name, "Customer")?;
    let email = data.email.trim().to_lowercase();
    if !email.contains('@') {
        return Err(Error::Validation {
            message: format!("Invalid customer email: {email:?}"),
        });
    }

    customer::ActiveModel {
        name: Set(data.name.trim().to_string()),
        email: Set(email),
        phone: Set(data.phone),
        company: Set(data.company),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Retrieves a customer by id.
pub async fn get_customer<C>(db: &C, customer_id: i64) -> Result<Option<customer::Model>>
where
    C: ConnectionTrait,
{
    Customer::find_by_id(customer_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Retrieves a customer by email, case-insensitively.
pub async fn get_customer_by_email<C>(db: &C, email: &str) -> Result<Option<customer::Model>>
where
    C: ConnectionTrait,
{
    Customer::find()
        .filter(customer::Column::Email.eq(email.trim().to_lowercase()))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Lists customers ordered by name.
pub async fn list_customers<C>(db: &C) -> Result<Vec<customer::Model>>
where
    C: ConnectionTrait,
{
    Customer::find()
        .order_by_asc(customer::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Creates a responsible profile.
pub async fn create_responsible<C>(db: &C, data: NewResponsible) -> Result<responsible::Model>
where
    C: ConnectionTrait,
{
    ensure_named(&data.name, "Responsible")?;

    responsible::ActiveModel {
        name: Set(data.name.trim().to_string()),
        email: Set(data.email),
        phone: Set(data.phone),
        position: Set(data.position),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Retrieves a responsible profile by id.
pub async fn get_responsible<C>(db: &C, responsible_id: i64) -> Result<Option<responsible::Model>>
where
    C: ConnectionTrait,
{
    Responsible::find_by_id(responsible_id)
        .one(db)
        .await
        .map_err(Into::into)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_create_and_find_customer() -> Result<()> {
        let db = setup_test_db().await?;
        let created = create_customer(
            &db,
            NewCustomer {
                name: " Luis Gómez ".to_string(),
                email: "Luis@Example.com".to_string(),
                phone: Some("+54 11 5555-0000".to_string()),
                company: Some("Gómez SRL".to_string()),
            },
        )
        .await?;

        assert_eq!(created.name, "Luis Gómez");
        assert_eq!(created.email, "luis@example.com");

        let found = get_customer_by_email(&db, "LUIS@example.com").await?.unwrap();
        assert_eq!(found, created);
        assert_eq!(get_customer(&db, created.id).await?.unwrap(), created);
        assert!(get_customer(&db, 999).await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_duplicate_email_is_unique_violation() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_customer(&db, "Ana").await?;

        let result = create_test_customer(&db, "Ana").await;
        assert!(result.unwrap_err().is_unique_violation());
        assert_eq!(list_customers(&db).await?.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_customer_validation() -> Result<()> {
        let db = sea_orm::MockDatabase::new(sea_orm::DatabaseBackend::Sqlite).into_connection();
        let result = create_customer(
            &db,
            NewCustomer {
                name: "Ana".to_string(),
                email: "ana".to_string(),
                phone: None,
                company: None,
            },
        )
        .await;
        assert!(matches!(result, Err(Error::Validation { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_create_responsible() -> Result<()> {
        let db = setup_test_db().await?;
        let created = create_responsible(
            &db,
            NewResponsible {
                name: "Marta Ruiz".to_string(),
                email: Some("ventas@example.com".to_string()),
                phone: None,
                position: Some("Ventas".to_string()),
            },
        )
        .await?;

        let found = get_responsible(&db, created.id).await?.unwrap();
        assert_eq!(found.position.as_deref(), Some("Ventas"));
        Ok(())
    }
}
