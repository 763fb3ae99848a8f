//! Database configuration module.
//!
//! This module handles the `SQLite` connection and table creation using `SeaORM`.
//! Tables are generated from the entity definitions with `Schema::create_table_from_entity`,
//! so foreign keys (and their cascade rules) and unique indexes follow the Rust structs
//! without hand-written DDL.

use crate::entities::{
    Budget, BudgetItem, Category, Customer, Image, Order, OrderItem, Product, ProductCategory,
    ProductImage, ProductRelated, Responsible,
};
use crate::errors::Result;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, EntityTrait, Schema};
use std::path::Path;
use tracing::{debug, info, instrument};

const DEFAULT_DATABASE_URL: &str = "sqlite://data/promo_catalog.sqlite?mode=rwc";

/// Gets the database URL from the `DATABASE_URL` environment variable, or the default local
/// `SQLite` file when it is not set.
#[must_use]
pub fn get_database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string())
}

/// Opens the process-wide connection.
///
/// The returned handle is shared by reference with every repository call and dropped
/// at shutdown; nothing in the crate holds a global connection.
pub async fn create_connection() -> Result<DatabaseConnection> {
    let database_url = get_database_url();
    if let Some(dir) = sqlite_parent_dir(&database_url) {
        std::fs::create_dir_all(dir)?;
    }
    debug!("Connecting to {}", database_url);
    Database::connect(&database_url).await.map_err(Into::into)
}

/// Directory holding a file-backed `SQLite` database, if the URL names one.
fn sqlite_parent_dir(database_url: &str) -> Option<&Path> {
    let path = database_url.strip_prefix("sqlite://")?;
    let path = path.split('?').next()?;
    Path::new(path).parent().filter(|dir| !dir.as_os_str().is_empty())
}

async fn create_table<E>(db: &DatabaseConnection, schema: &Schema, entity: E) -> Result<()>
where
    E: EntityTrait,
{
    let builder = db.get_database_backend();
    let mut statement = schema.create_table_from_entity(entity);
    statement.if_not_exists();
    db.execute(builder.build(&statement)).await?;
    Ok(())
}

/// Creates all tables, referenced tables first.
#[instrument(skip(db))]
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let schema = Schema::new(db.get_database_backend());

    create_table(db, &schema, Image).await?;
    create_table(db, &schema, Category).await?;
    create_table(db, &schema, Product).await?;
    create_table(db, &schema, ProductImage).await?;
    create_table(db, &schema, ProductCategory).await?;
    create_table(db, &schema, ProductRelated).await?;
    create_table(db, &schema, Customer).await?;
    create_table(db, &schema, Responsible).await?;
    create_table(db, &schema, Budget).await?;
    create_table(db, &schema, BudgetItem).await?;
    create_table(db, &schema, Order).await?;
    create_table(db, &schema, OrderItem).await?;

    info!("Database tables ensured");
    Ok(())
}
