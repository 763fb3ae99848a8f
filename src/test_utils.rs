//! Shared test utilities.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test entities with sensible defaults.

use crate::{
    core::{
        budget::{self, BudgetAggregate, BudgetDraft},
        category::{self, NewCategory},
        customer::{self, NewCustomer},
        image::{self, NewImage},
        pricing::{LineItemInput, quote_line, summarize},
        product::{self, NewProduct},
        slug::slugify,
    },
    config::settings::Settings,
    entities::{self, ImageTag, PriceType},
    errors::Result,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::DatabaseConnection;
use tracing_subscriber::EnvFilter;

/// Installs a tracing subscriber that writes through the test harness.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .with_test_writer()
        .try_init();
}

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    init_test_tracing();
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Registers a product photo with a URL derived from `name`.
pub async fn create_test_image(
    db: &DatabaseConnection,
    name: &str,
) -> Result<entities::image::Model> {
    image::create_image(
        db,
        NewImage {
            url: format!("https://cdn.example.com/productos/{name}.jpg"),
            alt: Some(name.to_string()),
            tag: ImageTag::Products,
            observation: None,
        },
    )
    .await
}

/// Creates a category with its own image.
///
/// # Defaults
/// * slug: derived from `name`
/// * featured: false
pub async fn create_test_category(
    db: &DatabaseConnection,
    name: &str,
) -> Result<entities::category::Model> {
    let artwork = image::create_image(
        db,
        NewImage {
            url: format!("https://cdn.example.com/categorias/{}.jpg", slugify(name)),
            alt: None,
            tag: ImageTag::Categories,
            observation: None,
        },
    )
    .await?;

    category::create_category(
        db,
        NewCategory {
            name: name.to_string(),
            slug: slugify(name),
            description: None,
            featured: false,
            image_id: artwork.id,
        },
    )
    .await
    .map(|view| view.category)
}

/// Builds a product draft with no associations.
///
/// # Defaults
/// * slug: derived from `name`
/// * `retail_price`: 10.00
/// * `wholesale_price`: 8.00
/// * stock: 100
#[must_use]
pub fn test_product_draft(name: &str) -> NewProduct {
    NewProduct {
        name: name.to_string(),
        slug: slugify(name),
        description: None,
        sku: None,
        stock: 100,
        is_active: true,
        is_featured: false,
        retail_price: dec!(10.00),
        wholesale_price: dec!(8.00),
        image_ids: None,
        category_ids: None,
        related_ids: None,
    }
}

/// Creates a product with default prices and returns its base row.
pub async fn create_test_product(
    db: &DatabaseConnection,
    name: &str,
) -> Result<entities::product::Model> {
    product::create_product(db, test_product_draft(name))
        .await
        .map(|aggregate| aggregate.product)
}

/// Creates a product with custom prices and returns its base row.
pub async fn create_priced_product(
    db: &DatabaseConnection,
    name: &str,
    retail_price: Decimal,
    wholesale_price: Decimal,
) -> Result<entities::product::Model> {
    let draft = NewProduct {
        retail_price,
        wholesale_price,
        ..test_product_draft(name)
    };
    product::create_product(db, draft)
        .await
        .map(|aggregate| aggregate.product)
}

/// Creates a customer with an email derived from `name`.
pub async fn create_test_customer(
    db: &DatabaseConnection,
    name: &str,
) -> Result<entities::customer::Model> {
    customer::create_customer(
        db,
        NewCustomer {
            name: name.to_string(),
            email: format!("{}@example.com", slugify(name)),
            phone: None,
            company: None,
        },
    )
    .await
}

/// Builds a consistent budget draft from `(product, quantity)` pairs.
#[must_use]
pub fn test_budget_draft(
    customer_id: Option<i64>,
    price_type: PriceType,
    lines: &[(&entities::product::Model, i32)],
) -> BudgetDraft {
    let items: Vec<LineItemInput> = lines
        .iter()
        .map(|(product, quantity)| quote_line(product, *quantity, price_type))
        .collect();
    BudgetDraft {
        customer_id,
        responsible_id: None,
        price_type,
        observation: None,
        total_amount: summarize(&items),
        expires_at: None,
        items,
    }
}

/// Sets up a database with one customer and two products (10.00/8.00 and 25.00/20.00).
pub async fn setup_with_products() -> Result<(
    DatabaseConnection,
    entities::customer::Model,
    entities::product::Model,
    entities::product::Model,
)> {
    let db = setup_test_db().await?;
    let customer = create_test_customer(&db, "Ana Pérez").await?;
    let mug = create_priced_product(&db, "Taza", dec!(10.00), dec!(8.00)).await?;
    let cap = create_priced_product(&db, "Gorra", dec!(25.00), dec!(20.00)).await?;
    Ok((db, customer, mug, cap))
}

/// Creates a pending budget for the customer with 2 mugs and 1 cap.
pub async fn create_test_budget(
    db: &DatabaseConnection,
    customer: &entities::customer::Model,
    mug: &entities::product::Model,
    cap: &entities::product::Model,
) -> Result<BudgetAggregate> {
    let draft = test_budget_draft(Some(customer.id), PriceType::Retail, &[(mug, 2), (cap, 1)]);
    budget::create_budget(db, &Settings::default(), draft).await
}
