//! Product business logic - CRUD and aggregate assembly.
//!
//! A product aggregate is the base row plus its gallery, its categories (each with its
//! image) and its related product ids. Writes touch the base row first and then hand every
//! supplied association set to the relation store. An association field left as `None`
//! is not touched; `Some(vec![])` clears it.

use super::{
    category::CategoryView,
    pricing::ensure_non_negative,
    relations::{self, AssociationKind},
    slug::is_valid_slug,
};
use crate::{
    entities::{
        Category, Image, Product, ProductCategory, ProductImage, category, image, product,
        product_category, product_image,
    },
    errors::{Error, Result},
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{ActiveValue::Unchanged, QueryOrder, QuerySelect, Set, prelude::*};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// One image of a product gallery
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GalleryImage {
    /// The image row
    pub image: image::Model,
    /// Position within the gallery
    pub order_index: i32,
    /// Whether this is the default image
    pub is_primary: bool,
}

/// A product with its associations resolved
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductAggregate {
    /// Base row
    pub product: product::Model,
    /// Gallery, primary first then by position
    pub images: Vec<GalleryImage>,
    /// Categories ordered by name, each with its image
    pub categories: Vec<CategoryView>,
    /// Related product ids, ascending
    pub related_ids: Vec<i64>,
}

impl ProductAggregate {
    /// The primary image, if the product has any image.
    #[must_use]
    pub fn primary_image(&self) -> Option<&image::Model> {
        self.images.first().map(|entry| &entry.image)
    }
}

/// Fields of a new product
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProduct {
    /// Display name
    pub name: String,
    /// URL-safe handle, unique
    pub slug: String,
    /// Long description
    pub description: Option<String>,
    /// Business stock code, unique when present
    pub sku: Option<String>,
    /// Units on hand
    pub stock: i32,
    /// Visible on the storefront
    pub is_active: bool,
    /// Highlighted on the home page
    pub is_featured: bool,
    /// Retail unit price
    pub retail_price: Decimal,
    /// Wholesale unit price
    pub wholesale_price: Decimal,
    /// Gallery in display order; the first one becomes primary
    pub image_ids: Option<Vec<i64>>,
    /// Categories the product belongs to
    pub category_ids: Option<Vec<i64>>,
    /// Related products
    pub related_ids: Option<Vec<i64>>,
}

/// Partial product update; `None` leaves the column or association set untouched
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductPatch {
    /// New display name
    pub name: Option<String>,
    /// New slug, unique
    pub slug: Option<String>,
    /// New long description; `Some(None)` clears it
    pub description: Option<Option<String>>,
    /// New sku; `Some(None)` clears it
    pub sku: Option<Option<String>>,
    /// New stock count
    pub stock: Option<i32>,
    /// Show or hide on the storefront
    pub is_active: Option<bool>,
    /// Feature or unfeature on the home page
    pub is_featured: Option<bool>,
    /// New retail unit price
    pub retail_price: Option<Decimal>,
    /// New wholesale unit price
    pub wholesale_price: Option<Decimal>,
    /// Annotation recorded with a price change
    pub price_updated: Option<String>,
    /// Replacement gallery, in display order; the first becomes primary
    pub image_ids: Option<Vec<i64>>,
    /// Replacement category set
    pub category_ids: Option<Vec<i64>>,
    /// Replacement related-product set
    pub related_ids: Option<Vec<i64>>,
}

impl ProductPatch {
    fn touches_price(&self) -> bool {
        self.retail_price.is_some() || self.wholesale_price.is_some()
    }
}

/// Filters for [`list_products`]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ProductFilter {
    /// Only products visible on the storefront
    pub only_active: bool,
    /// Only highlighted products
    pub only_featured: bool,
    /// Only members of this category
    pub category_id: Option<i64>,
}

fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::Validation {
            message: "Product name cannot be empty".to_string(),
        });
    }
    Ok(())
}

fn validate_slug(slug: &str) -> Result<()> {
    if !is_valid_slug(slug) {
        return Err(Error::Validation {
            message: format!("Invalid product slug: {slug:?}"),
        });
    }
    Ok(())
}

fn validate_stock(stock: i32) -> Result<()> {
    if stock < 0 {
        return Err(Error::Validation {
            message: format!("Stock cannot be negative, got {stock}"),
        });
    }
    Ok(())
}

fn normalize_sku(sku: Option<String>) -> Option<String> {
    sku.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

/// Loads the three association sets for an already fetched base row.
async fn assemble<C>(db: &C, product: product::Model) -> Result<ProductAggregate>
where
    C: ConnectionTrait,
{
    let images = ProductImage::find()
        .filter(product_image::Column::ProductId.eq(product.id))
        .order_by_desc(product_image::Column::IsPrimary)
        .order_by_asc(product_image::Column::OrderIndex)
        .find_also_related(Image)
        .all(db)
        .await?
        .into_iter()
        .filter_map(|(link, image)| {
            image.map(|image| GalleryImage {
                image,
                order_index: link.order_index,
                is_primary: link.is_primary,
            })
        })
        .collect();

    let categories = Category::find()
        .inner_join(ProductCategory)
        .filter(product_category::Column::ProductId.eq(product.id))
        .order_by_asc(category::Column::Name)
        .find_also_related(Image)
        .all(db)
        .await?
        .into_iter()
        .map(CategoryView::from)
        .collect();

    let related_ids = relations::related_ids(db, product.id).await?;

    Ok(ProductAggregate {
        product,
        images,
        categories,
        related_ids,
    })
}

/// Retrieves a product aggregate by id, `None` if the product does not exist.
pub async fn get_product<C>(db: &C, product_id: i64) -> Result<Option<ProductAggregate>>
where
    C: ConnectionTrait,
{
    match Product::find_by_id(product_id).one(db).await? {
        Some(product) => assemble(db, product).await.map(Some),
        None => Ok(None),
    }
}

/// Retrieves a product aggregate by slug.
pub async fn get_product_by_slug<C>(db: &C, slug: &str) -> Result<Option<ProductAggregate>>
where
    C: ConnectionTrait,
{
    let found = Product::find()
        .filter(product::Column::Slug.eq(slug))
        .one(db)
        .await?;
    match found {
        Some(product) => assemble(db, product).await.map(Some),
        None => Ok(None),
    }
}

/// Retrieves a product aggregate by sku.
pub async fn get_product_by_sku<C>(db: &C, sku: &str) -> Result<Option<ProductAggregate>>
where
    C: ConnectionTrait,
{
    match find_product_row_by_sku(db, sku).await? {
        Some(product) => assemble(db, product).await.map(Some),
        None => Ok(None),
    }
}

/// Base row lookup by sku, without associations.
pub async fn find_product_row_by_sku<C>(db: &C, sku: &str) -> Result<Option<product::Model>>
where
    C: ConnectionTrait,
{
    Product::find()
        .filter(product::Column::Sku.eq(sku.trim()))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Lists base rows ordered by name.
pub async fn list_products<C>(db: &C, filter: ProductFilter) -> Result<Vec<product::Model>>
where
    C: ConnectionTrait,
{
    let mut query = Product::find();
    if filter.only_active {
        query = query.filter(product::Column::IsActive.eq(true));
    }
    if filter.only_featured {
        query = query.filter(product::Column::IsFeatured.eq(true));
    }
    if let Some(category_id) = filter.category_id {
        query = query
            .inner_join(ProductCategory)
            .filter(product_category::Column::CategoryId.eq(category_id));
    }
    query
        .order_by_asc(product::Column::Name)
        .order_by_asc(product::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Returns the primary-or-first image of a product.
pub async fn get_primary_image<C>(db: &C, product_id: i64) -> Result<Option<image::Model>>
where
    C: ConnectionTrait,
{
    let first = ProductImage::find()
        .filter(product_image::Column::ProductId.eq(product_id))
        .order_by_desc(product_image::Column::IsPrimary)
        .order_by_asc(product_image::Column::OrderIndex)
        .limit(1)
        .find_also_related(Image)
        .one(db)
        .await?;
    Ok(first.and_then(|(_, image)| image))
}

/// Counts all products.
pub async fn count_products<C>(db: &C) -> Result<u64>
where
    C: ConnectionTrait,
{
    Product::find().count(db).await.map_err(Into::into)
}

/// Creates a product and its supplied association sets, then reads the aggregate back.
///
/// # Errors
/// Returns an error if:
/// - The name is empty, the slug is not URL-safe, stock or a price is negative
/// - The slug or sku is already taken (datastore unique violation)
/// - An associated image, category or related product does not exist
#[instrument(skip(db, data), fields(slug = %data.slug))]
pub async fn create_product<C>(db: &C, data: NewProduct) -> Result<ProductAggregate>
where
    C: ConnectionTrait,
{
    validate_name(&data.name)?;
    validate_slug(&data.slug)?;
    validate_stock(data.stock)?;
    ensure_non_negative(data.retail_price)?;
    ensure_non_negative(data.wholesale_price)?;

    let now = Utc::now();
    let product = product::ActiveModel {
        name: Set(data.name.trim().to_string()),
        slug: Set(data.slug),
        description: Set(data.description),
        sku: Set(normalize_sku(data.sku)),
        stock: Set(data.stock),
        is_active: Set(data.is_active),
        is_featured: Set(data.is_featured),
        retail_price: Set(data.retail_price),
        wholesale_price: Set(data.wholesale_price),
        price_updated_at: Set(None),
        price_updated: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await?;
    debug!("Inserted product {}", product.id);

    if let Some(image_ids) = &data.image_ids {
        relations::replace_associations(db, product.id, image_ids, AssociationKind::Images).await?;
    }
    if let Some(category_ids) = &data.category_ids {
        relations::replace_associations(db, product.id, category_ids, AssociationKind::Categories)
            .await?;
    }
    if let Some(related_ids) = &data.related_ids {
        relations::replace_associations(db, product.id, related_ids, AssociationKind::Related)
            .await?;
    }

    get_product(db, product.id)
        .await?
        .ok_or(Error::ProductNotFound { id: product.id })
}

/// Updates the supplied columns and association sets of a product.
///
/// Supplying either price stamps `price_updated_at` with the current time.
///
/// # Errors
/// Returns [`Error::ProductNotFound`] for an unknown id, a validation error for bad input,
/// and datastore errors unchanged.
#[instrument(skip(db, patch))]
pub async fn update_product<C>(
    db: &C,
    product_id: i64,
    patch: ProductPatch,
) -> Result<ProductAggregate>
where
    C: ConnectionTrait,
{
    if let Some(name) = &patch.name {
        validate_name(name)?;
    }
    if let Some(slug) = &patch.slug {
        validate_slug(slug)?;
    }
    if let Some(stock) = patch.stock {
        validate_stock(stock)?;
    }
    if let Some(price) = patch.retail_price {
        ensure_non_negative(price)?;
    }
    if let Some(price) = patch.wholesale_price {
        ensure_non_negative(price)?;
    }

    if Product::find_by_id(product_id).one(db).await?.is_none() {
        return Err(Error::ProductNotFound { id: product_id });
    }

    let now = Utc::now();
    let touches_price = patch.touches_price();
    let mut product = product::ActiveModel {
        id: Unchanged(product_id),
        updated_at: Set(now),
        ..Default::default()
    };
    if let Some(name) = patch.name {
        product.name = Set(name.trim().to_string());
    }
    if let Some(slug) = patch.slug {
        product.slug = Set(slug);
    }
    if let Some(description) = patch.description {
        product.description = Set(description);
    }
    if let Some(sku) = patch.sku {
        product.sku = Set(normalize_sku(sku));
    }
    if let Some(stock) = patch.stock {
        product.stock = Set(stock);
    }
    if let Some(is_active) = patch.is_active {
        product.is_active = Set(is_active);
    }
    if let Some(is_featured) = patch.is_featured {
        product.is_featured = Set(is_featured);
    }
    if let Some(price) = patch.retail_price {
        product.retail_price = Set(price);
    }
    if let Some(price) = patch.wholesale_price {
        product.wholesale_price = Set(price);
    }
    if touches_price {
        product.price_updated_at = Set(Some(now));
        if let Some(note) = patch.price_updated {
            product.price_updated = Set(Some(note));
        }
    }
    product.update(db).await?;

    if let Some(image_ids) = &patch.image_ids {
        relations::replace_associations(db, product_id, image_ids, AssociationKind::Images).await?;
    }
    if let Some(category_ids) = &patch.category_ids {
        relations::replace_associations(db, product_id, category_ids, AssociationKind::Categories)
            .await?;
    }
    if let Some(related_ids) = &patch.related_ids {
        relations::replace_associations(db, product_id, related_ids, AssociationKind::Related)
            .await?;
    }

    get_product(db, product_id)
        .await?
        .ok_or(Error::ProductNotFound { id: product_id })
}

/// Deletes a product. Association rows are removed by the datastore's cascade.
pub async fn delete_product<C>(db: &C, product_id: i64) -> Result<()>
where
    C: ConnectionTrait,
{
    let result = Product::delete_by_id(product_id).exec(db).await?;
    if result.rows_affected == 0 {
        return Err(Error::ProductNotFound { id: product_id });
    }
    debug!("Deleted product {}", product_id);
    Ok(())
}
