//! Category business logic - CRUD plus reads that resolve the category image.
//!
//! Slug uniqueness and image existence are not pre-checked here; the datastore's unique
//! index and foreign key reject bad writes and the error is returned unchanged.

use super::slug::is_valid_slug;
use crate::{
    entities::{Category, Image, category, image},
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{ActiveValue::Unchanged, QueryOrder, Set, prelude::*};
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// A category with its image resolved
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryView {
    /// The category row
    pub category: category::Model,
    /// `None` only if the referenced image row is missing
    pub image: Option<image::Model>,
}

impl From<(category::Model, Option<image::Model>)> for CategoryView {
    fn from((category, image): (category::Model, Option<image::Model>)) -> Self {
        Self { category, image }
    }
}

/// Fields of a new category
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCategory {
    /// Display name
    pub name: String,
    /// URL-safe handle, unique
    pub slug: String,
    /// Long description
    pub description: Option<String>,
    /// Highlighted on the home page
    pub featured: bool,
    /// Existing image to use as artwork
    pub image_id: i64,
}

/// Partial category update; `None` leaves the column untouched
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryPatch {
    /// New display name
    pub name: Option<String>,
    /// New slug, unique
    pub slug: Option<String>,
    /// New long description; `Some(None)` clears it
    pub description: Option<Option<String>>,
    /// Feature or unfeature on the home page
    pub featured: Option<bool>,
    /// New artwork image
    pub image_id: Option<i64>,
}

fn validate_name_and_slug(name: &str, slug: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::Validation {
            message: "Category name cannot be empty".to_string(),
        });
    }
    if !is_valid_slug(slug) {
        return Err(Error::Validation {
            message: format!("Invalid category slug: {slug:?}"),
        });
    }
    Ok(())
}

/// Retrieves a category and its image by id.
pub async fn get_category<C>(db: &C, category_id: i64) -> Result<Option<CategoryView>>
where
    C: ConnectionTrait,
{
    let found = Category::find_by_id(category_id)
        .find_also_related(Image)
        .one(db)
        .await?;
    Ok(found.map(CategoryView::from))
}

/// Retrieves a category and its image by slug.
pub async fn get_category_by_slug<C>(db: &C, slug: &str) -> Result<Option<CategoryView>>
where
    C: ConnectionTrait,
{
    let found = Category::find()
        .filter(category::Column::Slug.eq(slug))
        .find_also_related(Image)
        .one(db)
        .await?;
    Ok(found.map(CategoryView::from))
}

/// Lists all categories with their images, ordered by name.
pub async fn list_categories<C>(db: &C) -> Result<Vec<CategoryView>>
where
    C: ConnectionTrait,
{
    let rows = Category::find()
        .order_by_asc(category::Column::Name)
        .find_also_related(Image)
        .all(db)
        .await?;
    Ok(rows.into_iter().map(CategoryView::from).collect())
}

/// Lists featured categories with their images, ordered by name.
pub async fn list_featured_categories<C>(db: &C) -> Result<Vec<CategoryView>>
where
    C: ConnectionTrait,
{
    let rows = Category::find()
        .filter(category::Column::Featured.eq(true))
        .order_by_asc(category::Column::Name)
        .find_also_related(Image)
        .all(db)
        .await?;
    Ok(rows.into_iter().map(CategoryView::from).collect())
}

/// Creates a category.
#[instrument(skip(db, data), fields(slug = %data.slug))]
pub async fn create_category<C>(db: &C, data: NewCategory) -> Result<CategoryView>
where
    C: ConnectionTrait,
{
    validate_name_and_slug(&data.name, &data.slug)?;

    let category = category::ActiveModel {
        name: Set(data.name.trim().to_string()),
        slug: Set(data.slug),
        description: Set(data.description),
        featured: Set(data.featured),
        image_id: Set(data.image_id),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    get_category(db, category.id)
        .await?
        .ok_or(Error::CategoryNotFound { id: category.id })
}

/// Updates the supplied columns of a category.
#[instrument(skip(db, patch))]
pub async fn update_category<C>(
    db: &C,
    category_id: i64,
    patch: CategoryPatch,
) -> Result<CategoryView>
where
    C: ConnectionTrait,
{
    let existing = Category::find_by_id(category_id)
        .one(db)
        .await?
        .ok_or(Error::CategoryNotFound { id: category_id })?;

    validate_name_and_slug(
        patch.name.as_deref().unwrap_or(&existing.name),
        patch.slug.as_deref().unwrap_or(&existing.slug),
    )?;

    let mut category = category::ActiveModel {
        id: Unchanged(category_id),
        ..Default::default()
    };
    if let Some(name) = patch.name {
        category.name = Set(name.trim().to_string());
    }
    if let Some(slug) = patch.slug {
        category.slug = Set(slug);
    }
    if let Some(description) = patch.description {
        category.description = Set(description);
    }
    if let Some(featured) = patch.featured {
        category.featured = Set(featured);
    }
    if let Some(image_id) = patch.image_id {
        category.image_id = Set(image_id);
    }

    if category.is_changed() {
        category.update(db).await?;
    }

    get_category(db, category_id)
        .await?
        .ok_or(Error::CategoryNotFound { id: category_id })
}

/// Deletes a category. Product memberships go with it.
pub async fn delete_category<C>(db: &C, category_id: i64) -> Result<()>
where
    C: ConnectionTrait,
{
    let result = Category::delete_by_id(category_id).exec(db).await?;
    if result.rows_affected == 0 {
        return Err(Error::CategoryNotFound { id: category_id });
    }
    Ok(())
}
