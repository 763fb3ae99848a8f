//! Image business logic - Registers stored assets and reads them back.
//!
//! Uploading is done elsewhere; this module only records the durable URL it was given.
//! Deleting an image removes it from every product gallery (cascade) but fails while a
//! category still uses it.

use crate::{
    entities::{Image, ImageTag, image},
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{ActiveValue::Unchanged, QueryOrder, Set, prelude::*};
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// Fields of a new image
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewImage {
    /// Durable URL from object storage
    pub url: String,
    /// Alternative text
    pub alt: Option<String>,
    /// Folder-like classification
    pub tag: ImageTag,
    /// Free-form note
    pub observation: Option<String>,
}

/// Partial image update; `None` leaves the column untouched
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImagePatch {
    /// New storage URL
    pub url: Option<String>,
    /// New alternative text; `Some(None)` clears it
    pub alt: Option<Option<String>>,
    /// New tag
    pub tag: Option<ImageTag>,
    /// New free-form note; `Some(None)` clears it
    pub observation: Option<Option<String>>,
}

fn ensure_url(url: &str) -> Result<()> {
    if url.trim().is_empty() {
        return Err(Error::Validation {
            message: "Image URL cannot be empty".to_string(),
        });
    }
    Ok(())
}

/// Stores a new image descriptor.
pub async fn create_image<C>(db: &C, data: NewImage) -> Result<image::Model>
where
    C: ConnectionTrait,
{
    ensure_url(&data.url)?;

    let image = image::ActiveModel {
        url: Set(data.url.trim().to_string()),
        alt: Set(data.alt),
        tag: Set(data.tag),
        observation: Set(data.observation),
        created_at: Set(Utc::now()),
        ..Default::default()
    };
    image.insert(db).await.map_err(Into::into)
}

/// Retrieves an image by id.
pub async fn get_image<C>(db: &C, image_id: i64) -> Result<Option<image::Model>>
where
    C: ConnectionTrait,
{
    Image::find_by_id(image_id).one(db).await.map_err(Into::into)
}

/// Lists images, newest first, optionally restricted to one tag.
pub async fn list_images<C>(db: &C, tag: Option<ImageTag>) -> Result<Vec<image::Model>>
where
    C: ConnectionTrait,
{
    let mut query = Image::find();
    if let Some(tag) = tag {
        query = query.filter(image::Column::Tag.eq(tag));
    }
    query
        .order_by_desc(image::Column::CreatedAt)
        .order_by_desc(image::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Updates the supplied columns of an image.
#[instrument(skip(db, patch))]
pub async fn update_image<C>(db: &C, image_id: i64, patch: ImagePatch) -> Result<image::Model>
where
    C: ConnectionTrait,
{
    if get_image(db, image_id).await?.is_none() {
        return Err(Error::ImageNotFound { id: image_id });
    }

    let mut image = image::ActiveModel {
        id: Unchanged(image_id),
        ..Default::default()
    };
    if let Some(url) = patch.url {
        ensure_url(&url)?;
        image.url = Set(url.trim().to_string());
    }
    if let Some(alt) = patch.alt {
        image.alt = Set(alt);
    }
    if let Some(tag) = patch.tag {
        image.tag = Set(tag);
    }
    if let Some(observation) = patch.observation {
        image.observation = Set(observation);
    }

    if !image.is_changed() {
        return get_image(db, image_id)
            .await?
            .ok_or(Error::ImageNotFound { id: image_id });
    }
    image.update(db).await.map_err(Into::into)
}

/// Deletes an image.
///
/// # Errors
/// Returns [`Error::ImageNotFound`] for an unknown id, and the datastore's foreign-key
/// error while a category still references the image.
pub async fn delete_image<C>(db: &C, image_id: i64) -> Result<()>
where
    C: ConnectionTrait,
{
    let result = Image::delete_by_id(image_id).exec(db).await?;
    if result.rows_affected == 0 {
        return Err(Error::ImageNotFound { id: image_id });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_create_and_list_by_tag() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_image(&db, "lapicera").await?;
        create_test_category(&db, "Escritura").await?;

        let products = list_images(&db, Some(ImageTag::Products)).await?;
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].url, "https://cdn.example.com/productos/lapicera.jpg");

        let categories = list_images(&db, Some(ImageTag::Categories)).await?;
        assert_eq!(categories.len(), 1);

        assert_eq!(list_images(&db, None).await?.len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_update_image_partial() -> Result<()> {
        let db = setup_test_db().await?;
        let image = create_test_image(&db, "lapicera").await?;

        let updated = update_image(
            &db,
            image.id,
            ImagePatch {
                tag: Some(ImageTag::Other),
                ..Default::default()
            },
        )
        .await?;

        assert_eq!(updated.tag, ImageTag::Other);
        assert_eq!(updated.url, image.url);
        assert_eq!(updated.alt, image.alt);
        Ok(())
    }

    #[tokio::test]
    async fn test_create_image_rejects_empty_url() -> Result<()> {
        let db = sea_orm::MockDatabase::new(sea_orm::DatabaseBackend::Sqlite).into_connection();
        let result = create_image(
            &db,
            NewImage {
                url: "  ".to_string(),
                alt: None,
                tag: ImageTag::Pages,
                observation: None,
            },
        )
        .await;
        assert!(matches!(result, Err(Error::Validation { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_image_in_use_by_category_fails() -> Result<()> {
        let db = setup_test_db().await?;
        let category = create_test_category(&db, "Escritura").await?;

        let result = delete_image(&db, category.image_id).await;
        assert!(result.unwrap_err().is_foreign_key_violation());
        assert!(get_image(&db, category.image_id).await?.is_some());
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_unknown_image() -> Result<()> {
        let db = setup_test_db().await?;
        let result = delete_image(&db, 42).await;
        assert!(matches!(result, Err(Error::ImageNotFound { id: 42 })));
        Ok(())
    }
}
