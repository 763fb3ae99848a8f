//! Relation store - Rewrites a product's many-to-many association sets.
//!
//! Every rewrite deletes all rows of one kind for the owner and then inserts one row per
//! target id, in input order. Nothing is diffed. The functions are generic over
//! [`ConnectionTrait`]: given a plain connection the delete and the inserts are separate
//! statements and a failure in between leaves the set empty or partial; given a
//! [`sea_orm::DatabaseTransaction`] (or through [`replace_associations_atomic`]) the whole
//! rewrite commits or rolls back as one unit. Callers do not change either way.

use crate::{
    entities::{ProductCategory, ProductImage, ProductRelated, product_category, product_image, product_related},
    errors::Result,
};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use std::collections::HashSet;
use tracing::{debug, instrument};

/// Which association set of a product is being rewritten
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AssociationKind {
    /// Ordered gallery; the first image becomes primary
    Images,
    /// Unordered category membership
    Categories,
    /// Unordered related products; the owner itself is dropped
    Related,
}

/// Drops repeated ids (keeping the first occurrence) and, for related products, the owner.
fn normalize_targets(owner_id: i64, target_ids: &[i64], kind: AssociationKind) -> Vec<i64> {
    let mut seen = HashSet::with_capacity(target_ids.len());
    target_ids
        .iter()
        .copied()
        .filter(|id| !(kind == AssociationKind::Related && *id == owner_id))
        .filter(|id| seen.insert(*id))
        .collect()
}

/// Makes the owner's association set of `kind` equal to `target_ids`.
///
/// For images, row `i` gets `order_index = i` and only row 0 is primary. An empty list
/// clears the set. Datastore errors are returned as-is, without retry.
///
/// Returns the number of rows now stored.
#[instrument(skip(db, target_ids), fields(count = target_ids.len()))]
pub async fn replace_associations<C>(
    db: &C,
    owner_id: i64,
    target_ids: &[i64],
    kind: AssociationKind,
) -> Result<usize>
where
    C: ConnectionTrait,
{
    let targets = normalize_targets(owner_id, target_ids, kind);
    if targets.len() != target_ids.len() {
        debug!(
            "Dropped {} duplicate or self-referencing ids",
            target_ids.len() - targets.len()
        );
    }

    match kind {
        AssociationKind::Images => {
            ProductImage::delete_many()
                .filter(product_image::Column::ProductId.eq(owner_id))
                .exec(db)
                .await?;

            let rows = targets.iter().zip(0..).map(|(image_id, index)| product_image::ActiveModel {
                product_id: Set(owner_id),
                image_id: Set(*image_id),
                order_index: Set(index),
                is_primary: Set(index == 0),
            });
            if !targets.is_empty() {
                ProductImage::insert_many(rows).exec_without_returning(db).await?;
            }
        }
        AssociationKind::Categories => {
            ProductCategory::delete_many()
                .filter(product_category::Column::ProductId.eq(owner_id))
                .exec(db)
                .await?;

            let rows = targets.iter().map(|category_id| product_category::ActiveModel {
                product_id: Set(owner_id),
                category_id: Set(*category_id),
            });
            if !targets.is_empty() {
                ProductCategory::insert_many(rows).exec_without_returning(db).await?;
            }
        }
        AssociationKind::Related => {
            ProductRelated::delete_many()
                .filter(product_related::Column::ProductId.eq(owner_id))
                .exec(db)
                .await?;

            let rows = targets.iter().map(|related_id| product_related::ActiveModel {
                product_id: Set(owner_id),
                related_id: Set(*related_id),
            });
            if !targets.is_empty() {
                ProductRelated::insert_many(rows).exec_without_returning(db).await?;
            }
        }
    }

    debug!("Stored {} {:?} associations for product {}", targets.len(), kind, owner_id);
    Ok(targets.len())
}

/// Same as [`replace_associations`], wrapped in its own transaction.
pub async fn replace_associations_atomic(
    db: &DatabaseConnection,
    owner_id: i64,
    target_ids: &[i64],
    kind: AssociationKind,
) -> Result<usize> {
    let txn = db.begin().await?;
    let stored = replace_associations(&txn, owner_id, target_ids, kind).await?;
    txn.commit().await?;
    Ok(stored)
}

/// Reads the stored image association rows of a product, primary first then by position.
pub async fn image_rows<C>(db: &C, owner_id: i64) -> Result<Vec<product_image::Model>>
where
    C: ConnectionTrait,
{
    ProductImage::find()
        .filter(product_image::Column::ProductId.eq(owner_id))
        .order_by_desc(product_image::Column::IsPrimary)
        .order_by_asc(product_image::Column::OrderIndex)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Reads the related product ids of a product, ascending.
pub async fn related_ids<C>(db: &C, owner_id: i64) -> Result<Vec<i64>>
where
    C: ConnectionTrait,
{
    let rows = ProductRelated::find()
        .filter(product_related::Column::ProductId.eq(owner_id))
        .order_by_asc(product_related::Column::RelatedId)
        .all(db)
        .await?;
    Ok(rows.into_iter().map(|row| row.related_id).collect())
}

/// Reads the category ids of a product, ascending.
pub async fn category_ids<C>(db: &C, owner_id: i64) -> Result<Vec<i64>>
where
    C: ConnectionTrait,
{
    let rows = ProductCategory::find()
        .filter(product_category::Column::ProductId.eq(owner_id))
        .order_by_asc(product_category::Column::CategoryId)
        .all(db)
        .await?;
    Ok(rows.into_iter().map(|row| row.category_id).collect())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;

    #[test]
    fn test_normalize_targets() {
        assert_eq!(
            normalize_targets(1, &[3, 1, 2, 3], AssociationKind::Related),
            vec![3, 2]
        );
        assert_eq!(
            normalize_targets(1, &[3, 1, 2, 3], AssociationKind::Categories),
            vec![3, 1, 2]
        );
    }

    #[tokio::test]
    async fn test_image_order_and_primary() -> Result<()> {
        let db = setup_test_db().await?;
        let product = create_test_product(&db, "Gorra").await?;
        let a = create_test_image(&db, "a").await?;
        let b = create_test_image(&db, "b").await?;
        let c = create_test_image(&db, "c").await?;

        let stored =
            replace_associations(&db, product.id, &[b.id, a.id, c.id], AssociationKind::Images)
                .await?;
        assert_eq!(stored, 3);

        let rows = image_rows(&db, product.id).await?;
        let layout: Vec<(i64, i32, bool)> = rows
            .iter()
            .map(|r| (r.image_id, r.order_index, r.is_primary))
            .collect();
        assert_eq!(
            layout,
            vec![(b.id, 0, true), (a.id, 1, false), (c.id, 2, false)]
        );
        assert_eq!(rows.iter().filter(|r| r.is_primary).count(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_replace_is_idempotent() -> Result<()> {
        let db = setup_test_db().await?;
        let product = create_test_product(&db, "Gorra").await?;
        let a = create_test_image(&db, "a").await?;
        let b = create_test_image(&db, "b").await?;

        replace_associations(&db, product.id, &[a.id, b.id], AssociationKind::Images).await?;
        let first = image_rows(&db, product.id).await?;
        replace_associations(&db, product.id, &[a.id, b.id], AssociationKind::Images).await?;
        let second = image_rows(&db, product.id).await?;

        assert_eq!(first, second);
        Ok(())
    }

    #[tokio::test]
    async fn test_rewrite_moves_primary() -> Result<()> {
        let db = setup_test_db().await?;
        let product = create_test_product(&db, "Gorra").await?;
        let a = create_test_image(&db, "a").await?;
        let b = create_test_image(&db, "b").await?;

        replace_associations(&db, product.id, &[a.id, b.id], AssociationKind::Images).await?;
        replace_associations(&db, product.id, &[b.id], AssociationKind::Images).await?;

        let rows = image_rows(&db, product.id).await?;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].image_id, b.id);
        assert_eq!(rows[0].order_index, 0);
        assert!(rows[0].is_primary);
        Ok(())
    }

    #[tokio::test]
    async fn test_empty_list_clears() -> Result<()> {
        let db = setup_test_db().await?;
        let product = create_test_product(&db, "Gorra").await?;
        let category = create_test_category(&db, "Textil").await?;

        replace_associations(&db, product.id, &[category.id], AssociationKind::Categories).await?;
        assert_eq!(category_ids(&db, product.id).await?, vec![category.id]);

        let stored =
            replace_associations(&db, product.id, &[], AssociationKind::Categories).await?;
        assert_eq!(stored, 0);
        assert!(category_ids(&db, product.id).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_related_drops_self_reference() -> Result<()> {
        let db = setup_test_db().await?;
        let product = create_test_product(&db, "Gorra").await?;
        let other = create_test_product(&db, "Visera").await?;

        replace_associations(
            &db,
            product.id,
            &[product.id, other.id],
            AssociationKind::Related,
        )
        .await?;

        assert_eq!(related_ids(&db, product.id).await?, vec![other.id]);
        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_target_surfaces_database_error() -> Result<()> {
        let db = setup_test_db().await?;
        let product = create_test_product(&db, "Gorra").await?;

        let result = replace_associations(&db, product.id, &[999], AssociationKind::Images).await;
        assert!(matches!(result, Err(crate::errors::Error::Database(_))));
        Ok(())
    }

    #[tokio::test]
    async fn test_atomic_rewrite_rolls_back_on_failure() -> Result<()> {
        let db = setup_test_db().await?;
        let product = create_test_product(&db, "Gorra").await?;
        let a = create_test_image(&db, "a").await?;

        replace_associations_atomic(&db, product.id, &[a.id], AssociationKind::Images).await?;
        let result =
            replace_associations_atomic(&db, product.id, &[999], AssociationKind::Images).await;
        assert!(result.is_err());

        let rows = image_rows(&db, product.id).await?;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].image_id, a.id);
        Ok(())
    }
}
