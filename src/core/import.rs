//! Spreadsheet import - Creates or updates products row by row, keyed on sku.
//!
//! Rows arrive already parsed from the spreadsheet, with every cell optional. A row whose
//! sku already exists updates that product; any other row creates a new one. A failing
//! row is recorded and the import moves on.

use super::{
    product::{self, NewProduct, ProductPatch},
    slug::slugify,
};
use crate::errors::{Error, Result};
use rust_decimal::Decimal;
use sea_orm::ConnectionTrait;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

/// Price note stamped on every imported product
pub const IMPORT_PRICE_NOTE: &str = "Importación";

/// One spreadsheet row as delivered by the parser
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportRow {
    /// Stock code that keys the row (required)
    pub sku: Option<String>,
    /// Product name (required)
    pub name: Option<String>,
    /// Description cell
    pub description: Option<String>,
    /// Retail price (required)
    pub retail_price: Option<Decimal>,
    /// Wholesale price (required)
    pub wholesale_price: Option<Decimal>,
    /// Units on hand
    pub stock: Option<i32>,
    /// Visible on the storefront
    pub is_active: Option<bool>,
    /// Highlighted on the home page
    pub is_featured: Option<bool>,
}

/// Why one row was not imported
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportError {
    /// 1-based position of the row in the input
    pub row: usize,
    /// The row's sku, when it had one
    pub sku: Option<String>,
    /// Why the row was rejected
    pub reason: String,
}

/// Outcome of an import
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportReport {
    /// Rows that created a product
    pub created: usize,
    /// Rows that updated an existing product
    pub updated: usize,
    /// Rows rejected, equal to `error_list.len()`
    pub errors: usize,
    /// One entry per rejected row
    pub error_list: Vec<ImportError>,
}

/// A row with every required cell present
struct ValidRow {
    sku: String,
    name: String,
    retail_price: Decimal,
    wholesale_price: Decimal,
}

fn non_blank(value: Option<&String>) -> Option<String> {
    value
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn require(row: &ImportRow) -> Result<ValidRow> {
    let missing = |field: &str| Error::Validation {
        message: format!("Missing required field: {field}"),
    };
    Ok(ValidRow {
        sku: non_blank(row.sku.as_ref()).ok_or_else(|| missing("sku"))?,
        name: non_blank(row.name.as_ref()).ok_or_else(|| missing("name"))?,
        retail_price: row.retail_price.ok_or_else(|| missing("retail_price"))?,
        wholesale_price: row.wholesale_price.ok_or_else(|| missing("wholesale_price"))?,
    })
}

/// Whether the row created (`true`) or updated (`false`) a product.
async fn import_row<C>(db: &C, row: ImportRow) -> Result<bool>
where
    C: ConnectionTrait,
{
    let valid = require(&row)?;

    if let Some(existing) = product::find_product_row_by_sku(db, &valid.sku).await? {
        let patch = ProductPatch {
            name: Some(valid.name),
            description: row.description.map(Some),
            stock: row.stock,
            is_active: row.is_active,
            is_featured: row.is_featured,
            retail_price: Some(valid.retail_price),
            wholesale_price: Some(valid.wholesale_price),
            price_updated: Some(IMPORT_PRICE_NOTE.to_string()),
            ..Default::default()
        };
        product::update_product(db, existing.id, patch).await?;
        return Ok(false);
    }

    let slug = slugify(&valid.name);
    let draft = NewProduct {
        slug,
        name: valid.name,
        description: row.description,
        sku: Some(valid.sku),
        stock: row.stock.unwrap_or(0),
        is_active: row.is_active.unwrap_or(true),
        is_featured: row.is_featured.unwrap_or(false),
        retail_price: valid.retail_price,
        wholesale_price: valid.wholesale_price,
        image_ids: None,
        category_ids: None,
        related_ids: None,
    };
    product::create_product(db, draft).await?;
    Ok(true)
}

/// Imports every row independently and reports what happened to each.
///
/// Required cells are sku, name and both prices. Cells left empty on an update keep the
/// stored value; on a create they default to stock 0, active and not featured.
#[instrument(skip(db, rows), fields(rows = rows.len()))]
pub async fn import_products<C>(db: &C, rows: Vec<ImportRow>) -> ImportReport
where
    C: ConnectionTrait,
{
    let mut report = ImportReport::default();

    for (index, row) in rows.into_iter().enumerate() {
        let position = index + 1;
        let sku = row.sku.clone();
        match import_row(db, row).await {
            Ok(true) => report.created += 1,
            Ok(false) => report.updated += 1,
            Err(e) => {
                warn!("Import row {} failed: {}", position, e);
                report.error_list.push(ImportError {
                    row: position,
                    sku,
                    reason: e.to_string(),
                });
            }
        }
    }
    report.errors = report.error_list.len();

    info!(
        "Import finished: {} created, {} updated, {} errors",
        report.created, report.updated, report.errors
    );
    report
}
