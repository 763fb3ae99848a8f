//! Pieces shared by budgets and orders: line views, the flattened-row decoder and the
//! totals check run before every write.
//!
//! Both composite reads return one row per line item. Line columns are aliased with an
//! `item_` prefix and decoded into [`LineRow`]; a row whose `item_id` is null is the
//! single placeholder row a document with no items produces, and is dropped.

use super::pricing::{LineItemInput, totals_consistent};
use crate::errors::Result;
use rust_decimal::Decimal;
use sea_orm::{DbErr, FromQueryResult, QueryResult};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Correlated subquery yielding the primary-or-first image URL of the line's product.
/// Expects the line table to be aliased `li`.
pub(crate) const LINE_IMAGE_SUBQUERY: &str = "(SELECT i.url FROM product_images pi \
     INNER JOIN images i ON i.id = pi.image_id \
     WHERE pi.product_id = li.product_id \
     ORDER BY pi.is_primary DESC, pi.order_index ASC LIMIT 1)";

/// Line columns every composite read selects, with the line table aliased `li` and the
/// product table aliased `p`.
pub(crate) const LINE_COLUMNS: &str = "li.id AS item_id, \
     li.product_id AS item_product_id, \
     li.quantity AS item_quantity, \
     li.price AS item_price, \
     li.retail_price AS item_retail_price, \
     li.wholesale_price AS item_wholesale_price, \
     li.amount AS item_amount, \
     li.observation AS item_observation, \
     p.name AS item_product_name, \
     p.slug AS item_product_slug, \
     p.sku AS item_product_sku";

/// A stored line item with its product resolved
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineView {
    /// Line id
    pub id: i64,
    /// Quoted product
    pub product_id: i64,
    /// Units
    pub quantity: i32,
    /// Unit price charged
    pub price: Decimal,
    /// Retail unit price
    pub retail_price: Decimal,
    /// Wholesale unit price
    pub wholesale_price: Decimal,
    /// `price * quantity`
    pub amount: Decimal,
    /// Free-form note
    pub observation: Option<String>,
    /// `None` once the product has been deleted
    pub product_name: Option<String>,
    /// Product slug at read time
    pub product_slug: Option<String>,
    /// Product sku at read time
    pub product_sku: Option<String>,
    /// Primary-or-first image of the product
    pub image_url: Option<String>,
}

impl LineView {
    /// Turns a stored line back into an input line, e.g. to copy it into another document.
    #[must_use]
    pub fn to_input(&self) -> LineItemInput {
        LineItemInput {
            product_id: self.product_id,
            quantity: self.quantity,
            price: self.price,
            retail_price: self.retail_price,
            wholesale_price: self.wholesale_price,
            amount: self.amount,
            observation: self.observation.clone(),
        }
    }
}

/// Line columns of one flattened row; every column is null on the placeholder row
#[derive(Debug, FromQueryResult)]
struct LineRow {
    id: Option<i64>,
    product_id: Option<i64>,
    quantity: Option<i32>,
    price: Option<Decimal>,
    retail_price: Option<Decimal>,
    wholesale_price: Option<Decimal>,
    amount: Option<Decimal>,
    observation: Option<String>,
    product_name: Option<String>,
    product_slug: Option<String>,
    product_sku: Option<String>,
    image_url: Option<String>,
}

fn required<T>(value: Option<T>, line_id: i64, column: &str) -> std::result::Result<T, DbErr> {
    value.ok_or_else(|| DbErr::Type(format!("line {line_id}: column {column} is null")))
}

impl LineRow {
    fn into_line(self) -> Option<std::result::Result<LineView, DbErr>> {
        let id = self.id?;
        let build = || -> std::result::Result<LineView, DbErr> {
            Ok(LineView {
                id,
                product_id: required(self.product_id, id, "product_id")?,
                quantity: required(self.quantity, id, "quantity")?,
                price: required(self.price, id, "price")?,
                retail_price: required(self.retail_price, id, "retail_price")?,
                wholesale_price: required(self.wholesale_price, id, "wholesale_price")?,
                amount: required(self.amount, id, "amount")?,
                observation: self.observation,
                product_name: self.product_name,
                product_slug: self.product_slug,
                product_sku: self.product_sku,
                image_url: self.image_url,
            })
        };
        Some(build())
    }
}

/// Decodes the header from the first row and the lines from every row.
///
/// Returns `None` when there are no rows, i.e. the header itself does not exist.
pub(crate) fn decode_rows<H>(rows: &[QueryResult]) -> Result<Option<(H, Vec<LineView>)>>
where
    H: FromQueryResult,
{
    let Some(first) = rows.first() else {
        return Ok(None);
    };
    let header = H::from_query_result(first, "")?;

    let mut lines = Vec::with_capacity(rows.len());
    for row in rows {
        if let Some(line) = LineRow::from_query_result(row, "item_")?.into_line() {
            lines.push(line?);
        }
    }

    Ok(Some((header, lines)))
}

/// Validates every line and logs when the caller-supplied total disagrees with the lines.
///
/// The total is stored as given either way.
pub(crate) fn check_lines(document: &str, items: &[LineItemInput], total_amount: Decimal) -> Result<()> {
    for item in items {
        item.validate()?;
    }
    super::pricing::ensure_non_negative(total_amount)?;

    if !totals_consistent(items, total_amount) {
        warn!(
            "{} total {} does not match its {} lines; storing as supplied",
            document,
            total_amount,
            items.len()
        );
    }
    Ok(())
}
