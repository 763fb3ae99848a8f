//! Bulk repricing - Applies one percentage change to many products.
//!
//! Each product is re-read right before it is written, so a long batch never compounds a
//! stale snapshot. Products are processed one at a time; a failure on one id is recorded
//! and the batch moves on without undoing earlier updates.

use super::pricing::round_money;
use crate::{
    entities::{Product, product},
    errors::{Error, Result},
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, sea_query::Expr};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{info, instrument, warn};

/// Direction of a bulk price change
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PriceOperation {
    /// Raise prices by the percentage
    Add,
    /// Lower prices by the percentage
    Subtract,
}

impl PriceOperation {
    /// Label written into the product's price note
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Add => "Incrementar",
            Self::Subtract => "Decrementar",
        }
    }
}

impl fmt::Display for PriceOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// `price * (1 ± percentage / 100)`, rounded to two decimals.
#[must_use]
pub fn apply_percentage(price: Decimal, operation: PriceOperation, percentage: Decimal) -> Decimal {
    let factor = match operation {
        PriceOperation::Add => Decimal::ONE + percentage / Decimal::ONE_HUNDRED,
        PriceOperation::Subtract => Decimal::ONE - percentage / Decimal::ONE_HUNDRED,
    };
    round_money(price * factor)
}

/// Human-readable note such as `Incrementar 12%`.
#[must_use]
pub fn describe(operation: PriceOperation, percentage: Decimal) -> String {
    format!("{operation} {}%", percentage.normalize())
}

/// Before and after prices of one repriced product
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceChange {
    /// Repriced product
    pub product_id: i64,
    /// Product name at repricing time
    pub name: String,
    /// Retail price before
    pub old_retail_price: Decimal,
    /// Retail price after
    pub new_retail_price: Decimal,
    /// Wholesale price before
    pub old_wholesale_price: Decimal,
    /// Wholesale price after
    pub new_wholesale_price: Decimal,
}

/// Outcome of a repricing batch
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepricingReport {
    /// Products written, in input order
    pub updated: Vec<PriceChange>,
    /// Ids that no longer resolve to a product
    pub skipped: Vec<i64>,
    /// Ids whose read or write failed, with the error message
    pub failed: Vec<(i64, String)>,
}

impl RepricingReport {
    /// Whether every requested id was updated
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty() && self.failed.is_empty()
    }
}

fn validate_request(product_ids: &[i64], percentage: Decimal) -> Result<()> {
    if product_ids.is_empty() {
        return Err(Error::Validation {
            message: "Repricing needs at least one product id".to_string(),
        });
    }
    if percentage < Decimal::ZERO || percentage > Decimal::ONE_HUNDRED {
        return Err(Error::InvalidPercentage { percentage });
    }
    Ok(())
}

async fn reprice_one<C>(
    db: &C,
    product_id: i64,
    operation: PriceOperation,
    percentage: Decimal,
    note: &str,
) -> Result<Option<PriceChange>>
where
    C: ConnectionTrait,
{
    let Some(current) = Product::find_by_id(product_id).one(db).await? else {
        return Ok(None);
    };

    let change = PriceChange {
        product_id,
        name: current.name.clone(),
        old_retail_price: current.retail_price,
        new_retail_price: apply_percentage(current.retail_price, operation, percentage),
        old_wholesale_price: current.wholesale_price,
        new_wholesale_price: apply_percentage(current.wholesale_price, operation, percentage),
    };

    let now = Utc::now();
    let result = Product::update_many()
        .col_expr(product::Column::RetailPrice, Expr::value(change.new_retail_price))
        .col_expr(product::Column::WholesalePrice, Expr::value(change.new_wholesale_price))
        .col_expr(product::Column::PriceUpdatedAt, Expr::value(Some(now)))
        .col_expr(product::Column::PriceUpdated, Expr::value(Some(note.to_string())))
        .col_expr(product::Column::UpdatedAt, Expr::value(now))
        .filter(product::Column::Id.eq(product_id))
        .exec(db)
        .await?;

    // Deleted between the read and the write
    if result.rows_affected == 0 {
        return Ok(None);
    }
    Ok(Some(change))
}

/// Raises or lowers the retail and wholesale price of every listed product by `percentage`.
///
/// # Errors
/// Only input validation fails the call: an empty id list, or a percentage outside
/// `[0, 100]`. Per-product problems land in the report.
#[instrument(skip(db, product_ids), fields(count = product_ids.len()))]
pub async fn reprice_products<C>(
    db: &C,
    product_ids: &[i64],
    operation: PriceOperation,
    percentage: Decimal,
) -> Result<RepricingReport>
where
    C: ConnectionTrait,
{
    validate_request(product_ids, percentage)?;

    let note = describe(operation, percentage);
    let mut report = RepricingReport::default();

    for &product_id in product_ids {
        match reprice_one(db, product_id, operation, percentage, &note).await {
            Ok(Some(change)) => report.updated.push(change),
            Ok(None) => {
                warn!("Skipping repricing of missing product {}", product_id);
                report.skipped.push(product_id);
            }
            Err(e) => {
                warn!("Repricing product {} failed: {}", product_id, e);
                report.failed.push((product_id, e.to_string()));
            }
        }
    }

    info!(
        "{}: {} updated, {} skipped, {} failed",
        note,
        report.updated.len(),
        report.skipped.len(),
        report.failed.len()
    );
    Ok(report)
}
