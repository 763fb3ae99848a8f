//! Two-decimal money math and line-item helpers.
//!
//! The quotation and order repositories trust the amounts they are given. The helpers here
//! are how callers keep `amount == price * quantity` and `total_amount == sum(amount)` true:
//! build lines with [`quote_line`], re-derive them with [`switch_price_type`] when the
//! document's price type changes, and total them with [`summarize`].

use crate::{
    entities::{PriceType, product},
    errors::{Error, Result},
};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Rounds a monetary value to two decimals, midpoint away from zero.
#[must_use]
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// `price * quantity`, rounded to two decimals.
#[must_use]
pub fn line_amount(price: Decimal, quantity: i32) -> Decimal {
    round_money(price * Decimal::from(quantity))
}

/// Rejects negative prices.
pub fn ensure_non_negative(amount: Decimal) -> Result<()> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(Error::InvalidAmount { amount });
    }
    Ok(())
}

impl PriceType {
    /// Picks the authoritative price column for this price type.
    #[must_use]
    pub const fn pick(self, retail_price: Decimal, wholesale_price: Decimal) -> Decimal {
        match self {
            Self::Retail => retail_price,
            Self::Wholesale => wholesale_price,
        }
    }
}

/// A line item as supplied to a create or update of a budget or an order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItemInput {
    /// Product being quoted or sold
    pub product_id: i64,
    /// Units, must be positive
    pub quantity: i32,
    /// Unit price actually charged
    pub price: Decimal,
    /// Retail price captured when the line was built
    pub retail_price: Decimal,
    /// Wholesale price captured when the line was built
    pub wholesale_price: Decimal,
    /// `price * quantity`
    pub amount: Decimal,
    /// Free-form note
    pub observation: Option<String>,
}

impl LineItemInput {
    /// Checks the per-line constraints that must hold before the line is stored.
    pub fn validate(&self) -> Result<()> {
        if self.quantity <= 0 {
            return Err(Error::Validation {
                message: format!(
                    "Quantity for product {} must be positive, got {}",
                    self.product_id, self.quantity
                ),
            });
        }
        ensure_non_negative(self.price)?;
        ensure_non_negative(self.retail_price)?;
        ensure_non_negative(self.wholesale_price)?;
        ensure_non_negative(self.amount)
    }

    /// Whether the stored amount matches `price * quantity`.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.amount == line_amount(self.price, self.quantity)
    }
}

/// Builds a line from the product's current prices.
///
/// Both prices are snapshotted; `price_type` decides which one is charged.
#[must_use]
pub fn quote_line(product: &product::Model, quantity: i32, price_type: PriceType) -> LineItemInput {
    let price = price_type.pick(product.retail_price, product.wholesale_price);
    LineItemInput {
        product_id: product.id,
        quantity,
        price,
        retail_price: product.retail_price,
        wholesale_price: product.wholesale_price,
        amount: line_amount(price, quantity),
        observation: None,
    }
}

/// Re-prices every line from its own snapshots after the document's price type changed.
pub fn switch_price_type(items: &mut [LineItemInput], price_type: PriceType) {
    for item in items {
        item.price = price_type.pick(item.retail_price, item.wholesale_price);
        item.amount = line_amount(item.price, item.quantity);
    }
}

/// Sums the line amounts.
#[must_use]
pub fn summarize(items: &[LineItemInput]) -> Decimal {
    round_money(items.iter().map(|item| item.amount).sum())
}

/// Whether `total_amount` and every line amount agree with the line prices.
#[must_use]
pub fn totals_consistent(items: &[LineItemInput], total_amount: Decimal) -> bool {
    items.iter().all(LineItemInput::is_consistent) && summarize(items) == total_amount
}
