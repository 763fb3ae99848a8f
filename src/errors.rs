//! Unified error type for the catalog, quotation and order core.
//!
//! Datastore errors are carried unchanged in [`Error::Database`] so callers can still
//! inspect constraint violations and connection failures. Lookups never produce a
//! not-found error; those are reserved for mutations that target a missing row.

use rust_decimal::Decimal;
use sea_orm::{DbErr, SqlErr};
use thiserror::Error;

const SQLITE_FOREIGN_KEY_MESSAGE: &str = "FOREIGN KEY constraint failed";

/// All errors surfaced by this crate.
#[derive(Debug, Error)]
pub enum Error {
    /// Underlying datastore failure (constraint violation, connection loss, ...)
    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    /// Configuration could not be loaded or parsed
    #[error("Configuration error: {message}")]
    Config {
        /// What went wrong
        message: String,
    },

    /// Input rejected before reaching the datastore
    #[error("Validation error: {message}")]
    Validation {
        /// What went wrong
        message: String,
    },

    /// Negative or non-representable monetary value
    #[error("Invalid amount: {amount}")]
    InvalidAmount {
        /// The rejected amount
        amount: Decimal,
    },

    /// Repricing percentage outside of `[0, 100]`
    #[error("Invalid percentage: {percentage} (expected 0-100)")]
    InvalidPercentage {
        /// The rejected percentage
        percentage: Decimal,
    },

    /// No product has this id
    #[error("Product not found: {id}")]
    ProductNotFound {
        /// The missing id
        id: i64,
    },

    /// No category has this id
    #[error("Category not found: {id}")]
    CategoryNotFound {
        /// The missing id
        id: i64,
    },

    /// No image has this id
    #[error("Image not found: {id}")]
    ImageNotFound {
        /// The missing id
        id: i64,
    },

    /// No customer has this id
    #[error("Customer not found: {id}")]
    CustomerNotFound {
        /// The missing id
        id: i64,
    },

    /// No budget has this id
    #[error("Budget not found: {id}")]
    BudgetNotFound {
        /// The missing id
        id: i64,
    },

    /// No order has this id
    #[error("Order not found: {id}")]
    OrderNotFound {
        /// The missing id
        id: i64,
    },

    /// A status change the state machine does not allow
    #[error("Invalid status transition: {from} -> {to}")]
    InvalidStatusTransition {
        /// Current status
        from: String,
        /// Requested status
        to: String,
    },

    /// The order was created from a budget but the budget could not be marked approved
    #[error("Order {order_id} was created but budget {budget_id} was not approved: {source}")]
    PromotionIncomplete {
        /// The order that now exists
        order_id: i64,
        /// The budget left in its previous status
        budget_id: i64,
        /// Why the status update failed
        #[source]
        source: Box<Error>,
    },

    /// I/O error (config file access)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Environment variable error
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),
}

impl Error {
    /// Whether this error is a unique-key conflict (slug, sku, email).
    ///
    /// The API boundary uses this to turn a raw datastore error into a user-facing message.
    #[must_use]
    pub fn is_unique_violation(&self) -> bool {
        match self {
            Self::Database(err) => matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))),
            _ => false,
        }
    }

    /// Whether this error is a foreign-key conflict (e.g. deleting an image a category still uses).
    #[must_use]
    pub fn is_foreign_key_violation(&self) -> bool {
        match self {
            // SQLite reports RESTRICT failures (extended code 1811) with no code sqlx maps
            Self::Database(err) => {
                matches!(err.sql_err(), Some(SqlErr::ForeignKeyConstraintViolation(_)))
                    || err.to_string().contains(SQLITE_FOREIGN_KEY_MESSAGE)
            }
            _ => false,
        }
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
