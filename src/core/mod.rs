//! Core business logic - Framework-agnostic catalog, quotation and order operations.
//!
//! Every operation takes a [`sea_orm::ConnectionTrait`] so the caller decides whether it
//! runs on a plain connection or inside a transaction.

/// Quotations with their line items and status machine
pub mod budget;
/// Categories and their artwork
pub mod category;
/// Customers and issuing-party profiles
pub mod customer;
/// Line views and row decoding shared by budgets and orders
pub mod document;
/// Image descriptors
pub mod image;
/// Spreadsheet product import
pub mod import;
/// Confirmed orders and budget promotion
pub mod order;
/// Money rounding and line-item helpers
pub mod pricing;
/// Products with their images, categories and related products
pub mod product;
/// Many-to-many association rewrites
pub mod relations;
/// Bulk percentage repricing
pub mod repricing;
/// Slug validation and derivation
pub mod slug;
