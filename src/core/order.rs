//! Order business logic - Confirmed sales and budget promotion.
//!
//! Orders are stored and read exactly like budgets: one joined query for the read, a
//! header update plus full item replacement for the write. The one extra operation is
//! [`promote_budget_to_order`].

use super::{
    budget::{self, BudgetAggregate},
    document::{LINE_COLUMNS, LINE_IMAGE_SUBQUERY, LineView, check_lines, decode_rows},
    pricing::LineItemInput,
};
use crate::{
    entities::{BudgetStatus, Order, OrderItem, OrderStatus, PriceType, order, order_item},
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveValue::Unchanged, FromQueryResult, QueryOrder, Set, Statement, prelude::*,
    sea_query::Expr,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, warn};

const ORDER_QUERY: &str = "SELECT \
     o.id AS id, o.customer_id AS customer_id, o.responsible_id AS responsible_id, \
     o.budget_id AS budget_id, o.price_type AS price_type, o.observation AS observation, \
     o.total_amount AS total_amount, o.status AS status, \
     o.is_read AS is_read, o.created_at AS created_at, \
     c.name AS customer_name, c.email AS customer_email, c.company AS customer_company, \
     r.name AS responsible_name";

/// Order header as rebuilt from the composite read
#[derive(Clone, Debug, PartialEq, Eq, FromQueryResult, Serialize, Deserialize)]
pub struct OrderHeader {
    /// Unique identifier
    pub id: i64,
    /// Customer the document is issued to
    pub customer_id: Option<i64>,
    /// Issuing-party profile
    pub responsible_id: Option<i64>,
    /// Source budget when promoted
    pub budget_id: Option<i64>,
    /// Which product price column is charged
    pub price_type: PriceType,
    /// Free-form note
    pub observation: Option<String>,
    /// Stored document total
    pub total_amount: Decimal,
    /// Lifecycle status
    pub status: OrderStatus,
    /// Whether an admin has opened it
    pub is_read: bool,
    /// When it was created
    pub created_at: DateTime<Utc>,
    /// Customer name, if assigned
    pub customer_name: Option<String>,
    /// Customer email, if assigned
    pub customer_email: Option<String>,
    /// Customer company, if any
    pub customer_company: Option<String>,
    /// Responsible name, if assigned
    pub responsible_name: Option<String>,
}

/// An order with its lines
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderAggregate {
    /// Header with customer and responsible resolved
    pub header: OrderHeader,
    /// Lines in insertion order
    pub items: Vec<LineView>,
}

/// Header fields and complete item list for a create or an update
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderDraft {
    /// Customer the document is issued to
    pub customer_id: Option<i64>,
    /// Issuing-party profile
    pub responsible_id: Option<i64>,
    /// Source budget, set by promotion
    pub budget_id: Option<i64>,
    /// Which product price column is charged
    pub price_type: PriceType,
    /// Free-form note
    pub observation: Option<String>,
    /// Stored document total
    pub total_amount: Decimal,
    /// Complete desired item set
    pub items: Vec<LineItemInput>,
}

impl From<&BudgetAggregate> for OrderDraft {
    /// Copies customer, price type, observation, total and every line verbatim.
    fn from(budget: &BudgetAggregate) -> Self {
        Self {
            customer_id: budget.header.customer_id,
            responsible_id: budget.header.responsible_id,
            budget_id: Some(budget.header.id),
            price_type: budget.header.price_type,
            observation: budget.header.observation.clone(),
            total_amount: budget.header.total_amount,
            items: budget.items.iter().map(LineView::to_input).collect(),
        }
    }
}

impl OrderStatus {
    /// Whether an order in this status may move to `next`.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Processing | Self::Cancelled)
                | (Self::Processing, Self::Completed | Self::Cancelled)
        )
    }

    /// Completed and cancelled orders never change status again.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

async fn insert_items<C>(db: &C, order_id: i64, items: &[LineItemInput]) -> Result<()>
where
    C: ConnectionTrait,
{
    for item in items {
        order_item::ActiveModel {
            order_id: Set(order_id),
            product_id: Set(item.product_id),
            quantity: Set(item.quantity),
            price: Set(item.price),
            retail_price: Set(item.retail_price),
            wholesale_price: Set(item.wholesale_price),
            amount: Set(item.amount),
            observation: Set(item.observation.clone()),
            ..Default::default()
        }
        .insert(db)
        .await?;
    }
    Ok(())
}

/// Reads an order with its customer, responsible and lines in one query.
#[instrument(skip(db))]
pub async fn get_order_by_id<C>(db: &C, order_id: i64) -> Result<Option<OrderAggregate>>
where
    C: ConnectionTrait,
{
    let sql = format!(
        "{ORDER_QUERY}, {LINE_COLUMNS}, {LINE_IMAGE_SUBQUERY} AS item_image_url \
         FROM orders o \
         LEFT JOIN customers c ON c.id = o.customer_id \
         LEFT JOIN responsibles r ON r.id = o.responsible_id \
         LEFT JOIN order_items li ON li.order_id = o.id \
         LEFT JOIN products p ON p.id = li.product_id \
         WHERE o.id = ? \
         ORDER BY li.id ASC"
    );
    let statement =
        Statement::from_sql_and_values(db.get_database_backend(), sql, [order_id.into()]);
    let rows = db.query_all(statement).await?;

    Ok(decode_rows::<OrderHeader>(&rows)?.map(|(header, items)| OrderAggregate { header, items }))
}

/// Lists order headers newest first, optionally restricted to one status.
pub async fn list_orders<C>(db: &C, status: Option<OrderStatus>) -> Result<Vec<order::Model>>
where
    C: ConnectionTrait,
{
    let mut query = Order::find();
    if let Some(status) = status {
        query = query.filter(order::Column::Status.eq(status));
    }
    query
        .order_by_desc(order::Column::CreatedAt)
        .order_by_desc(order::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Counts orders nobody has opened yet.
pub async fn count_unread_orders<C>(db: &C) -> Result<u64>
where
    C: ConnectionTrait,
{
    Order::find()
        .filter(order::Column::IsRead.eq(false))
        .count(db)
        .await
        .map_err(Into::into)
}

/// Creates a pending order and its lines, then reads it back.
#[instrument(skip(db, draft), fields(items = draft.items.len(), budget_id = ?draft.budget_id))]
pub async fn create_order<C>(db: &C, draft: OrderDraft) -> Result<OrderAggregate>
where
    C: ConnectionTrait,
{
    check_lines("Order", &draft.items, draft.total_amount)?;

    let order = order::ActiveModel {
        customer_id: Set(draft.customer_id),
        responsible_id: Set(draft.responsible_id),
        budget_id: Set(draft.budget_id),
        price_type: Set(draft.price_type),
        observation: Set(draft.observation),
        total_amount: Set(draft.total_amount),
        status: Set(OrderStatus::Pending),
        is_read: Set(false),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    insert_items(db, order.id, &draft.items).await?;
    debug!("Created order {} with {} items", order.id, draft.items.len());

    get_order_by_id(db, order.id)
        .await?
        .ok_or(Error::OrderNotFound { id: order.id })
}

/// Rewrites the header and replaces the whole item list.
///
/// `budget_id` is provenance and is never changed by an update.
#[instrument(skip(db, draft), fields(items = draft.items.len()))]
pub async fn update_order<C>(db: &C, order_id: i64, draft: OrderDraft) -> Result<OrderAggregate>
where
    C: ConnectionTrait,
{
    check_lines("Order", &draft.items, draft.total_amount)?;

    if Order::find_by_id(order_id).one(db).await?.is_none() {
        return Err(Error::OrderNotFound { id: order_id });
    }

    order::ActiveModel {
        id: Unchanged(order_id),
        customer_id: Set(draft.customer_id),
        responsible_id: Set(draft.responsible_id),
        price_type: Set(draft.price_type),
        observation: Set(draft.observation),
        total_amount: Set(draft.total_amount),
        ..Default::default()
    }
    .update(db)
    .await?;

    OrderItem::delete_many()
        .filter(order_item::Column::OrderId.eq(order_id))
        .exec(db)
        .await?;
    insert_items(db, order_id, &draft.items).await?;

    get_order_by_id(db, order_id)
        .await?
        .ok_or(Error::OrderNotFound { id: order_id })
}

/// Moves an order to `status`.
///
/// # Errors
/// - [`Error::OrderNotFound`] for an unknown id
/// - [`Error::InvalidStatusTransition`] when the move is not allowed
#[instrument(skip(db))]
pub async fn update_order_status<C>(
    db: &C,
    order_id: i64,
    status: OrderStatus,
) -> Result<order::Model>
where
    C: ConnectionTrait,
{
    let current = Order::find_by_id(order_id)
        .one(db)
        .await?
        .ok_or(Error::OrderNotFound { id: order_id })?;

    if !current.status.can_transition_to(status) {
        warn!("Rejected order {} transition {} -> {}", order_id, current.status, status);
        return Err(Error::InvalidStatusTransition {
            from: current.status.to_string(),
            to: status.to_string(),
        });
    }

    let mut order: order::ActiveModel = current.into();
    order.status = Set(status);
    order.update(db).await.map_err(Into::into)
}

/// Flags an order as opened by an admin.
pub async fn mark_order_as_read<C>(db: &C, order_id: i64) -> Result<()>
where
    C: ConnectionTrait,
{
    let result = Order::update_many()
        .col_expr(order::Column::IsRead, Expr::value(true))
        .filter(order::Column::Id.eq(order_id))
        .exec(db)
        .await?;
    if result.rows_affected == 0 {
        return Err(Error::OrderNotFound { id: order_id });
    }
    Ok(())
}

/// Deletes an order and its lines.
pub async fn delete_order<C>(db: &C, order_id: i64) -> Result<()>
where
    C: ConnectionTrait,
{
    let result = Order::delete_by_id(order_id).exec(db).await?;
    if result.rows_affected == 0 {
        return Err(Error::OrderNotFound { id: order_id });
    }
    Ok(())
}

/// Turns a budget into a new order, then marks the budget approved.
///
/// The order copies customer, price type, observation, total and all lines of `budget`
/// verbatim and records the budget as its source. The two writes are separate: when the
/// order is created but the approval fails, the result is
/// [`Error::PromotionIncomplete`] carrying the new order id, and the budget keeps its
/// previous status. An already approved budget is promoted without being stamped again.
///
/// # Errors
/// - [`Error::InvalidStatusTransition`] if the budget is rejected or expired; nothing is written
/// - any error of [`create_order`], in which case the budget is untouched
#[instrument(skip(db, budget), fields(budget_id = budget.header.id))]
pub async fn promote_budget_to_order<C>(db: &C, budget: &BudgetAggregate) -> Result<OrderAggregate>
where
    C: ConnectionTrait,
{
    let budget_id = budget.header.id;
    let status = budget.header.status;
    if !matches!(status, BudgetStatus::Pending | BudgetStatus::Approved) {
        return Err(Error::InvalidStatusTransition {
            from: status.to_string(),
            to: BudgetStatus::Approved.to_string(),
        });
    }

    let order = create_order(db, OrderDraft::from(budget)).await?;

    if status == BudgetStatus::Pending {
        if let Err(e) = budget::update_budget_status(db, budget_id, BudgetStatus::Approved).await {
            error!(
                "Order {} created but budget {} could not be approved: {}",
                order.header.id, budget_id, e
            );
            return Err(Error::PromotionIncomplete {
                order_id: order.header.id,
                budget_id,
                source: Box::new(e),
            });
        }
    }

    info!("Promoted budget {} to order {}", budget_id, order.header.id);
    Ok(order)
}
