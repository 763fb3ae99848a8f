//! Budget business logic - Quotations and their line items.
//!
//! A budget is read back with a single joined query and rebuilt into a header plus lines.
//! Item edits are full replacements: every stored line is deleted and the supplied list is
//! inserted, so a caller must always send the complete item set. Totals are trusted as
//! supplied; see [`super::pricing`] for the helpers that keep them right.
//!
//! Status changes go through [`BudgetStatus::can_transition_to`]: a pending budget can be
//! approved, rejected or expired, and nothing leaves those states.

use super::{
    document::{LINE_COLUMNS, LINE_IMAGE_SUBQUERY, LineView, check_lines, decode_rows},
    pricing::LineItemInput,
};
use crate::{
    config::settings::Settings,
    entities::{Budget, BudgetItem, BudgetStatus, PriceType, budget, budget_item},
    errors::{Error, Result},
};
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveValue::Unchanged, FromQueryResult, QueryOrder, Set, Statement, prelude::*,
    sea_query::Expr,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

const BUDGET_QUERY: &str = "SELECT \
     b.id AS id, b.customer_id AS customer_id, b.responsible_id AS responsible_id, \
     b.price_type AS price_type, b.observation AS observation, \
     b.total_amount AS total_amount, b.status AS status, b.expires_at AS expires_at, \
     b.approved_at AS approved_at, b.rejected_at AS rejected_at, \
     b.is_read AS is_read, b.created_at AS created_at, \
     c.name AS customer_name, c.email AS customer_email, c.company AS customer_company, \
     r.name AS responsible_name";

/// Budget header as rebuilt from the composite read
#[derive(Clone, Debug, PartialEq, Eq, FromQueryResult, Serialize, Deserialize)]
pub struct BudgetHeader {
    /// Unique identifier
    pub id: i64,
    /// Customer the document is issued to
    pub customer_id: Option<i64>,
    /// Issuing-party profile
    pub responsible_id: Option<i64>,
    /// Which product price column is charged
    pub price_type: PriceType,
    /// Free-form note
    pub observation: Option<String>,
    /// Stored document total
    pub total_amount: Decimal,
    /// Lifecycle status
    pub status: BudgetStatus,
    /// End of validity
    pub expires_at: Option<DateTime<Utc>>,
    /// Set on approval
    pub approved_at: Option<DateTime<Utc>>,
    /// Set on rejection
    pub rejected_at: Option<DateTime<Utc>>,
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

/// A budget with its lines
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetAggregate {
    /// Header with customer and responsible resolved
    pub header: BudgetHeader,
    /// Lines in insertion order; empty when the budget has no items
    pub items: Vec<LineView>,
}

/// Header fields and complete item list for a create or an update
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetDraft {
    /// Customer the document is issued to
    pub customer_id: Option<i64>,
    /// Issuing-party profile
    pub responsible_id: Option<i64>,
    /// Which product price column is charged
    pub price_type: PriceType,
    /// Free-form note
    pub observation: Option<String>,
    /// Expected to equal the sum of item amounts
    pub total_amount: Decimal,
    /// On create, `None` means "now + configured validity"; on update, "keep"
    pub expires_at: Option<DateTime<Utc>>,
    /// Complete desired item set
    pub items: Vec<LineItemInput>,
}

impl BudgetStatus {
    /// Whether a budget in this status may move to `next`.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Approved | Self::Rejected | Self::Expired)
        )
    }

    /// Approved, rejected and expired budgets never change status again.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }
}

/// Inserts lines one by one, in order.
async fn insert_items<C>(db: &C, budget_id: i64, items: &[LineItemInput]) -> Result<()>
where
    C: ConnectionTrait,
{
    for item in items {
        budget_item::ActiveModel {
            budget_id: Set(budget_id),
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

/// Reads a budget with its customer, responsible and lines in one query.
///
/// Returns `None` if the budget does not exist; a budget without items reads back with an
/// empty `items` list.
#[instrument(skip(db))]
pub async fn get_budget_by_id<C>(db: &C, budget_id: i64) -> Result<Option<BudgetAggregate>>
where
    C: ConnectionTrait,
{
    let sql = format!(
        "{BUDGET_QUERY}, {LINE_COLUMNS}, {LINE_IMAGE_SUBQUERY} AS item_image_url \
         FROM budgets b \
         LEFT JOIN customers c ON c.id = b.customer_id \
         LEFT JOIN responsibles r ON r.id = b.responsible_id \
         LEFT JOIN budget_items li ON li.budget_id = b.id \
         LEFT JOIN products p ON p.id = li.product_id \
         WHERE b.id = ? \
         ORDER BY li.id ASC"
    );
    let statement =
        Statement::from_sql_and_values(db.get_database_backend(), sql, [budget_id.into()]);
    let rows = db.query_all(statement).await?;

    Ok(decode_rows::<BudgetHeader>(&rows)?.map(|(header, items)| BudgetAggregate { header, items }))
}

/// Lists budget headers newest first, optionally restricted to one status.
pub async fn list_budgets<C>(db: &C, status: Option<BudgetStatus>) -> Result<Vec<budget::Model>>
where
    C: ConnectionTrait,
{
    let mut query = Budget::find();
    if let Some(status) = status {
        query = query.filter(budget::Column::Status.eq(status));
    }
    query
        .order_by_desc(budget::Column::CreatedAt)
        .order_by_desc(budget::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Counts budgets nobody has opened yet.
pub async fn count_unread_budgets<C>(db: &C) -> Result<u64>
where
    C: ConnectionTrait,
{
    Budget::find()
        .filter(budget::Column::IsRead.eq(false))
        .count(db)
        .await
        .map_err(Into::into)
}

/// Creates a pending budget and its lines, then reads it back.
///
/// The total is stored as supplied. Without an explicit expiry the budget expires
/// `settings.budget_validity_days` after creation.
#[instrument(skip(db, settings, draft), fields(items = draft.items.len()))]
pub async fn create_budget<C>(
    db: &C,
    settings: &Settings,
    draft: BudgetDraft,
) -> Result<BudgetAggregate>
where
    C: ConnectionTrait,
{
    check_lines("Budget", &draft.items, draft.total_amount)?;

    let now = Utc::now();
    let expires_at = draft
        .expires_at
        .unwrap_or_else(|| now + Duration::days(settings.budget_validity_days));

    let budget = budget::ActiveModel {
        customer_id: Set(draft.customer_id),
        responsible_id: Set(draft.responsible_id),
        price_type: Set(draft.price_type),
        observation: Set(draft.observation),
        total_amount: Set(draft.total_amount),
        status: Set(BudgetStatus::Pending),
        expires_at: Set(Some(expires_at)),
        approved_at: Set(None),
        rejected_at: Set(None),
        is_read: Set(false),
        created_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await?;

    insert_items(db, budget.id, &draft.items).await?;
    debug!("Created budget {} with {} items", budget.id, draft.items.len());

    get_budget_by_id(db, budget.id)
        .await?
        .ok_or(Error::BudgetNotFound { id: budget.id })
}

/// Rewrites the header and replaces the whole item list.
///
/// Items missing from `draft.items` are deleted. Status and its timestamps are not
/// touched; use [`update_budget_status`].
#[instrument(skip(db, draft), fields(items = draft.items.len()))]
pub async fn update_budget<C>(db: &C, budget_id: i64, draft: BudgetDraft) -> Result<BudgetAggregate>
where
    C: ConnectionTrait,
{
    check_lines("Budget", &draft.items, draft.total_amount)?;

    if Budget::find_by_id(budget_id).one(db).await?.is_none() {
        return Err(Error::BudgetNotFound { id: budget_id });
    }

    let mut budget = budget::ActiveModel {
        id: Unchanged(budget_id),
        customer_id: Set(draft.customer_id),
        responsible_id: Set(draft.responsible_id),
        price_type: Set(draft.price_type),
        observation: Set(draft.observation),
        total_amount: Set(draft.total_amount),
        ..Default::default()
    };
    if let Some(expires_at) = draft.expires_at {
        budget.expires_at = Set(Some(expires_at));
    }
    budget.update(db).await?;

    let removed = BudgetItem::delete_many()
        .filter(budget_item::Column::BudgetId.eq(budget_id))
        .exec(db)
        .await?
        .rows_affected;
    insert_items(db, budget_id, &draft.items).await?;
    debug!(
        "Replaced {} items of budget {} with {}",
        removed,
        budget_id,
        draft.items.len()
    );

    get_budget_by_id(db, budget_id)
        .await?
        .ok_or(Error::BudgetNotFound { id: budget_id })
}

/// Moves a budget to `status`, stamping `approved_at` or `rejected_at` on the matching move.
///
/// # Errors
/// - [`Error::BudgetNotFound`] for an unknown id
/// - [`Error::InvalidStatusTransition`] when the move is not allowed; the row is untouched
#[instrument(skip(db))]
pub async fn update_budget_status<C>(
    db: &C,
    budget_id: i64,
    status: BudgetStatus,
) -> Result<budget::Model>
where
    C: ConnectionTrait,
{
    let current = Budget::find_by_id(budget_id)
        .one(db)
        .await?
        .ok_or(Error::BudgetNotFound { id: budget_id })?;

    if !current.status.can_transition_to(status) {
        warn!("Rejected budget {} transition {} -> {}", budget_id, current.status, status);
        return Err(Error::InvalidStatusTransition {
            from: current.status.to_string(),
            to: status.to_string(),
        });
    }

    let now = Utc::now();
    let mut budget: budget::ActiveModel = current.into();
    budget.status = Set(status);
    match status {
        BudgetStatus::Approved => budget.approved_at = Set(Some(now)),
        BudgetStatus::Rejected => budget.rejected_at = Set(Some(now)),
        BudgetStatus::Pending | BudgetStatus::Expired => {}
    }

    budget.update(db).await.map_err(Into::into)
}

/// Flags a budget as opened by an admin.
pub async fn mark_budget_as_read<C>(db: &C, budget_id: i64) -> Result<()>
where
    C: ConnectionTrait,
{
    let result = Budget::update_many()
        .col_expr(budget::Column::IsRead, Expr::value(true))
        .filter(budget::Column::Id.eq(budget_id))
        .exec(db)
        .await?;
    if result.rows_affected == 0 {
        return Err(Error::BudgetNotFound { id: budget_id });
    }
    Ok(())
}

/// Deletes a budget; its lines go with it.
pub async fn delete_budget<C>(db: &C, budget_id: i64) -> Result<()>
where
    C: ConnectionTrait,
{
    let result = Budget::delete_by_id(budget_id).exec(db).await?;
    if result.rows_affected == 0 {
        return Err(Error::BudgetNotFound { id: budget_id });
    }
    Ok(())
}

/// Outcome of an expiry sweep
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpiryReport {
    /// Budgets moved to `expired`
    pub expired: Vec<i64>,
    /// Budgets that left `pending` between the scan and the write
    pub skipped: Vec<i64>,
    /// Budgets whose write failed, with the error message
    pub failed: Vec<(i64, String)>,
}

async fn expire_one<C>(db: &C, budget_id: i64, now: DateTime<Utc>) -> Result<bool>
where
    C: ConnectionTrait,
{
    let result = Budget::update_many()
        .col_expr(budget::Column::Status, Expr::value(BudgetStatus::Expired))
        .filter(budget::Column::Id.eq(budget_id))
        .filter(budget::Column::Status.eq(BudgetStatus::Pending))
        .filter(budget::Column::ExpiresAt.lt(now))
        .exec(db)
        .await?;
    Ok(result.rows_affected > 0)
}

/// Moves every pending budget whose `expires_at` is before `now` to `expired`.
///
/// This is an explicit sweep; nothing schedules it. Each budget is written on its own, so
/// one failing write is logged and recorded while the rest of the sweep carries on.
///
/// # Errors
/// Only the initial scan for overdue budgets fails the call.
#[instrument(skip(db))]
pub async fn expire_overdue_budgets<C>(db: &C, now: DateTime<Utc>) -> Result<ExpiryReport>
where
    C: ConnectionTrait,
{
    let overdue = Budget::find()
        .filter(budget::Column::Status.eq(BudgetStatus::Pending))
        .filter(budget::Column::ExpiresAt.lt(now))
        .order_by_asc(budget::Column::Id)
        .all(db)
        .await?;

    let mut report = ExpiryReport::default();
    for budget in overdue {
        match expire_one(db, budget.id, now).await {
            Ok(true) => report.expired.push(budget.id),
            Ok(false) => {
                debug!("Budget {} is no longer pending, leaving it", budget.id);
                report.skipped.push(budget.id);
            }
            Err(e) => {
                warn!("Expiring budget {} failed: {}", budget.id, e);
                report.failed.push((budget.id, e.to_string()));
            }
        }
    }

    info!(
        "Expired {} overdue budgets ({} skipped, {} failed)",
        report.expired.len(),
        report.skipped.len(),
        report.failed.len()
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::pricing::{quote_line, summarize, switch_price_type};
    use crate::test_utils::*;
    use rust_decimal_macros::dec;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult, RuntimeErr};

    #[tokio::test]
    async fn test_create_and_read_budget() -> Result<()> {
        let (db, customer, mug, cap) = setup_with_products().await?;
        let image = create_test_image(&db, "taza").await?;
        crate::core::product::update_product(
            &db,
            mug.id,
            crate::core::product::ProductPatch {
                image_ids: Some(vec![image.id]),
                ..Default::default()
            },
        )
        .await?;

        let created = create_test_budget(&db, &customer, &mug, &cap).await?;

        assert_eq!(created.header.status, BudgetStatus::Pending);
        assert_eq!(created.header.customer_name.as_deref(), Some("Ana Pérez"));
        assert_eq!(created.header.total_amount, dec!(45.00));
        assert!(created.header.expires_at.is_some());
        assert!(created.header.approved_at.is_none());
        assert_eq!(created.items.len(), 2);

        let first = &created.items[0];
        assert_eq!(first.product_id, mug.id);
        assert_eq!(first.quantity, 2);
        assert_eq!(first.price, dec!(10.00));
        assert_eq!(first.amount, dec!(20.00));
        assert_eq!(first.product_name.as_deref(), Some("Taza"));
        assert_eq!(first.image_url.as_deref(), Some(image.url.as_str()));
        assert!(created.items[1].image_url.is_none());

        let read = get_budget_by_id(&db, created.header.id).await?.unwrap();
        assert_eq!(read, created);
        Ok(())
    }

    #[tokio::test]
    async fn test_budget_without_items_reads_empty_list() -> Result<()> {
        let db = setup_test_db().await?;
        let created = create_budget(
            &db,
            &Settings::default(),
            test_budget_draft(None, PriceType::Retail, &[]),
        )
        .await?;

        assert!(created.items.is_empty());
        assert_eq!(created.header.total_amount, Decimal::ZERO);
        assert!(created.header.customer_name.is_none());

        let read = get_budget_by_id(&db, created.header.id).await?.unwrap();
        assert!(read.items.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_budget_is_none() -> Result<()> {
        let db = setup_test_db().await?;
        assert!(get_budget_by_id(&db, 77).await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_default_expiry_uses_settings() -> Result<()> {
        let db = setup_test_db().await?;
        let settings = Settings {
            budget_validity_days: 30,
            ..Settings::default()
        };
        let created = create_budget(&db, &settings, test_budget_draft(None, PriceType::Retail, &[]))
            .await?;

        let header = created.header;
        let validity = header.expires_at.unwrap() - header.created_at;
        assert_eq!(validity.num_days(), 30);
        Ok(())
    }

    #[tokio::test]
    async fn test_update_replaces_all_items() -> Result<()> {
        let (db, customer, mug, cap) = setup_with_products().await?;
        let created = create_test_budget(&db, &customer, &mug, &cap).await?;
        let old_ids: Vec<i64> = created.items.iter().map(|i| i.id).collect();

        // Keep only the cap, now 4 units
        let draft = test_budget_draft(Some(customer.id), PriceType::Retail, &[(&cap, 4)]);
        let updated = update_budget(&db, created.header.id, draft).await?;

        assert_eq!(updated.items.len(), 1);
        assert_eq!(updated.items[0].product_id, cap.id);
        assert_eq!(updated.items[0].amount, dec!(100.00));
        assert_eq!(updated.header.total_amount, dec!(100.00));
        assert!(!old_ids.contains(&updated.items[0].id));
        assert_eq!(updated.header.expires_at, created.header.expires_at);
        Ok(())
    }

    #[tokio::test]
    async fn test_update_price_type_with_recomputed_lines() -> Result<()> {
        let (db, customer, mug, cap) = setup_with_products().await?;
        let created = create_test_budget(&db, &customer, &mug, &cap).await?;

        let mut items: Vec<LineItemInput> = created.items.iter().map(LineView::to_input).collect();
        switch_price_type(&mut items, PriceType::Wholesale);
        let draft = BudgetDraft {
            customer_id: Some(customer.id),
            responsible_id: None,
            price_type: PriceType::Wholesale,
            observation: Some("Precio mayorista".to_string()),
            total_amount: summarize(&items),
            expires_at: None,
            items,
        };
        let updated = update_budget(&db, created.header.id, draft).await?;

        assert_eq!(updated.header.price_type, PriceType::Wholesale);
        assert_eq!(updated.header.total_amount, dec!(36.00));
        assert_eq!(updated.items[0].price, dec!(8.00));
        assert_eq!(updated.items[1].price, dec!(20.00));
        Ok(())
    }

    #[tokio::test]
    async fn test_update_missing_budget() -> Result<()> {
        let db = setup_test_db().await?;
        let result =
            update_budget(&db, 5, test_budget_draft(None, PriceType::Retail, &[])).await;
        assert!(matches!(result, Err(Error::BudgetNotFound { id: 5 })));
        Ok(())
    }

    #[tokio::test]
    async fn test_create_rejects_non_positive_quantity() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();
        let (_, _, mug, _) = setup_with_products().await?;
        let mut line = quote_line(&mug, 1, PriceType::Retail);
        line.quantity = 0;

        let draft = BudgetDraft {
            customer_id: None,
            responsible_id: None,
            price_type: PriceType::Retail,
            observation: None,
            total_amount: Decimal::ZERO,
            expires_at: None,
            items: vec![line],
        };
        let result = create_budget(&db, &Settings::default(), draft).await;
        assert!(matches!(result, Err(Error::Validation { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_inconsistent_total_is_stored_as_supplied() -> Result<()> {
        let (db, customer, mug, _) = setup_with_products().await?;
        let mut draft = test_budget_draft(Some(customer.id), PriceType::Retail, &[(&mug, 1)]);
        draft.total_amount = dec!(99.99);

        let created = create_budget(&db, &Settings::default(), draft).await?;
        assert_eq!(created.header.total_amount, dec!(99.99));
        Ok(())
    }

    #[tokio::test]
    async fn test_approve_stamps_approved_at_only() -> Result<()> {
        let (db, customer, mug, cap) = setup_with_products().await?;
        let created = create_test_budget(&db, &customer, &mug, &cap).await?;

        let approved = update_budget_status(&db, created.header.id, BudgetStatus::Approved).await?;
        assert_eq!(approved.status, BudgetStatus::Approved);
        assert!(approved.approved_at.is_some());
        assert!(approved.rejected_at.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_reject_stamps_rejected_at_only() -> Result<()> {
        let (db, customer, mug, cap) = setup_with_products().await?;
        let created = create_test_budget(&db, &customer, &mug, &cap).await?;

        let rejected = update_budget_status(&db, created.header.id, BudgetStatus::Rejected).await?;
        assert_eq!(rejected.status, BudgetStatus::Rejected);
        assert!(rejected.rejected_at.is_some());
        assert!(rejected.approved_at.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_terminal_states_reject_transitions() -> Result<()> {
        let (db, customer, mug, cap) = setup_with_products().await?;
        let created = create_test_budget(&db, &customer, &mug, &cap).await?;
        let id = created.header.id;

        update_budget_status(&db, id, BudgetStatus::Approved).await?;

        let back = update_budget_status(&db, id, BudgetStatus::Pending).await;
        assert!(matches!(
            back,
            Err(Error::InvalidStatusTransition { ref from, ref to }) if from == "approved" && to == "pending"
        ));
        let reject = update_budget_status(&db, id, BudgetStatus::Rejected).await;
        assert!(matches!(reject, Err(Error::InvalidStatusTransition { .. })));

        let stored = get_budget_by_id(&db, id).await?.unwrap();
        assert_eq!(stored.header.status, BudgetStatus::Approved);
        assert!(stored.header.rejected_at.is_none());
        Ok(())
    }

    #[test]
    fn test_transition_table() {
        use BudgetStatus::{Approved, Expired, Pending, Rejected};
        assert!(Pending.can_transition_to(Approved));
        assert!(Pending.can_transition_to(Rejected));
        assert!(Pending.can_transition_to(Expired));
        assert!(!Pending.can_transition_to(Pending));
        for terminal in [Approved, Rejected, Expired] {
            assert!(terminal.is_terminal());
            for next in [Pending, Approved, Rejected, Expired] {
                assert!(!terminal.can_transition_to(next));
            }
        }
    }

    #[tokio::test]
    async fn test_status_on_missing_budget() -> Result<()> {
        let db = setup_test_db().await?;
        let result = update_budget_status(&db, 9, BudgetStatus::Approved).await;
        assert!(matches!(result, Err(Error::BudgetNotFound { id: 9 })));
        Ok(())
    }

    #[tokio::test]
    async fn test_mark_as_read_and_unread_count() -> Result<()> {
        let (db, customer, mug, cap) = setup_with_products().await?;
        let a = create_test_budget(&db, &customer, &mug, &cap).await?;
        create_test_budget(&db, &customer, &mug, &cap).await?;
        assert_eq!(count_unread_budgets(&db).await?, 2);

        mark_budget_as_read(&db, a.header.id).await?;
        assert_eq!(count_unread_budgets(&db).await?, 1);
        assert!(get_budget_by_id(&db, a.header.id).await?.unwrap().header.is_read);

        assert!(matches!(
            mark_budget_as_read(&db, 404).await,
            Err(Error::BudgetNotFound { .. })
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_list_budgets_by_status() -> Result<()> {
        let (db, customer, mug, cap) = setup_with_products().await?;
        let a = create_test_budget(&db, &customer, &mug, &cap).await?;
        let b = create_test_budget(&db, &customer, &mug, &cap).await?;
        update_budget_status(&db, a.header.id, BudgetStatus::Rejected).await?;

        let all = list_budgets(&db, None).await?;
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, b.header.id);

        let pending = list_budgets(&db, Some(BudgetStatus::Pending)).await?;
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, b.header.id);
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_budget_removes_items() -> Result<()> {
        let (db, customer, mug, cap) = setup_with_products().await?;
        let created = create_test_budget(&db, &customer, &mug, &cap).await?;

        delete_budget(&db, created.header.id).await?;
        assert!(get_budget_by_id(&db, created.header.id).await?.is_none());
        let orphans = BudgetItem::find()
            .filter(budget_item::Column::BudgetId.eq(created.header.id))
            .count(&db)
            .await?;
        assert_eq!(orphans, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_expire_overdue_budgets() -> Result<()> {
        let (db, customer, mug, cap) = setup_with_products().await?;
        let now = Utc::now();

        let mut overdue = test_budget_draft(Some(customer.id), PriceType::Retail, &[(&mug, 1)]);
        overdue.expires_at = Some(now - Duration::days(1));
        let overdue = create_budget(&db, &Settings::default(), overdue).await?;

        let mut approved = test_budget_draft(Some(customer.id), PriceType::Retail, &[(&cap, 1)]);
        approved.expires_at = Some(now - Duration::days(1));
        let approved = create_budget(&db, &Settings::default(), approved).await?;
        update_budget_status(&db, approved.header.id, BudgetStatus::Approved).await?;

        let current = create_test_budget(&db, &customer, &mug, &cap).await?;

        let report = expire_overdue_budgets(&db, now).await?;
        assert_eq!(report.expired, vec![overdue.header.id]);
        assert!(report.skipped.is_empty());
        assert!(report.failed.is_empty());

        for (id, status) in [
            (overdue.header.id, BudgetStatus::Expired),
            (approved.header.id, BudgetStatus::Approved),
            (current.header.id, BudgetStatus::Pending),
        ] {
            assert_eq!(get_budget_by_id(&db, id).await?.unwrap().header.status, status);
        }

        // A second sweep finds nothing
        assert_eq!(expire_overdue_budgets(&db, now).await?, ExpiryReport::default());
        Ok(())
    }

    fn overdue_row(id: i64, now: DateTime<Utc>) -> budget::Model {
        budget::Model {
            id,
            customer_id: None,
            responsible_id: None,
            price_type: PriceType::Retail,
            observation: None,
            total_amount: dec!(10.00),
            status: BudgetStatus::Pending,
            expires_at: Some(now - Duration::days(1)),
            approved_at: None,
            rejected_at: None,
            is_read: false,
            created_at: now - Duration::days(20),
        }
    }

    #[tokio::test]
    async fn test_expiry_sweep_continues_past_failed_write() -> Result<()> {
        let now = Utc::now();
        let db = MockDatabase::new(DatabaseBackend::Sqlite)
            .append_query_results([vec![overdue_row(1, now), overdue_row(2, now), overdue_row(3, now)]])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .append_exec_errors([DbErr::Exec(RuntimeErr::Internal("database is locked".to_string()))])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            }])
            .into_connection();

        let report = expire_overdue_budgets(&db, now).await?;

        assert_eq!(report.expired, vec![1]);
        assert_eq!(report.skipped, vec![3]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, 2);
        assert!(report.failed[0].1.contains("database is locked"));

        // One scan plus one write per budget
        assert_eq!(db.into_transaction_log().len(), 4);
        Ok(())
    }
}
