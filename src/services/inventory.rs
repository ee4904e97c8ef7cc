//! Stock ledger service
//!
//! Applies quantity deltas to products. Every mutation runs in its own
//! database transaction that locks the product row, writes the new quantity
//! together with an append-only ledger entry, and re-evaluates alert state
//! before committing. Bulk updates apply each item independently so one
//! item's failure never blocks its siblings.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::events::{EventPublisher, StockEvent};
use crate::middleware::AuthUser;
use crate::models::{Product, StockChangeKind};
use crate::services::alerts::{AlertService, AlertTransition};
use crate::services::authorization::AuthorizationService;

/// Stock ledger service
#[derive(Clone)]
pub struct InventoryService {
    db: PgPool,
    authz: AuthorizationService,
    alerts: AlertService,
    publisher: Arc<dyn EventPublisher>,
}

/// One requested stock change
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdateStockInput {
    pub product_id: Uuid,
    pub change_kind: StockChangeKind,
    /// Magnitude of the change. Sign is ignored for `restock`, `sale` and
    /// `return`; `adjustment` keeps it.
    pub quantity: i32,
    #[validate(length(max = 500, message = "must be at most 500 characters"))]
    pub reason: Option<String>,
    #[validate(length(max = 100, message = "must be at most 100 characters"))]
    pub reference_number: Option<String>,
}

/// A batch of stock changes
#[derive(Debug, Deserialize, Validate)]
pub struct BulkUpdateInput {
    #[validate(length(min = 1, max = 100, message = "must contain between 1 and 100 updates"))]
    pub updates: Vec<UpdateStockInput>,
}

/// Result of one committed stock change
#[derive(Debug, Clone, Serialize)]
pub struct StockUpdate {
    pub product_id: Uuid,
    pub product_name: String,
    pub sku: String,
    pub change_kind: StockChangeKind,
    pub quantity_before: i32,
    pub quantity_after: i32,
    /// The net change actually applied (`after - before`); for `sale` this is
    /// negative even though the caller sent a positive magnitude.
    pub quantity_changed: i32,
}

/// A committed item of a bulk update
#[derive(Debug, Serialize)]
pub struct AppliedUpdate {
    pub index: usize,
    #[serde(flatten)]
    pub update: StockUpdate,
}

/// A rejected item of a bulk update
#[derive(Debug, Serialize)]
pub struct RejectedUpdate {
    pub index: usize,
    pub product_id: Uuid,
    pub code: String,
    pub message: String,
}

impl RejectedUpdate {
    /// Map an item's failure onto the same code and public message the
    /// single-update envelope would carry for it.
    pub fn from_error(index: usize, product_id: Uuid, err: &AppError) -> Self {
        Self {
            index,
            product_id,
            code: err.code().to_string(),
            message: err.public_message(),
        }
    }
}

/// Itemized outcome of a bulk update
#[derive(Debug, Serialize)]
pub struct BulkUpdateOutcome {
    pub applied: Vec<AppliedUpdate>,
    pub rejected: Vec<RejectedUpdate>,
}

impl BulkUpdateOutcome {
    /// True when no item committed. A batch that commits nothing answers
    /// 400 with the itemized rejections instead of 200.
    pub fn all_failed(&self) -> bool {
        self.applied.is_empty()
    }
}

/// Ledger entry joined with product and user names for listings
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct InventoryLogView {
    pub id: Uuid,
    pub product_id: Uuid,
    pub user_id: Uuid,
    pub change_kind: StockChangeKind,
    pub quantity_delta: i32,
    pub quantity_before: i32,
    pub quantity_after: i32,
    pub reason: Option<String>,
    pub reference_number: Option<String>,
    pub created_at: DateTime<Utc>,
    pub product_name: String,
    pub sku: String,
    pub user_name: String,
}

/// Aggregate figures for the summary endpoint
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct InventoryStats {
    pub total_products: i64,
    pub active_products: i64,
    pub low_stock_products: i64,
    pub out_of_stock_products: i64,
    pub total_inventory_value: Decimal,
}

/// Inventory summary for a department scope
#[derive(Debug, Serialize)]
pub struct InventorySummary {
    pub stats: InventoryStats,
    pub recent_movements: Vec<InventoryLogView>,
    pub low_stock_products: Vec<Product>,
}

/// Row read under the exclusive product lock
#[derive(Debug, FromRow)]
struct LockedProduct {
    name: String,
    sku: String,
    quantity_in_stock: i32,
    is_active: bool,
}

/// Compute the post-update quantity for a change, or reject it.
///
/// `restock` and `return` always add `|quantity|`, `sale` always subtracts
/// it, and `adjustment` applies the signed value. Any result below zero is an
/// insufficient-stock error, for every change kind. Arithmetic runs in `i64`
/// so `|i32::MIN|` and large sums cannot overflow; a result above `i32::MAX`
/// is a validation error.
pub fn compute_new_quantity(
    kind: StockChangeKind,
    current: i32,
    quantity: i32,
) -> AppResult<i32> {
    let magnitude = i64::from(quantity);
    let delta = match kind {
        StockChangeKind::Restock | StockChangeKind::Return => magnitude.abs(),
        StockChangeKind::Sale => -magnitude.abs(),
        StockChangeKind::Adjustment => magnitude,
    };

    let after = i64::from(current) + delta;
    if after < 0 {
        return Err(AppError::InsufficientStock {
            current,
            requested: quantity,
        });
    }

    i32::try_from(after).map_err(|_| AppError::Validation {
        field: "quantity".to_string(),
        message: "resulting quantity exceeds the supported range".to_string(),
    })
}

impl InventoryService {
    pub fn new(db: PgPool, publisher: Arc<dyn EventPublisher>) -> Self {
        Self {
            authz: AuthorizationService::new(db.clone()),
            alerts: AlertService::new(db.clone()),
            db,
            publisher,
        }
    }

    /// Apply one stock change.
    ///
    /// Authorization is checked before the transaction opens. The alert
    /// engine runs as the transaction's last statement, so quantity, ledger
    /// entry and alert state commit atomically.
    pub async fn update_stock(
        &self,
        actor: &AuthUser,
        input: UpdateStockInput,
    ) -> AppResult<StockUpdate> {
        input.validate()?;
        self.authz.ensure_can_modify(actor, input.product_id).await?;

        let mut tx = self.db.begin().await?;
        let update = self.apply(&mut tx, actor, &input).await?;
        let transition = self.alerts.evaluate(&mut *tx, input.product_id).await?;
        tx.commit().await?;

        self.publish_update(actor, &update);
        self.publish_transition(transition);

        Ok(update)
    }

    /// Apply a batch of stock changes, one transaction per item.
    ///
    /// Items that fail authorization, validation, lookup or the stock guard
    /// are reported in `rejected` without affecting their siblings; committed
    /// items stay committed even when later items fail. Alert state is
    /// re-evaluated once per product that received a committed change, after
    /// all items are processed.
    pub async fn bulk_update(
        &self,
        actor: &AuthUser,
        input: BulkUpdateInput,
    ) -> AppResult<BulkUpdateOutcome> {
        input.validate()?;

        let mut applied = Vec::new();
        let mut rejected = Vec::new();

        for (index, item) in input.updates.into_iter().enumerate() {
            match self.apply_item(actor, &item).await {
                Ok(update) => {
                    self.publish_update(actor, &update);
                    applied.push(AppliedUpdate { index, update });
                }
                Err(err) => {
                    rejected.push(RejectedUpdate::from_error(index, item.product_id, &err))
                }
            }
        }

        // One evaluation per product with a committed change. The updates are
        // already durable here, so an evaluation failure is logged rather
        // than turned into a call-level error.
        let mut seen = HashSet::new();
        for entry in &applied {
            let product_id = entry.update.product_id;
            if !seen.insert(product_id) {
                continue;
            }
            match self.alerts.evaluate_product(product_id).await {
                Ok(transition) => self.publish_transition(transition),
                Err(err) => {
                    tracing::warn!(%product_id, "alert evaluation after bulk update failed: {}", err)
                }
            }
        }

        Ok(BulkUpdateOutcome { applied, rejected })
    }

    /// One bulk item: authorization check, then its own ledger transaction.
    async fn apply_item(&self, actor: &AuthUser, item: &UpdateStockInput) -> AppResult<StockUpdate> {
        item.validate()?;
        self.authz.ensure_can_modify(actor, item.product_id).await?;

        let mut tx = self.db.begin().await?;
        let update = self.apply(&mut tx, actor, item).await?;
        tx.commit().await?;
        Ok(update)
    }

    /// The guarded transition: lock the product row, compute the new
    /// quantity, persist it and append the ledger entry. Any error here
    /// rolls the transaction back untouched.
    async fn apply(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        actor: &AuthUser,
        input: &UpdateStockInput,
    ) -> AppResult<StockUpdate> {
        let product = sqlx::query_as::<_, LockedProduct>(
            r#"
            SELECT name, sku, quantity_in_stock, is_active
            FROM products
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(input.product_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

        if !product.is_active {
            return Err(AppError::NotFound("Product".to_string()));
        }

        let quantity_before = product.quantity_in_stock;
        let quantity_after =
            compute_new_quantity(input.change_kind, quantity_before, input.quantity)?;
        let quantity_changed = quantity_after - quantity_before;

        sqlx::query("UPDATE products SET quantity_in_stock = $1, updated_at = NOW() WHERE id = $2")
            .bind(quantity_after)
            .bind(input.product_id)
            .execute(&mut **tx)
            .await?;

        sqlx::query(
            r#"
            INSERT INTO inventory_logs (
                product_id, user_id, change_kind, quantity_delta,
                quantity_before, quantity_after, reason, reference_number
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(input.product_id)
        .bind(actor.user_id)
        .bind(input.change_kind)
        .bind(quantity_changed)
        .bind(quantity_before)
        .bind(quantity_after)
        .bind(&input.reason)
        .bind(&input.reference_number)
        .execute(&mut **tx)
        .await?;

        Ok(StockUpdate {
            product_id: input.product_id,
            product_name: product.name,
            sku: product.sku,
            change_kind: input.change_kind,
            quantity_before,
            quantity_after,
            quantity_changed,
        })
    }

    /// List ledger entries across all products, newest first.
    pub async fn list_logs(&self, limit: i64, offset: i64) -> AppResult<Vec<InventoryLogView>> {
        let logs = sqlx::query_as::<_, InventoryLogView>(
            r#"
            SELECT il.id, il.product_id, il.user_id, il.change_kind, il.quantity_delta,
                   il.quantity_before, il.quantity_after, il.reason, il.reference_number,
                   il.created_at, p.name AS product_name, p.sku, u.name AS user_name
            FROM inventory_logs il
            JOIN products p ON p.id = il.product_id
            JOIN users u ON u.id = il.user_id
            ORDER BY il.created_at DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.db)
        .await?;

        Ok(logs)
    }

    /// List ledger entries for one product, newest first.
    pub async fn product_logs(
        &self,
        product_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> AppResult<Vec<InventoryLogView>> {
        let product_exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM products WHERE id = $1)")
                .bind(product_id)
                .fetch_one(&self.db)
                .await?;

        if !product_exists {
            return Err(AppError::NotFound("Product".to_string()));
        }

        let logs = sqlx::query_as::<_, InventoryLogView>(
            r#"
            SELECT il.id, il.product_id, il.user_id, il.change_kind, il.quantity_delta,
                   il.quantity_before, il.quantity_after, il.reason, il.reference_number,
                   il.created_at, p.name AS product_name, p.sku, u.name AS user_name
            FROM inventory_logs il
            JOIN products p ON p.id = il.product_id
            JOIN users u ON u.id = il.user_id
            WHERE il.product_id = $1
            ORDER BY il.created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(product_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.db)
        .await?;

        Ok(logs)
    }

    /// Active products at or below their threshold, lowest headroom first.
    pub async fn low_stock_products(
        &self,
        department_id: Option<Uuid>,
    ) -> AppResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, sku, description, price, quantity_in_stock,
                   minimum_stock_level, department_id, is_active, created_at, updated_at
            FROM products
            WHERE is_active = TRUE
              AND minimum_stock_level > 0
              AND quantity_in_stock <= minimum_stock_level
              AND ($1::uuid IS NULL OR department_id = $1)
            ORDER BY (quantity_in_stock::float / NULLIF(minimum_stock_level, 0)) ASC
            "#,
        )
        .bind(department_id)
        .fetch_all(&self.db)
        .await?;

        Ok(products)
    }

    /// Inventory summary: aggregate stats, recent movements and the worst
    /// low-stock products, optionally scoped to one department.
    pub async fn summary(&self, department_id: Option<Uuid>) -> AppResult<InventorySummary> {
        let stats = sqlx::query_as::<_, InventoryStats>(
            r#"
            SELECT COUNT(*) AS total_products,
                   COUNT(*) FILTER (WHERE is_active) AS active_products,
                   COUNT(*) FILTER (
                       WHERE is_active AND minimum_stock_level > 0
                         AND quantity_in_stock <= minimum_stock_level
                   ) AS low_stock_products,
                   COUNT(*) FILTER (WHERE is_active AND quantity_in_stock = 0)
                       AS out_of_stock_products,
                   COALESCE(SUM(CASE WHEN is_active THEN quantity_in_stock * price ELSE 0 END), 0)
                       AS total_inventory_value
            FROM products
            WHERE $1::uuid IS NULL OR department_id = $1
            "#,
        )
        .bind(department_id)
        .fetch_one(&self.db)
        .await?;

        let recent_movements = sqlx::query_as::<_, InventoryLogView>(
            r#"
            SELECT il.id, il.product_id, il.user_id, il.change_kind, il.quantity_delta,
                   il.quantity_before, il.quantity_after, il.reason, il.reference_number,
                   il.created_at, p.name AS product_name, p.sku, u.name AS user_name
            FROM inventory_logs il
            JOIN products p ON p.id = il.product_id
            JOIN users u ON u.id = il.user_id
            WHERE $1::uuid IS NULL OR p.department_id = $1
            ORDER BY il.created_at DESC
            LIMIT 10
            "#,
        )
        .bind(department_id)
        .fetch_all(&self.db)
        .await?;

        let mut low_stock = self.low_stock_products(department_id).await?;
        low_stock.truncate(10);

        Ok(InventorySummary {
            stats,
            recent_movements,
            low_stock_products: low_stock,
        })
    }

    fn publish_update(&self, actor: &AuthUser, update: &StockUpdate) {
        self.publisher.publish(StockEvent::InventoryUpdated {
            product_id: update.product_id,
            product_name: update.product_name.clone(),
            sku: update.sku.clone(),
            change_kind: update.change_kind,
            quantity_before: update.quantity_before,
            quantity_after: update.quantity_after,
            quantity_changed: update.quantity_changed,
            updated_by: actor.user_id,
        });
    }

    fn publish_transition(&self, transition: Option<AlertTransition>) {
        match transition {
            Some(AlertTransition::Raised(alert)) => self.publisher.publish(StockEvent::AlertRaised {
                alert_id: alert.id,
                product_id: alert.product_id,
                message: alert.message,
            }),
            Some(AlertTransition::Cleared { product_id }) => {
                self.publisher.publish(StockEvent::AlertCleared { product_id })
            }
            None => {}
        }
    }
}
