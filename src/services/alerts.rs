//! Low-stock alert engine
//!
//! Derives alert state from a product's current quantity. Evaluation is
//! idempotent and safe under concurrent callers: the open-alert upsert is
//! keyed on the partial unique index over `(product_id) WHERE NOT
//! acknowledged`, so a product can never hold two open alerts.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgConnection, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::StockAlert;

/// Alert engine and alert queries
#[derive(Clone)]
pub struct AlertService {
    db: PgPool,
}

/// Outcome of one evaluation, reported only when alert state actually
/// changed. Lets the caller publish events for real transitions and stay
/// quiet on no-ops.
#[derive(Debug, Clone)]
pub enum AlertTransition {
    Raised(StockAlert),
    Cleared { product_id: Uuid },
}

/// Alert listing row joined with product details
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct AlertView {
    pub id: Uuid,
    pub product_id: Uuid,
    pub message: String,
    pub acknowledged: bool,
    pub created_at: DateTime<Utc>,
    pub acknowledged_at: Option<DateTime<Utc>>,
    pub product_name: String,
    pub sku: String,
    pub quantity_in_stock: i32,
    pub minimum_stock_level: i32,
}

#[derive(Debug, FromRow)]
struct ProductState {
    name: String,
    sku: String,
    quantity_in_stock: i32,
    minimum_stock_level: i32,
    is_active: bool,
}

/// Whether a product in this state must carry an open alert.
/// A threshold of 0 disables alerting; inactive products never alert.
pub fn should_alert(quantity: i32, threshold: i32, is_active: bool) -> bool {
    is_active && threshold > 0 && quantity <= threshold
}

/// Message stored on a newly raised alert.
pub fn alert_message(name: &str, sku: &str, quantity: i32, threshold: i32) -> String {
    format!(
        "Low stock alert: {} (SKU: {}) has {} units remaining (threshold: {})",
        name, sku, quantity, threshold
    )
}

impl AlertService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Re-evaluate alert state for a product on a pooled connection.
    pub async fn evaluate_product(&self, product_id: Uuid) -> AppResult<Option<AlertTransition>> {
        let mut conn = self.db.acquire().await?;
        self.evaluate(&mut *conn, product_id).await
    }

    /// Re-evaluate alert state for a product.
    ///
    /// Takes a connection so the stock ledger can run this as the last
    /// statement of its own transaction. Ensures exactly one open alert when
    /// the product is low, and none otherwise.
    pub async fn evaluate(
        &self,
        conn: &mut PgConnection,
        product_id: Uuid,
    ) -> AppResult<Option<AlertTransition>> {
        let state = sqlx::query_as::<_, ProductState>(
            r#"
            SELECT name, sku, quantity_in_stock, minimum_stock_level, is_active
            FROM products
            WHERE id = $1
            "#,
        )
        .bind(product_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

        if should_alert(
            state.quantity_in_stock,
            state.minimum_stock_level,
            state.is_active,
        ) {
            let message = alert_message(
                &state.name,
                &state.sku,
                state.quantity_in_stock,
                state.minimum_stock_level,
            );

            // No row back means an open alert already existed.
            let raised = sqlx::query_as::<_, StockAlert>(
                r#"
                INSERT INTO stock_alerts (product_id, message)
                VALUES ($1, $2)
                ON CONFLICT (product_id) WHERE acknowledged = FALSE DO NOTHING
                RETURNING id, product_id, message, acknowledged, created_at, acknowledged_at
                "#,
            )
            .bind(product_id)
            .bind(&message)
            .fetch_optional(&mut *conn)
            .await?;

            Ok(raised.map(AlertTransition::Raised))
        } else {
            let cleared =
                sqlx::query("DELETE FROM stock_alerts WHERE product_id = $1 AND acknowledged = FALSE")
                    .bind(product_id)
                    .execute(&mut *conn)
                    .await?;

            if cleared.rows_affected() > 0 {
                Ok(Some(AlertTransition::Cleared { product_id }))
            } else {
                Ok(None)
            }
        }
    }

    /// List alerts, newest first, joined with product details.
    pub async fn list(
        &self,
        unacknowledged_only: bool,
        limit: i64,
        offset: i64,
    ) -> AppResult<Vec<AlertView>> {
        let alerts = sqlx::query_as::<_, AlertView>(
            r#"
            SELECT sa.id, sa.product_id, sa.message, sa.acknowledged, sa.created_at,
                   sa.acknowledged_at, p.name AS product_name, p.sku,
                   p.quantity_in_stock, p.minimum_stock_level
            FROM stock_alerts sa
            JOIN products p ON p.id = sa.product_id
            WHERE ($1 = FALSE OR sa.acknowledged = FALSE)
            ORDER BY sa.created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(unacknowledged_only)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.db)
        .await?;

        Ok(alerts)
    }

    /// Acknowledge an open alert. NotFound if the alert is missing or was
    /// already acknowledged.
    pub async fn acknowledge(&self, alert_id: Uuid) -> AppResult<StockAlert> {
        sqlx::query_as::<_, StockAlert>(
            r#"
            UPDATE stock_alerts
            SET acknowledged = TRUE, acknowledged_at = NOW()
            WHERE id = $1 AND acknowledged = FALSE
            RETURNING id, product_id, message, acknowledged, created_at, acknowledged_at
            "#,
        )
        .bind(alert_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Alert".to_string()))
    }
}
