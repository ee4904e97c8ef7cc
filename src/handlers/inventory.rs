//! HTTP handlers for inventory management endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::models::{Product, StockAlert};
use crate::services::alerts::AlertView;
use crate::services::authorization::scope_department;
use crate::services::inventory::{
    BulkUpdateInput, InventoryLogView, InventorySummary, StockUpdate, UpdateStockInput,
};
use crate::services::{AlertService, InventoryService};
use crate::AppState;

fn default_limit() -> i64 {
    50
}

const MAX_PAGE_SIZE: i64 = 200;

/// Clamp caller-supplied pagination. Negative values must not reach the SQL
/// `LIMIT`/`OFFSET` clauses, where they are a runtime error.
fn clamp_page(limit: i64, offset: i64) -> (i64, i64) {
    (limit.clamp(0, MAX_PAGE_SIZE), offset.max(0))
}

/// Pagination query parameters for log listings
#[derive(Debug, Deserialize)]
pub struct LogQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

impl LogQuery {
    pub fn page(&self) -> (i64, i64) {
        clamp_page(self.limit, self.offset)
    }
}

/// Query parameters for alert listings
#[derive(Debug, Deserialize)]
pub struct AlertQuery {
    #[serde(default)]
    pub unacknowledged_only: bool,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

impl AlertQuery {
    pub fn page(&self) -> (i64, i64) {
        clamp_page(self.limit, self.offset)
    }
}

/// Query parameters for department-scoped listings
#[derive(Debug, Deserialize)]
pub struct ScopeQuery {
    pub department_id: Option<Uuid>,
}

/// Apply a single stock change
pub async fn update_stock(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<UpdateStockInput>,
) -> AppResult<Json<StockUpdate>> {
    let service = InventoryService::new(state.db, state.publisher.clone());
    let update = service.update_stock(&current_user.0, input).await?;
    Ok(Json(update))
}

/// Apply a batch of stock changes.
///
/// Returns 200 with the itemized outcome when at least one item committed,
/// 400 with the same shape when every item failed.
pub async fn bulk_update_stock(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<BulkUpdateInput>,
) -> AppResult<Response> {
    let service = InventoryService::new(state.db, state.publisher.clone());
    let outcome = service.bulk_update(&current_user.0, input).await?;

    let status = if outcome.all_failed() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::OK
    };

    Ok((status, Json(outcome)).into_response())
}

/// List ledger entries across all products
pub async fn list_logs(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(query): Query<LogQuery>,
) -> AppResult<Json<Vec<InventoryLogView>>> {
    let (limit, offset) = query.page();
    let service = InventoryService::new(state.db, state.publisher.clone());
    let logs = service.list_logs(limit, offset).await?;
    Ok(Json(logs))
}

/// List ledger entries for one product
pub async fn get_product_logs(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(product_id): Path<Uuid>,
    Query(query): Query<LogQuery>,
) -> AppResult<Json<Vec<InventoryLogView>>> {
    let (limit, offset) = query.page();
    let service = InventoryService::new(state.db, state.publisher.clone());
    let logs = service.product_logs(product_id, limit, offset).await?;
    Ok(Json(logs))
}

/// List stock alerts
pub async fn list_alerts(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(query): Query<AlertQuery>,
) -> AppResult<Json<Vec<AlertView>>> {
    let (limit, offset) = query.page();
    let service = AlertService::new(state.db);
    let alerts = service
        .list(query.unacknowledged_only, limit, offset)
        .await?;
    Ok(Json(alerts))
}

/// Acknowledge a stock alert
pub async fn acknowledge_alert(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(alert_id): Path<Uuid>,
) -> AppResult<Json<StockAlert>> {
    let service = AlertService::new(state.db);
    let alert = service.acknowledge(alert_id).await?;
    Ok(Json(alert))
}

/// List products at or below their low-stock threshold
pub async fn list_low_stock(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<ScopeQuery>,
) -> AppResult<Json<Vec<Product>>> {
    let scope = scope_department(&current_user.0, query.department_id)?;
    let service = InventoryService::new(state.db, state.publisher.clone());
    let products = service.low_stock_products(scope).await?;
    Ok(Json(products))
}

/// Inventory summary statistics
pub async fn get_inventory_summary(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<ScopeQuery>,
) -> AppResult<Json<InventorySummary>> {
    let scope = scope_department(&current_user.0, query.department_id)?;
    let service = InventoryService::new(state.db, state.publisher.clone());
    let summary = service.summary(scope).await?;
    Ok(Json(summary))
}
