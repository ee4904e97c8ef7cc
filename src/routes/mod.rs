//! Route definitions for the StockTrack backend

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};

use crate::{handlers, middleware::auth_middleware, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Health check (public)
        .route("/health", get(handlers::health_check))
        // Protected routes - inventory management
        .nest("/inventory", inventory_routes())
}

/// Inventory management routes (protected)
fn inventory_routes() -> Router<AppState> {
    Router::new()
        // Stock mutations
        .route("/update", post(handlers::update_stock))
        .route("/bulk-update", post(handlers::bulk_update_stock))
        // Ledger listings
        .route("/logs", get(handlers::list_logs))
        .route("/products/:product_id/logs", get(handlers::get_product_logs))
        // Alerts
        .route("/alerts", get(handlers::list_alerts))
        .route(
            "/alerts/:alert_id/acknowledge",
            put(handlers::acknowledge_alert),
        )
        // Reporting
        .route("/low-stock", get(handlers::list_low_stock))
        .route("/summary", get(handlers::get_inventory_summary))
        .route_layer(middleware::from_fn(auth_middleware))
}
