//! Health check handler

use axum::{extract::State, Json};
use serde::Serialize;

use crate::AppState;

/// Liveness report including database reachability
#[derive(Debug, Serialize)]
pub struct HealthReport {
    pub service: &'static str,
    pub version: &'static str,
    pub status: &'static str,
    pub database: &'static str,
}

impl HealthReport {
    /// The service is healthy only while the ledger's database is reachable;
    /// everything the API does goes through it.
    pub fn from_db_check(db_reachable: bool) -> Self {
        Self {
            service: env!("CARGO_PKG_NAME"),
            version: env!("CARGO_PKG_VERSION"),
            status: if db_reachable { "healthy" } else { "degraded" },
            database: if db_reachable { "connected" } else { "unreachable" },
        }
    }
}

/// Health check endpoint handler, served at both `/health` and
/// `/api/v1/health`.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthReport> {
    let db_reachable = sqlx::query("SELECT 1").execute(&state.db).await.is_ok();
    Json(HealthReport::from_db_check(db_reachable))
}
