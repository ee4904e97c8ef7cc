//! Stock ledger and alert models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Kinds of stock change the ledger accepts.
///
/// `restock` and `return` are always additive and `sale` always subtractive,
/// regardless of the sign the caller sends; `adjustment` keeps the sign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "stock_change_kind", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum StockChangeKind {
    Restock,
    Sale,
    Adjustment,
    Return,
}

/// A low-stock alert.
///
/// At most one unacknowledged alert exists per product at any time, enforced
/// by a partial unique index on `(product_id) WHERE NOT acknowledged`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct StockAlert {
    pub id: Uuid,
    pub product_id: Uuid,
    pub message: String,
    pub acknowledged: bool,
    pub created_at: DateTime<Utc>,
    pub acknowledged_at: Option<DateTime<Utc>>,
}
