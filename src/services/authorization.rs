//! Department-scoped authorization for stock mutations
//!
//! The single place that decides whether an actor may touch a product's
//! inventory. Checked before any ledger transaction opens; failing it is an
//! authorization error, not a validation error.

use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::AuthUser;
use crate::models::UserRole;

/// Capability check over products and departments
#[derive(Clone)]
pub struct AuthorizationService {
    db: PgPool,
}

/// Decide whether an actor may modify a product's stock.
///
/// Managers may modify any product. Staff may modify a product only when the
/// product has an assigned department matching their own; a product with no
/// department is manager-only.
pub fn can_modify(
    role: UserRole,
    actor_department: Option<Uuid>,
    product_department: Option<Uuid>,
) -> bool {
    match role {
        UserRole::Manager => true,
        UserRole::Staff => match (product_department, actor_department) {
            (Some(product_dept), Some(actor_dept)) => product_dept == actor_dept,
            _ => false,
        },
    }
}

/// Resolve the department a read-only listing is scoped to.
///
/// Staff always see their own department and must belong to one; managers see
/// everything unless they ask for a specific department.
pub fn scope_department(actor: &AuthUser, requested: Option<Uuid>) -> AppResult<Option<Uuid>> {
    match actor.role {
        UserRole::Manager => Ok(requested),
        UserRole::Staff => match actor.department_id {
            Some(dept) => Ok(Some(dept)),
            None => Err(AppError::InsufficientPermissions(
                "Staff must be assigned to a department".to_string(),
            )),
        },
    }
}

impl AuthorizationService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Check that `actor` may modify the given product's stock.
    ///
    /// Returns NotFound for a missing product so the caller reports the same
    /// class of error the ledger would.
    pub async fn ensure_can_modify(&self, actor: &AuthUser, product_id: Uuid) -> AppResult<()> {
        let department_id = sqlx::query_scalar::<_, Option<Uuid>>(
            "SELECT department_id FROM products WHERE id = $1",
        )
        .bind(product_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

        if can_modify(actor.role, actor.department_id, department_id) {
            Ok(())
        } else {
            Err(AppError::InsufficientPermissions(
                "Products can only be modified by users in the same department".to_string(),
            ))
        }
    }
}
