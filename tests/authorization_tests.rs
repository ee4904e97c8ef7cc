//! Authorization gate tests
//!
//! Tests for department-scoped stock modification:
//! - Managers may modify any product
//! - Staff are confined to their own department
//! - Department-less products are manager-only

use proptest::prelude::*;
use uuid::Uuid;

use stocktrack_backend::error::AppError;
use stocktrack_backend::middleware::AuthUser;
use stocktrack_backend::models::UserRole;
use stocktrack_backend::services::authorization::{can_modify, scope_department};

fn staff(department_id: Option<Uuid>) -> AuthUser {
    AuthUser {
        user_id: Uuid::new_v4(),
        role: UserRole::Staff,
        department_id,
    }
}

fn manager() -> AuthUser {
    AuthUser {
        user_id: Uuid::new_v4(),
        role: UserRole::Manager,
        department_id: None,
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    /// Managers may modify any product, with or without a department
    #[test]
    fn test_manager_modifies_anything() {
        let dept = Uuid::new_v4();
        assert!(can_modify(UserRole::Manager, None, None));
        assert!(can_modify(UserRole::Manager, None, Some(dept)));
        assert!(can_modify(UserRole::Manager, Some(dept), Some(Uuid::new_v4())));
    }

    /// Staff may modify products of their own department only
    #[test]
    fn test_staff_own_department_only() {
        let dept = Uuid::new_v4();
        let other = Uuid::new_v4();

        assert!(can_modify(UserRole::Staff, Some(dept), Some(dept)));
        assert!(!can_modify(UserRole::Staff, Some(dept), Some(other)));
    }

    /// A product without a department is manager-only
    #[test]
    fn test_departmentless_product_is_manager_only() {
        let dept = Uuid::new_v4();
        assert!(!can_modify(UserRole::Staff, Some(dept), None));
        assert!(can_modify(UserRole::Manager, None, None));
    }

    /// Staff without a department cannot modify anything
    #[test]
    fn test_departmentless_staff_modifies_nothing() {
        assert!(!can_modify(UserRole::Staff, None, None));
        assert!(!can_modify(UserRole::Staff, None, Some(Uuid::new_v4())));
    }

    /// Managers see everything unless they request a specific department
    #[test]
    fn test_manager_scope_is_open() {
        let requested = Uuid::new_v4();
        assert_eq!(scope_department(&manager(), None).unwrap(), None);
        assert_eq!(
            scope_department(&manager(), Some(requested)).unwrap(),
            Some(requested)
        );
    }

    /// Staff listings are pinned to their own department, ignoring the
    /// requested filter
    #[test]
    fn test_staff_scope_is_own_department() {
        let dept = Uuid::new_v4();
        let requested = Uuid::new_v4();

        assert_eq!(
            scope_department(&staff(Some(dept)), Some(requested)).unwrap(),
            Some(dept)
        );
        assert_eq!(scope_department(&staff(Some(dept)), None).unwrap(), Some(dept));
    }

    /// Department-less staff cannot use scoped listings at all
    #[test]
    fn test_departmentless_staff_scope_rejected() {
        let err = scope_department(&staff(None), None).unwrap_err();
        assert!(matches!(err, AppError::InsufficientPermissions(_)));
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    fn maybe_uuid() -> impl Strategy<Value = Option<Uuid>> {
        prop_oneof![
            Just(None),
            any::<u128>().prop_map(|n| Some(Uuid::from_u128(n))),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Managers are never denied
        #[test]
        fn prop_manager_always_allowed(
            actor_dept in maybe_uuid(),
            product_dept in maybe_uuid()
        ) {
            prop_assert!(can_modify(UserRole::Manager, actor_dept, product_dept));
        }

        /// Staff access is exactly department equality over assigned
        /// departments
        #[test]
        fn prop_staff_requires_matching_department(
            actor_dept in maybe_uuid(),
            product_dept in maybe_uuid()
        ) {
            let allowed = can_modify(UserRole::Staff, actor_dept, product_dept);
            let expected = matches!(
                (product_dept, actor_dept),
                (Some(p), Some(a)) if p == a
            );
            prop_assert_eq!(allowed, expected);
        }
    }
}
