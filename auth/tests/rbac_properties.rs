//! Property tests for the role table and `AuthContext`.

use paybridge_auth::{AuthContext, AuthError, Permission, Role, UserRecord};
use proptest::prelude::*;

fn user(role: Role, is_active: bool) -> UserRecord {
    UserRecord {
        id: "42".into(),
        clerk_user_id: Some("user_2abc".into()),
        email: "someone@example.com".into(),
        name: "Someone".into(),
        role,
        is_active,
    }
}

/// Expected grants per permission, in `Role::ALL` order:
/// developer, org_admin, manager, consultant, viewer.
const ROLE_TABLE: &[(&str, [bool; 5])] = &[
    ("view_dashboard", [true, true, true, true, true]),
    ("manage_system", [true, false, false, false, false]),
    ("manage_users", [true, true, false, false, false]),
    ("view_staff", [true, true, true, false, false]),
    ("manage_staff", [true, true, false, false, false]),
    ("view_clients", [true, true, true, true, true]),
    ("manage_clients", [true, true, true, false, false]),
    ("view_payrolls", [true, true, true, true, true]),
    ("process_payrolls", [true, true, true, true, false]),
    ("manage_billing", [true, true, false, false, false]),
    ("view_reports", [true, true, true, false, true]),
    ("view_audit_logs", [true, true, false, false, false]),
    ("view_documents", [true, true, true, true, false]),
    ("manage_documents", [true, true, true, false, false]),
];

fn expected_grant(role: Role, permission: &str) -> bool {
    let column = Role::ALL.iter().position(|r| *r == role).unwrap();
    ROLE_TABLE
        .iter()
        .find(|(name, _)| *name == permission)
        .map(|(_, grants)| grants[column])
        .unwrap()
}

fn any_role() -> impl Strategy<Value = Role> {
    prop::sample::select(Role::ALL.to_vec())
}

fn any_permission() -> impl Strategy<Value = Permission> {
    prop::sample::select(Permission::ALL.to_vec())
}

proptest! {
    #[test]
    fn has_permission_matches_role_table(role in any_role(), permission in any_permission()) {
        let ctx = AuthContext::from_user(Some(user(role, true)));
        prop_assert_eq!(ctx.has_permission(permission.as_str()), expected_grant(role, permission.as_str()));
    }

    #[test]
    fn inactive_users_have_no_permissions(role in any_role(), permission in any_permission()) {
        let ctx = AuthContext::from_user(Some(user(role, false)));
        prop_assert!(!ctx.is_authenticated());
        prop_assert!(!ctx.has_permission(permission.as_str()));
        prop_assert!(ctx.permissions().is_empty());
    }

    #[test]
    fn anonymous_has_no_permissions(permission in any_permission()) {
        let ctx = AuthContext::anonymous();
        prop_assert!(!ctx.has_permission(permission.as_str()));
        prop_assert_eq!(ctx.require_permission(permission.as_str()), Err(AuthError::NotAuthenticated));
    }

    #[test]
    fn unknown_permission_names_are_denied(role in any_role(), name in "[a-z_]{1,24}") {
        prop_assume!(Permission::parse(&name).is_none());
        let ctx = AuthContext::from_user(Some(user(role, true)));
        prop_assert!(!ctx.has_permission(&name));
    }

    #[test]
    fn developer_holds_every_permission(permission in any_permission()) {
        let ctx = AuthContext::from_user(Some(user(Role::Developer, true)));
        prop_assert!(ctx.can(permission));
    }
}

#[test]
fn role_table_covers_every_permission() {
    assert_eq!(ROLE_TABLE.len(), Permission::ALL.len());
    for (name, grants) in ROLE_TABLE {
        let permission = Permission::parse(name).unwrap();
        for (role, granted) in Role::ALL.into_iter().zip(grants) {
            let ctx = AuthContext::from_user(Some(user(role, true)));
            assert_eq!(ctx.can(permission), *granted, "{role} / {name}");
        }
    }
}

#[test]
fn manager_can_process_payrolls_but_not_billing() {
    let ctx = AuthContext::from_user(Some(user(Role::Manager, true)));

    assert!(ctx.has_permission("process_payrolls"));
    assert!(!ctx.has_permission("manage_billing"));
    assert!(ctx.can_process_payrolls());
    assert!(!ctx.can_manage_billing());
}

#[test]
fn only_developer_manages_system() {
    for role in Role::ALL {
        let ctx = AuthContext::from_user(Some(user(role, true)));
        assert_eq!(ctx.can(Permission::ManageSystem), role == Role::Developer, "{role}");
    }
}

#[test]
fn role_names_round_trip_through_parsing() {
    for role in Role::ALL {
        assert_eq!(role.as_str().parse::<Role>(), Ok(role));
    }
    assert!(matches!("owner".parse::<Role>(), Err(AuthError::UnknownRole(_))));
}
