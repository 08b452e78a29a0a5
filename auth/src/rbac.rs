//! Role-based access control.
//!
//! [`AuthContext`] is derived from the signed-in user's database record and
//! answers permission questions for guards, navigation and feature toggles.
//! The role table is static; a role's permissions never change at runtime.
//!
//! # Example
//!
//! ```
//! use paybridge_auth::rbac::AuthContext;
//! use paybridge_auth::state::{Role, UserRecord};
//!
//! let ctx = AuthContext::from_user(Some(UserRecord {
//!     id: "42".into(),
//!     clerk_user_id: None,
//!     email: "manager@example.com".into(),
//!     name: "Manager".into(),
//!     role: Role::Manager,
//!     is_active: true,
//! }));
//!
//! assert!(ctx.has_permission("process_payrolls"));
//! assert!(!ctx.has_permission("manage_billing"));
//! ```

use crate::error::{AuthError, Result};
use crate::state::{Permission, Role, UserRecord};

use Permission::{
    ManageBilling, ManageClients, ManageDocuments, ManageStaff, ManageUsers,
    ProcessPayrolls, ViewAuditLogs, ViewClients, ViewDashboard, ViewDocuments, ViewPayrolls,
    ViewReports, ViewStaff,
};

const DEVELOPER: &[Permission] = &Permission::ALL;

const ORG_ADMIN: &[Permission] = &[
    ViewDashboard,
    ManageUsers,
    ViewStaff,
    ManageStaff,
    ViewClients,
    ManageClients,
    ViewPayrolls,
    ProcessPayrolls,
    ManageBilling,
    ViewReports,
    ViewAuditLogs,
    ViewDocuments,
    ManageDocuments,
];

const MANAGER: &[Permission] = &[
    ViewDashboard,
    ViewStaff,
    ViewClients,
    ManageClients,
    ViewPayrolls,
    ProcessPayrolls,
    ViewReports,
    ViewDocuments,
    ManageDocuments,
];

const CONSULTANT: &[Permission] = &[
    ViewDashboard,
    ViewClients,
    ViewPayrolls,
    ProcessPayrolls,
    ViewDocuments,
];

const VIEWER: &[Permission] = &[ViewDashboard, ViewClients, ViewPayrolls, ViewReports];

impl Role {
    /// The fixed permission set granted to this role.
    #[must_use]
    pub const fn permissions(&self) -> &'static [Permission] {
        match self {
            Self::Developer => DEVELOPER,
            Self::OrgAdmin => ORG_ADMIN,
            Self::Manager => MANAGER,
            Self::Consultant => CONSULTANT,
            Self::Viewer => VIEWER,
        }
    }

    /// Returns `true` if the role table grants `permission` to this role.
    #[must_use]
    pub fn grants(&self, permission: Permission) -> bool {
        self.permissions().contains(&permission)
    }
}

/// Permission view of the current request's user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthContext {
    user: Option<UserRecord>,
}

impl AuthContext {
    /// Context for a request with no signed-in user.
    #[must_use]
    pub const fn anonymous() -> Self {
        Self { user: None }
    }

    /// Derive a context from the signed-in user's database record.
    ///
    /// `None` (no session, or no matching row yet) yields an anonymous context.
    #[must_use]
    pub fn from_user(user: Option<UserRecord>) -> Self {
        if let Some(record) = &user {
            tracing::debug!(
                user_id = %record.id,
                role = %record.role,
                is_active = record.is_active,
                "Auth context derived"
            );
        }
        Self { user }
    }

    /// The backing user record, if any.
    #[must_use]
    pub const fn user(&self) -> Option<&UserRecord> {
        self.user.as_ref()
    }

    /// Returns `true` if a user record is present and active.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.user.as_ref().is_some_and(|u| u.is_active)
    }

    /// Role of an authenticated user.
    #[must_use]
    pub fn role(&self) -> Option<Role> {
        self.active_user().map(|u| u.role)
    }

    fn active_user(&self) -> Option<&UserRecord> {
        self.user.as_ref().filter(|u| u.is_active)
    }

    /// Check a permission by its string name.
    ///
    /// Always `false` when not authenticated or when `permission` is not a
    /// known permission name.
    #[must_use]
    pub fn has_permission(&self, permission: &str) -> bool {
        Permission::parse(permission).is_some_and(|p| self.can(p))
    }

    /// Typed form of [`has_permission`](Self::has_permission).
    #[must_use]
    pub fn can(&self, permission: Permission) -> bool {
        self.role().is_some_and(|role| role.grants(permission))
    }

    /// Returns `true` if the authenticated user holds `role`.
    #[must_use]
    pub fn has_role(&self, role: Role) -> bool {
        self.role() == Some(role)
    }

    /// Returns `true` if the authenticated user holds any of `roles`.
    #[must_use]
    pub fn has_any_role(&self, roles: &[Role]) -> bool {
        self.role().is_some_and(|role| roles.contains(&role))
    }

    /// Permissions granted to the authenticated user (empty otherwise).
    #[must_use]
    pub fn permissions(&self) -> &'static [Permission] {
        self.role().map(|role| role.permissions()).unwrap_or_default()
    }

    /// Developer role.
    #[must_use]
    pub fn is_developer(&self) -> bool {
        self.has_role(Role::Developer)
    }

    /// Developer or organisation administrator.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.has_any_role(&[Role::Developer, Role::OrgAdmin])
    }

    /// Can manage users.
    #[must_use]
    pub fn can_manage_users(&self) -> bool {
        self.can(ManageUsers)
    }

    /// Can manage billing.
    #[must_use]
    pub fn can_manage_billing(&self) -> bool {
        self.can(ManageBilling)
    }

    /// Can process payrolls.
    #[must_use]
    pub fn can_process_payrolls(&self) -> bool {
        self.can(ProcessPayrolls)
    }

    /// Can view audit logs.
    #[must_use]
    pub fn can_view_audit_logs(&self) -> bool {
        self.can(ViewAuditLogs)
    }

    /// Guard: require a permission by name.
    ///
    /// # Errors
    ///
    /// - `AuthError::NotAuthenticated` if there is no active user
    /// - `AuthError::InsufficientPermissions` if the role lacks `permission`
    pub fn require_permission(&self, permission: &str) -> Result<()> {
        if !self.is_authenticated() {
            return Err(AuthError::NotAuthenticated);
        }
        if self.has_permission(permission) {
            return Ok(());
        }

        tracing::warn!(
            user_id = self.user.as_ref().map(|u| u.id.as_str()),
            required = permission,
            "Permission denied"
        );

        Err(AuthError::InsufficientPermissions {
            required: permission.to_string(),
        })
    }

    /// Guard: require one of several roles.
    ///
    /// # Errors
    ///
    /// - `AuthError::NotAuthenticated` if there is no active user
    /// - `AuthError::InsufficientPermissions` if the user holds none of `roles`
    pub fn require_any_role(&self, roles: &[Role]) -> Result<()> {
        if !self.is_authenticated() {
            return Err(AuthError::NotAuthenticated);
        }
        if self.has_any_role(roles) {
            return Ok(());
        }

        let required = roles
            .iter()
            .map(Role::as_str)
            .collect::<Vec<_>>()
            .join(" | ");

        Err(AuthError::InsufficientPermissions { required })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: Role) -> UserRecord {
        UserRecord {
            id: "u1".into(),
            clerk_user_id: None,
            email: "u1@example.com".into(),
            name: "U One".into(),
            role,
            is_active: true,
        }
    }

    #[test]
    fn test_manager_cannot_manage_billing() {
        let ctx = AuthContext::from_user(Some(user(Role::Manager)));
        assert!(!ctx.has_permission("manage_billing"));
        assert!(ctx.has_permission("process_payrolls"));
    }

    #[test]
    fn test_anonymous_has_nothing() {
        let ctx = AuthContext::anonymous();
        assert!(!ctx.is_authenticated());
        assert!(!ctx.has_permission("view_dashboard"));
        assert!(ctx.permissions().is_empty());
        assert_eq!(ctx.role(), None);
    }

    #[test]
    fn test_inactive_user_is_not_authenticated() {
        let mut record = user(Role::Developer);
        record.is_active = false;
        let ctx = AuthContext::from_user(Some(record));

        assert!(!ctx.is_authenticated());
        assert!(!ctx.has_permission("manage_system"));
        assert!(!ctx.is_developer());
        assert_eq!(
            ctx.require_permission("manage_system"),
            Err(AuthError::NotAuthenticated)
        );
    }

    #[test]
    fn test_unknown_permission_is_denied() {
        let ctx = AuthContext::from_user(Some(user(Role::Developer)));
        assert!(!ctx.has_permission("launch_rockets"));
    }

    #[test]
    fn test_developer_has_every_permission() {
        let ctx = AuthContext::from_user(Some(user(Role::Developer)));
        for permission in Permission::ALL {
            assert!(ctx.can(permission), "developer should have {permission}");
        }
    }

    #[test]
    fn test_derived_flags() {
        let admin = AuthContext::from_user(Some(user(Role::OrgAdmin)));
        assert!(admin.is_admin());
        assert!(!admin.is_developer());
        assert!(admin.can_manage_users());
        assert!(admin.can_manage_billing());
        assert!(admin.can_view_audit_logs());
        assert!(!admin.can(Permission::ManageSystem));

        let viewer = AuthContext::from_user(Some(user(Role::Viewer)));
        assert!(!viewer.is_admin());
        assert!(!viewer.can_process_payrolls());
        assert!(viewer.has_permission("view_reports"));
    }

    #[test]
    fn test_require_any_role() {
        let consultant = AuthContext::from_user(Some(user(Role::Consultant)));
        assert!(consultant.require_any_role(&[Role::Manager, Role::Consultant]).is_ok());
        assert_eq!(
            consultant.require_any_role(&[Role::Developer, Role::OrgAdmin]),
            Err(AuthError::InsufficientPermissions {
                required: "developer | org_admin".into()
            })
        );
    }

    #[test]
    fn test_require_permission_denied() {
        let viewer = AuthContext::from_user(Some(user(Role::Viewer)));
        assert!(viewer.require_permission("view_payrolls").is_ok());
        assert!(matches!(
            viewer.require_permission("process_payrolls"),
            Err(AuthError::InsufficientPermissions { .. })
        ));
    }
}
