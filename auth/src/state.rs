//! Authentication state types.
//!
//! This module defines the identity, role and permission types shared by the
//! auth context and the token cache.

use crate::error::AuthError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ═══════════════════════════════════════════════════════════════════════
// ID Types
// ═══════════════════════════════════════════════════════════════════════

/// Identity-provider user id (e.g. `user_2abcXYZ`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

impl UserId {
    /// Wrap an identity-provider user id.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw id.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Roles and Permissions
// ═══════════════════════════════════════════════════════════════════════

/// Application role, stored as snake case in the `users.role` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Platform engineers; every permission.
    Developer,
    /// Administrator of a customer organisation.
    OrgAdmin,
    /// Payroll team manager.
    Manager,
    /// Payroll consultant processing client payrolls.
    Consultant,
    /// Read-only access.
    Viewer,
}

impl Role {
    /// Every role, most privileged first.
    pub const ALL: [Self; 5] = [
        Self::Developer,
        Self::OrgAdmin,
        Self::Manager,
        Self::Consultant,
        Self::Viewer,
    ];

    /// Database spelling of the role.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Developer => "developer",
            Self::OrgAdmin => "org_admin",
            Self::Manager => "manager",
            Self::Consultant => "consultant",
            Self::Viewer => "viewer",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| AuthError::UnknownRole(s.to_string()))
    }
}

/// A single capability checked by guards and feature toggles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    /// Open the dashboard.
    ViewDashboard,
    /// Platform-level configuration.
    ManageSystem,
    /// Invite, deactivate and re-role users.
    ManageUsers,
    /// See staff records.
    ViewStaff,
    /// Edit staff records.
    ManageStaff,
    /// See client records.
    ViewClients,
    /// Edit client records.
    ManageClients,
    /// See payroll schedules and runs.
    ViewPayrolls,
    /// Create, edit and process payrolls.
    ProcessPayrolls,
    /// Service agreements, invoices and billing items.
    ManageBilling,
    /// Reports and analytics.
    ViewReports,
    /// Audit log viewer.
    ViewAuditLogs,
    /// Document viewer and search.
    ViewDocuments,
    /// Upload and delete documents.
    ManageDocuments,
}

impl Permission {
    /// Every permission.
    pub const ALL: [Self; 14] = [
        Self::ViewDashboard,
        Self::ManageSystem,
        Self::ManageUsers,
        Self::ViewStaff,
        Self::ManageStaff,
        Self::ViewClients,
        Self::ManageClients,
        Self::ViewPayrolls,
        Self::ProcessPayrolls,
        Self::ManageBilling,
        Self::ViewReports,
        Self::ViewAuditLogs,
        Self::ViewDocuments,
        Self::ManageDocuments,
    ];

    /// String form used by callers of `has_permission`.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ViewDashboard => "view_dashboard",
            Self::ManageSystem => "manage_system",
            Self::ManageUsers => "manage_users",
            Self::ViewStaff => "view_staff",
            Self::ManageStaff => "manage_staff",
            Self::ViewClients => "view_clients",
            Self::ManageClients => "manage_clients",
            Self::ViewPayrolls => "view_payrolls",
            Self::ProcessPayrolls => "process_payrolls",
            Self::ManageBilling => "manage_billing",
            Self::ViewReports => "view_reports",
            Self::ViewAuditLogs => "view_audit_logs",
            Self::ViewDocuments => "view_documents",
            Self::ManageDocuments => "manage_documents",
        }
    }

    /// Parse the string form; unknown names yield `None`.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.as_str() == s)
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ═══════════════════════════════════════════════════════════════════════
// User Record
// ═══════════════════════════════════════════════════════════════════════

/// The `users` row an auth context is derived from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    /// Database primary key.
    pub id: String,

    /// Identity-provider user id linked to this row.
    pub clerk_user_id: Option<UserId>,

    /// Email address.
    pub email: String,

    /// Display name.
    pub name: String,

    /// Assigned role.
    pub role: Role,

    /// Deactivated users keep their row but lose all access.
    pub is_active: bool,
}
