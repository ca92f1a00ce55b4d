//! Role-based authorization: the permission matrix and role guard.
//!
//! Roles and permissions are closed enumerations; adding a role or
//! permission is an exhaustive, compile-checked change. The matrix is
//! built once at startup and injected read-only.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Workspace role. Matches the seeded `roles` catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Owner,
    Admin,
    Member,
}

impl Role {
    /// The catalog name as stored in the `roles` table.
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Owner => "OWNER",
            Role::Admin => "ADMIN",
            Role::Member => "MEMBER",
        }
    }

    /// Parse a catalog name. `None` for names outside the closed set.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "OWNER" => Some(Role::Owner),
            "ADMIN" => Some(Role::Admin),
            "MEMBER" => Some(Role::Member),
            _ => None,
        }
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Capability tags gated by the role guard. Never persisted per-user;
/// always derived from [`Role`] through the matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Permission {
    CreateWorkspace,
    DeleteWorkspace,
    EditWorkspace,
    ManageWorkspaceSettings,
    AddMember,
    ChangeMemberRole,
    RemoveMember,
    CreateProject,
    EditProject,
    DeleteProject,
    CreateTask,
    EditTask,
    DeleteTask,
    ViewOnly,
}

/// Immutable role → permission-set mapping.
///
/// A role absent from the matrix grants nothing.
#[derive(Debug, Clone)]
pub struct PermissionMatrix {
    grants: HashMap<Role, HashSet<Permission>>,
}

impl PermissionMatrix {
    /// The built-in matrix: owners hold every permission, admins
    /// everything except workspace deletion/edit and role changes,
    /// members read plus task create/edit.
    pub fn builtin() -> Self {
        use Permission::*;

        let mut grants = HashMap::new();
        grants.insert(
            Role::Owner,
            HashSet::from([
                CreateWorkspace,
                DeleteWorkspace,
                EditWorkspace,
                ManageWorkspaceSettings,
                AddMember,
                ChangeMemberRole,
                RemoveMember,
                CreateProject,
                EditProject,
                DeleteProject,
                CreateTask,
                EditTask,
                DeleteTask,
                ViewOnly,
            ]),
        );
        grants.insert(
            Role::Admin,
            HashSet::from([
                AddMember,
                CreateProject,
                EditProject,
                DeleteProject,
                CreateTask,
                EditTask,
                DeleteTask,
                ManageWorkspaceSettings,
                ViewOnly,
            ]),
        );
        grants.insert(
            Role::Member,
            HashSet::from([ViewOnly, CreateTask, EditTask]),
        );
        Self { grants }
    }

    /// The permissions a role grants; empty for roles without an entry.
    pub fn granted(&self, role: Role) -> &HashSet<Permission> {
        static EMPTY: std::sync::LazyLock<HashSet<Permission>> =
            std::sync::LazyLock::new(HashSet::new);
        self.grants.get(&role).unwrap_or(&EMPTY)
    }

    /// Require ALL of `required` to be granted to `role`.
    ///
    /// Conjunction, not disjunction: one missing permission rejects the
    /// whole request.
    pub fn authorize(&self, role: Role, required: &[Permission]) -> Result<(), DomainError> {
        let granted = self.granted(role);
        let allowed = required.iter().all(|p| granted.contains(p));
        if !allowed {
            return Err(DomainError::Forbidden(
                "You do not have the necessary permissions to perform this action".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use Permission::*;

    #[test]
    fn role_names_roundtrip() {
        for role in [Role::Owner, Role::Admin, Role::Member] {
            assert_eq!(Role::parse(role.as_str()), Some(role));
        }
        assert_eq!(Role::parse("SUPERUSER"), None);
    }

    #[test]
    fn owner_holds_every_permission() {
        let matrix = PermissionMatrix::builtin();
        let all = [
            CreateWorkspace,
            DeleteWorkspace,
            EditWorkspace,
            ManageWorkspaceSettings,
            AddMember,
            ChangeMemberRole,
            RemoveMember,
            CreateProject,
            EditProject,
            DeleteProject,
            CreateTask,
            EditTask,
            DeleteTask,
            ViewOnly,
        ];
        assert!(matrix.authorize(Role::Owner, &all).is_ok());
    }

    #[test]
    fn authorization_is_conjunctive() {
        let matrix = PermissionMatrix::builtin();
        // Admin holds CreateProject but not DeleteWorkspace; requiring
        // both must reject.
        assert!(matrix.authorize(Role::Admin, &[CreateProject]).is_ok());
        assert!(
            matrix
                .authorize(Role::Admin, &[CreateProject, DeleteWorkspace])
                .is_err()
        );
    }

    #[test]
    fn member_cannot_delete_workspace() {
        let matrix = PermissionMatrix::builtin();
        assert!(matrix.authorize(Role::Member, &[DeleteWorkspace]).is_err());
        assert!(matrix.authorize(Role::Member, &[ViewOnly]).is_ok());
    }

    #[test]
    fn role_without_matrix_entry_grants_nothing() {
        let matrix = PermissionMatrix {
            grants: HashMap::new(),
        };
        assert!(matrix.granted(Role::Owner).is_empty());
        assert!(matrix.authorize(Role::Owner, &[ViewOnly]).is_err());
        // The empty requirement set is vacuously satisfied even then.
        assert!(matrix.authorize(Role::Owner, &[]).is_ok());
    }
}
