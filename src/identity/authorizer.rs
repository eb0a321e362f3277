//! Pure role/permission decisions. Nothing here touches storage or navigation,
//! so every function is referentially transparent.

use super::principal::{Identity, Permission, Role};

pub fn has_role(identity: &Identity, role: Role) -> bool {
    identity.role == role
}

/// True iff the identity's role is one of `roles`.
pub fn has_any_role(identity: &Identity, roles: &[Role]) -> bool {
    roles.contains(&identity.role)
}

pub fn has_permission(identity: &Identity, permission: Permission) -> bool {
    identity.permissions.contains(&permission)
}

/// True iff `permissions` is a subset of the identity's grants. Vacuously true when empty.
pub fn has_all_permissions(identity: &Identity, permissions: &[Permission]) -> bool {
    permissions.iter().all(|p| identity.permissions.contains(p))
}

/// Screen-level action gates used by the record screens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Add,
    Edit,
    Delete,
    CollectFee,
    MarkAttendance,
    WriteProfile,
    DeleteProfile,
}

pub fn can(identity: Option<&Identity>, action: Action) -> bool {
    let Some(ident) = identity else { return false; };
    match action {
        Action::Add | Action::Edit | Action::CollectFee => has_any_role(ident, &[Role::Admin, Role::Manager]),
        Action::Delete => has_role(ident, Role::Admin),
        Action::MarkAttendance => has_any_role(ident, &[Role::Admin, Role::Manager, Role::User]),
        Action::WriteProfile => has_permission(ident, Permission::Write),
        Action::DeleteProfile => has_permission(ident, Permission::Delete),
    }
}
