//! Authorization policy: role capability sets plus per-target visibility.
//!
//! Every function here is a pure function of the acting [`Actor`] and the
//! target it touches. Callers evaluate the relevant check before each
//! protected operation and propagate the returned [`CoreError::Forbidden`].

use crate::error::CoreError;
use crate::roles::Role;
use crate::types::DbId;

/// The authenticated principal on whose behalf an operation runs.
///
/// Passed explicitly into every protected operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub user_id: DbId,
    pub username: String,
    pub role: Role,
}

/// Operation families gated by role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Create users, change roles, deactivate accounts.
    ManageUsers,
    /// Look up and search other users' profiles.
    ViewUsers,
    /// Create, update, assign and delete devices and their warranties.
    ManageInventory,
    /// Submit a device request.
    SubmitRequest,
    /// List and inspect every device request; delete requests.
    ViewRequests,
    /// Approve or reject a pending device request.
    DecideRequest,
    /// Read statistics and dashboards.
    ViewReports,
}

impl Capability {
    fn describe(self) -> &'static str {
        match self {
            Capability::ManageUsers => "manage users",
            Capability::ViewUsers => "view users",
            Capability::ManageInventory => "manage inventory",
            Capability::SubmitRequest => "submit device requests",
            Capability::ViewRequests => "view device requests",
            Capability::DecideRequest => "approve or reject device requests",
            Capability::ViewReports => "view reports",
        }
    }
}

/// Whether `role` holds `capability`.
pub fn role_has(role: Role, capability: Capability) -> bool {
    match role {
        Role::SuperAdmin => true,
        Role::Admin => !matches!(
            capability,
            Capability::ManageUsers | Capability::DecideRequest
        ),
        Role::Employee => matches!(capability, Capability::SubmitRequest),
    }
}

/// Require `capability`, or fail with `Forbidden`.
pub fn authorize(actor: &Actor, capability: Capability) -> Result<(), CoreError> {
    if role_has(actor.role, capability) {
        Ok(())
    } else {
        Err(CoreError::Forbidden(format!(
            "Role '{}' may not {}",
            actor.role,
            capability.describe()
        )))
    }
}

/// Profile visibility.
///
/// SuperAdmin sees everyone, Admin sees employees and themself, Employee
/// sees only themself.
pub fn can_view_user(actor: &Actor, target_id: DbId, target_role: Role) -> Result<(), CoreError> {
    if actor.user_id == target_id {
        return Ok(());
    }
    match actor.role {
        Role::SuperAdmin => Ok(()),
        Role::Admin if target_role == Role::Employee => Ok(()),
        Role::Admin => Err(CoreError::Forbidden(
            "Admins can only view employees".into(),
        )),
        Role::Employee => Err(CoreError::Forbidden(
            "Employees can only view their own profile".into(),
        )),
    }
}

/// Profile edits follow the visibility rule; changing `role` or the active
/// flag additionally requires [`Capability::ManageUsers`].
pub fn can_update_user(
    actor: &Actor,
    target_id: DbId,
    target_role: Role,
    changes_privileges: bool,
) -> Result<(), CoreError> {
    if changes_privileges {
        authorize(actor, Capability::ManageUsers)?;
    }
    match (actor.role, actor.user_id == target_id) {
        (_, true) | (Role::SuperAdmin, _) => Ok(()),
        (Role::Admin, false) if target_role == Role::Employee => Ok(()),
        (Role::Admin, false) => Err(CoreError::Forbidden(
            "Admins can only update employees".into(),
        )),
        (Role::Employee, false) => Err(CoreError::Forbidden(
            "Employees can only update their own profile".into(),
        )),
    }
}

/// Warranty listing: staff see any device, employees only devices
/// currently assigned to them.
pub fn can_view_device_warranties(
    actor: &Actor,
    assigned_user_id: Option<DbId>,
) -> Result<(), CoreError> {
    if actor.role.is_staff() || assigned_user_id == Some(actor.user_id) {
        Ok(())
    } else {
        Err(CoreError::Forbidden(
            "Employees can only view warranties of their own devices".into(),
        ))
    }
}

/// Role filter applied to user searches. Admins are pinned to employees.
pub fn effective_search_role(actor: &Actor, requested: Option<Role>) -> Option<Role> {
    match actor.role {
        Role::Admin => Some(Role::Employee),
        _ => requested,
    }
}

/// Request listing scope: `None` means every requester, `Some(id)` limits
/// the listing to that requester's own requests.
pub fn request_scope(actor: &Actor) -> Option<DbId> {
    if role_has(actor.role, Capability::ViewRequests) {
        None
    } else {
        Some(actor.user_id)
    }
}

/// Single-request visibility: staff see all, employees their own.
pub fn can_view_request(actor: &Actor, requester_id: DbId) -> Result<(), CoreError> {
    if role_has(actor.role, Capability::ViewRequests) || actor.user_id == requester_id {
        Ok(())
    } else {
        Err(CoreError::Forbidden(
            "Employees can only view their own requests".into(),
        ))
    }
}
