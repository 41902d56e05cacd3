//! Authorization policy: which operations need which role.
//!
//! Every gated operation is listed once in [`Operation::required_access`].
//! The HTTP layer maps a route to an [`Operation`] and calls
//! [`authorize_operation`]; no handler carries its own role checks.

use serde::Serialize;

use crate::error::AuthError;
use crate::jwt::Identity;
use crate::models::Role;

/// Access level an operation demands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Access {
    /// No token needed
    Public,
    /// Any valid token
    Authenticated,
    /// A valid token carrying the admin role
    Admin,
}

impl Access {
    /// Role a caller must hold, if any
    pub fn required_role(self) -> Option<Role> {
        match self {
            Access::Admin => Some(Role::Admin),
            Access::Public | Access::Authenticated => None,
        }
    }
}

/// Every operation exposed by the service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Index,
    Health,
    Register,
    Login,
    ChangePassword,
    Profile,
    ListRides,
    CreateRide,
    GetRide,
    UpdateRide,
    DeleteRide,
    RideTotals,
    MonthlyEarnings,
    ListUsers,
    AdminStats,
}

impl Operation {
    /// The policy table
    pub const fn required_access(self) -> Access {
        match self {
            Operation::Index
            | Operation::Health
            | Operation::Register
            | Operation::Login
            | Operation::ListRides
            | Operation::CreateRide
            | Operation::GetRide
            | Operation::UpdateRide
            | Operation::DeleteRide
            | Operation::RideTotals
            | Operation::MonthlyEarnings => Access::Public,
            Operation::ChangePassword | Operation::Profile => Access::Authenticated,
            Operation::ListUsers | Operation::AdminStats => Access::Admin,
        }
    }
}

/// Decide whether `caller_role` satisfies `required_role`.
///
/// The role model is binary: admin routes need `admin`, everything else
/// accepts any role.
pub fn authorize(caller_role: Role, required_role: Role) -> Result<(), AuthError> {
    match required_role {
        Role::Customer => Ok(()),
        Role::Admin if caller_role.is_admin() => Ok(()),
        Role::Admin => Err(AuthError::Forbidden("Admin access required".into())),
    }
}

/// Apply the policy table to a caller.
///
/// `caller` is `None` when the request carried no token. A missing
/// identity on a gated operation is an authentication failure, a wrong
/// role is an authorization failure; callers can tell the two apart.
pub fn authorize_operation(
    operation: Operation,
    caller: Option<&Identity>,
) -> Result<(), AuthError> {
    authorize_access(operation.required_access(), caller)
}

/// Check a caller against an access level directly. Used for routes
/// that have no [`Operation`], which default to [`Access::Authenticated`].
pub fn authorize_access(access: Access, caller: Option<&Identity>) -> Result<(), AuthError> {
    if access == Access::Public {
        return Ok(());
    }

    let caller = caller.ok_or(AuthError::MissingToken)?;
    match access.required_role() {
        Some(required) => authorize(caller.role, required),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn identity(role: Role) -> Identity {
        Identity {
            user_id: Uuid::new_v4(),
            username: "someone".into(),
            role,
        }
    }

    #[test]
    fn binary_role_decision() {
        assert!(authorize(Role::Admin, Role::Admin).is_ok());
        assert!(authorize(Role::Admin, Role::Customer).is_ok());
        assert!(authorize(Role::Customer, Role::Customer).is_ok());
        assert!(matches!(
            authorize(Role::Customer, Role::Admin),
            Err(AuthError::Forbidden(_))
        ));
    }

    #[test]
    fn public_operations_need_no_identity() {
        assert!(authorize_operation(Operation::Login, None).is_ok());
        assert!(authorize_operation(Operation::RideTotals, None).is_ok());
    }

    #[test]
    fn missing_identity_is_unauthenticated_not_forbidden() {
        let err = authorize_operation(Operation::AdminStats, None).unwrap_err();
        assert!(matches!(err, AuthError::MissingToken));
        assert!(err.is_unauthenticated());
    }

    #[test]
    fn customer_on_admin_operation_is_forbidden() {
        let customer = identity(Role::Customer);
        let err = authorize_operation(Operation::ListUsers, Some(&customer)).unwrap_err();
        assert!(matches!(err, AuthError::Forbidden(_)));
        assert!(!err.is_unauthenticated());
    }

    #[test]
    fn any_role_passes_authenticated_operations() {
        let customer = identity(Role::Customer);
        assert!(authorize_operation(Operation::Profile, Some(&customer)).is_ok());
        assert!(authorize_operation(Operation::ChangePassword, Some(&customer)).is_ok());
    }

    #[test]
    fn admin_passes_everything() {
        let admin = identity(Role::Admin);
        for op in [
            Operation::Profile,
            Operation::ListUsers,
            Operation::AdminStats,
            Operation::DeleteRide,
        ] {
            assert!(authorize_operation(op, Some(&admin)).is_ok());
        }
    }
}
