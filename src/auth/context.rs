use crate::errors::ServiceError;
use crate::types::UserRole;
use uuid::Uuid;

/// Represents the authentication context for the current operation.
/// Identity and role storage live outside this crate; callers construct
/// the context from whatever session layer they use.
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// The ID of the authenticated user
    pub user_id: Uuid,

    /// The role of the authenticated user
    pub role: UserRole,
}

impl AuthContext {
    /// Create a new authentication context
    pub fn new(user_id: Uuid, role: UserRole) -> Self {
        Self { user_id, role }
    }

    /// Create a context for internal system operations (e.g. the triage
    /// step that runs after submission).
    pub fn internal_system_context() -> Self {
        Self {
            user_id: Uuid::nil(),
            role: UserRole::Admin,
        }
    }

    /// Verify user is an admin
    pub fn authorize_admin(&self) -> Result<(), ServiceError> {
        if self.role.is_admin() {
            Ok(())
        } else {
            Err(ServiceError::PermissionDenied(
                "This action requires administrator privileges".to_string(),
            ))
        }
    }

    /// For operations restricted to the user's own records
    pub fn authorize_self_or_admin(&self, resource_owner_id: &Uuid) -> Result<(), ServiceError> {
        if &self.user_id == resource_owner_id || self.role.is_admin() {
            Ok(())
        } else {
            Err(ServiceError::PermissionDenied(
                "You do not have permission to access this resource".to_string(),
            ))
        }
    }
}
