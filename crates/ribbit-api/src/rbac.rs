use ribbit_types::models::{ADMIN_ACCESS, AuthUser};

/// Role checks the service runs before touching data. Injected so the
/// service can be exercised with fixed answers.
pub trait Rbac: Send + Sync {
    /// The caller is `user_id`, or holds an elevated role.
    fn enforce_user(&self, caller: &AuthUser, user_id: i64) -> bool;

    /// `access_level` ranks strictly below the caller's role.
    fn is_lower_role(&self, caller: &AuthUser, access_level: i32) -> bool;

    /// The caller may see records owned by anyone.
    fn is_admin(&self, caller: &AuthUser) -> bool;
}

/// Access-level hierarchy backed by the roles table.
#[derive(Debug, Default, Clone, Copy)]
pub struct RoleRbac;

impl Rbac for RoleRbac {
    fn enforce_user(&self, caller: &AuthUser, user_id: i64) -> bool {
        caller.id == user_id || self.is_admin(caller)
    }

    fn is_lower_role(&self, caller: &AuthUser, access_level: i32) -> bool {
        access_level < caller.access_level
    }

    fn is_admin(&self, caller: &AuthUser) -> bool {
        caller.access_level >= ADMIN_ACCESS
    }
}
