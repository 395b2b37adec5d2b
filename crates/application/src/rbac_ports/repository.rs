use async_trait::async_trait;

use rbac_store_core::AppResult;
use rbac_store_domain::{
    ApplicationId, AssociationChange, Permission, PermissionId, PermissionPatch, Role, RoleId,
    RolePatch, UserId,
};

/// Repository port for roles, permissions and their associations.
///
/// Every method is one unit of work: implementations either apply the whole
/// effect or none of it.
#[async_trait]
pub trait RbacRepository: Send + Sync {
    /// Lists all roles ordered by name.
    async fn list_roles(&self) -> AppResult<Vec<Role>>;

    /// Lists roles scoped to an application, ordered by name.
    async fn list_roles_for_application(
        &self,
        application: &ApplicationId,
    ) -> AppResult<Vec<Role>>;

    /// Persists a new role. Fails with `Conflict` when the id or name is taken.
    async fn create_role(&self, role: Role) -> AppResult<Role>;

    /// Finds a role by identifier.
    async fn find_role(&self, role_id: &RoleId) -> AppResult<Option<Role>>;

    /// Applies a partial update. Fails with `NotFound` when the role is absent.
    async fn update_role(&self, role_id: &RoleId, patch: &RolePatch) -> AppResult<Role>;

    /// Deletes a role and its association rows. Fails with `NotFound` when absent.
    async fn delete_role(&self, role_id: &RoleId) -> AppResult<()>;

    /// Lists all permissions ordered by name.
    async fn list_permissions(&self) -> AppResult<Vec<Permission>>;

    /// Lists permissions scoped to an application, ordered by name.
    async fn list_permissions_for_application(
        &self,
        application: &ApplicationId,
    ) -> AppResult<Vec<Permission>>;

    /// Persists a new permission. Fails with `Conflict` when the id or name is taken.
    async fn create_permission(&self, permission: Permission) -> AppResult<Permission>;

    /// Finds a permission by identifier.
    async fn find_permission(&self, permission_id: &PermissionId)
    -> AppResult<Option<Permission>>;

    /// Applies a partial update. Fails with `NotFound` when the permission is absent.
    async fn update_permission(
        &self,
        permission_id: &PermissionId,
        patch: &PermissionPatch,
    ) -> AppResult<Permission>;

    /// Deletes a permission and its grants. Fails with `NotFound` when absent.
    async fn delete_permission(&self, permission_id: &PermissionId) -> AppResult<()>;

    /// Grants a permission to a role. Both rows must exist.
    async fn add_permission_to_role(
        &self,
        role_id: &RoleId,
        permission_id: &PermissionId,
    ) -> AppResult<AssociationChange>;

    /// Revokes a permission from a role. Both rows must exist.
    async fn remove_permission_from_role(
        &self,
        role_id: &RoleId,
        permission_id: &PermissionId,
    ) -> AppResult<AssociationChange>;

    /// Lists permissions granted to a role, ordered by name.
    async fn list_permissions_for_role(&self, role_id: &RoleId) -> AppResult<Vec<Permission>>;

    /// Assigns a role to a user. The role must exist.
    async fn add_user_to_role(
        &self,
        role_id: &RoleId,
        user_id: &UserId,
    ) -> AppResult<AssociationChange>;

    /// Removes a role assignment. The role must exist.
    async fn remove_user_from_role(
        &self,
        role_id: &RoleId,
        user_id: &UserId,
    ) -> AppResult<AssociationChange>;

    /// Lists users assigned to a role, ordered by identifier.
    async fn list_users_for_role(&self, role_id: &RoleId) -> AppResult<Vec<UserId>>;

    /// Lists roles assigned to a user, ordered by name.
    async fn list_roles_for_user(&self, user_id: &UserId) -> AppResult<Vec<Role>>;
}
