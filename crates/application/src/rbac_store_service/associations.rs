use super::*;

impl RbacStoreService {
    /// Grants a permission to a role. Granting twice is a no-op.
    pub async fn add_permission_to_role(
        &self,
        role_id: &RoleId,
        permission_id: &PermissionId,
    ) -> AppResult<AssociationChange> {
        self.repository
            .add_permission_to_role(role_id, permission_id)
            .await
    }

    /// Revokes a permission from a role. Revoking an absent grant is a no-op.
    pub async fn remove_permission_from_role(
        &self,
        role_id: &RoleId,
        permission_id: &PermissionId,
    ) -> AppResult<AssociationChange> {
        self.repository
            .remove_permission_from_role(role_id, permission_id)
            .await
    }

    /// Returns the permissions granted to a role.
    pub async fn list_permissions_for_role(&self, role_id: &RoleId) -> AppResult<Vec<Permission>> {
        self.repository.list_permissions_for_role(role_id).await
    }

    /// Assigns a role to a user known to the identity provider.
    pub async fn add_user_to_role(
        &self,
        role_id: &RoleId,
        user_id: &UserId,
    ) -> AppResult<AssociationChange> {
        self.require_user(user_id).await?;
        self.repository.add_user_to_role(role_id, user_id).await
    }

    /// Removes a role assignment from a user known to the identity provider.
    pub async fn remove_user_from_role(
        &self,
        role_id: &RoleId,
        user_id: &UserId,
    ) -> AppResult<AssociationChange> {
        self.require_user(user_id).await?;
        self.repository.remove_user_from_role(role_id, user_id).await
    }

    /// Returns the users assigned to a role.
    pub async fn list_users_for_role(&self, role_id: &RoleId) -> AppResult<Vec<UserId>> {
        self.repository.list_users_for_role(role_id).await
    }

    /// Returns the roles assigned to a user known to the identity provider.
    pub async fn list_roles_for_user(&self, user_id: &UserId) -> AppResult<Vec<Role>> {
        self.require_user(user_id).await?;
        self.repository.list_roles_for_user(user_id).await
    }
}
