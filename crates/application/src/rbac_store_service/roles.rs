use super::*;

impl RbacStoreService {
    /// Returns every role.
    pub async fn list_roles(&self) -> AppResult<Vec<Role>> {
        self.repository.list_roles().await
    }

    /// Returns roles scoped to an application.
    pub async fn list_roles_for_application(
        &self,
        application: &ApplicationId,
    ) -> AppResult<Vec<Role>> {
        self.repository.list_roles_for_application(application).await
    }

    /// Creates a role with a caller-supplied identifier.
    pub async fn create_role(&self, role: Role) -> AppResult<Role> {
        self.repository.create_role(role).await
    }

    /// Returns a role or fails with `NotFound`.
    pub async fn get_role(&self, role_id: &RoleId) -> AppResult<Role> {
        self.repository
            .find_role(role_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("no role found with id '{role_id}'")))
    }

    /// Merges the patch into the stored role and returns the result.
    pub async fn update_role(&self, role_id: &RoleId, patch: &RolePatch) -> AppResult<Role> {
        if patch.is_empty() {
            return self.get_role(role_id).await;
        }

        self.repository.update_role(role_id, patch).await
    }

    /// Deletes a role together with its permission grants and user assignments.
    pub async fn delete_role(&self, role_id: &RoleId) -> AppResult<()> {
        self.repository.delete_role(role_id).await
    }
}
