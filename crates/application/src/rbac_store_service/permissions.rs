use super::*;

impl RbacStoreService {
    /// Returns every permission.
    pub async fn list_permissions(&self) -> AppResult<Vec<Permission>> {
        self.repository.list_permissions().await
    }

    /// Returns permissions scoped to an application.
    pub async fn list_permissions_for_application(
        &self,
        application: &ApplicationId,
    ) -> AppResult<Vec<Permission>> {
        self.repository
            .list_permissions_for_application(application)
            .await
    }

    /// Creates a permission with a caller-supplied identifier.
    pub async fn create_permission(&self, permission: Permission) -> AppResult<Permission> {
        self.repository.create_permission(permission).await
    }

    /// Returns a permission or fails with `NotFound`.
    pub async fn get_permission(&self, permission_id: &PermissionId) -> AppResult<Permission> {
        self.repository
            .find_permission(permission_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("no permission found with id '{permission_id}'"))
            })
    }

    /// Merges the patch into the stored permission and returns the result.
    pub async fn update_permission(
        &self,
        permission_id: &PermissionId,
        patch: &PermissionPatch,
    ) -> AppResult<Permission> {
        if patch.is_empty() {
            return self.get_permission(permission_id).await;
        }

        self.repository
            .update_permission(permission_id, patch)
            .await
    }

    /// Deletes a permission together with its role grants.
    pub async fn delete_permission(&self, permission_id: &PermissionId) -> AppResult<()> {
        self.repository.delete_permission(permission_id).await
    }
}
