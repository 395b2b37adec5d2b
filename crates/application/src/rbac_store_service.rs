use std::sync::Arc;

use rbac_store_core::{AppError, AppResult};
use rbac_store_domain::{
    ApplicationId, AssociationChange, Permission, PermissionId, PermissionPatch, Role, RoleId,
    RolePatch, UserId,
};

use crate::rbac_ports::{IdentityProvider, RbacRepository};

mod associations;
mod permissions;
mod roles;

#[cfg(test)]
mod tests;

/// Application service owning roles, permissions and their associations.
///
/// Built once at process start and shared by cloning; the clones share the
/// same repository and identity provider handles.
#[derive(Clone)]
pub struct RbacStoreService {
    repository: Arc<dyn RbacRepository>,
    identity_provider: Arc<dyn IdentityProvider>,
}

impl RbacStoreService {
    /// Creates a new service from required dependencies.
    #[must_use]
    pub fn new(
        repository: Arc<dyn RbacRepository>,
        identity_provider: Arc<dyn IdentityProvider>,
    ) -> Self {
        Self {
            repository,
            identity_provider,
        }
    }

    async fn require_user(&self, user_id: &UserId) -> AppResult<()> {
        self.identity_provider.get_user(user_id).await.map(|_| ())
    }
}
