use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use rbac_store_application::RbacRepository;
use rbac_store_core::{AppError, AppResult};
use rbac_store_domain::{
    ApplicationId, AssociationChange, Permission, PermissionId, PermissionPatch, Role, RoleId,
    RolePatch, RolePermission, RoleUser, UserId,
};


#[derive(Debug, Default)]
struct RbacState {
    roles: BTreeMap<RoleId, Role>,
    permissions: BTreeMap<PermissionId, Permission>,
    role_permissions: BTreeSet<RolePermission>,
    role_users: BTreeSet<RoleUser>,
}

impl RbacState {
    fn require_role(&self, role_id: &RoleId) -> AppResult<&Role> {
        self.roles
            .get(role_id)
            .ok_or_else(|| AppError::NotFound(format!("no role found with id '{role_id}'")))
    }

    fn require_permission(&self, permission_id: &PermissionId) -> AppResult<&Permission> {
        self.permissions.get(permission_id).ok_or_else(|| {
            AppError::NotFound(format!("no permission found with id '{permission_id}'"))
        })
    }

    fn role_name_taken(&self, name: &str, except: Option<&RoleId>) -> bool {
        self.roles
            .values()
            .any(|role| role.name().as_str() == name && Some(role.id()) != except)
    }

    fn permission_name_taken(&self, name: &str, except: Option<&PermissionId>) -> bool {
        self.permissions.values().any(|permission| {
            permission.name().as_str() == name && Some(permission.id()) != except
        })
    }
}

/// In-memory RBAC repository implementation.
///
/// Each operation runs under a single write or read guard, so callers observe
/// either its whole effect or none of it.
#[derive(Debug, Default)]
pub struct InMemoryRbacRepository {
    state: RwLock<RbacState>,
}

impl InMemoryRbacRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn sorted_roles<'a>(roles: impl Iterator<Item = &'a Role>) -> Vec<Role> {
    let mut values: Vec<Role> = roles.cloned().collect();
    values.sort_by(|left, right| left.name().cmp(right.name()));
    values
}

fn sorted_permissions<'a>(permissions: impl Iterator<Item = &'a Permission>) -> Vec<Permission> {
    let mut values: Vec<Permission> = permissions.cloned().collect();
    values.sort_by(|left, right| left.name().cmp(right.name()));
    values
}

#[async_trait]
impl RbacRepository for InMemoryRbacRepository {
    async fn list_roles(&self) -> AppResult<Vec<Role>> {
        Ok(sorted_roles(self.state.read().await.roles.values()))
    }

    async fn list_roles_for_application(
        &self,
        application: &ApplicationId,
    ) -> AppResult<Vec<Role>> {
        let state = self.state.read().await;
        Ok(sorted_roles(
            state
                .roles
                .values()
                .filter(|role| role.application() == Some(application)),
        ))
    }

    async fn create_role(&self, role: Role) -> AppResult<Role> {
        let mut state = self.state.write().await;

        if state.roles.contains_key(role.id())
            || state.role_name_taken(role.name().as_str(), None)
        {
            return Err(AppError::Conflict(format!(
                "role '{}' conflicts with an existing id or name",
                role.id()
            )));
        }

        state.roles.insert(role.id().clone(), role.clone());
        Ok(role)
    }

    async fn find_role(&self, role_id: &RoleId) -> AppResult<Option<Role>> {
        Ok(self.state.read().await.roles.get(role_id).cloned())
    }

    async fn update_role(&self, role_id: &RoleId, patch: &RolePatch) -> AppResult<Role> {
        let mut state = self.state.write().await;
        let updated = state.require_role(role_id)?.clone().patched(patch);

        if state.role_name_taken(updated.name().as_str(), Some(role_id)) {
            return Err(AppError::Conflict(format!(
                "role '{role_id}' conflicts with an existing id or name"
            )));
        }

        state.roles.insert(role_id.clone(), updated.clone());
        Ok(updated)
    }

    async fn delete_role(&self, role_id: &RoleId) -> AppResult<()> {
        let mut state = self.state.write().await;
        state.require_role(role_id)?;

        state.roles.remove(role_id);
        state
            .role_permissions
            .retain(|grant| &grant.role_id != role_id);
        state
            .role_users
            .retain(|assignment| &assignment.role_id != role_id);
        Ok(())
    }

    async fn list_permissions(&self) -> AppResult<Vec<Permission>> {
        Ok(sorted_permissions(
            self.state.read().await.permissions.values(),
        ))
    }

    async fn list_permissions_for_application(
        &self,
        application: &ApplicationId,
    ) -> AppResult<Vec<Permission>> {
        let state = self.state.read().await;
        Ok(sorted_permissions(
            state
                .permissions
                .values()
                .filter(|permission| permission.application() == Some(application)),
        ))
    }

    async fn create_permission(&self, permission: Permission) -> AppResult<Permission> {
        let mut state = self.state.write().await;

        if state.permissions.contains_key(permission.id())
            || state.permission_name_taken(permission.name().as_str(), None)
        {
            return Err(AppError::Conflict(format!(
                "permission '{}' conflicts with an existing id or name",
                permission.id()
            )));
        }

        state
            .permissions
            .insert(permission.id().clone(), permission.clone());
        Ok(permission)
    }

    async fn find_permission(
        &self,
        permission_id: &PermissionId,
    ) -> AppResult<Option<Permission>> {
        Ok(self.state.read().await.permissions.get(permission_id).cloned())
    }

    async fn update_permission(
        &self,
        permission_id: &PermissionId,
        patch: &PermissionPatch,
    ) -> AppResult<Permission> {
        let mut state = self.state.write().await;
        let updated = state
            .require_permission(permission_id)?
            .clone()
            .patched(patch);

        if state.permission_name_taken(updated.name().as_str(), Some(permission_id)) {
            return Err(AppError::Conflict(format!(
                "permission '{permission_id}' conflicts with an existing id or name"
            )));
        }

        state
            .permissions
            .insert(permission_id.clone(), updated.clone());
        Ok(updated)
    }

    async fn delete_permission(&self, permission_id: &PermissionId) -> AppResult<()> {
        let mut state = self.state.write().await;
        state.require_permission(permission_id)?;

        state.permissions.remove(permission_id);
        state
            .role_permissions
            .retain(|grant| &grant.permission_id != permission_id);
        Ok(())
    }

    async fn add_permission_to_role(
        &self,
        role_id: &RoleId,
        permission_id: &PermissionId,
    ) -> AppResult<AssociationChange> {
        let mut state = self.state.write().await;
        state.require_role(role_id)?;
        state.require_permission(permission_id)?;

        let inserted = state.role_permissions.insert(RolePermission {
            role_id: role_id.clone(),
            permission_id: permission_id.clone(),
        });

        if !inserted {
            debug!(%role_id, %permission_id, "permission already granted to role");
            return Ok(AssociationChange::Unchanged);
        }

        Ok(AssociationChange::Created)
    }

    async fn remove_permission_from_role(
        &self,
        role_id: &RoleId,
        permission_id: &PermissionId,
    ) -> AppResult<AssociationChange> {
        let mut state = self.state.write().await;
        state.require_role(role_id)?;
        state.require_permission(permission_id)?;

        let removed = state.role_permissions.remove(&RolePermission {
            role_id: role_id.clone(),
            permission_id: permission_id.clone(),
        });

        if !removed {
            debug!(%role_id, %permission_id, "permission was not granted to role");
            return Ok(AssociationChange::Unchanged);
        }

        Ok(AssociationChange::Removed)
    }

    async fn list_permissions_for_role(&self, role_id: &RoleId) -> AppResult<Vec<Permission>> {
        let state = self.state.read().await;
        state.require_role(role_id)?;

        Ok(sorted_permissions(
            state
                .role_permissions
                .iter()
                .filter(|grant| &grant.role_id == role_id)
                .filter_map(|grant| state.permissions.get(&grant.permission_id)),
        ))
    }

    async fn add_user_to_role(
        &self,
        role_id: &RoleId,
        user_id: &UserId,
    ) -> AppResult<AssociationChange> {
        let mut state = self.state.write().await;
        state.require_role(role_id)?;

        let inserted = state.role_users.insert(RoleUser {
            role_id: role_id.clone(),
            user_id: user_id.clone(),
        });

        if !inserted {
            debug!(%role_id, %user_id, "user already assigned to role");
            return Ok(AssociationChange::Unchanged);
        }

        Ok(AssociationChange::Created)
    }

    async fn remove_user_from_role(
        &self,
        role_id: &RoleId,
        user_id: &UserId,
    ) -> AppResult<AssociationChange> {
        let mut state = self.state.write().await;
        state.require_role(role_id)?;

        let removed = state.role_users.remove(&RoleUser {
            role_id: role_id.clone(),
            user_id: user_id.clone(),
        });

        if !removed {
            debug!(%role_id, %user_id, "user was not assigned to role");
            return Ok(AssociationChange::Unchanged);
        }

        Ok(AssociationChange::Removed)
    }

    async fn list_users_for_role(&self, role_id: &RoleId) -> AppResult<Vec<UserId>> {
        let state = self.state.read().await;
        state.require_role(role_id)?;

        Ok(state
            .role_users
            .iter()
            .filter(|assignment| &assignment.role_id == role_id)
            .map(|assignment| assignment.user_id.clone())
            .collect())
    }

    async fn list_roles_for_user(&self, user_id: &UserId) -> AppResult<Vec<Role>> {
        let state = self.state.read().await;

        Ok(sorted_roles(
            state
                .role_users
                .iter()
                .filter(|assignment| &assignment.user_id == user_id)
                .filter_map(|assignment| state.roles.get(&assignment.role_id)),
        ))
    }
}
