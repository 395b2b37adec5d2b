use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use rbac_store_core::{AppError, AppResult};
use rbac_store_domain::{
    ApplicationId, AssociationChange, EntityName, IdentityUser, Permission, PermissionId,
    PermissionPatch, Role, RoleId, RolePatch, UserId,
};

use crate::rbac_ports::{IdentityProvider, RbacRepository};

use super::RbacStoreService;

#[derive(Default)]
struct FakeRbacRepository {
    roles: Mutex<Vec<Role>>,
    assignments: Mutex<BTreeSet<(RoleId, UserId)>>,
    writes: Mutex<usize>,
}

impl FakeRbacRepository {
    async fn record_write(&self) {
        *self.writes.lock().await += 1;
    }
}

#[async_trait]
impl RbacRepository for FakeRbacRepository {
    async fn list_roles(&self) -> AppResult<Vec<Role>> {
        Ok(self.roles.lock().await.clone())
    }

    async fn list_roles_for_application(
        &self,
        application: &ApplicationId,
    ) -> AppResult<Vec<Role>> {
        Ok(self
            .roles
            .lock()
            .await
            .iter()
            .filter(|role| role.application() == Some(application))
            .cloned()
            .collect())
    }

    async fn create_role(&self, role: Role) -> AppResult<Role> {
        self.record_write().await;
        self.roles.lock().await.push(role.clone());
        Ok(role)
    }

    async fn find_role(&self, role_id: &RoleId) -> AppResult<Option<Role>> {
        Ok(self
            .roles
            .lock()
            .await
            .iter()
            .find(|role| role.id() == role_id)
            .cloned())
    }

    async fn update_role(&self, role_id: &RoleId, patch: &RolePatch) -> AppResult<Role> {
        self.record_write().await;
        let mut roles = self.roles.lock().await;
        let role = roles
            .iter_mut()
            .find(|role| role.id() == role_id)
            .ok_or_else(|| AppError::NotFound(role_id.to_string()))?;
        *role = role.clone().patched(patch);
        Ok(role.clone())
    }

    async fn delete_role(&self, role_id: &RoleId) -> AppResult<()> {
        self.record_write().await;
        self.roles.lock().await.retain(|role| role.id() != role_id);
        Ok(())
    }

    async fn list_permissions(&self) -> AppResult<Vec<Permission>> {
        Ok(Vec::new())
    }

    async fn list_permissions_for_application(
        &self,
        _application: &ApplicationId,
    ) -> AppResult<Vec<Permission>> {
        Ok(Vec::new())
    }

    async fn create_permission(&self, permission: Permission) -> AppResult<Permission> {
        self.record_write().await;
        Ok(permission)
    }

    async fn find_permission(
        &self,
        _permission_id: &PermissionId,
    ) -> AppResult<Option<Permission>> {
        Ok(None)
    }

    async fn update_permission(
        &self,
        permission_id: &PermissionId,
        _patch: &PermissionPatch,
    ) -> AppResult<Permission> {
        self.record_write().await;
        Err(AppError::NotFound(permission_id.to_string()))
    }

    async fn delete_permission(&self, _permission_id: &PermissionId) -> AppResult<()> {
        self.record_write().await;
        Ok(())
    }

    async fn add_permission_to_role(
        &self,
        _role_id: &RoleId,
        _permission_id: &PermissionId,
    ) -> AppResult<AssociationChange> {
        self.record_write().await;
        Ok(AssociationChange::Created)
    }

    async fn remove_permission_from_role(
        &self,
        _role_id: &RoleId,
        _permission_id: &PermissionId,
    ) -> AppResult<AssociationChange> {
        self.record_write().await;
        Ok(AssociationChange::Removed)
    }

    async fn list_permissions_for_role(&self, _role_id: &RoleId) -> AppResult<Vec<Permission>> {
        Ok(Vec::new())
    }

    async fn add_user_to_role(
        &self,
        role_id: &RoleId,
        user_id: &UserId,
    ) -> AppResult<AssociationChange> {
        self.record_write().await;
        let inserted = self
            .assignments
            .lock()
            .await
            .insert((role_id.clone(), user_id.clone()));
        Ok(if inserted {
            AssociationChange::Created
        } else {
            AssociationChange::Unchanged
        })
    }

    async fn remove_user_from_role(
        &self,
        role_id: &RoleId,
        user_id: &UserId,
    ) -> AppResult<AssociationChange> {
        self.record_write().await;
        let removed = self
            .assignments
            .lock()
            .await
            .remove(&(role_id.clone(), user_id.clone()));
        Ok(if removed {
            AssociationChange::Removed
        } else {
            AssociationChange::Unchanged
        })
    }

    async fn list_users_for_role(&self, role_id: &RoleId) -> AppResult<Vec<UserId>> {
        Ok(self
            .assignments
            .lock()
            .await
            .iter()
            .filter(|(stored_role_id, _)| stored_role_id == role_id)
            .map(|(_, user_id)| user_id.clone())
            .collect())
    }

    async fn list_roles_for_user(&self, _user_id: &UserId) -> AppResult<Vec<Role>> {
        Ok(Vec::new())
    }
}

struct FakeIdentityProvider {
    known_users: Vec<UserId>,
}

#[async_trait]
impl IdentityProvider for FakeIdentityProvider {
    async fn get_user(&self, user_id: &UserId) -> AppResult<IdentityUser> {
        self.known_users
            .iter()
            .find(|known| *known == user_id)
            .map(|known| IdentityUser {
                id: known.clone(),
                name: known.to_string(),
                enabled: true,
            })
            .ok_or_else(|| AppError::NotFound(format!("no user found with id '{user_id}'")))
    }
}

fn role_id(value: &str) -> RoleId {
    RoleId::new(value).unwrap_or_else(|_| unreachable!())
}

fn user_id(value: &str) -> UserId {
    UserId::new(value).unwrap_or_else(|_| unreachable!())
}

fn service_with_users(users: &[&str]) -> (RbacStoreService, Arc<FakeRbacRepository>) {
    let repository = Arc::new(FakeRbacRepository::default());
    let service = RbacStoreService::new(
        repository.clone(),
        Arc::new(FakeIdentityProvider {
            known_users: users.iter().map(|value| user_id(value)).collect(),
        }),
    );
    (service, repository)
}

#[tokio::test]
async fn get_role_reports_missing_role_as_not_found() {
    let (service, _) = service_with_users(&[]);

    let result = service.get_role(&role_id("missing")).await;

    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn get_permission_reports_missing_permission_as_not_found() {
    let (service, _) = service_with_users(&[]);

    let result = service
        .get_permission(&PermissionId::new("missing").unwrap_or_else(|_| unreachable!()))
        .await;

    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn add_user_to_role_rejects_unknown_user_before_writing() {
    let (service, repository) = service_with_users(&["alice"]);

    let result = service
        .add_user_to_role(&role_id("R1"), &user_id("mallory"))
        .await;

    assert!(matches!(result, Err(AppError::NotFound(_))));
    assert_eq!(*repository.writes.lock().await, 0);
    assert!(repository.assignments.lock().await.is_empty());
}

#[tokio::test]
async fn remove_user_from_role_requires_known_user() {
    let (service, repository) = service_with_users(&["alice"]);

    let result = service
        .remove_user_from_role(&role_id("R1"), &user_id("mallory"))
        .await;

    assert!(matches!(result, Err(AppError::NotFound(_))));
    assert_eq!(*repository.writes.lock().await, 0);
}

#[tokio::test]
async fn add_user_to_role_passes_known_user_to_repository() {
    let (service, repository) = service_with_users(&["alice"]);

    let first = service.add_user_to_role(&role_id("R1"), &user_id("alice")).await;
    let second = service.add_user_to_role(&role_id("R1"), &user_id("alice")).await;

    assert!(matches!(first, Ok(AssociationChange::Created)));
    assert!(matches!(second, Ok(AssociationChange::Unchanged)));
    assert_eq!(repository.assignments.lock().await.len(), 1);
}

#[tokio::test]
async fn empty_patch_returns_current_role_without_writing() {
    let (service, repository) = service_with_users(&[]);
    let role = Role::new(
        role_id("R1"),
        EntityName::new("admin").unwrap_or_else(|_| unreachable!()),
    );
    repository.roles.lock().await.push(role.clone());

    let result = service
        .update_role(&role_id("R1"), &RolePatch::default())
        .await;

    assert!(result.is_ok());
    assert_eq!(result.unwrap_or_else(|_| unreachable!()), role);
    assert_eq!(*repository.writes.lock().await, 0);
}

#[tokio::test]
async fn empty_patch_on_missing_role_is_not_found() {
    let (service, _) = service_with_users(&[]);

    let result = service
        .update_role(&role_id("missing"), &RolePatch::default())
        .await;

    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn list_roles_for_user_requires_known_user() {
    let (service, _) = service_with_users(&[]);

    let result = service.list_roles_for_user(&user_id("ghost")).await;

    assert!(matches!(result, Err(AppError::NotFound(_))));
}
