use async_trait::async_trait;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use tracing::{debug, info};

use rbac_store_application::RbacRepository;
use rbac_store_core::{AppError, AppResult};
use rbac_store_domain::{
    ApplicationId, AssociationChange, EntityName, Permission, PermissionId, PermissionPatch,
    Role, RoleId, RolePatch, UserId,
};

mod associations;
mod permissions;
mod roles;

#[cfg(test)]
mod tests;

const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";

/// PostgreSQL-backed repository for roles, permissions and their associations.
#[derive(Clone)]
pub struct PostgresRbacRepository {
    pool: PgPool,
}

impl PostgresRbacRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Column set shared by `rbac_roles` and `rbac_permissions`.
#[derive(Debug, FromRow)]
struct EntityRow {
    id: String,
    name: String,
    is_editable: bool,
    application: Option<String>,
}

impl EntityRow {
    fn into_role(self) -> AppResult<Role> {
        Ok(Role::from_parts(
            RoleId::new(self.id).map_err(stored_value_error)?,
            EntityName::new(self.name).map_err(stored_value_error)?,
            self.is_editable,
            self.application
                .map(ApplicationId::new)
                .transpose()
                .map_err(stored_value_error)?,
        ))
    }

    fn into_permission(self) -> AppResult<Permission> {
        Ok(Permission::from_parts(
            PermissionId::new(self.id).map_err(stored_value_error)?,
            EntityName::new(self.name).map_err(stored_value_error)?,
            self.is_editable,
            self.application
                .map(ApplicationId::new)
                .transpose()
                .map_err(stored_value_error)?,
        ))
    }
}

fn stored_value_error(error: AppError) -> AppError {
    AppError::Internal(format!("invalid stored value: {error}"))
}

fn rows_into_roles(rows: Vec<EntityRow>) -> AppResult<Vec<Role>> {
    rows.into_iter().map(EntityRow::into_role).collect()
}

fn rows_into_permissions(rows: Vec<EntityRow>) -> AppResult<Vec<Permission>> {
    rows.into_iter().map(EntityRow::into_permission).collect()
}

fn has_sqlstate(error: &sqlx::Error, code: &str) -> bool {
    if let sqlx::Error::Database(database_error) = error {
        return database_error.code().as_deref() == Some(code);
    }

    false
}

/// Maps a failed insert or update of a role or permission row.
fn map_entity_write_error(error: sqlx::Error, kind: &str, id: &str) -> AppError {
    if has_sqlstate(&error, UNIQUE_VIOLATION) {
        return AppError::Conflict(format!("{kind} '{id}' conflicts with an existing id or name"));
    }

    if has_sqlstate(&error, FOREIGN_KEY_VIOLATION) {
        return AppError::NotFound(format!("application referenced by {kind} '{id}' was not found"));
    }

    AppError::Internal(format!("failed to write {kind} '{id}': {error}"))
}

/// Maps a failed association insert; a vanished parent row surfaces as `NotFound`.
fn map_association_write_error(error: sqlx::Error, association: &str) -> AppError {
    if has_sqlstate(&error, FOREIGN_KEY_VIOLATION) {
        return AppError::NotFound(format!("a row referenced by {association} was not found"));
    }

    AppError::Internal(format!("failed to write {association}: {error}"))
}

async fn begin(pool: &PgPool) -> AppResult<Transaction<'static, Postgres>> {
    pool.begin()
        .await
        .map_err(|error| AppError::Internal(format!("failed to begin transaction: {error}")))
}

async fn commit(transaction: Transaction<'_, Postgres>) -> AppResult<()> {
    transaction
        .commit()
        .await
        .map_err(|error| AppError::Internal(format!("failed to commit transaction: {error}")))
}

/// Locks the role row against deletion for the rest of the transaction.
async fn lock_role(transaction: &mut Transaction<'_, Postgres>, role_id: &RoleId) -> AppResult<()> {
    sqlx::query_scalar::<_, String>(
        r#"
        SELECT id
        FROM rbac_roles
        WHERE id = $1
        FOR KEY SHARE
        "#,
    )
    .bind(role_id.as_str())
    .fetch_optional(&mut **transaction)
    .await
    .map_err(|error| AppError::Internal(format!("failed to resolve role: {error}")))?
    .map(|_| ())
    .ok_or_else(|| AppError::NotFound(format!("no role found with id '{role_id}'")))
}

/// Locks the permission row against deletion for the rest of the transaction.
async fn lock_permission(
    transaction: &mut Transaction<'_, Postgres>,
    permission_id: &PermissionId,
) -> AppResult<()> {
    sqlx::query_scalar::<_, String>(
        r#"
        SELECT id
        FROM rbac_permissions
        WHERE id = $1
        FOR KEY SHARE
        "#,
    )
    .bind(permission_id.as_str())
    .fetch_optional(&mut **transaction)
    .await
    .map_err(|error| AppError::Internal(format!("failed to resolve permission: {error}")))?
    .map(|_| ())
    .ok_or_else(|| AppError::NotFound(format!("no permission found with id '{permission_id}'")))
}

fn log_association_change(association: &str, left: &str, right: &str, change: AssociationChange) {
    if change.is_unchanged() {
        debug!(association, left, right, "association already in requested state");
    } else {
        info!(association, left, right, change = change.as_str(), "association changed");
    }
}

#[async_trait]
impl RbacRepository for PostgresRbacRepository {
    async fn list_roles(&self) -> AppResult<Vec<Role>> {
        self.list_roles_impl().await
    }

    async fn list_roles_for_application(
        &self,
        application: &ApplicationId,
    ) -> AppResult<Vec<Role>> {
        self.list_roles_for_application_impl(application).await
    }

    async fn create_role(&self, role: Role) -> AppResult<Role> {
        self.create_role_impl(role).await
    }

    async fn find_role(&self, role_id: &RoleId) -> AppResult<Option<Role>> {
        self.find_role_impl(role_id).await
    }

    async fn update_role(&self, role_id: &RoleId, patch: &RolePatch) -> AppResult<Role> {
        self.update_role_impl(role_id, patch).await
    }

    async fn delete_role(&self, role_id: &RoleId) -> AppResult<()> {
        self.delete_role_impl(role_id).await
    }

    async fn list_permissions(&self) -> AppResult<Vec<Permission>> {
        self.list_permissions_impl().await
    }

    async fn list_permissions_for_application(
        &self,
        application: &ApplicationId,
    ) -> AppResult<Vec<Permission>> {
        self.list_permissions_for_application_impl(application)
            .await
    }

    async fn create_permission(&self, permission: Permission) -> AppResult<Permission> {
        self.create_permission_impl(permission).await
    }

    async fn find_permission(
        &self,
        permission_id: &PermissionId,
    ) -> AppResult<Option<Permission>> {
        self.find_permission_impl(permission_id).await
    }

    async fn update_permission(
        &self,
        permission_id: &PermissionId,
        patch: &PermissionPatch,
    ) -> AppResult<Permission> {
        self.update_permission_impl(permission_id, patch).await
    }

    async fn delete_permission(&self, permission_id: &PermissionId) -> AppResult<()> {
        self.delete_permission_impl(permission_id).await
    }

    async fn add_permission_to_role(
        &self,
        role_id: &RoleId,
        permission_id: &PermissionId,
    ) -> AppResult<AssociationChange> {
        self.add_permission_to_role_impl(role_id, permission_id)
            .await
    }

    async fn remove_permission_from_role(
        &self,
        role_id: &RoleId,
        permission_id: &PermissionId,
    ) -> AppResult<AssociationChange> {
        self.remove_permission_from_role_impl(role_id, permission_id)
            .await
    }

    async fn list_permissions_for_role(&self, role_id: &RoleId) -> AppResult<Vec<Permission>> {
        self.list_permissions_for_role_impl(role_id).await
    }

    async fn add_user_to_role(
        &self,
        role_id: &RoleId,
        user_id: &UserId,
    ) -> AppResult<AssociationChange> {
        self.add_user_to_role_impl(role_id, user_id).await
    }

    async fn remove_user_from_role(
        &self,
        role_id: &RoleId,
        user_id: &UserId,
    ) -> AppResult<AssociationChange> {
        self.remove_user_from_role_impl(role_id, user_id).await
    }

    async fn list_users_for_role(&self, role_id: &RoleId) -> AppResult<Vec<UserId>> {
        self.list_users_for_role_impl(role_id).await
    }

    async fn list_roles_for_user(&self, user_id: &UserId) -> AppResult<Vec<Role>> {
        self.list_roles_for_user_impl(user_id).await
    }
}
