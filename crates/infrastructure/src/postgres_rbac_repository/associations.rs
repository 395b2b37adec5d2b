use super::*;

impl PostgresRbacRepository {
    pub(super) async fn add_permission_to_role_impl(
        &self,
        role_id: &RoleId,
        permission_id: &PermissionId,
    ) -> AppResult<AssociationChange> {
        let mut transaction = begin(&self.pool).await?;
        lock_role(&mut transaction, role_id).await?;
        lock_permission(&mut transaction, permission_id).await?;

        // Concurrent duplicate grants collapse on the composite primary key.
        let rows_affected = sqlx::query(
            r#"
            INSERT INTO rbac_role_permissions (role_id, permission_id)
            VALUES ($1, $2)
            ON CONFLICT (role_id, permission_id) DO NOTHING
            "#,
        )
        .bind(role_id.as_str())
        .bind(permission_id.as_str())
        .execute(&mut *transaction)
        .await
        .map_err(|error| map_association_write_error(error, "role permission"))?
        .rows_affected();

        commit(transaction).await?;

        let change = if rows_affected == 0 {
            AssociationChange::Unchanged
        } else {
            AssociationChange::Created
        };
        log_association_change(
            "role_permission",
            role_id.as_str(),
            permission_id.as_str(),
            change,
        );
        Ok(change)
    }

    pub(super) async fn remove_permission_from_role_impl(
        &self,
        role_id: &RoleId,
        permission_id: &PermissionId,
    ) -> AppResult<AssociationChange> {
        let mut transaction = begin(&self.pool).await?;
        lock_role(&mut transaction, role_id).await?;
        lock_permission(&mut transaction, permission_id).await?;

        let rows_affected = sqlx::query(
            r#"
            DELETE FROM rbac_role_permissions
            WHERE role_id = $1 AND permission_id = $2
            "#,
        )
        .bind(role_id.as_str())
        .bind(permission_id.as_str())
        .execute(&mut *transaction)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to remove role permission: {error}"))
        })?
        .rows_affected();

        commit(transaction).await?;

        let change = if rows_affected == 0 {
            AssociationChange::Unchanged
        } else {
            AssociationChange::Removed
        };
        log_association_change(
            "role_permission",
            role_id.as_str(),
            permission_id.as_str(),
            change,
        );
        Ok(change)
    }

    pub(super) async fn list_permissions_for_role_impl(
        &self,
        role_id: &RoleId,
    ) -> AppResult<Vec<Permission>> {
        let mut transaction = begin(&self.pool).await?;
        lock_role(&mut transaction, role_id).await?;

        let rows = sqlx::query_as::<_, EntityRow>(
            r#"
            SELECT
                permissions.id,
                permissions.name,
                permissions.is_editable,
                permissions.application
            FROM rbac_role_permissions AS grants
            INNER JOIN rbac_permissions AS permissions
                ON permissions.id = grants.permission_id
            WHERE grants.role_id = $1
            ORDER BY permissions.name
            "#,
        )
        .bind(role_id.as_str())
        .fetch_all(&mut *transaction)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to list permissions for role: {error}"))
        })?;

        commit(transaction).await?;
        rows_into_permissions(rows)
    }

    pub(super) async fn add_user_to_role_impl(
        &self,
        role_id: &RoleId,
        user_id: &UserId,
    ) -> AppResult<AssociationChange> {
        let mut transaction = begin(&self.pool).await?;
        lock_role(&mut transaction, role_id).await?;

        let rows_affected = sqlx::query(
            r#"
            INSERT INTO rbac_role_users (role_id, user_id)
            VALUES ($1, $2)
            ON CONFLICT (role_id, user_id) DO NOTHING
            "#,
        )
        .bind(role_id.as_str())
        .bind(user_id.as_str())
        .execute(&mut *transaction)
        .await
        .map_err(|error| map_association_write_error(error, "role user"))?
        .rows_affected();

        commit(transaction).await?;

        let change = if rows_affected == 0 {
            AssociationChange::Unchanged
        } else {
            AssociationChange::Created
        };
        log_association_change("role_user", role_id.as_str(), user_id.as_str(), change);
        Ok(change)
    }

    pub(super) async fn remove_user_from_role_impl(
        &self,
        role_id: &RoleId,
        user_id: &UserId,
    ) -> AppResult<AssociationChange> {
        let mut transaction = begin(&self.pool).await?;
        lock_role(&mut transaction, role_id).await?;

        let rows_affected = sqlx::query(
            r#"
            DELETE FROM rbac_role_users
            WHERE role_id = $1 AND user_id = $2
            "#,
        )
        .bind(role_id.as_str())
        .bind(user_id.as_str())
        .execute(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to remove role user: {error}")))?
        .rows_affected();

        commit(transaction).await?;

        let change = if rows_affected == 0 {
            AssociationChange::Unchanged
        } else {
            AssociationChange::Removed
        };
        log_association_change("role_user", role_id.as_str(), user_id.as_str(), change);
        Ok(change)
    }

    pub(super) async fn list_users_for_role_impl(
        &self,
        role_id: &RoleId,
    ) -> AppResult<Vec<UserId>> {
        let mut transaction = begin(&self.pool).await?;
        lock_role(&mut transaction, role_id).await?;

        let user_ids = sqlx::query_scalar::<_, String>(
            r#"
            SELECT user_id
            FROM rbac_role_users
            WHERE role_id = $1
            ORDER BY user_id
            "#,
        )
        .bind(role_id.as_str())
        .fetch_all(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list role users: {error}")))?;

        commit(transaction).await?;

        user_ids
            .into_iter()
            .map(|value| UserId::new(value).map_err(stored_value_error))
            .collect()
    }

    pub(super) async fn list_roles_for_user_impl(&self, user_id: &UserId) -> AppResult<Vec<Role>> {
        let rows = sqlx::query_as::<_, EntityRow>(
            r#"
            SELECT
                roles.id,
                roles.name,
                roles.is_editable,
                roles.application
            FROM rbac_role_users AS assignments
            INNER JOIN rbac_roles AS roles
                ON roles.id = assignments.role_id
            WHERE assignments.user_id = $1
            ORDER BY roles.name
            "#,
        )
        .bind(user_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list roles for user: {error}")))?;

        rows_into_roles(rows)
    }
}
