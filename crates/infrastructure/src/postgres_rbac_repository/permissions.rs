use super::*;

impl PostgresRbacRepository {
    pub(super) async fn list_permissions_impl(&self) -> AppResult<Vec<Permission>> {
        let rows = sqlx::query_as::<_, EntityRow>(
            r#"
            SELECT id, name, is_editable, application
            FROM rbac_permissions
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list permissions: {error}")))?;

        rows_into_permissions(rows)
    }

    pub(super) async fn list_permissions_for_application_impl(
        &self,
        application: &ApplicationId,
    ) -> AppResult<Vec<Permission>> {
        let rows = sqlx::query_as::<_, EntityRow>(
            r#"
            SELECT id, name, is_editable, application
            FROM rbac_permissions
            WHERE application = $1
            ORDER BY name
            "#,
        )
        .bind(application.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to list permissions for application '{application}': {error}"
            ))
        })?;

        rows_into_permissions(rows)
    }

    pub(super) async fn create_permission_impl(
        &self,
        permission: Permission,
    ) -> AppResult<Permission> {
        let row = sqlx::query_as::<_, EntityRow>(
            r#"
            INSERT INTO rbac_permissions (id, name, is_editable, application)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, is_editable, application
            "#,
        )
        .bind(permission.id().as_str())
        .bind(permission.name().as_str())
        .bind(permission.is_editable())
        .bind(permission.application().map(ApplicationId::as_str))
        .fetch_one(&self.pool)
        .await
        .map_err(|error| {
            map_entity_write_error(error, "permission", permission.id().as_str())
        })?;

        info!(
            permission_id = %permission.id(),
            permission_name = %permission.name(),
            "permission created"
        );
        row.into_permission()
    }

    pub(super) async fn find_permission_impl(
        &self,
        permission_id: &PermissionId,
    ) -> AppResult<Option<Permission>> {
        let row = sqlx::query_as::<_, EntityRow>(
            r#"
            SELECT id, name, is_editable, application
            FROM rbac_permissions
            WHERE id = $1
            "#,
        )
        .bind(permission_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to find permission: {error}")))?;

        row.map(EntityRow::into_permission).transpose()
    }

    pub(super) async fn update_permission_impl(
        &self,
        permission_id: &PermissionId,
        patch: &PermissionPatch,
    ) -> AppResult<Permission> {
        let application = patch.application.as_ref();

        let row = sqlx::query_as::<_, EntityRow>(
            r#"
            UPDATE rbac_permissions
            SET
                name = COALESCE($2, name),
                is_editable = COALESCE($3, is_editable),
                application = CASE WHEN $4 THEN $5 ELSE application END
            WHERE id = $1
            RETURNING id, name, is_editable, application
            "#,
        )
        .bind(permission_id.as_str())
        .bind(patch.name.as_ref().map(EntityName::as_str))
        .bind(patch.is_editable)
        .bind(application.is_some())
        .bind(application.and_then(|value| value.as_ref().map(ApplicationId::as_str)))
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| map_entity_write_error(error, "permission", permission_id.as_str()))?
        .ok_or_else(|| {
            AppError::NotFound(format!("no permission found with id '{permission_id}'"))
        })?;

        info!(%permission_id, "permission updated");
        row.into_permission()
    }

    pub(super) async fn delete_permission_impl(
        &self,
        permission_id: &PermissionId,
    ) -> AppResult<()> {
        let rows_affected = sqlx::query(
            r#"
            DELETE FROM rbac_permissions
            WHERE id = $1
            "#,
        )
        .bind(permission_id.as_str())
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to delete permission: {error}")))?
        .rows_affected();

        if rows_affected == 0 {
            return Err(AppError::NotFound(format!(
                "no permission found with id '{permission_id}'"
            )));
        }

        info!(%permission_id, "permission deleted");
        Ok(())
    }
}
