use super::*;

impl PostgresRbacRepository {
    pub(super) async fn list_roles_impl(&self) -> AppResult<Vec<Role>> {
        let rows = sqlx::query_as::<_, EntityRow>(
            r#"
            SELECT id, name, is_editable, application
            FROM rbac_roles
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list roles: {error}")))?;

        rows_into_roles(rows)
    }

    pub(super) async fn list_roles_for_application_impl(
        &self,
        application: &ApplicationId,
    ) -> AppResult<Vec<Role>> {
        let rows = sqlx::query_as::<_, EntityRow>(
            r#"
            SELECT id, name, is_editable, application
            FROM rbac_roles
            WHERE application = $1
            ORDER BY name
            "#,
        )
        .bind(application.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to list roles for application '{application}': {error}"
            ))
        })?;

        rows_into_roles(rows)
    }

    pub(super) async fn create_role_impl(&self, role: Role) -> AppResult<Role> {
        let row = sqlx::query_as::<_, EntityRow>(
            r#"
            INSERT INTO rbac_roles (id, name, is_editable, application)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, is_editable, application
            "#,
        )
        .bind(role.id().as_str())
        .bind(role.name().as_str())
        .bind(role.is_editable())
        .bind(role.application().map(ApplicationId::as_str))
        .fetch_one(&self.pool)
        .await
        .map_err(|error| map_entity_write_error(error, "role", role.id().as_str()))?;

        info!(role_id = %role.id(), role_name = %role.name(), "role created");
        row.into_role()
    }

    pub(super) async fn find_role_impl(&self, role_id: &RoleId) -> AppResult<Option<Role>> {
        let row = sqlx::query_as::<_, EntityRow>(
            r#"
            SELECT id, name, is_editable, application
            FROM rbac_roles
            WHERE id = $1
            "#,
        )
        .bind(role_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to find role: {error}")))?;

        row.map(EntityRow::into_role).transpose()
    }

    pub(super) async fn update_role_impl(
        &self,
        role_id: &RoleId,
        patch: &RolePatch,
    ) -> AppResult<Role> {
        let application = patch.application.as_ref();

        let row = sqlx::query_as::<_, EntityRow>(
            r#"
            UPDATE rbac_roles
            SET
                name = COALESCE($2, name),
                is_editable = COALESCE($3, is_editable),
                application = CASE WHEN $4 THEN $5 ELSE application END
            WHERE id = $1
            RETURNING id, name, is_editable, application
            "#,
        )
        .bind(role_id.as_str())
        .bind(patch.name.as_ref().map(EntityName::as_str))
        .bind(patch.is_editable)
        .bind(application.is_some())
        .bind(application.and_then(|value| value.as_ref().map(ApplicationId::as_str)))
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| map_entity_write_error(error, "role", role_id.as_str()))?
        .ok_or_else(|| AppError::NotFound(format!("no role found with id '{role_id}'")))?;

        info!(%role_id, "role updated");
        row.into_role()
    }

    pub(super) async fn delete_role_impl(&self, role_id: &RoleId) -> AppResult<()> {
        let rows_affected = sqlx::query(
            r#"
            DELETE FROM rbac_roles
            WHERE id = $1
            "#,
        )
        .bind(role_id.as_str())
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to delete role: {error}")))?
        .rows_affected();

        if rows_affected == 0 {
            return Err(AppError::NotFound(format!(
                "no role found with id '{role_id}'"
            )));
        }

        info!(%role_id, "role deleted");
        Ok(())
    }
}
