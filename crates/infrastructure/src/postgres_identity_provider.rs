//! PostgreSQL-backed view of the identity service's user table.

use async_trait::async_trait;
use sqlx::{FromRow, PgPool};

use rbac_store_application::IdentityProvider;
use rbac_store_core::{AppError, AppResult};
use rbac_store_domain::{IdentityUser, UserId};

/// Identity provider reading the `users` table shared with the identity service.
#[derive(Clone)]
pub struct PostgresIdentityProvider {
    pool: PgPool,
}

impl PostgresIdentityProvider {
    /// Creates a provider with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct UserRow {
    id: String,
    name: String,
    enabled: bool,
}

#[async_trait]
impl IdentityProvider for PostgresIdentityProvider {
    async fn get_user(&self, user_id: &UserId) -> AppResult<IdentityUser> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, name, enabled
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(user_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to find user by id: {error}")))?
        .ok_or_else(|| AppError::NotFound(format!("no user found with id '{user_id}'")))?;

        Ok(IdentityUser {
            id: UserId::new(row.id).map_err(|error| {
                AppError::Internal(format!("invalid stored user id: {error}"))
            })?,
            name: row.name,
            enabled: row.enabled,
        })
    }
}
