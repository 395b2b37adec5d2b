use std::collections::BTreeSet;

use serde::Serialize;
use sqlx::PgPool;
use sqlx::migrate::{Migrate, Migrator};
use tracing::info;

use rbac_store_core::{AppError, AppResult};


/// Embedded reversible migrations for the RBAC schema.
///
/// Applied versions are recorded in `_sqlx_migrations`.
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// One known migration and whether the connected database has applied it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationStatus {
    /// Sequential schema version.
    pub version: i64,
    /// Human-readable migration name.
    pub description: String,
    /// Whether the version is recorded as applied.
    pub applied: bool,
}

/// Applies every pending migration in version order.
pub async fn apply_migrations(pool: &PgPool) -> AppResult<()> {
    MIGRATOR
        .run(pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to apply migrations: {error}")))?;

    info!(latest_version = latest_version(), "schema migrations applied");
    Ok(())
}

/// Reverts applied migrations newer than `target`, newest first.
///
/// A target of `0` reverts every migration.
pub async fn revert_migrations(pool: &PgPool, target: i64) -> AppResult<()> {
    if target < 0 || target > latest_version() {
        return Err(AppError::Validation(format!(
            "target version must be between 0 and {}, got {target}",
            latest_version()
        )));
    }

    MIGRATOR.undo(pool, target).await.map_err(|error| {
        AppError::Internal(format!(
            "failed to revert migrations to version {target}: {error}"
        ))
    })?;

    info!(target_version = target, "schema migrations reverted");
    Ok(())
}

/// Lists every embedded migration with its applied state.
///
/// Read-only: a database without `_sqlx_migrations` reports nothing applied.
pub async fn migration_status(pool: &PgPool) -> AppResult<Vec<MigrationStatus>> {
    let mut connection = pool.acquire().await.map_err(|error| {
        AppError::Internal(format!("failed to acquire migration connection: {error}"))
    })?;

    let tracked = sqlx::query_scalar::<_, bool>(
        "SELECT to_regclass('_sqlx_migrations') IS NOT NULL",
    )
    .fetch_one(&mut *connection)
    .await
    .map_err(|error| AppError::Internal(format!("failed to inspect migrations table: {error}")))?;

    let applied: BTreeSet<i64> = if tracked {
        connection
            .list_applied_migrations()
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to list applied migrations: {error}"))
            })?
            .into_iter()
            .map(|migration| migration.version)
            .collect()
    } else {
        BTreeSet::new()
    };

    Ok(MIGRATOR
        .iter()
        .filter(|migration| !migration.migration_type.is_down_migration())
        .map(|migration| MigrationStatus {
            version: migration.version,
            description: migration.description.to_string(),
            applied: applied.contains(&migration.version),
        })
        .collect())
}

fn latest_version() -> i64 {
    MIGRATOR
        .iter()
        .map(|migration| migration.version)
        .max()
        .unwrap_or_default()
}
