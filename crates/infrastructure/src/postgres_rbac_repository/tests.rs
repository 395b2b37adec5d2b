use std::sync::Arc;

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

use rbac_store_application::{RbacRepository, RbacStoreService};
use rbac_store_core::AppError;
use rbac_store_domain::{
    ApplicationId, AssociationChange, EntityName, Permission, PermissionId, PermissionPatch, Role,
    RoleId, RolePatch, UserId,
};

use super::PostgresRbacRepository;
use crate::{PostgresIdentityProvider, apply_migrations};

async fn test_pool() -> Option<PgPool> {
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        return None;
    };

    let pool = match PgPoolOptions::new()
        .max_connections(4)
        .connect(database_url.as_str())
        .await
    {
        Ok(pool) => pool,
        Err(error) => panic!("failed to connect to DATABASE_URL in test: {error}"),
    };

    if let Err(error) = apply_migrations(&pool).await {
        panic!("failed to run migrations for postgres rbac repository tests: {error}");
    }

    Some(pool)
}

fn unique(prefix: &str) -> String {
    format!("{prefix}-{}", Uuid::new_v4().simple())
}

fn new_role() -> Role {
    Role::new(
        RoleId::new(unique("role")).unwrap_or_else(|_| unreachable!()),
        EntityName::new(unique("role-name")).unwrap_or_else(|_| unreachable!()),
    )
}

fn new_permission() -> Permission {
    Permission::new(
        PermissionId::new(unique("permission")).unwrap_or_else(|_| unreachable!()),
        EntityName::new(unique("permission-name")).unwrap_or_else(|_| unreachable!()),
    )
}

async fn ensure_user(pool: &PgPool) -> UserId {
    let user_id = UserId::new(unique("user")).unwrap_or_else(|_| unreachable!());
    let insert = sqlx::query(
        r#"
            INSERT INTO users (id, name)
            VALUES ($1, $2)
            ON CONFLICT (id) DO NOTHING
            "#,
    )
    .bind(user_id.as_str())
    .bind("RBAC Test User")
    .execute(pool)
    .await;

    assert!(insert.is_ok());
    user_id
}

async fn ensure_application(pool: &PgPool) -> ApplicationId {
    let application = ApplicationId::new(unique("app")).unwrap_or_else(|_| unreachable!());
    let insert = sqlx::query(
        r#"
            INSERT INTO oauth2_consumers (id, name)
            VALUES ($1, $2)
            ON CONFLICT (id) DO NOTHING
            "#,
    )
    .bind(application.as_str())
    .bind("RBAC Test Application")
    .execute(pool)
    .await;

    assert!(insert.is_ok());
    application
}

async fn role_permission_rows(pool: &PgPool, role_id: &RoleId) -> i64 {
    let count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM rbac_role_permissions WHERE role_id = $1",
    )
    .bind(role_id.as_str())
    .fetch_one(pool)
    .await;

    assert!(count.is_ok());
    count.unwrap_or_default()
}

#[tokio::test]
async fn create_find_and_update_role() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let repository = PostgresRbacRepository::new(pool.clone());
    let application = ensure_application(&pool).await;
    let role = new_role()
        .with_editable(false)
        .with_application(Some(application.clone()));

    let created = repository.create_role(role.clone()).await;
    assert!(created.is_ok());
    assert_eq!(created.unwrap_or_else(|_| unreachable!()), role);

    let found = repository.find_role(role.id()).await;
    assert_eq!(found.unwrap_or_default(), Some(role.clone()));

    let renamed = EntityName::new(unique("renamed")).unwrap_or_else(|_| unreachable!());
    let updated = repository
        .update_role(
            role.id(),
            &RolePatch {
                name: Some(renamed.clone()),
                ..RolePatch::default()
            },
        )
        .await
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(updated.name(), &renamed);
    assert!(!updated.is_editable());
    assert_eq!(updated.application(), Some(&application));

    let scoped = repository
        .list_roles_for_application(&application)
        .await
        .unwrap_or_default();
    assert_eq!(scoped, vec![updated]);
}

#[tokio::test]
async fn duplicate_role_id_and_name_conflict() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let repository = PostgresRbacRepository::new(pool);
    let role = new_role();
    assert!(repository.create_role(role.clone()).await.is_ok());

    let same_id = repository.create_role(role.clone()).await;
    assert!(matches!(same_id, Err(AppError::Conflict(_))));

    let same_name = repository
        .create_role(Role::new(
            RoleId::new(unique("role")).unwrap_or_else(|_| unreachable!()),
            role.name().clone(),
        ))
        .await;
    assert!(matches!(same_name, Err(AppError::Conflict(_))));
}

#[tokio::test]
async fn unknown_application_is_not_found() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let repository = PostgresRbacRepository::new(pool);
    let permission = new_permission().with_application(Some(
        ApplicationId::new(unique("missing-app")).unwrap_or_else(|_| unreachable!()),
    ));

    let created = repository.create_permission(permission).await;

    assert!(matches!(created, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn update_and_delete_missing_rows_are_not_found() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let repository = PostgresRbacRepository::new(pool);
    let missing = RoleId::new(unique("missing")).unwrap_or_else(|_| unreachable!());

    let updated = repository
        .update_role(
            &missing,
            &RolePatch {
                is_editable: Some(false),
                ..RolePatch::default()
            },
        )
        .await;
    assert!(matches!(updated, Err(AppError::NotFound(_))));

    let deleted = repository.delete_role(&missing).await;
    assert!(matches!(deleted, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn grant_is_idempotent_and_revoke_tolerates_missing_rows() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let repository = PostgresRbacRepository::new(pool.clone());
    let role = new_role();
    let permission = new_permission();
    assert!(repository.create_role(role.clone()).await.is_ok());
    assert!(repository.create_permission(permission.clone()).await.is_ok());

    let first = repository
        .add_permission_to_role(role.id(), permission.id())
        .await;
    let second = repository
        .add_permission_to_role(role.id(), permission.id())
        .await;
    assert!(matches!(first, Ok(AssociationChange::Created)));
    assert!(matches!(second, Ok(AssociationChange::Unchanged)));
    assert_eq!(role_permission_rows(&pool, role.id()).await, 1);

    let listed = repository
        .list_permissions_for_role(role.id())
        .await
        .unwrap_or_default();
    assert_eq!(listed, vec![permission.clone()]);

    let removed = repository
        .remove_permission_from_role(role.id(), permission.id())
        .await;
    let removed_again = repository
        .remove_permission_from_role(role.id(), permission.id())
        .await;
    assert!(matches!(removed, Ok(AssociationChange::Removed)));
    assert!(matches!(removed_again, Ok(AssociationChange::Unchanged)));
    assert_eq!(role_permission_rows(&pool, role.id()).await, 0);
}

#[tokio::test]
async fn concurrent_grants_write_one_row() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let repository = PostgresRbacRepository::new(pool.clone());
    let role = new_role();
    let permission = new_permission();
    assert!(repository.create_role(role.clone()).await.is_ok());
    assert!(repository.create_permission(permission.clone()).await.is_ok());

    let (left, right) = tokio::join!(
        repository.add_permission_to_role(role.id(), permission.id()),
        repository.add_permission_to_role(role.id(), permission.id()),
    );

    assert!(left.is_ok());
    assert!(right.is_ok());
    assert_eq!(role_permission_rows(&pool, role.id()).await, 1);
}

#[tokio::test]
async fn grant_with_missing_permission_is_not_found() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let repository = PostgresRbacRepository::new(pool.clone());
    let role = new_role();
    assert!(repository.create_role(role.clone()).await.is_ok());

    let missing = PermissionId::new(unique("missing")).unwrap_or_else(|_| unreachable!());
    let granted = repository.add_permission_to_role(role.id(), &missing).await;

    assert!(matches!(granted, Err(AppError::NotFound(_))));
    assert_eq!(role_permission_rows(&pool, role.id()).await, 0);
}

#[tokio::test]
async fn deleting_role_and_permission_cascades() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let repository = PostgresRbacRepository::new(pool.clone());
    let user_id = ensure_user(&pool).await;
    let role = new_role();
    let kept = new_permission();
    let dropped = new_permission();
    assert!(repository.create_role(role.clone()).await.is_ok());
    assert!(repository.create_permission(kept.clone()).await.is_ok());
    assert!(repository.create_permission(dropped.clone()).await.is_ok());
    for permission in [&kept, &dropped] {
        assert!(
            repository
                .add_permission_to_role(role.id(), permission.id())
                .await
                .is_ok()
        );
    }
    assert!(repository.add_user_to_role(role.id(), &user_id).await.is_ok());

    assert!(repository.delete_permission(dropped.id()).await.is_ok());
    assert_eq!(role_permission_rows(&pool, role.id()).await, 1);

    assert!(repository.delete_role(role.id()).await.is_ok());
    assert_eq!(role_permission_rows(&pool, role.id()).await, 0);
    assert!(
        repository
            .list_roles_for_user(&user_id)
            .await
            .unwrap_or_default()
            .is_empty()
    );
    assert!(repository.find_permission(kept.id()).await.is_ok());
}

#[tokio::test]
async fn service_rejects_unknown_user_before_assignment() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let service = RbacStoreService::new(
        Arc::new(PostgresRbacRepository::new(pool.clone())),
        Arc::new(PostgresIdentityProvider::new(pool.clone())),
    );
    let role = new_role();
    assert!(service.create_role(role.clone()).await.is_ok());

    let unknown = UserId::new(unique("ghost")).unwrap_or_else(|_| unreachable!());
    let assigned = service.add_user_to_role(role.id(), &unknown).await;
    assert!(matches!(assigned, Err(AppError::NotFound(_))));

    let known = ensure_user(&pool).await;
    let assigned = service.add_user_to_role(role.id(), &known).await;
    assert!(matches!(assigned, Ok(AssociationChange::Created)));

    let users = service
        .list_users_for_role(role.id())
        .await
        .unwrap_or_default();
    assert_eq!(users, vec![known.clone()]);

    let roles = service.list_roles_for_user(&known).await.unwrap_or_default();
    assert_eq!(roles, vec![role]);
}

#[tokio::test]
async fn deleting_user_cascades_to_assignments() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let repository = PostgresRbacRepository::new(pool.clone());
    let user_id = ensure_user(&pool).await;
    let role = new_role();
    assert!(repository.create_role(role.clone()).await.is_ok());
    assert!(repository.add_user_to_role(role.id(), &user_id).await.is_ok());

    let deleted = sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(user_id.as_str())
        .execute(&pool)
        .await;
    assert!(deleted.is_ok());

    assert!(
        repository
            .list_users_for_role(role.id())
            .await
            .unwrap_or_default()
            .is_empty()
    );
}

#[tokio::test]
async fn revoke_with_missing_parent_is_not_found_and_keeps_grants() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let repository = PostgresRbacRepository::new(pool.clone());
    let role = new_role();
    let permission = new_permission();
    assert!(repository.create_role(role.clone()).await.is_ok());
    assert!(repository.create_permission(permission.clone()).await.is_ok());
    assert!(
        repository
            .add_permission_to_role(role.id(), permission.id())
            .await
            .is_ok()
    );

    let missing_role = RoleId::new(unique("missing")).unwrap_or_else(|_| unreachable!());
    let revoked = repository
        .remove_permission_from_role(&missing_role, permission.id())
        .await;
    assert!(matches!(revoked, Err(AppError::NotFound(_))));

    let missing_permission =
        PermissionId::new(unique("missing")).unwrap_or_else(|_| unreachable!());
    let revoked = repository
        .remove_permission_from_role(role.id(), &missing_permission)
        .await;
    assert!(matches!(revoked, Err(AppError::NotFound(_))));

    assert_eq!(role_permission_rows(&pool, role.id()).await, 1);
}

#[tokio::test]
async fn user_association_with_missing_role_is_not_found() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let repository = PostgresRbacRepository::new(pool.clone());
    let user_id = ensure_user(&pool).await;
    let missing_role = RoleId::new(unique("missing")).unwrap_or_else(|_| unreachable!());

    let assigned = repository.add_user_to_role(&missing_role, &user_id).await;
    assert!(matches!(assigned, Err(AppError::NotFound(_))));

    let unassigned = repository
        .remove_user_from_role(&missing_role, &user_id)
        .await;
    assert!(matches!(unassigned, Err(AppError::NotFound(_))));

    let assignments =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM rbac_role_users WHERE user_id = $1")
            .bind(user_id.as_str())
            .fetch_one(&pool)
            .await;
    assert_eq!(assignments.unwrap_or(-1), 0);
}

#[tokio::test]
async fn missing_permission_is_not_found_for_get_update_and_delete() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let service = RbacStoreService::new(
        Arc::new(PostgresRbacRepository::new(pool.clone())),
        Arc::new(PostgresIdentityProvider::new(pool.clone())),
    );
    let missing = PermissionId::new(unique("missing")).unwrap_or_else(|_| unreachable!());

    let fetched = service.get_permission(&missing).await;
    assert!(matches!(fetched, Err(AppError::NotFound(_))));

    let updated = service
        .update_permission(
            &missing,
            &PermissionPatch {
                is_editable: Some(false),
                ..PermissionPatch::default()
            },
        )
        .await;
    assert!(matches!(updated, Err(AppError::NotFound(_))));

    let deleted = service.delete_permission(&missing).await;
    assert!(matches!(deleted, Err(AppError::NotFound(_))));

    let stored =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM rbac_permissions WHERE id = $1")
            .bind(missing.as_str())
            .fetch_one(&pool)
            .await;
    assert_eq!(stored.unwrap_or(-1), 0);
}
