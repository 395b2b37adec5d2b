use std::sync::Arc;

use serde::Serialize;
use sqlx::PgPool;

use rbac_store_application::RbacStoreService;
use rbac_store_core::{AppError, AppResult};
use rbac_store_domain::{
    ApplicationId, AssociationChange, EntityName, EntityPatch, Permission, PermissionId, Role,
    RoleId, UserId,
};
use rbac_store_infrastructure::{
    PostgresIdentityProvider, PostgresRbacRepository, apply_migrations, migration_status,
    revert_migrations,
};

use crate::admin_config::{AdminCommand, CreateArgs, EntityCommand, UpdateArgs};

#[derive(Debug, Serialize)]
struct AssociationOutput<'a> {
    role_id: &'a str,
    target_id: &'a str,
    change: AssociationChange,
}

#[derive(Debug, Serialize)]
struct DeletedOutput<'a> {
    deleted: &'a str,
}

pub async fn run(command: AdminCommand, pool: PgPool) -> AppResult<()> {
    let service = RbacStoreService::new(
        Arc::new(PostgresRbacRepository::new(pool.clone())),
        Arc::new(PostgresIdentityProvider::new(pool.clone())),
    );

    match command {
        AdminCommand::Migrate => {
            apply_migrations(&pool).await?;
            print_json(&migration_status(&pool).await?)
        }
        AdminCommand::Rollback { target } => {
            revert_migrations(&pool, target).await?;
            print_json(&migration_status(&pool).await?)
        }
        AdminCommand::Status => print_json(&migration_status(&pool).await?),
        AdminCommand::Role { command } => run_role_command(&service, command).await,
        AdminCommand::Permission { command } => run_permission_command(&service, command).await,
        AdminCommand::Grant {
            role_id,
            permission_id,
        } => {
            let change = service
                .add_permission_to_role(&RoleId::new(&role_id)?, &PermissionId::new(&permission_id)?)
                .await?;
            print_association(&role_id, &permission_id, change)
        }
        AdminCommand::Revoke {
            role_id,
            permission_id,
        } => {
            let change = service
                .remove_permission_from_role(
                    &RoleId::new(&role_id)?,
                    &PermissionId::new(&permission_id)?,
                )
                .await?;
            print_association(&role_id, &permission_id, change)
        }
        AdminCommand::Assign { role_id, user_id } => {
            let change = service
                .add_user_to_role(&RoleId::new(&role_id)?, &UserId::new(&user_id)?)
                .await?;
            print_association(&role_id, &user_id, change)
        }
        AdminCommand::Unassign { role_id, user_id } => {
            let change = service
                .remove_user_from_role(&RoleId::new(&role_id)?, &UserId::new(&user_id)?)
                .await?;
            print_association(&role_id, &user_id, change)
        }
        AdminCommand::RolePermissions { role_id } => print_json(
            &service
                .list_permissions_for_role(&RoleId::new(role_id)?)
                .await?,
        ),
        AdminCommand::RoleUsers { role_id } => {
            print_json(&service.list_users_for_role(&RoleId::new(role_id)?).await?)
        }
        AdminCommand::UserRoles { user_id } => {
            print_json(&service.list_roles_for_user(&UserId::new(user_id)?).await?)
        }
    }
}

async fn run_role_command(service: &RbacStoreService, command: EntityCommand) -> AppResult<()> {
    match command {
        EntityCommand::List { application } => {
            let roles = match application {
                Some(application) => {
                    service
                        .list_roles_for_application(&ApplicationId::new(application)?)
                        .await?
                }
                None => service.list_roles().await?,
            };
            print_json(&roles)
        }
        EntityCommand::Get { id } => print_json(&service.get_role(&RoleId::new(id)?).await?),
        EntityCommand::Create(args) => {
            let application = parse_application(args.application.as_deref())?;
            let role = Role::new(RoleId::new(args.id)?, EntityName::new(args.name)?)
                .with_editable(!args.locked)
                .with_application(application);
            print_json(&service.create_role(role).await?)
        }
        EntityCommand::Update(args) => {
            let role_id = RoleId::new(&args.id)?;
            let patch = build_patch(args)?;
            print_json(&service.update_role(&role_id, &patch).await?)
        }
        EntityCommand::Delete { id } => {
            service.delete_role(&RoleId::new(&id)?).await?;
            print_json(&DeletedOutput { deleted: &id })
        }
    }
}

async fn run_permission_command(
    service: &RbacStoreService,
    command: EntityCommand,
) -> AppResult<()> {
    match command {
        EntityCommand::List { application } => {
            let permissions = match application {
                Some(application) => {
                    service
                        .list_permissions_for_application(&ApplicationId::new(application)?)
                        .await?
                }
                None => service.list_permissions().await?,
            };
            print_json(&permissions)
        }
        EntityCommand::Get { id } => {
            print_json(&service.get_permission(&PermissionId::new(id)?).await?)
        }
        EntityCommand::Create(CreateArgs {
            id,
            name,
            locked,
            application,
        }) => {
            let permission = Permission::new(PermissionId::new(id)?, EntityName::new(name)?)
                .with_editable(!locked)
                .with_application(parse_application(application.as_deref())?);
            print_json(&service.create_permission(permission).await?)
        }
        EntityCommand::Update(args) => {
            let permission_id = PermissionId::new(&args.id)?;
            let patch = build_patch(args)?;
            print_json(&service.update_permission(&permission_id, &patch).await?)
        }
        EntityCommand::Delete { id } => {
            service.delete_permission(&PermissionId::new(&id)?).await?;
            print_json(&DeletedOutput { deleted: &id })
        }
    }
}

fn parse_application(value: Option<&str>) -> AppResult<Option<ApplicationId>> {
    value.map(ApplicationId::new).transpose()
}

fn build_patch(args: UpdateArgs) -> AppResult<EntityPatch> {
    let application = if args.clear_application {
        Some(None)
    } else {
        parse_application(args.application.as_deref())?.map(Some)
    };

    Ok(EntityPatch {
        name: args.name.map(EntityName::new).transpose()?,
        is_editable: args.editable,
        application,
    })
}

fn print_association(role_id: &str, target_id: &str, change: AssociationChange) -> AppResult<()> {
    print_json(&AssociationOutput {
        role_id,
        target_id,
        change,
    })
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> AppResult<()> {
    let rendered = serde_json::to_string_pretty(value)
        .map_err(|error| AppError::Internal(format!("failed to render output: {error}")))?;
    println!("{rendered}");
    Ok(())
}
