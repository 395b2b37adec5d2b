use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

/// Operator tool for the RBAC store.
#[derive(Debug, Parser)]
#[command(name = "rbac-store-admin", version)]
pub struct AdminCli {
    /// PostgreSQL connection string.
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    pub database_url: String,

    /// Upper bound for pooled database connections.
    #[arg(long, env = "DATABASE_MAX_CONNECTIONS", default_value_t = 5)]
    pub max_connections: u32,

    #[command(subcommand)]
    pub command: AdminCommand,
}

#[derive(Debug, Subcommand)]
pub enum AdminCommand {
    /// Apply pending schema migrations.
    Migrate,
    /// Revert schema migrations newer than the target version.
    Rollback {
        /// Version to keep; 0 reverts everything.
        #[arg(long)]
        target: i64,
    },
    /// Show known migrations and whether each is applied.
    Status,
    /// Manage roles.
    Role {
        #[command(subcommand)]
        command: EntityCommand,
    },
    /// Manage permissions.
    Permission {
        #[command(subcommand)]
        command: EntityCommand,
    },
    /// Grant a permission to a role.
    Grant { role_id: String, permission_id: String },
    /// Revoke a permission from a role.
    Revoke { role_id: String, permission_id: String },
    /// Assign a role to a user.
    Assign { role_id: String, user_id: String },
    /// Remove a role from a user.
    Unassign { role_id: String, user_id: String },
    /// List permissions granted to a role.
    RolePermissions { role_id: String },
    /// List users assigned to a role.
    RoleUsers { role_id: String },
    /// List roles assigned to a user.
    UserRoles { user_id: String },
}

#[derive(Debug, Subcommand)]
pub enum EntityCommand {
    /// List entries, optionally scoped to one application.
    List {
        #[arg(long)]
        application: Option<String>,
    },
    /// Show one entry.
    Get { id: String },
    /// Create an entry.
    Create(CreateArgs),
    /// Change selected fields of an entry.
    Update(UpdateArgs),
    /// Delete an entry and its associations.
    Delete { id: String },
}

#[derive(Debug, Args)]
pub struct CreateArgs {
    pub id: String,
    pub name: String,
    /// Mark the entry as locked for editing.
    #[arg(long)]
    pub locked: bool,
    #[arg(long)]
    pub application: Option<String>,
}

#[derive(Debug, Args)]
pub struct UpdateArgs {
    pub id: String,
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub editable: Option<bool>,
    #[arg(long, conflicts_with = "clear_application")]
    pub application: Option<String>,
    /// Remove the application scope.
    #[arg(long)]
    pub clear_application: bool,
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}
