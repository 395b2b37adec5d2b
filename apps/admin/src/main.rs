//! Operator command line for the RBAC store.

#![forbid(unsafe_code)]

mod admin_commands;
mod admin_config;

use clap::Parser;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::info;

use rbac_store_core::{AppError, AppResult};

use crate::admin_config::{AdminCli, init_tracing};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = AdminCli::parse();
    let pool = connect_pool(cli.database_url.as_str(), cli.max_connections).await?;
    info!(max_connections = cli.max_connections, "database pool ready");

    let result = admin_commands::run(cli.command, pool.clone()).await;
    pool.close().await;
    result
}

async fn connect_pool(database_url: &str, max_connections: u32) -> AppResult<PgPool> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
        .map_err(|error| AppError::Internal(format!("failed to connect to database: {error}")))
}
