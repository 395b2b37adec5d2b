//! Infrastructure adapters for the RBAC store ports.

#![forbid(unsafe_code)]

mod in_memory_identity_provider;
mod in_memory_rbac_repository;
mod postgres_identity_provider;
mod postgres_rbac_repository;
mod schema_migrations;

pub use in_memory_identity_provider::InMemoryIdentityProvider;
pub use in_memory_rbac_repository::InMemoryRbacRepository;
pub use postgres_identity_provider::PostgresIdentityProvider;
pub use postgres_rbac_repository::PostgresRbacRepository;
pub use schema_migrations::{
    MIGRATOR, MigrationStatus, apply_migrations, migration_status, revert_migrations,
};
