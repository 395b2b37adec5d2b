//! Application services and ports.

#![forbid(unsafe_code)]

mod rbac_ports;
mod rbac_store_service;

pub use rbac_ports::{IdentityProvider, RbacRepository};
pub use rbac_store_service::RbacStoreService;
