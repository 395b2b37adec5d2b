//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod association;
mod identifiers;
mod security;
mod user;

pub use association::{AssociationChange, RolePermission, RoleUser};
pub use identifiers::{ApplicationId, EntityName, IDENTIFIER_MAX_LENGTH, PermissionId, RoleId};
pub use security::{EntityPatch, Permission, PermissionPatch, Role, RolePatch};
pub use user::{IdentityUser, UserId};
