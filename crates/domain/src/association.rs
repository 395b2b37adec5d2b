use serde::{Deserialize, Serialize};

use crate::identifiers::{PermissionId, RoleId};
use crate::user::UserId;

/// Join row granting a permission to a role.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RolePermission {
    /// Granting role.
    pub role_id: RoleId,
    /// Granted permission.
    pub permission_id: PermissionId,
}

/// Join row assigning a role to a user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RoleUser {
    /// Assigned role.
    pub role_id: RoleId,
    /// Identity service user.
    pub user_id: UserId,
}

/// Effect of an idempotent association write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssociationChange {
    /// A new association row was written.
    Created,
    /// An existing association row was deleted.
    Removed,
    /// The association was already in the requested state.
    Unchanged,
}

impl AssociationChange {
    /// Returns a stable label used in logs.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Removed => "removed",
            Self::Unchanged => "unchanged",
        }
    }

    /// Returns true when the call had no effect.
    #[must_use]
    pub fn is_unchanged(&self) -> bool {
        matches!(self, Self::Unchanged)
    }
}
