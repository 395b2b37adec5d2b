use serde::{Deserialize, Serialize};

use crate::identifiers::{ApplicationId, EntityName, PermissionId, RoleId};

fn editable_by_default() -> bool {
    true
}

/// Partial update of the mutable attributes of a role or permission.
///
/// Each field is independently optional; `None` leaves the stored value
/// untouched. `application` is doubly optional so the scope can be cleared
/// with `Some(None)`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityPatch {
    /// Replacement name.
    pub name: Option<EntityName>,
    /// Replacement editability flag.
    pub is_editable: Option<bool>,
    /// Replacement application scope.
    pub application: Option<Option<ApplicationId>>,
}

impl EntityPatch {
    /// Returns true when the patch changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.is_editable.is_none() && self.application.is_none()
    }
}

/// Patch applied by role updates.
pub type RolePatch = EntityPatch;

/// Patch applied by permission updates.
pub type PermissionPatch = EntityPatch;

/// Named grouping of permissions, optionally scoped to an application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Role {
    id: RoleId,
    name: EntityName,
    #[serde(default = "editable_by_default")]
    is_editable: bool,
    #[serde(default)]
    application: Option<ApplicationId>,
}

impl Role {
    /// Creates an editable, unscoped role.
    #[must_use]
    pub fn new(id: RoleId, name: EntityName) -> Self {
        Self {
            id,
            name,
            is_editable: true,
            application: None,
        }
    }

    /// Rebuilds a role from all of its stored attributes.
    #[must_use]
    pub fn from_parts(
        id: RoleId,
        name: EntityName,
        is_editable: bool,
        application: Option<ApplicationId>,
    ) -> Self {
        Self {
            id,
            name,
            is_editable,
            application,
        }
    }

    /// Sets the editability flag.
    #[must_use]
    pub fn with_editable(mut self, is_editable: bool) -> Self {
        self.is_editable = is_editable;
        self
    }

    /// Scopes the role to an application.
    #[must_use]
    pub fn with_application(mut self, application: Option<ApplicationId>) -> Self {
        self.application = application;
        self
    }

    /// Returns the role identifier.
    #[must_use]
    pub fn id(&self) -> &RoleId {
        &self.id
    }

    /// Returns the unique role name.
    #[must_use]
    pub fn name(&self) -> &EntityName {
        &self.name
    }

    /// Returns whether administrators may edit the role.
    #[must_use]
    pub fn is_editable(&self) -> bool {
        self.is_editable
    }

    /// Returns the application scope, if any.
    #[must_use]
    pub fn application(&self) -> Option<&ApplicationId> {
        self.application.as_ref()
    }

    /// Returns the role with every attribute present in `patch` overwritten.
    #[must_use]
    pub fn patched(mut self, patch: &RolePatch) -> Self {
        if let Some(name) = &patch.name {
            self.name = name.clone();
        }
        if let Some(is_editable) = patch.is_editable {
            self.is_editable = is_editable;
        }
        if let Some(application) = &patch.application {
            self.application = application.clone();
        }
        self
    }
}

/// Named capability, optionally scoped to an application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Permission {
    id: PermissionId,
    name: EntityName,
    #[serde(default = "editable_by_default")]
    is_editable: bool,
    #[serde(default)]
    application: Option<ApplicationId>,
}

impl Permission {
    /// Creates an editable, unscoped permission.
    #[must_use]
    pub fn new(id: PermissionId, name: EntityName) -> Self {
        Self {
            id,
            name,
            is_editable: true,
            application: None,
        }
    }

    /// Rebuilds a permission from all of its stored attributes.
    #[must_use]
    pub fn from_parts(
        id: PermissionId,
        name: EntityName,
        is_editable: bool,
        application: Option<ApplicationId>,
    ) -> Self {
        Self {
            id,
            name,
            is_editable,
            application,
        }
    }

    /// Sets the editability flag.
    #[must_use]
    pub fn with_editable(mut self, is_editable: bool) -> Self {
        self.is_editable = is_editable;
        self
    }

    /// Scopes the permission to an application.
    #[must_use]
    pub fn with_application(mut self, application: Option<ApplicationId>) -> Self {
        self.application = application;
        self
    }

    /// Returns the permission identifier.
    #[must_use]
    pub fn id(&self) -> &PermissionId {
        &self.id
    }

    /// Returns the unique permission name.
    #[must_use]
    pub fn name(&self) -> &EntityName {
        &self.name
    }

    /// Returns whether administrators may edit the permission.
    #[must_use]
    pub fn is_editable(&self) -> bool {
        self.is_editable
    }

    /// Returns the application scope, if any.
    #[must_use]
    pub fn application(&self) -> Option<&ApplicationId> {
        self.application.as_ref()
    }

    /// Returns the permission with every attribute present in `patch` overwritten.
    #[must_use]
    pub fn patched(mut self, patch: &PermissionPatch) -> Self {
        if let Some(name) = &patch.name {
            self.name = name.clone();
        }
        if let Some(is_editable) = patch.is_editable {
            self.is_editable = is_editable;
        }
        if let Some(application) = &patch.application {
            self.application = application.clone();
        }
        self
    }
}
