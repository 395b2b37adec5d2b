use std::fmt::{Display, Formatter};

use rbac_store_core::{AppError, AppResult, NonEmptyString};
use serde::{Deserialize, Serialize};

/// Maximum length, in characters, of identifiers and names.
pub const IDENTIFIER_MAX_LENGTH: usize = 64;

/// Trims and validates a bounded text value.
pub(crate) fn bounded_text(kind: &str, value: impl Into<String>) -> AppResult<NonEmptyString> {
    let value = value.into();
    let trimmed = value.trim();

    if trimmed.is_empty() {
        return Err(AppError::Validation(format!("{kind} must not be empty")));
    }

    if trimmed.chars().count() > IDENTIFIER_MAX_LENGTH {
        return Err(AppError::Validation(format!(
            "{kind} must not exceed {IDENTIFIER_MAX_LENGTH} characters"
        )));
    }

    NonEmptyString::new(trimmed)
}

/// Validates an opaque identifier, rejecting surrounding whitespace instead of trimming it.
pub(crate) fn opaque_identifier(
    kind: &str,
    value: impl Into<String>,
) -> AppResult<NonEmptyString> {
    let value = value.into();

    if !value.is_empty() && value.trim() != value {
        return Err(AppError::Validation(format!(
            "{kind} must not have leading or trailing whitespace"
        )));
    }

    bounded_text(kind, value)
}

/// Caller-supplied identifier of a role.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RoleId(NonEmptyString);

impl RoleId {
    /// Creates a validated role identifier.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        opaque_identifier("role id", value).map(Self)
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl TryFrom<String> for RoleId {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RoleId> for String {
    fn from(value: RoleId) -> Self {
        value.0.into()
    }
}

impl Display for RoleId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Caller-supplied identifier of a permission.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PermissionId(NonEmptyString);

impl PermissionId {
    /// Creates a validated permission identifier.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        opaque_identifier("permission id", value).map(Self)
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl TryFrom<String> for PermissionId {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PermissionId> for String {
    fn from(value: PermissionId) -> Self {
        value.0.into()
    }
}

impl Display for PermissionId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Identifier of an application (OAuth2 consumer) a role or permission is scoped to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ApplicationId(NonEmptyString);

impl ApplicationId {
    /// Creates a validated application identifier.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        opaque_identifier("application id", value).map(Self)
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl TryFrom<String> for ApplicationId {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ApplicationId> for String {
    fn from(value: ApplicationId) -> Self {
        value.0.into()
    }
}

impl Display for ApplicationId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Unique display name of a role or permission.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EntityName(NonEmptyString);

impl EntityName {
    /// Creates a validated name.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        bounded_text("name", value).map(Self)
    }

    /// Returns the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl TryFrom<String> for EntityName {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<EntityName> for String {
    fn from(value: EntityName) -> Self {
        value.0.into()
    }
}

impl Display for EntityName {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}
