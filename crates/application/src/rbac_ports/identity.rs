use async_trait::async_trait;

use rbac_store_core::AppResult;
use rbac_store_domain::{IdentityUser, UserId};

/// Port onto the identity service that owns user accounts.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Returns the user or fails with `AppError::NotFound`.
    async fn get_user(&self, user_id: &UserId) -> AppResult<IdentityUser>;
}
