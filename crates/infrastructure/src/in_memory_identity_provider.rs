use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use rbac_store_application::IdentityProvider;
use rbac_store_core::{AppError, AppResult};
use rbac_store_domain::{IdentityUser, UserId};

/// In-memory identity provider implementation.
#[derive(Debug, Default)]
pub struct InMemoryIdentityProvider {
    users: RwLock<HashMap<UserId, IdentityUser>>,
}

impl InMemoryIdentityProvider {
    /// Creates a provider without users.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers or replaces a user.
    pub async fn insert_user(&self, user: IdentityUser) {
        self.users.write().await.insert(user.id.clone(), user);
    }

    /// Removes a user, returning whether it was present.
    pub async fn remove_user(&self, user_id: &UserId) -> bool {
        self.users.write().await.remove(user_id).is_some()
    }
}

#[async_trait]
impl IdentityProvider for InMemoryIdentityProvider {
    async fn get_user(&self, user_id: &UserId) -> AppResult<IdentityUser> {
        self.users
            .read()
            .await
            .get(user_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("no user found with id '{user_id}'")))
    }
}
