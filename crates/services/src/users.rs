use std::sync::Arc;

use domains::{DomainError, Resource, Result, User, UserRepository};
use tracing::info;

use crate::write_error;

/// Signup and lookup of users by their display name.
#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn UserRepository>,
}

impl UserService {
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }

    #[tracing::instrument(skip(self))]
    pub async fn find_user_by_name(&self, name: &str) -> Result<User> {
        self.users
            .find_user_by_name(name)
            .await?
            .ok_or(DomainError::NotFound(Resource::User))
    }

    #[tracing::instrument(skip(self))]
    pub async fn create_user(&self, name: &str) -> Result<User> {
        let user = self
            .users
            .create_user(name)
            .await
            .map_err(|err| write_error(err, Some(Resource::User), None))?;
        info!(user_id = user.user_id, "user created");
        Ok(user)
    }
}
