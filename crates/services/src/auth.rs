use std::sync::Arc;

use domains::{
    AuthenticatedUser, DomainError, Resource, Result, TokenIssuer, User, UserRepository,
};
use tracing::info;

/// The result of a successful login.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub user: User,
    pub token: String,
}

/// Issues bearer tokens. Identity is asserted by user name alone; there is
/// no password check.
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    tokens: Arc<dyn TokenIssuer>,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserRepository>, tokens: Arc<dyn TokenIssuer>) -> Self {
        Self { users, tokens }
    }

    #[tracing::instrument(skip(self))]
    pub async fn login(&self, name: &str) -> Result<LoginOutcome> {
        let user = self
            .users
            .find_user_by_name(name)
            .await?
            .ok_or(DomainError::NotFound(Resource::User))?;
        let token = self
            .tokens
            .issue(user.user_id)
            .map_err(DomainError::unexpected)?;
        info!(user_id = user.user_id, "token issued");
        Ok(LoginOutcome { user, token })
    }

    /// Re-reads the caller's user row. A token can outlive its user.
    #[tracing::instrument(skip(self), fields(user_id = caller.user_id))]
    pub async fn authenticate_user(&self, caller: &AuthenticatedUser) -> Result<User> {
        self.users
            .find_user_by_id(caller.user_id)
            .await?
            .ok_or(DomainError::NotFound(Resource::User))
    }
}
