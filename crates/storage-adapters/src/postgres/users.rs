use async_trait::async_trait;
use domains::{RepoResult, User, UserId, UserRepository};

use super::rows::UserRow;
use super::{classify, PgStore};

#[async_trait]
impl UserRepository for PgStore {
    async fn find_user_by_id(&self, user_id: UserId) -> RepoResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT user_id, name, created_at FROM users WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(classify)?;
        Ok(row.map(User::from))
    }

    async fn find_user_by_name(&self, name: &str) -> RepoResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT user_id, name, created_at FROM users WHERE name = $1",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(classify)?;
        Ok(row.map(User::from))
    }

    #[tracing::instrument(skip(self))]
    async fn create_user(&self, name: &str) -> RepoResult<User> {
        let row = sqlx::query_as::<_, UserRow>(
            "INSERT INTO users (name) VALUES ($1) RETURNING user_id, name, created_at",
        )
        .bind(name)
        .fetch_one(&self.pool)
        .await
        .map_err(classify)?;
        Ok(row.into())
    }
}
