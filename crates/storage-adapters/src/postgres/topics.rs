use async_trait::async_trait;
use domains::{NewTopic, RepoResult, Topic, TopicId, TopicRepository, TopicUpdate, UserId};

use super::rows::TopicRow;
use super::{classify, PgStore};
use crate::like_pattern;

const TOPIC_COLUMNS: &str = "topic_id, user_id, title, created_at, updated_at";

#[async_trait]
impl TopicRepository for PgStore {
    async fn list_topics(&self) -> RepoResult<Vec<Topic>> {
        let rows = sqlx::query_as::<_, TopicRow>(&format!(
            "SELECT {TOPIC_COLUMNS} FROM topics ORDER BY created_at DESC, topic_id DESC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(classify)?;
        Ok(rows.into_iter().map(Topic::from).collect())
    }

    async fn find_topic_by_id(&self, topic_id: TopicId) -> RepoResult<Option<Topic>> {
        let row = sqlx::query_as::<_, TopicRow>(&format!(
            "SELECT {TOPIC_COLUMNS} FROM topics WHERE topic_id = $1"
        ))
        .bind(topic_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(classify)?;
        Ok(row.map(Topic::from))
    }

    #[tracing::instrument(skip(self))]
    async fn create_topic(&self, topic: &NewTopic) -> RepoResult<Topic> {
        let row = sqlx::query_as::<_, TopicRow>(&format!(
            "INSERT INTO topics (user_id, title) VALUES ($1, $2) RETURNING {TOPIC_COLUMNS}"
        ))
        .bind(topic.user_id)
        .bind(&topic.title)
        .fetch_one(&self.pool)
        .await
        .map_err(classify)?;
        Ok(row.into())
    }

    #[tracing::instrument(skip(self))]
    async fn update_topic(&self, update: &TopicUpdate) -> RepoResult<Option<Topic>> {
        let row = sqlx::query_as::<_, TopicRow>(&format!(
            "UPDATE topics SET title = $3, updated_at = now() \
             WHERE topic_id = $1 AND user_id = $2 RETURNING {TOPIC_COLUMNS}"
        ))
        .bind(update.topic_id)
        .bind(update.user_id)
        .bind(&update.title)
        .fetch_optional(&self.pool)
        .await
        .map_err(classify)?;
        Ok(row.map(Topic::from))
    }

    #[tracing::instrument(skip(self))]
    async fn delete_topic(&self, topic_id: TopicId, user_id: UserId) -> RepoResult<u64> {
        let result = sqlx::query("DELETE FROM topics WHERE topic_id = $1 AND user_id = $2")
            .bind(topic_id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(classify)?;
        Ok(result.rows_affected())
    }

    async fn search_topics(&self, query: &str) -> RepoResult<Vec<Topic>> {
        let rows = sqlx::query_as::<_, TopicRow>(&format!(
            "SELECT {TOPIC_COLUMNS} FROM topics WHERE title ILIKE $1 ESCAPE '\\' \
             ORDER BY created_at DESC, topic_id DESC"
        ))
        .bind(like_pattern(query))
        .fetch_all(&self.pool)
        .await
        .map_err(classify)?;
        Ok(rows.into_iter().map(Topic::from).collect())
    }
}
