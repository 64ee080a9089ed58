use std::sync::Arc;

use domains::{
    AuthenticatedUser, DomainError, NewTopic, Resource, Result, Topic, TopicId, TopicRepository,
    TopicUpdate,
};
use tracing::info;

use crate::write_error;

#[derive(Clone)]
pub struct TopicService {
    topics: Arc<dyn TopicRepository>,
}

impl TopicService {
    pub fn new(topics: Arc<dyn TopicRepository>) -> Self {
        Self { topics }
    }

    /// All topics, newest first.
    #[tracing::instrument(skip(self))]
    pub async fn list_topics(&self) -> Result<Vec<Topic>> {
        Ok(self.topics.list_topics().await?)
    }

    #[tracing::instrument(skip(self))]
    pub async fn find_topic_by_id(&self, topic_id: TopicId) -> Result<Topic> {
        self.topics
            .find_topic_by_id(topic_id)
            .await?
            .ok_or(DomainError::NotFound(Resource::Topic))
    }

    #[tracing::instrument(skip(self), fields(user_id = caller.user_id))]
    pub async fn create_topic(&self, caller: &AuthenticatedUser, title: &str) -> Result<Topic> {
        let new_topic = NewTopic {
            user_id: caller.user_id,
            title: title.to_string(),
        };
        let topic = self
            .topics
            .create_topic(&new_topic)
            .await
            .map_err(|err| write_error(err, Some(Resource::Topic), Some(Resource::User)))?;
        info!(topic_id = topic.topic_id, "topic created");
        Ok(topic)
    }

    /// Renames a topic the caller owns. Someone else's topic reads as missing.
    #[tracing::instrument(skip(self), fields(user_id = caller.user_id))]
    pub async fn update_topic(
        &self,
        caller: &AuthenticatedUser,
        topic_id: TopicId,
        title: &str,
    ) -> Result<Topic> {
        let update = TopicUpdate {
            topic_id,
            user_id: caller.user_id,
            title: title.to_string(),
        };
        self.topics
            .update_topic(&update)
            .await
            .map_err(|err| write_error(err, Some(Resource::Topic), None))?
            .ok_or(DomainError::NotFound(Resource::Topic))
    }

    /// Deletes a topic the caller owns, along with its posts, comments and votes.
    #[tracing::instrument(skip(self), fields(user_id = caller.user_id))]
    pub async fn delete_topic(&self, caller: &AuthenticatedUser, topic_id: TopicId) -> Result<()> {
        let rows = self.topics.delete_topic(topic_id, caller.user_id).await?;
        if rows == 0 {
            return Err(DomainError::NotFound(Resource::Topic));
        }
        info!(topic_id, "topic deleted");
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    pub async fn search_topics(&self, query: &str) -> Result<Vec<Topic>> {
        Ok(self.topics.search_topics(query).await?)
    }
}
