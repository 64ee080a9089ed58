use std::sync::Arc;

use domains::{
    AuthenticatedUser, DomainError, NewPost, Post, PostId, PostRepository, PostUpdate, PostView,
    PostVote, Resource, Result, TopicId, TopicRepository, VoteDirection,
};
use tracing::{debug, info};

use crate::write_error;

#[derive(Clone)]
pub struct PostService {
    posts: Arc<dyn PostRepository>,
    topics: Arc<dyn TopicRepository>,
}

impl PostService {
    pub fn new(posts: Arc<dyn PostRepository>, topics: Arc<dyn TopicRepository>) -> Self {
        Self { posts, topics }
    }

    /// Posts in a topic, most recently active first. Each is annotated with
    /// the caller's own vote.
    #[tracing::instrument(skip(self), fields(user_id = caller.user_id))]
    pub async fn find_posts_by_topic(
        &self,
        caller: &AuthenticatedUser,
        topic_id: TopicId,
    ) -> Result<Vec<PostView>> {
        if self.topics.find_topic_by_id(topic_id).await?.is_none() {
            return Err(DomainError::NotFound(Resource::Topic));
        }
        Ok(self
            .posts
            .find_posts_by_topic(topic_id, caller.user_id)
            .await?)
    }

    #[tracing::instrument(skip(self), fields(user_id = caller.user_id))]
    pub async fn find_post_by_id(
        &self,
        caller: &AuthenticatedUser,
        topic_id: TopicId,
        post_id: PostId,
    ) -> Result<PostView> {
        self.posts
            .find_post_by_id(topic_id, post_id, caller.user_id)
            .await?
            .ok_or(DomainError::NotFound(Resource::Post))
    }

    #[tracing::instrument(skip(self, description), fields(user_id = caller.user_id))]
    pub async fn create_post(
        &self,
        caller: &AuthenticatedUser,
        topic_id: TopicId,
        title: &str,
        description: &str,
    ) -> Result<Post> {
        let new_post = NewPost {
            topic_id,
            user_id: caller.user_id,
            title: title.to_string(),
            description: description.to_string(),
        };
        let post = self
            .posts
            .create_post(&new_post)
            .await
            .map_err(|err| write_error(err, Some(Resource::Post), Some(Resource::Topic)))?;
        info!(post_id = post.post_id, topic_id, "post created");
        Ok(post)
    }

    /// Replaces the title and description of a post the caller owns.
    #[tracing::instrument(skip(self, description), fields(user_id = caller.user_id))]
    pub async fn update_post(
        &self,
        caller: &AuthenticatedUser,
        post_id: PostId,
        title: &str,
        description: &str,
    ) -> Result<Post> {
        let update = PostUpdate {
            post_id,
            user_id: caller.user_id,
            title: title.to_string(),
            description: description.to_string(),
        };
        self.posts
            .update_post(&update)
            .await
            .map_err(|err| write_error(err, Some(Resource::Post), None))?
            .ok_or(DomainError::NotFound(Resource::Post))
    }

    #[tracing::instrument(skip(self), fields(user_id = caller.user_id))]
    pub async fn delete_post(&self, caller: &AuthenticatedUser, post_id: PostId) -> Result<()> {
        let rows = self.posts.delete_post(post_id, caller.user_id).await?;
        if rows == 0 {
            return Err(DomainError::NotFound(Resource::Post));
        }
        info!(post_id, "post deleted");
        Ok(())
    }

    #[tracing::instrument(skip(self), fields(user_id = caller.user_id))]
    pub async fn search_posts(
        &self,
        caller: &AuthenticatedUser,
        topic_id: TopicId,
        query: &str,
    ) -> Result<Vec<PostView>> {
        Ok(self
            .posts
            .search_posts(topic_id, query, caller.user_id)
            .await?)
    }

    pub async fn like_post(&self, caller: &AuthenticatedUser, post_id: PostId) -> Result<PostVote> {
        self.cast_vote(caller, post_id, VoteDirection::Like).await
    }

    pub async fn dislike_post(
        &self,
        caller: &AuthenticatedUser,
        post_id: PostId,
    ) -> Result<PostVote> {
        self.cast_vote(caller, post_id, VoteDirection::Dislike).await
    }

    #[tracing::instrument(skip(self), fields(user_id = caller.user_id))]
    pub async fn remove_post_vote(&self, caller: &AuthenticatedUser, post_id: PostId) -> Result<()> {
        let rows = self.posts.remove_post_vote(post_id, caller.user_id).await?;
        if rows == 0 {
            return Err(DomainError::NotFound(Resource::Vote));
        }
        Ok(())
    }

    #[tracing::instrument(skip(self), fields(user_id = caller.user_id))]
    async fn cast_vote(
        &self,
        caller: &AuthenticatedUser,
        post_id: PostId,
        direction: VoteDirection,
    ) -> Result<PostVote> {
        let vote = self
            .posts
            .cast_post_vote(post_id, caller.user_id, direction)
            .await
            .map_err(|err| write_error(err, None, Some(Resource::Post)))?
            .ok_or(DomainError::NotFound(Resource::Post))?;
        debug!(?vote.vote, "post vote stored");
        Ok(vote)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domains::{
        MockPostRepository, MockTopicRepository, RepoError, TopicRepository, UserRepository,
    };
    use storage_adapters::memory::MemoryStore;

    const ALICE: AuthenticatedUser = AuthenticatedUser { user_id: 1 };

    struct Fixture {
        service: PostService,
        alice: AuthenticatedUser,
        bob: AuthenticatedUser,
        topic_id: TopicId,
    }

    async fn fixture() -> Fixture {
        let store = MemoryStore::new();
        let alice = store.create_user("alice").await.unwrap();
        let bob = store.create_user("bob").await.unwrap();
        let topic = store
            .create_topic(&domains::NewTopic {
                user_id: alice.user_id,
                title: "Rust".to_string(),
            })
            .await
            .unwrap();
        let store = Arc::new(store);
        Fixture {
            service: PostService::new(store.clone(), store),
            alice: AuthenticatedUser::new(alice.user_id),
            bob: AuthenticatedUser::new(bob.user_id),
            topic_id: topic.topic_id,
        }
    }

    #[tokio::test]
    async fn listing_posts_of_a_missing_topic_is_not_found() {
        let mut topics = MockTopicRepository::new();
        topics.expect_find_topic_by_id().returning(|_| Ok(None));
        let mut posts = MockPostRepository::new();
        posts.expect_find_posts_by_topic().never();

        let service = PostService::new(Arc::new(posts), Arc::new(topics));
        let err = service.find_posts_by_topic(&ALICE, 42).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound(Resource::Topic)));
    }

    #[tokio::test]
    async fn create_in_a_vanished_topic_is_topic_not_found() {
        let mut posts = MockPostRepository::new();
        posts
            .expect_create_post()
            .returning(|_| Err(RepoError::ForeignKeyViolation { constraint: None }));

        let service = PostService::new(Arc::new(posts), Arc::new(MockTopicRepository::new()));
        let err = service
            .create_post(&ALICE, 9, "title", "body")
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound(Resource::Topic)));
    }

    #[tokio::test]
    async fn caller_without_a_user_row_is_user_not_found() {
        let f = fixture().await;
        let post = f
            .service
            .create_post(&f.alice, f.topic_id, "Hello", "First")
            .await
            .unwrap();
        let ghost = AuthenticatedUser::new(999);

        let err = f
            .service
            .create_post(&ghost, f.topic_id, "Haunted", "Boo")
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound(Resource::User)));

        let err = f.service.like_post(&ghost, post.post_id).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound(Resource::User)));

        let view = f
            .service
            .find_post_by_id(&f.alice, f.topic_id, post.post_id)
            .await
            .unwrap();
        assert_eq!((view.likes, view.dislikes), (0, 0));
    }

    #[tokio::test]
    async fn vote_on_missing_post_is_not_found() {
        let mut posts = MockPostRepository::new();
        posts.expect_cast_post_vote().returning(|_, _, _| Ok(None));

        let service = PostService::new(Arc::new(posts), Arc::new(MockTopicRepository::new()));
        let err = service.like_post(&ALICE, 3).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound(Resource::Post)));
    }

    #[tokio::test]
    async fn removing_an_absent_vote_is_vote_not_found() {
        let mut posts = MockPostRepository::new();
        posts.expect_remove_post_vote().returning(|_, _| Ok(0));

        let service = PostService::new(Arc::new(posts), Arc::new(MockTopicRepository::new()));
        let err = service.remove_post_vote(&ALICE, 3).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound(Resource::Vote)));
    }

    #[tokio::test]
    async fn duplicate_title_in_topic_is_already_exists() {
        let f = fixture().await;
        f.service
            .create_post(&f.alice, f.topic_id, "Hello", "First")
            .await
            .unwrap();
        let err = f
            .service
            .create_post(&f.bob, f.topic_id, "Hello", "Second")
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::AlreadyExists(Resource::Post)));
    }

    #[tokio::test]
    async fn empty_topic_lists_no_posts() {
        let f = fixture().await;
        let posts = f.service.find_posts_by_topic(&f.alice, f.topic_id).await.unwrap();
        assert!(posts.is_empty());
    }

    #[tokio::test]
    async fn vote_transitions_move_counters() {
        let f = fixture().await;
        let post = f
            .service
            .create_post(&f.alice, f.topic_id, "Hello", "First")
            .await
            .unwrap();
        let counts = |view: PostView| (view.likes, view.dislikes);

        f.service.like_post(&f.bob, post.post_id).await.unwrap();
        f.service.like_post(&f.bob, post.post_id).await.unwrap();
        let view = f
            .service
            .find_post_by_id(&f.bob, f.topic_id, post.post_id)
            .await
            .unwrap();
        assert_eq!(view.user_vote, Some(VoteDirection::Like));
        assert_eq!(counts(view), (1, 0));

        f.service.dislike_post(&f.bob, post.post_id).await.unwrap();
        let view = f
            .service
            .find_post_by_id(&f.bob, f.topic_id, post.post_id)
            .await
            .unwrap();
        assert_eq!(counts(view), (0, 1));

        f.service.remove_post_vote(&f.bob, post.post_id).await.unwrap();
        let view = f
            .service
            .find_post_by_id(&f.bob, f.topic_id, post.post_id)
            .await
            .unwrap();
        assert_eq!(view.user_vote, None);
        assert_eq!(counts(view), (0, 0));

        let err = f
            .service
            .remove_post_vote(&f.bob, post.post_id)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound(Resource::Vote)));
    }

    #[tokio::test]
    async fn votes_are_reported_per_viewer() {
        let f = fixture().await;
        let post = f
            .service
            .create_post(&f.alice, f.topic_id, "Hello", "First")
            .await
            .unwrap();
        f.service.dislike_post(&f.bob, post.post_id).await.unwrap();

        let as_alice = f
            .service
            .find_post_by_id(&f.alice, f.topic_id, post.post_id)
            .await
            .unwrap();
        assert_eq!(as_alice.user_vote, None);
        assert_eq!(as_alice.dislikes, 1);
        assert_eq!(as_alice.username, "alice");
    }

    #[tokio::test]
    async fn only_the_owner_can_edit_or_delete() {
        let f = fixture().await;
        let post = f
            .service
            .create_post(&f.alice, f.topic_id, "Hello", "First")
            .await
            .unwrap();

        let err = f
            .service
            .update_post(&f.bob, post.post_id, "Hijacked", "x")
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound(Resource::Post)));
        let err = f.service.delete_post(&f.bob, post.post_id).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound(Resource::Post)));

        let updated = f
            .service
            .update_post(&f.alice, post.post_id, "Hello again", "Edited")
            .await
            .unwrap();
        assert_eq!(updated.description, "Edited");

        f.service.delete_post(&f.alice, post.post_id).await.unwrap();
        let err = f
            .service
            .find_post_by_id(&f.alice, f.topic_id, post.post_id)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound(Resource::Post)));
    }

    #[tokio::test]
    async fn post_is_only_found_under_its_own_topic() {
        let f = fixture().await;
        let post = f
            .service
            .create_post(&f.alice, f.topic_id, "Hello", "First")
            .await
            .unwrap();
        let err = f
            .service
            .find_post_by_id(&f.alice, f.topic_id + 1, post.post_id)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound(Resource::Post)));
    }

    #[tokio::test]
    async fn search_matches_title_or_description() {
        let f = fixture().await;
        f.service
            .create_post(&f.alice, f.topic_id, "Borrowing", "lifetimes explained")
            .await
            .unwrap();
        f.service
            .create_post(&f.alice, f.topic_id, "Async", "tokio and LIFETIMES")
            .await
            .unwrap();
        f.service
            .create_post(&f.alice, f.topic_id, "Macros", "declarative")
            .await
            .unwrap();

        let hits = f
            .service
            .search_posts(&f.bob, f.topic_id, "lifetimes")
            .await
            .unwrap();
        assert_eq!(hits.len(), 2);
        let hits = f
            .service
            .search_posts(&f.bob, f.topic_id, "borrow")
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
    }
}
