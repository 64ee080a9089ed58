//! # Core Traits (Ports)
//!
//! Any storage or token plugin must implement these traits to be used by the
//! services. Point lookups return `Option` so "no rows" stays distinguishable
//! from a failure; owner-scoped deletes return the affected-row count.

use async_trait::async_trait;
use thiserror::Error;

use crate::error::RepoResult;
use crate::models::{
    Comment, CommentId, CommentUpdate, CommentView, CommentVote, NewComment, NewPost, NewTopic,
    Post, PostId, PostUpdate, PostView, PostVote, Topic, TopicId, TopicUpdate, User, UserId,
    VoteDirection,
};

#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_user_by_id(&self, user_id: UserId) -> RepoResult<Option<User>>;
    async fn find_user_by_name(&self, name: &str) -> RepoResult<Option<User>>;
    /// Fails with `UniqueViolation` when the name is taken.
    async fn create_user(&self, name: &str) -> RepoResult<User>;
}

#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait TopicRepository: Send + Sync {
    async fn list_topics(&self) -> RepoResult<Vec<Topic>>;
    async fn find_topic_by_id(&self, topic_id: TopicId) -> RepoResult<Option<Topic>>;
    async fn create_topic(&self, topic: &NewTopic) -> RepoResult<Topic>;
    /// `None` when no topic with that id is owned by the caller.
    async fn update_topic(&self, update: &TopicUpdate) -> RepoResult<Option<Topic>>;
    /// Deletes the topic and, by cascade, everything under it.
    async fn delete_topic(&self, topic_id: TopicId, user_id: UserId) -> RepoResult<u64>;
    /// Case-insensitive substring match on the title.
    async fn search_topics(&self, query: &str) -> RepoResult<Vec<Topic>>;
}

#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait PostRepository: Send + Sync {
    async fn find_posts_by_topic(
        &self,
        topic_id: TopicId,
        viewer: UserId,
    ) -> RepoResult<Vec<PostView>>;
    async fn find_post_by_id(
        &self,
        topic_id: TopicId,
        post_id: PostId,
        viewer: UserId,
    ) -> RepoResult<Option<PostView>>;
    async fn create_post(&self, post: &NewPost) -> RepoResult<Post>;
    async fn update_post(&self, update: &PostUpdate) -> RepoResult<Option<Post>>;
    async fn delete_post(&self, post_id: PostId, user_id: UserId) -> RepoResult<u64>;
    /// Case-insensitive substring match on title or description within a topic.
    async fn search_posts(
        &self,
        topic_id: TopicId,
        query: &str,
        viewer: UserId,
    ) -> RepoResult<Vec<PostView>>;
    /// Upserts the vote and moves the post's counters by the transition delta.
    /// `None` when the post does not exist.
    async fn cast_post_vote(
        &self,
        post_id: PostId,
        user_id: UserId,
        direction: VoteDirection,
    ) -> RepoResult<Option<PostVote>>;
    /// Deletes the vote and undoes its counter. Returns the affected-row count.
    async fn remove_post_vote(&self, post_id: PostId, user_id: UserId) -> RepoResult<u64>;
}

#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait CommentRepository: Send + Sync {
    async fn find_comments_by_post(
        &self,
        post_id: PostId,
        viewer: UserId,
    ) -> RepoResult<Vec<CommentView>>;
    /// Opens a transaction for a comment write and its post status-touch.
    async fn begin(&self) -> RepoResult<Box<dyn CommentTransaction>>;
    async fn delete_comment(&self, comment_id: CommentId, user_id: UserId) -> RepoResult<u64>;
    async fn cast_comment_vote(
        &self,
        comment_id: CommentId,
        user_id: UserId,
        direction: VoteDirection,
    ) -> RepoResult<Option<CommentVote>>;
    async fn remove_comment_vote(&self, comment_id: CommentId, user_id: UserId)
        -> RepoResult<u64>;
}

/// Statements bound to one open transaction.
///
/// Nothing written through it is visible to other callers until `commit`.
/// Dropping it without committing discards every write.
#[async_trait]
pub trait CommentTransaction: Send {
    async fn insert_comment(&mut self, comment: &NewComment) -> RepoResult<Comment>;
    /// `None` when no comment with that id is owned by the caller.
    async fn update_comment(&mut self, update: &CommentUpdate) -> RepoResult<Option<Comment>>;
    /// Sets the post's `updated_at` to the transaction time. Returns rows affected.
    async fn touch_post(&mut self, post_id: PostId) -> RepoResult<u64>;
    async fn commit(self: Box<Self>) -> RepoResult<()>;
    async fn rollback(self: Box<Self>) -> RepoResult<()>;
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("token expired")]
    Expired,

    #[error("invalid token: {0}")]
    Invalid(String),

    #[error("failed to sign token: {0}")]
    Signing(String),
}

/// Issues signed, time-limited bearer tokens carrying the user id.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait TokenIssuer: Send + Sync {
    fn issue(&self, user_id: UserId) -> Result<String, TokenError>;
}

/// Verifies a bearer token and returns the user id it was issued for.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait TokenVerifier: Send + Sync {
    fn verify(&self, token: &str) -> Result<UserId, TokenError>;
}
