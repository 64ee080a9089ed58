//! # Domain Models
//!
//! These structs represent the core entities of the board: users, topics,
//! posts, comments and the votes cast on posts and comments.
//! Identifiers are the store's `BIGSERIAL` integers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type UserId = i64;
pub type TopicId = i64;
pub type PostId = i64;
pub type CommentId = i64;

/// The caller of a service method, already verified by the auth layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AuthenticatedUser {
    pub user_id: UserId,
}

impl AuthenticatedUser {
    pub fn new(user_id: UserId) -> Self {
        Self { user_id }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub user_id: UserId,
    /// Unique display name, also the login handle.
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
    pub topic_id: TopicId,
    /// Owner of the topic. Only the owner may rename or delete it.
    pub user_id: UserId,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A post row as written by create/update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub post_id: PostId,
    pub topic_id: TopicId,
    pub user_id: UserId,
    pub title: String,
    pub description: String,
    pub likes: i64,
    pub dislikes: i64,
    pub created_at: DateTime<Utc>,
    /// Last activity on the post: its own edits and any comment write.
    pub updated_at: DateTime<Utc>,
}

/// A post as read back for a particular caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostView {
    pub post_id: PostId,
    pub topic_id: TopicId,
    pub user_id: UserId,
    pub username: String,
    pub title: String,
    pub description: String,
    pub likes: i64,
    pub dislikes: i64,
    /// The caller's own vote on this post, if any.
    pub user_vote: Option<VoteDirection>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub comment_id: CommentId,
    pub post_id: PostId,
    pub user_id: UserId,
    pub description: String,
    pub likes: i64,
    pub dislikes: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentView {
    pub comment_id: CommentId,
    pub post_id: PostId,
    pub user_id: UserId,
    pub username: String,
    pub description: String,
    pub likes: i64,
    pub dislikes: i64,
    pub user_vote: Option<VoteDirection>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Like or dislike. Stored as `1` / `-1` in the vote tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteDirection {
    Like,
    Dislike,
}

impl VoteDirection {
    pub fn score(self) -> i16 {
        match self {
            VoteDirection::Like => 1,
            VoteDirection::Dislike => -1,
        }
    }

    pub fn from_score(score: i16) -> Option<Self> {
        match score {
            1 => Some(VoteDirection::Like),
            -1 => Some(VoteDirection::Dislike),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostVote {
    pub post_id: PostId,
    pub user_id: UserId,
    pub vote: VoteDirection,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentVote {
    pub comment_id: CommentId,
    pub user_id: UserId,
    pub vote: VoteDirection,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ── Write parameters ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTopic {
    pub user_id: UserId,
    pub title: String,
}

/// Owner-scoped rename: matches only when `user_id` owns `topic_id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicUpdate {
    pub topic_id: TopicId,
    pub user_id: UserId,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPost {
    pub topic_id: TopicId,
    pub user_id: UserId,
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostUpdate {
    pub post_id: PostId,
    pub user_id: UserId,
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewComment {
    pub post_id: PostId,
    pub user_id: UserId,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentUpdate {
    pub comment_id: CommentId,
    pub user_id: UserId,
    pub description: String,
}
