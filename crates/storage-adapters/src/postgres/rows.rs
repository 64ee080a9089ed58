use chrono::{DateTime, Utc};
use domains::{
    Comment, CommentView, CommentVote, Post, PostView, PostVote, RepoError, RepoResult, Topic,
    User, VoteDirection,
};
use sqlx::FromRow;

pub(super) fn decode_vote(score: i16) -> RepoResult<VoteDirection> {
    VoteDirection::from_score(score)
        .ok_or_else(|| RepoError::Corrupt(format!("vote column holds {score}")))
}

fn decode_user_vote(score: Option<i16>) -> RepoResult<Option<VoteDirection>> {
    score.map(decode_vote).transpose()
}

#[derive(FromRow)]
pub(super) struct UserRow {
    user_id: i64,
    name: String,
    created_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            user_id: row.user_id,
            name: row.name,
            created_at: row.created_at,
        }
    }
}

#[derive(FromRow)]
pub(super) struct TopicRow {
    topic_id: i64,
    user_id: i64,
    title: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<TopicRow> for Topic {
    fn from(row: TopicRow) -> Self {
        Topic {
            topic_id: row.topic_id,
            user_id: row.user_id,
            title: row.title,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(FromRow)]
pub(super) struct PostRow {
    post_id: i64,
    topic_id: i64,
    user_id: i64,
    title: String,
    description: String,
    likes: i64,
    dislikes: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<PostRow> for Post {
    fn from(row: PostRow) -> Self {
        Post {
            post_id: row.post_id,
            topic_id: row.topic_id,
            user_id: row.user_id,
            title: row.title,
            description: row.description,
            likes: row.likes,
            dislikes: row.dislikes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// A post joined with its author's name and the viewer's vote.
#[derive(FromRow)]
pub(super) struct PostViewRow {
    post_id: i64,
    topic_id: i64,
    user_id: i64,
    username: String,
    title: String,
    description: String,
    likes: i64,
    dislikes: i64,
    user_vote: Option<i16>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<PostViewRow> for PostView {
    type Error = RepoError;

    fn try_from(row: PostViewRow) -> RepoResult<Self> {
        Ok(PostView {
            post_id: row.post_id,
            topic_id: row.topic_id,
            user_id: row.user_id,
            username: row.username,
            title: row.title,
            description: row.description,
            likes: row.likes,
            dislikes: row.dislikes,
            user_vote: decode_user_vote(row.user_vote)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(FromRow)]
pub(super) struct CommentRow {
    comment_id: i64,
    post_id: i64,
    user_id: i64,
    description: String,
    likes: i64,
    dislikes: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CommentRow> for Comment {
    fn from(row: CommentRow) -> Self {
        Comment {
            comment_id: row.comment_id,
            post_id: row.post_id,
            user_id: row.user_id,
            description: row.description,
            likes: row.likes,
            dislikes: row.dislikes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(FromRow)]
pub(super) struct CommentViewRow {
    comment_id: i64,
    post_id: i64,
    user_id: i64,
    username: String,
    description: String,
    likes: i64,
    dislikes: i64,
    user_vote: Option<i16>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<CommentViewRow> for CommentView {
    type Error = RepoError;

    fn try_from(row: CommentViewRow) -> RepoResult<Self> {
        Ok(CommentView {
            comment_id: row.comment_id,
            post_id: row.post_id,
            user_id: row.user_id,
            username: row.username,
            description: row.description,
            likes: row.likes,
            dislikes: row.dislikes,
            user_vote: decode_user_vote(row.user_vote)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// A vote row from either vote table; `resource_id` is the post or comment id.
#[derive(FromRow)]
pub(super) struct VoteRow {
    pub resource_id: i64,
    pub user_id: i64,
    pub vote: i16,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<VoteRow> for PostVote {
    type Error = RepoError;

    fn try_from(row: VoteRow) -> RepoResult<Self> {
        Ok(PostVote {
            post_id: row.resource_id,
            user_id: row.user_id,
            vote: decode_vote(row.vote)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

impl TryFrom<VoteRow> for CommentVote {
    type Error = RepoError;

    fn try_from(row: VoteRow) -> RepoResult<Self> {
        Ok(CommentVote {
            comment_id: row.resource_id,
            user_id: row.user_id,
            vote: decode_vote(row.vote)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Converts a batch of view rows, failing on the first corrupt one.
pub(super) fn collect_views<R, T>(rows: Vec<R>) -> RepoResult<Vec<T>>
where
    T: TryFrom<R, Error = RepoError>,
{
    rows.into_iter().map(T::try_from).collect()
}
