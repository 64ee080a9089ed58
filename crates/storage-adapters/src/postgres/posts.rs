use async_trait::async_trait;
use domains::{
    NewPost, Post, PostId, PostRepository, PostUpdate, PostView, PostVote, RepoResult, TopicId,
    UserId, VoteDirection,
};

use super::rows::{collect_views, PostRow, PostViewRow};
use super::votes::{self, VoteTable};
use super::{classify, PgStore};
use crate::like_pattern;

const POST_COLUMNS: &str =
    "post_id, topic_id, user_id, title, description, likes, dislikes, created_at, updated_at";

/// `$1` is always the viewing user.
const POST_VIEW_SELECT: &str = "\
    SELECT p.post_id, p.topic_id, p.user_id, u.name AS username, p.title, p.description, \
           p.likes, p.dislikes, v.vote AS user_vote, p.created_at, p.updated_at \
    FROM posts p \
    JOIN users u ON u.user_id = p.user_id \
    LEFT JOIN post_votes v ON v.post_id = p.post_id AND v.user_id = $1";

const POST_VOTES: VoteTable = VoteTable {
    lock_parent: "SELECT post_id FROM posts WHERE post_id = $1 FOR UPDATE",
    previous: "SELECT vote FROM post_votes WHERE post_id = $1 AND user_id = $2",
    upsert: "INSERT INTO post_votes (post_id, user_id, vote) VALUES ($1, $2, $3) \
             ON CONFLICT (post_id, user_id) DO UPDATE SET vote = EXCLUDED.vote, updated_at = now() \
             RETURNING post_id AS resource_id, user_id, vote, created_at, updated_at",
    delete: "DELETE FROM post_votes WHERE post_id = $1 AND user_id = $2 RETURNING vote",
    counters: "UPDATE posts SET likes = likes + $2, dislikes = dislikes + $3 WHERE post_id = $1",
};

#[async_trait]
impl PostRepository for PgStore {
    async fn find_posts_by_topic(
        &self,
        topic_id: TopicId,
        viewer: UserId,
    ) -> RepoResult<Vec<PostView>> {
        let rows = sqlx::query_as::<_, PostViewRow>(&format!(
            "{POST_VIEW_SELECT} WHERE p.topic_id = $2 ORDER BY p.updated_at DESC, p.post_id DESC"
        ))
        .bind(viewer)
        .bind(topic_id)
        .fetch_all(&self.pool)
        .await
        .map_err(classify)?;
        collect_views(rows)
    }

    async fn find_post_by_id(
        &self,
        topic_id: TopicId,
        post_id: PostId,
        viewer: UserId,
    ) -> RepoResult<Option<PostView>> {
        let row = sqlx::query_as::<_, PostViewRow>(&format!(
            "{POST_VIEW_SELECT} WHERE p.topic_id = $2 AND p.post_id = $3"
        ))
        .bind(viewer)
        .bind(topic_id)
        .bind(post_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(classify)?;
        row.map(PostView::try_from).transpose()
    }

    #[tracing::instrument(skip(self, post), fields(topic_id = post.topic_id))]
    async fn create_post(&self, post: &NewPost) -> RepoResult<Post> {
        let row = sqlx::query_as::<_, PostRow>(&format!(
            "INSERT INTO posts (topic_id, user_id, title, description) \
             VALUES ($1, $2, $3, $4) RETURNING {POST_COLUMNS}"
        ))
        .bind(post.topic_id)
        .bind(post.user_id)
        .bind(&post.title)
        .bind(&post.description)
        .fetch_one(&self.pool)
        .await
        .map_err(classify)?;
        Ok(row.into())
    }

    #[tracing::instrument(skip(self, update), fields(post_id = update.post_id))]
    async fn update_post(&self, update: &PostUpdate) -> RepoResult<Option<Post>> {
        let row = sqlx::query_as::<_, PostRow>(&format!(
            "UPDATE posts SET title = $3, description = $4, updated_at = now() \
             WHERE post_id = $1 AND user_id = $2 RETURNING {POST_COLUMNS}"
        ))
        .bind(update.post_id)
        .bind(update.user_id)
        .bind(&update.title)
        .bind(&update.description)
        .fetch_optional(&self.pool)
        .await
        .map_err(classify)?;
        Ok(row.map(Post::from))
    }

    #[tracing::instrument(skip(self))]
    async fn delete_post(&self, post_id: PostId, user_id: UserId) -> RepoResult<u64> {
        let result = sqlx::query("DELETE FROM posts WHERE post_id = $1 AND user_id = $2")
            .bind(post_id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(classify)?;
        Ok(result.rows_affected())
    }

    async fn search_posts(
        &self,
        topic_id: TopicId,
        query: &str,
        viewer: UserId,
    ) -> RepoResult<Vec<PostView>> {
        let rows = sqlx::query_as::<_, PostViewRow>(&format!(
            "{POST_VIEW_SELECT} WHERE p.topic_id = $2 \
             AND (p.title ILIKE $3 ESCAPE '\\' OR p.description ILIKE $3 ESCAPE '\\') \
             ORDER BY p.updated_at DESC, p.post_id DESC"
        ))
        .bind(viewer)
        .bind(topic_id)
        .bind(like_pattern(query))
        .fetch_all(&self.pool)
        .await
        .map_err(classify)?;
        collect_views(rows)
    }

    #[tracing::instrument(skip(self))]
    async fn cast_post_vote(
        &self,
        post_id: PostId,
        user_id: UserId,
        direction: VoteDirection,
    ) -> RepoResult<Option<PostVote>> {
        votes::cast(&self.pool, &POST_VOTES, post_id, user_id, direction)
            .await?
            .map(PostVote::try_from)
            .transpose()
    }

    #[tracing::instrument(skip(self))]
    async fn remove_post_vote(&self, post_id: PostId, user_id: UserId) -> RepoResult<u64> {
        votes::remove(&self.pool, &POST_VOTES, post_id, user_id).await
    }
}
