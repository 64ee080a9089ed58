use async_trait::async_trait;
use domains::{
    Comment, CommentId, CommentRepository, CommentTransaction, CommentUpdate, CommentView,
    CommentVote, NewComment, PostId, RepoResult, UserId, VoteDirection,
};
use sqlx::postgres::Postgres;
use sqlx::Transaction;

use super::rows::{collect_views, CommentRow, CommentViewRow};
use super::votes::{self, VoteTable};
use super::{classify, PgStore};

const COMMENT_COLUMNS: &str =
    "comment_id, post_id, user_id, description, likes, dislikes, created_at, updated_at";

const COMMENT_VOTES: VoteTable = VoteTable {
    lock_parent: "SELECT comment_id FROM comments WHERE comment_id = $1 FOR UPDATE",
    previous: "SELECT vote FROM comment_votes WHERE comment_id = $1 AND user_id = $2",
    upsert: "INSERT INTO comment_votes (comment_id, user_id, vote) VALUES ($1, $2, $3) \
             ON CONFLICT (comment_id, user_id) DO UPDATE SET vote = EXCLUDED.vote, updated_at = now() \
             RETURNING comment_id AS resource_id, user_id, vote, created_at, updated_at",
    delete: "DELETE FROM comment_votes WHERE comment_id = $1 AND user_id = $2 RETURNING vote",
    counters: "UPDATE comments SET likes = likes + $2, dislikes = dislikes + $3 \
               WHERE comment_id = $1",
};

#[async_trait]
impl CommentRepository for PgStore {
    async fn find_comments_by_post(
        &self,
        post_id: PostId,
        viewer: UserId,
    ) -> RepoResult<Vec<CommentView>> {
        let rows = sqlx::query_as::<_, CommentViewRow>(
            "SELECT c.comment_id, c.post_id, c.user_id, u.name AS username, c.description, \
                    c.likes, c.dislikes, v.vote AS user_vote, c.created_at, c.updated_at \
             FROM comments c \
             JOIN users u ON u.user_id = c.user_id \
             LEFT JOIN comment_votes v ON v.comment_id = c.comment_id AND v.user_id = $1 \
             WHERE c.post_id = $2 \
             ORDER BY c.created_at ASC, c.comment_id ASC",
        )
        .bind(viewer)
        .bind(post_id)
        .fetch_all(&self.pool)
        .await
        .map_err(classify)?;
        collect_views(rows)
    }

    async fn begin(&self) -> RepoResult<Box<dyn CommentTransaction>> {
        let tx = self.pool.begin().await.map_err(classify)?;
        Ok(Box::new(PgCommentTransaction { tx }))
    }

    #[tracing::instrument(skip(self))]
    async fn delete_comment(&self, comment_id: CommentId, user_id: UserId) -> RepoResult<u64> {
        let result = sqlx::query("DELETE FROM comments WHERE comment_id = $1 AND user_id = $2")
            .bind(comment_id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(classify)?;
        Ok(result.rows_affected())
    }

    #[tracing::instrument(skip(self))]
    async fn cast_comment_vote(
        &self,
        comment_id: CommentId,
        user_id: UserId,
        direction: VoteDirection,
    ) -> RepoResult<Option<CommentVote>> {
        votes::cast(&self.pool, &COMMENT_VOTES, comment_id, user_id, direction)
            .await?
            .map(CommentVote::try_from)
            .transpose()
    }

    #[tracing::instrument(skip(self))]
    async fn remove_comment_vote(
        &self,
        comment_id: CommentId,
        user_id: UserId,
    ) -> RepoResult<u64> {
        votes::remove(&self.pool, &COMMENT_VOTES, comment_id, user_id).await
    }
}

/// A comment write in progress. `sqlx` rolls the transaction back if this is
/// dropped before `commit`.
pub struct PgCommentTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl CommentTransaction for PgCommentTransaction {
    async fn insert_comment(&mut self, comment: &NewComment) -> RepoResult<Comment> {
        let row = sqlx::query_as::<_, CommentRow>(&format!(
            "INSERT INTO comments (post_id, user_id, description) VALUES ($1, $2, $3) \
             RETURNING {COMMENT_COLUMNS}"
        ))
        .bind(comment.post_id)
        .bind(comment.user_id)
        .bind(&comment.description)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(classify)?;
        Ok(row.into())
    }

    async fn update_comment(&mut self, update: &CommentUpdate) -> RepoResult<Option<Comment>> {
        let row = sqlx::query_as::<_, CommentRow>(&format!(
            "UPDATE comments SET description = $3, updated_at = now() \
             WHERE comment_id = $1 AND user_id = $2 RETURNING {COMMENT_COLUMNS}"
        ))
        .bind(update.comment_id)
        .bind(update.user_id)
        .bind(&update.description)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(classify)?;
        Ok(row.map(Comment::from))
    }

    async fn touch_post(&mut self, post_id: PostId) -> RepoResult<u64> {
        let result = sqlx::query("UPDATE posts SET updated_at = now() WHERE post_id = $1")
            .bind(post_id)
            .execute(&mut *self.tx)
            .await
            .map_err(classify)?;
        Ok(result.rows_affected())
    }

    async fn commit(self: Box<Self>) -> RepoResult<()> {
        self.tx.commit().await.map_err(classify)
    }

    async fn rollback(self: Box<Self>) -> RepoResult<()> {
        self.tx.rollback().await.map_err(classify)
    }
}
