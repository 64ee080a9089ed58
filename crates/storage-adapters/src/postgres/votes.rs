//! Vote writes shared by posts and comments.
//!
//! Each operation runs in its own transaction that first locks the parent
//! row. Concurrent votes on one post or comment queue on that lock, so the
//! read of the previous vote and the counter update never interleave.

use domains::{CounterDelta, RepoResult, UserId, VoteDirection};
use sqlx::postgres::{PgPool, Postgres};
use sqlx::Transaction;
use tracing::debug;

use super::classify;
use super::rows::{decode_vote, VoteRow};

/// The statements for one vote table. `$1` is the parent id, `$2` the user.
pub(super) struct VoteTable {
    pub lock_parent: &'static str,
    pub previous: &'static str,
    pub upsert: &'static str,
    pub delete: &'static str,
    pub counters: &'static str,
}

/// Upserts the vote. `None` when the parent row does not exist.
pub(super) async fn cast(
    pool: &PgPool,
    table: &VoteTable,
    resource_id: i64,
    user_id: UserId,
    direction: VoteDirection,
) -> RepoResult<Option<VoteRow>> {
    let mut tx = pool.begin().await.map_err(classify)?;
    if !lock_parent(&mut tx, table, resource_id).await? {
        return Ok(None);
    }

    let previous: Option<i16> = sqlx::query_scalar(table.previous)
        .bind(resource_id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(classify)?;
    let previous = previous.map(decode_vote).transpose()?;

    let row = sqlx::query_as::<_, VoteRow>(table.upsert)
        .bind(resource_id)
        .bind(user_id)
        .bind(direction.score())
        .fetch_one(&mut *tx)
        .await
        .map_err(classify)?;

    let delta = CounterDelta::transition(previous, Some(direction));
    apply_delta(&mut tx, table, resource_id, delta).await?;
    tx.commit().await.map_err(classify)?;
    Ok(Some(row))
}

/// Deletes the vote and undoes its counter. Returns rows deleted.
pub(super) async fn remove(
    pool: &PgPool,
    table: &VoteTable,
    resource_id: i64,
    user_id: UserId,
) -> RepoResult<u64> {
    let mut tx = pool.begin().await.map_err(classify)?;
    if !lock_parent(&mut tx, table, resource_id).await? {
        return Ok(0);
    }

    let removed: Option<i16> = sqlx::query_scalar(table.delete)
        .bind(resource_id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(classify)?;
    let Some(score) = removed else {
        return Ok(0);
    };

    let delta = CounterDelta::transition(Some(decode_vote(score)?), None);
    apply_delta(&mut tx, table, resource_id, delta).await?;
    tx.commit().await.map_err(classify)?;
    Ok(1)
}

async fn lock_parent(
    tx: &mut Transaction<'static, Postgres>,
    table: &VoteTable,
    resource_id: i64,
) -> RepoResult<bool> {
    let locked: Option<i64> = sqlx::query_scalar(table.lock_parent)
        .bind(resource_id)
        .fetch_optional(&mut **tx)
        .await
        .map_err(classify)?;
    Ok(locked.is_some())
}

async fn apply_delta(
    tx: &mut Transaction<'static, Postgres>,
    table: &VoteTable,
    resource_id: i64,
    delta: CounterDelta,
) -> RepoResult<()> {
    if delta.is_zero() {
        return Ok(());
    }
    debug!(resource_id, likes = delta.likes, dislikes = delta.dislikes, "adjusting counters");
    sqlx::query(table.counters)
        .bind(resource_id)
        .bind(delta.likes)
        .bind(delta.dislikes)
        .execute(&mut **tx)
        .await
        .map_err(classify)?;
    Ok(())
}
