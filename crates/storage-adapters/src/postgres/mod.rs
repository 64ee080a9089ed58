//! # PostgreSQL store
//!
//! Maps the relational schema in `migrations/` onto the `domains` models.
//! All statements are parameterized; constraint violations are reported as
//! the matching `RepoError` variant so services can translate them.

mod comments;
mod posts;
mod rows;
mod topics;
mod users;
mod votes;

use std::time::Duration;

use domains::RepoError;
use sqlx::error::ErrorKind;
use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::info;

pub use comments::PgCommentTransaction;

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

/// Connection pool sizing.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    pub max_connections: u32,
    pub min_connections: u32,
    pub max_lifetime: Duration,
    pub idle_timeout: Duration,
    pub acquire_timeout: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: 25,
            min_connections: 5,
            max_lifetime: Duration::from_secs(30 * 60),
            idle_timeout: Duration::from_secs(5 * 60),
            acquire_timeout: Duration::from_secs(5),
        }
    }
}

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Opens a pool and checks that the database answers.
    pub async fn connect(url: &str, config: &PoolConfig) -> Result<Self, RepoError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .max_lifetime(config.max_lifetime)
            .idle_timeout(config.idle_timeout)
            .acquire_timeout(config.acquire_timeout)
            .connect(url)
            .await
            .map_err(classify)?;
        info!(
            max_connections = config.max_connections,
            min_connections = config.min_connections,
            "database pool ready"
        );
        Ok(Self { pool })
    }

    /// Applies any pending schema migrations.
    pub async fn migrate(&self) -> Result<(), RepoError> {
        MIGRATOR.run(&self.pool).await.map_err(RepoError::backend)?;
        info!("database migrations applied");
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Sorts a driver error into the constraint taxonomy the services understand.
pub(crate) fn classify(err: sqlx::Error) -> RepoError {
    let violation = err
        .as_database_error()
        .map(|db| (db.kind(), db.constraint().map(str::to_owned)));
    match violation {
        Some((ErrorKind::UniqueViolation, constraint)) => RepoError::UniqueViolation { constraint },
        Some((ErrorKind::ForeignKeyViolation, constraint)) => {
            RepoError::ForeignKeyViolation { constraint }
        }
        Some((ErrorKind::CheckViolation, constraint)) => RepoError::CheckViolation { constraint },
        _ => RepoError::backend(err),
    }
}
