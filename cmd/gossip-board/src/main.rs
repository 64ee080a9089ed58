//! # gossip-board
//!
//! Loads settings, opens the store selected at compile time, wires the
//! services into the HTTP router and serves until SIGINT/SIGTERM.

use std::sync::Arc;

use anyhow::Context;
use api_adapters::{router, AppState, Metrics};
use auth_adapters::JwtTokens;
use axum::http::HeaderValue;
use configs::{DatabaseSettings, LogFormat, Settings, TelemetrySettings};
use domains::{CommentRepository, PostRepository, TopicRepository, UserRepository};
use secrecy::ExposeSecret;
use services::{AuthService, CommentService, PostService, TopicService, UserService};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[cfg(not(any(feature = "db-postgres", feature = "db-memory")))]
compile_error!("enable one of the `db-postgres` or `db-memory` features");

struct Repositories {
    users: Arc<dyn UserRepository>,
    topics: Arc<dyn TopicRepository>,
    posts: Arc<dyn PostRepository>,
    comments: Arc<dyn CommentRepository>,
}

impl Repositories {
    fn from_store<S>(store: S) -> Self
    where
        S: UserRepository + TopicRepository + PostRepository + CommentRepository + 'static,
    {
        let store = Arc::new(store);
        Self {
            users: store.clone(),
            topics: store.clone(),
            posts: store.clone(),
            comments: store,
        }
    }
}

#[cfg(feature = "db-postgres")]
async fn open_store(settings: &DatabaseSettings) -> anyhow::Result<Repositories> {
    use storage_adapters::postgres::{PgStore, PoolConfig};

    let pool = PoolConfig {
        max_connections: settings.max_connections,
        min_connections: settings.min_connections,
        max_lifetime: settings.max_lifetime(),
        idle_timeout: settings.idle_timeout(),
        acquire_timeout: settings.acquire_timeout(),
    };
    let url = settings.require_url().context("database settings")?;
    let store = PgStore::connect(url, &pool)
        .await
        .context("connecting to postgres")?;
    if settings.run_migrations {
        store.migrate().await.context("running migrations")?;
    }
    Ok(Repositories::from_store(store))
}

#[cfg(all(feature = "db-memory", not(feature = "db-postgres")))]
async fn open_store(_settings: &DatabaseSettings) -> anyhow::Result<Repositories> {
    tracing::warn!("using the in-memory store, data is lost on exit");
    Ok(Repositories::from_store(
        storage_adapters::memory::MemoryStore::new(),
    ))
}

fn init_tracing(telemetry: &TelemetrySettings) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&telemetry.filter));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match telemetry.log_format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.pretty().init(),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for ctrl-c");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().context("loading settings")?;
    init_tracing(&settings.telemetry);

    let repos = open_store(&settings.database).await?;
    let tokens = Arc::new(JwtTokens::new(
        settings.auth.jwt_secret.expose_secret().as_bytes(),
        chrono::Duration::hours(settings.auth.token_ttl_hours),
    ));

    let state = AppState {
        users: UserService::new(repos.users.clone()),
        topics: TopicService::new(repos.topics.clone()),
        posts: PostService::new(repos.posts.clone(), repos.topics),
        comments: CommentService::new(repos.comments, repos.posts),
        auth: AuthService::new(repos.users, tokens.clone()),
        verifier: tokens,
        metrics: Arc::new(Metrics::new()),
        frontend_url: settings.server.frontend_url.clone(),
    };
    let origin = HeaderValue::from_str(&settings.server.frontend_url)
        .context("frontend url is not a valid origin header")?;
    let app = router(state, origin);

    let address = settings.bind_address();
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("binding {address}"))?;
    info!(%address, "gossip board listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving http")?;
    info!("server stopped");
    Ok(())
}
