//! HTTP server initialization and runtime setup.
//!
//! Handles the credential store connection, the purge task, and the Axum
//! server lifecycle.

use crate::application::services::RememberMeService;
use crate::config::{Config, StoreBackend};
use crate::domain::repositories::CredentialStore;
use crate::infrastructure::persistence::{
    MemoryCredentialStore, PgCredentialStore, RedisCredentialStore,
};
use crate::routes::app_router;
use crate::state::AppState;
use crate::transport::CookieCodec;

use anyhow::{Context, Result};
use axum::ServiceExt;
use axum::extract::Request;
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Runs the HTTP server with the given configuration.
///
/// Initializes:
/// - Credential store (in-memory, PostgreSQL with migrations, or Redis)
/// - Cookie codec and remember-me service
/// - Background purge of expired credentials
/// - Axum HTTP server with graceful shutdown on Ctrl+C / SIGTERM
///
/// # Errors
///
/// Returns an error if:
/// - The store connection or migrations fail
/// - The cookie codec rejects the configured secret or name
/// - Server bind fails
/// - Server runtime error occurs
pub async fn run(config: Config) -> Result<()> {
    let store = build_store(&config).await?;

    let cookie_codec = CookieCodec::new(
        &config.cookie_signing_secret,
        &config.cookie_name,
        config.cookie_secure,
    )
    .map_err(anyhow::Error::msg)
    .context("Invalid cookie configuration")?;

    let remember_me = Arc::new(RememberMeService::new(
        store,
        config.remember_me_settings(),
    ));

    let purge_task = spawn_purge_task(
        remember_me.clone(),
        Duration::from_secs(config.purge_interval_seconds),
    );
    tracing::info!("Purge task started");

    let state = AppState::new(
        remember_me,
        Arc::new(cookie_codec),
        config.internal_api_token.as_str(),
    );

    let app = app_router(state, config.behind_proxy);

    let addr: SocketAddr = config.listen_addr.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{addr}");

    axum::serve(
        listener,
        ServiceExt::<Request>::into_make_service_with_connect_info::<SocketAddr>(app),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    purge_task.abort();
    tracing::info!("Server stopped");

    Ok(())
}

/// Connects the configured credential store.
///
/// # Errors
///
/// Returns an error if the backend cannot be reached or, for PostgreSQL,
/// if migrations fail.
pub async fn build_store(config: &Config) -> Result<Arc<dyn CredentialStore>> {
    let store: Arc<dyn CredentialStore> = match config.store_backend {
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory credential store; credentials are lost on restart");
            Arc::new(MemoryCredentialStore::new())
        }
        StoreBackend::Postgres => {
            let url = config
                .database_url
                .as_deref()
                .context("STORE_BACKEND=postgres requires a database connection")?;

            let pool = PgPoolOptions::new()
                .max_connections(config.db_max_connections)
                .acquire_timeout(Duration::from_secs(config.db_connect_timeout))
                .idle_timeout(Duration::from_secs(config.db_idle_timeout))
                .max_lifetime(Duration::from_secs(config.db_max_lifetime))
                .connect(url)
                .await
                .context("Failed to connect to database")?;
            tracing::info!("Connected to database");

            sqlx::migrate!("./migrations")
                .run(&pool)
                .await
                .context("Failed to run migrations")?;

            Arc::new(PgCredentialStore::new(Arc::new(pool)))
        }
        StoreBackend::Redis => {
            let url = config
                .redis_url
                .as_deref()
                .context("STORE_BACKEND=redis requires a Redis connection")?;

            Arc::new(
                RedisCredentialStore::connect(url)
                    .await
                    .context("Failed to connect to Redis")?,
            )
        }
    };

    Ok(store)
}

/// Periodically removes expired credentials.
///
/// The first purge runs one full `interval` after startup. Failures are
/// logged and retried on the next tick.
pub fn spawn_purge_task(service: Arc<RememberMeService>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // First tick completes immediately.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            if let Err(e) = service.purge_expired().await {
                tracing::warn!(error = %e, "Failed to purge expired credentials");
            }
        }
    })
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
