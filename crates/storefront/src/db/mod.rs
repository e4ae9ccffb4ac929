//! Optional `PostgreSQL` storage for browser sessions.
//!
//! The storefront keeps no data of its own; the bookstore backend is the
//! source of truth. A database is only used, when configured, so that
//! session records (tokens and cached profiles) survive a restart.
//!
//! # Tables
//!
//! - `tower_sessions.session` - created by [`create_session_store`]

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tower_sessions::session_store::ExpiredDeletion;
use tower_sessions_sqlx_store::PostgresStore;

/// How often expired session records are purged.
const EXPIRED_SESSION_SWEEP: Duration = Duration::from_secs(60 * 60);

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Create the session store, making sure its table exists, and start a
/// background task that deletes expired records.
///
/// # Errors
///
/// Returns `sqlx::Error` if the session table cannot be created.
pub async fn create_session_store(pool: PgPool) -> Result<PostgresStore, sqlx::Error> {
    let store = PostgresStore::new(pool);
    store.migrate().await?;

    let sweeper = store.clone();
    tokio::spawn(async move {
        if let Err(e) = sweeper
            .continuously_delete_expired(EXPIRED_SESSION_SWEEP)
            .await
        {
            tracing::error!(error = %e, "Expired session sweep stopped");
        }
    });

    Ok(store)
}
