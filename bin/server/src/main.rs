use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use team_pulse_platform_access::{AuthService, SessionStore, TokenCodec};
use team_pulse_server::{
    app,
    auth::{AppState, GoogleOAuthClient, GoogleOAuthError},
    config::ServerConfig,
    db::{PgAccountStore, PgSessionStore, PgTeamMemberStore},
};
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration from environment
    let config = ServerConfig::from_env()?;
    tracing::info!(environment = ?config.environment, "Loaded configuration");

    // Create database connection pool
    let db_pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;

    // Run migrations
    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations").run(&db_pool).await?;

    let accounts = Arc::new(PgAccountStore::new(db_pool.clone()));
    let team_members = Arc::new(PgTeamMemberStore::new(db_pool.clone()));
    let sessions = Arc::new(PgSessionStore::new(db_pool));

    // Cleanup expired sessions on startup
    cleanup_expired_sessions(sessions.as_ref(), "startup").await;

    // Spawn periodic session cleanup task
    let cleanup_sessions = sessions.clone();
    let cleanup_interval = Duration::from_secs(config.session.cleanup_interval_seconds);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(cleanup_interval);
        // The first tick completes immediately and startup already cleaned up.
        interval.tick().await;
        loop {
            interval.tick().await;
            cleanup_expired_sessions(cleanup_sessions.as_ref(), "periodic").await;
        }
    });

    let google = match GoogleOAuthClient::new(&config.google) {
        Ok(client) => Some(client),
        Err(GoogleOAuthError::NotConfigured) => {
            tracing::info!("Google OAuth not configured, Google login disabled");
            None
        }
        Err(e) => return Err(e.into()),
    };

    let auth = AuthService::new(
        accounts,
        team_members.clone(),
        sessions,
        TokenCodec::new(config.auth.token_settings()),
    );
    let state = Arc::new(AppState::new(&config, auth, team_members, google));
    let router = app::router(state, &config)?;

    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    tracing::info!("listening on http://{}", listener.local_addr()?);

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("server stopped");
    Ok(())
}

async fn cleanup_expired_sessions(sessions: &dyn SessionStore, trigger: &'static str) {
    match sessions.delete_expired().await {
        Ok(count) if count > 0 => {
            tracing::info!(deleted_sessions = count, trigger, "Cleaned up expired sessions");
        }
        Ok(_) => {}
        Err(e) => {
            tracing::warn!(error = %e, trigger, "Failed to cleanup expired sessions");
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to listen for SIGTERM");
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

    tracing::info!("shutdown signal received");
}
