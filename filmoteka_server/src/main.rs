//! Filmoteka HTTP server.
//!
//! Serves session-cookie authentication backed by PostgreSQL or, for local
//! development, a process-local store.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Error};
use filmoteka::{
    AuthManager,
    auth::Argon2Hasher,
    db::{AuthRepository, Database, InMemoryAuthRepository},
};
use filmoteka_server::{
    api,
    config::{ServerConfig, StoreBackend},
    logging, metrics,
};
use pico_args::Arguments;
use tracing::{error, info, warn};

const HELP: &str = "\
Run the filmoteka HTTP server

USAGE:
  filmoteka_server [OPTIONS]

OPTIONS:
  --bind       IP:PORT     Server socket bind address  [default: env SERVER_BIND or 127.0.0.1:8080]
  --db-url     URL         Database connection string  [default: env DATABASE_URL or postgres://postgres@localhost/filmoteka]

FLAGS:
  -h, --help               Print help information

ENVIRONMENT:
  SERVER_BIND                  Server bind address (e.g., 0.0.0.0:8080)
  STORE_BACKEND                postgres (default) or memory
  DATABASE_URL                 PostgreSQL connection string
  DB_QUERY_TIMEOUT_SECS        Per-query store timeout [default: 5]
  PASSWORD_PEPPER              Password hashing pepper (required, 16+ chars)
  COOKIE_SECURE                Set the Secure cookie attribute [default: true]
  COOKIE_HTTP_ONLY             Set the HttpOnly cookie attribute [default: true]
  SESSION_EXPIRE_YEARS         Session lifetime, years part [default: 0]
  SESSION_EXPIRE_MONTHS        Session lifetime, months part [default: 0]
  SESSION_EXPIRE_DAYS          Session lifetime, days part [default: 7]
  SESSION_PURGE_INTERVAL_SECS  Expired session cleanup period, 0 disables [default: 3600]
  METRICS_BIND                 Prometheus exporter address (disabled when unset)
";

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        return Ok(());
    }

    let bind_override: Option<SocketAddr> = pargs.opt_value_from_str("--bind")?;
    let database_url_override: Option<String> = pargs.opt_value_from_str("--db-url")?;
    let remaining = pargs.finish();
    if !remaining.is_empty() {
        anyhow::bail!("Unexpected arguments: {:?}", remaining);
    }

    let config = ServerConfig::from_env(bind_override, database_url_override)?;
    config.validate()?;

    logging::init();
    info!("Starting filmoteka server at {}", config.bind);

    if let Some(addr) = config.metrics_bind {
        metrics::init_metrics(addr).map_err(|e| anyhow::anyhow!(e))?;
        info!("Prometheus metrics exported on http://{}/metrics", addr);
    }

    let (repository, database): (Arc<dyn AuthRepository>, Option<Database>) = match config.store {
        StoreBackend::Postgres => {
            let db = Database::new(&config.database)
                .await
                .context("Failed to connect to database")?;
            db.migrate().await.context("Failed to run migrations")?;
            info!("Database connected and migrated");
            (Arc::new(db.auth_repository()), Some(db))
        }
        StoreBackend::Memory => {
            warn!("Using the in-memory store; users and sessions are lost on restart");
            (Arc::new(InMemoryAuthRepository::new()), None)
        }
    };

    let auth_manager = Arc::new(AuthManager::new(
        repository,
        Arc::new(Argon2Hasher::new(config.security.password_pepper.clone())),
        config.cookie.clone(),
    ));

    if config.session_purge_interval_secs > 0 {
        spawn_session_purger(
            auth_manager.clone(),
            Duration::from_secs(config.session_purge_interval_secs),
        );
    }

    let app = api::create_router(api::AppState { auth_manager });

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind))?;

    info!(
        "Server is running at http://{}. Press Ctrl+C to stop.",
        config.bind
    );

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("Server error")?;

    info!("Shutting down server...");
    if let Some(db) = database {
        db.close().await;
    }

    Ok(())
}

/// Periodically drop expired session rows
fn spawn_session_purger(auth_manager: Arc<AuthManager>, period: Duration) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        loop {
            ticker.tick().await;
            match auth_manager.purge_expired_sessions().await {
                Ok(0) => {}
                Ok(purged) => {
                    metrics::sessions_purged_total(purged);
                    info!(purged, "purged expired sessions");
                }
                Err(e) => error!(error = %e, "expired session purge failed"),
            }
        }
    });
}

/// Graceful shutdown signal
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to install Ctrl+C handler; graceful shutdown disabled");
        std::future::pending::<()>().await;
    }
}
