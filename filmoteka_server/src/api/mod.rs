//! HTTP API for the filmoteka server.
//!
//! # Modules
//!
//! - [`auth`]: Signup, login, session check and logout
//! - [`sessions`]: Session maintenance (admin only)
//! - [`middleware`]: The access gate guarding protected routes
//! - [`cookies`]: `session_id` cookie encoding and extraction
//! - [`request_log`]: Request IDs and access logging
//! - [`error`]: JSON error responses
//!
//! # Endpoints
//!
//! ```text
//! POST   /signup             - Register and log in (public)
//! POST   /login              - Log in (public)
//! GET    /auth               - Current user ID (session required)
//! DELETE /logout             - Revoke the current session (session required)
//! DELETE /sessions/expired   - Purge expired sessions (admin only)
//! GET    /health             - Store connectivity (public)
//! ```
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use filmoteka::{AuthManager, CookieSettings, auth::Argon2Hasher, db::InMemoryAuthRepository};
//! use filmoteka_server::api::{AppState, create_router};
//! use std::sync::Arc;
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!
//! let auth_manager = AuthManager::new(
//!     Arc::new(InMemoryAuthRepository::new()),
//!     Arc::new(Argon2Hasher::new("a-long-server-side-pepper")),
//!     CookieSettings::default(),
//! );
//! let app = create_router(AppState {
//!     auth_manager: Arc::new(auth_manager),
//! });
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # CORS
//!
//! CORS is configured permissively for development. In production, configure
//! appropriate origins, methods, and headers.

pub mod auth;
pub mod cookies;
pub mod error;
pub mod middleware;
pub mod request_log;
pub mod sessions;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{delete, get, post},
};
use filmoteka::AuthManager;
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use middleware::{Access, protect};

/// Application state shared across all HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    pub auth_manager: Arc<AuthManager>,
}

/// Create the complete API router with all endpoints and middleware.
pub fn create_router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/signup", post(auth::sign_up))
        .route("/login", post(auth::login))
        .route("/health", get(health_check));

    let session_routes = protect(
        Router::new()
            .route("/auth", get(auth::auth))
            .route("/logout", delete(auth::logout)),
        &state,
        Access::LoginRequired,
    );

    let admin_routes = protect(
        Router::new().route("/sessions/expired", delete(sessions::purge_expired)),
        &state,
        Access::AdminOnly,
    );

    Router::new()
        .merge(public_routes)
        .merge(session_routes)
        .merge(admin_routes)
        .layer(axum::middleware::from_fn(request_log::request_log_middleware))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check endpoint for monitoring and load balancers.
///
/// Returns `200 OK` when the user/session store answers, `503 Service
/// Unavailable` otherwise.
///
/// ```bash
/// curl http://localhost:8080/health
/// # {"status":"healthy","version":"0.1.0","store":true,"timestamp":"2025-11-22T10:30:00Z"}
/// ```
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let store_healthy = match state.auth_manager.health_check().await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "store health check failed");
            false
        }
    };

    let status_code = if store_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let response = json!({
        "status": if store_healthy { "healthy" } else { "unhealthy" },
        "version": env!("CARGO_PKG_VERSION"),
        "store": store_healthy,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    (status_code, Json(response))
}
