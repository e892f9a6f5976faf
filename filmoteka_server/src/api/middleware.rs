//! Access gate for protected endpoints.
//!
//! Two stages, both driven by the `session_id` cookie:
//!
//! - [`require_session`] (authentication): resolves the cookie to a user ID and
//!   stores it as [`SessionUserId`] in the request extensions.
//! - [`require_admin`] (authorization): resolves the cookie to the full
//!   [`User`] and lets only admins through, storing the user in the extensions.
//!
//! Authentication always wraps authorization; use [`protect`] rather than
//! layering the stages by hand.
//!
//! | Outcome | Status |
//! |---|---|
//! | no cookie, unknown or expired session | `401 Unauthorized` |
//! | valid session, role is not admin | `403 Forbidden` |
//! | store failure | `500 Internal Server Error` |
//!
//! # Extracting the caller
//!
//! ```rust,no_run
//! use axum::extract::Extension;
//! use filmoteka_server::api::middleware::SessionUserId;
//!
//! async fn protected_handler(Extension(SessionUserId(user_id)): Extension<SessionUserId>) -> String {
//!     format!("Authenticated as user {}", user_id)
//! }
//! # let _ = protected_handler;
//! ```

use axum::{
    Router,
    extract::{ConnectInfo, Request, State},
    middleware::{Next, from_fn_with_state},
    response::{IntoResponse, Response},
};
use filmoteka::{AuthError, User, UserId};
use std::net::SocketAddr;

use super::{AppState, cookies::session_token, error::ApiError};
use crate::{logging::log_security_event, metrics};

/// User ID resolved by the authentication stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionUserId(pub UserId);

/// Access level required by a group of routes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Any valid session
    LoginRequired,
    /// A valid session whose user has the admin role
    AdminOnly,
}

/// Wrap `routes` in the gate stages needed for `access`.
///
/// Layers are route layers, so unmatched paths still fall through to 404.
pub fn protect(routes: Router<AppState>, state: &AppState, access: Access) -> Router<AppState> {
    let routes = match access {
        Access::LoginRequired => routes,
        Access::AdminOnly => routes.route_layer(from_fn_with_state(state.clone(), require_admin)),
    };
    // Added last, so it runs first
    routes.route_layer(from_fn_with_state(state.clone(), require_session))
}

/// Authentication stage.
///
/// The wrapped handler only runs when the cookie resolves to a live session.
pub async fn require_session(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(token) = session_token(request.headers()) else {
        return deny(&request, "missing session cookie");
    };

    match state.auth_manager.auth(&token).await {
        Ok(user_id) => {
            request.extensions_mut().insert(SessionUserId(user_id));
            next.run(request).await
        }
        Err(err @ AuthError::Internal(_)) => ApiError::from(err).into_response(),
        Err(_) => deny(&request, "unknown or expired session"),
    }
}

/// Authorization stage.
///
/// Re-resolves the cookie instead of trusting [`SessionUserId`], so it gives the
/// same answer when mounted without the authentication stage.
pub async fn require_admin(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(token) = session_token(request.headers()) else {
        return deny(&request, "missing session cookie");
    };

    let user = match state.auth_manager.user_by_session_id(&token).await {
        Ok(user) => user,
        Err(err @ AuthError::Internal(_)) => return ApiError::from(err).into_response(),
        Err(_) => return deny(&request, "unknown or expired session"),
    };

    if !user.role.is_privileged() {
        return forbid(&request, &user);
    }

    request.extensions_mut().insert(user);
    next.run(request).await
}

fn remote_addr(request: &Request) -> Option<String> {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
}

fn deny(request: &Request, reason: &str) -> Response {
    let ip = remote_addr(request);
    log_security_event(
        "access_denied",
        None,
        ip.as_deref(),
        &format!("{} {}: {}", request.method(), request.uri().path(), reason),
    );
    metrics::access_denied_total("unauthenticated");
    ApiError::unauthorized().into_response()
}

fn forbid(request: &Request, user: &User) -> Response {
    let ip = remote_addr(request);
    log_security_event(
        "access_forbidden",
        Some(user.id),
        ip.as_deref(),
        &format!(
            "{} {}: role {} lacks privilege",
            request.method(),
            request.uri().path(),
            user.role
        ),
    );
    metrics::access_denied_total("forbidden");
    ApiError::forbidden().into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::cookies::SESSION_COOKIE_NAME;
    use axum::{
        body::Body,
        http::{StatusCode, header::COOKIE},
        routing::get,
    };
    use filmoteka::{
        AuthManager, CookieSettings,
        auth::{Argon2Hasher, SignUpRequest},
        db::InMemoryAuthRepository,
    };
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };
    use tower::ServiceExt;

    fn state() -> AppState {
        let manager = AuthManager::new(
            Arc::new(InMemoryAuthRepository::new()),
            Arc::new(Argon2Hasher::new("middleware-test-pepper")),
            CookieSettings::default(),
        );
        AppState {
            auth_manager: Arc::new(manager),
        }
    }

    async fn session_for(state: &AppState, username: &str, role: &str) -> String {
        state
            .auth_manager
            .sign_up(SignUpRequest {
                username: username.to_string(),
                password: "secret".to_string(),
                role: Some(role.to_string()),
            })
            .await
            .unwrap()
            .token
    }

    /// Guarded app whose handler counts its invocations
    fn guarded(state: &AppState, access: Access) -> (Router, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let routes = Router::new().route(
            "/guarded",
            get(move || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    StatusCode::OK
                }
            }),
        );
        let app = protect(routes, state, access).with_state(state.clone());
        (app, calls)
    }

    fn request(token: Option<&str>) -> Request {
        let mut builder = axum::http::Request::builder().uri("/guarded");
        if let Some(token) = token {
            builder = builder.header(COOKIE, format!("{SESSION_COOKIE_NAME}={token}"));
        }
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_missing_cookie_is_unauthorized() {
        let state = state();
        let (app, calls) = guarded(&state, Access::LoginRequired);

        let response = app.oneshot(request(None)).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_never_issued_token_is_unauthorized() {
        let state = state();
        let (app, calls) = guarded(&state, Access::LoginRequired);

        let response = app
            .oneshot(request(Some("5f1c1e9e-0000-4000-8000-000000000000")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_valid_session_reaches_handler() {
        let state = state();
        let token = session_for(&state, "jane", "user").await;
        let (app, calls) = guarded(&state, Access::LoginRequired);

        let response = app.oneshot(request(Some(&token))).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_admin_route_rejects_anonymous_before_role_check() {
        let state = state();
        let (app, calls) = guarded(&state, Access::AdminOnly);

        let response = app.oneshot(request(Some("nope"))).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_non_admin_is_forbidden() {
        let state = state();
        let token = session_for(&state, "jane", "user").await;
        let (app, calls) = guarded(&state, Access::AdminOnly);

        let response = app.oneshot(request(Some(&token))).await.unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_admin_invokes_handler_once() {
        let state = state();
        let token = session_for(&state, "root", "admin").await;
        let (app, calls) = guarded(&state, Access::AdminOnly);

        let response = app.oneshot(request(Some(&token))).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_logged_out_session_is_rejected() {
        let state = state();
        let token = session_for(&state, "root", "admin").await;
        state.auth_manager.logout(&token).await.unwrap();
        let (app, calls) = guarded(&state, Access::AdminOnly);

        let response = app.oneshot(request(Some(&token))).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
