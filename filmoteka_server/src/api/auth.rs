//! Authentication API handlers.
//!
//! Signup and login answer with the user ID and a `session_id` cookie; logout
//! answers with an already expired cookie so the client drops it.
//!
//! # Examples
//!
//! Sign up:
//! ```bash
//! curl -i -X POST http://localhost:8080/signup \
//!   -H "Content-Type: application/json" \
//!   -d '{"username": "jane", "password": "secret", "role": "user"}'
//! ```
//!
//! Login:
//! ```bash
//! curl -i -X POST http://localhost:8080/login \
//!   -H "Content-Type: application/json" \
//!   -d '{"username": "jane", "password": "secret"}'
//! ```

use axum::{
    Extension, Json,
    extract::{State, rejection::JsonRejection},
    http::{HeaderMap, header::SET_COOKIE},
    response::{IntoResponse, Response},
};
use filmoteka::{
    AuthError, UserId,
    auth::{IssuedSession, LoginRequest, SignUpRequest},
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{
    AppState,
    cookies::{expired_session_cookie, session_cookie, session_token},
    error::ApiError,
    middleware::SessionUserId,
};
use crate::{logging::log_security_event, metrics};

#[derive(Debug, Serialize, Deserialize)]
pub struct IdResponse {
    pub id: UserId,
}

/// Register a new user account and log it in.
///
/// # Request Body
///
/// ```json
/// { "username": "jane", "password": "secret", "role": "user" }
/// ```
///
/// `role` is optional and defaults to `user`.
///
/// # Errors
///
/// - `400 Bad Request`: Malformed body, empty password, invalid username or role
/// - `409 Conflict`: Username already taken
/// - `500 Internal Server Error`: Store or hashing failure
pub async fn sign_up(
    State(state): State<AppState>,
    payload: Result<Json<SignUpRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = payload?;
    let issued = state.auth_manager.sign_up(request).await?;
    metrics::sessions_created_total("signup");
    Ok(session_response(&state, issued))
}

/// Login with username and password.
///
/// Every successful login issues an additional session; earlier sessions of
/// the same user stay valid.
///
/// # Errors
///
/// - `400 Bad Request`: Malformed body
/// - `401 Unauthorized`: Wrong password
/// - `404 Not Found`: No such user
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = payload?;
    let username = request.username.clone();

    match state.auth_manager.login(request).await {
        Ok(issued) => {
            metrics::login_attempts_total(true);
            metrics::sessions_created_total("login");
            Ok(session_response(&state, issued))
        }
        Err(err) => {
            if matches!(err, AuthError::NotFound | AuthError::PasswordMismatch) {
                metrics::login_attempts_total(false);
                // Remote address is logged with the request span
                log_security_event(
                    "failed_login",
                    None,
                    None,
                    &format!("login failed for '{}': {}", username, err),
                );
            }
            Err(err.into())
        }
    }
}

/// Return the caller's user ID. Mounted behind the authentication stage.
pub async fn auth(Extension(SessionUserId(id)): Extension<SessionUserId>) -> Json<IdResponse> {
    Json(IdResponse { id })
}

/// Delete the caller's session and expire its cookie.
///
/// Mounted behind the authentication stage, which already rejected requests
/// without a live session.
pub async fn logout(
    State(state): State<AppState>,
    Extension(SessionUserId(user_id)): Extension<SessionUserId>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let token = session_token(&headers).ok_or_else(ApiError::unauthorized)?;
    state.auth_manager.logout(&token).await?;
    tracing::debug!(user_id, "session revoked");

    let cookie = expired_session_cookie(state.auth_manager.cookie_settings());
    Ok(([(SET_COOKIE, cookie)], Json(json!({}))))
}

fn session_response(state: &AppState, issued: IssuedSession) -> Response {
    let cookie = session_cookie(
        &issued.token,
        issued.expires_at,
        state.auth_manager.cookie_settings(),
    );
    ([(SET_COOKIE, cookie)], Json(IdResponse { id: issued.user_id })).into_response()
}
