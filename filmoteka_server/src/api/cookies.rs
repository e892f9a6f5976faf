//! Session cookie encoding and extraction.

use axum::http::{HeaderMap, header::COOKIE};
use chrono::{DateTime, Months, Utc};
use filmoteka::CookieSettings;

/// Name of the cookie carrying the session token
pub const SESSION_COOKIE_NAME: &str = "session_id";

/// `Set-Cookie` value for a freshly issued session.
///
/// `expires_at` must be the expiry stored with the session row.
pub fn session_cookie(token: &str, expires_at: DateTime<Utc>, settings: &CookieSettings) -> String {
    build_cookie(token, expires_at, settings)
}

/// `Set-Cookie` value that makes the client drop its session cookie
pub fn expired_session_cookie(settings: &CookieSettings) -> String {
    let past = Utc::now()
        .checked_sub_months(Months::new(1))
        .unwrap_or(DateTime::<Utc>::MIN_UTC);
    build_cookie("", past, settings)
}

fn build_cookie(value: &str, expires_at: DateTime<Utc>, settings: &CookieSettings) -> String {
    let mut cookie = format!(
        "{}={}; Path=/; Expires={}",
        SESSION_COOKIE_NAME,
        value,
        expires_at.format("%a, %d %b %Y %H:%M:%S GMT")
    );
    if settings.http_only {
        cookie.push_str("; HttpOnly");
    }
    if settings.secure {
        cookie.push_str("; Secure");
    }
    cookie.push_str("; SameSite=None");
    cookie
}

/// Extract the session token from the request's `Cookie` headers.
///
/// Returns `None` when the cookie is missing or empty.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE_NAME)
        .map(|(_, value)| value.trim_matches('"').to_string())
        .filter(|value| !value.is_empty())
}
