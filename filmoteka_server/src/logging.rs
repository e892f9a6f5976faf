//! Structured logging configuration.
//!
//! The library crate logs through the `log` facade; `init` bridges those records
//! into the same subscriber.

use filmoteka::UserId;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize structured logging
///
/// Log levels come from `RUST_LOG`, defaulting to `info,sqlx=warn,hyper=warn`.
///
/// # Example
///
/// ```no_run
/// use filmoteka_server::logging;
///
/// #[tokio::main]
/// async fn main() {
///     logging::init();
///     tracing::info!("Server starting");
/// }
/// ```
pub fn init() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn,hyper=warn"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    tracing::info!("Structured logging initialized");
}

/// Log security event with structured data
///
/// # Arguments
///
/// * `event_type` - Type of security event
/// * `user_id` - Optional user ID
/// * `ip_address` - Optional IP address
/// * `message` - Event message
///
/// # Example
///
/// ```
/// use filmoteka_server::logging::log_security_event;
///
/// log_security_event(
///     "failed_login",
///     Some(123),
///     Some("192.168.1.1"),
///     "Invalid password attempt"
/// );
/// ```
pub fn log_security_event(
    event_type: &str,
    user_id: Option<UserId>,
    ip_address: Option<&str>,
    message: &str,
) {
    tracing::warn!(
        event_type = event_type,
        user_id = user_id,
        ip_address = ip_address,
        "SECURITY: {}",
        message
    );
}

/// A completed HTTP exchange, as seen by the request logger
#[derive(Debug)]
pub struct ApiRequestLog<'a> {
    pub request_id: &'a str,
    pub method: &'a str,
    pub path: &'a str,
    pub status_code: u16,
    pub duration_ms: u64,
    pub remote_addr: Option<&'a str>,
    pub user_agent: Option<&'a str>,
}

/// Log API request/response
///
/// Server errors are logged at `warn`, everything else at `info`.
pub fn log_api_request(entry: &ApiRequestLog<'_>) {
    if entry.status_code >= 500 {
        tracing::warn!(
            request_id = entry.request_id,
            http_method = entry.method,
            http_path = entry.path,
            http_status = entry.status_code,
            duration_ms = entry.duration_ms,
            remote_addr = entry.remote_addr,
            user_agent = entry.user_agent,
            "API request failed"
        );
    } else {
        tracing::info!(
            request_id = entry.request_id,
            http_method = entry.method,
            http_path = entry.path,
            http_status = entry.status_code,
            duration_ms = entry.duration_ms,
            remote_addr = entry.remote_addr,
            user_agent = entry.user_agent,
            "API request completed"
        );
    }
}
