//! Request ID propagation and per-request access logging.

use axum::{
    extract::{ConnectInfo, MatchedPath, Request},
    http::{HeaderMap, HeaderValue, header::USER_AGENT},
    middleware::Next,
    response::Response,
};
use std::{net::SocketAddr, time::Instant};
use tracing::Instrument;
use uuid::Uuid;

use crate::{
    logging::{self, ApiRequestLog},
    metrics,
};

/// Header name for request ID
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Metric `path` label for requests that matched no route
pub const UNMATCHED_ROUTE_LABEL: &str = "unmatched";

/// Reuse the caller's request ID or mint a fresh one
fn get_or_generate_request_id(headers: &HeaderMap) -> String {
    headers
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

/// Tags the request with an ID, echoes it on the response and logs the exchange.
///
/// Handlers run inside a `request` span carrying the ID, so their own log
/// lines correlate with the access log entry.
pub async fn request_log_middleware(request: Request, next: Next) -> Response {
    let started = Instant::now();
    let request_id = get_or_generate_request_id(request.headers());

    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    // Metric label: route template, never the raw path
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| UNMATCHED_ROUTE_LABEL.to_string());
    let remote_addr = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.to_string());
    let user_agent = request
        .headers()
        .get(USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let span = tracing::info_span!("request", request_id = %request_id);
    let mut response = next.run(request).instrument(span).await;

    if let Ok(header_value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, header_value);
    }

    let elapsed = started.elapsed();
    let status = response.status().as_u16();
    logging::log_api_request(&ApiRequestLog {
        request_id: &request_id,
        method: &method,
        path: &path,
        status_code: status,
        duration_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
        remote_addr: remote_addr.as_deref(),
        user_agent: user_agent.as_deref(),
    });
    metrics::http_requests_total(&method, &route, status);
    metrics::http_request_duration_ms(&method, &route, elapsed.as_secs_f64() * 1000.0);

    response
}
