//! Logging middleware
//!
//! Records HTTP request and response information

use crate::middleware::trace::TraceContext;
use axum::{
    extract::Request,
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use std::time::Instant;
use tracing::{info, warn, Instrument};

/// Requests slower than this are flagged
const SLOW_REQUEST_SECS: u64 = 5;

/// Request logging middleware
///
/// Records detailed information for each HTTP request
pub async fn request_logging_middleware(request: Request, next: Next) -> Response {
    let start_time = Instant::now();
    let method = request.method().clone();
    let uri = request.uri().clone();
    let trace_id = request
        .extensions()
        .get::<TraceContext>()
        .map(|context| context.trace_id.clone())
        .unwrap_or_else(|| "n/a".to_string());

    let span = tracing::info_span!(
        "http_request",
        trace_id = %trace_id,
        method = %method,
        path = %uri.path(),
        query = %uri.query().unwrap_or(""),
    );

    info!(
        parent: &span,
        "Request started: {} {} - Client: {} - User-Agent: {}",
        method,
        uri,
        get_client_ip(request.headers()).unwrap_or_else(|| "unknown".to_string()),
        request
            .headers()
            .get("user-agent")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("unknown")
    );

    let response = next.run(request).instrument(span.clone()).await;

    let duration = start_time.elapsed();
    let status = response.status();
    let elapsed_ms = duration.as_secs_f64() * 1000.0;

    if status.is_server_error() {
        warn!(parent: &span, "Server error: {} - Duration: {:.2}ms", status, elapsed_ms);
    } else if status.is_client_error() {
        warn!(parent: &span, "Client error: {} - Duration: {:.2}ms", status, elapsed_ms);
    } else {
        info!(parent: &span, "Request completed: {} - Duration: {:.2}ms", status, elapsed_ms);
    }

    if duration.as_secs() > SLOW_REQUEST_SECS {
        warn!(
            parent: &span,
            "Slow request detected: {} {} - Duration: {:.2}s",
            method,
            uri,
            duration.as_secs_f64()
        );
    }

    response
}

/// Get client IP address
pub fn get_client_ip(headers: &HeaderMap) -> Option<String> {
    let ip_headers = ["x-forwarded-for", "x-real-ip", "x-client-ip"];

    for header_name in &ip_headers {
        if let Some(ip_str) = headers.get(*header_name).and_then(|v| v.to_str().ok()) {
            // X-Forwarded-For may contain multiple IPs, take the first one
            if let Some(first_ip) = ip_str.split(',').next() {
                let ip = first_ip.trim();
                if !ip.is_empty() && ip != "unknown" {
                    return Some(ip.to_string());
                }
            }
        }
    }

    None
}
