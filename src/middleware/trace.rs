//! Trace context middleware
//!
//! Opens the request span, parents it on a caller's W3C `traceparent` when one
//! is present, and reports the span's ids on every response.

use axum::{
    extract::Request,
    http::{HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use opentelemetry::{
    propagation::{Extractor, TextMapPropagator},
    trace::TraceContextExt,
};
use opentelemetry_sdk::propagation::TraceContextPropagator;
use tracing::{field, Instrument, Span};
use tracing_opentelemetry::OpenTelemetrySpanExt;

/// W3C Trace Context header name
pub const TRACEPARENT: &str = "traceparent";

/// Response header carrying the trace id
pub const TRACE_ID_HEADER: &str = "x-trace-id";

/// Response header carrying the span id
pub const SPAN_ID_HEADER: &str = "x-span-id";

/// Ids of the active request span
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceContext {
    /// 32 lowercase hex chars
    pub trace_id: String,
    /// 16 lowercase hex chars
    pub span_id: String,
}

impl TraceContext {
    /// Read the OpenTelemetry span context of a tracing span
    ///
    /// `None` when the span carries no valid context, e.g. when no telemetry layer is installed.
    pub fn from_span(span: &Span) -> Option<Self> {
        let context = span.context();
        let span_ref = context.span();
        let span_context = span_ref.span_context();

        span_context.is_valid().then(|| Self {
            trace_id: span_context.trace_id().to_string(),
            span_id: span_context.span_id().to_string(),
        })
    }
}

/// Adapter for extracting W3C Trace Context from HTTP headers
struct HeadersExtractor<'a>(&'a HeaderMap);

impl<'a> Extractor for HeadersExtractor<'a> {
    fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|v| v.to_str().ok())
    }

    fn keys(&self) -> Vec<&str> {
        self.0.keys().map(|k| k.as_str()).collect()
    }
}

/// Parent the span on the caller's trace; malformed or absent headers leave it a root
pub fn set_parent_from_headers(span: &Span, headers: &HeaderMap) {
    let parent = TraceContextPropagator::new().extract(&HeadersExtractor(headers));
    if parent.span().span_context().is_valid() {
        let _ = span.set_parent(parent);
    }
}

/// Trace context middleware
///
/// Stores the [`TraceContext`] in request extensions and sets
/// `X-Trace-Id` / `X-Span-Id` on the response.
pub async fn trace_context_middleware(mut request: Request, next: Next) -> Response {
    let span = tracing::info_span!(
        "trace",
        trace_id = field::Empty,
        span_id = field::Empty,
    );
    set_parent_from_headers(&span, request.headers());

    let context = TraceContext::from_span(&span);
    if let Some(context) = &context {
        span.record("trace_id", context.trace_id.as_str());
        span.record("span_id", context.span_id.as_str());
        request.extensions_mut().insert(context.clone());
    }

    let mut response = next.run(request).instrument(span).await;

    if let Some(context) = context {
        let headers = response.headers_mut();
        if let Ok(value) = HeaderValue::from_str(&context.trace_id) {
            headers.insert(TRACE_ID_HEADER, value);
        }
        if let Ok(value) = HeaderValue::from_str(&context.span_id) {
            headers.insert(SPAN_ID_HEADER, value);
        }
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::telemetry::telemetry_layer;
    use tracing_subscriber::layer::SubscriberExt;

    const VALID: &str = "00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01";

    fn with_telemetry(f: impl FnOnce()) {
        let subscriber = tracing_subscriber::registry().with(telemetry_layer());
        tracing::subscriber::with_default(subscriber, f);
    }

    fn headers(traceparent: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(TRACEPARENT, HeaderValue::from_str(traceparent).unwrap());
        headers
    }

    #[test]
    fn test_root_span_gets_new_trace() {
        with_telemetry(|| {
            let span = tracing::info_span!("root");
            set_parent_from_headers(&span, &HeaderMap::new());

            let context = TraceContext::from_span(&span).unwrap();
            assert_eq!(context.trace_id.len(), 32);
            assert_eq!(context.span_id.len(), 16);
        });
    }

    #[test]
    fn test_continue_valid_traceparent() {
        with_telemetry(|| {
            let span = tracing::info_span!("child");
            set_parent_from_headers(&span, &headers(VALID));

            let context = TraceContext::from_span(&span).unwrap();
            assert_eq!(context.trace_id, "4bf92f3577b34da6a3ce929d0e0e4736");
            assert_ne!(context.span_id, "00f067aa0ba902b7");
        });
    }

    #[test]
    fn test_reject_malformed_traceparent() {
        let cases = [
            "garbage",
            "00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7",
            "00-00000000000000000000000000000000-00f067aa0ba902b7-01",
            "00-4bf92f3577b34da6a3ce929d0e0e4736-0000000000000000-01",
            "ff-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01",
        ];

        with_telemetry(|| {
            for case in cases {
                let span = tracing::info_span!("root");
                set_parent_from_headers(&span, &headers(case));

                let context = TraceContext::from_span(&span).unwrap();
                assert_ne!(context.trace_id, "4bf92f3577b34da6a3ce929d0e0e4736", "{}", case);
                assert_ne!(context.trace_id, "00000000000000000000000000000000", "{}", case);
            }
        });
    }

    #[test]
    fn test_no_context_without_telemetry() {
        tracing::subscriber::with_default(tracing_subscriber::registry(), || {
            let span = tracing::info_span!("untracked");
            assert!(TraceContext::from_span(&span).is_none());
        });
    }
}
