//! HTTP handlers module
//!
//! Contains all HTTP endpoint handling logic

pub mod health;
pub mod posts;
pub mod validation;

use crate::config::settings::{SecurityConfig, Settings};
use crate::middleware::{logging::request_logging_middleware, trace::trace_context_middleware};
use crate::services::{PostService, UpstreamClient};
use crate::utils::error::AppError;
use anyhow::Result;
use axum::{
    http::{header, HeaderValue, Method, Uri},
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use std::sync::Arc;
use std::time::Instant;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;

/// Application state
#[derive(Clone)]
pub struct AppState {
    pub settings: Settings,
    pub posts: PostService,
    pub upstream_base_url: String,
    pub started_at: Instant,
}

/// Build shared state around an upstream client
pub fn build_state(settings: Settings, client: UpstreamClient) -> Arc<AppState> {
    let upstream_base_url = client.base_url().to_string();

    Arc::new(AppState {
        settings,
        posts: PostService::new(Arc::new(client)),
        upstream_base_url,
        started_at: Instant::now(),
    })
}

/// Create application router against the public upstream
pub fn create_router(settings: Settings) -> Result<Router> {
    let client = UpstreamClient::new(&settings.upstream)?;
    Ok(build_router(settings, client))
}

/// Create application router around a prepared upstream client
pub fn build_router(settings: Settings, client: UpstreamClient) -> Router {
    let cors = settings
        .security
        .cors_enabled
        .then(|| cors_layer(&settings.security));
    let app_state = build_state(settings, client);

    let router = Router::new()
        .route("/posts", get(posts::get_posts).fallback(method_not_allowed))
        .route(
            "/posts/comments",
            get(posts::get_comments_by_post_id).fallback(method_not_allowed),
        )
        .route("/posts/:id", get(posts::get_post_by_id).fallback(method_not_allowed))
        .route(
            "/posts/:id/comments",
            get(posts::get_comments_for_post).fallback(method_not_allowed),
        )
        .route("/health", get(health::health_check).fallback(method_not_allowed))
        .route("/health/live", get(health::liveness_check).fallback(method_not_allowed))
        .fallback(fallback)
        .with_state(app_state)
        .layer(middleware::from_fn(request_logging_middleware))
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(middleware::from_fn(trace_context_middleware))
        .layer(TraceLayer::new_for_http());

    match cors {
        Some(cors) => router.layer(cors),
        None => router,
    }
}

/// Build the CORS layer from security settings
fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET])
        .allow_headers(Any);

    if security.allowed_origins.iter().any(|origin| origin == "*") {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = security
        .allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    layer.allow_origin(AllowOrigin::list(origins))
}

/// Unknown routes answer with a problem document
async fn fallback(method: Method, uri: Uri) -> AppError {
    AppError::new(format!("No handler found for {} {}", method, uri.path()))
        .with_status(404)
        .with_instance(uri.path())
}

/// Known routes answer other methods with a 405 problem document
async fn method_not_allowed(method: Method, uri: Uri) -> Response {
    let mut response = AppError::new(format!("Request method '{}' is not supported", method))
        .with_status(405)
        .with_instance(uri.path())
        .into_response();
    response
        .headers_mut()
        .insert(header::ALLOW, HeaderValue::from_static("GET,HEAD"));
    response
}

/// Turn a handler panic into an internal error response
fn handle_panic(panic: Box<dyn std::any::Any + Send + 'static>) -> Response {
    let message = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");

    AppError::internal("Unexpected error processing request")
        .with_cause(anyhow::anyhow!("handler panicked: {}", message))
        .into_response()
}
