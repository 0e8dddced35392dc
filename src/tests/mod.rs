//! Router test module
//!
//! Exercises routing, validation and the boundary translator in-process.
//! Every request here is rejected before an upstream call is made.

#[cfg(test)]
mod router_tests {
    use crate::config::Settings;
    use crate::handlers::create_router;
    use crate::middleware::{SPAN_ID_HEADER, TRACE_ID_HEADER};
    use crate::utils::telemetry::telemetry_layer;
    use axum::{
        body::Body,
        http::{header, Method, Request, StatusCode},
        response::Response,
    };
    use std::sync::Once;
    use tower::ServiceExt;
    use tracing_subscriber::layer::SubscriberExt;

    fn init_tracing() {
        static INIT: Once = Once::new();
        INIT.call_once(|| {
            let subscriber = tracing_subscriber::registry().with(telemetry_layer());
            let _ = tracing::subscriber::set_global_default(subscriber);
        });
    }

    async fn send_with(method: Method, uri: &str) -> Response {
        init_tracing();
        let app = create_router(Settings::default()).expect("Failed to create router");
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        app.oneshot(request).await.unwrap()
    }

    async fn send(uri: &str) -> Response {
        send_with(Method::GET, uri).await
    }

    async fn problem(response: Response) -> serde_json::Value {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_zero_post_id_is_rejected() {
        let response = send("/posts/0").await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/problem+json"
        );

        let body = problem(response).await;
        assert_eq!(body["title"], "Bad Request");
        assert_eq!(body["status"], 400);
        assert_eq!(body["detail"], "Post ID must be a positive integer");
        assert_eq!(body["instance"], "/posts/0");
    }

    #[tokio::test]
    async fn test_non_numeric_post_id_is_rejected() {
        let body = problem(send("/posts/abc").await).await;
        assert_eq!(body["detail"], "Invalid Post ID format: abc");

        let body = problem(send("/posts/-1").await).await;
        assert_eq!(body["detail"], "Post ID must be a positive integer");
    }

    #[tokio::test]
    async fn test_comment_ids_are_validated() {
        let response = send("/posts/-1/comments").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = problem(response).await;
        assert_eq!(body["detail"], "Post ID is in invalid format, must be a number");

        let response = send("/posts/comments").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = problem(response).await;
        assert_eq!(body["detail"], "Post ID cannot be empty or non-numeric");

        let body = problem(send("/posts/comments?postId=1x").await).await;
        assert_eq!(body["detail"], "Post ID cannot be empty or non-numeric");
    }

    #[tokio::test]
    async fn test_malformed_filter_is_a_bad_request() {
        let response = send("/posts?userId=abc").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = problem(response).await;
        assert_eq!(body["title"], "Bad Request");
        assert!(body["detail"].as_str().unwrap().starts_with("Invalid query parameters"));
    }

    #[tokio::test]
    async fn test_unknown_route_uses_problem_format() {
        let response = send("/users").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = problem(response).await;
        assert_eq!(body["title"], "API Error Occurred");
        assert_eq!(body["detail"], "No handler found for GET /users");
        assert_eq!(body["instance"], "/users");
    }

    #[tokio::test]
    async fn test_wrong_method_uses_problem_format() {
        let response = send_with(Method::POST, "/posts").await;
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/problem+json"
        );
        assert_eq!(response.headers().get(header::ALLOW).unwrap(), "GET,HEAD");

        let body = problem(response).await;
        assert_eq!(body["status"], 405);
        assert_eq!(body["detail"], "Request method 'POST' is not supported");
        assert_eq!(body["instance"], "/posts");

        let response = send_with(Method::DELETE, "/posts/1/comments").await;
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_trace_headers_on_every_response() {
        let response = send("/posts/0").await;
        assert_eq!(response.headers().get(TRACE_ID_HEADER).unwrap().len(), 32);
        assert_eq!(response.headers().get(SPAN_ID_HEADER).unwrap().len(), 16);

        let response = send("/health/live").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key(TRACE_ID_HEADER));
    }
}
