//! Upstream HTTP client
//!
//! Issues GET requests against the posts/comments API and maps every
//! outcome onto [`AppError`]

use crate::config::settings::{UpstreamConfig, UPSTREAM_BASE_URL};
use crate::models::{Comment, Post};
use crate::services::PostSource;
use crate::utils::error::{AppError, AppResult, ErrorContext};
use crate::utils::logging::{format_headers, truncate_body};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{header, Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, error};

const POSTS_ENDPOINT: &str = "posts";
const COMMENTS_ENDPOINT: &str = "comments";

/// How an upstream 404 is reported
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotFoundPolicy {
    /// Same mapping as any other 4xx
    ClientError,
    /// Fail with a not-found error carrying this detail
    Fail(String),
    /// Report as an absent body
    Suppress,
}

/// Description of one upstream GET and how to map its failures
#[derive(Debug, Clone)]
struct Fetch {
    url: Url,
    /// Detail for 4xx responses
    client_error: String,
    /// Fixed title for 4xx responses, upstream reason phrase when absent
    client_title: Option<&'static str>,
    /// Detail for transport failures
    failure: String,
    not_found: NotFoundPolicy,
}

/// Posts/comments API client
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    client: Client,
    base_url: Url,
}

impl UpstreamClient {
    /// Create a client for the public upstream API
    pub fn new(config: &UpstreamConfig) -> Result<Self> {
        Self::with_base_url(UPSTREAM_BASE_URL, config)
    }

    /// Create a client against an explicit base URL
    ///
    /// Only test fixtures should need this; production wiring goes through [`UpstreamClient::new`].
    pub fn with_base_url(base_url: &str, config: &UpstreamConfig) -> Result<Self> {
        let base_url = Url::parse(base_url).context("Invalid upstream base URL")?;
        if base_url.cannot_be_a_base() {
            anyhow::bail!("Upstream base URL cannot carry a path: {}", base_url);
        }

        let client = Client::builder()
            .timeout(config.timeout())
            .connect_timeout(config.connect_timeout())
            .user_agent(concat!("postproxy/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client, base_url })
    }

    /// Base URL requests are issued against
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Build an endpoint URL, percent-encoding each path segment
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// Execute a GET and map the outcome
    ///
    /// `Ok(None)` means the upstream sent no body, or a 404 was suppressed.
    async fn fetch<T: DeserializeOwned>(&self, fetch: Fetch) -> AppResult<Option<T>> {
        let request = self
            .client
            .get(fetch.url.clone())
            .header(header::ACCEPT, "application/json")
            .build()
            .integration_context(&fetch.failure)?;

        debug!("=== OUTBOUND REQUEST ===");
        debug!("Method: {}", request.method());
        debug!("URI: {}", request.url());
        debug!("Headers: {}", format_headers(request.headers()));

        let response = match self.client.execute(request).await {
            Ok(response) => response,
            Err(e) => {
                error!("Upstream request to {} failed: {}", fetch.url, e);
                return Err(AppError::integration(fetch.failure).with_cause(e));
            }
        };

        let status = response.status();
        debug!("=== INBOUND RESPONSE ===");
        debug!("Status: {} {}", status.as_u16(), status.canonical_reason().unwrap_or(""));
        debug!("Headers: {}", format_headers(response.headers()));

        let body = match response.bytes().await {
            Ok(body) => body,
            Err(e) => {
                error!("Failed to read upstream response from {}: {}", fetch.url, e);
                return Err(AppError::integration(fetch.failure).with_cause(e));
            }
        };
        if !body.is_empty() {
            debug!("Body: {}", truncate_body(&String::from_utf8_lossy(&body)));
        }

        if status.is_client_error() {
            let message = String::from_utf8_lossy(&body);
            error!(
                "Upstream client error for {}, status: {}, message: {}",
                fetch.url, status, message
            );

            if status == StatusCode::NOT_FOUND {
                match fetch.not_found {
                    NotFoundPolicy::Suppress => return Ok(None),
                    NotFoundPolicy::Fail(detail) => {
                        return Err(AppError::not_found(detail)
                            .with_cause(anyhow::anyhow!("{} {}", status, message)));
                    }
                    NotFoundPolicy::ClientError => {}
                }
            }

            let title = fetch
                .client_title
                .map(str::to_string)
                .unwrap_or_else(|| status_text(status));
            return Err(AppError::client(fetch.client_error, title, status.as_u16())
                .with_cause(anyhow::anyhow!("{} {}", status, message)));
        }

        if !status.is_success() {
            error!("Unexpected upstream status {} from {}", status, fetch.url);
            return Err(AppError::integration(fetch.failure)
                .with_cause(anyhow::anyhow!("Upstream responded with status {}", status)));
        }

        decode_body(&body).integration_context(&fetch.failure)
    }
}

/// Decode a JSON body, treating an empty body or `null` as absent
pub fn decode_body<T: DeserializeOwned>(body: &[u8]) -> Result<Option<T>, serde_json::Error> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    serde_json::from_slice::<Option<T>>(body)
}

/// Reason phrase for a status, used as an error title
fn status_text(status: StatusCode) -> String {
    status.canonical_reason().unwrap_or("Client Error").to_string()
}

#[async_trait]
impl PostSource for UpstreamClient {
    async fn list_posts(&self) -> AppResult<Vec<Post>> {
        let url = self.endpoint(&[POSTS_ENDPOINT]);
        debug!("Fetching all posts from {}", url);

        let posts = self
            .fetch(Fetch {
                url,
                client_error: "Error fetching posts".to_string(),
                client_title: Some("Client Error"),
                failure: "Failed to retrieve posts".to_string(),
                not_found: NotFoundPolicy::ClientError,
            })
            .await?;

        Ok(posts.unwrap_or_default())
    }

    async fn get_post_by_id(&self, id: &str) -> AppResult<Post> {
        let url = self.endpoint(&[POSTS_ENDPOINT, id]);
        debug!("Fetching post with id: {} from {}", id, url);

        let post = self
            .fetch(Fetch {
                url,
                client_error: format!("Error while fetching post with id {}", id),
                client_title: None,
                failure: format!("Failed to retrieve post with id {}", id),
                not_found: NotFoundPolicy::Fail(format!("Cannot find a Post with id {}", id)),
            })
            .await?;

        Ok(post.unwrap_or_default())
    }

    async fn get_comments_for_post(&self, post_id: &str) -> AppResult<Vec<Comment>> {
        let url = self.endpoint(&[POSTS_ENDPOINT, post_id, COMMENTS_ENDPOINT]);
        debug!("Fetching comments for post id: {} from {}", post_id, url);

        let comments = self
            .fetch(Fetch {
                url,
                client_error: format!("Error while fetching comments for post {}", post_id),
                client_title: None,
                failure: format!("Failed to retrieve comments for post {}", post_id),
                not_found: NotFoundPolicy::Suppress,
            })
            .await?;

        Ok(comments.unwrap_or_default())
    }

    async fn get_comments_by_post_id_query(&self, post_id: &str) -> AppResult<Vec<Comment>> {
        let mut url = self.endpoint(&[COMMENTS_ENDPOINT]);
        url.query_pairs_mut().append_pair("postId", post_id);
        debug!("Fetching comments with query param for post id: {} from {}", post_id, url);

        let comments = self
            .fetch(Fetch {
                url,
                client_error: format!("Error while fetching comments for post {}", post_id),
                client_title: None,
                failure: format!("Failed to retrieve comments for post {}", post_id),
                not_found: NotFoundPolicy::Suppress,
            })
            .await?;

        Ok(comments.unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_client(base_url: &str) -> UpstreamClient {
        UpstreamClient::with_base_url(base_url, &UpstreamConfig::default()).unwrap()
    }

    #[test]
    fn test_client_creation() {
        let client = UpstreamClient::new(&UpstreamConfig::default()).unwrap();
        assert_eq!(client.base_url().as_str(), "https://jsonplaceholder.typicode.com/");

        assert!(UpstreamClient::with_base_url("not a url", &UpstreamConfig::default()).is_err());
        assert!(UpstreamClient::with_base_url("mailto:someone@example.com", &UpstreamConfig::default()).is_err());
    }

    #[test]
    fn test_endpoint_building() {
        let client = create_test_client("https://jsonplaceholder.typicode.com");

        assert_eq!(
            client.endpoint(&[POSTS_ENDPOINT, "7", COMMENTS_ENDPOINT]).as_str(),
            "https://jsonplaceholder.typicode.com/posts/7/comments"
        );

        // Path input never escapes its segment
        let url = client.endpoint(&[POSTS_ENDPOINT, "../admin?x=1"]);
        assert_eq!(url.host_str(), Some("jsonplaceholder.typicode.com"));
        assert!(url.path().starts_with("/posts/"));
        assert!(url.path().contains("%2F"));
        assert_eq!(url.path_segments().map(|s| s.count()), Some(2));
        assert_eq!(url.query(), None);
    }

    #[test]
    fn test_query_encoding() {
        let client = create_test_client("https://jsonplaceholder.typicode.com/");
        let mut url = client.endpoint(&[COMMENTS_ENDPOINT]);
        url.query_pairs_mut().append_pair("postId", "1&admin=true");

        assert_eq!(url.path(), "/comments");
        assert_eq!(url.query(), Some("postId=1%26admin%3Dtrue"));
    }

    #[test]
    fn test_decode_body() {
        let none: Option<Vec<Post>> = decode_body(b"").unwrap();
        assert!(none.is_none());

        let none: Option<Vec<Post>> = decode_body(b" null ").unwrap();
        assert!(none.is_none());

        let posts: Option<Vec<Post>> = decode_body(br#"[{"userId":1,"id":2,"title":"a","body":"b"}]"#).unwrap();
        assert_eq!(posts.unwrap().len(), 1);

        assert!(decode_body::<Vec<Post>>(b"<html>").is_err());
    }

    #[test]
    fn test_status_text() {
        assert_eq!(status_text(StatusCode::FORBIDDEN), "Forbidden");
        assert_eq!(status_text(StatusCode::from_u16(499).unwrap()), "Client Error");
    }
}
