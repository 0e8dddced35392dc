//! Service layer module
//!
//! Contains the upstream HTTP client and the post filtering service

pub mod client;
pub mod posts;

use crate::models::{Comment, Post};
use crate::utils::error::AppResult;
use async_trait::async_trait;

pub use client::{NotFoundPolicy, UpstreamClient};
pub use posts::{filter_posts, PostService};

/// Source of posts and comments
///
/// Implemented by [`UpstreamClient`]; the filtering layer only sees this trait.
#[async_trait]
pub trait PostSource: Send + Sync {
    /// Fetch every post
    async fn list_posts(&self) -> AppResult<Vec<Post>>;

    /// Fetch a single post
    async fn get_post_by_id(&self, id: &str) -> AppResult<Post>;

    /// Fetch comments through the path-nested endpoint
    async fn get_comments_for_post(&self, post_id: &str) -> AppResult<Vec<Comment>>;

    /// Fetch comments through the query-parameter endpoint
    async fn get_comments_by_post_id_query(&self, post_id: &str) -> AppResult<Vec<Comment>>;
}
