//! Post filtering service
//!
//! Sits between the HTTP handlers and the upstream source

use crate::models::{Comment, Post, PostFilter};
use crate::services::PostSource;
use crate::utils::error::AppResult;
use std::sync::Arc;
use tracing::debug;

/// Filtering and orchestration over a [`PostSource`]
#[derive(Clone)]
pub struct PostService {
    source: Arc<dyn PostSource>,
}

impl PostService {
    /// Create a service over the given source
    pub fn new(source: Arc<dyn PostSource>) -> Self {
        Self { source }
    }

    /// Fetch every post, unfiltered
    pub async fn get_posts(&self) -> AppResult<Vec<Post>> {
        self.source.list_posts().await
    }

    /// Fetch every post and keep those matching both optional filters
    pub async fn apply_filters(&self, user_id: Option<i64>, id: Option<i64>) -> AppResult<Vec<Post>> {
        let filter = PostFilter { user_id, id };
        let posts = self.get_posts().await?;
        let total = posts.len();

        let filtered = filter_posts(posts, &filter);
        debug!("Filtered {} posts down to {} with {:?}", total, filtered.len(), filter);
        Ok(filtered)
    }

    pub async fn get_post_by_id(&self, post_id: &str) -> AppResult<Post> {
        self.source.get_post_by_id(post_id).await
    }

    pub async fn get_post_with_comments(&self, post_id: &str) -> AppResult<Vec<Comment>> {
        self.source.get_comments_for_post(post_id).await
    }

    pub async fn get_comments_by_post_id_query_param(&self, post_id: &str) -> AppResult<Vec<Comment>> {
        self.source.get_comments_by_post_id_query(post_id).await
    }
}

/// Stable filter: keeps upstream order, no limit
pub fn filter_posts(posts: Vec<Post>, filter: &PostFilter) -> Vec<Post> {
    posts.into_iter().filter(|post| filter.matches(post)).collect()
}
