//! Post and comment handlers
//!
//! Validates path/query input and delegates to [`PostService`](crate::services::PostService)

use crate::handlers::validation::{validate_comments_path_id, validate_comments_query_id, validate_post_id};
use crate::handlers::AppState;
use crate::models::{Comment, Post, PostFilter};
use crate::utils::error::{AppError, AppResult};
use axum::{
    extract::{
        rejection::{PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::Uri,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info};

/// Query string of the query-parameter comments endpoint
#[derive(Debug, Deserialize)]
pub struct CommentsQuery {
    #[serde(rename = "postId")]
    pub post_id: Option<String>,
}

/// List posts, optionally filtered
///
/// GET /posts?userId={userId}&id={id}
pub async fn get_posts(
    State(state): State<Arc<AppState>>,
    uri: Uri,
    query: Result<Query<PostFilter>, QueryRejection>,
) -> AppResult<Json<Vec<Post>>> {
    list_posts(&state, query)
        .await
        .map(Json)
        .map_err(|e| e.with_instance(uri.path()))
}

async fn list_posts(
    state: &AppState,
    query: Result<Query<PostFilter>, QueryRejection>,
) -> AppResult<Vec<Post>> {
    let Query(filter) = query.map_err(|e| {
        AppError::validation(format!("Invalid query parameters: {}", e.body_text())).with_cause(e)
    })?;

    info!(
        "Retrieving posts with filters - userId: {:?}, id: {:?}",
        filter.user_id, filter.id
    );

    let posts = state.posts.apply_filters(filter.user_id, filter.id).await?;
    debug!("Returning {} posts", posts.len());
    Ok(posts)
}

/// Fetch a single post
///
/// GET /posts/{id}
pub async fn get_post_by_id(
    State(state): State<Arc<AppState>>,
    uri: Uri,
    path: Result<Path<String>, PathRejection>,
) -> AppResult<Json<Post>> {
    post_by_id(&state, path)
        .await
        .map(Json)
        .map_err(|e| e.with_instance(uri.path()))
}

async fn post_by_id(state: &AppState, path: Result<Path<String>, PathRejection>) -> AppResult<Post> {
    let Path(post_id) = path.map_err(|e| {
        AppError::validation(format!("Invalid Post ID format: {}", e.body_text())).with_cause(e)
    })?;

    validate_post_id(&post_id)?;
    debug!("Retrieving post {}", post_id);

    state.posts.get_post_by_id(&post_id).await
}

/// Fetch comments for a post through the path-nested upstream endpoint
///
/// GET /posts/{id}/comments
pub async fn get_comments_for_post(
    State(state): State<Arc<AppState>>,
    uri: Uri,
    path: Result<Path<String>, PathRejection>,
) -> AppResult<Json<Vec<Comment>>> {
    comments_for_post(&state, path)
        .await
        .map(Json)
        .map_err(|e| e.with_instance(uri.path()))
}

async fn comments_for_post(
    state: &AppState,
    path: Result<Path<String>, PathRejection>,
) -> AppResult<Vec<Comment>> {
    let post_id = match path {
        Ok(Path(post_id)) => post_id,
        Err(e) => {
            return Err(AppError::validation("Post ID is in invalid format, must be a number").with_cause(e));
        }
    };

    let post_id = validate_comments_path_id(&post_id)?;
    debug!("Retrieving comments for post {}", post_id);

    state.posts.get_post_with_comments(post_id).await
}

/// Fetch comments for a post through the query-parameter upstream endpoint
///
/// GET /posts/comments?postId={postId}
pub async fn get_comments_by_post_id(
    State(state): State<Arc<AppState>>,
    uri: Uri,
    query: Result<Query<CommentsQuery>, QueryRejection>,
) -> AppResult<Json<Vec<Comment>>> {
    comments_by_query(&state, query)
        .await
        .map(Json)
        .map_err(|e| e.with_instance(uri.path()))
}

async fn comments_by_query(
    state: &AppState,
    query: Result<Query<CommentsQuery>, QueryRejection>,
) -> AppResult<Vec<Comment>> {
    let post_id = query.ok().and_then(|Query(q)| q.post_id);
    info!("Retrieving comments by query with postId: {:?}", post_id);

    let post_id = validate_comments_query_id(post_id.as_deref())?;

    state.posts.get_comments_by_post_id_query_param(post_id).await
}
