//! Path and query parameter validation
//!
//! Runs before any upstream call. The post-by-id and comment rules differ on
//! purpose: signed input is a positivity failure for the former and a format
//! failure for the latter.

use crate::utils::error::{AppError, AppResult};

/// Validate a post id for the single-post endpoint
pub fn validate_post_id(raw: &str) -> AppResult<i32> {
    if raw.trim().is_empty() {
        return Err(AppError::validation("Post ID cannot be null or empty"));
    }

    let id: i32 = raw
        .parse()
        .map_err(|e| AppError::validation(format!("Invalid Post ID format: {}", raw)).with_cause(e))?;

    if id <= 0 {
        return Err(AppError::validation("Post ID must be a positive integer"));
    }

    Ok(id)
}

/// Validate a post id for the path-nested comments endpoint
pub fn validate_comments_path_id(raw: &str) -> AppResult<&str> {
    if !is_numeric(raw) {
        return Err(AppError::validation("Post ID is in invalid format, must be a number"));
    }
    Ok(raw)
}

/// Validate a post id for the query-parameter comments endpoint
pub fn validate_comments_query_id(raw: Option<&str>) -> AppResult<&str> {
    match raw {
        Some(value) if is_numeric(value) => Ok(value),
        _ => Err(AppError::validation("Post ID cannot be empty or non-numeric")),
    }
}

/// Non-empty and made of ASCII digits only
pub fn is_numeric(value: &str) -> bool {
    !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit())
}
