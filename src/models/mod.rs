//! Data models module
//!
//! Defines the post and comment structures served by the upstream API

pub mod comment;
pub mod post;

pub use comment::Comment;
pub use post::{Post, PostFilter};
