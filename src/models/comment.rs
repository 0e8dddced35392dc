//! Comment data model

use serde::{Deserialize, Serialize};

/// A comment as served by the upstream API
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Comment {
    /// Id of the post this comment belongs to
    pub post_id: i64,
    /// Comment id
    pub id: i64,
    /// Commenter display name
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    /// Commenter email
    #[serde(skip_serializing_if = "String::is_empty")]
    pub email: String,
    /// Comment text
    #[serde(skip_serializing_if = "String::is_empty")]
    pub body: String,
}
