//! Post data model
//!
//! Shape of the upstream `/posts` resource

use serde::{de, Deserialize, Deserializer, Serialize};

/// A post as served by the upstream API
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Post {
    /// Author id
    pub user_id: i64,
    /// Post id
    pub id: i64,
    /// Post title
    #[serde(skip_serializing_if = "String::is_empty")]
    pub title: String,
    /// Post body
    #[serde(skip_serializing_if = "String::is_empty")]
    pub body: String,
}

/// Optional equality filters for the post list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostFilter {
    /// Keep only posts by this author
    #[serde(default, deserialize_with = "blank_as_none")]
    pub user_id: Option<i64>,
    /// Keep only the post with this id
    #[serde(default, deserialize_with = "blank_as_none")]
    pub id: Option<i64>,
}

/// Accept a number or numeric text; blank text means no filter
fn blank_as_none<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(i64),
        Text(String),
    }

    match Option::<Raw>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Raw::Number(value)) => Ok(Some(value)),
        Some(Raw::Text(text)) if text.trim().is_empty() => Ok(None),
        Some(Raw::Text(text)) => text
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| de::Error::custom(format!("invalid integer: {}", text))),
    }
}

impl PostFilter {
    /// Whether a post satisfies every present filter
    pub fn matches(&self, post: &Post) -> bool {
        self.user_id.map_or(true, |user_id| post.user_id == user_id)
            && self.id.map_or(true, |id| post.id == id)
    }
}
