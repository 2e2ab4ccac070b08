use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use validator::Validate;

use crate::validation::validate_not_blank;

/// Optional author block some endpoints embed next to `userId`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
}

/// Decode an embedded author block, treating a malformed one as absent
///
/// The block is decoration; it must never fail the node that carries it.
fn lenient_author<'de, D>(deserializer: D) -> Result<Option<Author>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| serde_json::from_value(v).ok()))
}

/// Top-level rated comment on a listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: i64,
    pub post_id: i64,
    pub user_id: i64,
    pub rating: i64,
    pub content: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, deserialize_with = "lenient_author", skip_serializing_if = "Option::is_none")]
    pub author: Option<Author>,
    /// Same block under the `user` key some endpoints use
    #[serde(default, deserialize_with = "lenient_author", skip_serializing_if = "Option::is_none")]
    pub user: Option<Author>,
    #[serde(default)]
    pub replies: Vec<Reply>,
}

impl Review {
    /// Embedded author block, `author` taking precedence over `user`
    pub fn author(&self) -> Option<&Author> {
        self.author.as_ref().or(self.user.as_ref())
    }
}

/// What a reply is attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParentType {
    Review,
    Reply,
}

impl fmt::Display for ParentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParentType::Review => write!(f, "review"),
            ParentType::Reply => write!(f, "reply"),
        }
    }
}

/// Unrated comment attached to a review or to another reply
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reply {
    pub id: i64,
    pub parent_type: ParentType,
    pub parent_id: i64,
    pub user_id: i64,
    pub content: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, deserialize_with = "lenient_author", skip_serializing_if = "Option::is_none")]
    pub author: Option<Author>,
    /// Same block under the `user` key some endpoints use
    #[serde(default, deserialize_with = "lenient_author", skip_serializing_if = "Option::is_none")]
    pub user: Option<Author>,
    #[serde(default)]
    pub children: Vec<Reply>,
}

impl Reply {
    /// Embedded author block, `author` taking precedence over `user`
    pub fn author(&self) -> Option<&Author> {
        self.author.as_ref().or(self.user.as_ref())
    }
}

/// All reviews of one listing, each the root of its own reply tree
///
/// Order is whatever the server returned.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReviewForest(pub Vec<Review>);

impl ReviewForest {
    pub fn empty() -> Self {
        Self(Vec::new())
    }

    pub fn reviews(&self) -> &[Review] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// `{ "data": ... }` wrapper used by the tree endpoint
#[derive(Debug, Deserialize)]
pub struct DataEnvelope<T> {
    pub data: T,
}

/// Request DTO for creating or editing a review
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Validate)]
pub struct ReviewInput {
    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    pub rating: i64,
    #[validate(custom = "validate_not_blank")]
    pub content: String,
}

impl ReviewInput {
    pub fn new(rating: i64, content: impl Into<String>) -> Self {
        Self {
            rating,
            content: content.into(),
        }
    }
}

/// Request DTO for creating a reply
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Validate)]
pub struct ReplyInput {
    #[validate(custom = "validate_not_blank")]
    pub content: String,
}

impl ReplyInput {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }
}
