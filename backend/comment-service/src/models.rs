/// Data models for comment-service
///
/// - Post: a post that may or may not accept comments
/// - Comment: a comment on a post, optionally nested under another comment
/// - Pagination: caller-supplied offset/limit window
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Page size used when the caller does not supply one
pub const DEFAULT_PAGE_LIMIT: i64 = 10;

/// Post entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Post {
    pub id: i64,
    pub author_id: Uuid,
    pub title: String,
    pub content: String,
    pub comments_allowed: bool,
    pub created_at: DateTime<Utc>,
}

/// Payload for creating a post
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPost {
    pub author_id: Uuid,
    pub title: String,
    pub content: String,
    pub comments_allowed: bool,
}

/// Comment entity. Immutable once stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Comment {
    pub id: i64,
    pub author_id: Uuid,
    pub post_id: i64,
    pub parent_id: Option<i64>,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl Comment {
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// Payload for creating a comment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct NewComment {
    pub author_id: Uuid,
    pub post_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<i64>,
    #[validate(length(
        min = 1,
        max = 2000,
        message = "comment content must be between 1 and 2000 characters"
    ))]
    pub content: String,
}

/// Offset/limit window over an ordered comment listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct Pagination {
    #[validate(range(min = 0, message = "offset cannot be negative"))]
    pub offset: i64,
    #[validate(range(min = 0, max = 100, message = "limit must be between 0 and 100"))]
    pub limit: i64,
}

impl Pagination {
    pub fn new(offset: i64, limit: i64) -> Self {
        Self { offset, limit }
    }

    /// Fill in defaults (offset 0, limit 10) for omitted values
    pub fn from_optional(offset: Option<i64>, limit: Option<i64>) -> Self {
        Self {
            offset: offset.unwrap_or(0),
            limit: limit.unwrap_or(DEFAULT_PAGE_LIMIT),
        }
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::from_optional(None, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_defaults() {
        let page = Pagination::from_optional(None, None);
        assert_eq!(page, Pagination::new(0, 10));

        let page = Pagination::from_optional(Some(5), None);
        assert_eq!(page, Pagination::new(5, 10));
    }

    #[test]
    fn test_pagination_bounds() {
        assert!(Pagination::new(0, 0).validate().is_ok());
        assert!(Pagination::new(3, 100).validate().is_ok());
        assert!(Pagination::new(-1, 10).validate().is_err());
        assert!(Pagination::new(0, 101).validate().is_err());
        assert!(Pagination::new(0, -1).validate().is_err());
    }

    #[test]
    fn test_new_comment_content_length() {
        let mut comment = NewComment {
            author_id: Uuid::new_v4(),
            post_id: 1,
            parent_id: None,
            content: "hello".to_string(),
        };
        assert!(comment.validate().is_ok());

        comment.content = String::new();
        assert!(comment.validate().is_err());

        comment.content = "x".repeat(2001);
        assert!(comment.validate().is_err());

        // length is measured in characters, not bytes
        comment.content = "ж".repeat(2000);
        assert!(comment.validate().is_ok());
    }
}
