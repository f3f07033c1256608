/// Storage layer for posts and comment trees
///
/// `CommentStore` is implemented by two backends with identical observable
/// semantics:
/// - `postgres`: transactional store on a shared `PgPool`
/// - `memory`: in-process maps for tests and local development
///
/// The backend is selected once at startup via `build_store`.
use crate::models::{Comment, NewComment, NewPost, Post};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

pub mod memory;
pub mod postgres;

pub use memory::MemoryCommentStore;
pub use postgres::PgCommentStore;

/// Upper bound on ancestor edges walked when computing a comment's depth.
/// A chain longer than this is treated as corrupted.
pub const MAX_COMMENT_DEPTH: i32 = 10_000;

/// Result type alias for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors surfaced by `CommentStore` implementations
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("post {0} not found")]
    PostNotFound(i64),

    #[error("comment {0} not found")]
    CommentNotFound(i64),

    #[error("parent comment {0} not found")]
    ParentNotFound(i64),

    #[error("comments not allowed on post {0}")]
    CommentsNotAllowed(i64),

    /// Parent chain loops or exceeds `MAX_COMMENT_DEPTH`
    #[error("comment hierarchy corrupted at comment {comment_id}")]
    HierarchyCorrupted { comment_id: i64 },

    /// Negative offset or limit on a paged listing
    #[error("invalid page window: offset {offset}, limit {limit}")]
    InvalidWindow { offset: i64, limit: i64 },

    #[error("query deadline exceeded: {0}")]
    Timeout(&'static str),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Reject negative page windows before any backend touches them
pub(crate) fn check_window(offset: i64, limit: i64) -> StoreResult<()> {
    if offset < 0 || limit < 0 {
        return Err(StoreError::InvalidWindow { offset, limit });
    }
    Ok(())
}

/// Posts and comment hierarchy operations shared by every backend
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CommentStore: Send + Sync {
    /// Store a new post, assigning its id and creation time
    async fn create_post(&self, new_post: NewPost) -> StoreResult<Post>;

    /// Store a new comment.
    ///
    /// The comments-allowed check, the parent check and the insert are
    /// evaluated against one consistent snapshot.
    ///
    /// # Errors
    ///
    /// - `PostNotFound` if the post does not exist
    /// - `CommentsNotAllowed` if the post has comments disabled
    /// - `ParentNotFound` if `parent_id` is not a comment of the same post
    async fn create_comment(&self, new_comment: NewComment) -> StoreResult<Comment>;

    /// Set the comments-allowed flag. The post is looked up by id and author
    /// jointly; a mismatch on either is `PostNotFound`.
    async fn allow_comments(
        &self,
        author_id: Uuid,
        post_id: i64,
        allowed: bool,
    ) -> StoreResult<Post>;

    /// All posts, ordered by id
    async fn get_posts(&self) -> StoreResult<Vec<Post>>;

    async fn get_post(&self, id: i64) -> StoreResult<Post>;

    /// Comments of a post, oldest first. An offset past the end is an empty
    /// page, not an error; a negative offset or limit is `InvalidWindow`.
    async fn get_comments_for_post(
        &self,
        post_id: i64,
        offset: i64,
        limit: i64,
    ) -> StoreResult<Vec<Comment>>;

    /// Direct replies to a comment, oldest first
    async fn get_replies_by_parent_id(
        &self,
        parent_id: i64,
        offset: i64,
        limit: i64,
    ) -> StoreResult<Vec<Comment>>;

    /// Number of ancestor edges between the comment and its root (root = 0)
    async fn get_comment_depth(&self, comment_id: i64) -> StoreResult<i32>;
}

/// Which `CommentStore` backend to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Postgres,
    Memory,
}

impl StorageBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageBackend::Postgres => "postgres",
            StorageBackend::Memory => "memory",
        }
    }
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" | "db" => Ok(StorageBackend::Postgres),
            "memory" | "in-memory" | "inmemory" => Ok(StorageBackend::Memory),
            other => Err(format!("unknown storage type '{}'", other)),
        }
    }
}

/// Build the configured backend.
///
/// `pool` is required for `Postgres` and ignored for `Memory`.
pub fn build_store(
    backend: StorageBackend,
    pool: Option<PgPool>,
    query_timeout: Duration,
) -> Result<Arc<dyn CommentStore>, String> {
    match backend {
        StorageBackend::Postgres => {
            let pool = pool.ok_or_else(|| {
                "database connection is required for postgres storage".to_string()
            })?;
            Ok(Arc::new(PgCommentStore::new(pool, query_timeout)))
        }
        StorageBackend::Memory => Ok(Arc::new(MemoryCommentStore::new())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_parsing() {
        assert_eq!("db".parse::<StorageBackend>(), Ok(StorageBackend::Postgres));
        assert_eq!(
            "Postgres".parse::<StorageBackend>(),
            Ok(StorageBackend::Postgres)
        );
        assert_eq!("memory".parse::<StorageBackend>(), Ok(StorageBackend::Memory));
        assert!("redis".parse::<StorageBackend>().is_err());
    }

    #[test]
    fn test_check_window() {
        assert!(check_window(0, 0).is_ok());
        assert!(check_window(5, 100).is_ok());
        assert!(matches!(
            check_window(-1, 5),
            Err(StoreError::InvalidWindow { offset: -1, limit: 5 })
        ));
        assert!(matches!(
            check_window(0, -1),
            Err(StoreError::InvalidWindow { offset: 0, limit: -1 })
        ));
    }

    #[test]
    fn test_build_store_requires_pool_for_postgres() {
        let result = build_store(StorageBackend::Postgres, None, Duration::from_secs(1));
        assert!(result.is_err());

        let result = build_store(StorageBackend::Memory, None, Duration::from_secs(1));
        assert!(result.is_ok());
    }
}
