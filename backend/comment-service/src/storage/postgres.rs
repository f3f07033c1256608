use super::{check_window, CommentStore, StoreError, StoreResult, MAX_COMMENT_DEPTH};
use crate::models::{Comment, NewComment, NewPost, Post};
use async_trait::async_trait;
use sqlx::PgPool;
use std::future::Future;
use std::time::Duration;
use uuid::Uuid;

const POST_COLUMNS: &str = "post_id AS id, author_id, title, content, \
                            allow_comments AS comments_allowed, created_at";

const COMMENT_COLUMNS: &str = "comment_id AS id, author_id, post_id, parent_id, content, created_at";

/// PostgreSQL-backed `CommentStore`.
///
/// Every operation is bounded by `query_timeout`. Comment creation runs its
/// checks and insert in a single transaction.
#[derive(Clone)]
pub struct PgCommentStore {
    pool: PgPool,
    query_timeout: Duration,
}

impl PgCommentStore {
    pub fn new(pool: PgPool, query_timeout: Duration) -> Self {
        Self {
            pool,
            query_timeout,
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Apply the embedded schema migrations
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        tracing::debug!("Running comment-service migrations");
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        tracing::info!("Database migrations completed successfully");
        Ok(())
    }

    async fn with_deadline<T, F>(&self, operation: &'static str, fut: F) -> StoreResult<T>
    where
        F: Future<Output = StoreResult<T>>,
    {
        match tokio::time::timeout(self.query_timeout, fut).await {
            Ok(result) => result,
            Err(_) => {
                tracing::error!(
                    operation,
                    timeout_ms = self.query_timeout.as_millis() as u64,
                    "Database operation timed out"
                );
                Err(StoreError::Timeout(operation))
            }
        }
    }

    async fn insert_comment(&self, new_comment: NewComment) -> StoreResult<Comment> {
        // Rolls back on drop for every early return below.
        let mut tx = self.pool.begin().await?;

        // FOR SHARE blocks a concurrent allow_comments until this insert commits.
        let allowed: Option<bool> = sqlx::query_scalar(
            "SELECT allow_comments FROM posts WHERE post_id = $1 FOR SHARE",
        )
        .bind(new_comment.post_id)
        .fetch_optional(&mut *tx)
        .await?;

        match allowed {
            None => return Err(StoreError::PostNotFound(new_comment.post_id)),
            Some(false) => {
                tracing::warn!(post_id = new_comment.post_id, "Comments are not allowed");
                return Err(StoreError::CommentsNotAllowed(new_comment.post_id));
            }
            Some(true) => {}
        }

        if let Some(parent_id) = new_comment.parent_id {
            let parent_exists: bool = sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM comments WHERE comment_id = $1 AND post_id = $2)",
            )
            .bind(parent_id)
            .bind(new_comment.post_id)
            .fetch_one(&mut *tx)
            .await?;

            if !parent_exists {
                tracing::warn!(
                    parent_id,
                    post_id = new_comment.post_id,
                    "Parent comment doesn't exist"
                );
                return Err(StoreError::ParentNotFound(parent_id));
            }
        }

        let comment = sqlx::query_as::<_, Comment>(&format!(
            r#"
            INSERT INTO comments (author_id, post_id, parent_id, content)
            VALUES ($1, $2, $3, $4)
            RETURNING {COMMENT_COLUMNS}
            "#
        ))
        .bind(new_comment.author_id)
        .bind(new_comment.post_id)
        .bind(new_comment.parent_id)
        .bind(&new_comment.content)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(comment)
    }
}

#[async_trait]
impl CommentStore for PgCommentStore {
    async fn create_post(&self, new_post: NewPost) -> StoreResult<Post> {
        tracing::info!(author_id = %new_post.author_id, "Creating new post");

        let post = self
            .with_deadline("create_post", async {
                let post = sqlx::query_as::<_, Post>(&format!(
                    r#"
                    INSERT INTO posts (author_id, title, content, allow_comments)
                    VALUES ($1, $2, $3, $4)
                    RETURNING {POST_COLUMNS}
                    "#
                ))
                .bind(new_post.author_id)
                .bind(&new_post.title)
                .bind(&new_post.content)
                .bind(new_post.comments_allowed)
                .fetch_one(&self.pool)
                .await?;
                Ok::<_, StoreError>(post)
            })
            .await
            .inspect_err(|e| {
                tracing::error!(error = %e, author_id = %new_post.author_id, "Failed to create post")
            })?;

        tracing::info!(post_id = post.id, author_id = %post.author_id, "Post created");
        Ok(post)
    }

    async fn create_comment(&self, new_comment: NewComment) -> StoreResult<Comment> {
        let post_id = new_comment.post_id;
        tracing::debug!(author_id = %new_comment.author_id, post_id, "Inserting comment");

        let comment = self
            .with_deadline("create_comment", self.insert_comment(new_comment))
            .await
            .inspect_err(|e| {
                if matches!(e, StoreError::Database(_) | StoreError::Timeout(_)) {
                    tracing::error!(error = %e, post_id, "Failed to create comment");
                }
            })?;

        tracing::info!(comment_id = comment.id, post_id, "Comment created");
        Ok(comment)
    }

    async fn allow_comments(
        &self,
        author_id: Uuid,
        post_id: i64,
        allowed: bool,
    ) -> StoreResult<Post> {
        tracing::info!(post_id, %author_id, allowed, "Updating comments allowed for post");

        let post = self
            .with_deadline("allow_comments", async {
                let post = sqlx::query_as::<_, Post>(&format!(
                    r#"
                    UPDATE posts SET allow_comments = $1
                    WHERE post_id = $2 AND author_id = $3
                    RETURNING {POST_COLUMNS}
                    "#
                ))
                .bind(allowed)
                .bind(post_id)
                .bind(author_id)
                .fetch_optional(&self.pool)
                .await?;
                Ok::<_, StoreError>(post)
            })
            .await?;

        match post {
            Some(post) => {
                tracing::info!(post_id, allowed = post.comments_allowed, "Comments allowed updated");
                Ok(post)
            }
            None => {
                tracing::warn!(post_id, %author_id, "Post not found or author mismatch");
                Err(StoreError::PostNotFound(post_id))
            }
        }
    }

    async fn get_posts(&self) -> StoreResult<Vec<Post>> {
        let posts = self
            .with_deadline("get_posts", async {
                let posts = sqlx::query_as::<_, Post>(&format!(
                    "SELECT {POST_COLUMNS} FROM posts ORDER BY post_id ASC"
                ))
                .fetch_all(&self.pool)
                .await?;
                Ok::<_, StoreError>(posts)
            })
            .await?;

        tracing::info!(count = posts.len(), "Posts fetched successfully");
        Ok(posts)
    }

    async fn get_post(&self, id: i64) -> StoreResult<Post> {
        self.with_deadline("get_post", async {
            let post = sqlx::query_as::<_, Post>(&format!(
                "SELECT {POST_COLUMNS} FROM posts WHERE post_id = $1"
            ))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
            Ok::<_, StoreError>(post)
        })
        .await?
        .ok_or_else(|| {
            tracing::warn!(post_id = id, "Post not found");
            StoreError::PostNotFound(id)
        })
    }

    async fn get_comments_for_post(
        &self,
        post_id: i64,
        offset: i64,
        limit: i64,
    ) -> StoreResult<Vec<Comment>> {
        check_window(offset, limit)?;
        let comments = self
            .with_deadline("get_comments_for_post", async {
                let comments = sqlx::query_as::<_, Comment>(&format!(
                    r#"
                    SELECT {COMMENT_COLUMNS}
                    FROM comments
                    WHERE post_id = $1
                    ORDER BY created_at ASC, comment_id ASC
                    OFFSET $2 LIMIT $3
                    "#
                ))
                .bind(post_id)
                .bind(offset)
                .bind(limit)
                .fetch_all(&self.pool)
                .await?;
                Ok::<_, StoreError>(comments)
            })
            .await?;

        tracing::info!(count = comments.len(), post_id, "Comments fetched successfully");
        Ok(comments)
    }

    async fn get_replies_by_parent_id(
        &self,
        parent_id: i64,
        offset: i64,
        limit: i64,
    ) -> StoreResult<Vec<Comment>> {
        check_window(offset, limit)?;
        let replies = self
            .with_deadline("get_replies_by_parent_id", async {
                let replies = sqlx::query_as::<_, Comment>(&format!(
                    r#"
                    SELECT {COMMENT_COLUMNS}
                    FROM comments
                    WHERE parent_id = $1
                    ORDER BY created_at ASC, comment_id ASC
                    OFFSET $2 LIMIT $3
                    "#
                ))
                .bind(parent_id)
                .bind(offset)
                .bind(limit)
                .fetch_all(&self.pool)
                .await?;
                Ok::<_, StoreError>(replies)
            })
            .await?;

        tracing::info!(
            count = replies.len(),
            parent_id,
            offset,
            limit,
            "Replies fetched successfully"
        );
        Ok(replies)
    }

    async fn get_comment_depth(&self, comment_id: i64) -> StoreResult<i32> {
        // Walk up the parent chain. The path array stops cycles and the depth
        // bound stops runaway chains; either leaves the deepest row with a
        // parent still attached.
        let deepest: Option<(i32, Option<i64>)> = self
            .with_deadline("get_comment_depth", async {
                let row: Option<(i32, Option<i64>)> = sqlx::query_as(
                    r#"
                    WITH RECURSIVE ancestry AS (
                        SELECT comment_id, parent_id, 0 AS depth, ARRAY[comment_id] AS path
                        FROM comments
                        WHERE comment_id = $1

                        UNION ALL

                        SELECT c.comment_id, c.parent_id, a.depth + 1, a.path || c.comment_id
                        FROM comments c
                        JOIN ancestry a ON c.comment_id = a.parent_id
                        WHERE a.depth < $2 AND NOT c.comment_id = ANY(a.path)
                    )
                    SELECT depth, parent_id
                    FROM ancestry
                    ORDER BY depth DESC
                    LIMIT 1
                    "#,
                )
                .bind(comment_id)
                .bind(MAX_COMMENT_DEPTH)
                .fetch_optional(&self.pool)
                .await?;
                Ok::<_, StoreError>(row)
            })
            .await?;

        match deepest {
            None => Err(StoreError::CommentNotFound(comment_id)),
            Some((_, Some(_))) => {
                tracing::error!(comment_id, "Comment ancestry is cyclic or too deep");
                Err(StoreError::HierarchyCorrupted { comment_id })
            }
            Some((depth, None)) => {
                tracing::info!(comment_id, depth, "Comment depth calculated");
                Ok(depth)
            }
        }
    }
}
