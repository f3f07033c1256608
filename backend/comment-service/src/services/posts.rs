/// Post service - handles post creation, retrieval and comment settings
use super::{store_failure, validate_pagination};
use crate::error::Result;
use crate::models::{Comment, NewPost, Post};
use crate::storage::CommentStore;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Clone)]
pub struct PostService {
    store: Arc<dyn CommentStore>,
}

impl PostService {
    pub fn new(store: Arc<dyn CommentStore>) -> Self {
        Self { store }
    }

    /// Create a new post
    pub async fn create_post(&self, new_post: NewPost) -> Result<Post> {
        tracing::debug!(author_id = %new_post.author_id, title = %new_post.title, "Creating new post");

        let post = self
            .store
            .create_post(new_post)
            .await
            .map_err(store_failure("create post"))?;

        tracing::debug!(post_id = post.id, author_id = %post.author_id, "Successfully created post");
        Ok(post)
    }

    /// Get a post by ID
    pub async fn get_post(&self, post_id: i64) -> Result<Post> {
        tracing::debug!(post_id, "Fetching post");
        self.store
            .get_post(post_id)
            .await
            .map_err(store_failure("get post"))
    }

    /// Get all posts
    pub async fn get_posts(&self) -> Result<Vec<Post>> {
        let posts = self
            .store
            .get_posts()
            .await
            .map_err(store_failure("get posts"))?;

        tracing::debug!(count = posts.len(), "Successfully fetched posts");
        Ok(posts)
    }

    /// Enable or disable comments. Only the post's author may do this.
    pub async fn allow_comments(&self, author_id: Uuid, post_id: i64, allowed: bool) -> Result<Post> {
        tracing::debug!(%author_id, post_id, allowed, "Setting comments allowed for post");

        let post = self
            .store
            .allow_comments(author_id, post_id, allowed)
            .await
            .map_err(store_failure("allow comments"))?;

        tracing::debug!(post_id, allowed = post.comments_allowed, "Successfully updated post");
        Ok(post)
    }

    /// Get comments for a post, oldest first
    pub async fn get_comments_for_post(
        &self,
        post_id: i64,
        offset: Option<i64>,
        limit: Option<i64>,
    ) -> Result<Vec<Comment>> {
        let page =
            validate_pagination(offset, limit).map_err(|e| e.context("get comments for post"))?;
        tracing::debug!(post_id, offset = page.offset, limit = page.limit, "Fetching comments for post");

        let comments = self
            .store
            .get_comments_for_post(post_id, page.offset, page.limit)
            .await
            .map_err(store_failure("get comments for post"))?;

        tracing::debug!(post_id, count = comments.len(), "Successfully fetched comments for post");
        Ok(comments)
    }
}
