use super::{check_window, CommentStore, StoreError, StoreResult, MAX_COMMENT_DEPTH};
use crate::models::{Comment, NewComment, NewPost, Post};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

#[derive(Default)]
struct MemoryState {
    posts: BTreeMap<i64, Post>,
    comments: HashMap<i64, Comment>,
    // post_id -> comment ids in creation order
    post_comments: HashMap<i64, Vec<i64>>,
    // parent_id -> reply ids in creation order
    replies: HashMap<i64, Vec<i64>>,
    last_post_id: i64,
    last_comment_id: i64,
    last_created_at: Option<DateTime<Utc>>,
}

impl MemoryState {
    /// Creation timestamps never go backwards, so insertion order and
    /// (created_at, id) order agree.
    fn next_timestamp(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let ts = match self.last_created_at {
            Some(last) if last > now => last,
            _ => now,
        };
        self.last_created_at = Some(ts);
        ts
    }

    fn page(&self, ids: Option<&Vec<i64>>, offset: i64, limit: i64) -> Vec<Comment> {
        let Some(ids) = ids else {
            return Vec::new();
        };
        let offset = usize::try_from(offset).unwrap_or(usize::MAX);
        let limit = usize::try_from(limit).unwrap_or(0);
        if offset >= ids.len() {
            return Vec::new();
        }

        ids[offset..]
            .iter()
            .take(limit)
            .filter_map(|id| self.comments.get(id).cloned())
            .collect()
    }
}

/// In-process `CommentStore`.
///
/// Intended for tests and single-process development. All state lives behind
/// one mutex, so each operation observes and mutates a consistent snapshot;
/// nothing is persisted.
#[derive(Default)]
pub struct MemoryCommentStore {
    state: Mutex<MemoryState>,
}

impl MemoryCommentStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        // State is only mutated after every check has passed, so a panic in
        // another holder cannot leave it half-written.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl CommentStore for MemoryCommentStore {
    async fn create_post(&self, new_post: NewPost) -> StoreResult<Post> {
        let mut state = self.state();
        state.last_post_id += 1;
        let created_at = state.next_timestamp();

        let post = Post {
            id: state.last_post_id,
            author_id: new_post.author_id,
            title: new_post.title,
            content: new_post.content,
            comments_allowed: new_post.comments_allowed,
            created_at,
        };
        state.posts.insert(post.id, post.clone());

        tracing::debug!(post_id = post.id, author_id = %post.author_id, "Post stored in memory");
        Ok(post)
    }

    async fn create_comment(&self, new_comment: NewComment) -> StoreResult<Comment> {
        let mut state = self.state();

        let post = state
            .posts
            .get(&new_comment.post_id)
            .ok_or(StoreError::PostNotFound(new_comment.post_id))?;
        if !post.comments_allowed {
            return Err(StoreError::CommentsNotAllowed(new_comment.post_id));
        }

        if let Some(parent_id) = new_comment.parent_id {
            let same_post = state
                .comments
                .get(&parent_id)
                .map(|parent| parent.post_id == new_comment.post_id)
                .unwrap_or(false);
            if !same_post {
                return Err(StoreError::ParentNotFound(parent_id));
            }
        }

        state.last_comment_id += 1;
        let created_at = state.next_timestamp();
        let comment = Comment {
            id: state.last_comment_id,
            author_id: new_comment.author_id,
            post_id: new_comment.post_id,
            parent_id: new_comment.parent_id,
            content: new_comment.content,
            created_at,
        };

        state
            .post_comments
            .entry(comment.post_id)
            .or_default()
            .push(comment.id);
        if let Some(parent_id) = comment.parent_id {
            state.replies.entry(parent_id).or_default().push(comment.id);
        }
        state.comments.insert(comment.id, comment.clone());

        tracing::debug!(
            comment_id = comment.id,
            post_id = comment.post_id,
            "Comment stored in memory"
        );
        Ok(comment)
    }

    async fn allow_comments(
        &self,
        author_id: Uuid,
        post_id: i64,
        allowed: bool,
    ) -> StoreResult<Post> {
        let mut state = self.state();
        match state.posts.get_mut(&post_id) {
            Some(post) if post.author_id == author_id => {
                post.comments_allowed = allowed;
                Ok(post.clone())
            }
            _ => Err(StoreError::PostNotFound(post_id)),
        }
    }

    async fn get_posts(&self) -> StoreResult<Vec<Post>> {
        Ok(self.state().posts.values().cloned().collect())
    }

    async fn get_post(&self, id: i64) -> StoreResult<Post> {
        self.state()
            .posts
            .get(&id)
            .cloned()
            .ok_or(StoreError::PostNotFound(id))
    }

    async fn get_comments_for_post(
        &self,
        post_id: i64,
        offset: i64,
        limit: i64,
    ) -> StoreResult<Vec<Comment>> {
        check_window(offset, limit)?;
        let state = self.state();
        Ok(state.page(state.post_comments.get(&post_id), offset, limit))
    }

    async fn get_replies_by_parent_id(
        &self,
        parent_id: i64,
        offset: i64,
        limit: i64,
    ) -> StoreResult<Vec<Comment>> {
        check_window(offset, limit)?;
        let state = self.state();
        Ok(state.page(state.replies.get(&parent_id), offset, limit))
    }

    async fn get_comment_depth(&self, comment_id: i64) -> StoreResult<i32> {
        let state = self.state();
        let mut current = state
            .comments
            .get(&comment_id)
            .ok_or(StoreError::CommentNotFound(comment_id))?;

        let mut depth = 0;
        let mut visited = HashSet::from([comment_id]);
        while let Some(parent_id) = current.parent_id {
            if depth >= MAX_COMMENT_DEPTH || !visited.insert(parent_id) {
                return Err(StoreError::HierarchyCorrupted { comment_id });
            }
            current = state
                .comments
                .get(&parent_id)
                .ok_or(StoreError::HierarchyCorrupted { comment_id })?;
            depth += 1;
        }

        Ok(depth)
    }
}
