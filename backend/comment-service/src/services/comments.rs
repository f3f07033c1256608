/// Comment service - handles comment creation, replies, depth and live updates
use super::{store_failure, validate_pagination};
use crate::error::{AppError, Result};
use crate::models::{Comment, NewComment};
use crate::storage::CommentStore;
use crate::subscription::{SubscriberId, Subscription, SubscriptionBroker};
use std::sync::Arc;
use validator::Validate;

#[derive(Clone)]
pub struct CommentService {
    store: Arc<dyn CommentStore>,
    broker: SubscriptionBroker,
}

impl CommentService {
    pub fn new(store: Arc<dyn CommentStore>, broker: SubscriptionBroker) -> Self {
        Self { store, broker }
    }

    pub fn broker(&self) -> &SubscriptionBroker {
        &self.broker
    }

    /// Create a comment and push it to every live subscriber of its post
    pub async fn create_comment(&self, new_comment: NewComment) -> Result<Comment> {
        tracing::info!(
            author_id = %new_comment.author_id,
            post_id = new_comment.post_id,
            parent_id = ?new_comment.parent_id,
            "Creating new comment"
        );

        new_comment.validate().map_err(|e| {
            tracing::warn!(post_id = new_comment.post_id, error = %e, "Rejected comment payload");
            AppError::from(e).context("create comment")
        })?;

        let comment = self
            .store
            .create_comment(new_comment)
            .await
            .map_err(store_failure("create comment"))?;

        let delivered = self.broker.publish(comment.post_id, &comment);
        tracing::info!(
            comment_id = comment.id,
            post_id = comment.post_id,
            delivered,
            "Comment created successfully"
        );
        Ok(comment)
    }

    /// Direct replies to a comment, oldest first. Defaults: offset 0, limit 10.
    pub async fn get_replies(
        &self,
        comment_id: i64,
        offset: Option<i64>,
        limit: Option<i64>,
    ) -> Result<Vec<Comment>> {
        let page = validate_pagination(offset, limit).map_err(|e| e.context("get replies"))?;
        tracing::debug!(
            comment_id,
            offset = page.offset,
            limit = page.limit,
            "Fetching comment replies"
        );

        let replies = self
            .store
            .get_replies_by_parent_id(comment_id, page.offset, page.limit)
            .await
            .map_err(store_failure("get replies"))?;

        tracing::info!(comment_id, reply_count = replies.len(), "Successfully fetched comment replies");
        Ok(replies)
    }

    pub async fn get_comment_depth(&self, comment_id: i64) -> Result<i32> {
        tracing::debug!(comment_id, "Calculating comment depth");

        let depth = self
            .store
            .get_comment_depth(comment_id)
            .await
            .map_err(store_failure("calculate depth"))?;

        tracing::info!(comment_id, depth, "Comment depth calculated");
        Ok(depth)
    }

    /// Open a live feed of new comments on a post
    pub fn subscribe(&self, post_id: i64) -> Subscription {
        self.broker.subscribe(post_id)
    }

    pub fn unsubscribe(&self, post_id: i64, subscriber_id: SubscriberId) -> bool {
        self.broker.unsubscribe(post_id, subscriber_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::storage::{MockCommentStore, StoreError};
    use chrono::Utc;
    use mockall::predicate::eq;
    use uuid::Uuid;

    fn stored(id: i64, new_comment: NewComment) -> Comment {
        Comment {
            id,
            author_id: new_comment.author_id,
            post_id: new_comment.post_id,
            parent_id: new_comment.parent_id,
            content: new_comment.content,
            created_at: Utc::now(),
        }
    }

    fn new_comment(post_id: i64, content: &str) -> NewComment {
        NewComment {
            author_id: Uuid::parse_str("123e4567-e89b-12d3-a456-426614174000").unwrap(),
            post_id,
            parent_id: None,
            content: content.to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_comment_success_publishes() {
        let mut store = MockCommentStore::new();
        store
            .expect_create_comment()
            .withf(|c| c.post_id == 1 && c.content == "Hello")
            .times(1)
            .returning(|c| Ok(stored(123, c)));

        let service = CommentService::new(Arc::new(store), SubscriptionBroker::default());
        let mut sub = service.subscribe(1);

        let comment = service.create_comment(new_comment(1, "Hello")).await.unwrap();
        assert_eq!(comment.id, 123);
        assert_eq!(sub.try_recv().unwrap(), comment);
    }

    #[tokio::test]
    async fn test_failed_create_publishes_nothing() {
        let mut store = MockCommentStore::new();
        store
            .expect_create_comment()
            .returning(|c| Err(StoreError::CommentsNotAllowed(c.post_id)));

        let service = CommentService::new(Arc::new(store), SubscriptionBroker::default());
        let mut sub = service.subscribe(1);

        let err = service
            .create_comment(new_comment(1, "Hello"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PolicyViolation);
        assert!(sub.try_recv().is_err());
        assert_eq!(service.broker().subscriber_count(1), 1);
    }

    #[tokio::test]
    async fn test_create_comment_rejects_bad_content() {
        let service =
            CommentService::new(Arc::new(MockCommentStore::new()), SubscriptionBroker::default());

        let err = service.create_comment(new_comment(1, "")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let err = service
            .create_comment(new_comment(1, &"a".repeat(2001)))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_get_replies_invalid_limit() {
        let service =
            CommentService::new(Arc::new(MockCommentStore::new()), SubscriptionBroker::default());

        let err = service.get_replies(1, None, Some(101)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(err.to_string().contains("limit"));
    }

    #[tokio::test]
    async fn test_get_replies_defaults() {
        let mut store = MockCommentStore::new();
        store
            .expect_get_replies_by_parent_id()
            .with(eq(9), eq(0), eq(10))
            .times(1)
            .returning(|_, _, _| Ok(Vec::new()));

        let service = CommentService::new(Arc::new(store), SubscriptionBroker::default());
        assert!(service.get_replies(9, None, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_get_comment_depth_success() {
        let mut store = MockCommentStore::new();
        store
            .expect_get_comment_depth()
            .with(eq(42))
            .times(1)
            .returning(|_| Ok(3));

        let service = CommentService::new(Arc::new(store), SubscriptionBroker::default());
        assert_eq!(service.get_comment_depth(42).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_get_comment_depth_corrupted_is_internal() {
        let mut store = MockCommentStore::new();
        store
            .expect_get_comment_depth()
            .returning(|id| Err(StoreError::HierarchyCorrupted { comment_id: id }));

        let service = CommentService::new(Arc::new(store), SubscriptionBroker::default());
        let err = service.get_comment_depth(5).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert_eq!(err.public_message(), "internal server error");
    }
}
