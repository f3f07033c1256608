//! Store fixtures shared by the memory and PostgreSQL integration tests.
//!
//! Every check creates its own posts, so checks can run against one shared
//! database without interfering.
#![allow(dead_code)]

use comment_service::models::{Comment, NewComment, NewPost, Post};
use comment_service::storage::{CommentStore, StoreError};
use uuid::Uuid;

pub async fn create_post(store: &dyn CommentStore, author_id: Uuid, allowed: bool) -> Post {
    store
        .create_post(NewPost {
            author_id,
            title: "Test post".to_string(),
            content: "Test post content".to_string(),
            comments_allowed: allowed,
        })
        .await
        .expect("Failed to create post")
}

pub fn new_comment(post_id: i64, parent_id: Option<i64>, content: &str) -> NewComment {
    NewComment {
        author_id: Uuid::new_v4(),
        post_id,
        parent_id,
        content: content.to_string(),
    }
}

pub async fn create_comment(
    store: &dyn CommentStore,
    post_id: i64,
    parent_id: Option<i64>,
    content: &str,
) -> Comment {
    store
        .create_comment(new_comment(post_id, parent_id, content))
        .await
        .expect("Failed to create comment")
}

/// P → C1 → C2: depth 0 and 1, C2 is the only reply of C1
pub async fn check_reply_chain(store: &dyn CommentStore) {
    let post = create_post(store, Uuid::new_v4(), true).await;
    let c1 = create_comment(store, post.id, None, "root").await;
    let c2 = create_comment(store, post.id, Some(c1.id), "reply").await;

    assert!(c1.is_root());
    assert_eq!(c2.parent_id, Some(c1.id));
    assert_eq!(store.get_comment_depth(c1.id).await.unwrap(), 0);
    assert_eq!(store.get_comment_depth(c2.id).await.unwrap(), 1);

    let replies = store.get_replies_by_parent_id(c1.id, 0, 10).await.unwrap();
    assert_eq!(replies, vec![c2.clone()]);

    let leaf_replies = store.get_replies_by_parent_id(c2.id, 0, 10).await.unwrap();
    assert!(leaf_replies.is_empty());

    let all = store.get_comments_for_post(post.id, 0, 10).await.unwrap();
    assert_eq!(all, vec![c1, c2]);
}

/// Disabled comments reject creation and persist nothing
pub async fn check_comments_not_allowed(store: &dyn CommentStore) {
    let post = create_post(store, Uuid::new_v4(), false).await;

    let err = store
        .create_comment(new_comment(post.id, None, "nope"))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::CommentsNotAllowed(id) if id == post.id));

    let comments = store.get_comments_for_post(post.id, 0, 100).await.unwrap();
    assert!(comments.is_empty());
}

/// Parents must exist and belong to the same post
pub async fn check_parent_scoping(store: &dyn CommentStore) {
    let first = create_post(store, Uuid::new_v4(), true).await;
    let second = create_post(store, Uuid::new_v4(), true).await;
    let foreign = create_comment(store, first.id, None, "on first post").await;

    let err = store
        .create_comment(new_comment(second.id, Some(foreign.id), "cross-post reply"))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::ParentNotFound(id) if id == foreign.id));

    let err = store
        .create_comment(new_comment(second.id, Some(i64::MAX), "orphan"))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::ParentNotFound(_)));

    let err = store
        .create_comment(new_comment(i64::MAX, None, "no post"))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::PostNotFound(_)));

    assert!(store
        .get_comments_for_post(second.id, 0, 10)
        .await
        .unwrap()
        .is_empty());
}

/// A chain of `length` nested replies reaches depth `length - 1`
pub async fn check_depth_chain(store: &dyn CommentStore, length: usize) -> Vec<i32> {
    let post = create_post(store, Uuid::new_v4(), true).await;

    let mut parent = None;
    let mut depths = Vec::with_capacity(length);
    for i in 0..length {
        let comment = create_comment(store, post.id, parent, &format!("level {i}")).await;
        depths.push(store.get_comment_depth(comment.id).await.unwrap());
        parent = Some(comment.id);
    }

    let expected: Vec<i32> = (0..length as i32).collect();
    assert_eq!(depths, expected);
    depths
}

/// Offset/limit windows in creation order; past-the-end is empty
pub async fn check_pagination(store: &dyn CommentStore) {
    let post = create_post(store, Uuid::new_v4(), true).await;
    let root = create_comment(store, post.id, None, "root").await;

    let mut replies = Vec::new();
    for i in 0..5 {
        replies.push(create_comment(store, post.id, Some(root.id), &format!("reply {i}")).await);
    }

    let page = store.get_replies_by_parent_id(root.id, 1, 2).await.unwrap();
    assert_eq!(page, replies[1..3].to_vec());

    let tail = store.get_replies_by_parent_id(root.id, 4, 10).await.unwrap();
    assert_eq!(tail, replies[4..].to_vec());

    let past_end = store.get_comments_for_post(post.id, 6, 10).await.unwrap();
    assert!(past_end.is_empty());

    let zero_limit = store.get_comments_for_post(post.id, 0, 0).await.unwrap();
    assert!(zero_limit.is_empty());

    for (offset, limit) in [(-1, 5), (0, -1), (-3, -3)] {
        let err = store
            .get_comments_for_post(post.id, offset, limit)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::InvalidWindow { offset: o, limit: l } if o == offset && l == limit
        ));

        let err = store
            .get_replies_by_parent_id(root.id, offset, limit)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidWindow { .. }));
    }

    let everything = store.get_comments_for_post(post.id, 0, 100).await.unwrap();
    assert_eq!(everything.len(), 6);
    assert_eq!(everything[0], root);
    assert!(everything
        .windows(2)
        .all(|w| (w[0].created_at, w[0].id) < (w[1].created_at, w[1].id)));
}

/// Only the author toggles the flag, and the flag gates new comments
pub async fn check_allow_comments(store: &dyn CommentStore) {
    let author_id = Uuid::new_v4();
    let post = create_post(store, author_id, true).await;

    let err = store
        .allow_comments(Uuid::new_v4(), post.id, false)
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::PostNotFound(id) if id == post.id));
    assert!(store.get_post(post.id).await.unwrap().comments_allowed);

    let updated = store.allow_comments(author_id, post.id, false).await.unwrap();
    assert!(!updated.comments_allowed);
    assert_eq!(store.get_post(post.id).await.unwrap(), updated);

    let err = store
        .create_comment(new_comment(post.id, None, "too late"))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::CommentsNotAllowed(_)));

    store.allow_comments(author_id, post.id, true).await.unwrap();
    create_comment(store, post.id, None, "welcome back").await;
}

/// Posts are listed by ascending id; lookups of unknown ids fail
pub async fn check_post_lookup(store: &dyn CommentStore) {
    let a = create_post(store, Uuid::new_v4(), true).await;
    let b = create_post(store, Uuid::new_v4(), false).await;
    assert!(a.id < b.id);

    let posts = store.get_posts().await.unwrap();
    assert!(posts.windows(2).all(|w| w[0].id < w[1].id));
    assert!(posts.contains(&a));
    assert!(posts.contains(&b));

    assert_eq!(store.get_post(b.id).await.unwrap(), b);
    assert!(matches!(
        store.get_post(i64::MAX).await.unwrap_err(),
        StoreError::PostNotFound(_)
    ));
    assert!(matches!(
        store.get_comment_depth(i64::MAX).await.unwrap_err(),
        StoreError::CommentNotFound(_)
    ));
}
