use crate::models::Comment;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio_stream::wrappers::ReceiverStream;
use uuid::Uuid;

/// Mailbox bound used by `subscribe`
pub const DEFAULT_MAILBOX_CAPACITY: usize = 16;

/// Unique identifier for one live subscription
///
/// Lets `unsubscribe` remove exactly one mailbox when several clients watch
/// the same post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(Uuid);

impl SubscriberId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SubscriberId {
    fn default() -> Self {
        Self::new()
    }
}

/// Registered sending half of a mailbox
struct Subscriber {
    id: SubscriberId,
    sender: mpsc::Sender<Comment>,
}

/// Receiving half of a mailbox, handed to the subscriber.
///
/// `recv` returns `None` once the broker has closed the mailbox, either
/// through `unsubscribe` or because a delivery found it full.
#[derive(Debug)]
pub struct Subscription {
    id: SubscriberId,
    post_id: i64,
    receiver: mpsc::Receiver<Comment>,
}

impl Subscription {
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    pub fn post_id(&self) -> i64 {
        self.post_id
    }

    pub async fn recv(&mut self) -> Option<Comment> {
        self.receiver.recv().await
    }

    pub fn try_recv(&mut self) -> Result<Comment, mpsc::error::TryRecvError> {
        self.receiver.try_recv()
    }

    /// Adapt the mailbox into a `Stream` for the client transport
    pub fn into_stream(self) -> ReceiverStream<Comment> {
        ReceiverStream::new(self.receiver)
    }
}

/// Per-post registry of live comment subscribers
///
/// Delivery is non-blocking: a mailbox that cannot take a comment right away
/// (full, or its receiver dropped) is closed and evicted. Publishers never
/// wait on slow subscribers; the subscriber notices on its own read side.
#[derive(Clone)]
pub struct SubscriptionBroker {
    // post_id -> subscribers
    inner: Arc<Mutex<HashMap<i64, Vec<Subscriber>>>>,
    mailbox_capacity: usize,
}

impl Default for SubscriptionBroker {
    fn default() -> Self {
        Self::new(DEFAULT_MAILBOX_CAPACITY)
    }
}

impl SubscriptionBroker {
    pub fn new(mailbox_capacity: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(HashMap::new())),
            mailbox_capacity: mailbox_capacity.max(1),
        }
    }

    fn registry(&self) -> MutexGuard<'_, HashMap<i64, Vec<Subscriber>>> {
        // Every mutation leaves the map structurally valid, so a poisoned
        // lock is safe to reuse.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Subscribe to new comments on a post with the broker's default mailbox
    /// capacity. The post does not need to exist.
    pub fn subscribe(&self, post_id: i64) -> Subscription {
        self.subscribe_with_capacity(post_id, self.mailbox_capacity)
    }

    pub fn subscribe_with_capacity(&self, post_id: i64, capacity: usize) -> Subscription {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let id = SubscriberId::new();

        let mut registry = self.registry();
        let topic = registry.entry(post_id).or_default();
        topic.push(Subscriber { id, sender });

        tracing::debug!(
            subscriber_id = ?id,
            post_id,
            subscribers = topic.len(),
            "Added comment subscriber"
        );

        Subscription {
            id,
            post_id,
            receiver,
        }
    }

    /// Close and remove one mailbox. Returns whether it was registered.
    ///
    /// A topic left without subscribers is removed from the registry.
    pub fn unsubscribe(&self, post_id: i64, subscriber_id: SubscriberId) -> bool {
        let mut registry = self.registry();
        let Some(topic) = registry.get_mut(&post_id) else {
            return false;
        };

        let before = topic.len();
        // Dropping the sender closes the mailbox.
        topic.retain(|s| s.id != subscriber_id);
        let removed = topic.len() != before;

        if removed {
            tracing::debug!(
                subscriber_id = ?subscriber_id,
                post_id,
                remaining = topic.len(),
                "Removed comment subscriber"
            );
        }
        if topic.is_empty() {
            registry.remove(&post_id);
            tracing::debug!(post_id, "Removed empty topic from registry");
        }

        removed
    }

    /// Deliver a comment to every subscriber of the post.
    ///
    /// Returns the number of mailboxes that accepted it. Mailboxes that were
    /// full or abandoned are closed and evicted.
    pub fn publish(&self, post_id: i64, comment: &Comment) -> usize {
        let mut registry = self.registry();
        let Some(topic) = registry.get_mut(&post_id) else {
            return 0;
        };

        let before = topic.len();
        topic.retain(|subscriber| match subscriber.sender.try_send(comment.clone()) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                tracing::debug!(
                    subscriber_id = ?subscriber.id,
                    post_id,
                    "Mailbox full, evicting subscriber"
                );
                false
            }
            Err(TrySendError::Closed(_)) => false,
        });
        let delivered = topic.len();

        if delivered != before {
            tracing::debug!(
                post_id,
                evicted = before - delivered,
                active = delivered,
                "Evicted dead comment subscribers"
            );
        }
        if topic.is_empty() {
            registry.remove(&post_id);
        }

        delivered
    }

    pub fn subscriber_count(&self, post_id: i64) -> usize {
        self.registry().get(&post_id).map(Vec::len).unwrap_or(0)
    }

    /// Number of posts with at least one subscriber
    pub fn topic_count(&self) -> usize {
        self.registry().len()
    }
}
