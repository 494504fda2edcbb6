//! The change-notification channel.
//!
//! Subscribe/unsubscribe are lock-free: the subscriber list is an immutable
//! vector behind an atomic pointer, replaced through a compare-and-swap
//! retry loop. Raising loads the list once and synchronously invokes every
//! handler registered at the instant of the read; handlers added after the
//! read begins are not guaranteed to see that particular raise.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwap;

/// A change-notification handler, invoked with the mutated property's name.
pub type ChangeHandler = Arc<dyn Fn(&str) + Send + Sync>;

/// Token identifying one subscription on one channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

#[derive(Clone)]
struct Subscriber {
    id: u64,
    handler: ChangeHandler,
}

/// Lock-free subscriber list with synchronous raise.
pub struct ChangeChannel {
    subscribers: ArcSwap<Vec<Subscriber>>,
    next_id: AtomicU64,
}

impl ChangeChannel {
    /// Create a channel with no subscribers
    pub fn new() -> Self {
        Self {
            subscribers: ArcSwap::from_pointee(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Add a handler; returns a token for [`ChangeChannel::unsubscribe`]
    pub fn subscribe(&self, handler: ChangeHandler) -> SubscriptionId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.subscribers.rcu(|current| {
            let mut next = Vec::with_capacity(current.len() + 1);
            next.extend(current.iter().cloned());
            next.push(Subscriber {
                id,
                handler: handler.clone(),
            });
            next
        });
        SubscriptionId(id)
    }

    /// Remove a subscription; returns whether it was present
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let previous = self.subscribers.rcu(|current| {
            current
                .iter()
                .filter(|s| s.id != id.0)
                .cloned()
                .collect::<Vec<_>>()
        });
        previous.iter().any(|s| s.id == id.0)
    }

    /// Invoke every currently registered handler with `property`
    pub fn raise(&self, property: &str) {
        let snapshot = self.subscribers.load();
        if snapshot.is_empty() {
            return;
        }
        for subscriber in snapshot.iter() {
            (subscriber.handler)(property);
        }
    }

    /// Number of current subscribers
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.load().len()
    }
}

impl Default for ChangeChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ChangeChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeChannel")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;

    #[test]
    fn test_subscribe_and_raise() {
        let channel = ChangeChannel::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let sink = seen.clone();
        channel.subscribe(Arc::new(move |property| {
            sink.lock().unwrap().push(property.to_string());
        }));

        channel.raise("Length");
        channel.raise("Width");

        assert_eq!(*seen.lock().unwrap(), vec!["Length", "Width"]);
    }

    #[test]
    fn test_unsubscribe_stops_delivery() {
        let channel = ChangeChannel::new();
        let count = Arc::new(AtomicUsize::new(0));

        let sink = count.clone();
        let id = channel.subscribe(Arc::new(move |_| {
            sink.fetch_add(1, Ordering::SeqCst);
        }));

        channel.raise("Length");
        assert!(channel.unsubscribe(id));
        channel.raise("Length");

        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(!channel.unsubscribe(id));
        assert_eq!(channel.subscriber_count(), 0);
    }

    #[test]
    fn test_raise_with_no_subscribers_is_noop() {
        let channel = ChangeChannel::new();
        channel.raise("Length");
        assert_eq!(channel.subscriber_count(), 0);
    }

    #[test]
    fn test_multiple_subscribers_each_invoked() {
        let channel = ChangeChannel::new();
        let count = Arc::new(AtomicUsize::new(0));

        for _ in 0..5 {
            let sink = count.clone();
            channel.subscribe(Arc::new(move |_| {
                sink.fetch_add(1, Ordering::SeqCst);
            }));
        }

        channel.raise("Length");
        assert_eq!(count.load(Ordering::SeqCst), 5);
    }

    #[test]
    fn test_concurrent_subscribe_loses_no_updates() {
        const THREADS: usize = 16;
        const PER_THREAD: usize = 50;

        let channel = ChangeChannel::new();
        std::thread::scope(|scope| {
            for _ in 0..THREADS {
                scope.spawn(|| {
                    for _ in 0..PER_THREAD {
                        channel.subscribe(Arc::new(|_| {}));
                    }
                });
            }
        });

        assert_eq!(channel.subscriber_count(), THREADS * PER_THREAD);
    }

    #[test]
    fn test_concurrent_unsubscribe_removes_exactly_once() {
        let channel = ChangeChannel::new();
        let ids: Vec<SubscriptionId> =
            (0..64).map(|_| channel.subscribe(Arc::new(|_| {}))).collect();

        let removed = AtomicUsize::new(0);
        std::thread::scope(|scope| {
            let channel = &channel;
            let removed = &removed;
            for chunk in ids.chunks(16) {
                scope.spawn(move || {
                    for &id in chunk {
                        if channel.unsubscribe(id) {
                            removed.fetch_add(1, Ordering::SeqCst);
                        }
                    }
                });
            }
        });

        assert_eq!(removed.load(Ordering::SeqCst), 64);
        assert_eq!(channel.subscriber_count(), 0);
    }
}
