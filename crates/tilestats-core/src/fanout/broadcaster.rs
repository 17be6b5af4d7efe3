//! Fire-and-forget delivery of a token to every registered channel.

use std::sync::Arc;

use tokio::sync::mpsc::error::TrySendError;
use tracing::debug;

use super::registry::SubscriberRegistry;

/// Pushes tokens into every channel of a [`SubscriberRegistry`].
///
/// Delivery never blocks and never fails from the caller's point of view.
/// A channel that is full, or whose receiver is gone, is evicted.
pub struct Broadcaster<T> {
    registry: Arc<SubscriberRegistry<T>>,
}

impl<T: Clone> Broadcaster<T> {
    /// Create a broadcaster over a shared registry.
    pub const fn new(registry: Arc<SubscriberRegistry<T>>) -> Self {
        Self { registry }
    }

    /// Offer `token` to every channel in a registry snapshot.
    ///
    /// Returns the number of channels that accepted it.
    pub fn broadcast(&self, token: &T) -> usize {
        let members = self.registry.snapshot();
        let mut delivered: usize = 0;

        for (id, tx) in members {
            match tx.try_send(token.clone()) {
                Ok(()) => delivered = delivered.saturating_add(1),
                Err(TrySendError::Full(_)) => {
                    self.registry.unregister(id);
                    debug!(subscriber = %id, "evicted subscriber with full channel");
                }
                Err(TrySendError::Closed(_)) => {
                    self.registry.unregister(id);
                    debug!(subscriber = %id, "evicted subscriber with closed channel");
                }
            }
        }

        delivered
    }
}

impl<T> Clone for Broadcaster<T> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
        }
    }
}

impl<T> core::fmt::Debug for Broadcaster<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Broadcaster")
            .field("registry", &self.registry)
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tokio::sync::mpsc::error::TryRecvError;

    use super::*;

    fn setup(capacity: usize) -> (Arc<SubscriberRegistry<u32>>, Broadcaster<u32>) {
        let registry = Arc::new(SubscriberRegistry::new(capacity));
        let broadcaster = Broadcaster::new(Arc::clone(&registry));
        (registry, broadcaster)
    }

    #[test]
    fn broadcast_with_no_subscribers_delivers_nothing() {
        let (_registry, broadcaster) = setup(2);
        assert_eq!(broadcaster.broadcast(&1), 0);
    }

    #[tokio::test]
    async fn every_subscriber_receives_in_order() {
        let (registry, broadcaster) = setup(4);
        let mut a = registry.register();
        let mut b = registry.register();

        assert_eq!(broadcaster.broadcast(&1), 2);
        assert_eq!(broadcaster.broadcast(&2), 2);

        assert_eq!(a.recv().await, Some(1));
        assert_eq!(a.recv().await, Some(2));
        assert_eq!(b.recv().await, Some(1));
        assert_eq!(b.recv().await, Some(2));
    }

    #[tokio::test]
    async fn full_channel_is_evicted_and_later_broadcasts_proceed() {
        let (registry, broadcaster) = setup(2);
        let mut slow = registry.register();
        let mut fast = registry.register();

        assert_eq!(broadcaster.broadcast(&1), 2);
        assert_eq!(fast.recv().await, Some(1));
        assert_eq!(broadcaster.broadcast(&2), 2);
        assert_eq!(fast.recv().await, Some(2));

        // `slow` now holds two undrained tokens; the third overflows it.
        assert_eq!(broadcaster.broadcast(&3), 1);
        assert!(!registry.contains(slow.id()));
        assert!(registry.contains(fast.id()));

        assert_eq!(broadcaster.broadcast(&4), 1);
        assert_eq!(fast.recv().await, Some(3));
        assert_eq!(fast.recv().await, Some(4));

        // The evicted channel drains what it buffered, then ends.
        assert_eq!(slow.recv().await, Some(1));
        assert_eq!(slow.recv().await, Some(2));
        assert_eq!(slow.recv().await, None);
    }

    #[tokio::test]
    async fn late_subscriber_sees_only_later_broadcasts() {
        let (registry, broadcaster) = setup(4);
        let mut early = registry.register();
        broadcaster.broadcast(&1);

        let mut late = registry.register();
        broadcaster.broadcast(&2);

        assert_eq!(early.recv().await, Some(1));
        assert_eq!(early.recv().await, Some(2));
        assert_eq!(late.recv().await, Some(2));
        assert!(matches!(late.try_recv(), Err(TryRecvError::Empty)));
    }

    #[tokio::test]
    async fn concurrent_registrations_each_get_every_broadcast() {
        let (registry, broadcaster) = setup(8);

        let handles: Vec<_> = (0..2)
            .map(|_| {
                let registry = Arc::clone(&registry);
                tokio::spawn(async move { registry.register() })
            })
            .collect();
        let mut subs = Vec::new();
        for handle in handles {
            subs.push(handle.await.unwrap());
        }
        assert_ne!(subs.first().unwrap().id(), subs.last().unwrap().id());

        assert_eq!(broadcaster.broadcast(&5), 2);
        assert_eq!(broadcaster.broadcast(&6), 2);
        for sub in &mut subs {
            assert_eq!(sub.recv().await, Some(5));
            assert_eq!(sub.recv().await, Some(6));
        }
    }
}
