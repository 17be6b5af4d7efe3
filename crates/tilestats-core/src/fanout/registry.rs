//! The set of live subscriber channels.
//!
//! The registry holds only the sending half of each channel. The receiving
//! half lives in a [`Subscription`], which removes its own entry when it is
//! dropped, so a task that is aborted or unwinds still cleans up.

use std::collections::BTreeMap;
use std::pin::Pin;
use std::sync::{Arc, Weak};
use std::task::{Context, Poll};

use futures::Stream;
use parking_lot::Mutex;
use tilestats_types::SubscriberId;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;
use tracing::debug;

/// Per-viewer channel capacity used when none is configured.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 5;

/// Registry of live subscriber channels.
///
/// Every add, remove, and snapshot goes through one mutex. The lock is
/// never held across a send or an `.await`.
pub struct SubscriberRegistry<T> {
    members: Mutex<BTreeMap<SubscriberId, mpsc::Sender<T>>>,
    capacity: usize,
}

impl<T> SubscriberRegistry<T> {
    /// Create an empty registry whose channels buffer `capacity` tokens.
    ///
    /// A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        Self {
            members: Mutex::new(BTreeMap::new()),
            capacity: capacity.max(1),
        }
    }

    /// Allocate a bounded channel, insert its sender, and hand back the
    /// receiving side.
    pub fn register(self: &Arc<Self>) -> Subscription<T> {
        let (tx, rx) = mpsc::channel(self.capacity);
        let id = SubscriberId::new();
        let count = {
            let mut members = self.members.lock();
            members.insert(id, tx);
            members.len()
        };
        debug!(subscriber = %id, subscribers = count, "subscriber registered");

        Subscription {
            id,
            rx,
            registry: Arc::downgrade(self),
        }
    }

    /// Remove a channel. Returns whether it was present; removing an
    /// absent channel is a no-op.
    pub fn unregister(&self, id: SubscriberId) -> bool {
        let removed = self.members.lock().remove(&id);
        removed.is_some()
    }

    /// Point-in-time copy of every member, for iteration outside the lock.
    pub fn snapshot(&self) -> Vec<(SubscriberId, mpsc::Sender<T>)> {
        self.members
            .lock()
            .iter()
            .map(|(id, tx)| (*id, tx.clone()))
            .collect()
    }

    /// Whether a channel is currently registered.
    pub fn contains(&self, id: SubscriberId) -> bool {
        self.members.lock().contains_key(&id)
    }

    /// Number of registered channels.
    pub fn len(&self) -> usize {
        self.members.lock().len()
    }

    /// Whether no channel is registered.
    pub fn is_empty(&self) -> bool {
        self.members.lock().is_empty()
    }

    /// Capacity of each newly registered channel.
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drop every sender so all sessions observe a closed channel.
    ///
    /// Returns how many channels were closed.
    pub fn close_all(&self) -> usize {
        let drained = std::mem::take(&mut *self.members.lock());
        let count = drained.len();
        drop(drained);
        debug!(closed = count, "all subscriber channels closed");
        count
    }
}

impl<T> Default for SubscriberRegistry<T> {
    fn default() -> Self {
        Self::new(DEFAULT_CHANNEL_CAPACITY)
    }
}

impl<T> core::fmt::Debug for SubscriberRegistry<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SubscriberRegistry")
            .field("subscribers", &self.len())
            .field("capacity", &self.capacity)
            .finish()
    }
}

/// Receiving side of one registered channel.
///
/// Yields tokens in the order they were sent. Ends (`None`) once the
/// registry drops the sender, either through eviction or
/// [`SubscriberRegistry::close_all`].
pub struct Subscription<T> {
    id: SubscriberId,
    rx: mpsc::Receiver<T>,
    registry: Weak<SubscriberRegistry<T>>,
}

impl<T> Subscription<T> {
    /// Identifier of the underlying channel.
    pub const fn id(&self) -> SubscriberId {
        self.id
    }

    /// Wait for the next token.
    pub async fn recv(&mut self) -> Option<T> {
        self.rx.recv().await
    }

    /// Take a buffered token without waiting.
    pub fn try_recv(&mut self) -> Result<T, TryRecvError> {
        self.rx.try_recv()
    }

    /// Unregister and stop accepting tokens. Idempotent.
    pub fn close(&mut self) {
        if let Some(registry) = self.registry.upgrade()
            && registry.unregister(self.id)
        {
            debug!(subscriber = %self.id, "subscriber unregistered");
        }
        self.rx.close();
    }
}

impl<T> Stream for Subscription<T> {
    type Item = T;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<T>> {
        self.get_mut().rx.poll_recv(cx)
    }
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        self.close();
    }
}

impl<T> core::fmt::Debug for Subscription<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}
