//! One viewer's notification stream.
//!
//! A session moves through `Connecting -> Streaming -> Closed`. It
//! registers a channel on connect, forwards each token to its transport,
//! and unregisters exactly once when it closes, whatever the cause.
//!
//! Two ways to drive a session:
//!
//! - [`StreamSession::run`] pumps tokens into a [`NotificationSink`] until
//!   the peer disconnects, a write fails, or the channel closes. Used for
//!   `WebSocket` connections.
//! - The [`Stream`] impl lets an HTTP body poll the session directly.
//!   Used for Server-Sent Events, where dropping the body is the
//!   disconnect signal.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use async_trait::async_trait;
use futures::Stream;
use tilestats_types::SubscriberId;
use tracing::debug;

use super::registry::{SubscriberRegistry, Subscription};

/// Lifecycle state of a [`StreamSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Registering a channel.
    Connecting,
    /// Forwarding tokens to the transport.
    Streaming,
    /// Finished; the channel has been unregistered.
    Closed,
}

/// Why a session closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// The peer went away.
    PeerDisconnected,
    /// Writing to the transport failed.
    TransportFailed,
    /// The registry dropped the channel (eviction or shutdown).
    ChannelClosed,
}

/// A transport write failed.
#[derive(Debug, thiserror::Error)]
#[error("notification sink failed: {message}")]
pub struct SinkError {
    /// Description of the failure.
    pub message: String,
}

impl SinkError {
    /// Build an error from any displayable cause.
    pub fn new(message: impl core::fmt::Display) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}

/// Transport that receives framed notification tokens.
#[async_trait]
pub trait NotificationSink<T: Send + 'static>: Send {
    /// Write one token as one framed message.
    async fn deliver(&mut self, token: T) -> Result<(), SinkError>;
}

/// A single viewer's connection to the notification fan-out.
pub struct StreamSession<T> {
    subscription: Subscription<T>,
    state: SessionState,
}

impl<T> StreamSession<T> {
    /// Register a fresh channel and enter the streaming state.
    pub fn connect(registry: &Arc<SubscriberRegistry<T>>) -> Self {
        let mut session = Self {
            subscription: registry.register(),
            state: SessionState::Connecting,
        };
        session.state = SessionState::Streaming;
        debug!(subscriber = %session.id(), "stream session streaming");
        session
    }

    /// Identifier of the session's channel.
    pub const fn id(&self) -> SubscriberId {
        self.subscription.id()
    }

    /// Current lifecycle state.
    pub const fn state(&self) -> SessionState {
        self.state
    }

    /// Close the session and unregister its channel. Idempotent.
    pub fn close(&mut self, reason: CloseReason) {
        if self.state == SessionState::Closed {
            return;
        }
        self.subscription.close();
        self.state = SessionState::Closed;
        debug!(subscriber = %self.id(), ?reason, "stream session closed");
    }
}

impl<T: Send + 'static> StreamSession<T> {
    /// Forward tokens to `sink` until the session ends.
    ///
    /// `disconnected` resolves when the peer goes away. Returns the reason
    /// the session closed; the channel is unregistered in every case.
    pub async fn run<S, D>(mut self, mut sink: S, disconnected: D) -> CloseReason
    where
        S: NotificationSink<T>,
        D: Future<Output = ()>,
    {
        tokio::pin!(disconnected);

        let reason = loop {
            tokio::select! {
                () = &mut disconnected => break CloseReason::PeerDisconnected,
                token = self.subscription.recv() => {
                    let Some(token) = token else {
                        break CloseReason::ChannelClosed;
                    };
                    if let Err(e) = sink.deliver(token).await {
                        debug!(subscriber = %self.id(), error = %e, "notification write failed");
                        break CloseReason::TransportFailed;
                    }
                }
            }
        };

        self.close(reason);
        reason
    }
}

impl<T> Stream for StreamSession<T> {
    type Item = T;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<T>> {
        let this = self.get_mut();
        if this.state == SessionState::Closed {
            return Poll::Ready(None);
        }
        let polled = Pin::new(&mut this.subscription).poll_next(cx);
        if let Poll::Ready(None) = polled {
            this.close(CloseReason::ChannelClosed);
        }
        polled
    }
}

impl<T> Drop for StreamSession<T> {
    fn drop(&mut self) {
        // Dropped while still streaming: the transport went away.
        self.close(CloseReason::PeerDisconnected);
    }
}

impl<T> core::fmt::Debug for StreamSession<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("StreamSession")
            .field("id", &self.id())
            .field("state", &self.state)
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use futures::StreamExt;
    use tokio::sync::{mpsc, oneshot};

    use super::super::broadcaster::Broadcaster;
    use super::*;

    /// Sink that forwards into a test channel.
    struct ChannelSink(mpsc::UnboundedSender<u32>);

    #[async_trait]
    impl NotificationSink<u32> for ChannelSink {
        async fn deliver(&mut self, token: u32) -> Result<(), SinkError> {
            self.0.send(token).map_err(SinkError::new)
        }
    }

    /// Sink whose every write fails.
    struct BrokenSink;

    #[async_trait]
    impl NotificationSink<u32> for BrokenSink {
        async fn deliver(&mut self, _token: u32) -> Result<(), SinkError> {
            Err(SinkError::new("connection reset"))
        }
    }

    fn setup() -> (Arc<SubscriberRegistry<u32>>, Broadcaster<u32>) {
        let registry = Arc::new(SubscriberRegistry::new(4));
        let broadcaster = Broadcaster::new(Arc::clone(&registry));
        (registry, broadcaster)
    }

    #[test]
    fn connect_registers_and_streams() {
        let (registry, _) = setup();
        let session = StreamSession::connect(&registry);

        assert_eq!(session.state(), SessionState::Streaming);
        assert!(registry.contains(session.id()));
    }

    #[test]
    fn close_is_idempotent_and_unregisters() {
        let (registry, _) = setup();
        let mut session = StreamSession::connect(&registry);
        let id = session.id();

        session.close(CloseReason::PeerDisconnected);
        session.close(CloseReason::TransportFailed);

        assert_eq!(session.state(), SessionState::Closed);
        assert!(!registry.contains(id));
    }

    #[tokio::test]
    async fn run_forwards_tokens_until_peer_disconnects() {
        let (registry, broadcaster) = setup();
        let session = StreamSession::connect(&registry);
        let id = session.id();
        let (out_tx, mut out_rx) = mpsc::unbounded_channel();
        let (gone_tx, gone_rx) = oneshot::channel::<()>();

        let task = tokio::spawn(session.run(ChannelSink(out_tx), async move {
            let _ = gone_rx.await;
        }));

        broadcaster.broadcast(&1);
        broadcaster.broadcast(&2);
        assert_eq!(out_rx.recv().await, Some(1));
        assert_eq!(out_rx.recv().await, Some(2));

        gone_tx.send(()).unwrap();
        assert_eq!(task.await.unwrap(), CloseReason::PeerDisconnected);
        assert!(!registry.contains(id));
        assert_eq!(broadcaster.broadcast(&3), 0);
    }

    #[tokio::test]
    async fn run_closes_on_transport_failure() {
        let (registry, broadcaster) = setup();
        let session = StreamSession::connect(&registry);
        let id = session.id();
        let task = tokio::spawn(session.run(BrokenSink, std::future::pending()));

        broadcaster.broadcast(&1);
        assert_eq!(task.await.unwrap(), CloseReason::TransportFailed);
        assert!(!registry.contains(id));
    }

    #[tokio::test]
    async fn run_ends_when_registry_closes_channels() {
        let (registry, _) = setup();
        let session = StreamSession::connect(&registry);
        let (out_tx, _out_rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(session.run(ChannelSink(out_tx), std::future::pending()));

        tokio::task::yield_now().await;
        registry.close_all();
        assert_eq!(task.await.unwrap(), CloseReason::ChannelClosed);
    }

    #[tokio::test]
    async fn stream_yields_tokens_and_ends_after_eviction() {
        let (registry, broadcaster) = setup();
        let mut session = StreamSession::connect(&registry);

        broadcaster.broadcast(&7);
        assert_eq!(session.next().await, Some(7));

        registry.unregister(session.id());
        assert_eq!(session.next().await, None);
        assert_eq!(session.state(), SessionState::Closed);
        assert_eq!(session.next().await, None);
    }

    #[test]
    fn dropping_session_unregisters() {
        let (registry, _) = setup();
        let session = StreamSession::connect(&registry);
        let id = session.id();
        drop(session);
        assert!(!registry.contains(id));
    }
}
