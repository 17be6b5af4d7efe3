//! Real-time notification fan-out.
//!
//! One bounded channel per connected viewer. The [`SubscriberRegistry`]
//! owns the sending halves behind a single lock, the [`Broadcaster`] pushes
//! a token into every channel without blocking (evicting channels that are
//! full), and each [`StreamSession`] drains its own channel into a
//! transport until the peer goes away.
//!
//! Backpressure is local to each viewer: a slow consumer loses its channel
//! instead of stalling the broadcast or growing memory. Notifications are
//! change hints, so a dropped viewer recovers by reconnecting and
//! re-querying the current state.

mod broadcaster;
mod registry;
mod session;

pub use broadcaster::Broadcaster;
pub use registry::{DEFAULT_CHANNEL_CAPACITY, SubscriberRegistry, Subscription};
pub use session::{CloseReason, NotificationSink, SessionState, SinkError, StreamSession};
