//! Real-time "record changed" notification streams.
//!
//! Each connection gets its own [`StreamSession`] and therefore its own
//! bounded channel. Every notification is the bare text `update`; clients
//! respond by re-fetching `/global-high`. Nothing is replayed on connect.
//!
//! - `GET /high-score-updates` -- Server-Sent Events, one `data: update`
//!   event per notification, with optional keep-alive comments.
//! - `GET /ws/high-score` -- `WebSocket`, one text frame per notification.

use std::convert::Infallible;
use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, Stream, StreamExt};
use tilestats_core::{NotificationSink, SinkError, StreamSession};
use tilestats_types::ScoreNotice;
use tracing::debug;

use crate::state::AppState;

/// Open a Server-Sent Events stream of notifications.
///
/// The session ends when the client disconnects (the body is dropped) or
/// when the registry closes the channel.
pub async fn sse_updates(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let session = StreamSession::connect(&state.registry);
    debug!(subscriber = %session.id(), "SSE client connected");

    let sse = Sse::new(notice_events(session));
    match state.options.keep_alive {
        Some(interval) => sse.keep_alive(KeepAlive::new().interval(interval)).into_response(),
        None => sse.into_response(),
    }
}

/// Map a session onto SSE events.
fn notice_events(
    session: StreamSession<ScoreNotice>,
) -> impl Stream<Item = Result<Event, Infallible>> {
    session.map(|notice| Ok(Event::default().data(notice.as_str())))
}

/// Upgrade to a `WebSocket` stream of notifications.
pub async fn ws_updates(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_ws(socket, state))
}

/// Forward notifications as text frames until the client goes away.
async fn handle_ws(socket: WebSocket, state: Arc<AppState>) {
    let session = StreamSession::connect(&state.registry);
    let id = session.id();
    debug!(subscriber = %id, "WebSocket client connected");

    let (sender, receiver) = socket.split();
    let reason = session
        .run(WsSink { sender }, wait_for_close(receiver))
        .await;

    debug!(subscriber = %id, ?reason, "WebSocket client finished");
}

/// Resolve once the client sends a close frame or the socket ends.
///
/// Other inbound frames are ignored; axum answers pings itself.
async fn wait_for_close(mut receiver: SplitStream<WebSocket>) {
    while let Some(msg) = receiver.next().await {
        match msg {
            Ok(Message::Close(_)) | Err(_) => return,
            Ok(_) => {}
        }
    }
}

/// Write half of a `WebSocket`, framing each notice as text.
struct WsSink {
    sender: SplitSink<WebSocket, Message>,
}

#[async_trait]
impl NotificationSink<ScoreNotice> for WsSink {
    async fn deliver(&mut self, token: ScoreNotice) -> Result<(), SinkError> {
        self.sender
            .send(Message::Text(token.as_str().into()))
            .await
            .map_err(SinkError::new)
    }
}
