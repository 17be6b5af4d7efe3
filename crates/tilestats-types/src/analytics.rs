//! Gameplay telemetry events and the dashboard aggregates built from them.
//!
//! Clients post one event per command (`move` with a direction, or
//! `new_game`). Events are stored verbatim; the dashboard counts them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Maximum stored length of a peer address.
pub const MAX_IP_LEN: usize = 45;

/// Maximum stored length of an event type tag.
pub const MAX_EVENT_TYPE_LEN: usize = 50;

/// Maximum stored length of an event payload.
pub const MAX_EVENT_DATA_LEN: usize = 50;

// ---------------------------------------------------------------------------
// Event kind
// ---------------------------------------------------------------------------

/// The type tag of a telemetry event.
///
/// Known tags get their own variant; anything else is kept verbatim so
/// newer clients can post tags this server does not aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EventKind {
    /// A board move; the payload carries the [`MoveDirection`].
    Move,
    /// The player started a new game.
    NewGame,
    /// Any other tag.
    Other(String),
}

impl EventKind {
    /// The stored tag.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Move => "move",
            Self::NewGame => "new_game",
            Self::Other(tag) => tag,
        }
    }
}

impl From<String> for EventKind {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "move" => Self::Move,
            "new_game" => Self::NewGame,
            _ => Self::Other(tag),
        }
    }
}

impl From<&str> for EventKind {
    fn from(tag: &str) -> Self {
        Self::from(tag.to_owned())
    }
}

impl From<EventKind> for String {
    fn from(kind: EventKind) -> Self {
        match kind {
            EventKind::Other(tag) => tag,
            known => known.as_str().to_owned(),
        }
    }
}

// ---------------------------------------------------------------------------
// Platform
// ---------------------------------------------------------------------------

/// The client platform that produced an event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// Browser build.
    #[default]
    Web,
    /// iOS app.
    Ios,
    /// Android app.
    Android,
    /// Unrecognized platform tag.
    #[serde(other)]
    Other,
}

impl Platform {
    /// The stored tag.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Web => "web",
            Self::Ios => "ios",
            Self::Android => "android",
            Self::Other => "other",
        }
    }

    /// Parse a stored tag; unknown tags map to [`Platform::Other`].
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "web" => Self::Web,
            "ios" => Self::Ios,
            "android" => Self::Android,
            _ => Self::Other,
        }
    }
}

// ---------------------------------------------------------------------------
// Move direction
// ---------------------------------------------------------------------------

/// Direction of a board move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoveDirection {
    /// Swipe up.
    Up,
    /// Swipe down.
    Down,
    /// Swipe left.
    Left,
    /// Swipe right.
    Right,
}

impl MoveDirection {
    /// Every direction, in dashboard order.
    pub const ALL: [Self; 4] = [Self::Up, Self::Down, Self::Left, Self::Right];

    /// The payload text for this direction.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
            Self::Left => "left",
            Self::Right => "right",
        }
    }

    /// Parse a move payload.
    pub fn from_payload(payload: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.as_str() == payload)
    }
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// A telemetry event about to be recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAnalyticsEvent {
    /// Peer address of the client.
    pub ip_address: String,
    /// Event type tag.
    pub event_type: EventKind,
    /// Optional payload (the direction for moves).
    pub event_data: Option<String>,
    /// Client platform.
    pub platform: Platform,
    /// When the server received the event.
    pub timestamp: DateTime<Utc>,
}

impl NewAnalyticsEvent {
    /// Attach a store-assigned identifier.
    pub fn with_id(self, id: i64) -> AnalyticsEvent {
        AnalyticsEvent {
            id,
            ip_address: self.ip_address,
            event_type: self.event_type,
            event_data: self.event_data,
            platform: self.platform,
            timestamp: self.timestamp,
        }
    }
}

/// A recorded telemetry event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct AnalyticsEvent {
    /// Insertion-order identifier.
    pub id: i64,
    /// Peer address of the client.
    pub ip_address: String,
    /// Event type tag.
    #[ts(as = "String")]
    pub event_type: EventKind,
    /// Optional payload.
    pub event_data: Option<String>,
    /// Client platform.
    #[ts(as = "String")]
    pub platform: Platform,
    /// When the server received the event.
    pub timestamp: DateTime<Utc>,
}

impl AnalyticsEvent {
    /// The move direction, when this is a move event with a known payload.
    pub fn direction(&self) -> Option<MoveDirection> {
        match self.event_type {
            EventKind::Move => self.event_data.as_deref().and_then(MoveDirection::from_payload),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Dashboard aggregates
// ---------------------------------------------------------------------------

/// Move counts per direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct MovesByDirection {
    /// Moves up.
    pub up: i64,
    /// Moves down.
    pub down: i64,
    /// Moves left.
    pub left: i64,
    /// Moves right.
    pub right: i64,
}

impl MovesByDirection {
    /// Mutable counter for one direction.
    pub const fn slot_mut(&mut self, direction: MoveDirection) -> &mut i64 {
        match direction {
            MoveDirection::Up => &mut self.up,
            MoveDirection::Down => &mut self.down,
            MoveDirection::Left => &mut self.left,
            MoveDirection::Right => &mut self.right,
        }
    }
}

/// Aggregate counters shown on the dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct DashboardStats {
    /// Distinct client addresses seen.
    pub total_unique_ips: i64,
    /// Total events recorded.
    pub total_commands: i64,
    /// `new_game` events recorded.
    pub new_games: i64,
    /// Move events per direction.
    pub moves_by_direction: MovesByDirection,
}
