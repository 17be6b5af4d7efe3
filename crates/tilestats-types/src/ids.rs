//! Identifier for connected notification viewers.

use core::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifies one registered notification channel (one connected viewer).
///
/// Backed by a UUID v7, so registry iteration and log lines follow
/// connection order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubscriberId(Uuid);

impl SubscriberId {
    /// Allocate a fresh identifier for a viewer that is connecting now.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for SubscriberId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}
