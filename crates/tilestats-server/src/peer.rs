//! Submitter identity.
//!
//! The peer address of the TCP connection identifies who submitted a score
//! or event. It is only available when the server is started with
//! connect info; otherwise (and in router-level tests) the identity is
//! `"unknown"`.

use std::convert::Infallible;
use std::net::SocketAddr;

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::request::Parts;
use tilestats_types::analytics::MAX_IP_LEN;

/// Identity used when the peer address is unavailable.
pub const UNKNOWN_PEER: &str = "unknown";

/// The peer IP address of the request, as a string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submitter(pub String);

impl Submitter {
    /// Borrow the identity.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<S: Send + Sync> FromRequestParts<S> for Submitter {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let identity = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map_or_else(
                || UNKNOWN_PEER.to_owned(),
                |ConnectInfo(addr)| addr.ip().to_string(),
            );
        Ok(Self(truncate(identity, MAX_IP_LEN)))
    }
}

fn truncate(mut value: String, max: usize) -> String {
    if value.len() > max {
        let mut cut = max;
        while !value.is_char_boundary(cut) {
            cut = cut.saturating_sub(1);
        }
        value.truncate(cut);
    }
    value
}
