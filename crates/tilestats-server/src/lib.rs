//! HTTP API server for Tilestats.
//!
//! Serves the game clients and the dashboard:
//!
//! - score submission and the current global record
//! - telemetry ingestion and dashboard aggregates
//! - "record changed" notifications over Server-Sent Events and `WebSocket`
//!
//! The handlers hold no business logic of their own. Arbitration and
//! fan-out live in `tilestats-core`; storage is reached through its traits.
//!
//! # Modules
//!
//! - [`router`] -- Route table and middleware
//! - [`server`] -- TCP listener lifecycle and graceful shutdown
//! - [`state`] -- Shared application state
//! - [`handlers`] -- Dashboard, telemetry, and health endpoints
//! - [`scores`] -- High-score endpoints
//! - [`stream`] -- SSE and `WebSocket` notification streams
//! - [`peer`] -- Submitter identity extraction
//! - [`error`] -- API error type and its JSON response

pub mod error;
pub mod handlers;
pub mod peer;
pub mod router;
pub mod scores;
pub mod server;
pub mod state;
pub mod stream;

pub use error::ApiError;
pub use router::build_router;
pub use server::{ServerConfig, ServerError, serve, start_server};
pub use state::{AppState, StateOptions};
