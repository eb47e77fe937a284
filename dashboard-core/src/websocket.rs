//! WebSocket message types for live dashboard updates
//!
//! Every frame is a JSON envelope `{"event": ..., "data": ...}`.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::DashboardSnapshot;

/// Greeting sent with the `connected` event
pub const CONNECTED_MESSAGE: &str = "Connected to dashboard";

// ============================================================================
// Client -> Server Messages
// ============================================================================

/// Messages sent from client to server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Ask for an immediate snapshot instead of waiting for the next tick
    RequestData,
    /// Ping to keep connection alive
    Ping {
        /// Client timestamp
        timestamp: i64,
    },
}

// ============================================================================
// Server -> Client Messages
// ============================================================================

/// Messages sent from server to client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Sent once when the connection opens
    Connected { data: String },
    /// Full snapshot of every category
    DataUpdate(Arc<DashboardSnapshot>),
    /// Pong response to client ping
    Pong {
        /// Echo back client timestamp
        client_timestamp: i64,
        /// Server timestamp
        server_timestamp: i64,
    },
    /// Error message
    Error { code: ErrorCode, message: String },
}

impl ServerMessage {
    pub fn connected() -> Self {
        ServerMessage::Connected {
            data: CONNECTED_MESSAGE.to_string(),
        }
    }
}

/// Error codes for WebSocket errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Invalid message format
    InvalidMessage,
}
