//! WebSocket infrastructure for live dashboard updates
//!
//! The hub fans snapshots out to subscribers; the handler bridges one
//! subscriber to one client socket.

mod handler;
mod hub;

pub use handler::WebSocketState;
pub use hub::{BroadcastHub, PublishReport, SubscriberId, Subscription};
