//! Core types for the Live Metrics Dashboard
//!
//! This crate defines the shared data structures used across the dashboard,
//! including metric categories, snapshot shapes, and the WebSocket protocol.

pub mod category;
pub mod error;
pub mod snapshot;
pub mod websocket;

pub use category::Category;
pub use error::{DashboardError, DashboardResult};
pub use snapshot::{
    round_to, ChartSeries, DashboardSnapshot, PriceSummary, WeatherSummary, PRICE_DECIMALS,
    TIMESTAMP_FORMAT, WEATHER_DECIMALS,
};
pub use websocket::{ClientMessage, ErrorCode, ServerMessage, CONNECTED_MESSAGE};
