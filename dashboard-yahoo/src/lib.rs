//! Yahoo Finance integration for the Live Metrics Dashboard
//!
//! Provides a minimal client for the public chart API. The dashboard only
//! uses it to seed each simulated series with a recent real price, so the
//! client exposes a single "latest close" lookup.

pub mod client;
pub mod types;

pub use client::{YahooClient, YahooError, YAHOO_API_BASE};
pub use types::ChartResponse;
