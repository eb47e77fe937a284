//! Services for the Live Metrics Dashboard
//!
//! This crate owns the in-memory series store, the synthetic generators and
//! their seed sources, the scheduler that drives them, and the broadcast hub
//! that fans snapshots out to WebSocket clients.

pub mod config;
pub mod generator;
pub mod scheduler;
pub mod seed;
pub mod series;
pub mod series_store;
pub mod websocket;

pub use config::{ConfigError, DashboardConfig};
pub use generator::{generators_from_config, Generator, PriceGenerator, WeatherGenerator};
pub use scheduler::{Scheduler, SchedulerHandle, SchedulerHealth, SchedulerMetrics, SchedulerState};
pub use seed::{fallback_seed, resolve_seed, OfflineSeedSource, SeedSource, YahooSeedSource};
pub use series::{Series, WeatherReading, WeatherSample};
pub use series_store::{CategoryView, SeriesStore};
pub use websocket::{BroadcastHub, PublishReport, SubscriberId, Subscription, WebSocketState};
