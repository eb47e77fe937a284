//! Live Metrics Dashboard API Server
//!
//! Serves the current snapshot over HTTP and streams a fresh snapshot to
//! every WebSocket client on each scheduler tick.

mod routes;

use axum::{
    http::{header, Method},
    Router,
};
use dashboard_services::{
    BroadcastHub, DashboardConfig, OfflineSeedSource, Scheduler, SchedulerMetrics, SeedSource,
    SeriesStore, WebSocketState, YahooSeedSource,
};
use dashboard_yahoo::YahooClient;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Port used when `SERVER_PORT` is unset or invalid
const DEFAULT_PORT: u16 = 5000;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<SeriesStore>,
    pub hub: Arc<BroadcastHub>,
    pub ws_state: Arc<WebSocketState>,
    pub scheduler: Arc<SchedulerMetrics>,
    pub config: Arc<DashboardConfig>,
}

impl AppState {
    pub fn new(
        store: Arc<SeriesStore>,
        hub: Arc<BroadcastHub>,
        scheduler: Arc<SchedulerMetrics>,
        config: DashboardConfig,
    ) -> Self {
        let ws_state = Arc::new(WebSocketState::new(Arc::clone(&store), Arc::clone(&hub)));
        Self {
            store,
            hub,
            ws_state,
            scheduler,
            config: Arc::new(config),
        }
    }
}

/// Build the full router: `/api/*` pull endpoints plus the `/ws` stream
pub fn app(state: AppState) -> Router {
    // Configure CORS for the dashboard frontend
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .nest("/api", routes::api_routes())
        .merge(routes::ws_routes())
        .layer(cors)
        .with_state(state)
}

/// Pick the seed source for new series
fn seed_source(config: &DashboardConfig) -> Arc<dyn SeedSource> {
    if config.offline {
        info!("Offline mode: series start from fallback seeds");
        return Arc::new(OfflineSeedSource);
    }

    match YahooClient::new(config.seed_timeout()) {
        Ok(client) => {
            info!("Seeding series from Yahoo Finance at {}", client.base_url());
            Arc::new(YahooSeedSource::new(client))
        }
        Err(e) => {
            warn!("Failed to build Yahoo client: {}. Using fallback seeds.", e);
            Arc::new(OfflineSeedSource)
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env.local file
    if let Err(e) = dotenvy::from_filename(".env.local") {
        // Not an error if the file doesn't exist
        if !matches!(e, dotenvy::Error::Io(_)) {
            eprintln!("Warning: Failed to load .env.local: {}", e);
        }
    }

    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,dashboard_api=debug")),
        )
        .init();

    info!("Starting Live Metrics Dashboard API");

    let config = DashboardConfig::from_env()?;
    info!(
        "Tracking {} stocks, {} crypto, {} cities; tick every {:?}",
        config.equities.len(),
        config.crypto.len(),
        config.cities.len(),
        config.tick_interval()
    );

    let store = Arc::new(SeriesStore::new(config.retention_size));
    let hub = Arc::new(BroadcastHub::new(config.subscriber_buffer));

    let scheduler = Scheduler::from_config(
        &config,
        Arc::clone(&store),
        Arc::clone(&hub),
        seed_source(&config),
    )?;
    let scheduler_metrics = scheduler.metrics();
    let scheduler_handle = scheduler.start();

    let state = AppState::new(store, hub, scheduler_metrics, config);
    let app = app(state);

    // Start server
    let port = std::env::var("SERVER_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(DEFAULT_PORT);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    scheduler_handle.stop().await;
    info!("Server stopped");

    Ok(())
}
