//! Health check endpoints

use axum::{extract::State, http::StatusCode, response::Json, routing::get, Router};
use dashboard_services::{SchedulerHealth, SchedulerState};
use serde::Serialize;

use crate::AppState;

/// Health check response
#[derive(Debug, Serialize)]
struct HealthResponse {
    status: String,
    scheduler: SchedulerHealth,
    tick_interval_ms: u64,
    subscribers: usize,
}

/// Health check handler
async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let scheduler = state.scheduler.health();

    let (code, status) = match scheduler.state {
        SchedulerState::Running => (StatusCode::OK, "healthy"),
        SchedulerState::Stopped => (StatusCode::SERVICE_UNAVAILABLE, "degraded"),
    };

    let response = HealthResponse {
        status: status.to_string(),
        scheduler,
        tick_interval_ms: state.config.tick_interval_ms,
        subscribers: state.hub.subscriber_count(),
    };

    (code, Json(response))
}

/// Simple liveness check (always returns OK if server is running)
async fn liveness() -> &'static str {
    "OK"
}

/// Create health routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/health/live", get(liveness))
}
