//! API route definitions

mod dashboard;
mod health;
pub mod ws;

use axum::Router;
use crate::AppState;

/// Create all API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(dashboard::routes())
        .merge(health::routes())
}

/// Create WebSocket routes (separate from API)
pub fn ws_routes() -> Router<AppState> {
    ws::routes()
}

#[cfg(test)]
pub(crate) mod test_support {
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use axum::Router;
    use dashboard_services::{BroadcastHub, DashboardConfig, SchedulerMetrics, SeriesStore};
    use serde_json::Value;
    use std::sync::Arc;
    use tower::ServiceExt;

    use crate::AppState;

    pub fn state(store: Arc<SeriesStore>) -> AppState {
        AppState::new(
            store,
            Arc::new(BroadcastHub::new(4)),
            Arc::new(SchedulerMetrics::default()),
            DashboardConfig::default(),
        )
    }

    pub async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
        (status, json)
    }
}
