//! Snapshot and chart endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use dashboard_core::{Category, ChartSeries, DashboardSnapshot};
use serde::Serialize;
use tracing::{debug, error};

use crate::AppState;

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

/// Create dashboard routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/initial-data", get(initial_data))
        .route("/stock-chart/{symbol}", get(stock_chart))
        .route("/crypto-chart/{symbol}", get(crypto_chart))
}

/// Current snapshot of every category, read straight from the store
async fn initial_data(State(state): State<AppState>) -> Json<DashboardSnapshot> {
    Json(state.store.snapshot())
}

async fn stock_chart(State(state): State<AppState>, Path(symbol): Path<String>) -> Response {
    chart(&state, Category::Stocks, symbol)
}

async fn crypto_chart(State(state): State<AppState>, Path(symbol): Path<String>) -> Response {
    chart(&state, Category::Crypto, symbol)
}

fn chart(state: &AppState, category: Category, symbol: String) -> Response {
    match state.store.price_summary(category, &symbol) {
        Ok(summary) => Json(ChartSeries::new(symbol, &summary)).into_response(),
        Err(e) if e.is_not_found() => {
            debug!("Chart requested for unknown {} symbol {}", category, symbol);
            (
                StatusCode::NOT_FOUND,
                Json(ErrorResponse::new("Symbol not found")),
            )
                .into_response()
        }
        Err(e) => {
            error!("Failed to build {} chart for {}: {}", category, symbol, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new(e.to_string())),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::test_support::{get_json, state};
    use chrono::{TimeZone, Utc};
    use dashboard_services::SeriesStore;
    use std::sync::Arc;

    fn app() -> axum::Router {
        let store = Arc::new(SeriesStore::new(50));
        let t0 = Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap();
        let t1 = Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 2).unwrap();
        store.upsert(Category::Stocks, "AAPL", 150.0, t0).unwrap();
        store.upsert(Category::Stocks, "AAPL", 153.0, t1).unwrap();
        store.upsert(Category::Crypto, "BTC-USD", 45_000.0, t0).unwrap();
        crate::app(state(store))
    }

    #[tokio::test]
    async fn test_initial_data() {
        let (status, body) = get_json(app(), "/api/initial-data").await;
        assert_eq!(status, StatusCode::OK);

        let aapl = &body["stocks"]["AAPL"];
        assert_eq!(aapl["current_price"], 153.0);
        assert_eq!(aapl["change"], 3.0);
        assert_eq!(aapl["change_percent"], 2.0);
        assert_eq!(aapl["timestamps"][1], "09:30:02");
        assert_eq!(body["crypto"]["BTC-USD"]["change"], 0.0);
        assert!(body["weather"].as_object().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_stock_chart() {
        let (status, body) = get_json(app(), "/api/stock-chart/AAPL").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["symbol"], "AAPL");
        assert_eq!(body["title"], "AAPL Price Movement");
        assert_eq!(body["prices"], serde_json::json!([150.0, 153.0]));
        assert_eq!(body["timestamps"], serde_json::json!(["09:30:00", "09:30:02"]));
    }

    #[tokio::test]
    async fn test_chart_unknown_symbol_is_404() {
        let (status, body) = get_json(app(), "/api/stock-chart/NOPE").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Symbol not found");

        // Crypto symbols are not visible through the stock endpoint
        let (status, _) = get_json(app(), "/api/stock-chart/BTC-USD").await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = get_json(app(), "/api/crypto-chart/BTC-USD").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["prices"], serde_json::json!([45000.0]));
    }
}
