//! Yahoo Finance chart API response types
//!
//! Only the fields needed to recover the most recent close are modelled;
//! everything else in the payload is ignored.

use serde::Deserialize;

/// Top-level envelope of `/v8/finance/chart/{symbol}`
#[derive(Debug, Clone, Deserialize)]
pub struct ChartResponse {
    pub chart: ChartBody,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChartBody {
    #[serde(default)]
    pub result: Option<Vec<ChartResult>>,
    #[serde(default)]
    pub error: Option<ChartError>,
}

/// Error object Yahoo returns alongside an empty result
#[derive(Debug, Clone, Deserialize)]
pub struct ChartError {
    pub code: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChartResult {
    #[serde(default)]
    pub meta: Option<ChartMeta>,
    #[serde(default)]
    pub indicators: Option<Indicators>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartMeta {
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub regular_market_price: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Indicators {
    #[serde(default)]
    pub quote: Vec<QuoteIndicator>,
}

/// Per-interval OHLCV columns. Yahoo emits `null` for intervals without trades.
#[derive(Debug, Clone, Deserialize)]
pub struct QuoteIndicator {
    #[serde(default)]
    pub close: Vec<Option<f64>>,
}

impl ChartResponse {
    /// Most recent non-null, positive close in the first result.
    ///
    /// Falls back to `regularMarketPrice` when the close column is empty.
    pub fn latest_close(&self) -> Option<f64> {
        let result = self.chart.result.as_ref()?.first()?;

        let from_closes = result
            .indicators
            .as_ref()
            .and_then(|ind| ind.quote.first())
            .and_then(|quote| {
                quote
                    .close
                    .iter()
                    .rev()
                    .flatten()
                    .copied()
                    .find(|p| p.is_finite() && *p > 0.0)
            });

        from_closes.or_else(|| {
            result
                .meta
                .as_ref()
                .and_then(|m| m.regular_market_price)
                .filter(|p| p.is_finite() && *p > 0.0)
        })
    }
}
