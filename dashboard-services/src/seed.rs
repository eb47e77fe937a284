//! Seed sources
//!
//! A new price series starts from a real quote when one can be fetched in
//! time, and from a fixed per-category constant otherwise.

use async_trait::async_trait;
use dashboard_core::{Category, DashboardError, DashboardResult};
use dashboard_yahoo::YahooClient;
use std::time::Duration;
use tracing::{debug, warn};

/// Equity seed when no quote is available
pub const EQUITY_FALLBACK_SEED: f64 = 150.0;

/// Seed for BTC-like crypto keys when no quote is available
pub const BTC_FALLBACK_SEED: f64 = 45_000.0;

/// Seed for other crypto keys when no quote is available
pub const CRYPTO_FALLBACK_SEED: f64 = 3_000.0;

/// Best-effort provider of a recent real price
#[async_trait]
pub trait SeedSource: Send + Sync {
    /// Most recent price for `symbol`. Any error means "no data".
    async fn latest_price(&self, symbol: &str) -> DashboardResult<f64>;

    /// Name for logging purposes
    fn name(&self) -> &str;
}

/// Seed source backed by the Yahoo Finance chart API
#[derive(Debug, Clone)]
pub struct YahooSeedSource {
    client: YahooClient,
}

impl YahooSeedSource {
    pub fn new(client: YahooClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SeedSource for YahooSeedSource {
    async fn latest_price(&self, symbol: &str) -> DashboardResult<f64> {
        self.client
            .latest_close(symbol)
            .await
            .map_err(|e| DashboardError::seed_unavailable(symbol, e.to_string()))
    }

    fn name(&self) -> &str {
        "yahoo"
    }
}

/// Seed source that never has data; every key starts from its fallback
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineSeedSource;

#[async_trait]
impl SeedSource for OfflineSeedSource {
    async fn latest_price(&self, symbol: &str) -> DashboardResult<f64> {
        Err(DashboardError::seed_unavailable(symbol, "offline mode"))
    }

    fn name(&self) -> &str {
        "offline"
    }
}

/// Fixed seed for a key when the external source has nothing
pub fn fallback_seed(category: Category, symbol: &str) -> f64 {
    match category {
        Category::Crypto if symbol.to_uppercase().contains("BTC") => BTC_FALLBACK_SEED,
        Category::Crypto => CRYPTO_FALLBACK_SEED,
        Category::Stocks | Category::Weather => EQUITY_FALLBACK_SEED,
    }
}

/// Ask `source` for a seed within `timeout`, degrading to the fallback
pub async fn resolve_seed(
    source: &dyn SeedSource,
    category: Category,
    symbol: &str,
    timeout: Duration,
) -> f64 {
    let fallback = fallback_seed(category, symbol);

    match tokio::time::timeout(timeout, source.latest_price(symbol)).await {
        Ok(Ok(price)) if price.is_finite() && price > 0.0 => {
            debug!("Seeded {} from {} at {}", symbol, source.name(), price);
            price
        }
        Ok(Ok(price)) => {
            warn!(
                "{} returned unusable seed {} for {}, using fallback {}",
                source.name(),
                price,
                symbol,
                fallback
            );
            fallback
        }
        Ok(Err(e)) => {
            warn!("{}; using fallback {}", e, fallback);
            fallback
        }
        Err(_) => {
            warn!(
                "Seed lookup for {} timed out after {:?}, using fallback {}",
                symbol, timeout, fallback
            );
            fallback
        }
    }
}
