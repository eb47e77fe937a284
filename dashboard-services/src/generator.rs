//! Synthetic metric generators
//!
//! Each generator owns one category. Price generators walk every symbol by a
//! bounded multiplicative step; the weather generator nudges each field by a
//! bounded additive step and clamps it to a plausible range.

use async_trait::async_trait;
use chrono::Utc;
use dashboard_core::{Category, DashboardError, DashboardResult};
use futures::future::join_all;
use indexmap::IndexSet;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::config::DashboardConfig;
use crate::seed::{resolve_seed, SeedSource};
use crate::series::WeatherSample;
use crate::series_store::SeriesStore;

// ============================================================================
// Weather bounds
// ============================================================================

pub const TEMPERATURE_SEED_RANGE: (f64, f64) = (15.0, 30.0);
pub const HUMIDITY_SEED_RANGE: (f64, f64) = (40.0, 80.0);
pub const PRESSURE_SEED_RANGE: (f64, f64) = (980.0, 1020.0);

pub const TEMPERATURE_STEP: f64 = 1.0;
pub const HUMIDITY_STEP: f64 = 5.0;
pub const PRESSURE_STEP: f64 = 2.0;

pub const TEMPERATURE_BOUNDS: (f64, f64) = (0.0, 45.0);
pub const HUMIDITY_BOUNDS: (f64, f64) = (20.0, 100.0);
pub const PRESSURE_BOUNDS: (f64, f64) = (950.0, 1050.0);

/// Advances one category of the store per tick
#[async_trait]
pub trait Generator: Send + Sync {
    fn category(&self) -> Category;

    /// Produce one new sample per key and write it through the store
    async fn tick(&self, store: &SeriesStore) -> DashboardResult<()>;
}

/// Drop repeated keys, keeping first-seen order
fn unique_keys(keys: Vec<String>) -> Vec<String> {
    keys.into_iter().collect::<IndexSet<_>>().into_iter().collect()
}

/// Multiplicative random step: `current * (1 + U(-bound, bound))`
pub fn step_price<R: Rng + ?Sized>(current: f64, bound: f64, rng: &mut R) -> f64 {
    if bound <= 0.0 {
        return current;
    }
    current * (1.0 + rng.random_range(-bound..=bound))
}

fn perturb<R: Rng + ?Sized>(value: f64, step: f64, (min, max): (f64, f64), rng: &mut R) -> f64 {
    (value + rng.random_range(-step..=step)).clamp(min, max)
}

fn uniform<R: Rng + ?Sized>(rng: &mut R, (low, high): (f64, f64)) -> f64 {
    rng.random_range(low..=high)
}

/// Draw a fresh weather reading from the seed ranges
pub fn seed_weather<R: Rng + ?Sized>(rng: &mut R) -> WeatherSample {
    WeatherSample {
        temperature: uniform(rng, TEMPERATURE_SEED_RANGE),
        humidity: uniform(rng, HUMIDITY_SEED_RANGE),
        pressure: uniform(rng, PRESSURE_SEED_RANGE),
    }
}

/// Perturb every field of a reading and clamp to its bounds
pub fn step_weather<R: Rng + ?Sized>(sample: WeatherSample, rng: &mut R) -> WeatherSample {
    WeatherSample {
        temperature: perturb(sample.temperature, TEMPERATURE_STEP, TEMPERATURE_BOUNDS, rng),
        humidity: perturb(sample.humidity, HUMIDITY_STEP, HUMIDITY_BOUNDS, rng),
        pressure: perturb(sample.pressure, PRESSURE_STEP, PRESSURE_BOUNDS, rng),
    }
}

// ============================================================================
// Price generator
// ============================================================================

/// Random-walk generator for stocks or crypto
pub struct PriceGenerator {
    category: Category,
    symbols: Vec<String>,
    volatility: f64,
    seeds: Arc<dyn SeedSource>,
    seed_timeout: Duration,
    rng: Mutex<StdRng>,
}

impl PriceGenerator {
    pub fn new(
        category: Category,
        symbols: Vec<String>,
        volatility: f64,
        seeds: Arc<dyn SeedSource>,
        seed_timeout: Duration,
    ) -> DashboardResult<Self> {
        if !category.is_price() {
            return Err(DashboardError::config(format!(
                "{} is not a price category",
                category
            )));
        }

        Ok(Self {
            category,
            symbols: unique_keys(symbols),
            volatility,
            seeds,
            seed_timeout,
            rng: Mutex::new(StdRng::from_os_rng()),
        })
    }

    /// Replace the RNG, e.g. with a seeded one for reproducible runs
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = Mutex::new(rng);
        self
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    pub fn volatility(&self) -> f64 {
        self.volatility
    }

    /// Resolve seeds for symbols the store has not seen yet, concurrently
    async fn seed_missing(&self, store: &SeriesStore) -> Vec<(String, f64)> {
        let missing: Vec<&String> = self
            .symbols
            .iter()
            .filter(|symbol| !store.contains(self.category, symbol))
            .collect();

        if missing.is_empty() {
            return Vec::new();
        }

        info!(
            "Seeding {} {} series from {}",
            missing.len(),
            self.category,
            self.seeds.name()
        );

        let lookups = missing.iter().map(|symbol| {
            resolve_seed(
                self.seeds.as_ref(),
                self.category,
                symbol,
                self.seed_timeout,
            )
        });
        let prices = join_all(lookups).await;

        missing.into_iter().cloned().zip(prices).collect()
    }
}

#[async_trait]
impl Generator for PriceGenerator {
    fn category(&self) -> Category {
        self.category
    }

    async fn tick(&self, store: &SeriesStore) -> DashboardResult<()> {
        let seeded = self.seed_missing(store).await;
        if !seeded.is_empty() {
            store.upsert_batch(self.category, seeded, Utc::now())?;
        }

        let steps = {
            let mut rng = self.rng.lock();
            let mut steps = Vec::with_capacity(self.symbols.len());
            for symbol in &self.symbols {
                let current = store
                    .current(self.category, symbol)
                    .ok_or_else(|| DashboardError::unknown_key(self.category, symbol.as_str()))?;
                steps.push((symbol.clone(), step_price(current, self.volatility, &mut *rng)));
            }
            steps
        };

        let count = store.upsert_batch(self.category, steps, Utc::now())?;
        debug!("{} tick appended {} samples", self.category, count);
        Ok(())
    }
}

// ============================================================================
// Weather generator
// ============================================================================

/// Bounded random-walk generator for city weather
pub struct WeatherGenerator {
    cities: Vec<String>,
    rng: Mutex<StdRng>,
}

impl WeatherGenerator {
    pub fn new(cities: Vec<String>) -> Self {
        Self {
            cities: unique_keys(cities),
            rng: Mutex::new(StdRng::from_os_rng()),
        }
    }

    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = Mutex::new(rng);
        self
    }

    pub fn cities(&self) -> &[String] {
        &self.cities
    }
}

#[async_trait]
impl Generator for WeatherGenerator {
    fn category(&self) -> Category {
        Category::Weather
    }

    async fn tick(&self, store: &SeriesStore) -> DashboardResult<()> {
        let samples: Vec<(String, WeatherSample)> = {
            let mut rng = self.rng.lock();
            self.cities
                .iter()
                .map(|city| {
                    let sample = match store.weather_sample(city) {
                        Some(previous) => step_weather(previous, &mut *rng),
                        None => seed_weather(&mut *rng),
                    };
                    (city.clone(), sample)
                })
                .collect()
        };

        let count = store.upsert_weather_batch(samples, Utc::now());
        debug!("weather tick recorded {} readings", count);
        Ok(())
    }
}

/// Build the three default generators from configuration
pub fn generators_from_config(
    config: &DashboardConfig,
    seeds: Arc<dyn SeedSource>,
) -> DashboardResult<Vec<Box<dyn Generator>>> {
    let mut generators: Vec<Box<dyn Generator>> = Vec::with_capacity(Category::ALL.len());

    for category in Category::ALL {
        match config.volatility(category) {
            Some(volatility) => {
                let generator = PriceGenerator::new(
                    category,
                    config.keys(category).to_vec(),
                    volatility,
                    seeds.clone(),
                    config.seed_timeout(),
                )?;
                generators.push(Box::new(generator));
            }
            None => {
                generators.push(Box::new(WeatherGenerator::new(
                    config.keys(category).to_vec(),
                )));
            }
        }
    }

    Ok(generators)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::{OfflineSeedSource, BTC_FALLBACK_SEED};

    struct FixedSeedSource(f64);

    #[async_trait]
    impl SeedSource for FixedSeedSource {
        async fn latest_price(&self, _symbol: &str) -> DashboardResult<f64> {
            Ok(self.0)
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    fn symbols(keys: &[&str]) -> Vec<String> {
        keys.iter().map(|k| k.to_string()).collect()
    }

    fn price_generator(category: Category, keys: &[&str], volatility: f64) -> PriceGenerator {
        PriceGenerator::new(
            category,
            symbols(keys),
            volatility,
            Arc::new(FixedSeedSource(100.0)),
            Duration::from_secs(1),
        )
        .unwrap()
        .with_rng(StdRng::seed_from_u64(7))
    }

    #[test]
    fn test_step_price_stays_within_bound() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut current = 150.0;
        for _ in 0..10_000 {
            let next = step_price(current, 0.02, &mut rng);
            assert!((next / current - 1.0).abs() <= 0.02 + 1e-12);
            current = next;
        }
    }

    #[test]
    fn test_zero_volatility_is_flat() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(step_price(150.0, 0.0, &mut rng), 150.0);
    }

    #[test]
    fn test_weather_clamps_from_extremes() {
        let mut rng = StdRng::seed_from_u64(3);
        let extremes = [
            WeatherSample {
                temperature: 45.0,
                humidity: 100.0,
                pressure: 1050.0,
            },
            WeatherSample {
                temperature: 0.0,
                humidity: 20.0,
                pressure: 950.0,
            },
        ];

        for start in extremes {
            let mut sample = start;
            for _ in 0..1_000 {
                sample = step_weather(sample, &mut rng);
                assert!((0.0..=45.0).contains(&sample.temperature));
                assert!((20.0..=100.0).contains(&sample.humidity));
                assert!((950.0..=1050.0).contains(&sample.pressure));
            }
        }
    }

    #[test]
    fn test_weather_seed_ranges() {
        let mut rng = StdRng::seed_from_u64(9);
        for _ in 0..100 {
            let sample = seed_weather(&mut rng);
            assert!((15.0..=30.0).contains(&sample.temperature));
            assert!((40.0..=80.0).contains(&sample.humidity));
            assert!((980.0..=1020.0).contains(&sample.pressure));
        }
    }

    #[test]
    fn test_weather_category_rejected_for_prices() {
        let result = PriceGenerator::new(
            Category::Weather,
            symbols(&["London"]),
            0.02,
            Arc::new(OfflineSeedSource),
            Duration::from_secs(1),
        );
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_first_tick_appends_seed_then_step() {
        let store = SeriesStore::new(50);
        let generator = price_generator(Category::Stocks, &["AAPL", "MSFT"], 0.02);

        generator.tick(&store).await.unwrap();

        let series = store.series(Category::Stocks, "AAPL").unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.first(), 100.0);
        assert_eq!(store.len(Category::Stocks), 2);
    }

    #[tokio::test]
    async fn test_repeated_symbol_advances_once_per_tick() {
        let store = SeriesStore::new(50);
        let generator = price_generator(Category::Stocks, &["AAPL", "MSFT", "AAPL"], 0.02);
        assert_eq!(generator.symbols(), ["AAPL", "MSFT"]);

        generator.tick(&store).await.unwrap();
        assert_eq!(store.series(Category::Stocks, "AAPL").unwrap().len(), 2);

        for _ in 0..50 {
            generator.tick(&store).await.unwrap();
        }
        let values: Vec<f64> = store
            .series(Category::Stocks, "AAPL")
            .unwrap()
            .values()
            .collect();
        assert_eq!(values.len(), 50);
        for pair in values.windows(2) {
            assert!((pair[1] / pair[0] - 1.0).abs() <= 0.02 + 1e-12);
        }

        let weather = WeatherGenerator::new(symbols(&["Tokyo", "Tokyo"]));
        assert_eq!(weather.cities(), ["Tokyo"]);
    }

    #[tokio::test]
    async fn test_price_walk_respects_volatility() {
        let store = SeriesStore::new(50);
        let generator = price_generator(Category::Crypto, &["ETH-USD"], 0.05);

        for _ in 0..40 {
            generator.tick(&store).await.unwrap();
        }

        let values: Vec<f64> = store
            .series(Category::Crypto, "ETH-USD")
            .unwrap()
            .values()
            .collect();
        assert_eq!(values.len(), 41);
        for pair in values.windows(2) {
            assert!((pair[1] / pair[0] - 1.0).abs() <= 0.05 + 1e-12);
        }
    }

    #[tokio::test]
    async fn test_unavailable_btc_seed_uses_fallback() {
        let store = SeriesStore::new(50);
        let generator = PriceGenerator::new(
            Category::Crypto,
            symbols(&["BTC-USD"]),
            0.05,
            Arc::new(OfflineSeedSource),
            Duration::from_secs(1),
        )
        .unwrap();

        generator.tick(&store).await.unwrap();
        let series = store.series(Category::Crypto, "BTC-USD").unwrap();
        assert_eq!(series.first(), BTC_FALLBACK_SEED);

        generator.tick(&store).await.unwrap();
        assert_eq!(store.series(Category::Crypto, "BTC-USD").unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_weather_first_tick_records_seed_only() {
        let store = SeriesStore::new(50);
        let generator = WeatherGenerator::new(symbols(&["London", "Tokyo"]))
            .with_rng(StdRng::seed_from_u64(11));

        generator.tick(&store).await.unwrap();
        let london = store.weather_sample("London").unwrap();
        assert!((15.0..=30.0).contains(&london.temperature));

        generator.tick(&store).await.unwrap();
        let next = store.weather_sample("London").unwrap();
        assert!((next.temperature - london.temperature).abs() <= 1.0 + 1e-12);
        assert_eq!(store.len(Category::Weather), 2);
    }

    #[test]
    fn test_generators_from_default_config() {
        let config = DashboardConfig::default();
        let generators = generators_from_config(&config, Arc::new(OfflineSeedSource)).unwrap();
        let categories: Vec<Category> = generators.iter().map(|g| g.category()).collect();
        assert_eq!(categories, Category::ALL.to_vec());
    }
}
