//! Series Store
//!
//! Process-wide owner of every price series and weather reading. One
//! scheduler writes, many request handlers read. All access goes through a
//! single reader-writer lock held only for in-memory appends and copies, so a
//! reader always sees each category as it stood between two writes.

use chrono::{DateTime, Utc};
use dashboard_core::{Category, DashboardError, DashboardResult, DashboardSnapshot, PriceSummary};
use indexmap::IndexMap;
use parking_lot::RwLock;
use tracing::debug;

use crate::series::{Series, WeatherReading, WeatherSample};

/// Copied contents of one category
#[derive(Debug, Clone, PartialEq)]
pub enum CategoryView {
    Prices(IndexMap<String, Series>),
    Weather(IndexMap<String, WeatherReading>),
}

impl CategoryView {
    pub fn len(&self) -> usize {
        match self {
            CategoryView::Prices(series) => series.len(),
            CategoryView::Weather(readings) => readings.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Price series, if this is a price category
    pub fn as_prices(&self) -> Option<&IndexMap<String, Series>> {
        match self {
            CategoryView::Prices(series) => Some(series),
            CategoryView::Weather(_) => None,
        }
    }
}

#[derive(Debug, Default)]
struct StoreInner {
    stocks: IndexMap<String, Series>,
    crypto: IndexMap<String, Series>,
    weather: IndexMap<String, WeatherReading>,
}

impl StoreInner {
    fn prices(&self, category: Category) -> DashboardResult<&IndexMap<String, Series>> {
        match category {
            Category::Stocks => Ok(&self.stocks),
            Category::Crypto => Ok(&self.crypto),
            Category::Weather => Err(not_a_price_category()),
        }
    }

    fn prices_mut(&mut self, category: Category) -> DashboardResult<&mut IndexMap<String, Series>> {
        match category {
            Category::Stocks => Ok(&mut self.stocks),
            Category::Crypto => Ok(&mut self.crypto),
            Category::Weather => Err(not_a_price_category()),
        }
    }
}

fn not_a_price_category() -> DashboardError {
    DashboardError::internal("weather readings are not price series")
}

/// Bounded in-memory metric store
#[derive(Debug)]
pub struct SeriesStore {
    inner: RwLock<StoreInner>,
    retention: usize,
}

impl SeriesStore {
    /// Create an empty store keeping `retention` samples per series
    pub fn new(retention: usize) -> Self {
        Self {
            inner: RwLock::new(StoreInner::default()),
            retention: retention.max(1),
        }
    }

    pub fn retention(&self) -> usize {
        self.retention
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Append a sample to a price series, creating it with `value` as the seed
    pub fn upsert(
        &self,
        category: Category,
        key: &str,
        value: f64,
        now: DateTime<Utc>,
    ) -> DashboardResult<()> {
        let mut inner = self.inner.write();
        let series = inner.prices_mut(category)?;
        Self::append(series, key, value, now, self.retention);
        Ok(())
    }

    /// Append one sample per key for a whole category under a single write lock
    pub fn upsert_batch<I>(
        &self,
        category: Category,
        samples: I,
        now: DateTime<Utc>,
    ) -> DashboardResult<usize>
    where
        I: IntoIterator<Item = (String, f64)>,
    {
        let mut inner = self.inner.write();
        let series = inner.prices_mut(category)?;

        let mut count = 0;
        for (key, value) in samples {
            Self::append(series, &key, value, now, self.retention);
            count += 1;
        }
        Ok(count)
    }

    fn append(
        series: &mut IndexMap<String, Series>,
        key: &str,
        value: f64,
        now: DateTime<Utc>,
        retention: usize,
    ) {
        match series.get_mut(key) {
            Some(existing) => existing.push(value, now),
            None => {
                debug!("Creating series {} with seed {}", key, value);
                series.insert(key.to_string(), Series::new(key, value, now, retention));
            }
        }
    }

    /// Record a weather sample, creating the city on first use
    pub fn upsert_weather(&self, city: &str, sample: WeatherSample, now: DateTime<Utc>) {
        self.upsert_weather_batch([(city.to_string(), sample)], now);
    }

    /// Record weather samples for several cities under a single write lock
    pub fn upsert_weather_batch<I>(&self, samples: I, now: DateTime<Utc>) -> usize
    where
        I: IntoIterator<Item = (String, WeatherSample)>,
    {
        let mut inner = self.inner.write();
        let weather = &mut inner.weather;
        let mut count = 0;
        for (city, sample) in samples {
            match weather.get_mut(&city) {
                Some(reading) => reading.record(sample, now),
                None => {
                    debug!("Creating weather reading for {}", city);
                    let reading = WeatherReading::new(city.clone(), sample, now, self.retention);
                    weather.insert(city, reading);
                }
            }
            count += 1;
        }
        count
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Whether a key has been created in a category
    pub fn contains(&self, category: Category, key: &str) -> bool {
        let inner = self.inner.read();
        match category {
            Category::Stocks => inner.stocks.contains_key(key),
            Category::Crypto => inner.crypto.contains_key(key),
            Category::Weather => inner.weather.contains_key(key),
        }
    }

    /// Latest value of a price series
    pub fn current(&self, category: Category, key: &str) -> Option<f64> {
        let inner = self.inner.read();
        inner.prices(category).ok()?.get(key).map(Series::current)
    }

    /// Latest weather sample for a city
    pub fn weather_sample(&self, city: &str) -> Option<WeatherSample> {
        self.inner.read().weather.get(city).map(WeatherReading::sample)
    }

    /// Copy of one price series
    pub fn series(&self, category: Category, key: &str) -> DashboardResult<Series> {
        let inner = self.inner.read();
        inner
            .prices(category)?
            .get(key)
            .cloned()
            .ok_or_else(|| DashboardError::unknown_key(category, key))
    }

    /// Formatted view of one price series
    pub fn price_summary(&self, category: Category, key: &str) -> DashboardResult<PriceSummary> {
        self.series(category, key)?
            .summary()
            .ok_or_else(|| DashboardError::unknown_key(category, key))
    }

    /// Fully copied view of every entry in a category
    pub fn snapshot_all(&self, category: Category) -> CategoryView {
        let inner = self.inner.read();
        match category {
            Category::Stocks => CategoryView::Prices(inner.stocks.clone()),
            Category::Crypto => CategoryView::Prices(inner.crypto.clone()),
            Category::Weather => CategoryView::Weather(inner.weather.clone()),
        }
    }

    /// Formatted view of all categories, taken under one read lock
    pub fn snapshot(&self) -> DashboardSnapshot {
        let inner = self.inner.read();
        let summarize = |series: &IndexMap<String, Series>| -> IndexMap<String, PriceSummary> {
            series
                .iter()
                .filter_map(|(key, s)| s.summary().map(|summary| (key.clone(), summary)))
                .collect()
        };

        DashboardSnapshot {
            stocks: summarize(&inner.stocks),
            crypto: summarize(&inner.crypto),
            weather: inner
                .weather
                .iter()
                .map(|(city, reading)| (city.clone(), reading.summary()))
                .collect(),
        }
    }

    /// Number of keys in a category
    pub fn len(&self, category: Category) -> usize {
        let inner = self.inner.read();
        match category {
            Category::Stocks => inner.stocks.len(),
            Category::Crypto => inner.crypto.len(),
            Category::Weather => inner.weather.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        Category::ALL.iter().all(|c| self.len(*c) == 0)
    }
}
