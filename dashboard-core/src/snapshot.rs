//! Snapshot shapes served by the pull endpoint and every push message

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Decimal places for price fields
pub const PRICE_DECIMALS: u32 = 2;

/// Decimal places for weather fields
pub const WEATHER_DECIMALS: u32 = 1;

/// Wall-clock format for sample timestamps
pub const TIMESTAMP_FORMAT: &str = "%H:%M:%S";

/// Round to a fixed number of decimals, ties to even
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round_ties_even() / factor
}

/// Formatted view of one price series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSummary {
    pub current_price: f64,
    /// Current minus the first retained sample
    pub change: f64,
    /// Change relative to the first retained sample, in percent
    pub change_percent: f64,
    pub prices: Vec<f64>,
    pub timestamps: Vec<String>,
}

impl PriceSummary {
    /// Build a summary from chronologically ordered samples.
    ///
    /// Returns `None` for an empty series. A single-sample series reports
    /// zero change.
    pub fn from_samples<I>(samples: I) -> Option<Self>
    where
        I: IntoIterator<Item = (f64, DateTime<Utc>)>,
    {
        let (values, stamps): (Vec<f64>, Vec<DateTime<Utc>>) = samples.into_iter().unzip();

        let first = *values.first()?;
        let current = *values.last()?;

        let (change, change_percent) = if values.len() > 1 {
            let change = current - first;
            let percent = if first != 0.0 {
                change / first * 100.0
            } else {
                0.0
            };
            (
                round_to(change, PRICE_DECIMALS),
                round_to(percent, PRICE_DECIMALS),
            )
        } else {
            (0.0, 0.0)
        };

        Some(Self {
            current_price: round_to(current, PRICE_DECIMALS),
            change,
            change_percent,
            prices: values
                .iter()
                .map(|p| round_to(*p, PRICE_DECIMALS))
                .collect(),
            timestamps: stamps
                .iter()
                .map(|t| t.format(TIMESTAMP_FORMAT).to_string())
                .collect(),
        })
    }
}

/// Formatted view of one city's weather
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSummary {
    pub temperature: f64,
    pub humidity: f64,
    pub pressure: f64,
}

impl WeatherSummary {
    pub fn new(temperature: f64, humidity: f64, pressure: f64) -> Self {
        Self {
            temperature: round_to(temperature, WEATHER_DECIMALS),
            humidity: round_to(humidity, WEATHER_DECIMALS),
            pressure: round_to(pressure, WEATHER_DECIMALS),
        }
    }
}

/// Full point-in-time view of every category
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardSnapshot {
    pub stocks: IndexMap<String, PriceSummary>,
    pub crypto: IndexMap<String, PriceSummary>,
    pub weather: IndexMap<String, WeatherSummary>,
}

impl DashboardSnapshot {
    /// Total number of tracked keys across categories
    pub fn key_count(&self) -> usize {
        self.stocks.len() + self.crypto.len() + self.weather.len()
    }

    pub fn is_empty(&self) -> bool {
        self.key_count() == 0
    }
}

/// Raw series for the chart-detail endpoint of one symbol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSeries {
    pub symbol: String,
    pub title: String,
    pub timestamps: Vec<String>,
    pub prices: Vec<f64>,
}

impl ChartSeries {
    pub fn new(symbol: impl Into<String>, summary: &PriceSummary) -> Self {
        let symbol = symbol.into();
        Self {
            title: format!("{} Price Movement", symbol),
            symbol,
            timestamps: summary.timestamps.clone(),
            prices: summary.prices.clone(),
        }
    }
}
