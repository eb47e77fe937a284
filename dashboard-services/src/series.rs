//! Bounded time series owned by the [`SeriesStore`](crate::SeriesStore)

use chrono::{DateTime, Utc};
use dashboard_core::{PriceSummary, WeatherSummary};
use std::collections::VecDeque;

/// One price series: aligned values and capture instants, capped at `capacity`
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    key: String,
    values: VecDeque<f64>,
    timestamps: VecDeque<DateTime<Utc>>,
    current: f64,
    capacity: usize,
}

impl Series {
    /// Create a series holding a single seed sample
    pub fn new(key: impl Into<String>, seed: f64, now: DateTime<Utc>, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let mut values = VecDeque::with_capacity(capacity + 1);
        let mut timestamps = VecDeque::with_capacity(capacity + 1);
        values.push_back(seed);
        timestamps.push_back(now);

        Self {
            key: key.into(),
            values,
            timestamps,
            current: seed,
            capacity,
        }
    }

    /// Append a sample, evicting from the head once over capacity
    pub fn push(&mut self, value: f64, now: DateTime<Utc>) {
        self.values.push_back(value);
        self.timestamps.push_back(now);
        self.current = value;

        while self.values.len() > self.capacity {
            self.values.pop_front();
            self.timestamps.pop_front();
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Most recent value
    pub fn current(&self) -> f64 {
        self.current
    }

    /// Oldest retained value
    pub fn first(&self) -> f64 {
        self.values.front().copied().unwrap_or(self.current)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> impl ExactSizeIterator<Item = f64> + '_ {
        self.values.iter().copied()
    }

    pub fn timestamps(&self) -> impl ExactSizeIterator<Item = DateTime<Utc>> + '_ {
        self.timestamps.iter().copied()
    }

    /// Formatted view used by snapshots
    pub fn summary(&self) -> Option<PriceSummary> {
        PriceSummary::from_samples(self.values().zip(self.timestamps()))
    }
}

/// The three weather fields at one instant
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeatherSample {
    pub temperature: f64,
    pub humidity: f64,
    pub pressure: f64,
}

/// Current weather for one city plus a bounded history of update instants
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherReading {
    city: String,
    sample: WeatherSample,
    timestamps: VecDeque<DateTime<Utc>>,
    capacity: usize,
}

impl WeatherReading {
    pub fn new(
        city: impl Into<String>,
        sample: WeatherSample,
        now: DateTime<Utc>,
        capacity: usize,
    ) -> Self {
        let capacity = capacity.max(1);
        let mut timestamps = VecDeque::with_capacity(capacity + 1);
        timestamps.push_back(now);

        Self {
            city: city.into(),
            sample,
            timestamps,
            capacity,
        }
    }

    /// Replace the fields in place and record the update instant
    pub fn record(&mut self, sample: WeatherSample, now: DateTime<Utc>) {
        self.sample = sample;
        self.timestamps.push_back(now);
        while self.timestamps.len() > self.capacity {
            self.timestamps.pop_front();
        }
    }

    pub fn city(&self) -> &str {
        &self.city
    }

    pub fn sample(&self) -> WeatherSample {
        self.sample
    }

    pub fn timestamps(&self) -> impl ExactSizeIterator<Item = DateTime<Utc>> + '_ {
        self.timestamps.iter().copied()
    }

    pub fn summary(&self) -> WeatherSummary {
        WeatherSummary::new(
            self.sample.temperature,
            self.sample.humidity,
            self.sample.pressure,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn t(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn test_push_keeps_values_and_timestamps_aligned() {
        let mut series = Series::new("AAPL", 150.0, t(0), 3);
        for i in 1..=5 {
            series.push(150.0 + i as f64, t(i));
            assert_eq!(series.values().len(), series.timestamps().len());
            assert!(series.len() <= 3);
        }

        assert_eq!(series.values().collect::<Vec<_>>(), vec![153.0, 154.0, 155.0]);
        assert_eq!(series.timestamps().collect::<Vec<_>>(), vec![t(3), t(4), t(5)]);
        assert_eq!(series.current(), 155.0);
        assert_eq!(series.first(), 153.0);
    }

    #[test]
    fn test_zero_capacity_is_treated_as_one() {
        let mut series = Series::new("X", 1.0, t(0), 0);
        series.push(2.0, t(1));
        assert_eq!(series.len(), 1);
        assert_eq!(series.current(), 2.0);
    }

    #[test]
    fn test_weather_history_is_bounded() {
        let sample = WeatherSample {
            temperature: 20.0,
            humidity: 50.0,
            pressure: 1000.0,
        };
        let mut reading = WeatherReading::new("London", sample, t(0), 4);
        for i in 1..10 {
            reading.record(sample, t(0) + Duration::seconds(i));
        }
        assert_eq!(reading.timestamps().len(), 4);
        assert_eq!(reading.timestamps().last(), Some(t(9)));
    }
}
