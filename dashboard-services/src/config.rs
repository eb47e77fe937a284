//! Dashboard configuration
//!
//! Every option has a default and can be overridden through an
//! environment variable.

use std::collections::HashSet;
use std::env;
use std::str::FromStr;
use std::time::Duration;

use dashboard_core::Category;

pub const DEFAULT_TICK_INTERVAL_MS: u64 = 2_000;
pub const DEFAULT_RETRY_BACKOFF_MS: u64 = 5_000;
pub const DEFAULT_RETENTION_SIZE: usize = 50;
pub const DEFAULT_EQUITY_VOLATILITY: f64 = 0.02;
pub const DEFAULT_CRYPTO_VOLATILITY: f64 = 0.05;
pub const DEFAULT_SEED_TIMEOUT_MS: u64 = 5_000;
pub const DEFAULT_SUBSCRIBER_BUFFER: usize = 16;

const DEFAULT_EQUITIES: &[&str] = &["AAPL", "GOOGL", "MSFT", "AMZN", "TSLA"];
const DEFAULT_CRYPTO: &[&str] = &["BTC-USD", "ETH-USD", "ADA-USD"];
const DEFAULT_CITIES: &[&str] = &["New York", "London", "Tokyo", "Sydney", "Mumbai"];

/// Runtime configuration for the store, generators, scheduler and hub
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardConfig {
    /// Delay between the end of one tick and the start of the next
    pub tick_interval_ms: u64,
    /// Delay after a failed tick before retrying
    pub retry_backoff_ms: u64,
    /// Samples kept per series
    pub retention_size: usize,
    /// Max relative step per tick for equities
    pub equity_volatility: f64,
    /// Max relative step per tick for crypto
    pub crypto_volatility: f64,
    /// Upper bound on one external seed lookup
    pub seed_timeout_ms: u64,
    /// Snapshots buffered per push subscriber before updates are dropped
    pub subscriber_buffer: usize,
    pub equities: Vec<String>,
    pub crypto: Vec<String>,
    pub cities: Vec<String>,
    /// Skip the external seed source entirely
    pub offline: bool,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
            retry_backoff_ms: DEFAULT_RETRY_BACKOFF_MS,
            retention_size: DEFAULT_RETENTION_SIZE,
            equity_volatility: DEFAULT_EQUITY_VOLATILITY,
            crypto_volatility: DEFAULT_CRYPTO_VOLATILITY,
            seed_timeout_ms: DEFAULT_SEED_TIMEOUT_MS,
            subscriber_buffer: DEFAULT_SUBSCRIBER_BUFFER,
            equities: to_owned_list(DEFAULT_EQUITIES),
            crypto: to_owned_list(DEFAULT_CRYPTO),
            cities: to_owned_list(DEFAULT_CITIES),
            offline: false,
        }
    }
}

impl DashboardConfig {
    /// Load configuration from environment variables
    ///
    /// Recognised variables:
    /// - DASHBOARD_TICK_INTERVAL_MS, DASHBOARD_RETRY_BACKOFF_MS
    /// - DASHBOARD_RETENTION_SIZE, DASHBOARD_SUBSCRIBER_BUFFER
    /// - DASHBOARD_EQUITY_VOLATILITY, DASHBOARD_CRYPTO_VOLATILITY
    /// - DASHBOARD_SEED_TIMEOUT_MS, DASHBOARD_OFFLINE
    /// - DASHBOARD_EQUITIES, DASHBOARD_CRYPTO, DASHBOARD_CITIES (comma separated)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let config = Self {
            tick_interval_ms: parse_var(&lookup, "DASHBOARD_TICK_INTERVAL_MS", defaults.tick_interval_ms)?,
            retry_backoff_ms: parse_var(&lookup, "DASHBOARD_RETRY_BACKOFF_MS", defaults.retry_backoff_ms)?,
            retention_size: parse_var(&lookup, "DASHBOARD_RETENTION_SIZE", defaults.retention_size)?,
            equity_volatility: parse_var(&lookup, "DASHBOARD_EQUITY_VOLATILITY", defaults.equity_volatility)?,
            crypto_volatility: parse_var(&lookup, "DASHBOARD_CRYPTO_VOLATILITY", defaults.crypto_volatility)?,
            seed_timeout_ms: parse_var(&lookup, "DASHBOARD_SEED_TIMEOUT_MS", defaults.seed_timeout_ms)?,
            subscriber_buffer: parse_var(&lookup, "DASHBOARD_SUBSCRIBER_BUFFER", defaults.subscriber_buffer)?,
            equities: list_var(&lookup, "DASHBOARD_EQUITIES", defaults.equities),
            crypto: list_var(&lookup, "DASHBOARD_CRYPTO", defaults.crypto),
            cities: list_var(&lookup, "DASHBOARD_CITIES", defaults.cities),
            offline: bool_var(&lookup, "DASHBOARD_OFFLINE", defaults.offline)?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_interval_ms == 0 {
            return Err(ConfigError::invalid("DASHBOARD_TICK_INTERVAL_MS", "0", "must be positive"));
        }
        if self.retry_backoff_ms == 0 {
            return Err(ConfigError::invalid("DASHBOARD_RETRY_BACKOFF_MS", "0", "must be positive"));
        }
        if self.retention_size == 0 {
            return Err(ConfigError::invalid("DASHBOARD_RETENTION_SIZE", "0", "must be positive"));
        }
        if self.subscriber_buffer == 0 {
            return Err(ConfigError::invalid("DASHBOARD_SUBSCRIBER_BUFFER", "0", "must be positive"));
        }
        for (name, value) in [
            ("DASHBOARD_EQUITY_VOLATILITY", self.equity_volatility),
            ("DASHBOARD_CRYPTO_VOLATILITY", self.crypto_volatility),
        ] {
            if !(value > 0.0 && value < 1.0) {
                return Err(ConfigError::invalid(name, value.to_string(), "must be in (0, 1)"));
            }
        }
        for (name, list) in [
            ("DASHBOARD_EQUITIES", &self.equities),
            ("DASHBOARD_CRYPTO", &self.crypto),
            ("DASHBOARD_CITIES", &self.cities),
        ] {
            if list.is_empty() {
                return Err(ConfigError::EmptyList(name.to_string()));
            }
            let mut seen = HashSet::with_capacity(list.len());
            if let Some(key) = list.iter().find(|key| !seen.insert(key.as_str())) {
                return Err(ConfigError::DuplicateKey {
                    var: name.to_string(),
                    key: key.clone(),
                });
            }
        }
        Ok(())
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }

    pub fn seed_timeout(&self) -> Duration {
        Duration::from_millis(self.seed_timeout_ms)
    }

    /// Volatility bound for a price category (`None` for weather)
    pub fn volatility(&self, category: Category) -> Option<f64> {
        match category {
            Category::Stocks => Some(self.equity_volatility),
            Category::Crypto => Some(self.crypto_volatility),
            Category::Weather => None,
        }
    }

    /// Keys tracked for a category
    pub fn keys(&self, category: Category) -> &[String] {
        match category {
            Category::Stocks => &self.equities,
            Category::Crypto => &self.crypto,
            Category::Weather => &self.cities,
        }
    }
}

fn to_owned_list(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn parse_var<F, T>(lookup: &F, name: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e: T::Err| ConfigError::invalid(name, raw.clone(), e.to_string())),
        None => Ok(default),
    }
}

fn list_var<F>(lookup: &F, name: &str, default: Vec<String>) -> Vec<String>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(raw) => raw
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect(),
        None => default,
    }
}

fn bool_var<F>(lookup: &F, name: &str, default: bool) -> Result<bool, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(raw) => match raw.trim().to_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" | "" => Ok(false),
            _ => Err(ConfigError::invalid(name, raw, "expected a boolean")),
        },
        None => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value {value:?} for {var}: {reason}")]
    Invalid {
        var: String,
        value: String,
        reason: String,
    },

    #[error("{0} cannot be empty")]
    EmptyList(String),

    #[error("{var} lists {key} more than once")]
    DuplicateKey { var: String, key: String },
}

impl ConfigError {
    fn invalid(var: &str, value: impl Into<String>, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            var: var.to_string(),
            value: value.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_nothing_set() {
        let config = DashboardConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config, DashboardConfig::default());
        assert_eq!(config.tick_interval(), Duration::from_secs(2));
        assert_eq!(config.retry_backoff(), Duration::from_secs(5));
        assert_eq!(config.retention_size, 50);
        assert_eq!(config.volatility(Category::Stocks), Some(0.02));
        assert_eq!(config.volatility(Category::Crypto), Some(0.05));
        assert_eq!(config.volatility(Category::Weather), None);
        assert_eq!(config.keys(Category::Crypto), ["BTC-USD", "ETH-USD", "ADA-USD"]);
        assert_eq!(config.keys(Category::Weather).len(), 5);
    }

    #[test]
    fn test_overrides() {
        let config = DashboardConfig::from_lookup(lookup_from(&[
            ("DASHBOARD_TICK_INTERVAL_MS", "500"),
            ("DASHBOARD_RETENTION_SIZE", " 10 "),
            ("DASHBOARD_CRYPTO_VOLATILITY", "0.1"),
            ("DASHBOARD_EQUITIES", "NVDA, AMD,,"),
            ("DASHBOARD_OFFLINE", "true"),
        ]))
        .unwrap();

        assert_eq!(config.tick_interval_ms, 500);
        assert_eq!(config.retention_size, 10);
        assert_eq!(config.crypto_volatility, 0.1);
        assert_eq!(config.equities, vec!["NVDA".to_string(), "AMD".to_string()]);
        assert!(config.offline);
    }

    #[test]
    fn test_non_numeric_value_is_rejected() {
        let err = DashboardConfig::from_lookup(lookup_from(&[("DASHBOARD_RETENTION_SIZE", "fifty")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref var, .. } if var == "DASHBOARD_RETENTION_SIZE"));
    }

    #[test]
    fn test_out_of_range_values_are_rejected() {
        assert!(DashboardConfig::from_lookup(lookup_from(&[("DASHBOARD_RETENTION_SIZE", "0")])).is_err());
        assert!(DashboardConfig::from_lookup(lookup_from(&[("DASHBOARD_TICK_INTERVAL_MS", "0")])).is_err());
        assert!(DashboardConfig::from_lookup(lookup_from(&[("DASHBOARD_EQUITY_VOLATILITY", "1.5")])).is_err());
        assert!(DashboardConfig::from_lookup(lookup_from(&[("DASHBOARD_CRYPTO_VOLATILITY", "-0.01")])).is_err());
        assert!(DashboardConfig::from_lookup(lookup_from(&[("DASHBOARD_OFFLINE", "maybe")])).is_err());
    }

    #[test]
    fn test_duplicate_keys_are_rejected() {
        let err = DashboardConfig::from_lookup(lookup_from(&[("DASHBOARD_EQUITIES", "AAPL,MSFT,AAPL")]))
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::DuplicateKey { ref var, ref key } if var == "DASHBOARD_EQUITIES" && key == "AAPL"
        ));

        assert!(DashboardConfig::from_lookup(lookup_from(&[("DASHBOARD_CRYPTO", "BTC-USD, BTC-USD")])).is_err());
        assert!(DashboardConfig::from_lookup(lookup_from(&[("DASHBOARD_CITIES", "London,Tokyo,London")])).is_err());

        let mut config = DashboardConfig::default();
        config.equities.push("AAPL".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_list_is_rejected() {
        let err = DashboardConfig::from_lookup(lookup_from(&[("DASHBOARD_CITIES", " , ")])).unwrap_err();
        assert!(matches!(err, ConfigError::EmptyList(ref name) if name == "DASHBOARD_CITIES"));
    }
}
