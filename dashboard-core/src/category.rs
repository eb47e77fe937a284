//! Metric categories tracked by the dashboard

use serde::{Deserialize, Serialize};
use std::fmt;

/// Instrument classes, each advanced by its own generator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Equity prices (multiplicative walk, low volatility)
    Stocks,
    /// Crypto prices (multiplicative walk, high volatility)
    Crypto,
    /// Weather readings per city (bounded additive walk)
    Weather,
}

impl Category {
    /// All categories in tick order
    pub const ALL: [Category; 3] = [Category::Stocks, Category::Crypto, Category::Weather];

    /// Key used in snapshots and on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Stocks => "stocks",
            Category::Crypto => "crypto",
            Category::Weather => "weather",
        }
    }

    /// Get the full display name
    pub fn display_name(&self) -> &'static str {
        match self {
            Category::Stocks => "Stocks",
            Category::Crypto => "Crypto",
            Category::Weather => "Weather",
        }
    }

    /// Whether this category holds price series (as opposed to weather readings)
    pub fn is_price(&self) -> bool {
        matches!(self, Category::Stocks | Category::Crypto)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "stocks" | "stock" | "equities" => Ok(Category::Stocks),
            "crypto" => Ok(Category::Crypto),
            "weather" => Ok(Category::Weather),
            _ => Err(format!("Unknown category: {}", s)),
        }
    }
}
