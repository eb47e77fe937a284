//! Error types for the dashboard

use thiserror::Error;

use crate::Category;

/// Dashboard-wide error type
#[derive(Error, Debug)]
pub enum DashboardError {
    /// No series exists for the requested key
    #[error("Unknown key in {category}: {key}")]
    UnknownKey { category: Category, key: String },

    /// External seed source failed or returned nothing
    #[error("Seed unavailable for {key}: {reason}")]
    SeedUnavailable { key: String, reason: String },

    /// Unexpected failure while advancing a category
    #[error("Tick failure ({category}): {message}")]
    TickFailure { category: Category, message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl DashboardError {
    pub fn unknown_key(category: Category, key: impl Into<String>) -> Self {
        DashboardError::UnknownKey {
            category,
            key: key.into(),
        }
    }

    pub fn seed_unavailable(key: impl Into<String>, reason: impl Into<String>) -> Self {
        DashboardError::SeedUnavailable {
            key: key.into(),
            reason: reason.into(),
        }
    }

    pub fn tick_failure(category: Category, message: impl Into<String>) -> Self {
        DashboardError::TickFailure {
            category,
            message: message.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        DashboardError::Config(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        DashboardError::Internal(msg.into())
    }

    /// Whether this error should be reported to a caller as "not found"
    pub fn is_not_found(&self) -> bool {
        matches!(self, DashboardError::UnknownKey { .. })
    }
}

/// Result type alias for dashboard operations
pub type DashboardResult<T> = Result<T, DashboardError>;
