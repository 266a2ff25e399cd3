//! SRS configuration
//!
//! The interval ladder and its companion settings are supplied once at
//! construction and never change afterwards.

use serde::{Deserialize, Serialize};
use std::path::Path;

// ============================================================================
// DEFAULTS
// ============================================================================

/// Default retention ladder, in days, indexed by mastery level
pub const DEFAULT_INTERVALS: [i64; 8] = [1, 3, 7, 14, 30, 90, 180, 365];

/// Interval used for levels below the bottom of the ladder
pub const DEFAULT_INITIAL_INTERVAL: i64 = 1;

/// Longest interval a ladder rung may carry (about a century)
pub const MAX_INTERVAL_DAYS: i64 = 36_500;

/// Easy-answer multiplier (kept for reference, not used by the level transition)
pub const DEFAULT_EASY_BONUS: f64 = 1.3;

/// Hard-answer multiplier (kept for reference, not used by the level transition)
pub const DEFAULT_HARD_PENALTY: f64 = 0.6;

// ============================================================================
// ERRORS
// ============================================================================

/// Configuration error type
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The interval table has no levels
    #[error("Interval table must contain at least one level")]
    EmptyIntervals,
    /// A level maps to a zero or negative interval
    #[error("Interval for level {level} must be positive, got {days} days")]
    NonPositiveInterval { level: usize, days: i64 },
    /// A level maps to an interval past [`MAX_INTERVAL_DAYS`]
    #[error("Interval for level {level} must be at most {max} days, got {days} days", max = MAX_INTERVAL_DAYS)]
    IntervalTooLarge { level: usize, days: i64 },
    /// The initial interval is outside `1..=MAX_INTERVAL_DAYS`
    #[error("Initial interval must be between 1 and {max} days, got {0} days", max = MAX_INTERVAL_DAYS)]
    InitialInterval(i64),
    /// Malformed configuration document
    #[error("Invalid configuration document: {0}")]
    Parse(#[from] serde_json::Error),
    /// IO error while reading a configuration file
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

// ============================================================================
// CONFIG
// ============================================================================

/// Settings for the level-ladder scheduler
///
/// Uses `deny_unknown_fields` so a misspelled key fails loudly instead of
/// silently falling back to a default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SrsConfig {
    /// Retention interval in days for each mastery level
    #[serde(default = "default_intervals")]
    pub intervals: Vec<i64>,
    /// Interval in days for levels outside the bottom of the table
    #[serde(default = "default_initial_interval")]
    pub initial_interval: i64,
    /// Multiplier for easy answers
    #[serde(default = "default_easy_bonus")]
    pub easy_bonus: f64,
    /// Multiplier for hard answers
    #[serde(default = "default_hard_penalty")]
    pub hard_penalty: f64,
}

fn default_intervals() -> Vec<i64> {
    DEFAULT_INTERVALS.to_vec()
}

fn default_initial_interval() -> i64 {
    DEFAULT_INITIAL_INTERVAL
}

fn default_easy_bonus() -> f64 {
    DEFAULT_EASY_BONUS
}

fn default_hard_penalty() -> f64 {
    DEFAULT_HARD_PENALTY
}

impl Default for SrsConfig {
    fn default() -> Self {
        Self {
            intervals: default_intervals(),
            initial_interval: default_initial_interval(),
            easy_bonus: default_easy_bonus(),
            hard_penalty: default_hard_penalty(),
        }
    }
}

impl SrsConfig {
    /// Build a config with a custom ladder and default everything else
    pub fn with_intervals(intervals: impl Into<Vec<i64>>) -> Self {
        Self {
            intervals: intervals.into(),
            ..Default::default()
        }
    }

    /// Parse a JSON document; missing keys take their defaults
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: SrsConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a JSON configuration file
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    /// Reject tables the scheduler cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.intervals.is_empty() {
            return Err(ConfigError::EmptyIntervals);
        }
        for (level, &days) in self.intervals.iter().enumerate() {
            if days <= 0 {
                return Err(ConfigError::NonPositiveInterval { level, days });
            }
            if days > MAX_INTERVAL_DAYS {
                return Err(ConfigError::IntervalTooLarge { level, days });
            }
        }
        if !(1..=MAX_INTERVAL_DAYS).contains(&self.initial_interval) {
            return Err(ConfigError::InitialInterval(self.initial_interval));
        }
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================
