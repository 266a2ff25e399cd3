//! Interval table
//!
//! Ordered retention intervals indexed by mastery level. Lookups are total:
//! any integer level maps to some interval.

use super::config::{ConfigError, SrsConfig};

/// The retention ladder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntervalTable {
    days: Vec<i64>,
    initial: i64,
}

impl IntervalTable {
    /// Build a table from validated configuration
    pub fn from_config(config: &SrsConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            days: config.intervals.clone(),
            initial: config.initial_interval,
        })
    }

    /// Number of levels on the ladder
    #[inline]
    pub fn len(&self) -> usize {
        self.days.len()
    }

    /// Always false for a constructed table
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    /// Highest reachable level
    #[inline]
    pub fn max_level(&self) -> u32 {
        (self.days.len() - 1) as u32
    }

    /// Interval used below the bottom of the ladder
    #[inline]
    pub fn initial_interval(&self) -> i64 {
        self.initial
    }

    /// Interval in days for `level`
    ///
    /// Negative levels get the initial interval, levels past the top get the
    /// final interval.
    pub fn interval_for_level(&self, level: i64) -> i64 {
        if level < 0 {
            return self.initial;
        }
        let idx = (level as u64).min(self.max_level() as u64) as usize;
        self.days[idx]
    }

    /// Iterate `(level, days)` pairs
    pub fn iter(&self) -> impl Iterator<Item = (u32, i64)> + '_ {
        self.days.iter().enumerate().map(|(i, d)| (i as u32, *d))
    }
}

impl Default for IntervalTable {
    fn default() -> Self {
        let config = SrsConfig::default();
        Self {
            days: config.intervals,
            initial: config.initial_interval,
        }
    }
}
