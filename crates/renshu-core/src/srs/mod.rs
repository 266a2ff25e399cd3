//! SRS Module
//!
//! Level-ladder spaced repetition:
//! - Interval table indexed by mastery level
//! - Level transitions from correctness and difficulty
//! - Priority bands for ordering the due queue
//! - Mastery classification for display

mod calculator;
mod config;
mod intervals;

pub use calculator::{
    format_interval, retention_rate, Difficulty, MasteryLabel, Priority, SrsCalculator, SrsStats,
    CRITICAL_OVERDUE_DAYS, HIGH_OVERDUE_DAYS, INCORRECT_LEVEL_DROP, MASTERED_MIN_LEVEL,
    MASTERED_MIN_RETENTION,
};
pub use config::{
    ConfigError, SrsConfig, DEFAULT_EASY_BONUS, DEFAULT_HARD_PENALTY, DEFAULT_INITIAL_INTERVAL,
    DEFAULT_INTERVALS, MAX_INTERVAL_DAYS,
};
pub(crate) use calculator::add_days;
pub use intervals::IntervalTable;
