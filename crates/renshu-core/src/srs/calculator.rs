//! Level-ladder SRS calculator
//!
//! Pure functions from (level, outcome, difficulty) to the next rung of the
//! ladder, the next due time, and the urgency band used to order queues.
//!
//! ## Transition rules
//! - Incorrect: drop two levels, never below zero
//! - Correct + Easy: +2
//! - Correct + Normal: +1
//! - Correct + Hard: stay
//!
//! Correct answers are capped at the top of the interval table. An incorrect
//! answer only drops, so a level already above the table (a shrunk config or
//! an old stored row) stays above it until it falls back onto the ladder.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::config::{ConfigError, SrsConfig};
use super::intervals::IntervalTable;

// ============================================================================
// CONSTANTS
// ============================================================================

/// Minimum level for an item to leave the active queue
pub const MASTERED_MIN_LEVEL: u32 = 6;

/// Minimum retention (percent) for an item to leave the active queue
pub const MASTERED_MIN_RETENTION: f64 = 85.0;

/// Levels dropped on an incorrect answer
pub const INCORRECT_LEVEL_DROP: u32 = 2;

/// Days overdue past which an item becomes critical
pub const CRITICAL_OVERDUE_DAYS: i64 = 7;

/// Days overdue past which an item becomes high priority
pub const HIGH_OVERDUE_DAYS: i64 = 3;

// ============================================================================
// GRADING TYPES
// ============================================================================

/// How hard the learner found a correct answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    /// Instant recall
    Easy,
    /// Ordinary recall
    #[default]
    Normal,
    /// Recalled with effort
    Hard,
}

impl Difficulty {
    /// Levels gained on a correct answer
    #[inline]
    pub fn advancement(&self) -> u32 {
        match self {
            Difficulty::Easy => 2,
            Difficulty::Normal => 1,
            Difficulty::Hard => 0,
        }
    }

    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Normal => "normal",
            Difficulty::Hard => "hard",
        }
    }

    /// Parse from string name, falling back to Normal
    pub fn parse_name(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "easy" => Difficulty::Easy,
            "hard" => Difficulty::Hard,
            _ => Difficulty::Normal,
        }
    }
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "normal" => Ok(Difficulty::Normal),
            "hard" => Ok(Difficulty::Hard),
            _ => Err(format!("Unknown difficulty: {}", s)),
        }
    }
}

/// Urgency band for ordering the due queue
///
/// Ordered so that `Low < Medium < High < Critical`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    #[default]
    Low,
    Medium,
    High,
    Critical,
}

impl Priority {
    /// Numeric rank used for persistence (0 = Low .. 3 = Critical)
    #[inline]
    pub fn rank(&self) -> i32 {
        match self {
            Priority::Low => 0,
            Priority::Medium => 1,
            Priority::High => 2,
            Priority::Critical => 3,
        }
    }

    /// Inverse of [`Priority::rank`]; out-of-range values clamp to the nearest band
    pub fn from_rank(rank: i32) -> Self {
        match rank {
            i32::MIN..=0 => Priority::Low,
            1 => Priority::Medium,
            2 => Priority::High,
            _ => Priority::Critical,
        }
    }

    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Critical => "critical",
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            "critical" => Ok(Priority::Critical),
            _ => Err(format!("Unknown priority: {}", s)),
        }
    }
}

/// Display band over (level, retention)
///
/// | Label        | Level | Retention |
/// |--------------|-------|-----------|
/// | Master       | >= 7  | >= 90%    |
/// | Advanced     | >= 5  | >= 80%    |
/// | Intermediate | >= 3  | >= 70%    |
/// | Beginner     | >= 1  | >= 60%    |
/// | Learning     | otherwise         |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MasteryLabel {
    Master,
    Advanced,
    Intermediate,
    Beginner,
    Learning,
}

impl MasteryLabel {
    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            MasteryLabel::Master => "master",
            MasteryLabel::Advanced => "advanced",
            MasteryLabel::Intermediate => "intermediate",
            MasteryLabel::Beginner => "beginner",
            MasteryLabel::Learning => "learning",
        }
    }
}

impl std::fmt::Display for MasteryLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Summary of an item's review history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SrsStats {
    pub total_reviews: u32,
    pub correct_reviews: u32,
    pub incorrect_reviews: u32,
    /// Percent of correct answers (0.0 - 100.0)
    pub retention_rate: f64,
    pub current_level: u32,
    /// Interval for the current level
    pub next_review_days: i64,
    pub mastery_label: MasteryLabel,
}

// ============================================================================
// CALCULATOR
// ============================================================================

/// Stateless scheduler over an [`IntervalTable`]
///
/// Cheap to clone and safe to share across threads: there is no interior
/// state, only the immutable configuration.
#[derive(Debug, Clone)]
pub struct SrsCalculator {
    table: IntervalTable,
    config: SrsConfig,
}

impl Default for SrsCalculator {
    fn default() -> Self {
        Self {
            table: IntervalTable::default(),
            config: SrsConfig::default(),
        }
    }
}

impl SrsCalculator {
    /// Create a calculator, failing fast on an unusable configuration
    pub fn new(config: SrsConfig) -> Result<Self, ConfigError> {
        let table = IntervalTable::from_config(&config)?;
        Ok(Self { table, config })
    }

    /// The configured ladder
    pub fn table(&self) -> &IntervalTable {
        &self.table
    }

    /// The configuration this calculator was built from
    pub fn config(&self) -> &SrsConfig {
        &self.config
    }

    /// Highest reachable level
    pub fn max_level(&self) -> u32 {
        self.table.max_level()
    }

    /// Retention interval in days for any integer level
    pub fn interval_for_level(&self, level: i64) -> i64 {
        self.table.interval_for_level(level)
    }

    /// Level after a review
    pub fn next_level(&self, current: u32, was_correct: bool, difficulty: Difficulty) -> u32 {
        if !was_correct {
            return current.saturating_sub(INCORRECT_LEVEL_DROP);
        }
        current
            .saturating_add(difficulty.advancement())
            .min(self.max_level())
    }

    /// Due time after a review performed at `now`, saturating at the end of
    /// the representable range
    pub fn next_review_at(
        &self,
        current: u32,
        was_correct: bool,
        difficulty: Difficulty,
        now: DateTime<Utc>,
    ) -> DateTime<Utc> {
        let level = self.next_level(current, was_correct, difficulty);
        add_days(now, self.interval_for_level(level as i64)).unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// Terminal condition: the item stops being re-enqueued
    pub fn is_mastered(&self, level: u32, retention_rate: f64) -> bool {
        level >= MASTERED_MIN_LEVEL && retention_rate >= MASTERED_MIN_RETENTION
    }

    /// Display band for an item
    ///
    /// Deliberately independent of [`SrsCalculator::is_mastered`]; the two
    /// use different thresholds.
    pub fn mastery_label(&self, level: u32, retention_rate: f64) -> MasteryLabel {
        if level >= 7 && retention_rate >= 90.0 {
            MasteryLabel::Master
        } else if level >= 5 && retention_rate >= 80.0 {
            MasteryLabel::Advanced
        } else if level >= 3 && retention_rate >= 70.0 {
            MasteryLabel::Intermediate
        } else if level >= 1 && retention_rate >= 60.0 {
            MasteryLabel::Beginner
        } else {
            MasteryLabel::Learning
        }
    }

    /// Urgency of an item due at `next_review_at`
    ///
    /// Overdue-ness always wins; retention only matters for items not yet due.
    /// Overdue time is compared as an exact duration, not truncated to whole
    /// days: 7 days and 1 hour late is already Critical.
    pub fn priority(
        &self,
        next_review_at: DateTime<Utc>,
        now: DateTime<Utc>,
        _level: u32,
        retention_rate: f64,
    ) -> Priority {
        let overdue = now - next_review_at;

        if overdue > Duration::days(CRITICAL_OVERDUE_DAYS) {
            return Priority::Critical;
        }
        if overdue > Duration::days(HIGH_OVERDUE_DAYS) {
            return Priority::High;
        }
        if overdue > Duration::zero() {
            return Priority::Medium;
        }

        if retention_rate < 60.0 {
            Priority::High
        } else if retention_rate < 80.0 {
            Priority::Medium
        } else {
            Priority::Low
        }
    }

    /// Priority of the entry that follows a completed review
    pub fn successor_priority(&self, new_level: u32, was_correct: bool) -> Priority {
        if !was_correct {
            Priority::Critical
        } else if new_level < 2 {
            Priority::High
        } else if new_level < 4 {
            Priority::Medium
        } else {
            Priority::Low
        }
    }

    /// Percent of correct answers, 0 when there is no history
    pub fn retention_rate(&self, correct: u32, total: u32) -> f64 {
        retention_rate(correct, total)
    }

    /// Summarise an item's history
    pub fn stats(&self, correct: u32, incorrect: u32, level: u32) -> SrsStats {
        let total = correct + incorrect;
        let rate = retention_rate(correct, total);
        SrsStats {
            total_reviews: total,
            correct_reviews: correct,
            incorrect_reviews: incorrect,
            retention_rate: rate,
            current_level: level,
            next_review_days: self.interval_for_level(level as i64),
            mastery_label: self.mastery_label(level, rate),
        }
    }

    /// Projected due dates if every upcoming review climbs one rung
    ///
    /// Stops early once a date would fall past the representable range.
    pub fn upcoming_review_dates(
        &self,
        level: u32,
        count: usize,
        now: DateTime<Utc>,
    ) -> Vec<DateTime<Utc>> {
        let mut dates = Vec::new();
        let mut current = now;
        for step in 0..count {
            let days = self.interval_for_level((level as i64).saturating_add(step as i64));
            match add_days(current, days) {
                Some(next) => current = next,
                None => break,
            }
            dates.push(current);
        }
        dates
    }
}

/// `at + days`, or `None` past the representable range
pub(crate) fn add_days(at: DateTime<Utc>, days: i64) -> Option<DateTime<Utc>> {
    Duration::try_days(days).and_then(|d| at.checked_add_signed(d))
}

/// Percent of correct answers, 0 when there is no history
pub fn retention_rate(correct: u32, total: u32) -> f64 {
    if total == 0 {
        0.0
    } else {
        correct as f64 / total as f64 * 100.0
    }
}

/// Format an interval in days to a compact string
pub fn format_interval(days: i64) -> String {
    if days <= 0 {
        "now".to_string()
    } else if days < 7 {
        format!("{}d", days)
    } else if days < 30 {
        format!("{}w", days / 7)
    } else if days < 365 {
        format!("{}mo", days / 30)
    } else {
        format!("{}y", days / 365)
    }
}

// ============================================================================
// TESTS
// ============================================================================
