//! Database Migrations
//!
//! Schema migration definitions for the SQLite store.

/// Migration definitions
pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        description: "Initial schema: review queue and study progress",
        up: MIGRATION_V1_UP,
    },
    Migration {
        version: 2,
        description: "Review sessions and graded results",
        up: MIGRATION_V2_UP,
    },
];

/// A database migration
#[derive(Debug, Clone)]
pub struct Migration {
    /// Version number
    pub version: u32,
    /// Description
    pub description: &'static str,
    /// SQL to apply
    pub up: &'static str,
}

/// V1: Initial schema
const MIGRATION_V1_UP: &str = r#"
CREATE TABLE IF NOT EXISTS review_queue (
    id TEXT PRIMARY KEY,
    learner_id INTEGER NOT NULL,
    item_kind TEXT NOT NULL,
    item_id INTEGER NOT NULL,
    scheduled_at TEXT NOT NULL,
    completed_at TEXT,
    -- 0=Low, 1=Medium, 2=High, 3=Critical
    priority INTEGER NOT NULL DEFAULT 0,
    mastery_level INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_queue_learner ON review_queue(learner_id, completed_at, scheduled_at);
CREATE INDEX IF NOT EXISTS idx_queue_item ON review_queue(learner_id, item_kind, item_id);

-- At most one open entry per (learner, kind, item)
CREATE UNIQUE INDEX IF NOT EXISTS idx_queue_one_open
    ON review_queue(learner_id, item_kind, item_id)
    WHERE completed_at IS NULL;

CREATE TABLE IF NOT EXISTS study_progress (
    learner_id INTEGER NOT NULL,
    item_kind TEXT NOT NULL,
    item_id INTEGER NOT NULL,
    mastery_level INTEGER NOT NULL DEFAULT 0,
    next_review_at TEXT NOT NULL,
    correct_count INTEGER NOT NULL DEFAULT 0,
    incorrect_count INTEGER NOT NULL DEFAULT 0,
    last_reviewed_at TEXT,
    created_at TEXT NOT NULL,
    PRIMARY KEY (learner_id, item_kind, item_id)
);

CREATE INDEX IF NOT EXISTS idx_progress_next_review ON study_progress(learner_id, next_review_at);

-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL
);

INSERT OR IGNORE INTO schema_version (version, applied_at) VALUES (1, datetime('now'));
"#;

/// V2: Sessions
const MIGRATION_V2_UP: &str = r#"
CREATE TABLE IF NOT EXISTS review_sessions (
    id TEXT PRIMARY KEY,
    learner_id INTEGER NOT NULL,
    started_at TEXT NOT NULL,
    ended_at TEXT,
    items_reviewed INTEGER NOT NULL DEFAULT 0,
    correct_answers INTEGER NOT NULL DEFAULT 0,
    incorrect_answers INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_sessions_learner ON review_sessions(learner_id, started_at);

CREATE TABLE IF NOT EXISTS review_results (
    id TEXT PRIMARY KEY,
    session_id TEXT NOT NULL REFERENCES review_sessions(id) ON DELETE CASCADE,
    entry_id TEXT NOT NULL,
    is_correct INTEGER NOT NULL,
    response_time_ms INTEGER NOT NULL DEFAULT 0,
    user_answer TEXT NOT NULL DEFAULT '',
    correct_answer TEXT NOT NULL DEFAULT '',
    difficulty TEXT NOT NULL DEFAULT 'normal',
    reviewed_at TEXT NOT NULL,
    seq INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_results_session ON review_results(session_id, seq);

UPDATE schema_version SET version = 2, applied_at = datetime('now');
"#;

/// Get current schema version from database
pub fn get_current_version(conn: &rusqlite::Connection) -> rusqlite::Result<u32> {
    conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |row| row.get(0),
    )
    .or(Ok(0))
}

/// Apply pending migrations
pub fn apply_migrations(conn: &rusqlite::Connection) -> rusqlite::Result<u32> {
    let current_version = get_current_version(conn)?;
    let mut applied = 0;

    for migration in MIGRATIONS {
        if migration.version > current_version {
            tracing::info!(
                "Applying migration v{}: {}",
                migration.version,
                migration.description
            );

            // execute_batch handles the multi-statement scripts
            conn.execute_batch(migration.up)?;
            applied += 1;
        }
    }

    Ok(applied)
}
