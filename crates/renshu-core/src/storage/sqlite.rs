//! SQLite Storage Implementation
//!
//! Durable [`ReviewStore`] with separate reader/writer connections.

use chrono::{DateTime, SecondsFormat, Utc};
use directories::ProjectDirs;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use super::{Result, ReviewStore, StorageError};
use crate::item::{ItemKey, ItemKind, LearnerId, StudyItemProgress};
use crate::queue::ReviewQueueEntry;
use crate::session::{ReviewResult, ReviewSession};
use crate::srs::{Difficulty, Priority};

const ENTRY_COLUMNS: &str =
    "id, learner_id, item_kind, item_id, scheduled_at, completed_at, priority, mastery_level";

const PROGRESS_COLUMNS: &str = "learner_id, item_kind, item_id, mastery_level, next_review_at, \
     correct_count, incorrect_count, last_reviewed_at, created_at";

const RESULT_COLUMNS: &str = "id, session_id, entry_id, is_correct, response_time_ms, \
     user_answer, correct_answer, difficulty, reviewed_at";

/// SQLite-backed store
///
/// All methods take `&self`; the two connections sit behind mutexes so the
/// store is `Send + Sync` and can be shared through an `Arc`.
pub struct SqliteStore {
    writer: Mutex<Connection>,
    reader: Mutex<Connection>,
    path: PathBuf,
}

impl SqliteStore {
    /// Apply PRAGMAs and optional encryption to a connection
    fn configure_connection(conn: &Connection) -> Result<()> {
        #[cfg(feature = "encryption")]
        {
            if let Ok(key) = std::env::var("RENSHU_ENCRYPTION_KEY") {
                if !key.is_empty() {
                    conn.pragma_update(None, "key", &key)?;
                }
            }
        }

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA foreign_keys = ON;
             PRAGMA busy_timeout = 5000;
             PRAGMA temp_store = MEMORY;",
        )?;

        Ok(())
    }

    /// Default database location under the platform data directory
    pub fn default_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("com", "renshu", "core").ok_or_else(|| {
            StorageError::Init("Could not determine project directories".to_string())
        })?;
        Ok(proj_dirs.data_dir().join("renshu.db"))
    }

    /// Open (creating if needed) the database at `db_path`, or the default location
    pub fn new(db_path: Option<PathBuf>) -> Result<Self> {
        let path = match db_path {
            Some(p) => p,
            None => Self::default_path()?,
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
                // Restrict directory permissions to owner-only on Unix
                #[cfg(unix)]
                {
                    use std::os::unix::fs::PermissionsExt;
                    let perms = std::fs::Permissions::from_mode(0o700);
                    let _ = std::fs::set_permissions(parent, perms);
                }
            }
        }

        let writer_conn = Connection::open(&path)?;
        Self::configure_connection(&writer_conn)?;

        let applied = super::migrations::apply_migrations(&writer_conn)?;
        tracing::info!(path = %path.display(), applied, "SQLite store ready");

        let reader_conn = Connection::open(&path)?;
        Self::configure_connection(&reader_conn)?;

        Ok(Self {
            writer: Mutex::new(writer_conn),
            reader: Mutex::new(reader_conn),
            path,
        })
    }

    /// Location of the database file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn writer(&self) -> Result<MutexGuard<'_, Connection>> {
        self.writer
            .lock()
            .map_err(|_| StorageError::LockPoisoned("writer connection"))
    }

    fn reader(&self) -> Result<MutexGuard<'_, Connection>> {
        self.reader
            .lock()
            .map_err(|_| StorageError::LockPoisoned("reader connection"))
    }

    /// Copy the database to `dest` with `VACUUM INTO`
    pub fn backup_to(&self, dest: &Path) -> Result<()> {
        let path_str = dest.to_str().ok_or_else(|| {
            StorageError::Init(format!("Backup path is not valid UTF-8: {}", dest.display()))
        })?;
        let writer = self.writer()?;
        writer.execute("VACUUM INTO ?1", params![path_str])?;
        Ok(())
    }

    // ========================================================================
    // ROW MAPPING
    // ========================================================================

    /// Fixed-width RFC 3339 so text comparison matches time order
    fn ts(value: &DateTime<Utc>) -> String {
        value.to_rfc3339_opts(SecondsFormat::Micros, true)
    }

    fn conversion_error(column: usize, message: String) -> rusqlite::Error {
        rusqlite::Error::FromSqlConversionFailure(
            column,
            rusqlite::types::Type::Text,
            Box::new(std::io::Error::new(std::io::ErrorKind::InvalidData, message)),
        )
    }

    /// Parse RFC3339 timestamp
    fn parse_timestamp(value: &str, field_name: &str) -> rusqlite::Result<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(value)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| {
                Self::conversion_error(
                    0,
                    format!("Invalid {} timestamp '{}': {}", field_name, value, e),
                )
            })
    }

    fn parse_optional_timestamp(
        value: Option<String>,
        field_name: &str,
    ) -> rusqlite::Result<Option<DateTime<Utc>>> {
        value
            .map(|s| Self::parse_timestamp(&s, field_name))
            .transpose()
    }

    fn parse_uuid(value: &str, field_name: &str) -> rusqlite::Result<Uuid> {
        Uuid::parse_str(value)
            .map_err(|e| Self::conversion_error(0, format!("Invalid {} '{}': {}", field_name, value, e)))
    }

    fn parse_kind(value: &str) -> rusqlite::Result<ItemKind> {
        value.parse::<ItemKind>().map_err(|e| Self::conversion_error(0, e))
    }

    fn row_to_entry(row: &rusqlite::Row) -> rusqlite::Result<ReviewQueueEntry> {
        let id: String = row.get("id")?;
        let kind: String = row.get("item_kind")?;
        let scheduled_at: String = row.get("scheduled_at")?;
        let completed_at: Option<String> = row.get("completed_at")?;

        Ok(ReviewQueueEntry {
            id: Self::parse_uuid(&id, "entry id")?,
            key: ItemKey::new(row.get("learner_id")?, Self::parse_kind(&kind)?, row.get("item_id")?),
            scheduled_at: Self::parse_timestamp(&scheduled_at, "scheduled_at")?,
            completed_at: Self::parse_optional_timestamp(completed_at, "completed_at")?,
            priority: Priority::from_rank(row.get("priority")?),
            mastery_level: row.get("mastery_level")?,
        })
    }

    fn row_to_progress(row: &rusqlite::Row) -> rusqlite::Result<StudyItemProgress> {
        let kind: String = row.get("item_kind")?;
        let next_review_at: String = row.get("next_review_at")?;
        let last_reviewed_at: Option<String> = row.get("last_reviewed_at")?;
        let created_at: String = row.get("created_at")?;

        Ok(StudyItemProgress {
            key: ItemKey::new(row.get("learner_id")?, Self::parse_kind(&kind)?, row.get("item_id")?),
            mastery_level: row.get("mastery_level")?,
            next_review_at: Self::parse_timestamp(&next_review_at, "next_review_at")?,
            correct_count: row.get("correct_count")?,
            incorrect_count: row.get("incorrect_count")?,
            last_reviewed_at: Self::parse_optional_timestamp(last_reviewed_at, "last_reviewed_at")?,
            created_at: Self::parse_timestamp(&created_at, "created_at")?,
        })
    }

    fn row_to_session(row: &rusqlite::Row) -> rusqlite::Result<ReviewSession> {
        let id: String = row.get("id")?;
        let started_at: String = row.get("started_at")?;
        let ended_at: Option<String> = row.get("ended_at")?;

        Ok(ReviewSession {
            id: Self::parse_uuid(&id, "session id")?,
            learner_id: row.get("learner_id")?,
            started_at: Self::parse_timestamp(&started_at, "started_at")?,
            ended_at: Self::parse_optional_timestamp(ended_at, "ended_at")?,
            items_reviewed: row.get("items_reviewed")?,
            correct_answers: row.get("correct_answers")?,
            incorrect_answers: row.get("incorrect_answers")?,
            results: Vec::new(),
        })
    }

    fn row_to_result(row: &rusqlite::Row) -> rusqlite::Result<ReviewResult> {
        let id: String = row.get("id")?;
        let session_id: String = row.get("session_id")?;
        let entry_id: String = row.get("entry_id")?;
        let difficulty: String = row.get("difficulty")?;
        let reviewed_at: String = row.get("reviewed_at")?;

        Ok(ReviewResult {
            id: Self::parse_uuid(&id, "result id")?,
            session_id: Self::parse_uuid(&session_id, "session id")?,
            entry_id: Self::parse_uuid(&entry_id, "entry id")?,
            is_correct: row.get("is_correct")?,
            response_time_ms: row.get("response_time_ms")?,
            user_answer: row.get("user_answer")?,
            correct_answer: row.get("correct_answer")?,
            difficulty: Difficulty::parse_name(&difficulty),
            reviewed_at: Self::parse_timestamp(&reviewed_at, "reviewed_at")?,
        })
    }

    // ========================================================================
    // WRITES (shared by the plain and transactional paths)
    // ========================================================================

    fn write_entry(conn: &Connection, entry: &ReviewQueueEntry) -> rusqlite::Result<usize> {
        conn.execute(
            "INSERT INTO review_queue (id, learner_id, item_kind, item_id, scheduled_at,
                                       completed_at, priority, mastery_level)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             ON CONFLICT(id) DO UPDATE SET
                scheduled_at = excluded.scheduled_at,
                completed_at = excluded.completed_at,
                priority = excluded.priority,
                mastery_level = excluded.mastery_level",
            params![
                entry.id.to_string(),
                entry.learner_id(),
                entry.kind().as_str(),
                entry.item_id(),
                Self::ts(&entry.scheduled_at),
                entry.completed_at.as_ref().map(Self::ts),
                entry.priority.rank(),
                entry.mastery_level,
            ],
        )
    }

    fn write_progress(conn: &Connection, progress: &StudyItemProgress) -> rusqlite::Result<usize> {
        conn.execute(
            "INSERT INTO study_progress (learner_id, item_kind, item_id, mastery_level,
                                         next_review_at, correct_count, incorrect_count,
                                         last_reviewed_at, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
             ON CONFLICT(learner_id, item_kind, item_id) DO UPDATE SET
                mastery_level = excluded.mastery_level,
                next_review_at = excluded.next_review_at,
                correct_count = excluded.correct_count,
                incorrect_count = excluded.incorrect_count,
                last_reviewed_at = excluded.last_reviewed_at",
            params![
                progress.key.learner_id,
                progress.key.kind.as_str(),
                progress.key.item_id,
                progress.mastery_level,
                Self::ts(&progress.next_review_at),
                progress.correct_count,
                progress.incorrect_count,
                progress.last_reviewed_at.as_ref().map(Self::ts),
                Self::ts(&progress.created_at),
            ],
        )
    }

    fn write_session(conn: &Connection, session: &ReviewSession) -> rusqlite::Result<usize> {
        conn.execute(
            "INSERT INTO review_sessions (id, learner_id, started_at, ended_at, items_reviewed,
                                          correct_answers, incorrect_answers)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(id) DO UPDATE SET
                ended_at = excluded.ended_at,
                items_reviewed = excluded.items_reviewed,
                correct_answers = excluded.correct_answers,
                incorrect_answers = excluded.incorrect_answers",
            params![
                session.id.to_string(),
                session.learner_id,
                Self::ts(&session.started_at),
                session.ended_at.as_ref().map(Self::ts),
                session.items_reviewed,
                session.correct_answers,
                session.incorrect_answers,
            ],
        )
    }

    fn write_result(conn: &Connection, result: &ReviewResult) -> rusqlite::Result<usize> {
        conn.execute(
            "INSERT INTO review_results (id, session_id, entry_id, is_correct, response_time_ms,
                                         user_answer, correct_answer, difficulty, reviewed_at, seq)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9,
                     (SELECT COALESCE(MAX(seq), 0) + 1 FROM review_results WHERE session_id = ?2))",
            params![
                result.id.to_string(),
                result.session_id.to_string(),
                result.entry_id.to_string(),
                result.is_correct,
                result.response_time_ms,
                result.user_answer,
                result.correct_answer,
                result.difficulty.as_str(),
                Self::ts(&result.reviewed_at),
            ],
        )
    }

    fn write_completion(
        conn: &Connection,
        completed: &ReviewQueueEntry,
        successor: Option<&ReviewQueueEntry>,
        progress: &StudyItemProgress,
    ) -> rusqlite::Result<()> {
        // Close the old entry first so the one-open-entry index admits the successor
        Self::write_entry(conn, completed)?;
        if let Some(next) = successor {
            Self::write_entry(conn, next)?;
        }
        Self::write_progress(conn, progress)?;
        Ok(())
    }
}

impl ReviewStore for SqliteStore {
    fn load_entries(&self, learner_id: LearnerId) -> Result<Vec<ReviewQueueEntry>> {
        let reader = self.reader()?;
        let mut stmt = reader.prepare(&format!(
            "SELECT {} FROM review_queue WHERE learner_id = ?1 ORDER BY scheduled_at ASC",
            ENTRY_COLUMNS
        ))?;

        let rows = stmt.query_map(params![learner_id], Self::row_to_entry)?;

        let mut result = Vec::new();
        for row in rows {
            result.push(row?);
        }
        Ok(result)
    }

    fn get_entry(&self, id: Uuid) -> Result<Option<ReviewQueueEntry>> {
        let reader = self.reader()?;
        let mut stmt = reader.prepare(&format!(
            "SELECT {} FROM review_queue WHERE id = ?1",
            ENTRY_COLUMNS
        ))?;
        let entry = stmt
            .query_row(params![id.to_string()], Self::row_to_entry)
            .optional()?;
        Ok(entry)
    }

    fn save_entry(&self, entry: &ReviewQueueEntry) -> Result<()> {
        let writer = self.writer()?;
        Self::write_entry(&writer, entry)?;
        Ok(())
    }

    fn load_progress(&self, key: &ItemKey) -> Result<Option<StudyItemProgress>> {
        let reader = self.reader()?;
        let mut stmt = reader.prepare(&format!(
            "SELECT {} FROM study_progress
             WHERE learner_id = ?1 AND item_kind = ?2 AND item_id = ?3",
            PROGRESS_COLUMNS
        ))?;
        let progress = stmt
            .query_row(
                params![key.learner_id, key.kind.as_str(), key.item_id],
                Self::row_to_progress,
            )
            .optional()?;
        Ok(progress)
    }

    fn load_learner_progress(&self, learner_id: LearnerId) -> Result<Vec<StudyItemProgress>> {
        let reader = self.reader()?;
        let mut stmt = reader.prepare(&format!(
            "SELECT {} FROM study_progress WHERE learner_id = ?1 ORDER BY item_kind, item_id",
            PROGRESS_COLUMNS
        ))?;

        let rows = stmt.query_map(params![learner_id], Self::row_to_progress)?;

        let mut result = Vec::new();
        for row in rows {
            result.push(row?);
        }
        Ok(result)
    }

    fn save_progress(&self, progress: &StudyItemProgress) -> Result<()> {
        let writer = self.writer()?;
        Self::write_progress(&writer, progress)?;
        Ok(())
    }

    fn get_session(&self, id: Uuid) -> Result<Option<ReviewSession>> {
        let session = {
            let reader = self.reader()?;
            let mut stmt = reader.prepare(
                "SELECT id, learner_id, started_at, ended_at, items_reviewed,
                        correct_answers, incorrect_answers
                 FROM review_sessions WHERE id = ?1",
            )?;
            stmt.query_row(params![id.to_string()], Self::row_to_session)
                .optional()?
        };

        match session {
            Some(mut session) => {
                session.results = self.load_results(id)?;
                Ok(Some(session))
            }
            None => Ok(None),
        }
    }

    fn save_session(&self, session: &ReviewSession) -> Result<()> {
        let writer = self.writer()?;
        Self::write_session(&writer, session)?;
        Ok(())
    }

    fn save_result(&self, result: &ReviewResult) -> Result<()> {
        let writer = self.writer()?;
        Self::write_result(&writer, result)?;
        Ok(())
    }

    fn load_results(&self, session_id: Uuid) -> Result<Vec<ReviewResult>> {
        let reader = self.reader()?;
        let mut stmt = reader.prepare(&format!(
            "SELECT {} FROM review_results WHERE session_id = ?1 ORDER BY seq ASC",
            RESULT_COLUMNS
        ))?;

        let rows = stmt.query_map(params![session_id.to_string()], Self::row_to_result)?;

        let mut result = Vec::new();
        for row in rows {
            result.push(row?);
        }
        Ok(result)
    }

    fn apply_completion(
        &self,
        completed: &ReviewQueueEntry,
        successor: Option<&ReviewQueueEntry>,
        progress: &StudyItemProgress,
    ) -> Result<()> {
        let mut writer = self.writer()?;
        let tx = writer.transaction()?;
        Self::write_completion(&tx, completed, successor, progress)?;
        tx.commit()?;
        Ok(())
    }

    fn apply_graded_result(
        &self,
        completed: &ReviewQueueEntry,
        successor: Option<&ReviewQueueEntry>,
        progress: &StudyItemProgress,
        result: &ReviewResult,
        session: &ReviewSession,
    ) -> Result<()> {
        let mut writer = self.writer()?;
        let tx = writer.transaction()?;
        Self::write_completion(&tx, completed, successor, progress)?;
        Self::write_result(&tx, result)?;
        Self::write_session(&tx, session)?;
        tx.commit()?;
        Ok(())
    }
}


// ============================================================================
// TESTS
// ============================================================================
